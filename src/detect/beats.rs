// Beat tracking - tempo from onset envelope autocorrelation, then
// dynamic-programming beat placement

use super::envelope::{onset_strength, EnvelopeConfig, OnsetEnvelope};
use super::backend::BeatTracker;
use super::DetectionError;
use crate::audio::AudioClip;

/// Tempo estimation result with BPM and beat positions
#[derive(Debug, Clone)]
pub struct TempoEstimate {
    /// Estimated beats per minute
    pub bpm: f64,

    /// Beat positions in seconds, ascending
    pub beat_times: Vec<f64>,
}

/// Configuration for beat tracking
#[derive(Debug, Clone)]
pub struct BeatConfig {
    /// How strictly beats follow the estimated tempo
    /// Higher values penalize deviations from the period more
    pub tightness: f64,

    /// Tempo prior center in BPM
    pub start_bpm: f64,

    /// Width of the tempo prior in octaves
    pub prior_octaves: f64,

    /// Minimum BPM to consider
    pub min_bpm: f64,

    /// Maximum BPM to consider
    pub max_bpm: f64,
}

impl BeatConfig {
    pub fn with_tightness(tightness: f64) -> Self {
        BeatConfig {
            tightness,
            ..Self::default()
        }
    }
}

impl Default for BeatConfig {
    fn default() -> Self {
        BeatConfig {
            tightness: 100.0,
            start_bpm: 120.0,
            prior_octaves: 1.0,
            min_bpm: 30.0,
            max_bpm: 300.0,
        }
    }
}

/// Track beats in an onset envelope
///
/// Algorithm:
/// 1. Autocorrelate the envelope over the valid BPM lag range
/// 2. Weight by a log-Gaussian tempo prior and pick the best lag
/// 3. Smooth the envelope with a Gaussian one period wide
/// 4. Dynamic programming: each beat links back to the best previous beat
///    roughly one period earlier
/// 5. Backtrack from the last strong cumulative-score peak
///
/// Returns `None` when the envelope carries no onset energy.
pub fn track_beats(envelope: &OnsetEnvelope, config: &BeatConfig) -> Option<TempoEstimate> {
    let values = &envelope.values;
    if values.len() < 2 || !values.iter().any(|&v| v > 0.0) {
        return None;
    }

    let frame_rate = envelope.frame_rate();
    let bpm = estimate_bpm(values, frame_rate, config)?;
    let period = frame_rate * 60.0 / bpm;

    let local_score = local_score(values, period);
    let beat_frames = dp_beats(&local_score, period, config.tightness);

    let beat_times = beat_frames
        .into_iter()
        .map(|frame| envelope.frame_to_secs(frame))
        .collect();

    Some(TempoEstimate { bpm, beat_times })
}

/// Pick the tempo with the strongest prior-weighted autocorrelation
fn estimate_bpm(values: &[f32], frame_rate: f64, config: &BeatConfig) -> Option<f64> {
    if config.min_bpm <= 0.0 || config.max_bpm <= config.min_bpm {
        return None;
    }

    let min_lag = ((frame_rate * 60.0 / config.max_bpm).floor() as usize).max(1);
    let max_lag = ((frame_rate * 60.0 / config.min_bpm).ceil() as usize).min(values.len() - 1);
    if min_lag > max_lag {
        return None;
    }

    let mut best: Option<(usize, f64)> = None;
    for lag in min_lag..=max_lag {
        let ac: f64 = values
            .iter()
            .zip(values[lag..].iter())
            .map(|(&a, &b)| a as f64 * b as f64)
            .sum();

        let lag_bpm = frame_rate * 60.0 / lag as f64;
        let octaves = (lag_bpm / config.start_bpm).log2() / config.prior_octaves;
        let weighted = ac * (-0.5 * octaves * octaves).exp();

        if best.map_or(true, |(_, score)| weighted > score) {
            best = Some((lag, weighted));
        }
    }

    match best {
        Some((lag, score)) if score > 0.0 => Some(frame_rate * 60.0 / lag as f64),
        _ => None,
    }
}

/// Envelope normalized by its standard deviation and smoothed with a
/// Gaussian kernel spanning one period either side
fn local_score(values: &[f32], period: f64) -> Vec<f64> {
    let n = values.len() as f64;
    let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
    let variance = values
        .iter()
        .map(|&v| (v as f64 - mean).powi(2))
        .sum::<f64>()
        / (n - 1.0).max(1.0);
    let std_dev = variance.sqrt();
    let scale = if std_dev > 0.0 { 1.0 / std_dev } else { 1.0 };

    let half = period.round() as isize;
    let kernel: Vec<f64> = (-half..=half)
        .map(|k| {
            let x = k as f64 * 32.0 / period;
            (-0.5 * x * x).exp()
        })
        .collect();

    let len = values.len() as isize;
    (0..len)
        .map(|i| {
            kernel
                .iter()
                .enumerate()
                .filter_map(|(j, &w)| {
                    let idx = i + j as isize - half;
                    (0..len).contains(&idx).then(|| w * values[idx as usize] as f64 * scale)
                })
                .sum()
        })
        .collect()
}

/// Dynamic-programming beat placement
fn dp_beats(local_score: &[f64], period: f64, tightness: f64) -> Vec<usize> {
    let len = local_score.len();
    if len == 0 {
        return Vec::new();
    }

    // Candidate predecessors sit between two periods and half a period back
    let far = (2.0 * period).round() as usize;
    let near = ((period / 2.0).round() as usize).max(1);
    let offsets: Vec<(usize, f64)> = (near..=far.max(near))
        .map(|offset| {
            let ratio = offset as f64 / period;
            (offset, -tightness * ratio.ln().powi(2))
        })
        .collect();

    let max_local = local_score.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let is_onset = |i: usize| local_score[i] >= 0.01 * max_local;

    let mut cumulative = vec![0.0f64; len];
    let mut backlink: Vec<Option<usize>> = vec![None; len];
    // Nothing before the first real onset can be a beat
    let mut first_onset: Option<usize> = None;

    for i in 0..len {
        let best = first_onset.and_then(|start| {
            offsets
                .iter()
                .filter(|(offset, _)| *offset <= i && i - offset >= start)
                .map(|&(offset, weight)| (i - offset, weight + cumulative[i - offset]))
                .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        });

        match best {
            Some((prev, score)) => {
                cumulative[i] = local_score[i] + score;
                backlink[i] = Some(prev);
            }
            None => {
                cumulative[i] = local_score[i];
            }
        }

        if first_onset.is_none() && is_onset(i) {
            first_onset = Some(i);
        }
    }

    let Some(last) = last_beat(&cumulative, is_onset) else {
        return Vec::new();
    };

    let mut beats = vec![last];
    let mut current = last;
    while let Some(prev) = backlink[current] {
        beats.push(prev);
        current = prev;
    }
    beats.reverse();
    beats
}

/// Last local maximum of the cumulative score that sits on onset energy and
/// reaches half the median peak
fn last_beat(cumulative: &[f64], is_onset: impl Fn(usize) -> bool) -> Option<usize> {
    let len = cumulative.len();
    let is_local_max = |i: usize| {
        let left = i == 0 || cumulative[i] > cumulative[i - 1];
        let right = i + 1 == len || cumulative[i] >= cumulative[i + 1];
        left && right
    };

    let mut peaks: Vec<f64> = (0..len).filter(|&i| is_local_max(i)).map(|i| cumulative[i]).collect();
    if peaks.is_empty() {
        return None;
    }
    peaks.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let median = peaks[peaks.len() / 2];

    (0..len)
        .rev()
        .find(|&i| is_local_max(i) && is_onset(i) && 2.0 * cumulative[i] > median)
}

/// Beat tracker over the clip's onset strength envelope
#[derive(Debug, Clone, Default)]
pub struct DynamicBeatTracker {
    pub envelope: EnvelopeConfig,
    pub beats: BeatConfig,
}

impl DynamicBeatTracker {
    pub fn new(envelope: EnvelopeConfig, beats: BeatConfig) -> Self {
        DynamicBeatTracker { envelope, beats }
    }

    /// Track beats and keep the tempo estimate
    pub fn estimate(&self, clip: &AudioClip) -> Result<Option<TempoEstimate>, DetectionError> {
        let envelope = onset_strength(&clip.samples, clip.sample_rate, &self.envelope)?;
        Ok(track_beats(&envelope, &self.beats))
    }
}

impl BeatTracker for DynamicBeatTracker {
    fn track(&self, clip: &AudioClip) -> Result<Vec<f64>, DetectionError> {
        let estimate = self.estimate(clip)?;
        match estimate {
            Some(estimate) => {
                log::debug!(
                    "Tracked {} beats at {:.1} BPM",
                    estimate.beat_times.len(),
                    estimate.bpm
                );
                Ok(estimate.beat_times)
            }
            None => {
                log::debug!("No onset energy, no beats tracked");
                Ok(Vec::new())
            }
        }
    }
}
