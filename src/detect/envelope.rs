// Whole-clip onset strength envelope and peak picking
// Mel-band log spectral flux with median aggregation, followed by
// local-max / local-mean peak picking

use std::ops::Range;

use super::DetectionError;
use crate::audio::SpectrumAnalyzer;

/// Configuration for the onset strength envelope
#[derive(Debug, Clone)]
pub struct EnvelopeConfig {
    /// FFT frame size in samples
    pub frame_size: usize,

    /// Hop size in samples (advance between frames)
    pub hop_size: usize,

    /// Highest frequency considered, in Hz
    /// Guitar attacks carry little useful energy above this
    pub fmax_hz: f32,

    /// Number of mel-spaced bands the spectrum is pooled into
    pub num_bands: usize,

    /// Dynamic range kept below the loudest band, in dB
    pub top_db: f32,
}

impl Default for EnvelopeConfig {
    fn default() -> Self {
        EnvelopeConfig {
            frame_size: 2048,
            hop_size: 512,
            fmax_hz: 8000.0,
            num_bands: 64,
            top_db: 80.0,
        }
    }
}

/// Onset strength per frame, frame `i` centered at `i * hop_size` samples
#[derive(Debug, Clone)]
pub struct OnsetEnvelope {
    pub values: Vec<f32>,
    pub sample_rate: u32,
    pub hop_size: usize,
}

impl OnsetEnvelope {
    /// Envelope frames per second
    pub fn frame_rate(&self) -> f64 {
        self.sample_rate as f64 / self.hop_size as f64
    }

    pub fn frame_to_secs(&self, frame: usize) -> f64 {
        (frame * self.hop_size) as f64 / self.sample_rate as f64
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Compute the onset strength envelope of a mono signal
pub fn onset_strength(
    samples: &[f32],
    sample_rate: u32,
    config: &EnvelopeConfig,
) -> Result<OnsetEnvelope, DetectionError> {
    if config.hop_size == 0 || config.frame_size == 0 || sample_rate == 0 {
        return Err(DetectionError::InvalidConfig(format!(
            "frame {} / hop {} / sample rate {}",
            config.frame_size, config.hop_size, sample_rate
        )));
    }

    let mut envelope = OnsetEnvelope {
        values: Vec::new(),
        sample_rate,
        hop_size: config.hop_size,
    };

    if samples.is_empty() {
        return Ok(envelope);
    }

    // Centered frames: pad half a frame of silence on both sides
    let half = config.frame_size / 2;
    let mut padded = vec![0.0f32; samples.len() + 2 * half];
    padded[half..half + samples.len()].copy_from_slice(samples);

    let num_frames = 1 + samples.len() / config.hop_size;
    let mut analyzer = SpectrumAnalyzer::new(config.frame_size);
    let bands = mel_bands(config, sample_rate, analyzer.num_bins());

    let mut magnitudes = Vec::with_capacity(analyzer.num_bins());
    let mut band_db: Vec<Vec<f32>> = Vec::with_capacity(num_frames);
    let mut max_db = f32::NEG_INFINITY;

    for frame_idx in 0..num_frames {
        let start = frame_idx * config.hop_size;
        let end = (start + config.frame_size).min(padded.len());
        analyzer.magnitudes(&padded[start..end], &mut magnitudes)?;

        let frame_db: Vec<f32> = bands
            .iter()
            .map(|band| {
                let power = magnitudes[band.clone()].iter().map(|m| m * m).sum::<f32>()
                    / band.len() as f32;
                10.0 * power.max(1e-10).log10()
            })
            .collect();

        max_db = frame_db.iter().copied().fold(max_db, f32::max);
        band_db.push(frame_db);
    }

    // Clamp the dynamic range so silence sits on a flat floor
    let floor = max_db - config.top_db;
    for frame in band_db.iter_mut() {
        for value in frame.iter_mut() {
            *value = value.max(floor);
        }
    }

    envelope.values.push(0.0);
    let mut diffs = Vec::with_capacity(bands.len());
    for pair in band_db.windows(2) {
        diffs.clear();
        diffs.extend(
            pair[1]
                .iter()
                .zip(pair[0].iter())
                .map(|(curr, prev)| (curr - prev).max(0.0)),
        );
        // Median is robust to a few bands jumping on their own
        envelope.values.push(median(&mut diffs));
    }
    envelope.values.truncate(num_frames);

    Ok(envelope)
}

/// Mel-spaced FFT bin ranges from 0 Hz up to fmax (or Nyquist)
fn mel_bands(config: &EnvelopeConfig, sample_rate: u32, num_bins: usize) -> Vec<Range<usize>> {
    let nyquist = sample_rate as f32 / 2.0;
    let fmax = config.fmax_hz.min(nyquist).max(0.0);
    let num_bands = config.num_bands.max(1);
    let mel_max = hz_to_mel(fmax);
    let bin_hz = sample_rate as f32 / config.frame_size as f32;

    let edges: Vec<usize> = (0..=num_bands)
        .map(|i| {
            let hz = mel_to_hz(mel_max * i as f32 / num_bands as f32);
            ((hz / bin_hz).round() as usize).min(num_bins.saturating_sub(1))
        })
        .collect();

    edges
        .windows(2)
        .map(|edge| {
            let lo = edge[0].min(num_bins.saturating_sub(1));
            let hi = edge[1].max(lo + 1).min(num_bins);
            lo..hi
        })
        .collect()
}

fn hz_to_mel(hz: f32) -> f32 {
    2595.0 * (1.0 + hz / 700.0).log10()
}

fn mel_to_hz(mel: f32) -> f32 {
    700.0 * (10f32.powf(mel / 2595.0) - 1.0)
}

fn median(values: &mut [f32]) -> f32 {
    if values.is_empty() {
        return 0.0;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        (values[mid - 1] + values[mid]) / 2.0
    } else {
        values[mid]
    }
}

/// Peak picking parameters, all windows in envelope frames
#[derive(Debug, Clone, PartialEq)]
pub struct PeakPickConfig {
    /// Frames before n that must not exceed it
    pub pre_max: usize,

    /// Frames after n that must not exceed it
    pub post_max: usize,

    /// Frames before n averaged for the local mean
    pub pre_avg: usize,

    /// Frames after n averaged for the local mean
    pub post_avg: usize,

    /// Margin above the local mean, on the [0, 1] normalized envelope
    pub delta: f32,

    /// Minimum frames between picked peaks
    pub wait: usize,
}

impl PeakPickConfig {
    /// Parameters for plain onset detection
    pub fn onset_only() -> Self {
        PeakPickConfig {
            pre_max: 3,
            post_max: 3,
            pre_avg: 3,
            post_avg: 5,
            delta: 0.2,
            wait: 10,
        }
    }

    /// Lower threshold and shorter wait for fast playing, used with beat filtering
    pub fn combined() -> Self {
        PeakPickConfig {
            delta: 0.15,
            wait: 8,
            ..Self::onset_only()
        }
    }
}

impl Default for PeakPickConfig {
    fn default() -> Self {
        Self::onset_only()
    }
}

/// Pick onset frames from an envelope
///
/// The envelope is normalized to [0, 1]; frame n is a peak when it is the
/// local maximum over [n - pre_max, n + post_max], at least `delta` above the
/// mean over [n - pre_avg, n + post_avg], and more than `wait` frames after
/// the previous peak.
pub fn peak_pick(envelope: &[f32], config: &PeakPickConfig) -> Vec<usize> {
    if envelope.is_empty() {
        return Vec::new();
    }

    let min = envelope.iter().copied().fold(f32::INFINITY, f32::min);
    let max = envelope.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;
    if range.is_nan() || range <= 0.0 {
        // Flat envelope: nothing stands out
        return Vec::new();
    }

    let normalized: Vec<f32> = envelope.iter().map(|v| (v - min) / range).collect();
    let len = normalized.len();

    let mut peaks = Vec::new();
    let mut last_peak: Option<usize> = None;

    for (n, &value) in normalized.iter().enumerate() {
        let max_window = &normalized[n.saturating_sub(config.pre_max)..(n + config.post_max + 1).min(len)];
        let local_max = max_window.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        if value < local_max {
            continue;
        }

        let avg_window = &normalized[n.saturating_sub(config.pre_avg)..(n + config.post_avg + 1).min(len)];
        let local_mean = avg_window.iter().sum::<f32>() / avg_window.len() as f32;
        if value < local_mean + config.delta {
            continue;
        }

        if let Some(last) = last_peak {
            if n - last <= config.wait {
                continue;
            }
        }

        peaks.push(n);
        last_peak = Some(n);
    }

    peaks
}
