// Streaming onset detector
// Processes hop-sized blocks in file order and fires when a novelty peak clears
// an adaptive median/mean threshold

use std::collections::VecDeque;

use super::policy::DetectionConfig;
use super::DetectionError;
use crate::audio::SpectrumAnalyzer;

/// Novelty frames before the frame being thresholded
const PRE_FRAMES: usize = 1;

/// Novelty frames after the frame being thresholded
const POST_FRAMES: usize = 5;

/// Frames of novelty history used for the adaptive threshold (1 before, 5 after, current)
const THRESHOLD_HISTORY: usize = PRE_FRAMES + POST_FRAMES + 1;

/// Blocks quieter than this never produce an onset
const DEFAULT_SILENCE_DB: f32 = -70.0;

/// Peaks this far below the strongest novelty seen so far are ignored
const NOVELTY_FLOOR_DB: f32 = -40.0;

/// Minimum inter-onset interval enforced by the detector itself
const DEFAULT_MIN_IOI_SECS: f64 = 0.02;

#[derive(Debug, Clone, Copy)]
struct NoveltyFrame {
    value: f32,
    level_db: f32,
}

/// Block-by-block onset detector
///
/// Feed consecutive `hop_size` blocks to [`process_block`](Self::process_block).
/// The threshold for a frame looks five frames ahead, so a frame is decided
/// `POST_FRAMES + 1` blocks after it was fed; call [`flush`](Self::flush) once the
/// input ends to decide the remaining frames. When an onset fires its time is
/// available from [`last_onset_secs`](Self::last_onset_secs).
pub struct StreamingOnsetDetector {
    config: DetectionConfig,
    sample_rate: u32,
    analyzer: SpectrumAnalyzer,
    frame: Vec<f32>,
    magnitudes: Vec<f32>,
    prev_magnitudes: Vec<f32>,
    history: VecDeque<NoveltyFrame>,
    /// Thresholded novelty of the last three thresholded frames
    recent: [f32; 3],
    peak_novelty: f32,
    frames_processed: u64,
    last_onset_secs: Option<f64>,
    silence_db: f32,
    min_ioi_secs: f64,
}

impl StreamingOnsetDetector {
    pub fn new(config: DetectionConfig, sample_rate: u32) -> Result<Self, DetectionError> {
        if config.hop_size == 0 || config.window_size < config.hop_size {
            return Err(DetectionError::InvalidConfig(format!(
                "window {} / hop {}",
                config.window_size, config.hop_size
            )));
        }
        if sample_rate == 0 {
            return Err(DetectionError::InvalidConfig("sample rate is zero".to_string()));
        }

        let analyzer = SpectrumAnalyzer::new(config.window_size);
        let num_bins = analyzer.num_bins();

        Ok(StreamingOnsetDetector {
            frame: vec![0.0; config.window_size],
            magnitudes: Vec::with_capacity(num_bins),
            prev_magnitudes: vec![0.0; num_bins],
            history: VecDeque::with_capacity(THRESHOLD_HISTORY + 1),
            recent: [0.0; 3],
            peak_novelty: 0.0,
            frames_processed: 0,
            last_onset_secs: None,
            silence_db: DEFAULT_SILENCE_DB,
            min_ioi_secs: DEFAULT_MIN_IOI_SECS,
            analyzer,
            config,
            sample_rate,
        })
    }

    /// Override the silence gate (dB full scale)
    pub fn with_silence_db(mut self, silence_db: f32) -> Self {
        self.silence_db = silence_db;
        self
    }

    pub fn config(&self) -> &DetectionConfig {
        &self.config
    }

    /// Time in seconds of the most recent onset, if any fired yet
    pub fn last_onset_secs(&self) -> Option<f64> {
        self.last_onset_secs
    }

    /// Analyse one block of exactly `hop_size` samples
    pub fn process_block(&mut self, block: &[f32]) -> Result<bool, DetectionError> {
        let hop = self.config.hop_size;
        if block.len() != hop {
            return Err(DetectionError::InvalidConfig(format!(
                "expected block of {} samples, got {}",
                hop,
                block.len()
            )));
        }

        // Slide the analysis window forward by one hop
        self.frame.copy_within(hop.., 0);
        let tail = self.frame.len() - hop;
        self.frame[tail..].copy_from_slice(block);

        self.analyzer.magnitudes(&self.frame, &mut self.magnitudes)?;
        let novelty = self
            .config
            .function
            .compute(&self.magnitudes, &self.prev_magnitudes);
        std::mem::swap(&mut self.magnitudes, &mut self.prev_magnitudes);

        self.peak_novelty = self.peak_novelty.max(novelty);
        self.history.push_back(NoveltyFrame {
            value: novelty,
            level_db: level_db(block),
        });
        if self.history.len() > THRESHOLD_HISTORY {
            self.history.pop_front();
        }
        self.frames_processed += 1;

        if self.history.len() < THRESHOLD_HISTORY {
            return Ok(false);
        }

        // history holds frames c-1 ..= c+5; threshold frame c, decide frame c-1
        let threshold = median(&self.history) + self.config.threshold * mean(&self.history);
        let centered = self.history[PRE_FRAMES].value - threshold;
        self.recent = [self.recent[1], self.recent[2], centered];

        let candidate = self.history[0];
        let candidate_index = self.frames_processed - THRESHOLD_HISTORY as u64;

        let [before, peak, after] = self.recent;
        let is_peak = peak > 0.0 && peak > before && peak >= after;
        let floor = self.peak_novelty * 10f32.powf(NOVELTY_FLOOR_DB / 20.0);
        if !is_peak || candidate.value <= floor || candidate.level_db < self.silence_db {
            return Ok(false);
        }

        let onset_secs = self.frame_center_secs(candidate_index);
        if let Some(last) = self.last_onset_secs {
            if onset_secs - last < self.min_ioi_secs {
                return Ok(false);
            }
        }

        self.last_onset_secs = Some(onset_secs);
        Ok(true)
    }

    /// Decide the frames still waiting on look-ahead at the end of the input
    /// Returns the onset times found, in order
    pub fn flush(&mut self) -> Result<Vec<f64>, DetectionError> {
        let silence = vec![0.0; self.config.hop_size];
        let mut onsets = Vec::new();
        for _ in 0..=POST_FRAMES {
            if self.process_block(&silence)? {
                onsets.extend(self.last_onset_secs);
            }
        }
        Ok(onsets)
    }

    /// Center of the analysis window for frame `index`, in seconds
    fn frame_center_secs(&self, index: u64) -> f64 {
        let end = (index + 1) * self.config.hop_size as u64;
        let center = end.saturating_sub(self.config.window_size as u64 / 2);
        center as f64 / self.sample_rate as f64
    }
}

fn level_db(block: &[f32]) -> f32 {
    if block.is_empty() {
        return f32::NEG_INFINITY;
    }
    let power = block.iter().map(|s| s * s).sum::<f32>() / block.len() as f32;
    10.0 * (power + 1e-20).log10()
}

fn mean(frames: &VecDeque<NoveltyFrame>) -> f32 {
    if frames.is_empty() {
        return 0.0;
    }
    frames.iter().map(|f| f.value).sum::<f32>() / frames.len() as f32
}

fn median(frames: &VecDeque<NoveltyFrame>) -> f32 {
    if frames.is_empty() {
        return 0.0;
    }
    let mut sorted: Vec<f32> = frames.iter().map(|f| f.value).collect();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    sorted[sorted.len() / 2]
}
