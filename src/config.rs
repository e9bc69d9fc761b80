// Run configuration for the two pipelines

use std::path::PathBuf;

use crate::detect::{DetectionMethod, EnvelopeConfig};
use crate::postprocess::BeatFilterPolicy;

/// Settings for the streaming beatmap run
#[derive(Debug, Clone)]
pub struct BeatmapConfig {
    /// Recording to analyse
    pub input_path: PathBuf,

    /// Where the newline-separated onset times are written
    pub output_path: PathBuf,

    /// Number of notes the exercise expects; selects the detection policy
    pub expected_notes: i64,

    /// Refractory gap in detector hops; zero or less disables it
    pub min_wait_frames: i64,

    /// Onsets before this time are treated as start-up transients
    pub min_onset_secs: f64,

    /// Onsets after this time are past the end of the exercise
    pub max_onset_secs: f64,
}

impl Default for BeatmapConfig {
    fn default() -> Self {
        BeatmapConfig {
            input_path: PathBuf::from("./results.wav"),
            output_path: PathBuf::from("./results.beatmap.txt"),
            expected_notes: 14,
            min_wait_frames: 30,
            min_onset_secs: 0.1,
            max_onset_secs: 15.0,
        }
    }
}

/// Settings for the whole-clip onset/beat run
#[derive(Debug, Clone)]
pub struct OnsetRunConfig {
    /// Peak level (dBFS) an onset's first 1024 samples must exceed
    pub min_db: f64,

    pub method: DetectionMethod,

    pub envelope: EnvelopeConfig,

    /// Beat tracker tightness for the beat-only method
    pub beat_tightness: f64,

    /// Beat tracker tightness for the combined method
    pub combined_tightness: f64,

    pub beat_filter: BeatFilterPolicy,
}

impl Default for OnsetRunConfig {
    fn default() -> Self {
        OnsetRunConfig {
            min_db: -50.0,
            method: DetectionMethod::Combined,
            envelope: EnvelopeConfig::default(),
            beat_tightness: 100.0,
            combined_tightness: 80.0,
            beat_filter: BeatFilterPolicy::default(),
        }
    }
}
