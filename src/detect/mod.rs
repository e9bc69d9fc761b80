// Onset and beat detection
// Policy selection, spectral detectors, and beat tracking

pub mod backend;
pub mod beats;
pub mod envelope;
pub mod odf;
pub mod policy;
pub mod streaming;

pub use backend::{BeatTracker, OnsetDetector, SpectralOnsetDetector};
pub use beats::{track_beats, DynamicBeatTracker};
pub use envelope::{onset_strength, peak_pick, EnvelopeConfig, PeakPickConfig};
pub use odf::OnsetFunction;
pub use policy::{DetectionConfig, DetectionMethod};
pub use streaming::StreamingOnsetDetector;

use thiserror::Error;

use crate::audio::AudioError;

/// Errors raised while acquiring raw onsets or beats
#[derive(Debug, Error)]
pub enum DetectionError {
    #[error("Invalid detection config: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Audio(#[from] AudioError),

    #[error("FFT failed: {0}")]
    Fft(#[from] realfft::FftError),
}
