// Audio processing module
// Handles WAV file ingestion, block streaming and spectral helpers

pub mod ingest;
pub mod spectrum;
pub mod stream;

pub use ingest::{ingest_wav, load_wav, AudioClip, AudioData, AudioError};
pub use spectrum::{apply_hann_window, SpectrumAnalyzer};
pub use stream::BlockSource;
