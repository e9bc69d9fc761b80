// Fretmark - onset detection for guitar practice recordings
// Module declarations

pub mod audio;
pub mod config;
pub mod detect;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod postprocess;

pub use config::{BeatmapConfig, OnsetRunConfig};
pub use detect::{DetectionConfig, DetectionMethod};
pub use error::{OnsetError, OnsetResult};
pub use output::OnsetReport;
pub use pipeline::{analyze_file, onset_report, run_beatmap, DetectionOutcome};

/// Install the stderr logger used by the binaries
/// `RUST_LOG` overrides the default `info` level
pub fn init_logging() {
    let env = env_logger::Env::default().default_filter_or("info");
    if let Err(e) = env_logger::Builder::from_env(env).try_init() {
        eprintln!("Logger already initialized: {}", e);
    }
}
