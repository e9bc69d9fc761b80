// Result emitters
// Plain-text beatmaps and JSON onset reports

pub mod beatmap;
pub mod report;

pub use beatmap::{format_beatmap, write_beatmap};
pub use report::OnsetReport;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}
