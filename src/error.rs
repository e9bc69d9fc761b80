// Top-level error type for the onset pipelines

use std::path::PathBuf;
use thiserror::Error;

use crate::detect::DetectionError;
use crate::output::OutputError;

#[derive(Debug, Error)]
pub enum OnsetError {
    #[error("Audio file {} not found", .0.display())]
    MissingInputFile(PathBuf),

    #[error("Unknown method: {0}")]
    InvalidMethod(String),

    #[error("Onset detection failed: {0}")]
    Detection(#[from] DetectionError),

    #[error("Failed to write results: {0}")]
    Output(#[from] OutputError),
}

pub type OnsetResult<T> = Result<T, OnsetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_carry_no_error_prefix() {
        let err = OnsetError::from(DetectionError::InvalidConfig("hop 0".to_string()));
        assert_eq!(err.to_string(), "Onset detection failed: Invalid detection config: hop 0");
        assert!(!err.to_string().starts_with("Error"));
    }
}
