// Detection policy selection
// Maps the expected note count (or an explicit method) onto detector parameters

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::odf::OnsetFunction;
use crate::error::OnsetError;

/// FFT size used by the streaming detector
pub const STREAM_WINDOW_SIZE: usize = 512;

/// Hop between streaming frames (half a window)
pub const STREAM_HOP_SIZE: usize = STREAM_WINDOW_SIZE / 2;

/// Parameters for one streaming detection run
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionConfig {
    /// Onset detection function fed to the peak picker
    pub function: OnsetFunction,

    /// Peak-picking sensitivity; higher values reject weaker onsets
    pub threshold: f32,

    /// FFT window size in samples
    pub window_size: usize,

    /// Hop size in samples (advance between frames)
    pub hop_size: usize,

    /// Minimum frames between kept onsets; zero or less disables the gap filter
    pub min_wait_frames: i64,
}

impl DetectionConfig {
    /// Pick detector parameters from the number of notes the exercise expects
    ///
    /// | expected notes | function | threshold |
    /// |---|---|---|
    /// | <= 8 | HFC | 0.3 |
    /// | 9-16 | spectral flux | 0.5 |
    /// | > 16 | energy | 0.7 |
    pub fn for_expected_notes(expected_notes: i64, min_wait_frames: i64) -> Self {
        if expected_notes <= 0 {
            log::warn!(
                "Expected note count {} is not positive, using the most sensitive policy",
                expected_notes
            );
        }

        let (function, threshold) = if expected_notes <= 8 {
            // Few notes - use more sensitive detection
            (OnsetFunction::Hfc, 0.3)
        } else if expected_notes <= 16 {
            (OnsetFunction::SpectralFlux, 0.5)
        } else {
            // Many notes - less sensitive detection
            (OnsetFunction::Energy, 0.7)
        };

        DetectionConfig {
            function,
            threshold,
            window_size: STREAM_WINDOW_SIZE,
            hop_size: STREAM_HOP_SIZE,
            min_wait_frames,
        }
    }

    /// Refractory gap in seconds: min_wait_frames * hop_size / sample_rate
    pub fn min_gap_secs(&self, sample_rate: u32) -> f64 {
        if self.min_wait_frames <= 0 || sample_rate == 0 {
            return 0.0;
        }
        self.min_wait_frames as f64 * self.hop_size as f64 / sample_rate as f64
    }
}

/// Whole-clip detection strategy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DetectionMethod {
    /// Onset-strength peaks only
    Onset,

    /// Beat tracker output only
    Beat,

    /// Onset peaks filtered by proximity to tracked beats
    #[default]
    Combined,
}

impl DetectionMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            DetectionMethod::Onset => "onset",
            DetectionMethod::Beat => "beat",
            DetectionMethod::Combined => "combined",
        }
    }
}

impl fmt::Display for DetectionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectionMethod {
    type Err = OnsetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "onset" => Ok(DetectionMethod::Onset),
            "beat" => Ok(DetectionMethod::Beat),
            "combined" => Ok(DetectionMethod::Combined),
            other => Err(OnsetError::InvalidMethod(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_buckets() {
        let few = DetectionConfig::for_expected_notes(8, 30);
        assert_eq!(few.function, OnsetFunction::Hfc);
        assert_eq!(few.threshold, 0.3);

        let medium = DetectionConfig::for_expected_notes(9, 30);
        assert_eq!(medium.function, OnsetFunction::SpectralFlux);
        assert_eq!(medium.threshold, 0.5);

        let upper_medium = DetectionConfig::for_expected_notes(16, 30);
        assert_eq!(upper_medium.function, OnsetFunction::SpectralFlux);

        let many = DetectionConfig::for_expected_notes(17, 30);
        assert_eq!(many.function, OnsetFunction::Energy);
        assert_eq!(many.threshold, 0.7);
    }

    #[test]
    fn test_non_positive_counts_use_sensitive_bucket() {
        assert_eq!(DetectionConfig::for_expected_notes(0, 30).function, OnsetFunction::Hfc);
        assert_eq!(DetectionConfig::for_expected_notes(-4, 30).function, OnsetFunction::Hfc);
    }

    #[test]
    fn test_fixed_frame_sizes() {
        let config = DetectionConfig::for_expected_notes(14, 30);
        assert_eq!(config.window_size, 512);
        assert_eq!(config.hop_size, 256);
    }

    #[test]
    fn test_min_gap_secs() {
        let config = DetectionConfig::for_expected_notes(14, 30);
        // 30 * 256 / 44100
        assert!((config.min_gap_secs(44100) - 0.174149).abs() < 1e-6);

        let disabled = DetectionConfig::for_expected_notes(14, 0);
        assert_eq!(disabled.min_gap_secs(44100), 0.0);
    }

    #[test]
    fn test_method_parsing() {
        assert_eq!("onset".parse::<DetectionMethod>().unwrap(), DetectionMethod::Onset);
        assert_eq!("beat".parse::<DetectionMethod>().unwrap(), DetectionMethod::Beat);
        assert_eq!(
            "combined".parse::<DetectionMethod>().unwrap(),
            DetectionMethod::Combined
        );

        let err = "tempo".parse::<DetectionMethod>().unwrap_err();
        assert!(matches!(err, OnsetError::InvalidMethod(ref m) if m == "tempo"));
    }

    #[test]
    fn test_method_serializes_lowercase() {
        let json = serde_json::to_string(&DetectionMethod::Combined).unwrap();
        assert_eq!(json, "\"combined\"");
        assert_eq!(DetectionMethod::default().to_string(), "combined");
    }
}
