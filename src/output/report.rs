// JSON onset report

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use super::OutputError;
use crate::detect::DetectionMethod;

/// Serialized result of a whole-clip detection run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnsetReport {
    pub onset_times: Vec<f64>,
    pub method: DetectionMethod,
    pub min_db: f64,

    /// Always `onset_times.len()`
    pub count: usize,
}

impl OnsetReport {
    pub fn new(onset_times: Vec<f64>, method: DetectionMethod, min_db: f64) -> Self {
        OnsetReport {
            count: onset_times.len(),
            onset_times,
            method,
            min_db,
        }
    }

    /// Pretty JSON with two-space indentation
    pub fn to_json(&self) -> Result<String, OutputError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the full document to `path` in one call
    pub fn write_to(&self, path: &Path) -> Result<(), OutputError> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_count_matches_times() {
        let report = OnsetReport::new(vec![0.5, 1.0, 1.5], DetectionMethod::Onset, -40.0);
        assert_eq!(report.count, 3);
    }

    #[test]
    fn test_json_round_trip() {
        let report = OnsetReport::new(vec![0.25, 0.75], DetectionMethod::Combined, -50.0);
        let json = report.to_json().unwrap();

        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["method"], "combined");
        assert_eq!(value["min_db"], -50.0);
        assert_eq!(value["count"], 2);
        assert_eq!(value["onset_times"].as_array().unwrap().len(), 2);

        let parsed: OnsetReport = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, report);
    }

    #[test]
    fn test_two_space_indent() {
        let json = OnsetReport::new(vec![], DetectionMethod::Beat, -50.0)
            .to_json()
            .unwrap();
        assert!(json.starts_with("{\n  \"onset_times\": []"));
        assert!(json.contains("\n  \"count\": 0\n"));
    }

    #[test]
    fn test_write_to_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("onsets.json");

        let report = OnsetReport::new(vec![1.0], DetectionMethod::Onset, -30.0);
        report.write_to(&path).unwrap();

        let parsed: OnsetReport =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.count, 1);
        assert_eq!(parsed.method, DetectionMethod::Onset);
    }
}
