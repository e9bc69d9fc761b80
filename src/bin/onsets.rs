// Whole-clip onset/beat detection with JSON output

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use fretmark::pipeline::ensure_input_exists;
use fretmark::{init_logging, onset_report, DetectionMethod, OnsetError, OnsetRunConfig};

#[derive(Parser, Debug)]
#[command(author, version, about = "Onset detection for guitar accuracy grading", long_about = None)]
struct Args {
    /// Path to audio file
    audio_file: PathBuf,

    /// Minimum dB threshold
    #[arg(long, default_value_t = -50.0, allow_negative_numbers = true)]
    min_db: f64,

    /// Detection method
    #[arg(long, value_enum, default_value_t = DetectionMethod::Combined)]
    method: DetectionMethod,

    /// Output JSON file (default: stdout)
    #[arg(long)]
    output: Option<PathBuf>,
}

impl Args {
    fn run_config(&self) -> OnsetRunConfig {
        OnsetRunConfig {
            min_db: self.min_db,
            method: self.method,
            ..OnsetRunConfig::default()
        }
    }
}

fn run(args: &Args) -> Result<(), OnsetError> {
    ensure_input_exists(&args.audio_file)?;

    let report = onset_report(&args.audio_file, &args.run_config());
    match &args.output {
        Some(path) => report.write_to(path)?,
        None => println!("{}", report.to_json()?),
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fretmark::OnsetReport;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let args = Args::try_parse_from(["fretmark-onsets", "take.wav"]).unwrap();
        assert_eq!(args.audio_file, PathBuf::from("take.wav"));
        assert_eq!(args.min_db, -50.0);
        assert_eq!(args.method, DetectionMethod::Combined);
        assert!(args.output.is_none());
    }

    #[test]
    fn test_flags_map_onto_run_config() {
        let args = Args::try_parse_from([
            "fretmark-onsets",
            "take.wav",
            "--min-db",
            "-35.5",
            "--method",
            "beat",
        ])
        .unwrap();

        let config = args.run_config();
        assert_eq!(config.min_db, -35.5);
        assert_eq!(config.method, DetectionMethod::Beat);
    }

    #[test]
    fn test_unknown_method_is_rejected() {
        let parsed = Args::try_parse_from(["fretmark-onsets", "take.wav", "--method", "tempo"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_missing_file_fails_without_output() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out.json");
        let audio = temp_dir.path().join("missing.wav");
        let args = Args::try_parse_from([
            "fretmark-onsets",
            audio.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();

        let err = run(&args).unwrap_err();
        assert!(matches!(err, OnsetError::MissingInputFile(_)));
        assert!(!output.exists());
    }

    #[test]
    fn test_corrupt_file_writes_empty_report() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("out.json");
        let audio = temp_dir.path().join("broken.wav");
        fs::write(&audio, b"not audio").unwrap();
        let args = Args::try_parse_from([
            "fretmark-onsets",
            audio.to_str().unwrap(),
            "--min-db",
            "-40",
            "--method",
            "onset",
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();

        run(&args).unwrap();

        let report: OnsetReport =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(report.count, 0);
        assert!(report.onset_times.is_empty());
        assert_eq!(report.method, DetectionMethod::Onset);
        assert_eq!(report.min_db, -40.0);
    }
}
