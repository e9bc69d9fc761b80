// Streaming beatmap run
// Block detector, refractory and edge filters, beatmap text file

use std::path::Path;

use super::ensure_input_exists;
use crate::audio::BlockSource;
use crate::config::BeatmapConfig;
use crate::detect::{DetectionConfig, DetectionError, StreamingOnsetDetector};
use crate::error::OnsetResult;
use crate::output::write_beatmap;
use crate::postprocess::{Filter, FilterChain};

/// Result of a beatmap run
#[derive(Debug, Clone)]
pub struct BeatmapOutcome {
    /// Final onset times, as written to the beatmap
    pub onsets: Vec<f64>,

    /// Number of onsets the detector produced before filtering
    pub raw_count: usize,

    /// Policy that was active for the run
    pub detection: DetectionConfig,

    pub sample_rate: u32,
}

/// Run the streaming detector over `path` in hop-sized blocks
/// Returns raw onset times and the file's sample rate
pub fn stream_onsets(
    path: &Path,
    detection: &DetectionConfig,
) -> Result<(Vec<f64>, u32), DetectionError> {
    let hop_size = detection.hop_size;
    let mut source = BlockSource::open(path, hop_size)?;
    let sample_rate = source.sample_rate();
    let mut detector = StreamingOnsetDetector::new(detection.clone(), sample_rate)?;

    log::info!("Using streaming onset detection:");
    log::info!("  - Method: {}", detection.function.name());
    log::info!("  - Threshold: {}", detection.threshold);
    log::info!("  - Window size: {}", detection.window_size);
    log::info!("  - Hop size: {}", hop_size);
    log::info!("  - Sample rate: {}", sample_rate);

    let mut onsets = Vec::new();
    let mut total_frames = 0usize;

    loop {
        let (block, frames_read) = source.read_block()?;
        if detector.process_block(&block)? {
            if let Some(onset) = detector.last_onset_secs() {
                log::info!("Onset detected at: {:.4}s", onset);
                onsets.push(onset);
            }
        }
        total_frames += frames_read;
        if frames_read < hop_size {
            break;
        }
    }

    for onset in detector.flush()? {
        log::info!("Onset detected at: {:.4}s", onset);
        onsets.push(onset);
    }

    log::debug!("Read {} frames from {}", total_frames, path.display());
    Ok((onsets, sample_rate))
}

/// Detect, filter and write the beatmap described by `config`
pub fn run_beatmap(config: &BeatmapConfig) -> OnsetResult<BeatmapOutcome> {
    ensure_input_exists(&config.input_path)?;

    let detection = DetectionConfig::for_expected_notes(config.expected_notes, config.min_wait_frames);
    let (raw, sample_rate) = stream_onsets(&config.input_path, &detection)?;
    let raw_count = raw.len();

    let onsets = FilterChain::new()
        .then(Filter::Refractory {
            min_gap_secs: detection.min_gap_secs(sample_rate),
        })
        .then(Filter::MinTime(config.min_onset_secs))
        .then(Filter::MaxTime(config.max_onset_secs))
        .apply(raw);

    write_beatmap(&config.output_path, &onsets)?;
    log::info!(
        "Wrote {} onsets to {}",
        onsets.len(),
        config.output_path.display()
    );

    Ok(BeatmapOutcome {
        onsets,
        raw_count,
        detection,
        sample_rate,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::OnsetError;
    use crate::pipeline::tests::write_wav;
    use std::fs;
    use tempfile::TempDir;

    const SR: u32 = 44100;

    fn plucks(duration_secs: f64, onsets: &[f64]) -> Vec<f32> {
        let mut signal = vec![0.0f32; (duration_secs * SR as f64) as usize];
        for &onset in onsets {
            let start = (onset * SR as f64) as usize;
            for (i, sample) in signal[start..].iter_mut().enumerate().take(SR as usize / 4) {
                let t = i as f32 / SR as f32;
                *sample += 0.8 * (-t / 0.02).exp() * (2.0 * std::f32::consts::PI * 1500.0 * t).sin();
            }
        }
        signal
    }

    fn config_in(dir: &TempDir) -> BeatmapConfig {
        BeatmapConfig {
            input_path: dir.path().join("results.wav"),
            output_path: dir.path().join("results.beatmap.txt"),
            ..BeatmapConfig::default()
        }
    }

    #[test]
    fn test_beatmap_end_to_end() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        write_wav(&config.input_path, SR, &plucks(3.0, &[0.5, 1.0, 1.5, 2.0, 2.5]));

        let outcome = run_beatmap(&config).unwrap();
        assert_eq!(outcome.sample_rate, SR);
        assert_eq!(outcome.onsets.len(), 5, "got {:?}", outcome.onsets);

        let written = fs::read_to_string(&config.output_path).unwrap();
        assert_eq!(written.lines().count(), 5);
        assert!(!written.ends_with('\n'));
        for line in written.lines() {
            let (_, decimals) = line.split_once('.').unwrap();
            assert_eq!(decimals.len(), 4);
        }
    }

    #[test]
    fn test_refractory_gap_merges_fast_notes() {
        let temp_dir = TempDir::new().unwrap();
        let config = BeatmapConfig {
            // 60 hops of 256 samples at 44.1 kHz is ~0.35 s
            min_wait_frames: 60,
            ..config_in(&temp_dir)
        };
        write_wav(&config.input_path, SR, &plucks(2.0, &[0.5, 0.7, 1.2]));

        let outcome = run_beatmap(&config).unwrap();
        assert_eq!(outcome.raw_count, 3);
        assert_eq!(outcome.onsets.len(), 2);
        assert!((outcome.onsets[0] - 0.5).abs() < 0.03);
        assert!((outcome.onsets[1] - 1.2).abs() < 0.03);
    }

    #[test]
    fn test_edge_bounds_apply() {
        let temp_dir = TempDir::new().unwrap();
        let config = BeatmapConfig {
            max_onset_secs: 1.0,
            ..config_in(&temp_dir)
        };
        write_wav(&config.input_path, SR, &plucks(2.0, &[0.5, 1.5]));

        let outcome = run_beatmap(&config).unwrap();
        assert_eq!(outcome.raw_count, 2);
        assert_eq!(outcome.onsets.len(), 1);
        assert!(outcome.onsets.iter().all(|&t| (0.1..=1.0).contains(&t)));
    }

    #[test]
    fn test_default_policy_without_refractory_keeps_one_onset_per_note() {
        let temp_dir = TempDir::new().unwrap();
        let config = BeatmapConfig {
            expected_notes: 14,
            min_wait_frames: 0,
            ..config_in(&temp_dir)
        };
        let expected = [0.5, 1.0, 1.5, 2.0];
        write_wav(&config.input_path, SR, &plucks(2.5, &expected));

        let outcome = run_beatmap(&config).unwrap();
        assert_eq!(outcome.detection.function.name(), "default");
        assert_eq!(outcome.raw_count, expected.len(), "got {:?}", outcome.onsets);
        assert_eq!(outcome.onsets.len(), expected.len());
        for (found, want) in outcome.onsets.iter().zip(expected.iter()) {
            assert!((found - want).abs() < 0.03, "found {} want {}", found, want);
        }
    }

    #[test]
    fn test_silent_recording_writes_empty_beatmap() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        write_wav(&config.input_path, SR, &vec![0.0; SR as usize]);

        let outcome = run_beatmap(&config).unwrap();
        assert!(outcome.onsets.is_empty());
        assert_eq!(fs::read_to_string(&config.output_path).unwrap(), "");
    }

    #[test]
    fn test_missing_input_writes_nothing() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);

        let err = run_beatmap(&config).unwrap_err();
        assert!(matches!(err, OnsetError::MissingInputFile(_)));
        assert!(!config.output_path.exists());
    }

    #[test]
    fn test_corrupt_input_is_detection_failure() {
        let temp_dir = TempDir::new().unwrap();
        let config = config_in(&temp_dir);
        fs::write(&config.input_path, b"RIFF but not really").unwrap();

        let err = run_beatmap(&config).unwrap_err();
        assert!(matches!(err, OnsetError::Detection(_)));
        assert!(!config.output_path.exists());
    }
}
