// Whole-clip onset/beat run
// Loads the recording, runs the selected method, and reports success or failure
// explicitly so "no onsets" and "detection failed" stay distinguishable

use std::path::Path;

use crate::audio::{load_wav, AudioClip};
use crate::config::OnsetRunConfig;
use crate::detect::beats::BeatConfig;
use crate::detect::{
    BeatTracker, DetectionError, DetectionMethod, DynamicBeatTracker, OnsetDetector,
    PeakPickConfig, SpectralOnsetDetector,
};
use crate::output::OnsetReport;
use crate::postprocess::{AmplitudeGate, BeatFilterPolicy, Filter, FilterChain};

/// Outcome of analysing one file
#[derive(Debug)]
pub enum DetectionOutcome {
    Detected(Vec<f64>),
    Failed(DetectionError),
}

impl DetectionOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, DetectionOutcome::Failed(_))
    }

    /// Onset times, with a failed run degrading to an empty list
    pub fn onset_times(self) -> Vec<f64> {
        match self {
            DetectionOutcome::Detected(times) => times,
            DetectionOutcome::Failed(_) => Vec::new(),
        }
    }
}

/// Analyse the WAV file at `path`
///
/// Failures are logged and returned as [`DetectionOutcome::Failed`] rather
/// than aborting, so batch callers can carry on with the next file.
pub fn analyze_file(path: &Path, config: &OnsetRunConfig) -> DetectionOutcome {
    let result = load_wav(path)
        .map_err(DetectionError::from)
        .and_then(|audio| {
            log::info!(
                "Loaded {}: {} Hz, {} channels, {:.2}s",
                path.display(),
                audio.sample_rate,
                audio.channels,
                audio.duration_secs()
            );
            analyze_clip(&audio.to_clip(), config)
        });

    match result {
        Ok(times) => {
            log::info!("Detected {} times with method {}", times.len(), config.method);
            DetectionOutcome::Detected(times)
        }
        Err(e) => {
            log::error!("Error processing {}: {}", path.display(), e);
            DetectionOutcome::Failed(e)
        }
    }
}

/// Analyse `path` and wrap the result in the report written by the CLI
/// `method` and `min_db` echo the run's settings; a failed run reports no onsets
pub fn onset_report(path: &Path, config: &OnsetRunConfig) -> OnsetReport {
    let outcome = analyze_file(path, config);
    OnsetReport::new(outcome.onset_times(), config.method, config.min_db)
}

/// Run the configured method over an in-memory clip
pub fn analyze_clip(clip: &AudioClip, config: &OnsetRunConfig) -> Result<Vec<f64>, DetectionError> {
    let gate = AmplitudeGate::from_db(config.min_db);

    match config.method {
        DetectionMethod::Onset => {
            let detector =
                SpectralOnsetDetector::new(config.envelope.clone(), PeakPickConfig::onset_only());
            Ok(gate.apply(&detector.detect(clip)?, clip))
        }
        DetectionMethod::Beat => {
            let tracker = DynamicBeatTracker::new(
                config.envelope.clone(),
                BeatConfig::with_tightness(config.beat_tightness),
            );
            Ok(gate.apply(&tracker.track(clip)?, clip))
        }
        DetectionMethod::Combined => {
            let detector =
                SpectralOnsetDetector::new(config.envelope.clone(), PeakPickConfig::combined());
            let tracker = DynamicBeatTracker::new(
                config.envelope.clone(),
                BeatConfig::with_tightness(config.combined_tightness),
            );
            detect_combined(clip, &detector, &tracker, &gate, &config.beat_filter)
        }
    }
}

/// Gated onsets, kept when close to a tracked beat unless that over-prunes
pub fn detect_combined(
    clip: &AudioClip,
    detector: &dyn OnsetDetector,
    tracker: &dyn BeatTracker,
    gate: &AmplitudeGate,
    policy: &BeatFilterPolicy,
) -> Result<Vec<f64>, DetectionError> {
    let onsets = gate.apply(&detector.detect(clip)?, clip);
    let beats = tracker.track(clip)?;

    log::debug!("{} onsets, {} beats before beat filtering", onsets.len(), beats.len());

    Ok(FilterChain::new()
        .then(Filter::BeatProximity {
            beats,
            policy: policy.clone(),
        })
        .apply(onsets))
}
