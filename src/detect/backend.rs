// Detector abstraction
// The pipeline only sees onset/beat times; how they are computed stays
// behind these traits

use super::envelope::{onset_strength, peak_pick, EnvelopeConfig, PeakPickConfig};
use super::DetectionError;
use crate::audio::AudioClip;

/// Produces raw onset candidates, in seconds, in non-decreasing order
pub trait OnsetDetector {
    fn detect(&self, clip: &AudioClip) -> Result<Vec<f64>, DetectionError>;
}

/// Produces beat positions, in seconds, in non-decreasing order
pub trait BeatTracker {
    fn track(&self, clip: &AudioClip) -> Result<Vec<f64>, DetectionError>;
}

/// Onset strength envelope followed by peak picking
#[derive(Debug, Clone, Default)]
pub struct SpectralOnsetDetector {
    pub envelope: EnvelopeConfig,
    pub peaks: PeakPickConfig,
}

impl SpectralOnsetDetector {
    pub fn new(envelope: EnvelopeConfig, peaks: PeakPickConfig) -> Self {
        SpectralOnsetDetector { envelope, peaks }
    }
}

impl OnsetDetector for SpectralOnsetDetector {
    fn detect(&self, clip: &AudioClip) -> Result<Vec<f64>, DetectionError> {
        let envelope = onset_strength(&clip.samples, clip.sample_rate, &self.envelope)?;
        let frames = peak_pick(&envelope.values, &self.peaks);

        log::debug!(
            "Picked {} peaks from {} envelope frames",
            frames.len(),
            envelope.len()
        );

        Ok(frames
            .into_iter()
            .map(|frame| envelope.frame_to_secs(frame))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::envelope::tests::noise_bursts;

    #[test]
    fn test_detects_bursts_in_order() {
        let sr = 22050;
        let expected = [0.4, 1.1, 1.9];
        let clip = AudioClip::new(noise_bursts(sr, 2.5, &expected), sr);

        let detector = SpectralOnsetDetector::default();
        let onsets = detector.detect(&clip).unwrap();

        assert_eq!(onsets.len(), expected.len(), "got {:?}", onsets);
        assert!(onsets.windows(2).all(|w| w[0] <= w[1]));
        for (found, want) in onsets.iter().zip(expected.iter()) {
            assert!((found - want).abs() < 0.05);
        }
    }

    #[test]
    fn test_empty_clip() {
        let detector = SpectralOnsetDetector::default();
        let onsets = detector.detect(&AudioClip::new(Vec::new(), 44100)).unwrap();
        assert!(onsets.is_empty());
    }

    #[test]
    fn test_trait_object_usage() {
        let detector: Box<dyn OnsetDetector> = Box::new(SpectralOnsetDetector::new(
            EnvelopeConfig::default(),
            PeakPickConfig::combined(),
        ));
        let silent = AudioClip::new(vec![0.0; 22050], 22050);
        assert!(detector.detect(&silent).unwrap().is_empty());
    }
}
