// Amplitude gate
// Drops onsets whose following samples never rise above a minimum level

use crate::audio::AudioClip;

/// Samples inspected after each onset
const DEFAULT_GATE_WINDOW: usize = 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct AmplitudeGate {
    /// Linear peak amplitude that must be exceeded
    pub min_linear: f32,

    /// Number of samples after the onset searched for the peak
    pub window: usize,
}

impl AmplitudeGate {
    /// Gate at `min_db` dBFS, i.e. 10^(min_db / 20)
    pub fn from_db(min_db: f64) -> Self {
        AmplitudeGate {
            min_linear: 10f64.powf(min_db / 20.0) as f32,
            window: DEFAULT_GATE_WINDOW,
        }
    }

    /// Keep the times whose window `[t * sr, t * sr + window)` peaks above the gate
    /// Times at or past the end of the clip have no samples and are dropped
    pub fn apply(&self, times: &[f64], clip: &AudioClip) -> Vec<f64> {
        let kept: Vec<f64> = times
            .iter()
            .copied()
            .filter(|&t| self.passes(t, clip))
            .collect();

        if kept.len() < times.len() {
            log::debug!(
                "Amplitude gate dropped {} of {} times",
                times.len() - kept.len(),
                times.len()
            );
        }
        kept
    }

    fn passes(&self, time_secs: f64, clip: &AudioClip) -> bool {
        let start = (time_secs.max(0.0) * clip.sample_rate as f64) as usize;
        if start >= clip.samples.len() {
            return false;
        }
        let end = (start + self.window).min(clip.samples.len());

        clip.samples[start..end]
            .iter()
            .any(|s| s.abs() > self.min_linear)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_db() {
        let gate = AmplitudeGate::from_db(-20.0);
        assert!((gate.min_linear - 0.1).abs() < 1e-6);
        assert_eq!(gate.window, 1024);

        let unity = AmplitudeGate::from_db(0.0);
        assert!((unity.min_linear - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_gate_keeps_loud_onsets() {
        let sr = 1000;
        let mut samples = vec![0.0f32; 3000];
        samples[1010] = 0.5;
        let clip = AudioClip::new(samples, sr);

        let gate = AmplitudeGate::from_db(-50.0);
        let kept = gate.apply(&[0.5, 1.0, 2.5], &clip);
        assert_eq!(kept, vec![0.5, 1.0]);
    }

    #[test]
    fn test_gate_drops_times_past_end() {
        let clip = AudioClip::new(vec![1.0; 100], 100);
        let gate = AmplitudeGate::from_db(-50.0);
        assert_eq!(gate.apply(&[0.5, 1.0, 3.0], &clip), vec![0.5]);
    }
}
