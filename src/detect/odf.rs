// Onset detection functions
// Reduce one magnitude spectrum (and its predecessor) to a single novelty value

/// Onset detection function used by the streaming detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnsetFunction {
    /// High Frequency Content: bin-weighted energy, sensitive to pick attacks
    Hfc,

    /// Half-wave rectified log-magnitude spectral flux (the balanced default)
    SpectralFlux,

    /// Local spectral energy, the least sensitive option
    Energy,
}

impl OnsetFunction {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            OnsetFunction::Hfc => "hfc",
            OnsetFunction::SpectralFlux => "default",
            OnsetFunction::Energy => "energy",
        }
    }

    /// Compute the novelty value of `current` given the previous frame's magnitudes
    pub fn compute(&self, current: &[f32], previous: &[f32]) -> f32 {
        match self {
            OnsetFunction::Hfc => current
                .iter()
                .enumerate()
                .map(|(k, &m)| k as f32 * m * m)
                .sum(),
            OnsetFunction::SpectralFlux => current
                .iter()
                .zip(previous.iter())
                .map(|(&curr, &prev)| {
                    let diff = log_compress(curr) - log_compress(prev);
                    diff.max(0.0)
                })
                .sum(),
            OnsetFunction::Energy => current.iter().map(|&m| m * m).sum(),
        }
    }
}

/// Logarithmic magnitude compression, log(1 + 10 * m)
fn log_compress(magnitude: f32) -> f32 {
    (1.0 + 10.0 * magnitude).ln()
}
