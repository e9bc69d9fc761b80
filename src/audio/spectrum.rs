// Spectral helpers shared by the onset detectors
// Hann windowing and real FFT magnitude spectra

use realfft::num_complex::Complex;
use realfft::{FftError, RealFftPlanner, RealToComplex};
use std::sync::Arc;

/// Apply Hann window function to reduce spectral leakage
pub fn apply_hann_window(samples: &mut [f32]) {
    let n = samples.len();

    if n == 0 {
        return;
    }

    for (i, sample) in samples.iter_mut().enumerate() {
        let window_val = 0.5 * (1.0 - (2.0 * std::f32::consts::PI * i as f32 / n as f32).cos());
        *sample *= window_val;
    }
}

/// Reusable windowed FFT for a fixed frame size
/// Keeps its buffers between calls so frame-by-frame analysis does not reallocate
pub struct SpectrumAnalyzer {
    frame_size: usize,
    window: Vec<f32>,
    fft: Arc<dyn RealToComplex<f32>>,
    input: Vec<f32>,
    output: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl SpectrumAnalyzer {
    pub fn new(frame_size: usize) -> Self {
        let mut planner = RealFftPlanner::<f32>::new();
        let fft = planner.plan_fft_forward(frame_size);

        let mut window = vec![1.0; frame_size];
        apply_hann_window(&mut window);

        SpectrumAnalyzer {
            frame_size,
            window,
            input: fft.make_input_vec(),
            output: fft.make_output_vec(),
            scratch: fft.make_scratch_vec(),
            fft,
        }
    }

    /// Number of magnitude bins produced per frame (frame_size / 2 + 1)
    pub fn num_bins(&self) -> usize {
        self.frame_size / 2 + 1
    }

    /// Window `frame` and write its magnitude spectrum into `magnitudes`
    /// Frames shorter than the analysis size are zero-padded
    pub fn magnitudes(&mut self, frame: &[f32], magnitudes: &mut Vec<f32>) -> Result<(), FftError> {
        let copy_len = frame.len().min(self.frame_size);
        self.input[..copy_len].copy_from_slice(&frame[..copy_len]);
        self.input[copy_len..].fill(0.0);

        for (sample, w) in self.input.iter_mut().zip(self.window.iter()) {
            *sample *= w;
        }

        self.fft
            .process_with_scratch(&mut self.input, &mut self.output, &mut self.scratch)?;

        magnitudes.clear();
        magnitudes.extend(self.output.iter().map(|c| c.norm()));
        Ok(())
    }
}
