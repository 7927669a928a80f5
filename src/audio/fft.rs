use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::sync::Arc;

/// Hamming-windowed forward FFT producing a positive-frequency magnitude spectrum.
///
/// All working buffers are allocated once at construction and reused per frame.
pub struct SpectralTransform {
    fft_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
    spectrum: Vec<f32>,
}

impl SpectralTransform {
    /// `fft_size` must be a power of two; this is checked when the config is validated.
    pub fn new(fft_size: usize) -> Self {
        debug_assert!(fft_size.is_power_of_two());

        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch = vec![Complex::new(0.0, 0.0); fft.get_inplace_scratch_len()];

        Self {
            fft_size,
            fft,
            window: Self::hamming_window(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch,
            spectrum: vec![0.0; fft_size / 2],
        }
    }

    fn hamming_window(size: usize) -> Vec<f32> {
        if size < 2 {
            return vec![1.0; size];
        }
        (0..size)
            .map(|i| {
                let phase = 2.0 * std::f64::consts::PI * i as f64 / (size - 1) as f64;
                (0.54 - 0.46 * phase.cos()) as f32
            })
            .collect()
    }

    /// Number of positive-frequency bins (N/2).
    pub fn spectrum_len(&self) -> usize {
        self.spectrum.len()
    }

    /// Window `frame`, transform it and return the magnitude of the first N/2 bins.
    ///
    /// The forward result is scaled by 1/N, so a full-scale sinusoid on a bin
    /// centre peaks at roughly a quarter (half amplitude times the window's mean gain).
    pub fn process(&mut self, frame: &[f32]) -> &[f32] {
        debug_assert_eq!(frame.len(), self.fft_size);

        for ((slot, &sample), &w) in self.buffer.iter_mut().zip(frame).zip(&self.window) {
            *slot = Complex::new(sample * w, 0.0);
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        let scale = 1.0 / self.fft_size as f32;
        for (magnitude, c) in self.spectrum.iter_mut().zip(&self.buffer) {
            *magnitude = (c.re * c.re + c.im * c.im).sqrt() * scale;
        }

        &self.spectrum
    }
}
