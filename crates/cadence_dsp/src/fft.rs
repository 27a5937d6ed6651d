//! FFT Spectrum Analyzer
//!
//! Transforms one block of samples into a linear magnitude spectrum.
//!
//! # Architecture
//!
//! Each call analyses only the block it is given: there is no ring buffer,
//! overlap or history. All state that survives between calls (FFT plan, Hann
//! window table, work buffers) depends only on the spectrum size, so the
//! analyzer can run inside the audio callback without allocating.
//!
//! The FFT is `2 * spectrum_size` points long, which yields
//! `spectrum_size + 1` bins from DC to Nyquist. Bin `i` sits at
//! `i * (sample_rate / 2) / spectrum_size` Hz.

use std::sync::Arc;

use rustfft::{num_complex::Complex, Fft, FftPlanner};

use crate::error::DspError;

/// Default number of spectrum bins (excluding the Nyquist bin)
pub const DEFAULT_SPECTRUM_SIZE: usize = 512;

/// Hann window coefficient for sample `n` of a window of `size` samples
fn hann_window(n: usize, size: usize) -> f32 {
    if size < 2 {
        return 1.0;
    }
    0.5 * (1.0 - (2.0 * std::f32::consts::PI * n as f32 / (size - 1) as f32).cos())
}

/// Pre-computed Hann window lookup table for full-length blocks
struct HannWindow {
    coeffs: Vec<f32>,
}

impl HannWindow {
    fn new(size: usize) -> Self {
        let coeffs = (0..size).map(|i| hann_window(i, size)).collect();
        Self { coeffs }
    }

    /// Coefficient for sample `index` of a window `len` samples long.
    /// Full-length windows come from the table, shorter ones are computed.
    #[inline]
    fn coeff(&self, index: usize, len: usize) -> f32 {
        if len == self.coeffs.len() {
            self.coeffs[index]
        } else {
            hann_window(index, len)
        }
    }
}

/// Frequency spacing between adjacent bins, in Hz
#[inline]
pub fn frequency_resolution(sample_rate: f32, spectrum_size: usize) -> f32 {
    (sample_rate / 2.0) / spectrum_size as f32
}

/// Center frequency of `bin`, in Hz
#[inline]
pub fn bin_frequency(bin: usize, sample_rate: f32, spectrum_size: usize) -> f32 {
    bin as f32 * frequency_resolution(sample_rate, spectrum_size)
}

/// Block spectrum analyzer
///
/// Owned by the audio thread. `compute()` needs `&mut self` for its work
/// buffers; publish the returned magnitudes to other threads separately.
pub struct SpectrumAnalyzer {
    spectrum_size: usize,
    fft: Arc<dyn Fft<f32>>,
    window: HannWindow,
    /// In-place FFT buffer
    buffer: Vec<Complex<f32>>,
    /// Scratch space required by the FFT algorithm
    scratch: Vec<Complex<f32>>,
    /// Output magnitudes, `spectrum_size + 1` bins
    magnitudes: Vec<f32>,
}

impl SpectrumAnalyzer {
    /// Create an analyzer producing `spectrum_size + 1` bins
    pub fn new(spectrum_size: usize) -> Result<Self, DspError> {
        if spectrum_size == 0 {
            return Err(DspError::InvalidSpectrumSize(spectrum_size));
        }

        let fft_size = spectrum_size * 2;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        Ok(Self {
            spectrum_size,
            fft,
            window: HannWindow::new(fft_size),
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
            magnitudes: vec![0.0; spectrum_size + 1],
        })
    }

    pub fn spectrum_size(&self) -> usize {
        self.spectrum_size
    }

    /// FFT length in samples; longer blocks are truncated to their most
    /// recent `fft_size()` samples
    pub fn fft_size(&self) -> usize {
        self.spectrum_size * 2
    }

    /// Number of bins returned by `compute()`
    pub fn num_bins(&self) -> usize {
        self.spectrum_size + 1
    }

    /// Compute the magnitude spectrum of `block`.
    ///
    /// Returns `None` for an empty block. Magnitudes are linear and scaled so
    /// that a sine of amplitude `A` centred on a bin reads `A` at that bin.
    ///
    /// # Real-time Safety
    /// No allocations, no locks. O(n log n) in the FFT size.
    pub fn compute(&mut self, block: &[f32]) -> Option<&[f32]> {
        if block.is_empty() {
            return None;
        }

        let fft_size = self.fft_size();
        let used = block.len().min(fft_size);
        let recent = &block[block.len() - used..];

        let mut window_sum = 0.0_f32;
        for (i, slot) in self.buffer.iter_mut().enumerate() {
            *slot = match recent.get(i) {
                Some(&sample) => {
                    let w = self.window.coeff(i, used);
                    window_sum += w;
                    Complex::new(sample * w, 0.0)
                }
                None => Complex::new(0.0, 0.0),
            };
        }

        self.fft.process_with_scratch(&mut self.buffer, &mut self.scratch);

        if window_sum <= 0.0 {
            self.magnitudes.fill(0.0);
            return Some(&self.magnitudes);
        }

        // One-sided spectrum: interior bins carry both halves of the energy
        let interior_scale = 2.0 / window_sum;
        let edge_scale = 1.0 / window_sum;
        let last = self.spectrum_size;
        for (bin, magnitude) in self.magnitudes.iter_mut().enumerate() {
            let scale = if bin == 0 || bin == last {
                edge_scale
            } else {
                interior_scale
            };
            *magnitude = self.buffer[bin].norm() * scale;
        }

        Some(&self.magnitudes)
    }
}
