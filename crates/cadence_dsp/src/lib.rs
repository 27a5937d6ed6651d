//! Cadence DSP - Digital Signal Processing Module
//!
//! This crate provides the per-block analysis used by the Cadence monitor:
//! - Peak / RMS level metering
//! - FFT magnitude spectrum with linear (Nyquist-normalised) bin spacing
//! - Zero-allocation processing path
//!
//! # Architecture
//!
//! Everything here runs inside the audio callback, so nothing allocates
//! after construction. Publishing results to other threads is left to the
//! caller (see `cadence_core`).

mod error;
mod fft;
mod level;

pub use error::DspError;
pub use fft::{bin_frequency, frequency_resolution, SpectrumAnalyzer, DEFAULT_SPECTRUM_SIZE};
pub use level::{linear_to_db, measure, BlockLevels};
