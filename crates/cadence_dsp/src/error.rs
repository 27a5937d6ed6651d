//! DSP Error Types

use thiserror::Error;

/// Errors that can occur while setting up DSP components
#[derive(Error, Debug)]
pub enum DspError {
    #[error("Spectrum size must be at least 1, got {0}")]
    InvalidSpectrumSize(usize),

    #[error("Sample rate must be positive, got {0}")]
    InvalidSampleRate(f32),
}
