//! Monitor Error Types

use thiserror::Error;

/// Errors that can occur in the audio monitor
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Channel {channel} out of range (monitor has {channels} channels)")]
    ChannelOutOfRange { channel: usize, channels: usize },

    #[error("Monitor configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to parse monitor configuration: {0}")]
    ConfigParseError(#[from] serde_json::Error),

    #[error("DSP error: {0}")]
    DspError(#[from] cadence_dsp::DspError),

    #[error("Failed to spawn dispatch thread: {0}")]
    ThreadSpawnError(String),

    #[error("No output device found")]
    NoOutputDevice,

    #[error("Failed to build audio stream: {0}")]
    StreamBuildError(String),

    #[error("Failed to play audio stream: {0}")]
    StreamPlayError(String),
}

/// Result type alias for monitor operations
pub type MonitorResult<T> = Result<T, MonitorError>;
