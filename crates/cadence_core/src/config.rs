//! Monitor Configuration
//!
//! Thresholds and sizes are fixed for the lifetime of a monitor. They are
//! injected at construction so tests and hosts can override the built-in
//! defaults.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{MonitorError, MonitorResult};

/// Amplitude above which a signal is clipping
pub const DEFAULT_CLIP_THRESHOLD: f32 = 1.0;

/// Amplitude above which the peak-to-RMS ratio is checked
pub const DEFAULT_OVERSATURATION_THRESHOLD: f32 = 0.8;

/// Peak-to-RMS ratio above which a loud signal is oversaturated
pub const DEFAULT_OVERSATURATION_RATE: f32 = 4.0;

/// Number of monitored channels (stereo)
pub const DEFAULT_NUM_CHANNELS: usize = 2;

/// Audio monitor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    /// Peak amplitude above which a clipping warning is raised
    pub clip_threshold: f32,

    /// Peak amplitude above which oversaturation is considered
    pub oversaturation_threshold: f32,

    /// Peak / RMS ratio above which oversaturation is raised
    pub oversaturation_rate: f32,

    /// Number of spectrum bins below Nyquist (the store keeps one extra
    /// bin for Nyquist itself)
    pub spectrum_size: usize,

    /// Number of monitored channels
    pub num_channels: usize,

    /// Sample rate assumed until the device reports its own
    pub default_sample_rate: f32,

    /// Frames per chunk when deinterleaving (sizes the scratch buffers)
    pub max_block_size: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            clip_threshold: DEFAULT_CLIP_THRESHOLD,
            oversaturation_threshold: DEFAULT_OVERSATURATION_THRESHOLD,
            oversaturation_rate: DEFAULT_OVERSATURATION_RATE,
            spectrum_size: cadence_dsp::DEFAULT_SPECTRUM_SIZE,
            num_channels: DEFAULT_NUM_CHANNELS,
            default_sample_rate: 44100.0,
            max_block_size: 4096,
        }
    }
}

impl MonitorConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.clip_threshold.is_finite() || self.clip_threshold <= 0.0 {
            return Err(format!("Invalid clip threshold: {}", self.clip_threshold));
        }
        if !self.oversaturation_threshold.is_finite() || self.oversaturation_threshold <= 0.0 {
            return Err(format!(
                "Invalid oversaturation threshold: {}",
                self.oversaturation_threshold
            ));
        }
        if !self.oversaturation_rate.is_finite() || self.oversaturation_rate < 1.0 {
            return Err(format!(
                "Invalid oversaturation rate: {} (peak/RMS is never below 1)",
                self.oversaturation_rate
            ));
        }
        if self.spectrum_size == 0 || self.spectrum_size > 65536 {
            return Err(format!("Invalid spectrum size: {}", self.spectrum_size));
        }
        if self.num_channels == 0 || self.num_channels > 32 {
            return Err(format!("Invalid channel count: {}", self.num_channels));
        }
        if !self.default_sample_rate.is_finite()
            || self.default_sample_rate < 8000.0
            || self.default_sample_rate > 384000.0
        {
            return Err(format!("Invalid sample rate: {}", self.default_sample_rate));
        }
        if self.max_block_size < 32 || self.max_block_size > 65536 {
            return Err(format!("Invalid max block size: {}", self.max_block_size));
        }
        Ok(())
    }

    /// Parse a JSON configuration and validate it. Missing fields take
    /// their default values.
    pub fn from_json(json: &str) -> MonitorResult<Self> {
        let config: MonitorConfig = serde_json::from_str(json)?;
        config.validate().map_err(MonitorError::ConfigError)?;
        info!(
            "Monitor config loaded: {} channels, {} bins, clip > {}",
            config.num_channels, config.spectrum_size, config.clip_threshold
        );
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MonitorConfig::default();
        assert_eq!(config.clip_threshold, 1.0);
        assert_eq!(config.spectrum_size, 512);
        assert_eq!(config.num_channels, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let invalid_clip = MonitorConfig {
            clip_threshold: 0.0,
            ..Default::default()
        };
        assert!(invalid_clip.validate().is_err());

        let invalid_rate = MonitorConfig {
            oversaturation_rate: 0.5,
            ..Default::default()
        };
        assert!(invalid_rate.validate().is_err());

        let invalid_spectrum = MonitorConfig {
            spectrum_size: 0,
            ..Default::default()
        };
        assert!(invalid_spectrum.validate().is_err());

        let invalid_channels = MonitorConfig {
            num_channels: 0,
            ..Default::default()
        };
        assert!(invalid_channels.validate().is_err());

        let nan_threshold = MonitorConfig {
            oversaturation_threshold: f32::NAN,
            ..Default::default()
        };
        assert!(nan_threshold.validate().is_err());

        for rate in [f32::NAN, f32::INFINITY, 4000.0] {
            let invalid_rate = MonitorConfig {
                default_sample_rate: rate,
                ..Default::default()
            };
            assert!(invalid_rate.validate().is_err(), "{} Hz accepted", rate);
        }
    }

    #[test]
    fn test_from_json_partial() {
        let config = MonitorConfig::from_json(r#"{ "clip_threshold": 0.9, "num_channels": 1 }"#)
            .unwrap();
        assert_eq!(config.clip_threshold, 0.9);
        assert_eq!(config.num_channels, 1);
        assert_eq!(config.spectrum_size, 512);
    }

    #[test]
    fn test_from_json_rejects_invalid() {
        let err = MonitorConfig::from_json(r#"{ "spectrum_size": 0 }"#).unwrap_err();
        assert!(matches!(err, MonitorError::ConfigError(_)));

        let err = MonitorConfig::from_json("{ not json").unwrap_err();
        assert!(matches!(err, MonitorError::ConfigParseError(_)));
    }

    #[test]
    fn test_config_serialization() {
        let config = MonitorConfig {
            oversaturation_rate: 6.0,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: MonitorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(config, deserialized);
    }
}
