//! Threshold Detector
//!
//! Checks one channel's block levels against the clipping and
//! oversaturation thresholds. Coalescing of repeated warnings is the
//! dispatcher's job, not the detector's.

use cadence_dsp::BlockLevels;

use crate::config::MonitorConfig;

/// Warnings raised by a single channel block
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Detection {
    pub clipping: bool,
    pub oversaturation: bool,
}

impl Detection {
    pub fn any(&self) -> bool {
        self.clipping || self.oversaturation
    }
}

/// Immutable thresholds, copied out of the config for the audio thread
#[derive(Debug, Clone, Copy)]
pub struct ThresholdDetector {
    clip_threshold: f32,
    oversaturation_threshold: f32,
    oversaturation_rate: f32,
}

impl ThresholdDetector {
    pub fn new(config: &MonitorConfig) -> Self {
        Self {
            clip_threshold: config.clip_threshold,
            oversaturation_threshold: config.oversaturation_threshold,
            oversaturation_rate: config.oversaturation_rate,
        }
    }

    /// # Real-time Safety
    /// No allocations, O(1) time.
    #[inline]
    pub fn detect(&self, levels: BlockLevels) -> Detection {
        let BlockLevels { peak, rms } = levels;

        // peak / rms is undefined for silence-level RMS; never oversaturated
        let oversaturation = rms > 0.0
            && peak > self.oversaturation_threshold
            && peak / rms > self.oversaturation_rate;

        Detection {
            clipping: peak > self.clip_threshold,
            oversaturation,
        }
    }
}
