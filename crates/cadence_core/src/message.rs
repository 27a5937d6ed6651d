//! Message Types for Thread Communication
//!
//! Warnings flow from the audio thread to the UI thread; level snapshots
//! are pulled by the UI at its own refresh rate.

use serde::{Deserialize, Serialize};

/// Kind of signal abnormality detected on the audio thread
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WarningKind {
    /// Peak exceeded the clip threshold
    Clipping,
    /// Loud peak far above the average (RMS) level
    Oversaturation,
}

impl WarningKind {
    pub const ALL: [WarningKind; 2] = [WarningKind::Clipping, WarningKind::Oversaturation];
}

/// Events delivered to event-loop style consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum MonitorEvent {
    /// A coalesced warning was dispatched
    Warning(WarningKind),
}

/// Levels of one channel
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelLevels {
    pub peak: f32,
    pub rms: f32,
    pub peak_db: f32,
    pub rms_db: f32,
}

impl ChannelLevels {
    pub fn new(peak: f32, rms: f32) -> Self {
        Self {
            peak,
            rms,
            peak_db: cadence_dsp::linear_to_db(peak),
            rms_db: cadence_dsp::linear_to_db(rms),
        }
    }
}

/// Levels of every channel, for meters
///
/// Values are read one at a time; see the store module for what that means
/// for consistency between channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSnapshot {
    pub sample_rate: f32,
    pub channels: Vec<ChannelLevels>,
}
