//! Cadence Core - Real-Time Audio Monitor
//!
//! This crate provides the monitoring side of the Cadence sequencer:
//! - Per-channel peak / RMS and magnitude spectrum, published lock-free
//! - Clipping and oversaturation detection on every audio block
//! - Coalesced, non-blocking warning hand-off to the UI thread
//! - A query API for meters and spectrum displays
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Audio Thread                           │
//! │   Device ──▶ MonitorProcessor ──▶ Level / Spectrum / Detect │
//! │                     │                        │              │
//! │              atomic stores             trigger() flags      │
//! │              (Zero allocation in this path)                 │
//! └─────────────────────┬────────────────────────┬──────────────┘
//!                       ▼                        ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        UI Thread                            │
//! │   AudioMonitor::peak / spectrum ◀── reads                   │
//! │   AudioMonitor::dispatch_pending ──▶ WarningListener(s)     │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod detector;
mod dispatcher;
mod error;
mod message;
mod monitor;
mod processor;
mod store;
#[cfg(feature = "device")]
mod stream;

pub use config::{
    MonitorConfig, DEFAULT_CLIP_THRESHOLD, DEFAULT_NUM_CHANNELS, DEFAULT_OVERSATURATION_RATE,
    DEFAULT_OVERSATURATION_THRESHOLD,
};
pub use detector::{Detection, ThresholdDetector};
pub use dispatcher::{
    ChannelListener, DispatchThread, ListenerId, WarningDispatcher, WarningListener,
};
pub use error::{MonitorError, MonitorResult};
pub use message::{ChannelLevels, LevelSnapshot, MonitorEvent, WarningKind};
pub use monitor::AudioMonitor;
pub use processor::MonitorProcessor;
pub use store::AtomicF32;
#[cfg(feature = "device")]
pub use stream::MonitorStream;

// Re-export DSP types for convenience
pub use cadence_dsp::{BlockLevels, SpectrumAnalyzer, DEFAULT_SPECTRUM_SIZE};
