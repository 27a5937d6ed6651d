//! Audio Device Stream
//!
//! Connects a `MonitorProcessor` to the system's default output device via
//! CPAL. The stream is a terminal sink: every callback buffer is analysed
//! and then silenced.
//!
//! Only compiled with the `device` feature.

use std::sync::Arc;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::Stream;
use tracing::{error, info};

use crate::error::{MonitorError, MonitorResult};
use crate::monitor::AudioMonitor;
use crate::processor::MonitorProcessor;

/// A running output stream feeding the monitor
pub struct MonitorStream {
    /// The underlying CPAL stream (kept alive to maintain audio flow)
    #[allow(dead_code)]
    stream: Stream,

    monitor: Arc<AudioMonitor>,
    sample_rate: u32,
    channels: u16,
}

impl MonitorStream {
    /// Open the default output device with its default configuration
    pub fn open_default(monitor: Arc<AudioMonitor>) -> MonitorResult<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or(MonitorError::NoOutputDevice)?;

        let supported = device
            .default_output_config()
            .map_err(|e| MonitorError::StreamBuildError(e.to_string()))?;
        let sample_rate = supported.sample_rate().0;
        let channels = supported.channels();
        let config = supported.config();

        let mut processor = MonitorProcessor::new(Arc::clone(&monitor))?;
        processor.audio_device_about_to_start(sample_rate as f32)?;

        let stream = device
            .build_output_stream(
                &config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    // Real-time audio callback - NO allocations allowed here
                    processor.process_interleaved(data, channels as usize);
                },
                move |err| {
                    error!("Audio stream error: {}", err);
                },
                None,
            )
            .map_err(|e| MonitorError::StreamBuildError(e.to_string()))?;

        stream
            .play()
            .map_err(|e| MonitorError::StreamPlayError(e.to_string()))?;

        info!(
            "Monitor stream started: {} Hz, {} channels",
            sample_rate, channels
        );

        Ok(Self {
            stream,
            monitor,
            sample_rate,
            channels,
        })
    }

    pub fn monitor(&self) -> &Arc<AudioMonitor> {
        &self.monitor
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.channels
    }
}
