//! Monitor Processor - Audio Thread Side
//!
//! The processor is owned by the audio callback. It holds everything that
//! needs `&mut` (FFT work buffers, deinterleave scratch) and writes results
//! into the shared `AudioMonitor`.
//!
//! # Real-time Safety
//!
//! After construction nothing here allocates, locks or logs. Warnings leave
//! the audio thread only through `WarningDispatcher::trigger()`.
//!
//! The monitor is wired as a terminal sink: the output buffer is the signal
//! being monitored and is cleared once it has been analysed.

use std::sync::Arc;

use cadence_dsp::{measure, SpectrumAnalyzer};
use tracing::info;

use crate::detector::ThresholdDetector;
use crate::error::MonitorResult;
use crate::message::WarningKind;
use crate::monitor::AudioMonitor;

/// Audio-thread half of the monitor
pub struct MonitorProcessor {
    monitor: Arc<AudioMonitor>,
    analyzer: SpectrumAnalyzer,
    detector: ThresholdDetector,
    /// Planar scratch for the interleaved path, `max_block_size` frames per
    /// monitored channel
    planar: Vec<Vec<f32>>,
    max_block_size: usize,
}

impl MonitorProcessor {
    pub fn new(monitor: Arc<AudioMonitor>) -> MonitorResult<Self> {
        let config = monitor.config();
        let analyzer = SpectrumAnalyzer::new(config.spectrum_size)?;
        let detector = ThresholdDetector::new(config);
        let max_block_size = config.max_block_size;
        let planar = vec![vec![0.0; max_block_size]; config.num_channels];

        Ok(Self {
            monitor,
            analyzer,
            detector,
            planar,
            max_block_size,
        })
    }

    pub fn monitor(&self) -> &Arc<AudioMonitor> {
        &self.monitor
    }

    /// Called once when the device starts, with the negotiated sample rate
    pub fn audio_device_about_to_start(&mut self, sample_rate: f32) -> MonitorResult<()> {
        if !sample_rate.is_finite() || sample_rate <= 0.0 {
            return Err(cadence_dsp::DspError::InvalidSampleRate(sample_rate).into());
        }
        self.monitor.store().set_sample_rate(sample_rate);
        info!("Audio monitor starting at {} Hz", sample_rate);
        Ok(())
    }

    /// Analyse one planar block and clear the outputs.
    ///
    /// Inputs are ignored: the output buffers are the monitored signal.
    /// Only the first `min(num_channels, outputs.len())` channels are
    /// analysed; every output channel is cleared.
    pub fn audio_device_io_callback(
        &mut self,
        _inputs: &[&[f32]],
        outputs: &mut [&mut [f32]],
        num_samples: usize,
    ) {
        let monitored = self.monitor.num_channels().min(outputs.len());

        for (channel, output) in outputs.iter().enumerate().take(monitored) {
            let len = num_samples.min(output.len());
            analyze_channel(
                &mut self.analyzer,
                &self.detector,
                &self.monitor,
                channel,
                &output[..len],
            );
        }

        for output in outputs.iter_mut() {
            let len = num_samples.min(output.len());
            output[..len].fill(0.0);
        }
    }

    /// Analyse an interleaved buffer (`[L0, R0, L1, R1, ...]`) and clear it.
    ///
    /// Buffers longer than `max_block_size` frames are analysed in chunks;
    /// the monitor ends up holding the last chunk's values. A trailing
    /// partial frame is ignored.
    pub fn process_interleaved(&mut self, data: &mut [f32], channels: usize) {
        if channels == 0 {
            data.fill(0.0);
            return;
        }

        let monitored = self.monitor.num_channels().min(channels);

        for chunk in data.chunks(self.max_block_size * channels) {
            let frames = chunk.len() / channels;

            for (frame_index, frame) in chunk.chunks_exact(channels).enumerate() {
                for (channel, &sample) in frame.iter().enumerate().take(monitored) {
                    self.planar[channel][frame_index] = sample;
                }
            }

            for channel in 0..monitored {
                analyze_channel(
                    &mut self.analyzer,
                    &self.detector,
                    &self.monitor,
                    channel,
                    &self.planar[channel][..frames],
                );
            }
        }

        data.fill(0.0);
    }
}

/// Spectrum, levels and thresholds for one channel block
#[inline]
fn analyze_channel(
    analyzer: &mut SpectrumAnalyzer,
    detector: &ThresholdDetector,
    monitor: &AudioMonitor,
    channel: usize,
    block: &[f32],
) {
    let Some(slot) = monitor.store().channel(channel) else {
        return;
    };

    if let Some(magnitudes) = analyzer.compute(block) {
        slot.store_spectrum(magnitudes);
    }

    // Empty blocks leave the previous levels in place
    let Some(levels) = measure(block) else {
        return;
    };
    slot.set_levels(levels.peak, levels.rms);

    let detection = detector.detect(levels);
    if detection.clipping {
        monitor.dispatcher(WarningKind::Clipping).trigger();
    }
    if detection.oversaturation {
        monitor.dispatcher(WarningKind::Oversaturation).trigger();
    }
}
