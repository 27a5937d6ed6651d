//! Audio Monitor - Query Façade
//!
//! The `AudioMonitor` is shared (via `Arc`) between the audio thread, which
//! writes through a `MonitorProcessor`, and any number of readers. Readers
//! get the most recent completed block's values; there is no other
//! staleness bound.
//!
//! Listener registration and `dispatch_pending()` belong to the consumer
//! (UI) side and must not be called from the audio callback.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::config::MonitorConfig;
use crate::dispatcher::{
    DispatchThread, ListenerId, ListenerRegistry, WarningDispatcher, WarningListener,
};
use crate::error::{MonitorError, MonitorResult};
use crate::message::{ChannelLevels, LevelSnapshot, WarningKind};
use crate::store::{ChannelSlot, SampleStore};

/// Shared monitor state and read API
pub struct AudioMonitor {
    config: MonitorConfig,
    store: SampleStore,
    clipping: WarningDispatcher,
    oversaturation: WarningDispatcher,
    listeners: ListenerRegistry,
}

impl AudioMonitor {
    /// Create a monitor with the default configuration
    pub fn new() -> Self {
        Self::build(MonitorConfig::default())
    }

    /// Create a monitor with a custom configuration
    pub fn with_config(config: MonitorConfig) -> MonitorResult<Self> {
        config.validate().map_err(MonitorError::ConfigError)?;
        Ok(Self::build(config))
    }

    fn build(config: MonitorConfig) -> Self {
        let store = SampleStore::new(
            config.num_channels,
            config.spectrum_size + 1,
            config.default_sample_rate,
        );

        Self {
            store,
            clipping: WarningDispatcher::new(WarningKind::Clipping),
            oversaturation: WarningDispatcher::new(WarningKind::Oversaturation),
            listeners: ListenerRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &MonitorConfig {
        &self.config
    }

    pub fn num_channels(&self) -> usize {
        self.store.num_channels()
    }

    pub(crate) fn store(&self) -> &SampleStore {
        &self.store
    }

    pub(crate) fn dispatcher(&self, kind: WarningKind) -> &WarningDispatcher {
        match kind {
            WarningKind::Clipping => &self.clipping,
            WarningKind::Oversaturation => &self.oversaturation,
        }
    }

    fn slot(&self, channel: usize) -> MonitorResult<&ChannelSlot> {
        self.store
            .channel(channel)
            .ok_or(MonitorError::ChannelOutOfRange {
                channel,
                channels: self.store.num_channels(),
            })
    }

    // ─── Levels ──────────────────────────────────────────────────────────

    /// Signed peak of the channel's most recent block
    pub fn peak(&self, channel: usize) -> MonitorResult<f32> {
        Ok(self.slot(channel)?.peak())
    }

    /// RMS of the channel's most recent block
    pub fn root_mean_square(&self, channel: usize) -> MonitorResult<f32> {
        Ok(self.slot(channel)?.rms())
    }

    /// Peak/RMS of every channel (linear and dB)
    pub fn level_snapshot(&self) -> LevelSnapshot {
        LevelSnapshot {
            sample_rate: self.sample_rate(),
            channels: self
                .store
                .channels()
                .iter()
                .map(|slot| ChannelLevels::new(slot.peak(), slot.rms()))
                .collect(),
        }
    }

    // ─── Spectrum ────────────────────────────────────────────────────────

    pub fn sample_rate(&self) -> f32 {
        self.store.sample_rate()
    }

    /// Spacing between spectrum bins at the current sample rate, in Hz
    pub fn frequency_resolution(&self) -> f32 {
        cadence_dsp::frequency_resolution(self.sample_rate(), self.config.spectrum_size)
    }

    /// Copy of one channel's spectrum, `spectrum_size + 1` bins
    pub fn spectrum(&self, channel: usize) -> MonitorResult<Vec<f32>> {
        Ok(self.slot(channel)?.spectrum())
    }

    /// Magnitude at `bin` averaged over all channels. `bin` must be in
    /// `0..=spectrum_size`.
    fn averaged_bin(&self, bin: usize) -> f32 {
        let channels = self.store.channels();
        let sum: f32 = channels
            .iter()
            .map(|slot| slot.bin(bin).unwrap_or(0.0))
            .sum();
        sum / channels.len() as f32
    }

    /// Spectrum magnitude at an arbitrary frequency.
    ///
    /// Finds the two bins around `frequency`, averages each over the
    /// channels and interpolates between them by log-frequency position.
    /// Bins are clamped to `[0, spectrum_size]`, so frequencies at or past
    /// Nyquist return the Nyquist bin. Where the log fraction is undefined
    /// the lower bin's value is returned; below the first bin (where
    /// `log10(0)` would be needed) the fraction is linear instead.
    pub fn interpolated_spectrum_at_frequency(&self, frequency: f32) -> f32 {
        let last_bin = self.config.spectrum_size;
        let resolution = self.frequency_resolution();

        if !frequency.is_finite() || frequency <= 0.0 || !resolution.is_normal() {
            return self.averaged_bin(0);
        }

        let position = frequency / resolution;
        let index1 = (position.floor() as usize).min(last_bin);
        let index2 = (index1 + 1).min(last_bin);

        let y1 = self.averaged_bin(index1);
        if index1 == index2 {
            return y1;
        }
        let y2 = self.averaged_bin(index2);

        let f1 = index1 as f32 * resolution;
        let f2 = index2 as f32 * resolution;

        let fraction = if index1 == 0 {
            frequency / f2
        } else {
            (frequency.log10() - f1.log10()) / (f2.log10() - f1.log10())
        };

        if !fraction.is_finite() {
            return y1;
        }

        y1 + fraction * (y2 - y1)
    }

    // ─── Warnings ────────────────────────────────────────────────────────

    /// Register a listener for clipping/oversaturation warnings.
    ///
    /// Consumer side only. The monitor keeps a weak reference; the caller
    /// keeps the listener alive.
    pub fn add_listener<L: WarningListener + 'static>(&self, listener: &Arc<L>) -> ListenerId {
        let id = self.listeners.add(listener);
        debug!("Warning listener registered: {:?}", id);
        id
    }

    /// Unregister a listener. Consumer side only.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let removed = self.listeners.remove(id);
        debug!("Warning listener {:?} removed: {}", id, removed);
        removed
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_pending(&self, kind: WarningKind) -> bool {
        self.dispatcher(kind).is_pending()
    }

    /// Deliver every pending warning to the listeners.
    ///
    /// Each pending kind is moved back to Idle before its listeners run.
    /// Call this from the consumer thread at its own cadence (e.g. once
    /// per UI frame). Returns the kinds that were delivered.
    pub fn dispatch_pending(&self) -> Vec<WarningKind> {
        WarningKind::ALL
            .into_iter()
            .filter(|&kind| self.dispatcher(kind).take_pending())
            .inspect(|&kind| {
                self.listeners.notify(kind);
            })
            .collect()
    }

    /// Spawn a named thread that calls `dispatch_pending()` every
    /// `interval`. Listeners then run on that thread.
    pub fn spawn_dispatch_thread(
        self: &Arc<Self>,
        interval: Duration,
    ) -> MonitorResult<DispatchThread> {
        let monitor = Arc::clone(self);
        DispatchThread::spawn(interval, move || {
            monitor.dispatch_pending();
        })
    }

    /// Zero all levels and spectra and drop pending warnings
    pub fn reset(&self) {
        self.store.clear();
        for kind in WarningKind::ALL {
            self.dispatcher(kind).take_pending();
        }
        info!("Audio monitor reset");
    }
}

impl Default for AudioMonitor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingListener {
        clipping: AtomicUsize,
        oversaturation: AtomicUsize,
    }

    impl WarningListener for CountingListener {
        fn on_clipping_warning(&self) {
            self.clipping.fetch_add(1, Ordering::SeqCst);
        }

        fn on_oversaturation_warning(&self) {
            self.oversaturation.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn small_monitor() -> AudioMonitor {
        // 8 bins at 16kHz: 1kHz per bin, Nyquist at 8kHz
        AudioMonitor::with_config(MonitorConfig {
            spectrum_size: 8,
            default_sample_rate: 16000.0,
            ..Default::default()
        })
        .unwrap()
    }

    fn fill_spectrum(monitor: &AudioMonitor, left: &[f32], right: &[f32]) {
        monitor.store().channel(0).unwrap().store_spectrum(left);
        monitor.store().channel(1).unwrap().store_spectrum(right);
    }

    #[test]
    fn test_defaults() {
        let monitor = AudioMonitor::new();
        assert_eq!(monitor.num_channels(), 2);
        assert_eq!(monitor.sample_rate(), 44100.0);
        assert_eq!(monitor.peak(0).unwrap(), 0.0);
        assert_eq!(monitor.root_mean_square(1).unwrap(), 0.0);
        assert_eq!(monitor.spectrum(0).unwrap().len(), 513);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let result = AudioMonitor::with_config(MonitorConfig {
            num_channels: 0,
            ..Default::default()
        });
        assert!(matches!(result, Err(MonitorError::ConfigError(_))));
    }

    #[test]
    fn test_channel_out_of_range() {
        let monitor = AudioMonitor::new();
        assert!(matches!(
            monitor.peak(2),
            Err(MonitorError::ChannelOutOfRange {
                channel: 2,
                channels: 2
            })
        ));
        assert!(monitor.root_mean_square(7).is_err());
        assert!(monitor.spectrum(2).is_err());
    }

    #[test]
    fn test_interpolation_at_bin_center() {
        let monitor = small_monitor();
        assert_eq!(monitor.frequency_resolution(), 1000.0);

        fill_spectrum(
            &monitor,
            &[0.0, 0.2, 0.4, 0.6, 0.8, 1.0, 0.5, 0.3, 0.1],
            &[0.0, 0.4, 0.2, 0.2, 0.4, 0.0, 0.5, 0.1, 0.3],
        );

        // Exactly on a bin: fraction 0, value is the two-channel average
        assert!((monitor.interpolated_spectrum_at_frequency(3000.0) - 0.4).abs() < 1e-6);
        assert!((monitor.interpolated_spectrum_at_frequency(5000.0) - 0.5).abs() < 1e-6);
        assert!((monitor.interpolated_spectrum_at_frequency(6000.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_interpolation_is_logarithmic() {
        let monitor = small_monitor();
        fill_spectrum(&monitor, &[0.0, 0.0, 0.0, 1.0, 0.0], &[0.0, 0.0, 0.0, 1.0, 0.0]);

        // Between bin 3 (3kHz, 1.0) and bin 4 (4kHz, 0.0)
        let frequency = 3500.0_f32;
        let fraction = (frequency.log10() - 3000.0_f32.log10())
            / (4000.0_f32.log10() - 3000.0_f32.log10());
        let expected = 1.0 - fraction;

        let value = monitor.interpolated_spectrum_at_frequency(frequency);
        assert!((value - expected).abs() < 1e-5);
        // Log spacing puts the midpoint past the linear halfway mark
        assert!(value < 0.5);
    }

    #[test]
    fn test_interpolation_uses_enclosing_bins() {
        let monitor = small_monitor();
        fill_spectrum(&monitor, &[0.0, 0.0, 1.0, 0.0], &[0.0, 0.0, 1.0, 0.0]);

        // 1600Hz sits between bin 1 (1kHz) and bin 2 (2kHz), even though
        // bin 2 is the nearer one
        let value = monitor.interpolated_spectrum_at_frequency(1600.0);
        let expected = 1.6_f32.log10() / 2.0_f32.log10();
        assert!((value - expected).abs() < 1e-5, "value was {}", value);
        assert!((value - 0.678).abs() < 1e-3);
    }

    #[test]
    fn test_interpolation_clamps_at_nyquist() {
        let monitor = small_monitor();
        fill_spectrum(
            &monitor,
            &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.6],
            &[0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.2],
        );

        for frequency in [8000.0, 8500.0, 20000.0, 1.0e9] {
            let value = monitor.interpolated_spectrum_at_frequency(frequency);
            assert!((value - 0.4).abs() < 1e-6, "{} Hz gave {}", frequency, value);
        }
    }

    #[test]
    fn test_interpolation_degenerate_inputs() {
        let monitor = small_monitor();
        fill_spectrum(&monitor, &[0.8, 0.4], &[0.8, 0.4]);

        // Zero, negative and non-finite frequencies fall back to bin 0
        assert_eq!(monitor.interpolated_spectrum_at_frequency(0.0), 0.8);
        assert_eq!(monitor.interpolated_spectrum_at_frequency(-100.0), 0.8);
        assert_eq!(monitor.interpolated_spectrum_at_frequency(f32::NAN), 0.8);
        assert_eq!(monitor.interpolated_spectrum_at_frequency(f32::INFINITY), 0.8);

        // First interval uses a linear fraction instead of log10(0)
        let value = monitor.interpolated_spectrum_at_frequency(500.0);
        assert!((value - 0.6).abs() < 1e-6);
        assert!(value.is_finite());
    }

    #[test]
    fn test_level_snapshot() {
        let monitor = AudioMonitor::new();
        monitor.store().channel(1).unwrap().set_levels(0.5, 0.25);

        let snapshot = monitor.level_snapshot();
        assert_eq!(snapshot.channels.len(), 2);
        assert_eq!(snapshot.channels[1].peak, 0.5);
        assert_eq!(snapshot.channels[1].rms, 0.25);
        assert!((snapshot.channels[1].peak_db + 6.02).abs() < 0.01);

        let json = serde_json::to_string(&snapshot).unwrap();
        let deserialized: LevelSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized, snapshot);
    }

    #[test]
    fn test_dispatch_coalesces_triggers() {
        let monitor = AudioMonitor::new();
        let first = Arc::new(CountingListener::default());
        let second = Arc::new(CountingListener::default());
        monitor.add_listener(&first);
        monitor.add_listener(&second);

        for _ in 0..10 {
            monitor.dispatcher(WarningKind::Clipping).trigger();
        }
        assert!(monitor.is_pending(WarningKind::Clipping));

        assert_eq!(monitor.dispatch_pending(), vec![WarningKind::Clipping]);
        assert_eq!(first.clipping.load(Ordering::SeqCst), 1);
        assert_eq!(second.clipping.load(Ordering::SeqCst), 1);
        assert_eq!(first.oversaturation.load(Ordering::SeqCst), 0);

        // Nothing pending any more
        assert!(monitor.dispatch_pending().is_empty());
        assert_eq!(first.clipping.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dispatch_kinds_are_independent() {
        let monitor = AudioMonitor::new();
        let listener = Arc::new(CountingListener::default());
        monitor.add_listener(&listener);

        monitor.dispatcher(WarningKind::Oversaturation).trigger();
        assert_eq!(monitor.dispatch_pending(), vec![WarningKind::Oversaturation]);

        monitor.dispatcher(WarningKind::Clipping).trigger();
        monitor.dispatcher(WarningKind::Oversaturation).trigger();
        assert_eq!(monitor.dispatch_pending().len(), 2);

        assert_eq!(listener.clipping.load(Ordering::SeqCst), 1);
        assert_eq!(listener.oversaturation.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_trigger_during_delivery_is_delivered_later() {
        struct Retriggering {
            monitor: Arc<AudioMonitor>,
            calls: AtomicUsize,
        }

        impl WarningListener for Retriggering {
            fn on_clipping_warning(&self) {
                // Only the first delivery re-triggers
                if self.calls.fetch_add(1, Ordering::SeqCst) == 0 {
                    self.monitor.dispatcher(WarningKind::Clipping).trigger();
                }
            }
        }

        let monitor = Arc::new(AudioMonitor::new());
        let listener = Arc::new(Retriggering {
            monitor: Arc::clone(&monitor),
            calls: AtomicUsize::new(0),
        });
        monitor.add_listener(&listener);

        monitor.dispatcher(WarningKind::Clipping).trigger();
        monitor.dispatch_pending();
        assert_eq!(listener.calls.load(Ordering::SeqCst), 1);
        assert!(monitor.is_pending(WarningKind::Clipping));

        monitor.dispatch_pending();
        assert_eq!(listener.calls.load(Ordering::SeqCst), 2);
        assert!(!monitor.is_pending(WarningKind::Clipping));
    }

    #[test]
    fn test_remove_listener() {
        let monitor = AudioMonitor::new();
        let listener = Arc::new(CountingListener::default());
        let id = monitor.add_listener(&listener);
        assert_eq!(monitor.listener_count(), 1);

        assert!(monitor.remove_listener(id));
        monitor.dispatcher(WarningKind::Clipping).trigger();
        monitor.dispatch_pending();
        assert_eq!(listener.clipping.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_spawn_dispatch_thread() {
        let monitor = Arc::new(AudioMonitor::new());
        let (listener, receiver) = crate::dispatcher::ChannelListener::channel();
        monitor.add_listener(&listener);

        let dispatch = monitor
            .spawn_dispatch_thread(Duration::from_millis(1))
            .unwrap();
        monitor.dispatcher(WarningKind::Oversaturation).trigger();

        let event = receiver.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(
            event,
            crate::message::MonitorEvent::Warning(WarningKind::Oversaturation)
        );

        dispatch.stop();
        assert!(!monitor.is_pending(WarningKind::Oversaturation));
    }

    #[test]
    fn test_reset() {
        let monitor = AudioMonitor::new();
        monitor.store().channel(0).unwrap().set_levels(0.9, 0.3);
        monitor.dispatcher(WarningKind::Clipping).trigger();

        monitor.reset();
        assert_eq!(monitor.peak(0).unwrap(), 0.0);
        assert!(!monitor.is_pending(WarningKind::Clipping));
    }
}
