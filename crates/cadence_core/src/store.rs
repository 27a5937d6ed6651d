//! Atomic Sample Store
//!
//! Per-channel peak, RMS and spectrum values written by the audio thread
//! and read from any thread without locks.
//!
//! Every value is its own atomic: a reader never sees a torn `f32`, but
//! there is no snapshot across values. A reader may combine `peak` from one
//! block with `rms` from the next, or spectrum bins from two different
//! blocks. That is fine for meters and spectrum displays and is the reason
//! not to feed these values into control decisions.

use std::sync::atomic::{AtomicU32, Ordering};

/// `f32` stored as its bit pattern in an `AtomicU32`
///
/// Rust pattern: AtomicF32 doesn't exist, so we use bit-casting
#[derive(Debug)]
pub struct AtomicF32(AtomicU32);

impl AtomicF32 {
    pub fn new(value: f32) -> Self {
        Self(AtomicU32::new(value.to_bits()))
    }

    /// Relaxed ordering: single values, no cross-value synchronization
    #[inline]
    pub fn load(&self) -> f32 {
        f32::from_bits(self.0.load(Ordering::Relaxed))
    }

    #[inline]
    pub fn store(&self, value: f32) {
        self.0.store(value.to_bits(), Ordering::Relaxed);
    }
}

impl Default for AtomicF32 {
    fn default() -> Self {
        Self::new(0.0)
    }
}

/// Latest statistics for one channel
pub struct ChannelSlot {
    peak: AtomicF32,
    rms: AtomicF32,
    /// Bins `0..=spectrum_size`, DC through Nyquist
    spectrum: Box<[AtomicF32]>,
}

impl ChannelSlot {
    pub fn new(num_bins: usize) -> Self {
        Self {
            peak: AtomicF32::default(),
            rms: AtomicF32::default(),
            spectrum: (0..num_bins).map(|_| AtomicF32::default()).collect(),
        }
    }

    #[inline]
    pub fn peak(&self) -> f32 {
        self.peak.load()
    }

    #[inline]
    pub fn rms(&self) -> f32 {
        self.rms.load()
    }

    #[inline]
    pub fn set_levels(&self, peak: f32, rms: f32) {
        self.peak.store(peak);
        self.rms.store(rms);
    }

    /// Magnitude at `bin`, or `None` past the last bin
    #[inline]
    pub fn bin(&self, bin: usize) -> Option<f32> {
        self.spectrum.get(bin).map(AtomicF32::load)
    }

    /// Overwrite the spectrum, bin by bin. Extra input is ignored.
    ///
    /// # Real-time Safety
    /// No allocations, no locks.
    #[inline]
    pub fn store_spectrum(&self, magnitudes: &[f32]) {
        for (slot, &magnitude) in self.spectrum.iter().zip(magnitudes) {
            slot.store(magnitude);
        }
    }

    /// Copy of the current spectrum (allocates; not for the audio thread)
    pub fn spectrum(&self) -> Vec<f32> {
        self.spectrum.iter().map(AtomicF32::load).collect()
    }

    pub fn clear(&self) {
        self.set_levels(0.0, 0.0);
        for bin in self.spectrum.iter() {
            bin.store(0.0);
        }
    }
}

/// Channel slots plus the device sample rate
pub struct SampleStore {
    channels: Box<[ChannelSlot]>,
    sample_rate: AtomicF32,
}

impl SampleStore {
    pub fn new(num_channels: usize, num_bins: usize, sample_rate: f32) -> Self {
        Self {
            channels: (0..num_channels).map(|_| ChannelSlot::new(num_bins)).collect(),
            sample_rate: AtomicF32::new(sample_rate),
        }
    }

    pub fn num_channels(&self) -> usize {
        self.channels.len()
    }

    #[inline]
    pub fn channel(&self, channel: usize) -> Option<&ChannelSlot> {
        self.channels.get(channel)
    }

    pub fn channels(&self) -> &[ChannelSlot] {
        &self.channels
    }

    #[inline]
    pub fn sample_rate(&self) -> f32 {
        self.sample_rate.load()
    }

    pub fn set_sample_rate(&self, sample_rate: f32) {
        self.sample_rate.store(sample_rate);
    }

    pub fn clear(&self) {
        for slot in self.channels.iter() {
            slot.clear();
        }
    }
}
