//! Block Level Metering
//!
//! Computes peak and RMS loudness for one channel's block of samples.
//!
//! The peak is the signed maximum of the block, not the maximum absolute
//! value: only positive-going excursions raise it, and a block that never
//! rises above zero reports a negative (or zero) peak.

/// Peak and RMS of a single block
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BlockLevels {
    /// Signed maximum sample value
    pub peak: f32,
    /// Root mean square, `sqrt(sum(x^2) / n)`
    pub rms: f32,
}

/// Measure a block of samples.
///
/// Returns `None` for an empty block so callers never see a `0 / 0` RMS.
///
/// # Real-time Safety
/// No allocations, O(n) time.
#[inline]
pub fn measure(block: &[f32]) -> Option<BlockLevels> {
    if block.is_empty() {
        return None;
    }

    let (peak, squares_sum) = block
        .iter()
        .fold((f32::NEG_INFINITY, 0.0_f32), |(peak, sum), &sample| {
            (peak.max(sample), sum + sample * sample)
        });

    Some(BlockLevels {
        peak,
        rms: (squares_sum / block.len() as f32).sqrt(),
    })
}

/// Convert linear amplitude to decibels (full scale), floored at -100dB
#[inline]
pub fn linear_to_db(amplitude: f32) -> f32 {
    if amplitude <= 0.0 {
        return -100.0;
    }
    (20.0 * amplitude.log10()).max(-100.0)
}
