//! Atomic types used for gauge cells.
//!
//! Gauge values are 64-bit floats stored as their bit pattern inside an atomic 64-bit integer,
//! which keeps increments and decrements lock-free: adjustments are a compare-and-swap loop over
//! the bits, and overwrites are a single atomic swap.
//!
//! We always require an atomic integer of 64 bits regardless of whether the standard library
//! exposes one for the target architecture, so 32-bit targets fall back to `portable-atomic`.

use std::sync::atomic::Ordering;

#[cfg(target_pointer_width = "32")]
pub use portable_atomic::AtomicU64;
#[cfg(not(target_pointer_width = "32"))]
pub use std::sync::atomic::AtomicU64;

/// A gauge cell handler.
///
/// The one trait seam between the sharded map and the numeric payload it stores. All operations
/// take `&self`: a cell is shared freely between concurrent writers and the collector.
pub trait GaugeFn {
    /// Increments the gauge by the given amount.
    fn increment(&self, value: f64);

    /// Decrements the gauge by the given amount.
    fn decrement(&self, value: f64);

    /// Sets the gauge to the given amount.
    fn set(&self, value: f64);

    /// Reads the current value of the gauge.
    fn read(&self) -> f64;
}

impl GaugeFn for AtomicU64 {
    fn increment(&self, value: f64) {
        let _ = self.fetch_update(Ordering::AcqRel, Ordering::Relaxed, |curr| {
            let input = f64::from_bits(curr);
            let output = input + value;
            Some(output.to_bits())
        });
    }

    fn decrement(&self, value: f64) {
        let _ = self.fetch_update(Ordering::AcqRel, Ordering::Relaxed, |curr| {
            let input = f64::from_bits(curr);
            let output = input - value;
            Some(output.to_bits())
        });
    }

    fn set(&self, value: f64) {
        let _ = self.swap(value.to_bits(), Ordering::AcqRel);
    }

    fn read(&self) -> f64 {
        f64::from_bits(self.load(Ordering::Acquire))
    }
}

#[cfg(test)]
mod tests {
    use super::{AtomicU64, GaugeFn};

    #[test]
    fn adjustments_accumulate_in_float_space() {
        let cell = AtomicU64::new(0);
        cell.increment(1.5);
        cell.increment(2.25);
        cell.decrement(0.75);
        assert_eq!(cell.read(), 3.0);
    }

    #[test]
    fn set_overwrites_unconditionally() {
        let cell = AtomicU64::new(0);
        cell.increment(10.0);
        cell.set(-2.5);
        assert_eq!(cell.read(), -2.5);
    }

    #[test]
    fn gauges_can_go_negative() {
        let cell = AtomicU64::new(0);
        cell.decrement(4.0);
        assert_eq!(cell.read(), -4.0);
    }
}
