//! Domain types providing compile-time safety and self-documentation
//!
//! These newtype wrappers keep opaque target identifiers apart from tick
//! counts, and keep every tick-to-time conversion behind one frequency type.

// Tick counts are converted to f64 for display and export
#![allow(clippy::cast_precision_loss)]

use std::fmt;
use std::num::NonZeroU32;

/// Default tick frequency in Hz.
///
/// Placeholder matching a 120 MHz STM32F205 core clock. Timings are only as
/// accurate as the frequency supplied for the actual target.
pub const DEFAULT_CPU_FREQUENCY: u32 = 120_000_000;

/// Opaque target handle
///
/// A task control block pointer, queue/semaphore/mutex handle, or heap
/// address depending on the event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Handle(pub u32);

impl fmt::Display for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

impl From<u32> for Handle {
    fn from(raw: u32) -> Self {
        Handle(raw)
    }
}

/// Tick frequency (ticks per second)
///
/// Non-zero by construction so conversions never divide by zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CpuFrequency(NonZeroU32);

impl CpuFrequency {
    /// Create a frequency, rejecting zero
    pub fn new(hz: u32) -> Option<Self> {
        NonZeroU32::new(hz).map(Self)
    }

    pub fn hz(self) -> u32 {
        self.0.get()
    }

    /// Convert a tick count to seconds
    pub fn ticks_to_seconds(self, ticks: u64) -> f64 {
        ticks as f64 / f64::from(self.hz())
    }

    /// Convert a tick count to microseconds
    pub fn ticks_to_micros(self, ticks: u64) -> f64 {
        ticks as f64 * 1_000_000.0 / f64::from(self.hz())
    }
}

const DEFAULT_HZ: NonZeroU32 = match NonZeroU32::new(DEFAULT_CPU_FREQUENCY) {
    Some(hz) => hz,
    None => panic!("default CPU frequency must be non-zero"),
};

impl Default for CpuFrequency {
    fn default() -> Self {
        Self(DEFAULT_HZ)
    }
}

impl fmt::Display for CpuFrequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hz = self.hz();
        if hz % 1_000_000 == 0 {
            write!(f, "{} MHz", hz / 1_000_000)
        } else {
            write!(f, "{hz} Hz")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handle_display() {
        assert_eq!(Handle(0x2000_0100).to_string(), "0x20000100");
        assert_eq!(Handle(5).to_string(), "0x00000005");
    }

    #[test]
    fn test_zero_frequency_rejected() {
        assert!(CpuFrequency::new(0).is_none());
    }

    #[test]
    fn test_default_frequency() {
        assert_eq!(CpuFrequency::default().hz(), DEFAULT_CPU_FREQUENCY);
        assert_eq!(CpuFrequency::default().to_string(), "120 MHz");
    }

    #[test]
    fn test_tick_conversions() {
        let freq = CpuFrequency::new(168_000_000).unwrap();
        assert!((freq.ticks_to_seconds(168_000_000) - 1.0).abs() < 1e-9);

        let freq = CpuFrequency::new(1000).unwrap();
        assert_eq!(freq.ticks_to_seconds(1000), 1.0);
        assert_eq!(freq.ticks_to_micros(1), 1000.0);
        assert_eq!(freq.to_string(), "1000 Hz");
    }
}
