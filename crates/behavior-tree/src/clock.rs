//! Injected time source.
//!
//! Timed strategies never read a global clock. The driving code advances a
//! [`FrameClock`] once per frame and exposes it through whatever context type
//! the tree is ticked with, as long as that type implements [`Clock`].

use std::time::Duration;

/// Monotonic time as seen by the tick that is currently being processed.
pub trait Clock {
    /// Time at the end of the current tick, measured from an arbitrary origin.
    fn now(&self) -> Duration;

    /// Length of the current tick.
    fn delta(&self) -> Duration;
}

/// Fixed-step frame clock advanced by the driver before each tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameClock {
    now: Duration,
    delta: Duration,
}

impl FrameClock {
    /// Creates a clock at time zero with no elapsed tick.
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the clock by one tick of the given length.
    pub fn advance(&mut self, delta: Duration) {
        self.delta = delta;
        self.now += delta;
    }
}

impl Clock for FrameClock {
    #[inline]
    fn now(&self) -> Duration {
        self.now
    }

    #[inline]
    fn delta(&self) -> Duration {
        self.delta
    }
}

/// Tick length for a fixed update rate, rounded up to whole nanoseconds.
///
/// Rounding up guarantees that `hz` ticks cover at least one second.
pub fn tick_duration(hz: u32) -> Duration {
    let hz = u64::from(hz.max(1));
    Duration::from_nanos(1_000_000_000_u64.div_ceil(hz))
}

/// Seconds as a [`Duration`], clamping negative and NaN input to zero and
/// saturating on overflow.
pub fn secs_f32(seconds: f32) -> Duration {
    Duration::try_from_secs_f32(seconds.max(0.0)).unwrap_or(Duration::MAX)
}
