use std::time::{Duration, Instant};

/// A Timer with a given duration after which it will enter into a "Ringing"
/// state. The Timer can be reset at a given time to wait another duration.
///
/// Time never advances on its own: every query takes the caller's `now`, so
/// a frame loop (or a test) decides what time it is.
#[derive(Clone, Debug)]
pub struct Timer {
    duration: Duration,
    last: Instant,
}

impl Timer {
    /// Creates a new Timer which starts counting at `now`
    pub fn new(duration: Duration, now: &Instant) -> Self {
        Self {
            duration,
            last: *now,
        }
    }

    /// Reset the Timer to stop ringing and wait another full duration
    pub fn reset(&mut self, now: &Instant) {
        self.last = *now;
    }

    /// Gets whether or not the Timer is "Ringing" (i.e. the given duration has
    /// elapsed since the last "reset")
    pub fn ringing(&self, now: &Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.duration
    }

    /// Time elapsed since the last reset
    pub fn elapsed(&self, now: &Instant) -> Duration {
        now.saturating_duration_since(self.last)
    }

    /// Time left until the Timer rings, zero once ringing
    pub fn remaining(&self, now: &Instant) -> Duration {
        self.duration.saturating_sub(self.elapsed(now))
    }

    /// Fraction of the duration that has elapsed, clamped to 1.0
    pub fn progress(&self, now: &Instant) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        (self.elapsed(now).as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }
}
