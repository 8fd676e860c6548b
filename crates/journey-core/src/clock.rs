//! Time sources for transitions and reconnect timers.

use std::time::Instant;

/// Monotonic seconds since some fixed origin.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Wall clock measured from construction.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// A clock that only moves when told to.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ManualClock {
    seconds: f64,
}

impl ManualClock {
    pub fn at(seconds: f64) -> Self {
        Self { seconds }
    }

    pub fn advance(&mut self, seconds: f64) {
        self.seconds += seconds;
    }

    pub fn set(&mut self, seconds: f64) {
        self.seconds = seconds;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.seconds
    }
}
