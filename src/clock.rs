use std::time::Instant;

#[cfg(test)]
use mockall::automock;

/// Millisecond timestamp source for time-based measurement windows.
///
/// Timestamps wrap at `u32::MAX`; durations must be computed with
/// `wrapping_sub` so a window spanning the wrap point still closes.
#[cfg_attr(test, automock)]
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Wall clock counting milliseconds since construction.
pub struct StdClock {
    origin: Instant,
}

impl StdClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for StdClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for StdClock {
    fn now_ms(&self) -> u32 {
        self.origin.elapsed().as_millis() as u32
    }
}
