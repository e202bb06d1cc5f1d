//! Clock Module
//!
//! Time sources used to stamp and check entry expiry.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::time::Instant;

// == Clock Trait ==
/// A source of monotonic time.
pub trait Clock: Send + Sync + 'static {
    /// Returns the current instant.
    fn now(&self) -> Instant;
}

// == System Clock ==
/// Reads Tokio's clock, which follows real time unless the runtime's time is
/// paused (see `tokio::time::pause`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

// == Manual Clock ==
/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the cache.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    /// Creates a clock frozen at the current instant.
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    /// Moves the clock forward by `by`.
    ///
    /// An advance past the latest representable instant stops as close to it
    /// as the platform allows instead of panicking.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        let mut remaining = by;
        let mut step = by;
        while !remaining.is_zero() && !step.is_zero() {
            step = step.min(remaining);
            match now.checked_add(step) {
                Some(next) => {
                    *now = next;
                    remaining -= step;
                }
                None => step /= 2,
            }
        }
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
