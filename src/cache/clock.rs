use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use time::OffsetDateTime;

/// Source of the current time for cache expiry decisions.
///
/// Time is expressed as fractional seconds since the Unix epoch, which is
/// also the on-disk timestamp format.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

/// Wall-clock time.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        OffsetDateTime::now_utc().unix_timestamp_nanos() as f64 / 1_000_000_000.0
    }
}

/// A clock that only moves when told to.
///
/// Stored with millisecond resolution so it can be shared between a cache
/// and the test driving it without locking.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use kgtree::cache::{Clock, ManualClock};
///
/// let clock = ManualClock::new(1_000.0);
/// clock.advance(Duration::from_secs(60));
/// assert_eq!(clock.now(), 1_060.0);
/// ```
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    /// Creates a clock frozen at `start` seconds since the epoch.
    pub fn new(start: f64) -> Self {
        Self {
            millis: AtomicU64::new((start * 1000.0) as u64),
        }
    }

    /// Moves the clock forward.
    pub fn advance(&self, by: Duration) {
        self.millis
            .fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.millis.load(Ordering::SeqCst) as f64 / 1000.0
    }
}
