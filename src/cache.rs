//! Disk-backed result cache with time-based expiry.
//!
//! Each entry lives in its own `{key}.json` file holding the write timestamp
//! (seconds since the Unix epoch) and the cached payload. Missing, expired and
//! malformed entries are all reported as a miss; only storage faults surface
//! as errors.
mod clock;
mod result_cache;

pub use clock::{Clock, ManualClock, SystemClock};
pub use result_cache::{CacheError, DEFAULT_TTL, PurgeReport, ResultCache};
