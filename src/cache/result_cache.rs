use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::clock::{Clock, SystemClock};

/// Default entry lifetime: 24 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(86_400);

/// Errors that can occur when reading or writing the cache directory.
///
/// Corrupt or expired entries are not errors; they read as a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Filesystem failures other than a missing entry (permissions, disk full, etc.)
    #[error("Cache I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Payload could not be encoded for writing
    #[error("Cache serialization error: {0}")]
    Serialization(#[source] serde_json::Error),
}

/// On-disk shape of a single entry.
#[derive(Debug, Serialize, Deserialize)]
struct CacheEntry {
    timestamp: f64,
    data: Value,
}

/// Outcome of a housekeeping pass over the cache directory.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PurgeReport {
    pub scanned: usize,
    pub removed: usize,
}

/// Durable key/value store with fixed-duration expiry.
///
/// # Examples
///
/// ```
/// use kgtree::cache::ResultCache;
/// use serde_json::json;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dir = tempfile::tempdir()?;
/// let cache = ResultCache::open(dir.path())?;
///
/// cache.set("wikidata_abc", &json!({"results": {"bindings": []}}))?;
/// assert!(cache.get("wikidata_abc")?.is_some());
/// assert!(cache.get("missing")?.is_none());
/// # Ok(())
/// # }
/// ```
pub struct ResultCache {
    dir: PathBuf,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ResultCache {
    /// Opens a cache rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl AsRef<Path>) -> Result<Self, CacheError> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir).map_err(|source| CacheError::Io {
            path: dir.clone(),
            source,
        })?;

        Ok(Self {
            dir,
            ttl: DEFAULT_TTL,
            clock: Arc::new(SystemClock),
        })
    }

    /// Sets how long entries stay valid.
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Replaces the time source used for stamping and expiry.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the payload stored under `key` if it exists and has not expired.
    ///
    /// # Errors
    ///
    /// Only storage faults (e.g. permission denied) are returned. A missing
    /// file, an expired entry and unparseable content all yield `Ok(None)`.
    pub fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let path = self.entry_path(key);

        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(key, "cache miss");
                return Ok(None);
            }
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let entry: CacheEntry = match serde_json::from_slice(&raw) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(key, error = %e, "ignoring malformed cache entry");
                return Ok(None);
            }
        };

        let age = self.clock.now() - entry.timestamp;
        if age > self.ttl.as_secs_f64() {
            debug!(key, age_secs = age, "cache entry expired");
            return Ok(None);
        }

        debug!(key, "cache hit");
        Ok(Some(entry.data))
    }

    /// Stores `value` under `key`, overwriting any previous entry.
    ///
    /// The write is not atomic; a torn file reads back as a miss.
    pub fn set(&self, key: &str, value: &Value) -> Result<(), CacheError> {
        let entry = CacheEntry {
            timestamp: self.clock.now(),
            data: value.clone(),
        };
        let encoded = serde_json::to_string_pretty(&entry).map_err(CacheError::Serialization)?;

        let path = self.entry_path(key);
        fs::write(&path, encoded).map_err(|source| CacheError::Io { path, source })
    }

    /// Removes entries whose query result has no bindings, plus entries that
    /// can no longer be parsed.
    ///
    /// With `dry_run` set, nothing is deleted and `removed` counts what would be.
    pub fn purge_empty(&self, dry_run: bool) -> Result<PurgeReport, CacheError> {
        let io_err = |source| CacheError::Io {
            path: self.dir.clone(),
            source,
        };

        let mut report = PurgeReport::default();
        for dir_entry in fs::read_dir(&self.dir).map_err(io_err)? {
            let path = dir_entry.map_err(io_err)?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("json") {
                continue;
            }
            report.scanned += 1;

            let removable = match fs::read(&path) {
                Ok(raw) => match serde_json::from_slice::<CacheEntry>(&raw) {
                    Ok(entry) => has_empty_bindings(&entry.data),
                    Err(_) => true,
                },
                Err(source) => return Err(CacheError::Io { path, source }),
            };
            if !removable {
                continue;
            }

            if !dry_run {
                fs::remove_file(&path).map_err(|source| CacheError::Io {
                    path: path.clone(),
                    source,
                })?;
            }
            debug!(path = %path.display(), dry_run, "purged empty cache entry");
            report.removed += 1;
        }

        Ok(report)
    }

    fn entry_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

fn has_empty_bindings(data: &Value) -> bool {
    data.pointer("/results/bindings")
        .and_then(Value::as_array)
        .is_some_and(Vec::is_empty)
}
