//! Runtime configuration for the hierarchy pipeline.
//!
//! Values come from environment variables (optionally seeded from a `.env`
//! file by the binary) with fallback defaults. Unparseable values are ignored
//! rather than rejected.

use std::path::PathBuf;
use std::time::Duration;

use crate::cache::DEFAULT_TTL;

pub const CACHE_DIR_VAR: &str = "KGTREE_CACHE_DIR";
pub const CACHE_TTL_VAR: &str = "KGTREE_CACHE_TTL";
pub const ENDPOINT_VAR: &str = "KGTREE_SPARQL_ENDPOINT";
pub const USER_AGENT_VAR: &str = "KGTREE_USER_AGENT";
pub const QUERY_TIMEOUT_VAR: &str = "KGTREE_QUERY_TIMEOUT";
pub const LANGUAGE_VAR: &str = "KGTREE_LANGUAGE";

pub const DEFAULT_ENDPOINT: &str = "https://query.wikidata.org/sparql";
pub const DEFAULT_USER_AGENT: &str = "KnowledgeGraphBot/1.0";
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_LANGUAGE: &str = "zh";

/// Settings shared by the cache, the SPARQL client and the resolver.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding one JSON file per cached query.
    pub cache_dir: PathBuf,
    /// How long a cached query result stays valid.
    pub cache_ttl: Duration,
    /// SPARQL endpoint URL.
    pub endpoint: String,
    /// `User-Agent` sent with every query.
    pub user_agent: String,
    /// Per-request timeout; an expired request counts as an empty result.
    pub query_timeout: Duration,
    /// Language tag labels must carry (e.g. "zh").
    pub language: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            cache_ttl: DEFAULT_TTL,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            query_timeout: DEFAULT_QUERY_TIMEOUT,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }
}

impl Config {
    /// Reads configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `KGTREE_CACHE_DIR` (path): cache directory
    /// - `KGTREE_CACHE_TTL` (seconds, default 86400): cache entry lifetime
    /// - `KGTREE_SPARQL_ENDPOINT` (URL, default Wikidata): query endpoint
    /// - `KGTREE_USER_AGENT` (default "KnowledgeGraphBot/1.0")
    /// - `KGTREE_QUERY_TIMEOUT` (seconds, default 30)
    /// - `KGTREE_LANGUAGE` (language tag, default "zh")
    ///
    /// # Examples
    ///
    /// ```
    /// use kgtree::Config;
    ///
    /// let config = Config::from_env();
    /// assert!(!config.language.is_empty());
    /// ```
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let cache_dir = non_empty_var(CACHE_DIR_VAR)
            .map(PathBuf::from)
            .unwrap_or(defaults.cache_dir);

        let cache_ttl = non_empty_var(CACHE_TTL_VAR)
            .and_then(|s| s.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.cache_ttl);

        let endpoint = non_empty_var(ENDPOINT_VAR).unwrap_or(defaults.endpoint);
        let user_agent = non_empty_var(USER_AGENT_VAR).unwrap_or(defaults.user_agent);

        let query_timeout = non_empty_var(QUERY_TIMEOUT_VAR)
            .and_then(|s| s.parse().ok())
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .unwrap_or(defaults.query_timeout);

        let language = non_empty_var(LANGUAGE_VAR)
            .filter(|tag| is_language_tag(tag))
            .unwrap_or(defaults.language);

        Self {
            cache_dir,
            cache_ttl,
            endpoint,
            user_agent,
            query_timeout,
            language,
        }
    }
}

/// Gets the cross-platform cache directory.
///
/// Returns `{cache_dir}/kgtree` where `cache_dir` is:
/// - Linux: `~/.cache`
/// - macOS: `~/Library/Caches`
/// - Windows: `C:\Users\<user>\AppData\Local`
///
/// Falls back to `data/cache` relative to the working directory.
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .map(|dir| dir.join("kgtree"))
        .unwrap_or_else(|| PathBuf::from("data").join("cache"))
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Language tags end up unescaped in `"..."@tag` literals, so only allow the
/// BCP 47 alphabet.
pub(crate) fn is_language_tag(tag: &str) -> bool {
    tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        && tag.chars().next().is_some_and(|c| c.is_ascii_alphabetic())
}
