/// SPARQL HTTP client implementation.
///
/// This module provides `SparqlClient` for issuing synchronous SELECT queries,
/// along with error types, retry handling and a builder for configuration.
use std::thread;
use std::time::Duration;

use reqwest::header::ACCEPT;
use thiserror::Error;
use tracing::debug;

use super::results::SparqlResults;
use crate::config::{
    DEFAULT_ENDPOINT, DEFAULT_QUERY_TIMEOUT, DEFAULT_USER_AGENT, ENDPOINT_VAR, QUERY_TIMEOUT_VAR,
    USER_AGENT_VAR,
};

const SPARQL_JSON: &str = "application/sparql-results+json";

/// Errors that can occur when querying a SPARQL endpoint.
#[derive(Debug, Error)]
pub enum KbError {
    /// Network-related errors (connection failures, DNS resolution, etc.)
    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    /// Request or response timeout errors
    #[error("Query timed out")]
    Timeout(#[source] reqwest::Error),

    /// HTTP errors with status code
    #[error("HTTP error: status {status}")]
    Http { status: u16 },

    /// Response body was not valid SPARQL JSON
    #[error("Serialization error: {0}")]
    Serialization(#[source] serde_json::Error),

    /// Response parsed but did not have the expected shape
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// Invalid endpoint URL configuration
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl KbError {
    fn from_transport(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            KbError::Timeout(error)
        } else {
            KbError::Network(error)
        }
    }
}

/// Builder for constructing `SparqlClient` instances.
///
/// # Examples
///
/// ```
/// use kgtree::knowledge_base::SparqlClientBuilder;
///
/// let client = SparqlClientBuilder::new()
///     .endpoint("https://query.wikidata.org/sparql")
///     .user_agent("KnowledgeGraphBot/1.0")
///     .build()
///     .expect("Failed to create client");
/// assert_eq!(client.endpoint(), "https://query.wikidata.org/sparql");
/// ```
#[derive(Debug, Default)]
pub struct SparqlClientBuilder {
    endpoint: Option<String>,
    user_agent: Option<String>,
    timeout: Option<Duration>,
    retry_delays: Option<Vec<Duration>>,
}

impl SparqlClientBuilder {
    /// Creates a new `SparqlClientBuilder` with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the SPARQL endpoint URL.
    pub fn endpoint(mut self, url: impl Into<String>) -> Self {
        self.endpoint = Some(url.into());
        self
    }

    /// Sets the descriptive client identifier sent as `User-Agent`.
    ///
    /// Public endpoints such as Wikidata throttle or block anonymous clients.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Sets the per-request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the sleeps between retries of a transient failure.
    ///
    /// An empty list disables retrying. Defaults to 1s, 2s, 4s.
    pub fn retry_delays(mut self, delays: Vec<Duration>) -> Self {
        self.retry_delays = Some(delays);
        self
    }

    /// Builds the `SparqlClient` with the configured settings.
    ///
    /// # Environment Variables
    ///
    /// Unset values fall back to `KGTREE_SPARQL_ENDPOINT`, `KGTREE_USER_AGENT`
    /// and `KGTREE_QUERY_TIMEOUT`, then to the Wikidata defaults.
    ///
    /// # Errors
    ///
    /// Returns `KbError::InvalidUrl` if the endpoint does not parse.
    pub fn build(self) -> Result<SparqlClient, KbError> {
        let endpoint = self
            .endpoint
            .or_else(|| std::env::var(ENDPOINT_VAR).ok())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());

        let user_agent = self
            .user_agent
            .or_else(|| std::env::var(USER_AGENT_VAR).ok())
            .unwrap_or_else(|| DEFAULT_USER_AGENT.to_string());

        let timeout = self
            .timeout
            .or_else(|| {
                std::env::var(QUERY_TIMEOUT_VAR)
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_secs)
            })
            .unwrap_or(DEFAULT_QUERY_TIMEOUT);

        let retry_delays = self.retry_delays.unwrap_or_else(|| {
            vec![
                Duration::from_secs(1),
                Duration::from_secs(2),
                Duration::from_secs(4),
            ]
        });

        reqwest::Url::parse(&endpoint)
            .map_err(|e| KbError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent.clone())
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(KbError::Network)?;

        Ok(SparqlClient {
            client,
            endpoint,
            user_agent,
            retry_delays,
        })
    }
}

/// Synchronous client for a SPARQL 1.1 query endpoint.
///
/// It should be constructed using `SparqlClientBuilder`.
pub struct SparqlClient {
    client: reqwest::blocking::Client,
    endpoint: String,
    user_agent: String,
    retry_delays: Vec<Duration>,
}

/// Trait for knowledge-base query operations.
///
/// This trait enables mocking in unit tests and decouples the resolver from
/// the HTTP transport.
pub trait KnowledgeBase: Send + Sync {
    /// Executes a SPARQL SELECT query and returns its bindings.
    fn select(&self, query: &str) -> Result<SparqlResults, KbError>;
}

impl SparqlClient {
    /// Returns the endpoint URL configured for this client.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Returns the `User-Agent` configured for this client.
    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    fn select_once(&self, query: &str) -> Result<SparqlResults, KbError> {
        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("query", query), ("format", "json")])
            .header(ACCEPT, SPARQL_JSON)
            .send()
            .map_err(KbError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(KbError::Http {
                status: status.as_u16(),
            });
        }

        let body = response.text().map_err(KbError::from_transport)?;
        SparqlResults::from_json(&body)
    }
}

impl KnowledgeBase for SparqlClient {
    fn select(&self, query: &str) -> Result<SparqlResults, KbError> {
        retry_with_backoff(&self.retry_delays, || self.select_once(query))
    }
}

/// Retries an operation, sleeping for each of `delays` in turn.
///
/// The operation runs once, then up to `delays.len()` more times. It only
/// retries transient errors (network, timeouts, HTTP 5xx and 429), never
/// client or parse errors.
///
/// # Returns
///
/// Returns the result of the operation if it succeeds, or the last error if all retries fail.
pub fn retry_with_backoff<F, T>(delays: &[Duration], mut f: F) -> Result<T, KbError>
where
    F: FnMut() -> Result<T, KbError>,
{
    let mut last_error = match f() {
        Ok(result) => return Ok(result),
        Err(e) => {
            if !should_retry(&e) {
                return Err(e);
            }
            e
        }
    };

    for (attempt, &delay) in delays.iter().enumerate() {
        debug!(attempt = attempt + 1, error = %last_error, "retrying query");
        thread::sleep(delay);

        match f() {
            Ok(result) => return Ok(result),
            Err(e) => {
                if !should_retry(&e) {
                    return Err(e);
                }
                last_error = e;
            }
        }
    }

    Err(last_error)
}

/// Determines if an error should be retried.
fn should_retry(error: &KbError) -> bool {
    match error {
        KbError::Network(_) => true,
        KbError::Timeout(_) => true,
        // Wikidata answers 429 when the client is being throttled
        KbError::Http { status } => *status == 429 || (500..600).contains(status),
        KbError::Serialization(_) => false,
        KbError::MalformedResponse { .. } => false,
        KbError::InvalidUrl(_) => false,
    }
}
