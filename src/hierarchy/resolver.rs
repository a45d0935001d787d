//! Cache-checked hierarchy queries with exact-then-fuzzy fallback.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::{CacheError, ResultCache};
use crate::config::{DEFAULT_LANGUAGE, is_language_tag};
use crate::knowledge_base::{
    Direction, KbError, KnowledgeBase, SparqlResults, exact_match_query, fuzzy_match_query,
};

/// Result variable holding the reached concept's label.
const LABEL_VAR: &str = "itemLabel";

/// Errors that abort a hierarchy lookup.
///
/// Knowledge-base failures are deliberately absent: they fail open to an
/// empty result. Only a storage fault in the cache is surfaced.
#[derive(Debug, Error)]
pub enum HierarchyError {
    #[error(transparent)]
    Cache(#[from] CacheError),
}

/// Outcome of a single query attempt.
#[derive(Debug)]
pub enum QueryOutcome {
    /// At least one binding came back.
    Found(SparqlResults),
    /// The endpoint answered with no bindings.
    Empty,
    /// Transport or parse failure.
    Failed(KbError),
}

impl QueryOutcome {
    fn from_result(result: Result<SparqlResults, KbError>) -> Self {
        match result {
            Ok(results) if results.is_empty() => QueryOutcome::Empty,
            Ok(results) => QueryOutcome::Found(results),
            Err(e) => QueryOutcome::Failed(e),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, QueryOutcome::Failed(_))
    }

    /// Collapses the outcome to a result set; failures become empty.
    pub fn into_results(self) -> SparqlResults {
        match self {
            QueryOutcome::Found(results) => results,
            QueryOutcome::Empty | QueryOutcome::Failed(_) => SparqlResults::default(),
        }
    }
}

/// Builder for constructing `HierarchyResolver` instances.
#[derive(Default)]
pub struct HierarchyResolverBuilder {
    knowledge_base: Option<Arc<dyn KnowledgeBase>>,
    cache: Option<ResultCache>,
    language: Option<String>,
}

impl HierarchyResolverBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the knowledge base to query.
    pub fn knowledge_base(mut self, knowledge_base: Arc<dyn KnowledgeBase>) -> Self {
        self.knowledge_base = Some(knowledge_base);
        self
    }

    /// Enables result caching. Without a cache every lookup hits the endpoint.
    pub fn cache(mut self, cache: ResultCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Sets the label language (default "zh").
    ///
    /// A tag outside the BCP 47 alphabet is ignored and the previous
    /// language is kept.
    pub fn language(mut self, language: impl Into<String>) -> Self {
        let language = language.into();
        if is_language_tag(&language) {
            self.language = Some(language);
        } else {
            warn!(%language, "ignoring invalid language tag");
        }
        self
    }

    /// Builds the `HierarchyResolver`.
    ///
    /// # Panics
    ///
    /// Panics if `knowledge_base()` was not called before `build()`.
    #[must_use]
    pub fn build(self) -> HierarchyResolver {
        HierarchyResolver {
            knowledge_base: self
                .knowledge_base
                .expect("knowledge base must be set via knowledge_base() method"),
            cache: self.cache,
            language: self
                .language
                .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
        }
    }
}

/// Resolves entities to their broader or narrower concepts.
pub struct HierarchyResolver {
    knowledge_base: Arc<dyn KnowledgeBase>,
    cache: Option<ResultCache>,
    language: String,
}

impl HierarchyResolver {
    /// Creates an uncached resolver for the default language.
    ///
    /// Prefer `HierarchyResolverBuilder` to attach a cache.
    #[must_use]
    pub fn new(knowledge_base: Arc<dyn KnowledgeBase>) -> Self {
        Self {
            knowledge_base,
            cache: None,
            language: DEFAULT_LANGUAGE.to_string(),
        }
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    /// Stable cache key for an entity lookup in one direction.
    ///
    /// # Examples
    ///
    /// ```
    /// use kgtree::hierarchy::HierarchyResolver;
    /// use kgtree::knowledge_base::Direction;
    ///
    /// let key = HierarchyResolver::cache_key("皮膚科", Direction::Broader, "zh");
    /// assert!(key.starts_with("wikidata_"));
    /// assert_eq!(key, HierarchyResolver::cache_key("皮膚科", Direction::Broader, "zh"));
    /// assert_ne!(key, HierarchyResolver::cache_key("皮膚科", Direction::Narrower, "zh"));
    /// ```
    pub fn cache_key(entity: &str, direction: Direction, language: &str) -> String {
        let subject = format!("{language}\0{direction}\0{entity}");
        let hash = blake3::hash(subject.as_bytes()).to_hex();
        format!("wikidata_{}", &hash.as_str()[..32])
    }

    /// Returns the raw result set for `entity` in `direction`.
    ///
    /// Tries the cache, then an exact label match, then a substring match.
    /// The result set actually used is cached unless it stems from a failed
    /// query. An entity unknown to the knowledge base yields an empty set.
    ///
    /// # Errors
    ///
    /// Only cache storage faults are returned.
    pub fn query_hierarchy(
        &self,
        entity: &str,
        direction: Direction,
    ) -> Result<SparqlResults, HierarchyError> {
        let key = Self::cache_key(entity, direction, &self.language);

        if let Some(cache) = &self.cache
            && let Some(value) = cache.get(&key)?
        {
            match serde_json::from_value::<SparqlResults>(value) {
                Ok(results) => {
                    debug!(entity, %direction, "using cached hierarchy");
                    return Ok(results);
                }
                Err(e) => warn!(entity, error = %e, "cached hierarchy has unexpected shape"),
            }
        }

        let exact = self.run(
            entity,
            direction,
            "exact",
            &exact_match_query(entity, direction, &self.language),
        );

        let (results, cacheable) = match exact {
            QueryOutcome::Found(results) => (results, true),
            exact => {
                info!(entity, %direction, "no exact match, falling back to fuzzy match");
                let fuzzy = self.run(
                    entity,
                    direction,
                    "fuzzy",
                    &fuzzy_match_query(entity, direction, &self.language),
                );
                let cacheable = !exact.is_failed() && !fuzzy.is_failed();
                (fuzzy.into_results(), cacheable)
            }
        };

        if cacheable && let Some(cache) = &self.cache {
            let value = serde_json::to_value(&results).map_err(CacheError::Serialization)?;
            cache.set(&key, &value)?;
        }

        Ok(results)
    }

    /// Returns the labels reached from `entity`, restricted to the resolver's language.
    pub fn labels(&self, entity: &str, direction: Direction) -> Result<Vec<String>, HierarchyError> {
        let results = self.query_hierarchy(entity, direction)?;
        Ok(results
            .concept_labels(LABEL_VAR)
            .into_iter()
            .filter(|label| label.is_in(&self.language))
            .map(|label| label.text)
            .collect())
    }

    fn run(&self, entity: &str, direction: Direction, mode: &str, query: &str) -> QueryOutcome {
        let outcome = QueryOutcome::from_result(self.knowledge_base.select(query));
        match &outcome {
            QueryOutcome::Found(results) => {
                debug!(entity, %direction, mode, bindings = results.len(), "hierarchy query matched");
            }
            QueryOutcome::Empty => debug!(entity, %direction, mode, "hierarchy query empty"),
            QueryOutcome::Failed(e) => {
                warn!(entity, %direction, mode, error = %e, "hierarchy query failed, treating as empty");
            }
        }
        outcome
    }
}
