/// SPARQL knowledge-base access.
///
/// This module provides a blocking HTTP client for SPARQL endpoints (Wikidata by
/// default), the hierarchy query builders, and the typed result-set model.
mod client;
mod query;
mod results;

pub use client::{
    KbError, KnowledgeBase, SparqlClient, SparqlClientBuilder, retry_with_backoff,
};
pub use query::{Direction, HIERARCHY_RELATIONS, escape_literal, exact_match_query, fuzzy_match_query};
pub use results::{BindingValue, ConceptLabel, SparqlResults};
