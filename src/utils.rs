//! Shared helpers for wiring the pipeline from configuration.
//!
//! These functions are used by the CLI and by integration tests.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use crate::builder::ConceptTreeBuilder;
use crate::cache::ResultCache;
use crate::config::Config;
use crate::hierarchy::{HierarchyResolver, HierarchyResolverBuilder};
use crate::knowledge_base::{KnowledgeBase, SparqlClientBuilder};
use crate::models::EntityRecord;
use crate::relevance::{RelevanceConfig, RelevanceFilter};

/// Gets the default location of the batch tree file.
///
/// Returns `{data_dir}/kgtree/concept_trees.json`, falling back to
/// `data/trees/concept_trees.json` relative to the working directory.
pub fn default_trees_path() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("kgtree"))
        .unwrap_or_else(|| PathBuf::from("data").join("trees"))
        .join("concept_trees.json")
}

/// Ensures the parent directory of `path` exists.
///
/// # Errors
///
/// Returns an error if directory creation fails.
pub fn ensure_parent_directory(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }
    Ok(())
}

/// Reads entity records produced by the recogniser from a JSON array.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a JSON array of
/// records, or if it contains no records at all.
pub fn load_entity_records(path: &Path) -> Result<Vec<EntityRecord>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read entity file: {}", path.display()))?;
    let records: Vec<EntityRecord> = serde_json::from_str(&raw)
        .with_context(|| format!("Failed to parse entity file: {}", path.display()))?;

    if records.is_empty() {
        anyhow::bail!("Entity list cannot be empty");
    }
    Ok(records)
}

/// Loads the relevance filter, from `vocabulary` if given or the built-in default.
pub fn load_filter(vocabulary: Option<&Path>) -> Result<RelevanceFilter> {
    match vocabulary {
        Some(path) => Ok(RelevanceFilter::new(RelevanceConfig::load(path)?)),
        None => Ok(RelevanceFilter::default()),
    }
}

/// Opens the result cache described by `config`.
pub fn open_cache(config: &Config) -> Result<ResultCache> {
    let cache = ResultCache::open(&config.cache_dir).with_context(|| {
        format!(
            "Failed to open cache directory: {}",
            config.cache_dir.display()
        )
    })?;
    Ok(cache.with_ttl(config.cache_ttl))
}

/// Builds a cached resolver over `knowledge_base` using `config`.
pub fn build_resolver(
    config: &Config,
    knowledge_base: Arc<dyn KnowledgeBase>,
) -> Result<HierarchyResolver> {
    Ok(HierarchyResolverBuilder::new()
        .knowledge_base(knowledge_base)
        .cache(open_cache(config)?)
        .language(config.language.clone())
        .build())
}

/// Builds the full tree-building pipeline against the configured endpoint.
pub fn build_pipeline(config: &Config, vocabulary: Option<&Path>) -> Result<ConceptTreeBuilder> {
    let client = SparqlClientBuilder::new()
        .endpoint(config.endpoint.clone())
        .user_agent(config.user_agent.clone())
        .timeout(config.query_timeout)
        .build()
        .context("Failed to create SPARQL client")?;

    let resolver = build_resolver(config, Arc::new(client))?;
    let filter = load_filter(vocabulary)?;
    Ok(ConceptTreeBuilder::new(resolver, Arc::new(filter)))
}
