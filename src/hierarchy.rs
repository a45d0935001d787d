//! Hierarchy resolution against the knowledge base.
//!
//! This module turns an entity name into the set of labels reachable from it
//! through hierarchical relations, consulting the result cache first and
//! falling back from an exact label match to a substring match.
//!
//! # Examples
//!
//! ```no_run
//! use std::sync::Arc;
//! use kgtree::cache::ResultCache;
//! use kgtree::hierarchy::HierarchyResolverBuilder;
//! use kgtree::knowledge_base::{Direction, SparqlClientBuilder};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = SparqlClientBuilder::new().build()?;
//! let cache = ResultCache::open("data/cache")?;
//!
//! let resolver = HierarchyResolverBuilder::new()
//!     .knowledge_base(Arc::new(client))
//!     .cache(cache)
//!     .build();
//!
//! // Transport failures come back as an empty result, never as an error
//! let broader = resolver.labels("皮膚科", Direction::Broader)?;
//! for label in broader {
//!     println!("{label}");
//! }
//! # Ok(())
//! # }
//! ```

mod resolver;

pub use resolver::{HierarchyError, HierarchyResolver, HierarchyResolverBuilder, QueryOutcome};
