pub mod builder;
pub mod cache;
pub mod config;
pub mod hierarchy;
pub mod knowledge_base;
pub mod merge;
pub mod models;
pub mod relevance;
pub mod render;
pub mod store;
pub mod utils;

pub use builder::{ConceptTreeBuilder, assemble_tree};
pub use config::Config;
pub use merge::{MergeError, MergeOutcome, merge, merge_all, merge_optional};
pub use models::{
    ConceptNode, ConceptTrees, EntityCategory, EntityRecord, IndexedNode, TreeIndex,
    categorize_entities, clean_entity_name,
};
pub use relevance::{RelevanceConfig, RelevanceFilter, VocabularyError};
pub use render::render_tree;
pub use store::TreeStoreError;
