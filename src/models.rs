mod category;
mod concept_node;
mod concept_trees;
mod entity;
mod tree_index;

pub use category::EntityCategory;
pub use concept_node::ConceptNode;
pub use concept_trees::ConceptTrees;
pub use entity::{EntityRecord, categorize_entities, clean_entity_name};
pub use tree_index::{IndexedNode, TreeIndex};
