use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::{ConceptNode, EntityCategory};

/// Concept trees from one batch run, keyed by category then entity name.
///
/// Serialises as `{category: {entity: {name, level, children}}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConceptTrees {
    categories: BTreeMap<EntityCategory, BTreeMap<String, ConceptNode>>,
}

impl ConceptTrees {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores the tree for `entity`, replacing any earlier one.
    pub fn insert(&mut self, category: EntityCategory, entity: impl Into<String>, tree: ConceptNode) {
        self.categories
            .entry(category)
            .or_default()
            .insert(entity.into(), tree);
    }

    pub fn get(&self, category: EntityCategory, entity: &str) -> Option<&ConceptNode> {
        self.categories.get(&category)?.get(entity)
    }

    /// Trees in `category`, ordered by entity name.
    pub fn category(&self, category: EntityCategory) -> Option<&BTreeMap<String, ConceptNode>> {
        self.categories.get(&category)
    }

    /// Iterates `(category, entity, tree)` in category then entity order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityCategory, &str, &ConceptNode)> {
        self.categories.iter().flat_map(|(category, trees)| {
            trees
                .iter()
                .map(move |(entity, tree)| (*category, entity.as_str(), tree))
        })
    }

    /// Total number of trees across all categories.
    pub fn len(&self) -> usize {
        self.categories.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
