//! Concept tree construction.
//!
//! A tree's backbone is a strict chain from the most general broader concept
//! down to the entity, which then fans out into its narrower concepts.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use tracing::{info, warn};

use crate::hierarchy::{HierarchyError, HierarchyResolver};
use crate::knowledge_base::Direction;
use crate::models::{ConceptNode, ConceptTrees, EntityCategory, clean_entity_name};
use crate::relevance::RelevanceFilter;

/// Builds single-chain concept trees from knowledge-base lookups.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use kgtree::hierarchy::HierarchyResolverBuilder;
/// use kgtree::knowledge_base::SparqlClientBuilder;
/// use kgtree::{ConceptTreeBuilder, RelevanceFilter};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let resolver = HierarchyResolverBuilder::new()
///     .knowledge_base(Arc::new(SparqlClientBuilder::new().build()?))
///     .build();
/// let builder = ConceptTreeBuilder::new(resolver, Arc::new(RelevanceFilter::default()));
///
/// let tree = builder.build_tree("皮膚科診所")?;
/// println!("root: {} ({} nodes)", tree.name(), tree.node_count());
/// # Ok(())
/// # }
/// ```
pub struct ConceptTreeBuilder {
    resolver: HierarchyResolver,
    filter: Arc<RelevanceFilter>,
}

impl ConceptTreeBuilder {
    pub fn new(resolver: HierarchyResolver, filter: Arc<RelevanceFilter>) -> Self {
        Self { resolver, filter }
    }

    pub fn resolver(&self) -> &HierarchyResolver {
        &self.resolver
    }

    /// Returns `(broader, narrower)` concept labels for `entity`.
    ///
    /// Both lists keep only relevant labels that do not name the entity itself.
    /// Broader concepts are in reverse lexicographic order, a stand-in for
    /// "most general first" that does not reflect real ontological depth.
    /// Narrower concepts are in ascending order.
    pub fn concepts(&self, entity: &str) -> Result<(Vec<String>, Vec<String>), HierarchyError> {
        let broader = self.relevant_labels(entity, Direction::Broader)?;
        let narrower = self.relevant_labels(entity, Direction::Narrower)?;

        Ok((
            broader.into_iter().rev().collect(),
            narrower.into_iter().collect(),
        ))
    }

    /// Builds the concept tree for one entity.
    ///
    /// An entity with no hierarchy in the knowledge base yields a lone root.
    ///
    /// # Errors
    ///
    /// Returns `HierarchyError` only when the result cache cannot be accessed.
    pub fn build_tree(&self, entity: &str) -> Result<ConceptNode, HierarchyError> {
        let (broader, narrower) = self.concepts(entity)?;
        Ok(assemble_tree(entity, &broader, &narrower))
    }

    /// Builds trees for every entity of every category.
    ///
    /// Parenthetical qualifiers are stripped from entity names first. A
    /// failing entity is logged and skipped; entities without any hierarchy
    /// (a lone root) are left out, as are categories that end up empty.
    pub fn build_batch(&self, categorized: &BTreeMap<EntityCategory, Vec<String>>) -> ConceptTrees {
        let mut trees = ConceptTrees::new();

        for (category, entities) in categorized {
            if entities.is_empty() {
                continue;
            }
            info!(%category, entities = entities.len(), "building concept trees");

            for raw in entities {
                let entity = clean_entity_name(raw);
                if entity.is_empty() {
                    continue;
                }

                match self.build_tree(&entity) {
                    Ok(tree) if tree.is_leaf() => {
                        info!(%category, entity = %entity, "no hierarchy found, skipping");
                    }
                    Ok(tree) => {
                        info!(%category, entity = %entity, nodes = tree.node_count(), "built concept tree");
                        trees.insert(*category, entity, tree);
                    }
                    Err(e) => {
                        warn!(%category, entity = %entity, error = %e, "failed to build concept tree");
                    }
                }
            }
        }

        trees
    }

    fn relevant_labels(
        &self,
        entity: &str,
        direction: Direction,
    ) -> Result<BTreeSet<String>, HierarchyError> {
        Ok(self
            .resolver
            .labels(entity, direction)?
            .into_iter()
            .filter(|label| self.filter.is_relevant(label))
            .filter(|label| !self.filter.refers_to_same(label, entity))
            .collect())
    }
}

/// Assembles a concept tree from already-ordered concept lists.
///
/// `broader` must be ordered most general first; it becomes a chain of single
/// children ending in `entity`. `narrower` concepts hang directly below the
/// entity, sorted by name. Duplicate names are dropped.
///
/// # Examples
///
/// ```
/// use kgtree::assemble_tree;
///
/// let broader = vec!["醫學".to_string(), "醫療服務".to_string()];
/// let narrower = vec!["除毛雷射".to_string(), "除斑雷射".to_string()];
/// let tree = assemble_tree("皮膚科診所", &broader, &narrower);
///
/// assert_eq!(tree.name(), "醫學");
/// let entity = &tree.children()[0].children()[0];
/// assert_eq!(entity.name(), "皮膚科診所");
/// assert_eq!(entity.level(), 2);
/// assert_eq!(entity.children()[0].name(), "除斑雷射");
/// ```
pub fn assemble_tree(entity: &str, broader: &[String], narrower: &[String]) -> ConceptNode {
    let mut seen = BTreeSet::new();
    let chain: Vec<&str> = broader
        .iter()
        .map(String::as_str)
        .filter(|name| *name != entity && seen.insert(*name))
        .collect();

    let mut entity_node = ConceptNode::new(entity, chain.len());
    let leaves: BTreeSet<&str> = narrower
        .iter()
        .map(String::as_str)
        .filter(|name| *name != entity)
        .collect();
    for leaf in leaves {
        entity_node.add_child(leaf);
    }

    // Build the backbone bottom-up so each node owns the one below it
    chain
        .iter()
        .enumerate()
        .rev()
        .fold(entity_node, |child, (level, name)| {
            let mut parent = ConceptNode::new(*name, level);
            parent.attach(child);
            parent
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge_base::{KbError, KnowledgeBase, SparqlResults};

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    struct DirectionalKb {
        broader: Vec<&'static str>,
        narrower: Vec<&'static str>,
    }

    impl KnowledgeBase for DirectionalKb {
        fn select(&self, query: &str) -> Result<SparqlResults, KbError> {
            let labels = if query.contains(")* ?item .") {
                self.broader.clone()
            } else {
                self.narrower.clone()
            };
            Ok(SparqlResults::from_labels("itemLabel", "zh", labels))
        }
    }

    fn builder(broader: Vec<&'static str>, narrower: Vec<&'static str>) -> ConceptTreeBuilder {
        let resolver = HierarchyResolver::new(Arc::new(DirectionalKb { broader, narrower }));
        ConceptTreeBuilder::new(resolver, Arc::new(RelevanceFilter::default()))
    }

    #[test]
    fn assemble_chain_then_fan() {
        let tree = assemble_tree(
            "皮膚科診所",
            &strings(&["醫學", "醫療服務", "醫學美容"]),
            &strings(&["除斑雷射", "除毛雷射"]),
        );

        assert_eq!(tree.name(), "醫學");
        assert_eq!(tree.level(), 0);
        let services = &tree.children()[0];
        assert_eq!((services.name(), services.level()), ("醫療服務", 1));
        let aesthetics = &services.children()[0];
        assert_eq!((aesthetics.name(), aesthetics.level()), ("醫學美容", 2));
        let clinic = &aesthetics.children()[0];
        assert_eq!((clinic.name(), clinic.level()), ("皮膚科診所", 3));

        let leaves: Vec<(&str, usize)> = clinic
            .children()
            .iter()
            .map(|c| (c.name(), c.level()))
            .collect();
        assert_eq!(leaves, vec![("除斑雷射", 4), ("除毛雷射", 4)]);
    }

    #[test]
    fn assemble_without_broader_roots_at_entity() {
        let tree = assemble_tree("雷射", &[], &strings(&["除毛雷射", "除斑雷射"]));

        assert_eq!(tree.name(), "雷射");
        assert_eq!(tree.level(), 0);
        assert_eq!(tree.children().len(), 2);
        assert!(tree.children().iter().all(|c| c.level() == 1 && c.is_leaf()));
    }

    #[test]
    fn assemble_drops_duplicates_and_self_references() {
        let tree = assemble_tree(
            "診所",
            &strings(&["醫療", "醫療", "診所"]),
            &strings(&["牙科診所", "牙科診所", "診所"]),
        );

        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.depth(), 2);
    }

    #[test]
    fn concepts_filter_and_order() {
        let builder = builder(
            vec!["醫學美容", "醫療服務", "城市", "medicine", "醫療服務"],
            vec!["除毛雷射", "除斑雷射", "物理學"],
        );

        let (broader, narrower) = builder.concepts("皮膚科診所").unwrap();

        assert_eq!(broader, vec!["醫療服務", "醫學美容"]);
        assert_eq!(narrower, vec!["除斑雷射", "除毛雷射"]);
    }

    #[test]
    fn concepts_exclude_entity_and_its_synonyms() {
        // the zero-length path makes the entity its own broader concept
        let builder = builder(vec!["皮膚科", "皮膚醫學", "醫療服務"], vec![]);

        let (broader, _) = builder.concepts("皮膚科").unwrap();

        assert_eq!(broader, vec!["醫療服務"]);
    }

    #[test]
    fn unknown_entity_builds_lone_root() {
        let builder = builder(vec![], vec![]);

        let tree = builder.build_tree("不存在的診所").unwrap();

        assert_eq!(tree, ConceptNode::new("不存在的診所", 0));
    }

    #[test]
    fn build_batch_skips_childless_trees_and_cleans_names() {
        let builder = builder(vec!["醫療產品"], vec![]);
        let categorized = BTreeMap::from([
            (
                EntityCategory::Product,
                strings(&["藝群保養品(玻尿酸精華液領導品牌)"]),
            ),
            (EntityCategory::Other, Vec::new()),
        ]);

        let trees = builder.build_batch(&categorized);

        assert_eq!(trees.len(), 1);
        let tree = trees.get(EntityCategory::Product, "藝群保養品").unwrap();
        assert_eq!(tree.name(), "醫療產品");
        assert_eq!(tree.children()[0].name(), "藝群保養品");
    }
}
