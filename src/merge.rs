//! Root-aligned merging of concept trees.
//!
//! Two trees describing the same root concept are combined into one, with
//! same-named children merged pairwise and the rest carried over. The names
//! the inputs have in common are reported alongside the merged tree so that
//! renderers can mark them.
//!
//! When a name has already been merged elsewhere in the tree, the first
//! tree's subtree is kept at the later position and the second tree's
//! subtree there is dropped. This is not a deep structural union.

use std::collections::BTreeSet;

use thiserror::Error;
use tracing::debug;

use crate::models::ConceptNode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MergeError {
    #[error("cannot merge trees with different roots: '{left}' and '{right}'")]
    RootMismatch { left: String, right: String },
}

/// A merged tree and the node names found in more than one input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub tree: ConceptNode,
    pub shared: BTreeSet<String>,
}

impl MergeOutcome {
    fn unshared(tree: ConceptNode) -> Self {
        Self {
            tree,
            shared: BTreeSet::new(),
        }
    }
}

/// Merges `right` into `left`.
///
/// The merged tree keeps the root level of `left`; every level below is
/// re-derived from it. The shared set holds every name occurring anywhere in
/// both trees, regardless of position.
///
/// # Errors
///
/// Returns `MergeError::RootMismatch` if the roots have different names.
///
/// # Examples
///
/// ```
/// use kgtree::{ConceptNode, merge};
///
/// let mut left = ConceptNode::new("醫學美容", 0);
/// left.add_child("雷射治療");
/// let mut right = ConceptNode::new("醫學美容", 0);
/// right.add_child("臉部治療");
///
/// let merged = merge(&left, &right).unwrap();
/// assert_eq!(merged.tree.children().len(), 2);
/// assert!(merged.shared.contains("醫學美容"));
/// ```
pub fn merge(left: &ConceptNode, right: &ConceptNode) -> Result<MergeOutcome, MergeError> {
    if left.name() != right.name() {
        return Err(MergeError::RootMismatch {
            left: left.name().to_string(),
            right: right.name().to_string(),
        });
    }

    let shared: BTreeSet<String> = left.names().intersection(&right.names()).cloned().collect();
    let mut processed = BTreeSet::new();
    let tree = merge_nodes(left, Some(right), &mut processed).with_level(left.level());

    debug!(
        root = tree.name(),
        nodes = tree.node_count(),
        shared = shared.len(),
        "merged concept trees"
    );

    Ok(MergeOutcome { tree, shared })
}

/// Like [`merge`], but either side may be absent.
///
/// With one side absent the other is returned unchanged and nothing is
/// shared. With both absent there is nothing to return.
pub fn merge_optional(
    left: Option<&ConceptNode>,
    right: Option<&ConceptNode>,
) -> Result<Option<MergeOutcome>, MergeError> {
    match (left, right) {
        (Some(left), Some(right)) => merge(left, right).map(Some),
        (Some(tree), None) | (None, Some(tree)) => Ok(Some(MergeOutcome::unshared(tree.clone()))),
        (None, None) => Ok(None),
    }
}

/// Merges any number of trees pairwise, left to right.
///
/// The shared set is the union of the shared sets of each step. Chaining is
/// order-dependent beyond leaf order because of the first-tree preference.
///
/// # Errors
///
/// Fails on the first step whose roots differ.
pub fn merge_all<'a, I>(trees: I) -> Result<Option<MergeOutcome>, MergeError>
where
    I: IntoIterator<Item = &'a ConceptNode>,
{
    let mut trees = trees.into_iter();
    let Some(first) = trees.next() else {
        return Ok(None);
    };

    let mut outcome = MergeOutcome::unshared(first.clone());
    for tree in trees {
        let step = merge(&outcome.tree, tree)?;
        outcome.shared.extend(step.shared);
        outcome.tree = step.tree;
    }

    Ok(Some(outcome))
}

fn merge_nodes(
    left: &ConceptNode,
    right: Option<&ConceptNode>,
    processed: &mut BTreeSet<String>,
) -> ConceptNode {
    let Some(right) = right else {
        return left.clone();
    };
    if !processed.insert(left.name().to_string()) {
        return left.clone();
    }

    let mut merged = ConceptNode::new(left.name(), left.level());
    let mut taken = BTreeSet::new();

    for child in left.children() {
        if taken.insert(child.name()) {
            merged.attach(merge_nodes(child, right.child(child.name()), processed));
        }
    }
    // second-tree-only children merge with themselves
    for child in right.children() {
        if taken.insert(child.name()) {
            merged.attach(merge_nodes(child, Some(child), processed));
        }
    }

    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn laser_tree() -> ConceptNode {
        let mut root = ConceptNode::new("醫學美容", 0);
        let laser = root.add_child("非侵入性治療").add_child("雷射治療");
        laser.add_child("除斑雷射");
        laser.add_child("除毛雷射");
        root
    }

    fn facial_tree() -> ConceptNode {
        let mut root = ConceptNode::new("醫學美容", 0);
        let facial = root.add_child("臉部治療");
        facial.add_child("除斑雷射");
        facial.add_child("臉部拉提");
        root
    }

    fn child_names(node: &ConceptNode) -> Vec<&str> {
        node.children().iter().map(ConceptNode::name).collect()
    }

    #[test]
    fn merge_with_itself_is_identity() {
        let tree = laser_tree();

        let outcome = merge(&tree, &tree.clone()).unwrap();

        assert_eq!(outcome.tree, tree);
        assert_eq!(outcome.shared, tree.names());
    }

    #[test]
    fn different_roots_fail() {
        let error = merge(&ConceptNode::new("A", 0), &ConceptNode::new("B", 0)).unwrap_err();

        assert_eq!(
            error,
            MergeError::RootMismatch {
                left: "A".to_string(),
                right: "B".to_string()
            }
        );
    }

    #[test]
    fn branches_from_both_trees_are_kept() {
        let outcome = merge(&laser_tree(), &facial_tree()).unwrap();

        assert_eq!(child_names(&outcome.tree), vec!["非侵入性治療", "臉部治療"]);
        assert_eq!(
            outcome.shared,
            BTreeSet::from(["醫學美容".to_string(), "除斑雷射".to_string()])
        );

        let facial = outcome.tree.child("臉部治療").unwrap();
        assert_eq!(child_names(facial), vec!["除斑雷射", "臉部拉提"]);
        assert!(facial.children().iter().all(|c| c.level() == 2));
        assert_eq!(outcome.tree.node_count(), 8);
    }

    #[test]
    fn matched_children_are_merged_recursively() {
        let mut left = ConceptNode::new("醫學", 0);
        left.add_child("醫療服務").add_child("皮膚科");
        let mut right = ConceptNode::new("醫學", 0);
        right.add_child("醫療服務").add_child("牙科");

        let outcome = merge(&left, &right).unwrap();

        let services = outcome.tree.child("醫療服務").unwrap();
        assert_eq!(child_names(services), vec!["皮膚科", "牙科"]);
        assert_eq!(outcome.tree.children().len(), 1);
    }

    #[test]
    fn repeated_name_keeps_first_trees_subtree() {
        let mut left = ConceptNode::new("R", 0);
        left.add_child("P").add_child("Q");
        left.add_child("S").add_child("P");
        let mut right = ConceptNode::new("R", 0);
        right.add_child("P").add_child("T");
        right.add_child("S").add_child("P").add_child("U");

        let outcome = merge(&left, &right).unwrap();

        assert_eq!(child_names(outcome.tree.child("P").unwrap()), vec!["Q", "T"]);
        let nested = outcome.tree.child("S").unwrap().child("P").unwrap();
        assert!(nested.is_leaf(), "second tree's subtree is dropped");
    }

    #[test]
    fn levels_follow_first_root() {
        let left = ConceptNode::new("醫學", 0);
        let mut right = ConceptNode::new("醫學", 5);
        right.add_child("醫療服務");

        let outcome = merge(&left, &right).unwrap();

        assert_eq!(outcome.tree.level(), 0);
        assert_eq!(outcome.tree.children()[0].level(), 1);
    }

    #[test]
    fn absent_side_returns_the_other() {
        let tree = laser_tree();

        let outcome = merge_optional(None, Some(&tree)).unwrap().unwrap();
        assert_eq!(outcome.tree, tree);
        assert!(outcome.shared.is_empty());

        let outcome = merge_optional(Some(&tree), None).unwrap().unwrap();
        assert_eq!(outcome.tree, tree);

        assert!(merge_optional(None, None).unwrap().is_none());
    }

    #[test]
    fn merge_all_chains_left_to_right() {
        let mut third = ConceptNode::new("醫學美容", 0);
        third.add_child("微整形");
        let trees = [laser_tree(), facial_tree(), third];

        let outcome = merge_all(&trees).unwrap().unwrap();

        assert_eq!(
            child_names(&outcome.tree),
            vec!["非侵入性治療", "臉部治療", "微整形"]
        );
        assert!(outcome.shared.contains("除斑雷射"));
        assert!(outcome.shared.contains("醫學美容"));
        assert!(!outcome.shared.contains("微整形"));
    }

    #[test]
    fn merge_all_of_nothing_or_one() {
        assert!(merge_all(&Vec::<ConceptNode>::new()).unwrap().is_none());

        let single = merge_all(&[laser_tree()]).unwrap().unwrap();
        assert_eq!(single.tree, laser_tree());
        assert!(single.shared.is_empty());
    }

    #[test]
    fn merge_all_stops_at_mismatched_root() {
        let trees = [laser_tree(), ConceptNode::new("其他", 0)];

        assert!(matches!(
            merge_all(&trees),
            Err(MergeError::RootMismatch { .. })
        ));
    }
}
