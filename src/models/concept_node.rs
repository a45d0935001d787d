use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A node in a concept tree.
///
/// Each node exclusively owns its children; a child's `level` is always its
/// parent's level plus one. Serialises as `{name, level, children}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConceptNode {
    name: String,
    level: usize,
    #[serde(default)]
    children: Vec<ConceptNode>,
}

impl ConceptNode {
    /// Creates a childless node.
    ///
    /// # Examples
    ///
    /// ```
    /// use kgtree::ConceptNode;
    ///
    /// let mut root = ConceptNode::new("醫學", 0);
    /// root.add_child("醫療服務").add_child("醫學美容");
    ///
    /// assert_eq!(root.node_count(), 3);
    /// assert_eq!(root.children()[0].children()[0].level(), 2);
    /// ```
    pub fn new(name: impl Into<String>, level: usize) -> Self {
        Self {
            name: name.into(),
            level,
            children: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn level(&self) -> usize {
        self.level
    }

    pub fn children(&self) -> &[ConceptNode] {
        &self.children
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Returns the direct child called `name`, if any.
    pub fn child(&self, name: &str) -> Option<&ConceptNode> {
        self.children.iter().find(|child| child.name == name)
    }

    /// Appends a new child one level below this node and returns it.
    pub fn add_child(&mut self, name: impl Into<String>) -> &mut ConceptNode {
        self.children.push(ConceptNode::new(name, self.level + 1));
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    /// Appends an existing subtree, shifting its levels to sit under this node.
    pub fn attach(&mut self, child: ConceptNode) {
        self.children.push(child.with_level(self.level + 1));
    }

    /// Returns this subtree re-rooted at `level`, with descendants shifted to match.
    #[must_use]
    pub fn with_level(mut self, level: usize) -> Self {
        self.relevel(level);
        self
    }

    fn relevel(&mut self, level: usize) {
        self.level = level;
        for child in &mut self.children {
            child.relevel(level + 1);
        }
    }

    /// Number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(ConceptNode::node_count).sum::<usize>()
    }

    /// Number of edges on the longest path down from this node.
    pub fn depth(&self) -> usize {
        self.children
            .iter()
            .map(|child| child.depth() + 1)
            .max()
            .unwrap_or(0)
    }

    /// Every distinct node name in this subtree.
    pub fn names(&self) -> BTreeSet<String> {
        let mut names = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            names.insert(node.name.clone());
            stack.extend(node.children.iter());
        }
        names
    }
}
