use super::ConceptNode;

/// A flattened node with non-owning links to its relatives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedNode {
    pub name: String,
    pub level: usize,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
}

/// Read-only arena view of a concept tree for upward traversal.
///
/// Nodes are stored in pre-order, so index 0 is always the root and a parent
/// always precedes its children. Parent links are plain indices; the
/// `ConceptNode` tree remains the owner of the data.
///
/// # Examples
///
/// ```
/// use kgtree::{ConceptNode, TreeIndex};
///
/// let mut root = ConceptNode::new("醫學", 0);
/// root.add_child("醫療服務").add_child("醫學美容");
///
/// let index = TreeIndex::build(&root);
/// let leaf = index.find("醫學美容").unwrap();
/// assert_eq!(index.path_to_root(leaf), vec!["醫學", "醫療服務", "醫學美容"]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct TreeIndex {
    nodes: Vec<IndexedNode>,
}

impl TreeIndex {
    pub fn build(root: &ConceptNode) -> Self {
        let mut nodes: Vec<IndexedNode> = Vec::with_capacity(root.node_count());
        let mut stack: Vec<(&ConceptNode, Option<usize>)> = vec![(root, None)];

        while let Some((node, parent)) = stack.pop() {
            let index = nodes.len();
            nodes.push(IndexedNode {
                name: node.name().to_string(),
                level: node.level(),
                parent,
                children: Vec::new(),
            });
            if let Some(parent) = parent {
                nodes[parent].children.push(index);
            }
            // reversed so the first child is visited first
            for child in node.children().iter().rev() {
                stack.push((child, Some(index)));
            }
        }

        Self { nodes }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&IndexedNode> {
        self.nodes.get(index)
    }

    pub fn parent(&self, index: usize) -> Option<usize> {
        self.nodes.get(index).and_then(|node| node.parent)
    }

    /// First node in pre-order named `name`.
    pub fn find(&self, name: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.name == name)
    }

    /// Indices of every ancestor, nearest first.
    pub fn ancestors(&self, index: usize) -> Vec<usize> {
        let mut ancestors = Vec::new();
        let mut current = self.parent(index);
        while let Some(parent) = current {
            ancestors.push(parent);
            current = self.parent(parent);
        }
        ancestors
    }

    /// Names from the root down to `index`, inclusive.
    pub fn path_to_root(&self, index: usize) -> Vec<&str> {
        let Some(node) = self.nodes.get(index) else {
            return Vec::new();
        };

        let mut path: Vec<&str> = self
            .ancestors(index)
            .into_iter()
            .map(|i| self.nodes[i].name.as_str())
            .collect();
        path.reverse();
        path.push(node.name.as_str());
        path
    }
}
