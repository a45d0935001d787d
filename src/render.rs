//! Box-drawing outline of a concept tree for terminal output.

use std::collections::BTreeSet;

use crate::models::ConceptNode;

const BRANCH: &str = "├── ";
const LAST_BRANCH: &str = "└── ";
const PIPE: &str = "│   ";
const GAP: &str = "    ";
const SHARED_MARK: &str = " [*]";

/// Renders `tree` as an outline, one node per line.
///
/// Nodes whose name is in `shared` are suffixed with ` [*]`.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
/// use kgtree::{ConceptNode, render_tree};
///
/// let mut root = ConceptNode::new("醫學美容", 0);
/// root.add_child("雷射治療").add_child("除斑雷射");
/// root.add_child("臉部治療");
///
/// let shared = BTreeSet::from(["除斑雷射".to_string()]);
/// assert_eq!(
///     render_tree(&root, &shared),
///     "醫學美容\n├── 雷射治療\n│   └── 除斑雷射 [*]\n└── 臉部治療\n"
/// );
/// ```
pub fn render_tree(tree: &ConceptNode, shared: &BTreeSet<String>) -> String {
    let mut out = String::new();
    push_label(&mut out, tree, shared);
    render_children(&mut out, tree, "", shared);
    out
}

fn render_children(out: &mut String, node: &ConceptNode, prefix: &str, shared: &BTreeSet<String>) {
    let count = node.children().len();
    for (i, child) in node.children().iter().enumerate() {
        let is_last = i + 1 == count;
        out.push_str(prefix);
        out.push_str(if is_last { LAST_BRANCH } else { BRANCH });
        push_label(out, child, shared);

        let child_prefix = format!("{prefix}{}", if is_last { GAP } else { PIPE });
        render_children(out, child, &child_prefix, shared);
    }
}

fn push_label(out: &mut String, node: &ConceptNode, shared: &BTreeSet<String>) {
    out.push_str(node.name());
    if shared.contains(node.name()) {
        out.push_str(SHARED_MARK);
    }
    out.push('\n');
}
