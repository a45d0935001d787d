//! Persistence for concept trees.
//!
//! Single trees are stored as indented text, one name per line with four
//! spaces per level. Batches are stored as nested JSON keyed by category
//! then entity.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::models::{ConceptNode, ConceptTrees};

/// Spaces per tree level in the text format.
pub const INDENT_WIDTH: usize = 4;

/// Errors from reading or writing stored trees.
///
/// Line numbers are 1-based.
#[derive(Debug, Error)]
pub enum TreeStoreError {
    #[error("Tree text contains no nodes")]
    Empty,

    #[error("Line {line}: the first node must not be indented")]
    IndentedRoot { line: usize },

    #[error("Line {line}: indentation of {indent} is not a multiple of 4")]
    MisalignedIndent { line: usize, indent: usize },

    #[error("Line {line}: expected level {expected} or less, found level {found}")]
    LevelSkip {
        line: usize,
        expected: usize,
        found: usize,
    },

    #[error("Line {line}: second root '{name}' found; a tree has exactly one root")]
    MultipleRoots { line: usize, name: String },

    #[error("Tree batch JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Tree store I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TreeStoreError {
    fn io(path: &Path, source: io::Error) -> Self {
        TreeStoreError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Writes `tree` as indented text.
///
/// Indentation is relative to the root, so the root is never indented.
///
/// # Examples
///
/// ```
/// use kgtree::ConceptNode;
/// use kgtree::store::serialize;
///
/// let mut root = ConceptNode::new("醫學", 0);
/// root.add_child("醫療服務").add_child("醫學美容");
///
/// assert_eq!(serialize(&root), "醫學\n    醫療服務\n        醫學美容\n");
/// ```
pub fn serialize(tree: &ConceptNode) -> String {
    let mut out = String::new();
    let mut stack = vec![(tree, 0usize)];

    while let Some((node, depth)) = stack.pop() {
        out.push_str(&" ".repeat(depth * INDENT_WIDTH));
        out.push_str(node.name());
        out.push('\n');
        stack.extend(node.children().iter().rev().map(|child| (child, depth + 1)));
    }

    out
}

/// Parses indented text back into a tree rooted at level 0.
///
/// Whitespace-only lines are ignored. Trailing whitespace belongs to the
/// node name. A line's parent is the nearest preceding line at a smaller level.
///
/// # Errors
///
/// Fails on the first line that cannot be placed: a misaligned or indented
/// root, an indentation jump of more than one level, or a second root.
/// Text without any node is `TreeStoreError::Empty`.
pub fn deserialize(text: &str) -> Result<ConceptNode, TreeStoreError> {
    let mut stack: Vec<ConceptNode> = Vec::new();

    for (index, raw) in text.lines().enumerate() {
        let line = index + 1;
        let raw = raw.strip_suffix('\r').unwrap_or(raw);
        if raw.trim().is_empty() {
            continue;
        }
        let name = raw.trim_start();

        let indent = raw.chars().count() - name.chars().count();
        if indent % INDENT_WIDTH != 0 {
            return Err(TreeStoreError::MisalignedIndent { line, indent });
        }
        let level = indent / INDENT_WIDTH;

        if stack.is_empty() {
            if level != 0 {
                return Err(TreeStoreError::IndentedRoot { line });
            }
            stack.push(ConceptNode::new(name, 0));
            continue;
        }
        if level == 0 {
            return Err(TreeStoreError::MultipleRoots {
                line,
                name: name.to_string(),
            });
        }

        // the root sits at level 0 and is never folded here
        while stack.len() > 1 && stack.last().is_some_and(|top| top.level() >= level) {
            fold_top(&mut stack);
        }

        let expected = stack.last().map_or(0, ConceptNode::level) + 1;
        if level != expected {
            return Err(TreeStoreError::LevelSkip {
                line,
                expected,
                found: level,
            });
        }
        stack.push(ConceptNode::new(name, level));
    }

    while stack.len() > 1 {
        fold_top(&mut stack);
    }
    stack.pop().ok_or(TreeStoreError::Empty)
}

/// Moves the top of the stack into the children of the node beneath it.
fn fold_top(stack: &mut Vec<ConceptNode>) {
    if let Some(child) = stack.pop() {
        match stack.last_mut() {
            Some(parent) => parent.attach(child),
            None => stack.push(child),
        }
    }
}

/// Reads a text tree from `path`.
pub fn read_tree(path: &Path) -> Result<ConceptNode, TreeStoreError> {
    let text = fs::read_to_string(path).map_err(|e| TreeStoreError::io(path, e))?;
    deserialize(&text)
}

/// Writes `tree` as text to `path`, creating parent directories.
pub fn write_tree(path: &Path, tree: &ConceptNode) -> Result<(), TreeStoreError> {
    ensure_parent(path)?;
    fs::write(path, serialize(tree)).map_err(|e| TreeStoreError::io(path, e))
}

/// Writes a batch as pretty-printed JSON, creating parent directories.
pub fn save_batch(path: &Path, trees: &ConceptTrees) -> Result<(), TreeStoreError> {
    ensure_parent(path)?;
    let json = serde_json::to_string_pretty(trees)?;
    fs::write(path, json).map_err(|e| TreeStoreError::io(path, e))
}

/// Loads a batch; a missing file is an empty batch.
pub fn load_batch(path: &Path) -> Result<ConceptTrees, TreeStoreError> {
    match fs::read_to_string(path) {
        Ok(raw) => Ok(serde_json::from_str(&raw)?),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(ConceptTrees::new()),
        Err(e) => Err(TreeStoreError::io(path, e)),
    }
}

fn ensure_parent(path: &Path) -> Result<(), TreeStoreError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => {
            fs::create_dir_all(parent).map_err(|e| TreeStoreError::io(parent, e))
        }
        _ => Ok(()),
    }
}
