use std::collections::BTreeSet;

use anyhow::Result;
use kgtree::store::{deserialize, read_tree, serialize, write_tree};
use kgtree::{ConceptNode, MergeError, TreeIndex, merge, merge_all, render_tree};
use tempfile::tempdir;

/// Tree organised by treatment method.
fn method_tree() -> Result<ConceptNode> {
    Ok(deserialize(
        "醫學美容\n    非侵入性治療\n        雷射治療\n            除斑雷射\n            除毛雷射\n",
    )?)
}

/// Tree organised by body area.
fn area_tree() -> Result<ConceptNode> {
    Ok(deserialize("醫學美容\n    臉部治療\n        除斑雷射\n        臉部拉提\n")?)
}

#[test]
fn test_merge_marks_nodes_shared_by_name() -> Result<()> {
    // Arrange
    let method = method_tree()?;
    let area = area_tree()?;

    // Act
    let outcome = merge(&method, &area)?;

    // Assert: both branches survive and sharing is by name, not position
    let branches: Vec<&str> = outcome.tree.children().iter().map(|c| c.name()).collect();
    assert_eq!(branches, vec!["非侵入性治療", "臉部治療"]);
    assert_eq!(
        outcome.shared,
        BTreeSet::from(["醫學美容".to_string(), "除斑雷射".to_string()])
    );

    let rendered = render_tree(&outcome.tree, &outcome.shared);
    assert_eq!(
        rendered,
        "醫學美容 [*]\n\
         ├── 非侵入性治療\n\
         │   └── 雷射治療\n\
         │       ├── 除斑雷射 [*]\n\
         │       └── 除毛雷射\n\
         └── 臉部治療\n    \
             ├── 除斑雷射 [*]\n    \
             └── 臉部拉提\n"
    );

    Ok(())
}

#[test]
fn test_merged_tree_keeps_level_invariant() -> Result<()> {
    let outcome = merge(&method_tree()?, &area_tree()?)?;

    let index = TreeIndex::build(&outcome.tree);
    for i in 0..index.len() {
        let node = index.get(i).unwrap();
        match node.parent {
            Some(parent) => assert_eq!(node.level, index.get(parent).unwrap().level + 1),
            None => assert_eq!(node.level, 0),
        }
    }

    let spot = index.find("臉部拉提").unwrap();
    assert_eq!(index.path_to_root(spot), vec!["醫學美容", "臉部治療", "臉部拉提"]);

    Ok(())
}

#[test]
fn test_self_merge_is_identity() -> Result<()> {
    let tree = method_tree()?;

    let outcome = merge(&tree, &tree)?;

    assert_eq!(outcome.tree, tree);
    assert_eq!(outcome.shared, tree.names());
    Ok(())
}

#[test]
fn test_unrelated_roots_are_rejected() -> Result<()> {
    let other = deserialize("整形外科\n    隆鼻\n")?;

    let error = merge(&method_tree()?, &other).unwrap_err();

    assert!(matches!(error, MergeError::RootMismatch { .. }));
    assert!(error.to_string().contains("整形外科"));
    Ok(())
}

#[test]
fn test_chained_merge_through_text_files() -> Result<()> {
    // Arrange: three trees persisted as text
    let dir = tempdir()?;
    let paths = [
        dir.path().join("method.txt"),
        dir.path().join("area.txt"),
        dir.path().join("injection.txt"),
    ];
    write_tree(&paths[0], &method_tree()?)?;
    write_tree(&paths[1], &area_tree()?)?;
    write_tree(
        &paths[2],
        &deserialize("醫學美容\n    注射治療\n        玻尿酸注射\n")?,
    )?;

    // Act
    let trees = paths
        .iter()
        .map(|p| read_tree(p))
        .collect::<Result<Vec<_>, _>>()?;
    let outcome = merge_all(&trees)?.expect("three trees were given");

    // Assert
    assert_eq!(outcome.tree.children().len(), 3);
    assert!(outcome.shared.contains("除斑雷射"));
    assert!(!outcome.shared.contains("玻尿酸注射"));

    let merged_path = dir.path().join("merged.txt");
    write_tree(&merged_path, &outcome.tree)?;
    assert_eq!(read_tree(&merged_path)?, outcome.tree);
    assert_eq!(serialize(&outcome.tree).lines().count(), outcome.tree.node_count());

    Ok(())
}
