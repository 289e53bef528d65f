use pretty_assertions::assert_eq;
use treeline_sync::{HierarchyNode, SyncError, build_tree};
use treeline_types::{Body, ContentItem, Hierarchy, ItemId};

fn make_root(id: &str, label: &str) -> ContentItem {
    let mut item = ContentItem::new(ItemId::new(id), label, Body::default());
    item.body.meta.hierarchy = Some(Hierarchy::root());
    item
}

fn make_child(id: &str, label: &str, parent: &str) -> ContentItem {
    let mut item = ContentItem::new(ItemId::new(id), label, Body::default());
    item.body.meta.hierarchy = Some(Hierarchy::child_of(ItemId::new(parent)));
    item
}

fn labels(node: &HierarchyNode) -> Vec<&str> {
    node.iter().map(|node| node.item.label.as_str()).collect()
}

// ── Construction ─────────────────────────────────────────────────

#[test]
fn single_root() {
    let items = vec![make_root("root", "Root")];
    let tree = build_tree(&ItemId::new("root"), &items).unwrap();

    assert_eq!(tree.item.label, "Root");
    assert!(tree.children.is_empty());
    assert_eq!(tree.node_count(), 1);
}

#[test]
fn children_keep_collection_order() {
    let items = vec![
        make_child("c2", "Second", "root"),
        make_root("root", "Root"),
        make_child("c3", "Third", "root"),
        make_child("c1", "First", "root"),
    ];
    let tree = build_tree(&ItemId::new("root"), &items).unwrap();

    let children: Vec<&str> = tree.children.iter().map(|c| c.item.label.as_str()).collect();
    assert_eq!(children, vec!["Second", "Third", "First"]);
}

#[test]
fn nested_subtrees_assemble() {
    let items = vec![
        make_root("root", "Root"),
        make_child("a", "A", "root"),
        make_child("b", "B", "root"),
        make_child("a1", "A1", "a"),
        make_child("a2", "A2", "a"),
        make_child("a1x", "A1X", "a1"),
    ];
    let tree = build_tree(&ItemId::new("root"), &items).unwrap();

    assert_eq!(tree.node_count(), 6);
    let a = tree.find(&ItemId::new("a")).unwrap();
    assert_eq!(a.children.len(), 2);
    let a1 = tree.find(&ItemId::new("a1")).unwrap();
    assert_eq!(a1.children.len(), 1);
}

#[test]
fn missing_root_is_an_error() {
    let items = vec![make_root("root", "Root")];
    let err = build_tree(&ItemId::new("other"), &items).unwrap_err();
    assert!(matches!(err, SyncError::RootNotFound(id) if id == ItemId::new("other")));
}

#[test]
fn orphans_are_excluded() {
    let items = vec![
        make_root("root", "Root"),
        make_child("a", "A", "root"),
        make_child("lost", "Lost", "missing-parent"),
    ];
    let tree = build_tree(&ItemId::new("root"), &items).unwrap();

    assert_eq!(tree.node_count(), 2);
    assert!(tree.find(&ItemId::new("lost")).is_none());
}

#[test]
fn unreachable_subtrees_are_excluded() {
    // x and y form a valid subtree, but nothing links them to the root.
    let items = vec![
        make_root("root", "Root"),
        make_root("x", "X"),
        make_child("y", "Y", "x"),
    ];
    let tree = build_tree(&ItemId::new("root"), &items).unwrap();
    assert_eq!(tree.node_count(), 1);
}

#[test]
fn self_parented_items_are_dropped() {
    let items = vec![
        make_root("root", "Root"),
        make_child("weird", "Weird", "weird"),
    ];
    let tree = build_tree(&ItemId::new("root"), &items).unwrap();
    assert_eq!(tree.node_count(), 1);
}

#[test]
fn reachable_cycle_is_detected() {
    // root and a point at each other.
    let items = vec![
        make_child("root", "Root", "a"),
        make_child("a", "A", "root"),
    ];
    let err = build_tree(&ItemId::new("root"), &items).unwrap_err();
    assert!(matches!(err, SyncError::HierarchyCycle(_)));
}

#[test]
fn duplicated_id_is_detected() {
    // The same id claimed as a child by two different parents.
    let items = vec![
        make_root("root", "Root"),
        make_child("p1", "P1", "root"),
        make_child("p2", "P2", "root"),
        make_child("dup", "Dup under P1", "p1"),
        make_child("dup", "Dup under P2", "p2"),
    ];
    let err = build_tree(&ItemId::new("root"), &items).unwrap_err();
    assert!(matches!(err, SyncError::HierarchyCycle(id) if id == ItemId::new("dup")));
}

// ── Traversal ────────────────────────────────────────────────────

#[test]
fn iteration_is_preorder() {
    let items = vec![
        make_root("root", "Root"),
        make_child("a", "A", "root"),
        make_child("b", "B", "root"),
        make_child("a1", "A1", "a"),
        make_child("a2", "A2", "a"),
    ];
    let tree = build_tree(&ItemId::new("root"), &items).unwrap();
    assert_eq!(labels(&tree), vec!["Root", "A", "A1", "A2", "B"]);
}

#[test]
fn find_locates_nested_nodes() {
    let items = vec![
        make_root("root", "Root"),
        make_child("a", "A", "root"),
        make_child("a1", "A1", "a"),
    ];
    let tree = build_tree(&ItemId::new("root"), &items).unwrap();

    assert_eq!(tree.find(&ItemId::new("a1")).unwrap().item.label, "A1");
    assert!(tree.find(&ItemId::new("zzz")).is_none());
}

#[test]
fn leaf_has_no_children() {
    let node = HierarchyNode::leaf(make_root("root", "Root"));
    assert!(node.children.is_empty());
    assert_eq!(node.node_count(), 1);
}
