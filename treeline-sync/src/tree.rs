//! Hierarchy tree construction.
//!
//! Builds an in-memory tree from a flat item collection linked by the
//! parent references in body metadata. Pure data transformation: the flat
//! collection is fetched once by the caller and no service calls happen
//! here.

use crate::error::{SyncError, SyncResult};
use std::collections::{HashMap, HashSet};
use tracing::warn;
use treeline_types::{ContentItem, ItemId};

/// One node of a content hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct HierarchyNode {
    pub item: ContentItem,
    /// Children in source-collection order.
    pub children: Vec<HierarchyNode>,
}

impl HierarchyNode {
    /// A node with no children.
    #[must_use]
    pub fn leaf(item: ContentItem) -> Self {
        Self {
            item,
            children: Vec::new(),
        }
    }

    /// Depth-first preorder iterator over the subtree, starting at this
    /// node.
    pub fn iter(&self) -> impl Iterator<Item = &HierarchyNode> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let node = stack.pop()?;
            for child in node.children.iter().rev() {
                stack.push(child);
            }
            Some(node)
        })
    }

    /// Number of nodes in the subtree, including this node.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.iter().count()
    }

    /// Finds a node by item id anywhere in the subtree.
    #[must_use]
    pub fn find(&self, id: &ItemId) -> Option<&HierarchyNode> {
        self.iter().find(|node| &node.item.id == id)
    }
}

/// Builds the hierarchy tree rooted at `root_id` from a flat collection.
///
/// Sibling order preserves the collection's order. Items referencing a
/// missing parent, and whole subtrees not reachable from the root, simply
/// do not appear; they are not errors. Self-parented items are dropped from
/// the child index. A reachable cycle (or a duplicated id) surfaces as
/// [`SyncError::HierarchyCycle`].
pub fn build_tree(root_id: &ItemId, items: &[ContentItem]) -> SyncResult<HierarchyNode> {
    let root_item = items
        .iter()
        .find(|item| &item.id == root_id)
        .ok_or_else(|| SyncError::RootNotFound(root_id.clone()))?;

    let mut children_of: HashMap<&ItemId, Vec<&ContentItem>> = HashMap::new();
    for item in items {
        let Some(parent_id) = item.parent_id() else {
            continue;
        };
        if parent_id == &item.id {
            warn!(id = %item.id, label = %item.label, "self-parented item excluded from tree");
            continue;
        }
        children_of.entry(parent_id).or_default().push(item);
    }

    // Preorder walk with an explicit stack and visited set, so malformed
    // data is detected instead of recursing forever.
    let mut visited: HashSet<&ItemId> = HashSet::new();
    let mut order: Vec<&ContentItem> = Vec::new();
    let mut stack: Vec<&ContentItem> = vec![root_item];
    while let Some(item) = stack.pop() {
        if !visited.insert(&item.id) {
            return Err(SyncError::HierarchyCycle(item.id.clone()));
        }
        order.push(item);
        if let Some(children) = children_of.get(&item.id) {
            for child in children.iter().rev() {
                stack.push(child);
            }
        }
    }

    // Reverse preorder sees every child before its parent, so subtrees
    // assemble bottom-up without recursion.
    let mut built: HashMap<&ItemId, HierarchyNode> = HashMap::new();
    for item in order.iter().rev() {
        let children = children_of
            .get(&item.id)
            .map(|children| {
                children
                    .iter()
                    .filter_map(|child| built.remove(&child.id))
                    .collect()
            })
            .unwrap_or_default();
        built.insert(
            &item.id,
            HierarchyNode {
                item: (*item).clone(),
                children,
            },
        );
    }

    built
        .remove(root_id)
        .ok_or_else(|| SyncError::RootNotFound(root_id.clone()))
}
