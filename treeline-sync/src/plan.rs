//! Sync plan generation.
//!
//! Diffs a source hierarchy against its target-environment counterpart into
//! an ordered list of create and remove actions. Matching is by injected
//! signature, never by remote id, since ids differ across environments.

use crate::error::{SyncError, SyncResult};
use crate::matcher::{NameSchemaMatcher, NodeMatcher};
use crate::tree::HierarchyNode;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;
use treeline_types::{ContentItem, ItemId};

/// One planned action.
#[derive(Debug, Clone)]
pub enum SyncAction {
    /// Create `source_item` in the target environment.
    Create {
        source_item: ContentItem,
        /// Parent to attach under: an existing target-side id at the match
        /// boundary, or the *source* id of a parent that is itself being
        /// created (resolved through the executor's remap table). `None`
        /// attaches the item as a hierarchy root.
        target_parent_id: Option<ItemId>,
    },
    /// Reserved: in-place update of a matched node whose body diverged.
    /// The planner does not emit this today; matched nodes are left
    /// untouched.
    Update {
        source_item: ContentItem,
        target_item: ContentItem,
    },
    /// Retire the target-side item.
    Remove {
        /// Stale counterpart used for labelling in logs and reports.
        source_item: ContentItem,
        target_item: Option<ContentItem>,
    },
}

impl SyncAction {
    /// Label of the item the action is about.
    #[must_use]
    pub fn label(&self) -> &str {
        match self {
            Self::Create { source_item, .. }
            | Self::Update { source_item, .. }
            | Self::Remove { source_item, .. } => &source_item.label,
        }
    }

    /// Short action name for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Create { .. } => "create",
            Self::Update { .. } => "update",
            Self::Remove { .. } => "remove",
        }
    }
}

/// Ordered set of actions for one sync run. Transient: produced once,
/// consumed immediately by the executor, never persisted.
#[derive(Debug, Clone, Default)]
pub struct SyncPlan {
    /// Parent-before-child order.
    pub items_to_create: Vec<SyncAction>,
    /// Depth-descending order, so children leave before their parents.
    pub items_to_remove: Vec<SyncAction>,
}

impl SyncPlan {
    /// Whether the plan contains no actions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items_to_create.is_empty() && self.items_to_remove.is_empty()
    }

    /// Total number of planned actions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items_to_create.len() + self.items_to_remove.len()
    }
}

/// Generates sync plans by walking both trees top-down.
#[derive(Clone)]
pub struct SyncPlanner {
    matcher: Arc<dyn NodeMatcher>,
}

impl Default for SyncPlanner {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncPlanner {
    /// Planner with the default name+schema matcher.
    #[must_use]
    pub fn new() -> Self {
        Self::with_matcher(Arc::new(NameSchemaMatcher))
    }

    /// Planner with a custom identity function.
    #[must_use]
    pub fn with_matcher(matcher: Arc<dyn NodeMatcher>) -> Self {
        Self { matcher }
    }

    /// Diffs `source` against `target`.
    ///
    /// The two roots are assumed to correspond (the caller selected them);
    /// an absent target plans the whole source tree as creates, with the
    /// root attached fresh.
    pub fn generate_sync_plan(
        &self,
        source: &HierarchyNode,
        target: Option<&HierarchyNode>,
    ) -> SyncResult<SyncPlan> {
        let mut creates = Vec::new();
        let mut removals: Vec<(usize, SyncAction)> = Vec::new();

        match target {
            Some(target) => {
                self.compare_nodes(source, target, 0, &mut creates, &mut removals)?;
            }
            None => {
                creates.push(SyncAction::Create {
                    source_item: source.item.clone(),
                    target_parent_id: None,
                });
                Self::plan_descendant_creates(source, &mut creates);
            }
        }

        // Children leave the target before their parents. Stable sort keeps
        // sibling order within a depth.
        removals.sort_by_key(|(depth, _)| std::cmp::Reverse(*depth));
        let plan = SyncPlan {
            items_to_create: creates,
            items_to_remove: removals.into_iter().map(|(_, action)| action).collect(),
        };
        debug!(
            creates = plan.items_to_create.len(),
            removals = plan.items_to_remove.len(),
            "generated sync plan"
        );
        Ok(plan)
    }

    /// Walks one matched node pair. `depth` is the level of the children
    /// being compared, recorded to order removals.
    fn compare_nodes(
        &self,
        source: &HierarchyNode,
        target: &HierarchyNode,
        depth: usize,
        creates: &mut Vec<SyncAction>,
        removals: &mut Vec<(usize, SyncAction)>,
    ) -> SyncResult<()> {
        self.validate_sibling_signatures(source)?;

        let target_children: HashMap<String, &HierarchyNode> = target
            .children
            .iter()
            .map(|child| (self.matcher.signature(&child.item), child))
            .collect();
        let source_signatures: HashSet<String> = source
            .children
            .iter()
            .map(|child| self.matcher.signature(&child.item))
            .collect();

        for source_child in &source.children {
            let signature = self.matcher.signature(&source_child.item);
            match target_children.get(&signature) {
                Some(target_child) => {
                    self.compare_nodes(source_child, target_child, depth + 1, creates, removals)?;
                }
                None => {
                    // New subtree: the top attaches under the existing
                    // target node, descendants under their source parents.
                    creates.push(SyncAction::Create {
                        source_item: source_child.item.clone(),
                        target_parent_id: Some(target.item.id.clone()),
                    });
                    Self::plan_descendant_creates(source_child, creates);
                }
            }
        }

        for target_child in &target.children {
            let signature = self.matcher.signature(&target_child.item);
            if !source_signatures.contains(&signature) {
                removals.push((
                    depth,
                    SyncAction::Remove {
                        source_item: target_child.item.clone(),
                        target_item: Some(target_child.item.clone()),
                    },
                ));
                Self::plan_descendant_removals(target_child, depth + 1, removals);
            }
        }

        Ok(())
    }

    fn plan_descendant_creates(node: &HierarchyNode, creates: &mut Vec<SyncAction>) {
        for child in &node.children {
            creates.push(SyncAction::Create {
                source_item: child.item.clone(),
                target_parent_id: Some(node.item.id.clone()),
            });
            Self::plan_descendant_creates(child, creates);
        }
    }

    fn plan_descendant_removals(
        node: &HierarchyNode,
        depth: usize,
        removals: &mut Vec<(usize, SyncAction)>,
    ) {
        for child in &node.children {
            removals.push((
                depth,
                SyncAction::Remove {
                    source_item: child.item.clone(),
                    target_item: Some(child.item.clone()),
                },
            ));
            Self::plan_descendant_removals(child, depth + 1, removals);
        }
    }

    /// Duplicate signatures among one node's children make the diff
    /// ambiguous; refuse to plan rather than guess.
    fn validate_sibling_signatures(&self, node: &HierarchyNode) -> SyncResult<()> {
        let mut seen: HashSet<String> = HashSet::new();
        for child in &node.children {
            let signature = self.matcher.signature(&child.item);
            if !seen.insert(signature.clone()) {
                return Err(SyncError::DuplicateSignature {
                    parent_id: node.item.id.clone(),
                    signature,
                });
            }
        }
        Ok(())
    }
}
