//! Hierarchy sync executor.
//!
//! Drives a generated plan against the target service in strictly
//! sequential phases: creation (parents before children, with source ids
//! remapped to freshly minted target ids), removal (each leftover walked
//! through the two-phase retirement pipeline), then optional publishing of
//! everything created. Per-item failures land in the report and never
//! abort the run; only structural plan errors surface as `Err`.

use crate::error::SyncResult;
use crate::locale::{LocaleStrategy, assigned_locale, transform_delivery_key};
use crate::matcher::NodeMatcher;
use crate::plan::{SyncAction, SyncPlan, SyncPlanner};
use crate::removal::{RemovalOptions, archive_prepared_item, prepare_item_for_removal};
use crate::report::{SyncPhase, SyncReport};
use crate::tree::HierarchyNode;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};
use treeline_client::{ContentService, CreateItemRequest};
use treeline_types::{ContentItem, Hierarchy, ItemId, RepositoryId};

/// Options controlling one sync run.
#[derive(Debug, Clone)]
pub struct SyncOptions {
    /// Repository new items are created in.
    pub target_repository_id: RepositoryId,
    /// Reserved. Matched items are currently left untouched; enabling this
    /// flag only logs that updates were requested.
    pub update_content: bool,
    /// How delivery-key locale prefixes cross environments.
    pub locale_strategy: LocaleStrategy,
    /// Publish every created item once both phases finish.
    pub publish_after_sync: bool,
    /// Plan and log without touching the target.
    pub dry_run: bool,
    /// Retirement pipeline settings for the removal phase.
    pub removal: RemovalOptions,
}

impl SyncOptions {
    /// Options with conservative defaults: keep locale prefixes, no
    /// publishing, real run.
    #[must_use]
    pub fn new(target_repository_id: RepositoryId) -> Self {
        Self {
            target_repository_id,
            update_content: false,
            locale_strategy: LocaleStrategy::Keep,
            publish_after_sync: false,
            dry_run: false,
            removal: RemovalOptions::default(),
        }
    }
}

/// Reconciles content hierarchies between two service environments.
#[derive(Clone)]
pub struct HierarchySync {
    source: Arc<dyn ContentService>,
    target: Arc<dyn ContentService>,
    planner: SyncPlanner,
}

impl HierarchySync {
    /// Creates an engine with the default name-and-schema matcher.
    #[must_use]
    pub fn new(source: Arc<dyn ContentService>, target: Arc<dyn ContentService>) -> Self {
        Self {
            source,
            target,
            planner: SyncPlanner::new(),
        }
    }

    /// Creates an engine with a custom node matcher.
    #[must_use]
    pub fn with_matcher(
        source: Arc<dyn ContentService>,
        target: Arc<dyn ContentService>,
        matcher: Arc<dyn NodeMatcher>,
    ) -> Self {
        Self {
            source,
            target,
            planner: SyncPlanner::with_matcher(matcher),
        }
    }

    /// The environment hierarchies are read from.
    #[must_use]
    pub fn source(&self) -> &Arc<dyn ContentService> {
        &self.source
    }

    /// The environment hierarchies are written to.
    #[must_use]
    pub fn target(&self) -> &Arc<dyn ContentService> {
        &self.target
    }

    /// Diffs `source_tree` against `target_tree` and applies the resulting
    /// plan to the target environment.
    ///
    /// Passing `None` for the target recreates the whole source hierarchy.
    /// Structural problems in the input trees (duplicate sibling
    /// signatures) fail the run before anything is written; per-item remote
    /// failures are recorded in the returned [`SyncReport`] instead.
    pub async fn sync_hierarchy(
        &self,
        source_tree: &HierarchyNode,
        target_tree: Option<&HierarchyNode>,
        options: &SyncOptions,
    ) -> SyncResult<SyncReport> {
        let started = Instant::now();
        let plan = self.planner.generate_sync_plan(source_tree, target_tree)?;

        let mut report = SyncReport::begin(options.dry_run);
        report.planned_creates = plan.items_to_create.len();
        report.planned_removals = plan.items_to_remove.len();

        if plan.is_empty() {
            info!(root = %source_tree.item.id, "hierarchies already match; no changes needed");
            report.duration = started.elapsed();
            return Ok(report);
        }
        if options.update_content {
            debug!("content updates requested but reserved; matched items left untouched");
        }

        if options.dry_run {
            for action in plan.items_to_create.iter().chain(&plan.items_to_remove) {
                info!(kind = action.kind(), label = action.label(), "planned action");
            }
            report.duration = started.elapsed();
            report.log_summary();
            return Ok(report);
        }

        let created = self.run_creation_phase(&plan, options, &mut report).await;
        self.run_removal_phase(&plan, options, &mut report).await;
        if options.publish_after_sync && !created.is_empty() {
            self.run_publish_phase(&created, &mut report).await;
        }

        report.duration = started.elapsed();
        report.log_summary();
        Ok(report)
    }

    /// Creates planned items parent-first, remapping hierarchy references
    /// from source ids to the target ids minted along the way. A failed
    /// create poisons its whole planned subtree.
    async fn run_creation_phase(
        &self,
        plan: &SyncPlan,
        options: &SyncOptions,
        report: &mut SyncReport,
    ) -> Vec<ContentItem> {
        let ordered = sort_parent_first(&plan.items_to_create);
        let mut id_map: HashMap<ItemId, ItemId> = HashMap::new();
        let mut failed_sources: HashSet<ItemId> = HashSet::new();
        let mut created_items = Vec::new();

        for action in ordered {
            let SyncAction::Create {
                source_item,
                target_parent_id,
            } = action
            else {
                continue;
            };

            if let Some(parent) = target_parent_id
                && failed_sources.contains(parent)
            {
                warn!(item = %source_item.id, "skipping create: parent creation failed");
                report.record_failure(
                    SyncPhase::Create,
                    Some(source_item.id.clone()),
                    source_item.label.clone(),
                    "parent creation failed",
                );
                failed_sources.insert(source_item.id.clone());
                continue;
            }

            // Parent ids inside the plan refer to source items until the
            // parent is created; ids already pointing at the target pass
            // through the map untouched.
            let hierarchy = match target_parent_id {
                Some(parent) => {
                    let resolved = id_map.get(parent).cloned().unwrap_or_else(|| parent.clone());
                    Hierarchy::child_of(resolved)
                }
                None => Hierarchy::root(),
            };

            let mut body = source_item.body.clone();
            body.meta.delivery_key =
                transform_delivery_key(source_item.delivery_key(), &options.locale_strategy);
            body.meta.hierarchy = Some(hierarchy);

            let request = CreateItemRequest {
                label: source_item.label.clone(),
                body,
                folder_id: None,
                locale: assigned_locale(&options.locale_strategy, source_item.locale.as_deref()),
            };

            match self
                .target
                .create_item(&options.target_repository_id, &request)
                .await
            {
                Ok(created) => {
                    debug!(source = %source_item.id, target = %created.id, "created item");
                    id_map.insert(source_item.id.clone(), created.id.clone());
                    created_items.push(created);
                    report.items_created += 1;
                }
                Err(e) => {
                    warn!(item = %source_item.id, error = %e, "failed to create item");
                    report.record_failure(
                        SyncPhase::Create,
                        Some(source_item.id.clone()),
                        source_item.label.clone(),
                        e.to_string(),
                    );
                    failed_sources.insert(source_item.id.clone());
                }
            }
        }

        created_items
    }

    /// Retires planned removals in the order the plan put them (children
    /// before parents).
    async fn run_removal_phase(
        &self,
        plan: &SyncPlan,
        options: &SyncOptions,
        report: &mut SyncReport,
    ) {
        for action in &plan.items_to_remove {
            let SyncAction::Remove {
                source_item,
                target_item,
            } = action
            else {
                continue;
            };
            let Some(target_item) = target_item else {
                info!(label = %source_item.label, "skipping removal: no target item resolved");
                report.removals_skipped += 1;
                continue;
            };

            let preparation = prepare_item_for_removal(
                self.target.as_ref(),
                &options.target_repository_id,
                &target_item.id,
                &options.removal,
            )
            .await;

            if !preparation.success {
                let error = preparation
                    .first_failure()
                    .map(|(step, message)| format!("{step}: {message}"))
                    .unwrap_or_else(|| "preparation incomplete".to_string());
                report.record_failure(
                    SyncPhase::Remove,
                    Some(target_item.id.clone()),
                    target_item.label.clone(),
                    error,
                );
                continue;
            }

            match archive_prepared_item(self.target.as_ref(), &preparation, &options.removal).await
            {
                Some(cleanup) if cleanup.overall_success => report.items_removed += 1,
                Some(cleanup) => {
                    let error = cleanup
                        .first_failure()
                        .map(|(step, message)| format!("{step}: {message}"))
                        .unwrap_or_else(|| "archival incomplete".to_string());
                    report.record_failure(
                        SyncPhase::Remove,
                        Some(target_item.id.clone()),
                        cleanup.label.clone(),
                        error,
                    );
                }
                None => report.record_failure(
                    SyncPhase::Remove,
                    Some(target_item.id.clone()),
                    target_item.label.clone(),
                    "archival refused: preparation incomplete",
                ),
            }
        }
    }

    async fn run_publish_phase(&self, created: &[ContentItem], report: &mut SyncReport) {
        for item in created {
            match self.target.publish_item(&item.id).await {
                Ok(()) => {
                    debug!(item = %item.id, "published item");
                    report.items_published += 1;
                }
                Err(e) => {
                    warn!(item = %item.id, error = %e, "failed to publish");
                    report.record_failure(
                        SyncPhase::Publish,
                        Some(item.id.clone()),
                        item.label.clone(),
                        e.to_string(),
                    );
                }
            }
        }
    }
}

/// Orders create actions so every parent precedes its children, keeping
/// the plan's relative order among ready actions. Parents outside the plan
/// (existing target items) count as already placed.
fn sort_parent_first(actions: &[SyncAction]) -> Vec<&SyncAction> {
    let in_plan: HashSet<&ItemId> = actions
        .iter()
        .filter_map(|action| match action {
            SyncAction::Create { source_item, .. } => Some(&source_item.id),
            _ => None,
        })
        .collect();

    let mut remaining: Vec<&SyncAction> = actions.iter().collect();
    let mut ordered = Vec::with_capacity(remaining.len());
    let mut placed: HashSet<&ItemId> = HashSet::new();

    while !remaining.is_empty() {
        let mut progressed = false;
        let mut deferred = Vec::new();
        for action in remaining {
            let ready = match action {
                SyncAction::Create {
                    target_parent_id: Some(parent),
                    ..
                } => !in_plan.contains(parent) || placed.contains(parent),
                _ => true,
            };
            if ready {
                if let SyncAction::Create { source_item, .. } = action {
                    placed.insert(&source_item.id);
                }
                ordered.push(action);
                progressed = true;
            } else {
                deferred.push(action);
            }
        }
        if !progressed {
            // Unresolvable parent references; append as-is rather than loop.
            warn!(
                stranded = deferred.len(),
                "create ordering could not resolve every parent"
            );
            ordered.extend(deferred);
            break;
        }
        remaining = deferred;
    }

    ordered
}
