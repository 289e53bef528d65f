//! Safe retirement of remote items.
//!
//! Retiring an item is a two-phase pipeline shared by hierarchy sync and
//! cleanup flows. Preparation parks the item in a quarantine folder
//! (get-or-create folder → fetch latest version → unarchive if needed →
//! move); archival then clears the delivery key, unpublishes, and archives.
//! Every step is recorded independently, and failures stop the phase but
//! never propagate as errors, so one bad item cannot abort a whole run.

use crate::tree::HierarchyNode;
use tracing::{debug, warn};
use treeline_client::ContentService;
use treeline_types::{ContentItem, ContentStatus, FolderId, ItemId, RepositoryId};

/// Default quarantine folder name.
pub const DEFAULT_DELETED_FOLDER_NAME: &str = "__deleted";

/// Options for the removal pipeline.
#[derive(Debug, Clone)]
pub struct RemovalOptions {
    /// Quarantine folder name searched or created per repository.
    pub deleted_folder_name: String,
    /// Pre-resolved quarantine folder; skips the get-or-create step.
    pub deleted_folder_id: Option<FolderId>,
    /// Parent under which the quarantine folder lives (repository root when
    /// absent).
    pub deleted_folder_parent_id: Option<FolderId>,
    /// Clear the delivery key before archiving.
    pub clear_delivery_key: bool,
    /// Unpublish live items before archiving.
    pub unpublish_if_needed: bool,
    /// Unarchive already-archived items so they can be moved.
    pub unarchive_if_needed: bool,
}

impl Default for RemovalOptions {
    fn default() -> Self {
        Self {
            deleted_folder_name: DEFAULT_DELETED_FOLDER_NAME.to_string(),
            deleted_folder_id: None,
            deleted_folder_parent_id: None,
            clear_delivery_key: true,
            unpublish_if_needed: true,
            unarchive_if_needed: true,
        }
    }
}

/// Outcome of one pipeline step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepStatus {
    /// The step ran and succeeded.
    Succeeded,
    /// The step's precondition did not apply, or an earlier failure stopped
    /// the phase before this step was attempted.
    Skipped,
    /// The step ran and failed.
    Failed(String),
}

impl StepStatus {
    /// Whether the step failed.
    #[must_use]
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Per-item outcome of the preparation phase.
#[derive(Debug, Clone)]
pub struct RemovalPreparation {
    pub item_id: ItemId,
    /// Label discovered by the fetch step, when it got that far.
    pub label: Option<String>,
    /// Quarantine folder the item was (or was to be) moved into.
    pub deleted_folder_id: Option<FolderId>,
    /// Post-move item carrying the fresh version; present only on success.
    pub updated_item: Option<ContentItem>,
    pub ensure_deleted_folder: StepStatus,
    pub fetch_latest: StepStatus,
    pub unarchive: StepStatus,
    pub move_to_deleted: StepStatus,
    /// Every attempted step succeeded and the item is parked in quarantine.
    pub success: bool,
}

impl RemovalPreparation {
    fn pending(item_id: ItemId) -> Self {
        Self {
            item_id,
            label: None,
            deleted_folder_id: None,
            updated_item: None,
            ensure_deleted_folder: StepStatus::Skipped,
            fetch_latest: StepStatus::Skipped,
            unarchive: StepStatus::Skipped,
            move_to_deleted: StepStatus::Skipped,
            success: false,
        }
    }

    /// First failed step, as `(step name, error)`.
    #[must_use]
    pub fn first_failure(&self) -> Option<(&'static str, &str)> {
        [
            ("ensure_deleted_folder", &self.ensure_deleted_folder),
            ("fetch_latest", &self.fetch_latest),
            ("unarchive", &self.unarchive),
            ("move_to_deleted", &self.move_to_deleted),
        ]
        .into_iter()
        .find_map(|(name, status)| match status {
            StepStatus::Failed(message) => Some((name, message.as_str())),
            _ => None,
        })
    }
}

/// Full per-item removal outcome: the preparation's step records carried
/// over, plus the archival sub-steps.
#[derive(Debug, Clone)]
pub struct ItemCleanup {
    pub item_id: ItemId,
    pub label: String,
    pub unarchive: StepStatus,
    pub move_to_deleted: StepStatus,
    pub clear_key: StepStatus,
    pub unpublish: StepStatus,
    pub archive: StepStatus,
    /// No attempted step failed.
    pub overall_success: bool,
}

impl ItemCleanup {
    /// First failed step, as `(step name, error)`.
    #[must_use]
    pub fn first_failure(&self) -> Option<(&'static str, &str)> {
        [
            ("unarchive", &self.unarchive),
            ("move_to_deleted", &self.move_to_deleted),
            ("clear_key", &self.clear_key),
            ("unpublish", &self.unpublish),
            ("archive", &self.archive),
        ]
        .into_iter()
        .find_map(|(name, status)| match status {
            StepStatus::Failed(message) => Some((name, message.as_str())),
            _ => None,
        })
    }
}

/// Composition of both phases for one item.
#[derive(Debug, Clone)]
pub struct ItemRemoval {
    pub item_id: ItemId,
    pub label: String,
    pub preparation: RemovalPreparation,
    /// Present when archival ran (the preparation succeeded).
    pub cleanup: Option<ItemCleanup>,
    pub overall_success: bool,
}

/// Prepares an item for removal: quarantine folder, fresh version,
/// unarchive when required, move.
///
/// Stops at the first failure and leaves later steps `Skipped`, since each
/// step depends on the state the previous one establishes. Never returns an
/// error; the outcome is fully described by the step records.
pub async fn prepare_item_for_removal(
    service: &dyn ContentService,
    repository_id: &RepositoryId,
    item_id: &ItemId,
    options: &RemovalOptions,
) -> RemovalPreparation {
    let mut prep = RemovalPreparation::pending(item_id.clone());

    // Quarantine folder, unless the caller already resolved one.
    let folder_id = match &options.deleted_folder_id {
        Some(folder_id) => folder_id.clone(),
        None => {
            match service
                .get_or_create_folder(
                    repository_id,
                    &options.deleted_folder_name,
                    options.deleted_folder_parent_id.as_ref(),
                )
                .await
            {
                Ok(folder_id) => {
                    prep.ensure_deleted_folder = StepStatus::Succeeded;
                    folder_id
                }
                Err(e) => {
                    warn!(item = %item_id, error = %e, "failed to ensure quarantine folder");
                    prep.ensure_deleted_folder = StepStatus::Failed(e.to_string());
                    return prep;
                }
            }
        }
    };
    prep.deleted_folder_id = Some(folder_id.clone());

    // Fresh optimistic-concurrency version immediately before mutating.
    let item = match service.get_item(item_id).await {
        Ok(Some(item)) => {
            prep.fetch_latest = StepStatus::Succeeded;
            prep.label = Some(item.label.clone());
            item
        }
        Ok(None) => {
            warn!(item = %item_id, "item to remove no longer exists");
            prep.fetch_latest = StepStatus::Failed("item not found".to_string());
            return prep;
        }
        Err(e) => {
            warn!(item = %item_id, error = %e, "failed to fetch latest version");
            prep.fetch_latest = StepStatus::Failed(e.to_string());
            return prep;
        }
    };

    // Archived items cannot be moved.
    let item = if options.unarchive_if_needed && item.status == ContentStatus::Archived {
        match service.unarchive_item(item_id).await {
            Ok(unarchived) => {
                prep.unarchive = StepStatus::Succeeded;
                unarchived
            }
            Err(e) => {
                warn!(item = %item_id, error = %e, "failed to unarchive before move");
                prep.unarchive = StepStatus::Failed(e.to_string());
                return prep;
            }
        }
    } else {
        item
    };

    match service.move_item(item_id, &folder_id, item.version).await {
        Ok(moved) => {
            debug!(item = %item_id, folder = %folder_id, "moved item to quarantine");
            prep.move_to_deleted = StepStatus::Succeeded;
            prep.updated_item = Some(moved);
            prep.success = true;
        }
        Err(e) => {
            warn!(item = %item_id, error = %e, "failed to move item to quarantine");
            prep.move_to_deleted = StepStatus::Failed(e.to_string());
        }
    }

    prep
}

/// Archives an item already parked in quarantine.
///
/// Returns `None` when the preparation did not succeed; archiving without
/// the fresh post-move version would race the remote. The delivery key is
/// cleared first because archived items cannot have keys corrected, then
/// live items are unpublished so no stale version stays publicly
/// resolvable, then the item is archived.
pub async fn archive_prepared_item(
    service: &dyn ContentService,
    preparation: &RemovalPreparation,
    options: &RemovalOptions,
) -> Option<ItemCleanup> {
    let Some(item) = preparation
        .updated_item
        .as_ref()
        .filter(|_| preparation.success)
    else {
        warn!(item = %preparation.item_id, "skipping archival: preparation did not succeed");
        return None;
    };
    let mut item = item.clone();

    let mut cleanup = ItemCleanup {
        item_id: item.id.clone(),
        label: item.label.clone(),
        unarchive: preparation.unarchive.clone(),
        move_to_deleted: preparation.move_to_deleted.clone(),
        clear_key: StepStatus::Skipped,
        unpublish: StepStatus::Skipped,
        archive: StepStatus::Skipped,
        overall_success: false,
    };

    if options.clear_delivery_key && item.delivery_key().is_some() {
        match service.set_delivery_key(&item.id, item.version, None).await {
            Ok(updated) => {
                cleanup.clear_key = StepStatus::Succeeded;
                item = updated;
            }
            Err(e) => {
                warn!(item = %item.id, error = %e, "failed to clear delivery key");
                cleanup.clear_key = StepStatus::Failed(e.to_string());
                return Some(cleanup);
            }
        }
    }

    if options.unpublish_if_needed && item.publishing_status.is_live() {
        match service.unpublish_item(&item.id).await {
            Ok(()) => cleanup.unpublish = StepStatus::Succeeded,
            Err(e) => {
                warn!(item = %item.id, error = %e, "failed to unpublish");
                cleanup.unpublish = StepStatus::Failed(e.to_string());
                return Some(cleanup);
            }
        }
    }

    if item.status == ContentStatus::Active {
        match service.archive_item(&item.id, item.version).await {
            Ok(_) => {
                debug!(item = %item.id, "archived item");
                cleanup.archive = StepStatus::Succeeded;
            }
            Err(e) => {
                warn!(item = %item.id, error = %e, "failed to archive");
                cleanup.archive = StepStatus::Failed(e.to_string());
                return Some(cleanup);
            }
        }
    }

    cleanup.overall_success = true;
    Some(cleanup)
}

/// Retires one item end to end: prepare, then archive.
pub async fn remove_item(
    service: &dyn ContentService,
    repository_id: &RepositoryId,
    item_id: &ItemId,
    options: &RemovalOptions,
) -> ItemRemoval {
    let preparation = prepare_item_for_removal(service, repository_id, item_id, options).await;
    let cleanup = if preparation.success {
        archive_prepared_item(service, &preparation, options).await
    } else {
        None
    };

    let label = cleanup
        .as_ref()
        .map(|cleanup| cleanup.label.clone())
        .or_else(|| preparation.label.clone())
        .unwrap_or_default();
    let overall_success = cleanup
        .as_ref()
        .is_some_and(|cleanup| cleanup.overall_success);

    ItemRemoval {
        item_id: item_id.clone(),
        label,
        preparation,
        cleanup,
        overall_success,
    }
}

/// Retires a whole subtree, children before parents, so no item sits in
/// quarantine while descendants still hang off it.
pub async fn remove_subtree(
    service: &dyn ContentService,
    repository_id: &RepositoryId,
    node: &HierarchyNode,
    options: &RemovalOptions,
) -> Vec<ItemRemoval> {
    // Resolve the quarantine folder once for the whole subtree.
    let mut options = options.clone();
    if options.deleted_folder_id.is_none() {
        match service
            .get_or_create_folder(
                repository_id,
                &options.deleted_folder_name,
                options.deleted_folder_parent_id.as_ref(),
            )
            .await
        {
            Ok(folder_id) => options.deleted_folder_id = Some(folder_id),
            Err(e) => {
                warn!(error = %e, "quarantine folder not pre-resolved; each item will retry");
            }
        }
    }

    let nodes: Vec<&HierarchyNode> = node.iter().collect();
    let mut removals = Vec::with_capacity(nodes.len());
    for node in nodes.iter().rev() {
        removals.push(remove_item(service, repository_id, &node.item.id, &options).await);
    }
    removals
}
