//! Bulk reconciliation of many hierarchies in one pass.
//!
//! Pairs are processed strictly in order, one at a time, and a failing
//! pair never stops the ones after it. Item listings are refetched per
//! pair, so later pairs observe what earlier pairs wrote.

use crate::error::SyncResult;
use crate::executor::{HierarchySync, SyncOptions};
use crate::report::SyncReport;
use crate::tree::{HierarchyNode, build_tree};
use tracing::{info, warn};
use treeline_types::{ItemId, RepositoryId};

/// One source hierarchy and the target hierarchy it reconciles against.
///
/// Without a target root the whole source hierarchy is recreated from
/// scratch in the target repository.
#[derive(Debug, Clone)]
pub struct HierarchyPair {
    pub source_root_id: ItemId,
    pub target_root_id: Option<ItemId>,
}

/// Result of one pair in a bulk run.
#[derive(Debug)]
pub struct HierarchyOutcome {
    /// Source root label, or its id when the tree never materialized.
    pub label: String,
    pub source_delivery_key: Option<String>,
    pub result: SyncResult<SyncReport>,
}

impl HierarchyOutcome {
    /// The pair ran to completion without a single per-item failure.
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.result.as_ref().is_ok_and(SyncReport::is_clean)
    }
}

/// Aggregate outcome of a bulk run.
#[derive(Debug)]
pub struct BulkSyncReport {
    pub total_processed: usize,
    pub successful: usize,
    pub failed: usize,
    pub outcomes: Vec<HierarchyOutcome>,
}

impl HierarchySync {
    /// Syncs every pair in order, continuing past failures.
    pub async fn sync_hierarchies(
        &self,
        source_repository_id: &RepositoryId,
        pairs: &[HierarchyPair],
        options: &SyncOptions,
    ) -> BulkSyncReport {
        let mut outcomes = Vec::with_capacity(pairs.len());
        for pair in pairs {
            let outcome = self.sync_pair(source_repository_id, pair, options).await;
            if let Err(e) = &outcome.result {
                warn!(root = %pair.source_root_id, error = %e, "hierarchy sync failed");
            }
            outcomes.push(outcome);
        }

        let successful = outcomes.iter().filter(|o| o.succeeded()).count();
        let report = BulkSyncReport {
            total_processed: outcomes.len(),
            successful,
            failed: outcomes.len() - successful,
            outcomes,
        };
        info!(
            total = report.total_processed,
            successful = report.successful,
            failed = report.failed,
            "bulk sync complete"
        );
        report
    }

    async fn sync_pair(
        &self,
        source_repository_id: &RepositoryId,
        pair: &HierarchyPair,
        options: &SyncOptions,
    ) -> HierarchyOutcome {
        match self.resolve_trees(source_repository_id, pair, options).await {
            Ok((source_tree, target_tree)) => {
                info!(
                    root = %pair.source_root_id,
                    label = %source_tree.item.label,
                    "syncing hierarchy"
                );
                let result = self
                    .sync_hierarchy(&source_tree, target_tree.as_ref(), options)
                    .await;
                HierarchyOutcome {
                    label: source_tree.item.label.clone(),
                    source_delivery_key: source_tree.item.delivery_key().map(str::to_string),
                    result,
                }
            }
            Err(e) => HierarchyOutcome {
                label: pair.source_root_id.to_string(),
                source_delivery_key: None,
                result: Err(e),
            },
        }
    }

    async fn resolve_trees(
        &self,
        source_repository_id: &RepositoryId,
        pair: &HierarchyPair,
        options: &SyncOptions,
    ) -> SyncResult<(HierarchyNode, Option<HierarchyNode>)> {
        let source_items = self
            .source()
            .fetch_items(source_repository_id, None)
            .await?;
        let source_tree = build_tree(&pair.source_root_id, &source_items)?;

        let target_tree = match &pair.target_root_id {
            Some(target_root_id) => {
                let target_items = self
                    .target()
                    .fetch_items(&options.target_repository_id, None)
                    .await?;
                Some(build_tree(target_root_id, &target_items)?)
            }
            None => None,
        };

        Ok((source_tree, target_tree))
    }
}
