//! Aggregate accounting for a sync run.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;
use tracing::{info, warn};
use treeline_types::ItemId;

/// Phase of the run a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPhase {
    Create,
    Remove,
    Publish,
}

/// One per-item failure. The run keeps going; failures accumulate here.
#[derive(Debug, Clone, Serialize)]
pub struct SyncFailure {
    pub phase: SyncPhase,
    /// Source item id for create failures, target item id otherwise. Absent
    /// when the item was never resolved.
    pub item_id: Option<ItemId>,
    pub label: String,
    pub error: String,
}

/// What a sync run planned, did, and failed to do.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub dry_run: bool,
    pub planned_creates: usize,
    pub planned_removals: usize,
    pub items_created: usize,
    pub items_removed: usize,
    pub items_published: usize,
    /// Removals skipped because no target item was resolved for the action.
    pub removals_skipped: usize,
    pub failures: Vec<SyncFailure>,
    pub started_at: DateTime<Utc>,
    #[serde(skip)]
    pub duration: Duration,
}

impl SyncReport {
    pub(crate) fn begin(dry_run: bool) -> Self {
        Self {
            dry_run,
            planned_creates: 0,
            planned_removals: 0,
            items_created: 0,
            items_removed: 0,
            items_published: 0,
            removals_skipped: 0,
            failures: Vec::new(),
            started_at: Utc::now(),
            duration: Duration::ZERO,
        }
    }

    pub(crate) fn record_failure(
        &mut self,
        phase: SyncPhase,
        item_id: Option<ItemId>,
        label: impl Into<String>,
        error: impl Into<String>,
    ) {
        self.failures.push(SyncFailure {
            phase,
            item_id,
            label: label.into(),
            error: error.into(),
        });
    }

    /// Failures recorded for one phase.
    #[must_use]
    pub fn failures_in(&self, phase: SyncPhase) -> usize {
        self.failures.iter().filter(|f| f.phase == phase).count()
    }

    /// The run completed without a single per-item failure.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Logs the run at info level, with one warn line per failure.
    pub fn log_summary(&self) {
        if self.dry_run {
            info!(
                planned_creates = self.planned_creates,
                planned_removals = self.planned_removals,
                "dry run complete; no changes applied"
            );
            return;
        }
        info!(
            created = self.items_created,
            removed = self.items_removed,
            published = self.items_published,
            skipped = self.removals_skipped,
            failures = self.failures.len(),
            duration_ms = self.duration.as_millis() as u64,
            "sync run complete"
        );
        for failure in &self.failures {
            warn!(
                phase = ?failure.phase,
                item = failure.item_id.as_ref().map(|id| id.as_str()),
                label = %failure.label,
                error = %failure.error,
                "sync step failed"
            );
        }
    }
}
