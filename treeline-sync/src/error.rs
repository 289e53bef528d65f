//! Error types for the sync engine.

use thiserror::Error;
use treeline_types::ItemId;

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;

/// Structural errors that abort a sync run.
///
/// Remote operation failures never surface here; they are recorded per item
/// in the run's [`SyncReport`](crate::SyncReport) and the run continues.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The designated root item is missing from the flat collection.
    #[error("root item not found: {0}")]
    RootNotFound(ItemId),

    /// An item was reached twice while assembling a tree.
    #[error("hierarchy cycle detected at item: {0}")]
    HierarchyCycle(ItemId),

    /// Two siblings share a matcher signature, making the diff ambiguous.
    #[error("duplicate sibling signature {signature:?} under item {parent_id}")]
    DuplicateSignature {
        parent_id: ItemId,
        signature: String,
    },

    /// Client error while assembling the flat collections for a run.
    #[error("client error: {0}")]
    Client(#[from] treeline_client::ClientError),
}
