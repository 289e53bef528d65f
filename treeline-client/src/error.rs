//! Error types for the service contract.

use thiserror::Error;
use treeline_types::{FolderId, ItemId};

/// Result type for service operations.
pub type ClientResult<T> = Result<T, ClientError>;

/// Errors surfaced by a `ContentService` implementation.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Item does not exist.
    #[error("item not found: {0}")]
    ItemNotFound(ItemId),

    /// Folder does not exist.
    #[error("folder not found: {0}")]
    FolderNotFound(FolderId),

    /// The supplied version is stale.
    #[error("version conflict on item {item_id}: supplied {supplied}, current {current}")]
    VersionConflict {
        item_id: ItemId,
        supplied: u64,
        current: u64,
    },

    /// The delivery key is already taken within the repository.
    #[error("delivery key already in use: {0}")]
    DeliveryKeyConflict(String),

    /// The item is in a state that forbids the operation.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Transport-level failure (network, HTTP, auth).
    #[error("transport error: {0}")]
    Transport(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
