//! Content service abstraction.
//!
//! Defines the narrow contract the sync engine needs from a CMS backend:
//! item CRUD, folder get-or-create, delivery-key management, and the
//! archive/publish lifecycle. Transport implementations (REST clients)
//! live outside this workspace and only need to satisfy this trait.

use crate::error::ClientResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use treeline_types::{Body, ContentItem, ContentStatus, FolderId, ItemId, RepositoryId};

/// Request to create a content item.
///
/// Hierarchy placement rides in `body` metadata; the service itself does not
/// interpret it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItemRequest {
    pub label: String,
    pub body: Body,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
}

impl CreateItemRequest {
    /// Creates a request with no folder or locale assignment.
    #[must_use]
    pub fn new(label: impl Into<String>, body: Body) -> Self {
        Self {
            label: label.into(),
            body,
            folder_id: None,
            locale: None,
        }
    }
}

/// Server-side filter for item listings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ContentStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
}

/// Abstract content service interface.
///
/// All mutating calls follow the remote's optimistic-concurrency model:
/// operations that take a `version` reject stale values, and every returned
/// `ContentItem` carries the fresh post-mutation version.
#[async_trait]
pub trait ContentService: Send + Sync {
    /// Lists items in a repository, optionally filtered server-side.
    /// Listing order is stable across calls.
    async fn fetch_items(
        &self,
        repository_id: &RepositoryId,
        filter: Option<&ItemFilter>,
    ) -> ClientResult<Vec<ContentItem>>;

    /// Fetches the latest version of one item, or `None` if it does not
    /// exist.
    async fn get_item(&self, item_id: &ItemId) -> ClientResult<Option<ContentItem>>;

    /// Creates a content item in the repository.
    async fn create_item(
        &self,
        repository_id: &RepositoryId,
        request: &CreateItemRequest,
    ) -> ClientResult<ContentItem>;

    /// Finds a folder by name under the given parent (repository root when
    /// absent), creating it when missing. Searches before creating, so
    /// repeated calls for the same name return the same folder.
    async fn get_or_create_folder(
        &self,
        repository_id: &RepositoryId,
        name: &str,
        parent_folder_id: Option<&FolderId>,
    ) -> ClientResult<FolderId>;

    /// Moves an item into a folder, detaching it from any hierarchy it
    /// belonged to. Archived items cannot be moved.
    async fn move_item(
        &self,
        item_id: &ItemId,
        target_folder_id: &FolderId,
        version: u64,
    ) -> ClientResult<ContentItem>;

    /// Sets or clears the item's delivery key. Archived items cannot have
    /// their key changed.
    async fn set_delivery_key(
        &self,
        item_id: &ItemId,
        version: u64,
        key: Option<&str>,
    ) -> ClientResult<ContentItem>;

    /// Restores an archived item to active.
    async fn unarchive_item(&self, item_id: &ItemId) -> ClientResult<ContentItem>;

    /// Archives an item at the given version.
    async fn archive_item(&self, item_id: &ItemId, version: u64) -> ClientResult<ContentItem>;

    /// Withdraws the published edition of an item.
    async fn unpublish_item(&self, item_id: &ItemId) -> ClientResult<()>;

    /// Publishes the current version of an item.
    async fn publish_item(&self, item_id: &ItemId) -> ClientResult<()>;
}
