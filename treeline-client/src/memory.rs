//! In-memory `ContentService` implementation.
//!
//! Mirrors remote semantics closely enough to exercise the engine
//! end-to-end: versions are checked and bumped the way the hosted CMS does,
//! archived items refuse mutation, delivery keys are unique per repository.
//! Backs the test suites and local dry runs.

use crate::error::{ClientError, ClientResult};
use crate::service::{ContentService, CreateItemRequest, ItemFilter};
use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;
use treeline_types::{ContentItem, ContentStatus, FolderId, ItemId, PublishingStatus, RepositoryId};

#[derive(Debug, Clone)]
struct FolderRecord {
    id: FolderId,
    repository_id: RepositoryId,
    parent_id: Option<FolderId>,
    name: String,
}

#[derive(Debug, Default)]
struct ServiceState {
    /// Items in insertion order, so listings are stable.
    items: Vec<(RepositoryId, ContentItem)>,
    folders: Vec<FolderRecord>,
}

impl ServiceState {
    fn position(&self, item_id: &ItemId) -> Option<usize> {
        self.items.iter().position(|(_, item)| &item.id == item_id)
    }

    /// Looks up an item and checks the supplied optimistic-concurrency
    /// version, returning the item's index on success.
    fn checked(&self, item_id: &ItemId, version: u64) -> ClientResult<usize> {
        let idx = self
            .position(item_id)
            .ok_or_else(|| ClientError::ItemNotFound(item_id.clone()))?;
        let current = self.items[idx].1.version;
        if current != version {
            return Err(ClientError::VersionConflict {
                item_id: item_id.clone(),
                supplied: version,
                current,
            });
        }
        Ok(idx)
    }

    fn key_taken(&self, repository_id: &RepositoryId, key: &str, except: Option<&ItemId>) -> bool {
        self.items.iter().any(|(repo, item)| {
            repo == repository_id
                && except != Some(&item.id)
                && item.delivery_key() == Some(key)
        })
    }
}

/// In-memory content service.
#[derive(Debug, Default)]
pub struct MemoryService {
    state: Mutex<ServiceState>,
}

impl MemoryService {
    /// Creates an empty service.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds an item directly, bypassing create-time checks. Replaces any
    /// existing item with the same id.
    pub async fn put_item(&self, repository_id: &RepositoryId, item: ContentItem) {
        let mut state = self.state.lock().await;
        if let Some(idx) = state.position(&item.id) {
            state.items[idx] = (repository_id.clone(), item);
        } else {
            state.items.push((repository_id.clone(), item));
        }
    }

    /// Total number of items across all repositories.
    pub async fn item_count(&self) -> usize {
        self.state.lock().await.items.len()
    }
}

#[async_trait]
impl ContentService for MemoryService {
    async fn fetch_items(
        &self,
        repository_id: &RepositoryId,
        filter: Option<&ItemFilter>,
    ) -> ClientResult<Vec<ContentItem>> {
        let state = self.state.lock().await;
        let items = state
            .items
            .iter()
            .filter(|(repo, _)| repo == repository_id)
            .map(|(_, item)| item)
            .filter(|item| {
                let Some(filter) = filter else { return true };
                if let Some(schema_id) = &filter.schema_id
                    && item.schema_id() != Some(schema_id.as_str())
                {
                    return false;
                }
                if let Some(status) = filter.status
                    && item.status != status
                {
                    return false;
                }
                if let Some(folder_id) = &filter.folder_id
                    && item.folder_id.as_ref() != Some(folder_id)
                {
                    return false;
                }
                true
            })
            .cloned()
            .collect();
        Ok(items)
    }

    async fn get_item(&self, item_id: &ItemId) -> ClientResult<Option<ContentItem>> {
        let state = self.state.lock().await;
        Ok(state
            .position(item_id)
            .map(|idx| state.items[idx].1.clone()))
    }

    async fn create_item(
        &self,
        repository_id: &RepositoryId,
        request: &CreateItemRequest,
    ) -> ClientResult<ContentItem> {
        let mut state = self.state.lock().await;
        if let Some(key) = request.body.meta.delivery_key.as_deref()
            && state.key_taken(repository_id, key, None)
        {
            return Err(ClientError::DeliveryKeyConflict(key.to_string()));
        }
        if let Some(folder_id) = &request.folder_id
            && !state.folders.iter().any(|f| &f.id == folder_id)
        {
            return Err(ClientError::FolderNotFound(folder_id.clone()));
        }

        let mut item = ContentItem::new(ItemId::random(), request.label.clone(), request.body.clone());
        item.locale = request.locale.clone();
        item.folder_id = request.folder_id.clone();
        debug!(id = %item.id, label = %item.label, "created item");
        state.items.push((repository_id.clone(), item.clone()));
        Ok(item)
    }

    async fn get_or_create_folder(
        &self,
        repository_id: &RepositoryId,
        name: &str,
        parent_folder_id: Option<&FolderId>,
    ) -> ClientResult<FolderId> {
        let mut state = self.state.lock().await;
        if let Some(parent_id) = parent_folder_id
            && !state
                .folders
                .iter()
                .any(|f| &f.id == parent_id && &f.repository_id == repository_id)
        {
            return Err(ClientError::FolderNotFound(parent_id.clone()));
        }

        // Search before creating so repeated calls converge on one folder.
        if let Some(existing) = state.folders.iter().find(|f| {
            &f.repository_id == repository_id
                && f.name == name
                && f.parent_id.as_ref() == parent_folder_id
        }) {
            return Ok(existing.id.clone());
        }

        let folder = FolderRecord {
            id: FolderId::random(),
            repository_id: repository_id.clone(),
            parent_id: parent_folder_id.cloned(),
            name: name.to_string(),
        };
        debug!(id = %folder.id, name, "created folder");
        let id = folder.id.clone();
        state.folders.push(folder);
        Ok(id)
    }

    async fn move_item(
        &self,
        item_id: &ItemId,
        target_folder_id: &FolderId,
        version: u64,
    ) -> ClientResult<ContentItem> {
        let mut state = self.state.lock().await;
        if !state.folders.iter().any(|f| &f.id == target_folder_id) {
            return Err(ClientError::FolderNotFound(target_folder_id.clone()));
        }
        let idx = state.checked(item_id, version)?;
        let item = &mut state.items[idx].1;
        if item.status == ContentStatus::Archived {
            return Err(ClientError::InvalidState(format!(
                "archived item {item_id} cannot be moved"
            )));
        }
        item.folder_id = Some(target_folder_id.clone());
        item.body.meta.hierarchy = None;
        item.version += 1;
        debug!(id = %item_id, folder = %target_folder_id, "moved item");
        Ok(item.clone())
    }

    async fn set_delivery_key(
        &self,
        item_id: &ItemId,
        version: u64,
        key: Option<&str>,
    ) -> ClientResult<ContentItem> {
        let mut state = self.state.lock().await;
        let idx = state.checked(item_id, version)?;
        let repository_id = state.items[idx].0.clone();
        if let Some(key) = key
            && state.key_taken(&repository_id, key, Some(item_id))
        {
            return Err(ClientError::DeliveryKeyConflict(key.to_string()));
        }
        let item = &mut state.items[idx].1;
        if item.status == ContentStatus::Archived {
            return Err(ClientError::InvalidState(format!(
                "archived item {item_id} cannot change delivery key"
            )));
        }
        item.body.meta.delivery_key = key.map(str::to_string);
        item.version += 1;
        debug!(id = %item_id, key = ?key, "set delivery key");
        Ok(item.clone())
    }

    async fn unarchive_item(&self, item_id: &ItemId) -> ClientResult<ContentItem> {
        let mut state = self.state.lock().await;
        let idx = state
            .position(item_id)
            .ok_or_else(|| ClientError::ItemNotFound(item_id.clone()))?;
        let item = &mut state.items[idx].1;
        if item.status != ContentStatus::Archived {
            return Err(ClientError::InvalidState(format!(
                "item {item_id} is not archived"
            )));
        }
        item.status = ContentStatus::Active;
        item.version += 1;
        debug!(id = %item_id, "unarchived item");
        Ok(item.clone())
    }

    async fn archive_item(&self, item_id: &ItemId, version: u64) -> ClientResult<ContentItem> {
        let mut state = self.state.lock().await;
        let idx = state.checked(item_id, version)?;
        let item = &mut state.items[idx].1;
        if item.status == ContentStatus::Archived {
            return Err(ClientError::InvalidState(format!(
                "item {item_id} is already archived"
            )));
        }
        item.status = ContentStatus::Archived;
        item.version += 1;
        debug!(id = %item_id, "archived item");
        Ok(item.clone())
    }

    async fn unpublish_item(&self, item_id: &ItemId) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        let idx = state
            .position(item_id)
            .ok_or_else(|| ClientError::ItemNotFound(item_id.clone()))?;
        let item = &mut state.items[idx].1;
        if !item.publishing_status.is_live() {
            return Err(ClientError::InvalidState(format!(
                "item {item_id} is not published"
            )));
        }
        item.publishing_status = PublishingStatus::None;
        debug!(id = %item_id, "unpublished item");
        Ok(())
    }

    async fn publish_item(&self, item_id: &ItemId) -> ClientResult<()> {
        let mut state = self.state.lock().await;
        let idx = state
            .position(item_id)
            .ok_or_else(|| ClientError::ItemNotFound(item_id.clone()))?;
        let item = &mut state.items[idx].1;
        if item.status == ContentStatus::Archived {
            return Err(ClientError::InvalidState(format!(
                "archived item {item_id} cannot be published"
            )));
        }
        item.publishing_status = PublishingStatus::Latest;
        debug!(id = %item_id, "published item");
        Ok(())
    }
}
