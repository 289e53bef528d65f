//! Content item model mirrored from the hosted CMS.
//!
//! Items are owned by the remote; the engine only holds transient copies
//! fetched for a single reconciliation run. Serde renames follow the
//! remote's camelCase wire shape so fetched JSON maps on directly.

use crate::{FolderId, ItemId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContentStatus {
    Active,
    Archived,
    Deleted,
}

/// Publishing state of a content item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishingStatus {
    /// Never published, or unpublished since.
    None,
    /// Published ahead of the latest version.
    Early,
    /// The latest version is published.
    Latest,
}

impl PublishingStatus {
    /// Whether a published version is currently resolvable.
    #[must_use]
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Early | Self::Latest)
    }
}

/// Hierarchy position descriptor carried in item body metadata.
///
/// Roots carry `{root: true, parentId: null}`; children carry
/// `{root: false, parentId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Hierarchy {
    pub root: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<ItemId>,
}

impl Hierarchy {
    /// Descriptor for the root of a hierarchy.
    #[must_use]
    pub fn root() -> Self {
        Self {
            root: true,
            parent_id: None,
        }
    }

    /// Descriptor for a child attached under `parent_id`.
    #[must_use]
    pub fn child_of(parent_id: ItemId) -> Self {
        Self {
            root: false,
            parent_id: Some(parent_id),
        }
    }
}

/// Body metadata (the `_meta` object) of a content item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BodyMeta {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delivery_key: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hierarchy: Option<Hierarchy>,
}

/// Content item body: typed `_meta` plus opaque schema-defined fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Body {
    #[serde(rename = "_meta", default)]
    pub meta: BodyMeta,
    /// Schema-defined content fields; the engine never interprets these.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Body {
    /// Builds a body from metadata alone.
    #[must_use]
    pub fn with_meta(meta: BodyMeta) -> Self {
        Self {
            meta,
            fields: Map::new(),
        }
    }
}

/// A content record in a CMS repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: ItemId,
    pub label: String,
    /// Optimistic-concurrency token; bumped by every remote mutation.
    pub version: u64,
    pub status: ContentStatus,
    pub publishing_status: PublishingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locale: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder_id: Option<FolderId>,
    pub body: Body,
}

impl ContentItem {
    /// Creates a fresh, active, unpublished item at version 1.
    #[must_use]
    pub fn new(id: ItemId, label: impl Into<String>, body: Body) -> Self {
        Self {
            id,
            label: label.into(),
            version: 1,
            status: ContentStatus::Active,
            publishing_status: PublishingStatus::None,
            locale: None,
            folder_id: None,
            body,
        }
    }

    /// Sets the item locale.
    #[must_use]
    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    /// The hierarchy descriptor, if the item participates in one.
    #[must_use]
    pub fn hierarchy(&self) -> Option<&Hierarchy> {
        self.body.meta.hierarchy.as_ref()
    }

    /// The hierarchical parent id, if any.
    #[must_use]
    pub fn parent_id(&self) -> Option<&ItemId> {
        self.body
            .meta
            .hierarchy
            .as_ref()
            .and_then(|h| h.parent_id.as_ref())
    }

    /// Whether the item is flagged as the root of its hierarchy.
    #[must_use]
    pub fn is_hierarchy_root(&self) -> bool {
        self.body.meta.hierarchy.as_ref().is_some_and(|h| h.root)
    }

    /// The delivery key, if one is set.
    #[must_use]
    pub fn delivery_key(&self) -> Option<&str> {
        self.body.meta.delivery_key.as_deref()
    }

    /// The content schema id, if one is recorded in body metadata.
    #[must_use]
    pub fn schema_id(&self) -> Option<&str> {
        self.body.meta.schema.as_deref()
    }
}
