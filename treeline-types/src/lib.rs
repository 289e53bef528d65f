//! Core type definitions for Treeline.
//!
//! This crate defines the environment-agnostic content model used throughout
//! the engine:
//! - Item, folder, and repository identifiers (opaque remote-assigned ids)
//! - The `ContentItem` record with its body metadata and hierarchy descriptor
//! - Lifecycle and publishing status enums
//!
//! Engine-side types (plans, reports, removal bookkeeping) belong to
//! `treeline-sync`; the external-service contract belongs to
//! `treeline-client`. Neither is referenced here.

mod ids;
mod item;

pub use ids::{FolderId, ItemId, RepositoryId};
pub use item::{Body, BodyMeta, ContentItem, ContentStatus, Hierarchy, PublishingStatus};
