//! Hierarchy diff-and-sync engine for Treeline.
//!
//! Reconciles content hierarchies across CMS environments: the source
//! hierarchy is treated as the desired state, and the engine makes the
//! target hierarchy structurally match it by creating items the target is
//! missing and retiring items the source no longer has.
//!
//! # Architecture
//!
//! Hierarchies live in the remote as flat item collections whose body
//! metadata carries parent links; the engine rebuilds them into trees,
//! diffs the trees, and applies the difference.
//!
//! ## Components
//!
//! - **Tree**: Rebuilds a hierarchy tree from a flat item collection
//! - **Matcher**: Pairs source and target nodes by a pluggable signature
//! - **Plan**: Diffs two trees into create and remove actions
//! - **Executor**: Applies a plan strictly sequentially, parents first
//! - **Removal**: Two-phase retirement (quarantine, then archive)
//! - **Report**: Per-run accounting of work done and per-item failures
//!
//! ## Sync Process
//!
//! 1. **Build**: Fetch items and rebuild the source and target trees
//! 2. **Plan**: Walk both trees, matching siblings by signature
//! 3. **Create**: Insert missing items parent-first, remapping parent ids
//! 4. **Remove**: Retire leftover target subtrees children-first
//! 5. **Publish**: Optionally publish everything created
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use treeline_client::MemoryService;
//! use treeline_sync::{HierarchySync, SyncOptions};
//! use treeline_types::RepositoryId;
//!
//! let source = Arc::new(MemoryService::new());
//! let target = Arc::new(MemoryService::new());
//!
//! let sync = HierarchySync::new(source, target);
//! let options = SyncOptions::new(RepositoryId::new("prod-repo"));
//! # let _ = (sync, options);
//! ```

mod bulk;
mod error;
mod executor;
mod locale;
mod matcher;
mod plan;
mod removal;
mod report;
mod tree;

pub use bulk::{BulkSyncReport, HierarchyOutcome, HierarchyPair};
pub use error::{SyncError, SyncResult};
pub use executor::{HierarchySync, SyncOptions};
pub use locale::{LocaleStrategy, assigned_locale, transform_delivery_key};
pub use matcher::{DeliveryKeyMatcher, NameSchemaMatcher, NodeMatcher};
pub use plan::{SyncAction, SyncPlan, SyncPlanner};
pub use removal::{
    DEFAULT_DELETED_FOLDER_NAME, ItemCleanup, ItemRemoval, RemovalOptions, RemovalPreparation,
    StepStatus, archive_prepared_item, prepare_item_for_removal, remove_item, remove_subtree,
};
pub use report::{SyncFailure, SyncPhase, SyncReport};
pub use tree::{HierarchyNode, build_tree};
