//! CMS service contract for Treeline.
//!
//! The sync engine drives a remote CMS exclusively through the
//! [`ContentService`] trait defined here: item CRUD, folder get-or-create,
//! delivery-key management, and the archive/publish lifecycle. Concrete
//! REST transports live outside this workspace; [`MemoryService`] implements
//! the contract in memory with faithful remote semantics for tests and
//! local dry runs.

mod error;
mod memory;
mod service;

pub use error::{ClientError, ClientResult};
pub use memory::MemoryService;
pub use service::{ContentService, CreateItemRequest, ItemFilter};
