//! Domain records for pages and the entities they reference.
//!
//! # Responsibility
//! - Define the values passed across the repository and service boundary.
//! - Own the textual encodings persisted for enumerated columns.
//!
//! # Invariants
//! - Internal sequence ids (`id`) never leave the process in serialized form;
//!   external identifiers (`guid`) are serialized as `id`.
//! - Timestamps are epoch milliseconds.

pub mod detail;
pub mod page;
pub mod property;
pub mod reference;

pub use detail::{PageDetail, Partition, PartitionType};
pub use page::{Page, PageBatch, PagePatch, PermissionType};
pub use property::{PageProperty, PropertyType, PropertyValue};
pub use reference::{AppUser, PageTemplate, Version};
