//! Link directory service.
//!
//! This crate keeps links, categories and tags consistent with each other:
//! category resolution, rename propagation, count-and-confirm deletes and
//! batch import. Persistence is delegated to `linkdir_storage`.

pub mod config;
pub mod import;
pub mod service;

pub use config::{DirectoryConfig, DuplicatePolicy, ImportOptions, RenamePolicy};
pub use import::{FailedImport, FailureReason, ImportCategories, ImportResult, ImportSuccess};
pub use service::{resolve_category, DirectoryService};
