//! Persistence for the link directory.
//!
//! [`Collection`] gives typed CRUD over one JSON array document,
//! [`SettingsDocument`] over the singleton settings object, and [`Store`]
//! bundles all four behind one backend. Backends implement
//! [`linkdir_core::DocumentStore`]: [`FileSystemStore`] for durable data and
//! [`InMemoryStore`] for tests.

pub mod collection;
pub mod fs;
pub mod memory;
pub mod seed;
pub mod settings;
pub mod store;

pub use collection::{
    apply_patch, check_revision, Collection, CollectionGuard, LoadOutcome, ReadPolicy, Snapshot,
};
pub use fs::FileSystemStore;
pub use memory::InMemoryStore;
pub use seed::Seed;
pub use settings::SettingsDocument;
pub use store::Store;
