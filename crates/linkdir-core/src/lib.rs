//! Core types and traits for the link directory.
//!
//! This crate provides the entity model, schema validation, the error
//! taxonomy and the storage backend contract shared by the store, the
//! directory service and the HTTP gateway.

pub mod category;
pub mod entity;
pub mod error;
pub mod link;
pub mod preferences;
pub mod query;
pub mod repository;
pub mod settings;
pub mod tag;
pub mod validate;

pub use category::{Category, CategoryPatch};
pub use entity::{Entity, EntityKind};
pub use error::{DirectoryError, FieldIssue, Result, StorageError, ValidationError};
pub use link::{
    Environment, Environments, Link, LinkCandidate, LinkPatch, DEFAULT_CATEGORY, DEFAULT_COLOR,
};
pub use repository::{DocumentStore, ReadOutcome, Resource, Revision};
pub use settings::Settings;
pub use tag::{Tag, TagPatch};
pub use validate::Validate;
