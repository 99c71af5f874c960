use crate::repository::Resource;
use crate::validate::Validate;
use jiff::Timestamp;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Link,
    Category,
    Tag,
    Settings,
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            EntityKind::Link => "link",
            EntityKind::Category => "category",
            EntityKind::Tag => "tag",
            EntityKind::Settings => "settings",
        })
    }
}

/// A record kept in one JSON array resource and addressed by its name.
pub trait Entity: Validate + Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Partial update merged onto an existing record.
    type Patch: Send + 'static;

    const KIND: EntityKind;
    const RESOURCE: Resource;

    /// Primary key.
    fn key(&self) -> &str;

    /// Whether two primary keys address the same record.
    fn same_key(a: &str, b: &str) -> bool {
        a == b
    }

    /// The new primary key a patch would assign, if it renames.
    fn patched_key(patch: &Self::Patch) -> Option<&str>;

    fn apply(&mut self, patch: Self::Patch);

    /// Called once before a new record is first stored.
    fn stamp_created(&mut self, _now: Timestamp) {}

    /// Called after a patch was merged; `previous` is the stored record.
    fn stamp_updated(&mut self, _previous: &Self, _now: Timestamp) {}

    /// Orders records for listing. Storage order by default.
    fn order(_items: &mut [Self]) {}

    /// Strips derived fields that must not reach storage.
    fn prepare_for_storage(&mut self) {}
}
