use crate::entity::{Entity, EntityKind};
use crate::error::ValidationError;
use crate::repository::Resource;
use crate::validate::{check_length, Validate};
use serde::{Deserialize, Serialize};

/// A multi-valued label for links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub name: String,
}

impl Tag {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagPatch {
    pub name: Option<String>,
}

impl Validate for Tag {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        check_length(&mut errors, "name", &self.name, 2, 30);
        errors.into_result()
    }
}

impl Entity for Tag {
    type Patch = TagPatch;

    const KIND: EntityKind = EntityKind::Tag;
    const RESOURCE: Resource = Resource::Tags;

    fn key(&self) -> &str {
        &self.name
    }

    fn same_key(a: &str, b: &str) -> bool {
        a.to_lowercase() == b.to_lowercase()
    }

    fn patched_key(patch: &TagPatch) -> Option<&str> {
        patch.name.as_deref()
    }

    fn apply(&mut self, patch: TagPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
    }
}
