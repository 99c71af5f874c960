use crate::entity::{Entity, EntityKind};
use crate::error::ValidationError;
use crate::repository::Resource;
use crate::validate::{check_length, check_optional_length, Validate};
use serde::{Deserialize, Serialize};

/// A single-valued grouping label for links.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Derived on listing; whatever storage holds is ignored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link_count: Option<usize>,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
            description: None,
            link_count: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub icon: Option<String>,
    pub description: Option<String>,
}

impl Validate for Category {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        check_length(&mut errors, "name", &self.name, 2, 50);
        check_optional_length(&mut errors, "icon", self.icon.as_deref(), 64);
        check_optional_length(&mut errors, "description", self.description.as_deref(), 200);
        errors.into_result()
    }
}

impl Entity for Category {
    type Patch = CategoryPatch;

    const KIND: EntityKind = EntityKind::Category;
    const RESOURCE: Resource = Resource::Categories;

    fn key(&self) -> &str {
        &self.name
    }

    fn same_key(a: &str, b: &str) -> bool {
        a.to_lowercase() == b.to_lowercase()
    }

    fn patched_key(patch: &CategoryPatch) -> Option<&str> {
        patch.name.as_deref()
    }

    fn apply(&mut self, patch: CategoryPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(icon) = patch.icon {
            self.icon = Some(icon).filter(|icon| !icon.trim().is_empty());
        }
        if let Some(description) = patch.description {
            self.description = Some(description).filter(|d| !d.trim().is_empty());
        }
    }

    fn order(items: &mut [Self]) {
        items.sort_by_key(|category| category.name.to_lowercase());
    }

    fn prepare_for_storage(&mut self) {
        self.link_count = None;
    }
}
