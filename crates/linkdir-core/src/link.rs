use crate::entity::{Entity, EntityKind};
use crate::error::ValidationError;
use crate::repository::Resource;
use crate::validate::{check_length, check_optional_length, check_url, Validate};
use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt::Display;
use typed_builder::TypedBuilder;

/// Category every link falls back to when its own does not resolve.
pub const DEFAULT_CATEGORY: &str = "Uncategorized";
/// Color assigned to imported links.
pub const DEFAULT_COLOR: &str = "#6366f1";
pub const MAX_TAGS: usize = 3;

const MAX_NAME: usize = 100;
const MAX_DESCRIPTION: usize = 500;

/// A deployment target a link may expose a distinct URL for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Production,
    Staging,
    Integration,
}

impl Environment {
    pub const ALL: [Environment; 3] = [
        Environment::Production,
        Environment::Staging,
        Environment::Integration,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Production => "production",
            Environment::Staging => "staging",
            Environment::Integration => "integration",
        }
    }
}

impl Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-environment URLs of a link. `production` is mandatory.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Environments {
    pub production: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub staging: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub integration: Option<String>,
}

impl Environments {
    pub fn production(url: impl Into<String>) -> Self {
        Self {
            production: url.into(),
            staging: None,
            integration: None,
        }
    }

    pub fn with(mut self, environment: Environment, url: impl Into<String>) -> Self {
        let url = url.into();
        match environment {
            Environment::Production => self.production = url,
            Environment::Staging => self.staging = Some(url),
            Environment::Integration => self.integration = Some(url),
        }
        self
    }

    pub fn get(&self, environment: Environment) -> Option<&str> {
        let url = match environment {
            Environment::Production => Some(self.production.as_str()),
            Environment::Staging => self.staging.as_deref(),
            Environment::Integration => self.integration.as_deref(),
        };
        url.filter(|url| !url.trim().is_empty())
    }

    /// Environments with a non-empty URL, production first.
    pub fn populated(&self) -> Vec<(Environment, &str)> {
        Environment::ALL
            .iter()
            .filter_map(|env| self.get(*env).map(|url| (*env, url)))
            .collect()
    }
}

/// A bookmark entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TypedBuilder)]
#[serde(rename_all = "camelCase")]
pub struct Link {
    #[builder(setter(into))]
    pub name: String,
    pub environments: Environments,
    #[builder(default = DEFAULT_CATEGORY.to_string(), setter(into))]
    #[serde(default = "default_category")]
    pub category: String,
    #[builder(default)]
    #[serde(default)]
    pub tags: Vec<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_type: Option<String>,
    #[builder(default, setter(strip_option, into))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructions: Option<String>,
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Timestamp>,
    #[builder(default, setter(strip_option))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

impl Link {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Fields of a link an update may change. Empty strings clear optional fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkPatch {
    pub name: Option<String>,
    pub environments: Option<Environments>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub description: Option<String>,
    pub color: Option<String>,
    pub access: Option<String>,
    pub access_type: Option<String>,
    pub instructions: Option<String>,
}

impl From<Link> for LinkPatch {
    fn from(link: Link) -> Self {
        Self {
            name: Some(link.name),
            environments: Some(link.environments),
            category: Some(link.category),
            tags: Some(link.tags),
            description: link.description,
            color: link.color,
            access: link.access,
            access_type: link.access_type,
            instructions: link.instructions,
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.trim().is_empty() {
        None
    } else {
        Some(value)
    }
}

impl Validate for Link {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();

        check_length(&mut errors, "name", &self.name, 1, MAX_NAME);
        check_url(&mut errors, "environments.production", &self.environments.production);
        if let Some(url) = &self.environments.staging {
            check_url(&mut errors, "environments.staging", url);
        }
        if let Some(url) = &self.environments.integration {
            check_url(&mut errors, "environments.integration", url);
        }
        check_length(&mut errors, "category", &self.category, 1, 50);

        if self.tags.len() > MAX_TAGS {
            errors.push("tags", format!("at most {MAX_TAGS} tags are allowed"));
        }
        let mut seen = HashSet::new();
        for tag in &self.tags {
            check_length(&mut errors, "tags", tag, 2, 30);
            if !seen.insert(tag.as_str()) {
                errors.push("tags", format!("duplicate tag: {tag}"));
            }
        }

        check_optional_length(&mut errors, "description", self.description.as_deref(), MAX_DESCRIPTION);
        check_optional_length(&mut errors, "color", self.color.as_deref(), 32);
        check_optional_length(&mut errors, "access", self.access.as_deref(), 200);
        check_optional_length(&mut errors, "accessType", self.access_type.as_deref(), 50);
        check_optional_length(&mut errors, "instructions", self.instructions.as_deref(), 2000);

        errors.into_result()
    }
}

impl Entity for Link {
    type Patch = LinkPatch;

    const KIND: EntityKind = EntityKind::Link;
    const RESOURCE: Resource = Resource::Links;

    fn key(&self) -> &str {
        &self.name
    }

    fn patched_key(patch: &LinkPatch) -> Option<&str> {
        patch.name.as_deref()
    }

    fn apply(&mut self, patch: LinkPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(environments) = patch.environments {
            self.environments = environments;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(tags) = patch.tags {
            self.tags = tags;
        }
        if let Some(description) = patch.description {
            self.description = non_empty(description);
        }
        if let Some(color) = patch.color {
            self.color = non_empty(color);
        }
        if let Some(access) = patch.access {
            self.access = non_empty(access);
        }
        if let Some(access_type) = patch.access_type {
            self.access_type = non_empty(access_type);
        }
        if let Some(instructions) = patch.instructions {
            self.instructions = non_empty(instructions);
        }
    }

    fn stamp_created(&mut self, now: Timestamp) {
        self.created_at = Some(now);
        self.timestamp = Some(now);
    }

    fn stamp_updated(&mut self, previous: &Self, now: Timestamp) {
        self.created_at = previous.created_at;
        self.timestamp = Some(now);
    }
}

/// A link as recovered from an import file, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkCandidate {
    pub name: String,
    pub production: String,
    pub staging: Option<String>,
    pub integration: Option<String>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
}

impl LinkCandidate {
    /// Builds the link to store under `category`.
    pub fn into_link(self, category: impl Into<String>) -> Link {
        Link {
            name: self.name.trim().to_string(),
            environments: Environments {
                production: self.production.trim().to_string(),
                staging: self.staging.and_then(non_empty),
                integration: self.integration.and_then(non_empty),
            },
            category: category.into(),
            tags: self.tags,
            description: self.description.and_then(non_empty),
            color: self.color.and_then(non_empty),
            access: None,
            access_type: None,
            instructions: None,
            created_at: None,
            timestamp: None,
        }
    }
}
