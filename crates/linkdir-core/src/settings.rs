//! The singleton application configuration document.

use crate::error::ValidationError;
use crate::link::Environment;
use crate::validate::{check_length, check_optional_length, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub general: GeneralSettings,
    pub environments: Vec<EnvironmentDisplay>,
    #[serde(default)]
    pub link_requests: LinkRequestSettings,
    #[serde(default)]
    pub features: FeatureToggles,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    pub app_name: String,
    #[serde(default)]
    pub description: String,
}

/// How one environment is shown; list position is display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentDisplay {
    pub id: Environment,
    pub label: String,
    #[serde(default = "visible")]
    pub visible: bool,
}

fn visible() -> bool {
    true
}

/// Channels through which users may request new links.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRequestSettings {
    #[serde(default)]
    pub github: GithubChannel,
    #[serde(default)]
    pub email: EmailChannel,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GithubChannel {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailChannel {
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureToggles {
    pub favorites: bool,
    pub archive: bool,
    pub recent_links: bool,
    pub import_export: bool,
}

impl Default for FeatureToggles {
    fn default() -> Self {
        Self {
            favorites: true,
            archive: true,
            recent_links: true,
            import_export: true,
        }
    }
}

/// The template a fresh installation starts from.
impl Default for Settings {
    fn default() -> Self {
        Self {
            general: GeneralSettings {
                app_name: "Link Directory".to_string(),
                description: "Bookmarks for every environment".to_string(),
            },
            environments: vec![
                EnvironmentDisplay {
                    id: Environment::Production,
                    label: "Production".to_string(),
                    visible: true,
                },
                EnvironmentDisplay {
                    id: Environment::Staging,
                    label: "Staging".to_string(),
                    visible: true,
                },
                EnvironmentDisplay {
                    id: Environment::Integration,
                    label: "Integration".to_string(),
                    visible: true,
                },
            ],
            link_requests: LinkRequestSettings::default(),
            features: FeatureToggles::default(),
        }
    }
}

fn require(errors: &mut ValidationError, field: &str, value: Option<&str>) {
    if value.map_or(true, |v| v.trim().is_empty()) {
        errors.push(field, "is required when the channel is enabled");
    }
}

impl Validate for GithubChannel {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        if self.enabled {
            require(&mut errors, "owner", self.owner.as_deref());
            require(&mut errors, "repo", self.repo.as_deref());
            require(&mut errors, "template", self.template.as_deref());
        }
        errors.into_result()
    }
}

impl Validate for EmailChannel {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();
        if self.enabled {
            require(&mut errors, "address", self.address.as_deref());
        }
        if let Some(address) = self.address.as_deref().filter(|a| !a.trim().is_empty()) {
            if !address.contains('@') {
                errors.push("address", "must be an email address");
            }
        }
        errors.into_result()
    }
}

impl Validate for Settings {
    fn validate(&self) -> Result<(), ValidationError> {
        let mut errors = ValidationError::new();

        check_length(&mut errors, "general.appName", &self.general.app_name, 1, 80);
        check_optional_length(
            &mut errors,
            "general.description",
            Some(self.general.description.as_str()),
            300,
        );

        let mut seen = HashSet::new();
        for display in &self.environments {
            if !seen.insert(display.id) {
                errors.push("environments", format!("duplicate environment: {}", display.id));
            }
            check_length(&mut errors, "environments.label", &display.label, 1, 40);
        }
        if !seen.contains(&Environment::Production) {
            errors.push("environments", "production must be listed");
        }

        if let Err(nested) = self.link_requests.github.validate() {
            errors.extend(nested.nested("linkRequests.github"));
        }
        if let Err(nested) = self.link_requests.email.validate() {
            errors.extend(nested.nested("linkRequests.email"));
        }

        errors.into_result()
    }
}
