//! Batch import of parsed link candidates.

use crate::config::{DuplicatePolicy, ImportOptions};
use crate::service::DirectoryService;
use jiff::Timestamp;
use linkdir_core::{
    Category, Entity, Link, LinkCandidate, LinkPatch, Result, Validate, DEFAULT_CATEGORY,
};
use serde::Serialize;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureReason {
    Duplicate,
    Invalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedImport {
    pub name: String,
    pub url: String,
    pub reason: FailureReason,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportSuccess {
    pub added: Vec<String>,
    pub updated: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportCategories {
    #[serde(rename = "new")]
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

/// Per-record outcome of a batch import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ImportResult {
    pub success: ImportSuccess,
    pub failed: Vec<FailedImport>,
    pub categories: ImportCategories,
    /// Rows or anchors the parser discarded before import.
    pub dropped: usize,
}

enum CategoryChoice {
    Existing(String),
    New(Category),
}

impl CategoryChoice {
    fn name(&self) -> &str {
        match self {
            CategoryChoice::Existing(name) => name,
            CategoryChoice::New(category) => &category.name,
        }
    }
}

fn choose_category(known: &[Category], requested: Option<&str>) -> CategoryChoice {
    let requested = requested
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .unwrap_or(DEFAULT_CATEGORY);
    let find = |name: &str| {
        known
            .iter()
            .find(|category| Category::same_key(&category.name, name))
            .map(|category| CategoryChoice::Existing(category.name.clone()))
    };

    if let Some(existing) = find(requested) {
        return existing;
    }
    let fresh = Category::new(requested);
    if fresh.validate().is_ok() {
        return CategoryChoice::New(fresh);
    }
    debug!(category = requested, "invalid category name, using default");
    find(DEFAULT_CATEGORY).unwrap_or_else(|| CategoryChoice::New(Category::new(DEFAULT_CATEGORY)))
}

/// Fields an import may change on an already stored link. Absent values in
/// the candidate leave the stored ones alone.
fn merge_patch(stored: &Link, incoming: Link, category_given: bool) -> LinkPatch {
    let mut environments = stored.environments.clone();
    environments.production = incoming.environments.production;
    if let Some(url) = incoming.environments.staging {
        environments.staging = Some(url);
    }
    if let Some(url) = incoming.environments.integration {
        environments.integration = Some(url);
    }

    LinkPatch {
        environments: Some(environments),
        category: category_given.then_some(incoming.category),
        tags: Some(incoming.tags).filter(|tags| !tags.is_empty()),
        description: incoming.description,
        color: incoming.color,
        ..Default::default()
    }
}

impl ImportResult {
    fn fail(&mut self, name: String, url: String, reason: FailureReason, detail: Option<String>) {
        self.failed.push(FailedImport {
            name,
            url,
            reason,
            detail,
        });
    }

    fn record_category(&mut self, name: &str) {
        if !self.categories.created.iter().any(|n| n == name)
            && !self.categories.existing.iter().any(|n| n == name)
        {
            self.categories.existing.push(name.to_string());
        }
    }
}

impl DirectoryService {
    /// Imports every candidate independently: one failing record never
    /// aborts the batch.
    ///
    /// Categories named by accepted candidates are created when unknown.
    /// The returned `dropped` count is zero; callers that parsed the
    /// candidates fill it in.
    pub async fn import_links(
        &self,
        candidates: Vec<LinkCandidate>,
        options: ImportOptions,
    ) -> Result<ImportResult> {
        let links = self.store.links.lock().await;
        let categories = self.store.categories.lock().await;
        let mut link_snapshot = links.read().await?;
        let mut category_snapshot = categories.read().await?;

        let mut result = ImportResult::default();
        let now = Timestamp::now();

        for candidate in candidates {
            let url = candidate.production.trim().to_string();
            let category_given = candidate
                .category
                .as_deref()
                .is_some_and(|name| !name.trim().is_empty());
            let choice = choose_category(&category_snapshot.items, candidate.category.as_deref());
            let mut link = candidate.into_link(choice.name());

            if let Err(issues) = link.validate() {
                result.fail(link.name, url, FailureReason::Invalid, Some(issues.to_string()));
                continue;
            }

            let keeps_category = match link_snapshot.position(&link.name) {
                Some(_) if options.duplicates == DuplicatePolicy::Skip => {
                    result.fail(link.name, url, FailureReason::Duplicate, None);
                    continue;
                }
                Some(index) => {
                    let name = link.name.clone();
                    let stored = &link_snapshot.items[index];
                    let mut merged = stored.clone();
                    merged.apply(merge_patch(stored, link, category_given));
                    if let Err(issues) = merged.validate() {
                        result.fail(name, url, FailureReason::Invalid, Some(issues.to_string()));
                        continue;
                    }
                    merged.stamp_updated(stored, now);
                    link_snapshot.items[index] = merged;
                    result.success.updated.push(name);
                    !category_given
                }
                None => {
                    link.stamp_created(now);
                    result.success.added.push(link.name.clone());
                    link_snapshot.items.push(link);
                    false
                }
            };
            if keeps_category {
                continue;
            }

            match choice {
                CategoryChoice::Existing(name) => result.record_category(&name),
                CategoryChoice::New(category) => {
                    result.categories.created.push(category.name.clone());
                    category_snapshot.items.push(category);
                }
            }
        }

        if !result.categories.created.is_empty() {
            categories.write(category_snapshot.items).await?;
        }
        if !result.success.added.is_empty() || !result.success.updated.is_empty() {
            links.write(link_snapshot.items).await?;
        }

        info!(
            added = result.success.added.len(),
            updated = result.success.updated.len(),
            failed = result.failed.len(),
            new_categories = result.categories.created.len(),
            "imported links"
        );
        Ok(result)
    }
}
