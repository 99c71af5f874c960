use crate::collection::{Collection, ReadPolicy};
use crate::seed::Seed;
use crate::settings::SettingsDocument;
use linkdir_core::{Category, DocumentStore, Link, Resource, Result, Settings, Tag};
use std::sync::Arc;
use tracing::info;

/// The four documents of one directory, sharing a backend.
///
/// Operations spanning several documents must lock them in [`Resource::ALL`]
/// order: links, categories, tags, settings.
#[derive(Debug, Clone)]
pub struct Store {
    pub links: Collection<Link>,
    pub categories: Collection<Category>,
    pub tags: Collection<Tag>,
    pub settings: SettingsDocument,
}

impl Store {
    pub fn new(backend: Arc<dyn DocumentStore>, policy: ReadPolicy) -> Self {
        Self {
            links: Collection::new(Arc::clone(&backend), policy),
            categories: Collection::new(Arc::clone(&backend), policy),
            tags: Collection::new(Arc::clone(&backend), policy),
            settings: SettingsDocument::new(backend, policy),
        }
    }

    /// Creates every missing document from `seed` and returns which ones
    /// were written. Existing documents are left untouched.
    pub async fn bootstrap(&self, seed: &Seed) -> Result<Vec<Resource>> {
        let mut created = Vec::new();
        if self.links.initialize(seed.document(Resource::Links)).await? {
            created.push(Resource::Links);
        }
        if self
            .categories
            .initialize(seed.document(Resource::Categories))
            .await?
        {
            created.push(Resource::Categories);
        }
        if self.tags.initialize(seed.document(Resource::Tags)).await? {
            created.push(Resource::Tags);
        }
        if self
            .settings
            .initialize(seed.document(Resource::Settings))
            .await?
        {
            created.push(Resource::Settings);
        }

        if !created.is_empty() {
            info!(?created, "initialized missing documents");
        }
        Ok(created)
    }

    /// Empties every collection and restores the settings template.
    pub async fn reset_all(&self) -> Result<Settings> {
        let links = self.links.lock().await;
        let categories = self.categories.lock().await;
        let tags = self.tags.lock().await;
        let _settings = self.settings.lock().await;

        links.write(Vec::new()).await?;
        categories.write(Vec::new()).await?;
        tags.write(Vec::new()).await?;
        let settings = self.settings.reset().await?;

        info!("reset all directory data");
        Ok(settings)
    }
}
