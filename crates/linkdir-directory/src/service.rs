use crate::config::{DirectoryConfig, RenamePolicy};
use linkdir_core::{
    Category, CategoryPatch, DirectoryError, Entity, EntityKind, Link, LinkPatch, Resource,
    Result, Revision, Settings, Tag, TagPatch, Validate, DEFAULT_CATEGORY,
};
use linkdir_core::query::calculate_link_counts;
use linkdir_storage::{apply_patch, check_revision, Seed, Snapshot, Store};
use jiff::Timestamp;
use tracing::{info, warn};

/// Maps a requested category name onto the canonical stored name.
///
/// Matching ignores case. Blank and unknown names resolve to
/// [`DEFAULT_CATEGORY`].
pub fn resolve_category(categories: &[Category], requested: &str) -> String {
    let requested = requested.trim();
    if requested.is_empty() {
        return DEFAULT_CATEGORY.to_string();
    }
    match categories
        .iter()
        .find(|category| Category::same_key(&category.name, requested))
    {
        Some(category) => category.name.clone(),
        None => {
            if !Category::same_key(requested, DEFAULT_CATEGORY) {
                warn!(category = requested, "unknown category, using default");
            }
            DEFAULT_CATEGORY.to_string()
        }
    }
}

/// Directory operations over the link, category, tag and settings documents.
///
/// This is the only place that mutates more than one document at a time.
/// Every operation that touches links takes the links lock first, so
/// category and tag changes that cascade into links are serialized with
/// link edits.
#[derive(Debug, Clone)]
pub struct DirectoryService {
    pub(crate) store: Store,
    pub(crate) config: DirectoryConfig,
}

impl DirectoryService {
    pub fn new(store: Store, config: DirectoryConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn config(&self) -> &DirectoryConfig {
        &self.config
    }

    /// Creates whichever documents are missing. Returns the ones created.
    pub async fn bootstrap(&self, seed: &Seed) -> Result<Vec<Resource>> {
        self.store.bootstrap(seed).await
    }

    pub async fn list_links(&self) -> Result<Snapshot<Link>> {
        self.store.links.list().await
    }

    pub async fn create_link(&self, mut link: Link) -> Result<Link> {
        let links = self.store.links.lock().await;
        let categories = self.store.categories.list().await?;
        link.category = resolve_category(&categories.items, &link.category);
        link.validate()?;

        let mut snapshot = links.read().await?;
        if snapshot.key_taken(&link.name, None) {
            return Err(DirectoryError::duplicate(EntityKind::Link, &link.name));
        }
        link.stamp_created(Timestamp::now());
        snapshot.items.push(link.clone());
        links.write(snapshot.items).await?;

        info!(name = %link.name, category = %link.category, "created link");
        Ok(link)
    }

    pub async fn update_link(
        &self,
        name: &str,
        mut patch: LinkPatch,
        expected: Option<Revision>,
    ) -> Result<Link> {
        let links = self.store.links.lock().await;
        let mut snapshot = links.read().await?;
        check_revision(Resource::Links, snapshot.revision, expected)?;

        if let Some(category) = patch.category.take() {
            let categories = self.store.categories.list().await?;
            patch.category = Some(resolve_category(&categories.items, &category));
        }
        let updated = apply_patch(&mut snapshot, name, patch)?;
        links.write(snapshot.items).await?;

        info!(name, new_name = %updated.name, "updated link");
        Ok(updated)
    }

    pub async fn delete_link(&self, name: &str, expected: Option<Revision>) -> Result<Link> {
        let removed = self.store.links.remove(name, expected).await?;
        info!(name = %removed.name, "deleted link");
        Ok(removed)
    }

    /// Categories with `linkCount` recomputed from the current links.
    pub async fn list_categories(&self) -> Result<Snapshot<Category>> {
        let mut categories = self.store.categories.list().await?;
        let links = self.store.links.list().await?;
        let counts = calculate_link_counts(&categories.items, &links.items);
        for category in &mut categories.items {
            category.link_count = counts.get(&category.name).copied();
        }
        Ok(categories)
    }

    pub async fn create_category(&self, category: Category) -> Result<Category> {
        let created = self.store.categories.create(category).await?;
        info!(name = %created.name, "created category");
        Ok(created)
    }

    /// Applies `patch` to a category. A rename is propagated to links
    /// according to the configured [`RenamePolicy`].
    ///
    /// A cascade writes links before categories. If the category write
    /// fails the old category is still stored, so repeating the same edit
    /// finds no links left to move and completes the rename.
    pub async fn edit_category(
        &self,
        name: &str,
        patch: CategoryPatch,
        expected: Option<Revision>,
    ) -> Result<Category> {
        let links = self.store.links.lock().await;
        let categories = self.store.categories.lock().await;
        let mut snapshot = categories.read().await?;
        check_revision(Resource::Categories, snapshot.revision, expected)?;

        let old_name = snapshot
            .get(name)
            .map(|category| category.name.clone())
            .ok_or_else(|| DirectoryError::not_found(EntityKind::Category, name))?;
        let updated = apply_patch(&mut snapshot, name, patch)?;

        if updated.name != old_name {
            let mut link_snapshot = links.read().await?;
            let dependents: Vec<&mut Link> = link_snapshot
                .items
                .iter_mut()
                .filter(|link| Category::same_key(&link.category, &old_name))
                .collect();
            let count = dependents.len();

            match self.config.rename_policy {
                RenamePolicy::Cascade => {
                    if count > 0 {
                        for link in dependents {
                            link.category = updated.name.clone();
                        }
                        links.write(link_snapshot.items).await?;
                    }
                    info!(from = %old_name, to = %updated.name, links = count, "renamed category");
                }
                RenamePolicy::Preserve => {
                    if count > 0 {
                        warn!(
                            from = %old_name,
                            to = %updated.name,
                            links = count,
                            "renamed category, links still reference the old name"
                        );
                    }
                }
            }
        }

        categories.write(snapshot.items).await?;
        Ok(updated)
    }

    /// Deletes a category. Links filed under it block the deletion unless
    /// `delete_links` is set, in which case they are deleted too.
    ///
    /// Returns how many links were deleted.
    pub async fn delete_category(
        &self,
        name: &str,
        delete_links: bool,
        expected: Option<Revision>,
    ) -> Result<usize> {
        let links = self.store.links.lock().await;
        let categories = self.store.categories.lock().await;
        let mut snapshot = categories.read().await?;
        check_revision(Resource::Categories, snapshot.revision, expected)?;

        let index = snapshot
            .position(name)
            .ok_or_else(|| DirectoryError::not_found(EntityKind::Category, name))?;
        let canonical = snapshot.items[index].name.clone();

        let mut link_snapshot = links.read().await?;
        let count = link_snapshot
            .items
            .iter()
            .filter(|link| Category::same_key(&link.category, &canonical))
            .count();
        if count > 0 && !delete_links {
            return Err(DirectoryError::HasDependents {
                kind: EntityKind::Category,
                key: canonical,
                count,
            });
        }

        if count > 0 {
            link_snapshot
                .items
                .retain(|link| !Category::same_key(&link.category, &canonical));
            links.write(link_snapshot.items).await?;
        }
        snapshot.items.remove(index);
        categories.write(snapshot.items).await?;

        info!(name = %canonical, deleted_links = count, "deleted category");
        Ok(count)
    }

    pub async fn list_tags(&self) -> Result<Snapshot<Tag>> {
        self.store.tags.list().await
    }

    pub async fn create_tag(&self, tag: Tag) -> Result<Tag> {
        let created = self.store.tags.create(tag).await?;
        info!(name = %created.name, "created tag");
        Ok(created)
    }

    /// Renames a tag, propagating to links per the [`RenamePolicy`].
    /// Links are written before tags, as in [`Self::edit_category`].
    pub async fn edit_tag(
        &self,
        name: &str,
        patch: TagPatch,
        expected: Option<Revision>,
    ) -> Result<Tag> {
        let links = self.store.links.lock().await;
        let tags = self.store.tags.lock().await;
        let mut snapshot = tags.read().await?;
        check_revision(Resource::Tags, snapshot.revision, expected)?;

        let old_name = snapshot
            .get(name)
            .map(|tag| tag.name.clone())
            .ok_or_else(|| DirectoryError::not_found(EntityKind::Tag, name))?;
        let updated = apply_patch(&mut snapshot, name, patch)?;

        if updated.name != old_name {
            let mut link_snapshot = links.read().await?;
            let mut count = 0;
            for link in &mut link_snapshot.items {
                if !link.tags.iter().any(|tag| Tag::same_key(tag, &old_name)) {
                    continue;
                }
                count += 1;
                if self.config.rename_policy == RenamePolicy::Cascade {
                    link.tags = rename_tag(std::mem::take(&mut link.tags), &old_name, &updated.name);
                }
            }

            match self.config.rename_policy {
                RenamePolicy::Cascade => {
                    if count > 0 {
                        links.write(link_snapshot.items).await?;
                    }
                    info!(from = %old_name, to = %updated.name, links = count, "renamed tag");
                }
                RenamePolicy::Preserve if count > 0 => {
                    warn!(
                        from = %old_name,
                        to = %updated.name,
                        links = count,
                        "renamed tag, links still carry the old name"
                    );
                }
                RenamePolicy::Preserve => {}
            }
        }

        tags.write(snapshot.items).await?;
        Ok(updated)
    }

    /// Deletes a tag. Links carrying it block the deletion unless
    /// `delete_links` is set, in which case the tag is stripped from them;
    /// the links themselves are kept.
    ///
    /// Returns how many links were modified.
    pub async fn delete_tag(
        &self,
        name: &str,
        delete_links: bool,
        expected: Option<Revision>,
    ) -> Result<usize> {
        let links = self.store.links.lock().await;
        let tags = self.store.tags.lock().await;
        let mut snapshot = tags.read().await?;
        check_revision(Resource::Tags, snapshot.revision, expected)?;

        let index = snapshot
            .position(name)
            .ok_or_else(|| DirectoryError::not_found(EntityKind::Tag, name))?;
        let canonical = snapshot.items[index].name.clone();

        let mut link_snapshot = links.read().await?;
        let carries = |link: &Link| link.tags.iter().any(|tag| Tag::same_key(tag, &canonical));
        let count = link_snapshot.items.iter().filter(|link| carries(link)).count();
        if count > 0 && !delete_links {
            return Err(DirectoryError::HasDependents {
                kind: EntityKind::Tag,
                key: canonical,
                count,
            });
        }

        if count > 0 {
            for link in &mut link_snapshot.items {
                link.tags.retain(|tag| !Tag::same_key(tag, &canonical));
            }
            links.write(link_snapshot.items).await?;
        }
        snapshot.items.remove(index);
        tags.write(snapshot.items).await?;

        info!(name = %canonical, stripped_links = count, "deleted tag");
        Ok(count)
    }

    pub async fn settings(&self) -> Result<(Settings, Revision)> {
        self.store.settings.get().await
    }

    pub async fn replace_settings(
        &self,
        settings: Settings,
        expected: Option<Revision>,
    ) -> Result<Revision> {
        let revision = self.store.settings.replace(settings, expected).await?;
        info!(%revision, "replaced settings");
        Ok(revision)
    }

    /// Deletes every link, category and tag and restores default settings.
    pub async fn reset_all(&self) -> Result<Settings> {
        self.store.reset_all().await
    }
}

/// Replaces `from` with `to` in a tag list, dropping the duplicate if the
/// link already carried `to`.
fn rename_tag(tags: Vec<String>, from: &str, to: &str) -> Vec<String> {
    let mut renamed: Vec<String> = Vec::with_capacity(tags.len());
    for tag in tags {
        let tag = if Tag::same_key(&tag, from) {
            to.to_string()
        } else {
            tag
        };
        if !renamed.iter().any(|existing| Tag::same_key(existing, &tag)) {
            renamed.push(tag);
        }
    }
    renamed
}
