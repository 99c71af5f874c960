use jiff::Timestamp;
use linkdir_core::{
    DirectoryError, DocumentStore, Entity, ReadOutcome, Resource, Result, Revision, StorageError,
    ValidationError,
};
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, error};

/// What [`Collection::list`] does with a document that is not valid JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadPolicy {
    /// Log the problem and list nothing.
    #[default]
    Degrade,
    /// Fail the read with [`StorageError::Corrupt`].
    Strict,
}

/// Result of decoding one stored document.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadOutcome<T> {
    Loaded(T),
    Missing,
    Corrupt(String),
}

/// Records of one collection as read at `revision`.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot<E> {
    pub items: Vec<E>,
    pub revision: Revision,
}

impl<E: Entity> Snapshot<E> {
    /// Index of the record addressed by `key`, preferring an exact match.
    pub fn position(&self, key: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|item| item.key() == key)
            .or_else(|| self.items.iter().position(|item| E::same_key(item.key(), key)))
    }

    pub fn get(&self, key: &str) -> Option<&E> {
        self.position(key).map(|index| &self.items[index])
    }

    /// Whether any record other than the one at `except` uses `key`.
    pub fn key_taken(&self, key: &str, except: Option<usize>) -> bool {
        self.items
            .iter()
            .enumerate()
            .any(|(index, item)| Some(index) != except && E::same_key(item.key(), key))
    }
}

/// Fails with `StaleRevision` when the caller's view is out of date.
pub fn check_revision(
    resource: Resource,
    actual: Revision,
    expected: Option<Revision>,
) -> Result<()> {
    match expected {
        Some(expected) if expected != actual => Err(DirectoryError::StaleRevision {
            resource,
            expected,
            actual,
        }),
        _ => Ok(()),
    }
}

pub(crate) fn encode<T: Serialize + ?Sized>(resource: Resource, value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| {
        DirectoryError::from(StorageError::Serialization {
            resource,
            detail: e.to_string(),
        })
    })
}

/// Typed CRUD over the JSON array resource of one entity kind.
///
/// Every mutation holds the collection's lock from the read to the write, so
/// two writers in this process never interleave. Writers that read earlier,
/// e.g. through an HTTP round-trip, pass the revision they saw and are
/// rejected if the document changed since.
pub struct Collection<E> {
    backend: Arc<dyn DocumentStore>,
    lock: Arc<Mutex<()>>,
    policy: ReadPolicy,
    _entity: PhantomData<fn() -> E>,
}

impl<E> Clone for Collection<E> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            lock: Arc::clone(&self.lock),
            policy: self.policy,
            _entity: PhantomData,
        }
    }
}

impl<E> std::fmt::Debug for Collection<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl<E: Entity> Collection<E> {
    pub fn new(backend: Arc<dyn DocumentStore>, policy: ReadPolicy) -> Self {
        Self {
            backend,
            lock: Arc::new(Mutex::new(())),
            policy,
            _entity: PhantomData,
        }
    }

    pub fn resource(&self) -> Resource {
        E::RESOURCE
    }

    /// Reads and decodes the document without applying the read policy.
    pub async fn load(&self) -> Result<(LoadOutcome<Vec<E>>, Revision)> {
        match self.backend.read(E::RESOURCE).await {
            Ok(ReadOutcome::Missing) => Ok((LoadOutcome::Missing, Revision::MISSING)),
            Ok(ReadOutcome::Loaded(raw)) => {
                let revision = Revision::of(&raw);
                Ok((decode::<E>(&raw)?, revision))
            }
            // unreadable bytes are as corrupt as broken JSON
            Err(StorageError::Corrupt { detail, .. }) => {
                Ok((LoadOutcome::Corrupt(detail), Revision::MISSING))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// All records, ordered for display.
    ///
    /// A missing document lists as empty. A document that is not JSON is
    /// handled according to the [`ReadPolicy`]; one that parses but breaks
    /// the schema always fails with a validation error.
    pub async fn list(&self) -> Result<Snapshot<E>> {
        let (outcome, revision) = self.load().await?;
        let mut items = match outcome {
            LoadOutcome::Loaded(items) => items,
            LoadOutcome::Missing => Vec::new(),
            LoadOutcome::Corrupt(detail) => match self.policy {
                ReadPolicy::Degrade => {
                    error!(resource = %E::RESOURCE, %detail, "corrupt document, listing as empty");
                    Vec::new()
                }
                ReadPolicy::Strict => {
                    return Err(StorageError::Corrupt {
                        resource: E::RESOURCE,
                        detail,
                    }
                    .into())
                }
            },
        };
        E::order(&mut items);
        Ok(Snapshot { items, revision })
    }

    /// Waits for exclusive write access to the collection.
    pub async fn lock(&self) -> CollectionGuard<'_, E> {
        CollectionGuard {
            collection: self,
            _permit: self.lock.lock().await,
        }
    }

    pub async fn create(&self, mut candidate: E) -> Result<E> {
        candidate.validate()?;

        let guard = self.lock().await;
        let mut snapshot = guard.read().await?;
        if snapshot.key_taken(candidate.key(), None) {
            return Err(DirectoryError::duplicate(E::KIND, candidate.key()));
        }

        candidate.stamp_created(Timestamp::now());
        snapshot.items.push(candidate.clone());
        guard.write(snapshot.items).await?;

        debug!(kind = %E::KIND, key = %candidate.key(), "created record");
        Ok(candidate)
    }

    /// Merges `patch` onto the record addressed by `key`.
    pub async fn update(
        &self,
        key: &str,
        patch: E::Patch,
        expected: Option<Revision>,
    ) -> Result<E> {
        let guard = self.lock().await;
        let mut snapshot = guard.read().await?;
        check_revision(E::RESOURCE, snapshot.revision, expected)?;

        let updated = apply_patch(&mut snapshot, key, patch)?;
        guard.write(snapshot.items).await?;

        debug!(kind = %E::KIND, key, new_key = %updated.key(), "updated record");
        Ok(updated)
    }

    /// Removes the record addressed by `key` and returns it.
    pub async fn remove(&self, key: &str, expected: Option<Revision>) -> Result<E> {
        let guard = self.lock().await;
        let mut snapshot = guard.read().await?;
        check_revision(E::RESOURCE, snapshot.revision, expected)?;

        let index = snapshot
            .position(key)
            .ok_or_else(|| DirectoryError::not_found(E::KIND, key))?;
        let removed = snapshot.items.remove(index);
        guard.write(snapshot.items).await?;

        debug!(kind = %E::KIND, key, "removed record");
        Ok(removed)
    }

    /// Replaces the whole document with `items`.
    pub async fn persist(&self, items: Vec<E>) -> Result<Revision> {
        let guard = self.lock().await;
        guard.write(items).await
    }

    /// Writes `seed` (or an empty array) if the document does not exist yet.
    /// Returns whether anything was written.
    pub async fn initialize(&self, seed: Option<&str>) -> Result<bool> {
        let guard = self.lock().await;
        if self.backend.exists(E::RESOURCE).await? {
            return Ok(false);
        }
        let items = match seed.map(decode::<E>).transpose()? {
            Some(LoadOutcome::Loaded(items)) => items,
            Some(LoadOutcome::Corrupt(detail)) => {
                return Err(StorageError::Corrupt {
                    resource: E::RESOURCE,
                    detail: format!("seed document: {detail}"),
                }
                .into())
            }
            Some(LoadOutcome::Missing) | None => Vec::new(),
        };
        guard.write(items).await?;
        Ok(true)
    }
}

/// Merges a patch onto the record at `key` inside `snapshot`, enforcing key
/// uniqueness and the schema, and returns the merged record.
pub fn apply_patch<E: Entity>(snapshot: &mut Snapshot<E>, key: &str, patch: E::Patch) -> Result<E> {
    let index = snapshot
        .position(key)
        .ok_or_else(|| DirectoryError::not_found(E::KIND, key))?;

    if let Some(new_key) = E::patched_key(&patch) {
        if snapshot.key_taken(new_key, Some(index)) {
            return Err(DirectoryError::duplicate(E::KIND, new_key));
        }
    }

    let previous = &snapshot.items[index];
    let mut merged = previous.clone();
    merged.apply(patch);
    merged.validate()?;
    merged.stamp_updated(previous, Timestamp::now());

    snapshot.items[index] = merged.clone();
    Ok(merged)
}

/// Exclusive access to one collection for a read-modify-write cycle.
pub struct CollectionGuard<'a, E> {
    collection: &'a Collection<E>,
    _permit: MutexGuard<'a, ()>,
}

impl<E: Entity> CollectionGuard<'_, E> {
    /// Current records in storage order.
    ///
    /// Unlike [`Collection::list`] a corrupt document always fails here, so a
    /// mutation never overwrites data it could not read.
    pub async fn read(&self) -> Result<Snapshot<E>> {
        match self.collection.load().await? {
            (LoadOutcome::Loaded(items), revision) => Ok(Snapshot { items, revision }),
            (LoadOutcome::Missing, revision) => Ok(Snapshot {
                items: Vec::new(),
                revision,
            }),
            (LoadOutcome::Corrupt(detail), _) => Err(StorageError::Corrupt {
                resource: E::RESOURCE,
                detail,
            }
            .into()),
        }
    }

    /// Replaces the whole document and returns its new revision.
    pub async fn write(&self, mut items: Vec<E>) -> Result<Revision> {
        items.iter_mut().for_each(E::prepare_for_storage);
        let contents = encode(E::RESOURCE, &items)?;
        self.collection
            .backend
            .write(E::RESOURCE, &contents)
            .await?;
        Ok(Revision::of(&contents))
    }
}

/// Parses a raw document: JSON syntax errors are `Corrupt`, shape and
/// constraint errors are validation errors.
pub(crate) fn decode<E: Entity>(raw: &str) -> Result<LoadOutcome<Vec<E>>> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return Ok(LoadOutcome::Corrupt(e.to_string())),
    };

    let items: Vec<E> = serde_json::from_value(value).map_err(|e| {
        ValidationError::single(E::RESOURCE.as_str(), e.to_string())
    })?;

    let mut errors = ValidationError::new();
    for (index, item) in items.iter().enumerate() {
        if let Err(issues) = item.validate() {
            errors.extend(issues.nested(&format!("{}[{index}]", E::RESOURCE.as_str())));
        }
    }
    errors.into_result()?;

    Ok(LoadOutcome::Loaded(items))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryStore;
    use linkdir_core::{Category, CategoryPatch, Environments, Link, LinkPatch, Tag};

    fn links(store: &Arc<InMemoryStore>) -> Collection<Link> {
        Collection::new(Arc::clone(store) as Arc<dyn DocumentStore>, ReadPolicy::Degrade)
    }

    fn link(name: &str) -> Link {
        Link::builder()
            .name(name)
            .environments(Environments::production("https://example.com"))
            .build()
    }

    #[tokio::test]
    async fn create_then_list() {
        let store = Arc::new(InMemoryStore::new());
        let collection = links(&store);

        let created = collection.create(link("Docs")).await.unwrap();
        assert!(created.created_at.is_some());
        assert_eq!(created.created_at, created.timestamp);

        let listed = collection.list().await.unwrap();
        assert_eq!(listed.items, vec![created]);
    }

    #[tokio::test]
    async fn create_duplicate_leaves_document_untouched() {
        let store = Arc::new(InMemoryStore::new());
        let collection = links(&store);
        collection.create(link("Docs")).await.unwrap();
        let before = store.document(Resource::Links);

        let err = collection.create(link("Docs")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateKey { .. }));
        assert_eq!(store.document(Resource::Links), before);
    }

    #[tokio::test]
    async fn link_names_are_case_sensitive() {
        let store = Arc::new(InMemoryStore::new());
        let collection = links(&store);
        collection.create(link("Docs")).await.unwrap();
        collection.create(link("docs")).await.unwrap();
        assert_eq!(collection.list().await.unwrap().items.len(), 2);
    }

    #[tokio::test]
    async fn create_invalid_is_rejected_before_writing() {
        let store = Arc::new(InMemoryStore::new());
        let collection = links(&store);

        let err = collection.create(link("")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));
        assert!(store.document(Resource::Links).is_none());
    }

    #[tokio::test]
    async fn update_merges_and_refreshes_timestamp() {
        let store = Arc::new(InMemoryStore::new());
        let collection = links(&store);
        let created = collection.create(link("Docs")).await.unwrap();

        let updated = collection
            .update(
                "Docs",
                LinkPatch {
                    description: Some("Team docs".into()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();

        assert_eq!(updated.description.as_deref(), Some("Team docs"));
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.timestamp >= created.timestamp);
    }

    #[tokio::test]
    async fn update_unknown_key_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let err = links(&store)
            .update("Ghost", LinkPatch::default(), None)
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn rename_onto_existing_key_is_duplicate() {
        let store = Arc::new(InMemoryStore::new());
        let collection = links(&store);
        collection.create(link("A")).await.unwrap();
        collection.create(link("B")).await.unwrap();

        let err = collection
            .update(
                "A",
                LinkPatch {
                    name: Some("B".into()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateKey { .. }));
    }

    #[tokio::test]
    async fn update_rejecting_merged_result_keeps_stored_record() {
        let store = Arc::new(InMemoryStore::new());
        let collection = links(&store);
        collection.create(link("A")).await.unwrap();

        let err = collection
            .update(
                "A",
                LinkPatch {
                    environments: Some(Environments::production("not a url")),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, DirectoryError::Validation(_)));
        let stored = collection.list().await.unwrap();
        assert_eq!(stored.items[0].environments.production, "https://example.com");
    }

    #[tokio::test]
    async fn stale_revision_is_rejected() {
        let store = Arc::new(InMemoryStore::new());
        let collection = links(&store);
        collection.create(link("A")).await.unwrap();
        let seen = collection.list().await.unwrap().revision;

        collection.create(link("B")).await.unwrap();

        let err = collection.remove("A", Some(seen)).await.unwrap_err();
        assert!(matches!(err, DirectoryError::StaleRevision { .. }));

        let fresh = collection.list().await.unwrap().revision;
        collection.remove("A", Some(fresh)).await.unwrap();
    }

    #[tokio::test]
    async fn remove_unknown_key_is_not_found() {
        let store = Arc::new(InMemoryStore::new());
        let err = links(&store).remove("Ghost", None).await.unwrap_err();
        assert!(matches!(err, DirectoryError::NotFound { .. }));
    }

    #[tokio::test]
    async fn corrupt_document_degrades_on_list_only() {
        let store = Arc::new(InMemoryStore::new().with_document(Resource::Links, "{not json"));
        let collection = links(&store);

        assert!(collection.list().await.unwrap().items.is_empty());

        let err = collection.create(link("A")).await.unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::Storage(StorageError::Corrupt { .. })
        ));
        assert_eq!(store.document(Resource::Links).as_deref(), Some("{not json"));
    }

    #[tokio::test]
    async fn corrupt_document_fails_under_strict_policy() {
        let store = Arc::new(InMemoryStore::new().with_document(Resource::Links, "{not json"));
        let collection: Collection<Link> =
            Collection::new(store as Arc<dyn DocumentStore>, ReadPolicy::Strict);

        let err = collection.list().await.unwrap_err();
        assert!(matches!(
            err,
            DirectoryError::Storage(StorageError::Corrupt { .. })
        ));
    }

    #[tokio::test]
    async fn schema_violation_is_a_validation_error() {
        let store = Arc::new(
            InMemoryStore::new()
                .with_document(Resource::Links, r#"[{"name":"A","environments":{"production":""}}]"#),
        );
        let err = links(&store).list().await.unwrap_err();

        let DirectoryError::Validation(error) = err else {
            panic!("expected validation error, got {err:?}");
        };
        assert_eq!(error.issues()[0].field, "links[0].environments.production");
    }

    #[tokio::test]
    async fn categories_list_sorted_and_stored_without_counts() {
        let store = Arc::new(InMemoryStore::new());
        let collection: Collection<Category> =
            Collection::new(Arc::clone(&store) as Arc<dyn DocumentStore>, ReadPolicy::Degrade);

        collection.create(Category::new("tools")).await.unwrap();
        let mut docs = Category::new("Docs");
        docs.link_count = Some(7);
        collection.create(docs).await.unwrap();

        let names: Vec<_> = collection
            .list()
            .await
            .unwrap()
            .items
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, ["Docs", "tools"]);
        assert!(!store.document(Resource::Categories).unwrap().contains("linkCount"));
    }

    #[tokio::test]
    async fn category_keys_collide_case_insensitively() {
        let store = Arc::new(InMemoryStore::new());
        let collection: Collection<Category> =
            Collection::new(store as Arc<dyn DocumentStore>, ReadPolicy::Degrade);
        collection.create(Category::new("Docs")).await.unwrap();

        let err = collection.create(Category::new("DOCS")).await.unwrap_err();
        assert!(matches!(err, DirectoryError::DuplicateKey { .. }));

        // renaming a record onto its own key in another case is allowed
        let renamed = collection
            .update(
                "docs",
                CategoryPatch {
                    name: Some("DOCS".into()),
                    ..Default::default()
                },
                None,
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "DOCS");
    }

    #[tokio::test]
    async fn initialize_only_writes_missing_documents() {
        let store = Arc::new(InMemoryStore::new());
        let tags: Collection<Tag> =
            Collection::new(Arc::clone(&store) as Arc<dyn DocumentStore>, ReadPolicy::Degrade);

        assert!(tags.initialize(Some(r#"[{"name":"infra"}]"#)).await.unwrap());
        assert!(!tags.initialize(None).await.unwrap());
        assert_eq!(tags.list().await.unwrap().items, vec![Tag::new("infra")]);
    }

    #[tokio::test]
    async fn concurrent_creates_are_all_kept() {
        let store = Arc::new(InMemoryStore::new());
        let collection = links(&store);

        let handles: Vec<_> = (0..20)
            .map(|i| {
                let collection = collection.clone();
                tokio::spawn(async move { collection.create(link(&format!("link-{i:02}"))).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        assert_eq!(collection.list().await.unwrap().items.len(), 20);
    }
}
