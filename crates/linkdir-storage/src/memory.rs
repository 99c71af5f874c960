use async_trait::async_trait;
use dashmap::DashMap;
use linkdir_core::{DocumentStore, ReadOutcome, Resource, StorageError};

/// In-memory implementation of [`DocumentStore`] using DashMap.
///
/// Nothing survives the process; meant for tests and throwaway instances.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    documents: DashMap<Resource, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-populates one document.
    pub fn with_document(self, resource: Resource, contents: impl Into<String>) -> Self {
        self.documents.insert(resource, contents.into());
        self
    }

    /// Raw contents of a document, if any.
    pub fn document(&self, resource: Resource) -> Option<String> {
        self.documents.get(&resource).map(|doc| doc.clone())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn read(&self, resource: Resource) -> Result<ReadOutcome, StorageError> {
        match self.documents.get(&resource) {
            Some(doc) if !doc.trim().is_empty() => Ok(ReadOutcome::Loaded(doc.clone())),
            _ => Ok(ReadOutcome::Missing),
        }
    }

    async fn write(&self, resource: Resource, contents: &str) -> Result<(), StorageError> {
        self.documents.insert(resource, contents.to_owned());
        Ok(())
    }

    async fn exists(&self, resource: Resource) -> Result<bool, StorageError> {
        Ok(self.documents.contains_key(&resource))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn write_and_read() {
        let store = InMemoryStore::new();
        assert_eq!(store.read(Resource::Links).await.unwrap(), ReadOutcome::Missing);

        store.write(Resource::Links, "[]").await.unwrap();
        assert_eq!(
            store.read(Resource::Links).await.unwrap(),
            ReadOutcome::Loaded("[]".to_string())
        );
        assert!(store.exists(Resource::Links).await.unwrap());
        assert!(!store.exists(Resource::Tags).await.unwrap());
    }
}
