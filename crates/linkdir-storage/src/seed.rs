use linkdir_core::{Resource, StorageError};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;
use tracing::debug;

/// Initial documents written for resources that do not exist yet.
#[derive(Debug, Clone, Default)]
pub struct Seed {
    documents: BTreeMap<Resource, String>,
}

impl Seed {
    /// No seed documents: collections start empty, settings from the template.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Reads whichever of the resource files exist under `dir`.
    pub async fn from_dir(dir: impl AsRef<Path>) -> Result<Self, StorageError> {
        let dir = dir.as_ref();
        let mut seed = Self::empty();
        for resource in Resource::ALL {
            let path = dir.join(resource.file_name());
            match tokio::fs::read_to_string(&path).await {
                Ok(contents) => {
                    debug!(path = %path.display(), "loaded seed document");
                    seed.documents.insert(resource, contents);
                }
                Err(err) if err.kind() == ErrorKind::NotFound => {}
                Err(err) => {
                    return Err(StorageError::Unavailable(format!(
                        "{}: {err}",
                        path.display()
                    )))
                }
            }
        }
        Ok(seed)
    }

    pub fn with_document(mut self, resource: Resource, contents: impl Into<String>) -> Self {
        self.documents.insert(resource, contents.into());
        self
    }

    pub fn document(&self, resource: Resource) -> Option<&str> {
        self.documents
            .get(&resource)
            .map(String::as_str)
            .filter(|doc| !doc.trim().is_empty())
    }
}
