use async_trait::async_trait;
use linkdir_core::{DocumentStore, ReadOutcome, Resource, StorageError};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::trace;

/// Keeps every resource as `<root>/<resource>.json`.
///
/// Writes go to a temporary sibling file which is then renamed over the
/// target, so a reader never observes a partially written document.
#[derive(Debug, Clone)]
pub struct FileSystemStore {
    root: PathBuf,
}

impl FileSystemStore {
    /// Creates a store rooted at `root`. The directory is created on first write.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Creates a store and makes sure its directory exists.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let store = Self::new(root);
        tokio::fs::create_dir_all(&store.root)
            .await
            .map_err(|e| map_io_error(Resource::Settings, &store.root, e))?;
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path(&self, resource: Resource) -> PathBuf {
        self.root.join(resource.file_name())
    }

    fn temp_path(&self, resource: Resource) -> PathBuf {
        self.root
            .join(format!(".{}.{}.tmp", resource.file_name(), std::process::id()))
    }
}

fn map_io_error(resource: Resource, path: &Path, err: std::io::Error) -> StorageError {
    let message = format!("{}: {err}", path.display());
    match err.kind() {
        ErrorKind::PermissionDenied | ErrorKind::NotFound => StorageError::Unavailable(message),
        ErrorKind::InvalidData => StorageError::Corrupt {
            resource,
            detail: message,
        },
        _ => StorageError::Operation(message),
    }
}

#[async_trait]
impl DocumentStore for FileSystemStore {
    async fn read(&self, resource: Resource) -> Result<ReadOutcome, StorageError> {
        let path = self.path(resource);
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) if contents.trim().is_empty() => Ok(ReadOutcome::Missing),
            Ok(contents) => Ok(ReadOutcome::Loaded(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                trace!(path = %path.display(), "resource file does not exist");
                Ok(ReadOutcome::Missing)
            }
            Err(err) => Err(map_io_error(resource, &path, err)),
        }
    }

    async fn write(&self, resource: Resource, contents: &str) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|e| map_io_error(resource, &self.root, e))?;

        let path = self.path(resource);
        let temp = self.temp_path(resource);
        tokio::fs::write(&temp, contents)
            .await
            .map_err(|e| map_io_error(resource, &temp, e))?;
        if let Err(err) = tokio::fs::rename(&temp, &path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(map_io_error(resource, &path, err));
        }

        trace!(path = %path.display(), bytes = contents.len(), "wrote resource file");
        Ok(())
    }

    async fn exists(&self, resource: Resource) -> Result<bool, StorageError> {
        let path = self.path(resource);
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| map_io_error(resource, &path, e))
    }
}
