//! Per-user view state (favorites, archive, sidebar, search) kept outside the
//! shared documents, behind an explicit key-value persistence adapter.

use crate::error::StorageError;
use async_trait::async_trait;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::warn;

pub const PREFERENCES_KEY: &str = "linkdir.preferences";
pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub version: u32,
    #[serde(default)]
    pub favorites: BTreeSet<String>,
    #[serde(default)]
    pub archived: BTreeSet<String>,
    #[serde(default)]
    pub sidebar_collapsed: bool,
    #[serde(default)]
    pub last_search: String,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            version: SCHEMA_VERSION,
            favorites: BTreeSet::new(),
            archived: BTreeSet::new(),
            sidebar_collapsed: false,
            last_search: String::new(),
        }
    }
}

/// Key-value storage the preference state is persisted through.
#[async_trait]
pub trait PreferenceBackend: Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError>;
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceBackend {
    entries: DashMap<String, String>,
}

impl MemoryPreferenceBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PreferenceBackend for MemoryPreferenceBackend {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.get(key).map(|value| value.clone()))
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.entries.insert(key.to_owned(), value);
        Ok(())
    }
}

#[async_trait]
impl<B: PreferenceBackend> PreferenceBackend for Arc<B> {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.as_ref().get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.as_ref().set(key, value).await
    }
}

/// Loaded preference state plus the backend every change is written to.
#[derive(Debug)]
pub struct PreferenceStore<B> {
    backend: B,
    state: Preferences,
}

impl<B: PreferenceBackend> PreferenceStore<B> {
    /// Loads the stored state. Unreadable documents and unknown schema
    /// versions start over from defaults.
    pub async fn load(backend: B) -> Result<Self, StorageError> {
        let state = match backend.get(PREFERENCES_KEY).await? {
            None => Preferences::default(),
            Some(raw) => match serde_json::from_str::<Preferences>(&raw) {
                Ok(state) if state.version == SCHEMA_VERSION => state,
                Ok(state) => {
                    warn!(
                        found = state.version,
                        expected = SCHEMA_VERSION,
                        "discarding preferences with unknown schema version"
                    );
                    Preferences::default()
                }
                Err(error) => {
                    warn!(%error, "discarding unreadable preferences");
                    Preferences::default()
                }
            },
        };
        Ok(Self { backend, state })
    }

    pub fn state(&self) -> &Preferences {
        &self.state
    }

    pub fn is_favorite(&self, name: &str) -> bool {
        self.state.favorites.contains(name)
    }

    /// Flips the favorite flag and returns the new value.
    pub async fn toggle_favorite(&mut self, name: &str) -> Result<bool, StorageError> {
        let now_favorite = if self.state.favorites.remove(name) {
            false
        } else {
            self.state.favorites.insert(name.to_owned());
            true
        };
        self.save().await?;
        Ok(now_favorite)
    }

    pub async fn set_archived(&mut self, name: &str, archived: bool) -> Result<(), StorageError> {
        if archived {
            self.state.archived.insert(name.to_owned());
        } else {
            self.state.archived.remove(name);
        }
        self.save().await
    }

    pub async fn set_sidebar_collapsed(&mut self, collapsed: bool) -> Result<(), StorageError> {
        self.state.sidebar_collapsed = collapsed;
        self.save().await
    }

    pub async fn set_last_search(&mut self, term: &str) -> Result<(), StorageError> {
        self.state.last_search = term.trim().to_owned();
        self.save().await
    }

    /// Forgets favorites and archive entries for links that no longer exist.
    /// Returns how many entries were dropped.
    pub async fn prune<S: AsRef<str>>(&mut self, known: &[S]) -> Result<usize, StorageError> {
        let known: BTreeSet<&str> = known.iter().map(|name| name.as_ref()).collect();
        let before = self.state.favorites.len() + self.state.archived.len();
        self.state.favorites.retain(|name| known.contains(name.as_str()));
        self.state.archived.retain(|name| known.contains(name.as_str()));
        let dropped = before - self.state.favorites.len() - self.state.archived.len();
        if dropped > 0 {
            self.save().await?;
        }
        Ok(dropped)
    }

    async fn save(&self) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&self.state).map_err(|e| {
            StorageError::Operation(format!("failed to serialize preferences: {e}"))
        })?;
        self.backend.set(PREFERENCES_KEY, raw).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn favorites_survive_reload() {
        let backend = Arc::new(MemoryPreferenceBackend::new());

        let mut store = PreferenceStore::load(Arc::clone(&backend)).await.unwrap();
        assert!(store.toggle_favorite("Grafana").await.unwrap());
        store.set_archived("Old wiki", true).await.unwrap();
        store.set_sidebar_collapsed(true).await.unwrap();

        let reloaded = PreferenceStore::load(Arc::clone(&backend)).await.unwrap();
        assert!(reloaded.is_favorite("Grafana"));
        assert!(reloaded.state().archived.contains("Old wiki"));
        assert!(reloaded.state().sidebar_collapsed);
    }

    #[tokio::test]
    async fn toggle_twice_clears_favorite() {
        let mut store = PreferenceStore::load(MemoryPreferenceBackend::new())
            .await
            .unwrap();
        assert!(store.toggle_favorite("Jira").await.unwrap());
        assert!(!store.toggle_favorite("Jira").await.unwrap());
        assert!(!store.is_favorite("Jira"));
    }

    #[tokio::test]
    async fn unknown_version_resets() {
        let backend = MemoryPreferenceBackend::new();
        backend
            .set(PREFERENCES_KEY, r#"{"version":99,"favorites":["A"]}"#.to_string())
            .await
            .unwrap();

        let store = PreferenceStore::load(backend).await.unwrap();
        assert_eq!(store.state(), &Preferences::default());
    }

    #[tokio::test]
    async fn garbage_resets() {
        let backend = MemoryPreferenceBackend::new();
        backend
            .set(PREFERENCES_KEY, "not json".to_string())
            .await
            .unwrap();

        let store = PreferenceStore::load(backend).await.unwrap();
        assert!(store.state().favorites.is_empty());
    }

    #[tokio::test]
    async fn prune_drops_unknown_links() {
        let mut store = PreferenceStore::load(MemoryPreferenceBackend::new())
            .await
            .unwrap();
        store.toggle_favorite("Kept").await.unwrap();
        store.toggle_favorite("Gone").await.unwrap();
        store.set_archived("Also gone", true).await.unwrap();

        let dropped = store.prune(&["Kept"]).await.unwrap();
        assert_eq!(dropped, 2);
        assert!(store.is_favorite("Kept"));
        assert!(store.state().archived.is_empty());
    }
}
