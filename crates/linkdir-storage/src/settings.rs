use crate::collection::{check_revision, encode, ReadPolicy};
use linkdir_core::{
    DocumentStore, ReadOutcome, Resource, Result, Revision, Settings, StorageError, Validate,
    ValidationError,
};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::{error, warn};

/// The singleton settings document.
///
/// A missing document reads as the default template. Corrupt JSON follows
/// the [`ReadPolicy`] on reads and always blocks replacement.
#[derive(Clone)]
pub struct SettingsDocument {
    backend: Arc<dyn DocumentStore>,
    lock: Arc<Mutex<()>>,
    policy: ReadPolicy,
}

impl std::fmt::Debug for SettingsDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsDocument")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

enum Decoded {
    Loaded(Settings),
    Missing,
    Corrupt(String),
}

fn decode(raw: &str) -> Result<Decoded> {
    let value: serde_json::Value = match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(e) => return Ok(Decoded::Corrupt(e.to_string())),
    };
    let settings: Settings = serde_json::from_value(value)
        .map_err(|e| ValidationError::single(Resource::Settings.as_str(), e.to_string()))?;
    settings.validate()?;
    Ok(Decoded::Loaded(settings))
}

impl SettingsDocument {
    pub fn new(backend: Arc<dyn DocumentStore>, policy: ReadPolicy) -> Self {
        Self {
            backend,
            lock: Arc::new(Mutex::new(())),
            policy,
        }
    }

    async fn load(&self) -> Result<(Decoded, Revision)> {
        match self.backend.read(Resource::Settings).await {
            Ok(ReadOutcome::Missing) => Ok((Decoded::Missing, Revision::MISSING)),
            Ok(ReadOutcome::Loaded(raw)) => Ok((decode(&raw)?, Revision::of(&raw))),
            Err(StorageError::Corrupt { detail, .. }) => {
                Ok((Decoded::Corrupt(detail), Revision::MISSING))
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Current settings and the revision they were read at.
    pub async fn get(&self) -> Result<(Settings, Revision)> {
        match self.load().await? {
            (Decoded::Loaded(settings), revision) => Ok((settings, revision)),
            (Decoded::Missing, revision) => Ok((Settings::default(), revision)),
            (Decoded::Corrupt(detail), revision) => match self.policy {
                ReadPolicy::Degrade => {
                    error!(%detail, "corrupt settings document, using defaults");
                    Ok((Settings::default(), revision))
                }
                ReadPolicy::Strict => Err(StorageError::Corrupt {
                    resource: Resource::Settings,
                    detail,
                }
                .into()),
            },
        }
    }

    /// Validates and stores `settings` as a whole.
    pub async fn replace(&self, settings: Settings, expected: Option<Revision>) -> Result<Revision> {
        settings.validate()?;

        let _guard = self.lock().await;
        let revision = match self.load().await? {
            (Decoded::Corrupt(detail), _) => {
                return Err(StorageError::Corrupt {
                    resource: Resource::Settings,
                    detail,
                }
                .into())
            }
            (_, revision) => revision,
        };
        check_revision(Resource::Settings, revision, expected)?;
        self.write(&settings).await
    }

    /// Writes the default template regardless of what is stored.
    /// The caller must hold [`SettingsDocument::lock`].
    pub async fn reset(&self) -> Result<Settings> {
        let settings = Settings::default();
        self.write(&settings).await?;
        warn!("settings reset to defaults");
        Ok(settings)
    }

    pub async fn lock(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().await
    }

    /// Writes `seed` (or the default template) if nothing is stored yet.
    pub async fn initialize(&self, seed: Option<&str>) -> Result<bool> {
        let _guard = self.lock().await;
        if self.backend.exists(Resource::Settings).await? {
            return Ok(false);
        }
        let settings = match seed.map(decode).transpose()? {
            Some(Decoded::Loaded(settings)) => settings,
            Some(Decoded::Corrupt(detail)) => {
                return Err(StorageError::Corrupt {
                    resource: Resource::Settings,
                    detail: format!("seed document: {detail}"),
                }
                .into())
            }
            Some(Decoded::Missing) | None => Settings::default(),
        };
        self.write(&settings).await?;
        Ok(true)
    }

    async fn write(&self, settings: &Settings) -> Result<Revision> {
        let contents = encode(Resource::Settings, settings)?;
        self.backend.write(Resource::Settings, &contents).await?;
        Ok(Revision::of(&contents))
    }
}
