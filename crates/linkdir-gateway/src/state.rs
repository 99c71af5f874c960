use std::sync::Arc;

use linkdir_directory::DirectoryService;
use linkdir_storage::Seed;

/// Deployment mode. Only development deployments accept writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Mode {
    Development,
    #[default]
    Production,
}

impl Mode {
    pub fn allows_mutations(&self) -> bool {
        matches!(self, Mode::Development)
    }
}

#[derive(Clone)]
pub struct AppState {
    pub(crate) directory: Arc<DirectoryService>,
    pub(crate) seed: Arc<Seed>,
    pub(crate) mode: Mode,
}

impl AppState {
    pub fn new(directory: Arc<DirectoryService>, seed: Seed, mode: Mode) -> Self {
        Self {
            directory,
            seed: Arc::new(seed),
            mode,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }
}
