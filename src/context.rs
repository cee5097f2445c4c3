use anyhow::Result;
use std::path::{Path, PathBuf};

use crate::config::Settings;
use crate::git::GitCli;
use crate::github::{GithubClient, GithubEndpoints};
use crate::storage::ConfigStore;
use crate::traits::GitOperations;

/// Everything a command needs from its environment, resolved once at startup
pub struct AppContext {
    pub cwd: PathBuf,
    pub store: ConfigStore,
    pub settings: Settings,
    pub endpoints: GithubEndpoints,
}

impl AppContext {
    /// Build the context for the current process
    ///
    /// Project settings come from `.gitlite.toml` at the repository top level
    /// when the working directory is inside a repository.
    ///
    /// # Errors
    /// Returns an error if:
    /// - The current directory cannot be determined
    /// - The config store location cannot be determined
    /// - An existing settings file cannot be read
    pub fn from_env() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let store = ConfigStore::new()?;
        let settings = load_settings(&cwd)?;

        Ok(Self {
            cwd,
            store,
            settings,
            endpoints: GithubEndpoints::from_env(),
        })
    }

    #[must_use]
    pub fn git(&self) -> GitCli {
        GitCli::new(&self.cwd)
    }

    /// # Errors
    /// Returns an error if the HTTP client cannot be constructed
    pub fn github(&self) -> Result<GithubClient> {
        Ok(GithubClient::new(self.endpoints.clone())?)
    }
}

fn load_settings(cwd: &Path) -> Result<Settings> {
    let git = GitCli::new(cwd);
    match git.toplevel() {
        Ok(root) => Settings::load_from_repo(&root),
        Err(_) => Settings::load_from_repo(cwd),
    }
}
