//! On-disk state owned by the CLI.
//!
//! Two locations are managed here:
//!
//! - the per-user config store (`ConfigStore`): the GitHub credential record
//!   as JSON plus a `.env` file that mirrors the token for other tools
//! - the per-project `.gitlite/config.json` (`RepoConfig`) written when a
//!   repository is created or cloned through the CLI
//!
//! There is no locking. One CLI process owns these files for the duration of
//! an invocation and the last writer wins.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::github::{Owner, Repository, UserSummary};

pub const APP_DIR_NAME: &str = "git-lite-cli";
pub const CREDENTIALS_FILE: &str = "credentials.json";
pub const ENV_FILE: &str = ".env";
pub const ENV_TOKEN_KEY: &str = "GITHUB_TOKEN";
pub const ENV_USER_KEY: &str = "GITHUB_USER";

pub const PROJECT_DIR_NAME: &str = ".gitlite";
pub const PROJECT_CONFIG_FILE: &str = "config.json";

/// The stored GitHub login
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub token: String,
    pub verified_user: UserSummary,
    pub created_at: DateTime<Utc>,
}

impl Credential {
    #[must_use]
    pub fn new(token: impl Into<String>, verified_user: UserSummary) -> Self {
        Self {
            token: token.into(),
            verified_user,
            created_at: Utc::now(),
        }
    }

    /// Token with everything but the prefix and last four characters hidden
    #[must_use]
    pub fn masked_token(&self) -> String {
        mask_token(&self.token)
    }
}

#[must_use]
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 8 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}{}{tail}", "*".repeat(chars.len() - 8))
}

pub struct ConfigStore {
    root_dir: PathBuf,
}

impl ConfigStore {
    /// Opens the store at `GLC_CONFIG_HOME` or the platform config directory
    ///
    /// The directory itself is created lazily on first write.
    ///
    /// # Errors
    /// Returns an error if the platform config directory cannot be determined
    pub fn new() -> Result<Self> {
        let root_dir = if let Ok(custom_root) = std::env::var("GLC_CONFIG_HOME") {
            PathBuf::from(custom_root)
        } else {
            platform_config_root()?.join(APP_DIR_NAME)
        };
        Ok(Self { root_dir })
    }

    pub fn at(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
        }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root_dir
    }

    #[must_use]
    pub fn credentials_path(&self) -> PathBuf {
        self.root_dir.join(CREDENTIALS_FILE)
    }

    #[must_use]
    pub fn env_path(&self) -> PathBuf {
        self.root_dir.join(ENV_FILE)
    }

    fn ensure_root(&self) -> Result<()> {
        fs::create_dir_all(&self.root_dir).with_context(|| {
            format!(
                "Failed to create config directory: {}",
                self.root_dir.display()
            )
        })
    }

    /// # Errors
    /// Returns an error if the file exists but cannot be read or parsed
    pub fn load_credentials(&self) -> Result<Option<Credential>> {
        let path = self.credentials_path();
        if !path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if content.trim().is_empty() || content.trim() == "{}" {
            return Ok(None);
        }

        let credential = serde_json::from_str(&content)
            .with_context(|| format!("Corrupted credential file: {}", path.display()))?;
        Ok(Some(credential))
    }

    /// Overwrites any previous credential
    ///
    /// # Errors
    /// Returns an error if the config directory or file cannot be written
    pub fn save_credentials(&self, credential: &Credential) -> Result<()> {
        self.ensure_root()?;
        let path = self.credentials_path();
        let json = serde_json::to_string_pretty(credential)?;
        write_private(&path, &json)?;
        debug!(path = %path.display(), login = %credential.verified_user.login, "saved credentials");
        Ok(())
    }

    /// Returns whether a credential existed
    ///
    /// # Errors
    /// Returns an error if the file exists but cannot be removed
    pub fn delete_credentials(&self) -> Result<bool> {
        let path = self.credentials_path();
        if !path.exists() {
            return Ok(false);
        }
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))?;
        Ok(true)
    }

    fn read_env(&self) -> Result<String> {
        let path = self.env_path();
        if !path.exists() {
            return Ok(String::new());
        }
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))
    }

    /// # Errors
    /// Returns an error if the `.env` file exists but cannot be read
    pub fn env_get(&self, key: &str) -> Result<Option<String>> {
        Ok(find_env_value(&self.read_env()?, key))
    }

    /// # Errors
    /// Returns an error if the `.env` file cannot be read or written
    pub fn env_set(&self, key: &str, value: &str) -> Result<()> {
        self.ensure_root()?;
        let updated = upsert_env_line(&self.read_env()?, key, value);
        write_private(&self.env_path(), &updated)
    }

    /// # Errors
    /// Returns an error if the `.env` file cannot be read or written
    pub fn env_remove(&self, key: &str) -> Result<()> {
        let path = self.env_path();
        if !path.exists() {
            return Ok(());
        }
        let updated = remove_env_line(&self.read_env()?, key);
        write_private(&path, &updated)
    }
}

/// `%LOCALAPPDATA%` on Windows, `~/Library/Application Support` on macOS, `~/.config` elsewhere
///
/// # Errors
/// Returns an error if the home directory cannot be determined
pub fn platform_config_root() -> Result<PathBuf> {
    let dir = if cfg!(windows) {
        dirs::data_local_dir()
    } else if cfg!(target_os = "macos") {
        dirs::config_dir()
    } else {
        dirs::home_dir().map(|home| home.join(".config"))
    };
    dir.context("Failed to determine the user config directory")
}

fn write_private(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))
            .with_context(|| format!("Failed to restrict permissions on {}", path.display()))?;
    }

    Ok(())
}

fn is_key_line(line: &str, key: &str) -> bool {
    line.trim_start()
        .strip_prefix(key)
        .is_some_and(|rest| rest.starts_with('='))
}

/// Replace the `KEY=` line in `.env` content, or append one if the key is absent
///
/// All other lines are kept verbatim.
#[must_use]
pub fn upsert_env_line(content: &str, key: &str, value: &str) -> String {
    let entry = format!("{key}={value}");
    let mut replaced = false;
    let mut lines: Vec<String> = content
        .lines()
        .map(|line| {
            if !replaced && is_key_line(line, key) {
                replaced = true;
                entry.clone()
            } else {
                line.to_string()
            }
        })
        .collect();

    if !replaced {
        lines.push(entry);
    }

    let mut updated = lines.join("\n");
    updated.push('\n');
    updated
}

#[must_use]
pub fn remove_env_line(content: &str, key: &str) -> String {
    let kept: Vec<&str> = content
        .lines()
        .filter(|line| !is_key_line(line, key))
        .collect();
    if kept.is_empty() {
        return String::new();
    }
    let mut updated = kept.join("\n");
    updated.push('\n');
    updated
}

#[must_use]
pub fn find_env_value(content: &str, key: &str) -> Option<String> {
    content
        .lines()
        .find(|line| is_key_line(line, key))
        .and_then(|line| line.split_once('='))
        .map(|(_, value)| value.trim().to_string())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OwnerSummary {
    pub login: String,
    pub id: u64,
    pub html_url: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub user_view_type: Option<String>,
}

impl From<&Owner> for OwnerSummary {
    fn from(owner: &Owner) -> Self {
        Self {
            login: owner.login.clone(),
            id: owner.id,
            html_url: owner.html_url.clone(),
            kind: owner.kind.clone(),
            user_view_type: owner.user_view_type.clone(),
        }
    }
}

/// Project metadata kept in `<project>/.gitlite/config.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoConfig {
    pub id: u64,
    pub local_dir: PathBuf,
    pub name: String,
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(rename = "private")]
    pub is_private: bool,
    pub html_url: String,
    pub owner: OwnerSummary,
    #[serde(default)]
    pub branches: Vec<String>,
}

impl RepoConfig {
    #[must_use]
    pub fn from_repository(repo: &Repository, local_dir: &Path) -> Self {
        Self {
            id: repo.id,
            local_dir: local_dir.to_path_buf(),
            name: repo.name.clone(),
            full_name: repo.full_name.clone(),
            description: repo.description.clone(),
            is_private: repo.private,
            html_url: repo.html_url.clone(),
            owner: OwnerSummary::from(&repo.owner),
            branches: repo.default_branch.iter().cloned().collect(),
        }
    }

    /// Returns false when the branch was already recorded
    pub fn add_branch(&mut self, branch: &str) -> bool {
        if self.branches.iter().any(|known| known == branch) {
            return false;
        }
        self.branches.push(branch.to_string());
        true
    }

    pub fn remove_branch(&mut self, branch: &str) -> bool {
        let before = self.branches.len();
        self.branches.retain(|known| known != branch);
        self.branches.len() != before
    }

    pub fn rename_branch(&mut self, from: &str, to: &str) {
        self.remove_branch(from);
        self.add_branch(to);
    }
}

#[must_use]
pub fn repo_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(PROJECT_DIR_NAME).join(PROJECT_CONFIG_FILE)
}

/// # Errors
/// Returns an error if the file exists but cannot be read or parsed
pub fn load_repo_config(project_dir: &Path) -> Result<Option<RepoConfig>> {
    let path = repo_config_path(project_dir);
    if !path.exists() {
        return Ok(None);
    }
    let content =
        fs::read_to_string(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    let config = serde_json::from_str(&content)
        .with_context(|| format!("Invalid project config: {}", path.display()))?;
    Ok(Some(config))
}

/// # Errors
/// Returns an error if the `.gitlite` directory or file cannot be written
pub fn save_repo_config(project_dir: &Path, config: &RepoConfig) -> Result<()> {
    let path = repo_config_path(project_dir);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    fs::write(&path, serde_json::to_string_pretty(config)?)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    debug!(path = %path.display(), "saved project config");
    Ok(())
}

/// Apply `change` to the project config if one exists
///
/// # Errors
/// Returns an error if an existing config cannot be read or written back
pub fn update_repo_config(
    project_dir: &Path,
    change: impl FnOnce(&mut RepoConfig),
) -> Result<bool> {
    let Some(mut config) = load_repo_config(project_dir)? else {
        return Ok(false);
    };
    change(&mut config);
    save_repo_config(project_dir, &config)?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_user() -> UserSummary {
        UserSummary {
            login: "octocat".to_string(),
            email: Some("octocat@github.com".to_string()),
            name: Some("The Octocat".to_string()),
            user_view_type: Some("public".to_string()),
        }
    }

    fn sample_config(dir: &Path) -> RepoConfig {
        RepoConfig {
            id: 42,
            local_dir: dir.to_path_buf(),
            name: "demo".to_string(),
            full_name: "octocat/demo".to_string(),
            description: None,
            is_private: false,
            html_url: "https://github.com/octocat/demo".to_string(),
            owner: OwnerSummary {
                login: "octocat".to_string(),
                id: 1,
                html_url: "https://github.com/octocat".to_string(),
                kind: "User".to_string(),
                user_view_type: None,
            },
            branches: vec!["main".to_string()],
        }
    }

    #[test]
    fn test_upsert_appends_missing_key() {
        let content = "EDITOR=vim\n";
        assert_eq!(
            upsert_env_line(content, "GITHUB_TOKEN", "abc"),
            "EDITOR=vim\nGITHUB_TOKEN=abc\n"
        );
        assert_eq!(upsert_env_line("", "GITHUB_TOKEN", "abc"), "GITHUB_TOKEN=abc\n");
    }

    #[test]
    fn test_upsert_replaces_only_matching_line() {
        let content = "# comment\nGITHUB_TOKEN=old\nGITHUB_TOKEN_BACKUP=keep\n  spaced = value\n";
        assert_eq!(
            upsert_env_line(content, "GITHUB_TOKEN", "new"),
            "# comment\nGITHUB_TOKEN=new\nGITHUB_TOKEN_BACKUP=keep\n  spaced = value\n"
        );
    }

    #[test]
    fn test_remove_and_find_env_values() {
        let content = "A=1\nGITHUB_USER=octocat\nB=2\n";
        assert_eq!(find_env_value(content, "GITHUB_USER").as_deref(), Some("octocat"));
        assert_eq!(find_env_value(content, "GITHUB"), None);
        assert_eq!(remove_env_line(content, "GITHUB_USER"), "A=1\nB=2\n");
        assert_eq!(remove_env_line("A=1\n", "A"), "");
    }

    #[test]
    fn test_mask_token() {
        assert_eq!(mask_token("ghp_abcdefgh1234"), "ghp_********1234");
        assert_eq!(mask_token("short"), "*****");
    }

    #[test]
    fn test_credentials_round_trip_and_delete() -> Result<()> {
        let temp = TempDir::new()?;
        let store = ConfigStore::at(temp.path().join("nested").join(APP_DIR_NAME));

        assert!(store.load_credentials()?.is_none());
        assert!(!store.delete_credentials()?);

        let credential = Credential::new("ghp_token", sample_user());
        store.save_credentials(&credential)?;
        assert_eq!(store.load_credentials()?, Some(credential));

        let raw = fs::read_to_string(store.credentials_path())?;
        assert!(raw.contains("\"verifiedUser\""));
        assert!(raw.contains("\"createdAt\""));

        assert!(store.delete_credentials()?);
        assert!(store.load_credentials()?.is_none());
        Ok(())
    }

    #[test]
    fn test_env_file_operations() -> Result<()> {
        let temp = TempDir::new()?;
        let store = ConfigStore::at(temp.path());

        store.env_set(ENV_TOKEN_KEY, "one")?;
        store.env_set(ENV_USER_KEY, "octocat")?;
        store.env_set(ENV_TOKEN_KEY, "two")?;
        assert_eq!(
            fs::read_to_string(store.env_path())?,
            "GITHUB_TOKEN=two\nGITHUB_USER=octocat\n"
        );

        store.env_remove(ENV_TOKEN_KEY)?;
        assert_eq!(store.env_get(ENV_TOKEN_KEY)?, None);
        assert_eq!(store.env_get(ENV_USER_KEY)?.as_deref(), Some("octocat"));
        Ok(())
    }

    #[test]
    fn test_repo_config_branches_stay_unique() -> Result<()> {
        let temp = TempDir::new()?;
        save_repo_config(temp.path(), &sample_config(temp.path()))?;

        let updated = update_repo_config(temp.path(), |config| {
            config.add_branch("feature");
            config.add_branch("feature");
            config.rename_branch("main", "trunk");
        })?;
        assert!(updated);

        let config = load_repo_config(temp.path())?.ok_or_else(|| anyhow::anyhow!("missing"))?;
        assert_eq!(config.branches, vec!["feature", "trunk"]);

        let raw = fs::read_to_string(repo_config_path(temp.path()))?;
        assert!(raw.contains("\"private\": false"));
        assert!(raw.contains("\"local_dir\""));
        Ok(())
    }

    #[test]
    fn test_update_repo_config_without_file_is_noop() -> Result<()> {
        let temp = TempDir::new()?;
        assert!(!update_repo_config(temp.path(), |config| {
            config.add_branch("x");
        })?);
        assert!(!repo_config_path(temp.path()).exists());
        Ok(())
    }
}
