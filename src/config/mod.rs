//! Per-project settings loaded from `.gitlite.toml`.
//!
//! Every field is optional; anything left out keeps its default, and the
//! `[size] ignore` list is merged additively with the built-in ignores.
//!
//! # Configuration Example
//!
//! ```toml
//! [sync]
//! remote = "upstream"
//! restore-stash-on-failure = false
//!
//! [size]
//! large-threshold-mb = 5
//! top = 20
//! ignore = ["vendor", "*.psd"]
//!
//! [doctor]
//! large-file-mb = 100
//! remote-timeout-secs = 10
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::warn;

pub const SETTINGS_FILE: &str = ".gitlite.toml";

/// Directories every size scan skips
pub const DEFAULT_SIZE_IGNORES: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".next",
    "coverage",
    ".nyc_output",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub sync: SyncSettings,
    pub size: SizeSettings,
    pub doctor: DoctorSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SyncSettings {
    /// Remote used by `sync` and `autopilot`
    pub remote: String,
    /// Pop the automatic stash when pull or push fails
    pub restore_stash_on_failure: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            remote: "origin".to_string(),
            restore_stash_on_failure: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SizeSettings {
    pub large_threshold_mb: f64,
    pub top: usize,
    /// Extra path patterns (glob syntax) on top of [`DEFAULT_SIZE_IGNORES`]
    pub ignore: Vec<String>,
}

impl Default for SizeSettings {
    fn default() -> Self {
        Self {
            large_threshold_mb: 10.0,
            top: 10,
            ignore: Vec::new(),
        }
    }
}

impl SizeSettings {
    /// Built-in ignores followed by the configured ones, without duplicates
    #[must_use]
    pub fn ignore_patterns(&self) -> Vec<String> {
        let mut patterns: Vec<String> = DEFAULT_SIZE_IGNORES
            .iter()
            .map(|pattern| (*pattern).to_string())
            .collect();
        for pattern in &self.ignore {
            if !patterns.contains(pattern) {
                patterns.push(pattern.clone());
            }
        }
        patterns
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DoctorSettings {
    pub large_file_mb: u64,
    pub remote_timeout_secs: u64,
}

impl Default for DoctorSettings {
    fn default() -> Self {
        Self {
            large_file_mb: 50,
            remote_timeout_secs: 15,
        }
    }
}

impl Settings {
    /// Loads settings from `.gitlite.toml` in `repo_path`.
    ///
    /// A missing or blank file yields defaults. Invalid TOML prints a warning
    /// and also yields defaults, so a typo never blocks a command.
    ///
    /// # Errors
    ///
    /// Only returns an error if the file exists but cannot be read.
    pub fn load_from_repo(repo_path: &Path) -> Result<Self> {
        let config_path = repo_path.join(SETTINGS_FILE);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {}", config_path.display()))?;

        if content.trim().is_empty() {
            return Ok(Self::default());
        }

        match toml::from_str::<Settings>(&content) {
            Ok(settings) => Ok(settings),
            Err(e) => {
                warn!(path = %config_path.display(), "invalid settings file");
                eprintln!("⚠ Invalid TOML syntax in {SETTINGS_FILE}:");
                eprintln!("  {}", e);
                eprintln!("  Using default settings. Please fix the syntax and try again.");
                Ok(Self::default())
            }
        }
    }
}
