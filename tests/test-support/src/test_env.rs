#![allow(clippy::unwrap_used)] // Tests use unwrap for simplicity

use anyhow::{Context, Result};
use assert_fs::TempDir;
use assert_fs::prelude::*;

use std::path::Path;
use std::process::Command;

/// A real repository on `main` with one commit, plus an isolated config home
pub struct CliTestEnvironment {
    pub repo_dir: assert_fs::fixture::ChildPath,
    pub config_dir: assert_fs::fixture::ChildPath,
    pub remote_dir: Option<assert_fs::fixture::ChildPath>,
    temp_dir: TempDir,
}

impl CliTestEnvironment {
    /// Creates a new test environment with a real git repository and config home
    ///
    /// # Errors
    /// Returns an error if:
    /// - Failed to create temporary directory
    /// - Failed to initialize git repository
    /// - Failed to configure git settings
    /// - Failed to create initial commit
    pub fn new() -> Result<Self> {
        let temp_dir = TempDir::new().context("Failed to create temporary directory")?;
        let repo_dir = temp_dir.child("test_repo");
        let config_dir = temp_dir.child("config");

        repo_dir.create_dir_all()?;
        config_dir.create_dir_all()?;

        run_git(repo_dir.path(), &["init"])?;
        run_git(repo_dir.path(), &["config", "user.name", "Test User"])?;
        run_git(repo_dir.path(), &["config", "user.email", "test@example.com"])?;
        run_git(repo_dir.path(), &["config", "commit.gpgsign", "false"])?;

        repo_dir.child("README.md").write_str("# Test Repo\n")?;
        run_git(repo_dir.path(), &["add", "."])?;
        run_git(repo_dir.path(), &["commit", "-m", "Initial commit"])?;

        // Some git versions still default to 'master'
        run_git(repo_dir.path(), &["branch", "-M", "main"])?;

        Ok(Self {
            repo_dir,
            config_dir,
            remote_dir: None,
            temp_dir,
        })
    }

    /// Same as [`CliTestEnvironment::new`], with a bare `origin` that already has `main`
    ///
    /// # Errors
    /// Returns an error if the bare repository cannot be created or pushed to
    pub fn with_remote() -> Result<Self> {
        let mut env = Self::new()?;
        let remote_dir = env.temp_dir.child("origin.git");
        remote_dir.create_dir_all()?;

        run_git(remote_dir.path(), &["init", "--bare"])?;
        let remote = remote_dir.path().to_string_lossy().into_owned();
        env.git(&["remote", "add", "origin", &remote])?;
        env.git(&["push", "-u", "origin", "main"])?;

        env.remote_dir = Some(remote_dir);
        Ok(env)
    }

    /// A directory next to the repository that is not under version control
    ///
    /// # Errors
    /// Returns an error if the directory cannot be created
    pub fn plain_dir(&self) -> Result<assert_fs::fixture::ChildPath> {
        let dir = self.temp_dir.child("plain");
        dir.create_dir_all()?;
        Ok(dir)
    }

    /// Run git in the repository and return trimmed stdout
    ///
    /// # Errors
    /// Returns an error if git fails
    pub fn git(&self, args: &[&str]) -> Result<String> {
        run_git(self.repo_dir.path(), args)
    }

    /// Run git against the bare remote
    ///
    /// # Errors
    /// Returns an error if there is no remote or git fails
    pub fn remote_git(&self, args: &[&str]) -> Result<String> {
        let remote = self
            .remote_dir
            .as_ref()
            .context("Environment was created without a remote")?;
        run_git(remote.path(), args)
    }

    /// Execute a non-interactive `glc` command in the repository
    ///
    /// # Errors
    /// Returns an error if the command setup fails
    pub fn run_command(&self, args: &[&str]) -> Result<assert_cmd::Command> {
        self.run_command_in(self.repo_dir.path(), args)
    }

    /// Execute a non-interactive `glc` command in another directory
    ///
    /// # Errors
    /// Returns an error if the command setup fails
    pub fn run_command_in(&self, dir: &Path, args: &[&str]) -> Result<assert_cmd::Command> {
        let mut cmd =
            assert_cmd::Command::cargo_bin("glc").context("Failed to find glc binary")?;

        cmd.current_dir(dir)
            .env("GLC_CONFIG_HOME", self.config_dir.path())
            .env("GLC_GITHUB_API", "http://127.0.0.1:9")
            .env_remove("GLC_LOG")
            .env("GIT_TERMINAL_PROMPT", "0");

        cmd.args(args);
        Ok(cmd)
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .context("Failed to execute git command")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Git command failed: {}", stderr);
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use predicates::prelude::*;

    #[test]
    fn test_cli_test_environment_creation() -> Result<()> {
        let env = CliTestEnvironment::new()?;

        env.repo_dir.assert(predicate::path::is_dir());
        env.repo_dir.child(".git").assert(predicate::path::exists());
        env.repo_dir
            .child("README.md")
            .assert(predicate::str::contains("# Test Repo"));
        env.config_dir.assert(predicate::path::is_dir());
        assert_eq!(env.git(&["branch", "--show-current"])?, "main");

        Ok(())
    }

    #[test]
    fn test_remote_has_main() -> Result<()> {
        let env = CliTestEnvironment::with_remote()?;

        let heads = env.remote_git(&["branch", "--list"])?;
        assert!(heads.contains("main"));
        assert!(env.git(&["rev-parse", "--abbrev-ref", "main@{upstream}"])?.contains("origin/main"));

        Ok(())
    }
}
