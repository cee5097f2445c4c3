use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::format::{PorcelainEntry, parse_porcelain_z};
use crate::git::GitError;
use crate::github::{CreateRepoRequest, GithubError, Repository, UserSummary};

/// Trait for Git operations to enable mocking in tests
///
/// Implementors only need the four primitives; the helpers are thin
/// interpretations of well-known git output.
pub trait GitOperations {
    /// Directory every command runs in
    fn workdir(&self) -> &Path;

    /// Run `git <args>` and return stdout with trailing whitespace trimmed
    ///
    /// # Errors
    /// Returns an error if git cannot be spawned or exits non-zero
    fn run(&self, args: &[&str]) -> Result<String, GitError>;

    /// Like [`GitOperations::run`], but the child is killed once `timeout` elapses
    ///
    /// # Errors
    /// Returns an error if git fails, or `GitError::TimedOut` when the deadline passes
    fn run_with_timeout(&self, args: &[&str], timeout: Duration) -> Result<String, GitError>;

    /// Run git attached to the terminal (used for `reset -p`)
    ///
    /// # Errors
    /// Returns an error if git cannot be spawned or exits non-zero
    fn run_interactive(&self, args: &[&str]) -> Result<(), GitError>;

    /// Name of the checked-out branch, empty when HEAD is detached
    ///
    /// # Errors
    /// Returns an error if git fails
    fn current_branch(&self) -> Result<String, GitError> {
        self.run(&["branch", "--show-current"])
    }

    fn is_inside_work_tree(&self) -> bool {
        matches!(
            self.run(&["rev-parse", "--is-inside-work-tree"]).as_deref(),
            Ok("true")
        )
    }

    /// Absolute path of the repository's top level directory
    ///
    /// # Errors
    /// Returns an error if the working directory is not inside a repository
    fn toplevel(&self) -> Result<PathBuf, GitError> {
        self.run(&["rev-parse", "--show-toplevel"])
            .map(|path| PathBuf::from(path.trim()))
    }

    /// # Errors
    /// Returns an error if git fails
    fn status_porcelain(&self) -> Result<String, GitError> {
        self.run(&["status", "--porcelain"])
    }

    /// Status entries with unquoted paths relative to the top level
    ///
    /// # Errors
    /// Returns an error if git fails
    fn status_entries(&self) -> Result<Vec<PorcelainEntry>, GitError> {
        self.run(&["status", "--porcelain", "-z"])
            .map(|output| parse_porcelain_z(&output))
    }

    /// # Errors
    /// Returns an error if git fails
    fn has_changes(&self) -> Result<bool, GitError> {
        Ok(!self.status_porcelain()?.trim().is_empty())
    }

    /// Files currently staged for commit, relative to the top level
    ///
    /// # Errors
    /// Returns an error if git fails
    fn staged_files(&self) -> Result<Vec<String>, GitError> {
        let output = self.run(&["diff", "--cached", "--name-only", "-z"])?;
        Ok(output
            .split('\0')
            .filter(|path| !path.is_empty())
            .map(String::from)
            .collect())
    }

    /// Whether HEAD has a parent, i.e. `HEAD~1` can be reset to
    fn has_parent_commit(&self) -> bool {
        self.run(&["rev-parse", "--verify", "--quiet", "HEAD~1"])
            .is_ok()
    }

    /// Whether `reference` resolves to a commit
    fn ref_exists(&self, reference: &str) -> bool {
        self.run(&["rev-parse", "--verify", "--quiet", reference])
            .is_ok()
    }

    fn branch_exists(&self, branch: &str) -> bool {
        self.ref_exists(&format!("refs/heads/{branch}"))
    }
}

/// Trait for the GitHub REST calls the CLI makes, so commands can be tested offline
pub trait GithubApi {
    /// `GET /user`
    ///
    /// # Errors
    /// Returns an error on network failure or a non-success status
    fn current_user(&self, token: &str) -> Result<UserSummary, GithubError>;

    /// Primary verified address from `GET /user/emails`
    ///
    /// # Errors
    /// Returns an error on network failure or a non-success status
    fn primary_email(&self, token: &str) -> Result<Option<String>, GithubError>;

    /// `POST /user/repos`
    ///
    /// # Errors
    /// Returns an error on network failure or a non-success status
    fn create_repository(
        &self,
        token: &str,
        request: &CreateRepoRequest,
    ) -> Result<Repository, GithubError>;

    /// `GET /repos/{owner}/{name}`, anonymous when no token is given
    ///
    /// # Errors
    /// Returns an error on network failure or a non-success status
    fn repository(
        &self,
        token: Option<&str>,
        owner: &str,
        name: &str,
    ) -> Result<Repository, GithubError>;

    /// Raw `<name>.gitignore` from the github/gitignore collection
    ///
    /// # Errors
    /// Returns `GithubError::TemplateNotFound` for unknown names
    fn gitignore_template(&self, name: &str) -> Result<String, GithubError>;

    /// Whether the API answers within a short fixed wait
    fn is_reachable(&self) -> bool;
}
