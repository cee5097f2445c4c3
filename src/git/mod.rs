//! Thin wrapper around the `git` executable.
//!
//! Every command is a single `git <args>` subprocess. Output is captured and
//! returned to the caller; a non-zero exit becomes a [`GitError`] carrying the
//! stderr text. The runner never retries, so callers probing for something that
//! may not exist (a branch, a parent commit) simply match on the error.

use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;
use tracing::debug;

use crate::traits::GitOperations;

mod scripted;

pub use scripted::ScriptedGit;

#[derive(Debug, Error)]
pub enum GitError {
    #[error("git is not installed or not found in PATH")]
    NotInstalled,

    #[error("failed to run `git {command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("`git {command}` failed: {message}")]
    Failed {
        command: String,
        code: Option<i32>,
        message: String,
    },

    #[error("`git {command}` timed out after {}s", .timeout.as_secs())]
    TimedOut { command: String, timeout: Duration },
}

impl GitError {
    /// The message git printed, without the command prefix
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            GitError::Failed { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            GitError::Failed { code, .. } => *code,
            _ => None,
        }
    }
}

/// Real process runner used by the CLI
#[derive(Debug, Clone)]
pub struct GitCli {
    workdir: PathBuf,
}

impl GitCli {
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut command = Command::new("git");
        command.args(args).current_dir(&self.workdir);
        command
    }
}

impl GitOperations for GitCli {
    fn workdir(&self) -> &Path {
        &self.workdir
    }

    fn run(&self, args: &[&str]) -> Result<String, GitError> {
        let command_line = args.join(" ");
        debug!(command = %command_line, dir = %self.workdir.display(), "running git");

        let output = self
            .command(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| spawn_error(&command_line, source))?;

        into_result(&command_line, &output)
    }

    fn run_with_timeout(&self, args: &[&str], timeout: Duration) -> Result<String, GitError> {
        let command_line = args.join(" ");
        debug!(command = %command_line, timeout_secs = timeout.as_secs(), "running git with deadline");

        let mut child = self
            .command(args)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| spawn_error(&command_line, source))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        let stdout_reader = thread::spawn(move || read_pipe(stdout));
        let stderr_reader = thread::spawn(move || read_pipe(stderr));

        let deadline = Instant::now() + timeout;
        let status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) if Instant::now() >= deadline => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(GitError::TimedOut {
                        command: command_line,
                        timeout,
                    });
                }
                Ok(None) => thread::sleep(Duration::from_millis(50)),
                Err(source) => return Err(spawn_error(&command_line, source)),
            }
        };

        let output = Output {
            status,
            stdout: stdout_reader.join().unwrap_or_default(),
            stderr: stderr_reader.join().unwrap_or_default(),
        };
        into_result(&command_line, &output)
    }

    fn run_interactive(&self, args: &[&str]) -> Result<(), GitError> {
        let command_line = args.join(" ");
        debug!(command = %command_line, "running git attached to terminal");

        let status = self
            .command(args)
            .status()
            .map_err(|source| spawn_error(&command_line, source))?;

        if status.success() {
            Ok(())
        } else {
            Err(GitError::Failed {
                command: command_line,
                code: status.code(),
                message: "interactive git command did not complete".to_string(),
            })
        }
    }
}

fn spawn_error(command: &str, source: io::Error) -> GitError {
    if source.kind() == io::ErrorKind::NotFound {
        GitError::NotInstalled
    } else {
        GitError::Spawn {
            command: command.to_string(),
            source,
        }
    }
}

fn read_pipe(pipe: Option<impl Read>) -> Vec<u8> {
    let mut buffer = Vec::new();
    if let Some(mut pipe) = pipe {
        let _ = pipe.read_to_end(&mut buffer);
    }
    buffer
}

fn into_result(command: &str, output: &Output) -> Result<String, GitError> {
    let stdout = String::from_utf8_lossy(&output.stdout);
    if output.status.success() {
        // Leading whitespace is meaningful in porcelain output (" M file")
        return Ok(stdout.trim_end().to_string());
    }

    let stderr = String::from_utf8_lossy(&output.stderr);
    let message = if stderr.trim().is_empty() {
        stdout.trim().to_string()
    } else {
        stderr.trim().to_string()
    };
    debug!(command, code = ?output.status.code(), %message, "git failed");

    Err(GitError::Failed {
        command: command.to_string(),
        code: output.status.code(),
        message,
    })
}

/// Branches as reported by `git branch -a`
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct BranchListing {
    pub current: Option<String>,
    pub local: Vec<String>,
    pub remote: Vec<String>,
}

impl BranchListing {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.is_none() && self.local.is_empty() && self.remote.is_empty()
    }
}

/// Parse the output of `git branch -a`
///
/// Symbolic remote refs (`remotes/origin/HEAD -> origin/main`) are skipped.
#[must_use]
pub fn parse_branch_listing(output: &str) -> BranchListing {
    let mut listing = BranchListing::default();

    for line in output.lines() {
        if line.trim().is_empty() || line.contains(" -> ") {
            continue;
        }

        if let Some(name) = line.strip_prefix("* ") {
            let name = name.trim();
            if !name.starts_with('(') {
                listing.current = Some(name.to_string());
            }
            continue;
        }

        let name = line.trim();
        if let Some(remote) = name.strip_prefix("remotes/") {
            listing.remote.push(remote.to_string());
        } else {
            listing.local.push(name.to_string());
        }
    }

    listing
}
