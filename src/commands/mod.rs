//! One module per `glc` subcommand.
//!
//! Each command exposes `run(ctx, flags)` for the binary and a `run_with`
//! variant taking the git runner, prompt provider and (where needed) GitHub
//! client explicitly, which is what the tests drive.

/// How a command ended when it did not fail
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    /// The user backed out of a prompt or declined a confirmation
    Cancelled,
}

/// Unwrap a `Result<Prompt<T>>`, returning `Ok(Outcome::Cancelled)` from the
/// enclosing function when the user cancelled
macro_rules! answer_or_cancel {
    ($prompt:expr) => {
        match $prompt? {
            $crate::selection::Prompt::Answer(value) => value,
            $crate::selection::Prompt::Cancelled => {
                return Ok($crate::commands::Outcome::Cancelled);
            }
        }
    };
}

/// Ask a yes/no question; anything but "yes" ends the command as cancelled
macro_rules! confirm_or_cancel {
    ($provider:expr, $question:expr, $default:expr) => {
        if !answer_or_cancel!($provider.confirm($question, $default)) {
            return Ok($crate::commands::Outcome::Cancelled);
        }
    };
}

pub mod auth;
pub mod autopilot;
pub mod branch;
pub mod clone;
pub mod create;
pub mod doctor;
pub mod ignore;
pub mod recover;
pub mod save;
pub mod size;
pub mod status;
pub mod sync;
pub mod undo;
pub mod unstage;

use anyhow::Result;

use crate::traits::GitOperations;

/// Fail with the standard message unless the working directory is a repository
///
/// # Errors
/// Returns an error if the working directory is not inside a git work tree
pub fn require_repository(git: &dyn GitOperations) -> Result<()> {
    if git.is_inside_work_tree() {
        Ok(())
    } else {
        anyhow::bail!("Not a git repository. Run `git init` or `glc save` to create one.")
    }
}

/// Pathspec for a path git reported relative to the top level
///
/// Status and diff output name files from the repository root, while git
/// resolves plain pathspecs against the working directory.
#[must_use]
pub fn top_pathspec(path: &str) -> String {
    format!(":(top,literal){path}")
}
