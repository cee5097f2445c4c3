use anyhow::Result;
use clap::Args;

use crate::commands::{Outcome, require_repository, top_pathspec};
use crate::context::AppContext;
use crate::resolver::{Action, Choice, ResolveError, resolve};
use crate::selection::{RealSelectionProvider, SelectionProvider};
use crate::traits::GitOperations;

#[derive(Debug, Default, Clone, Args)]
pub struct UnstageFlags {
    /// Unstage everything
    #[arg(long)]
    pub all: bool,
    /// Unstage a single file
    #[arg(long, value_name = "FILE")]
    pub file: Option<String>,
    /// Unstage every currently staged file, listing them
    #[arg(long)]
    pub staged: bool,
    /// Pick hunks to unstage (`git reset -p`)
    #[arg(short, long)]
    pub interactive: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnstageAction {
    All,
    File(String),
    Staged,
    Interactive,
}

impl Action for UnstageAction {
    const MENU_PROMPT: &'static str = "What do you want to unstage?";
    const CHOICES: &'static [Choice] = &[
        Choice::plain("all", "Everything"),
        Choice::with_argument("file", "A specific file", "File to unstage:", "file path"),
        Choice::plain("staged", "All staged files (show me which)"),
        Choice::plain("interactive", "Pick hunks interactively"),
    ];

    fn from_choice(name: &str, argument: Option<String>) -> Result<Self, ResolveError> {
        match name {
            "all" => Ok(UnstageAction::All),
            "file" => Ok(UnstageAction::File(argument.unwrap_or_default())),
            "staged" => Ok(UnstageAction::Staged),
            "interactive" => Ok(UnstageAction::Interactive),
            other => Err(ResolveError::InvalidAction(other.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            UnstageAction::All => "all",
            UnstageAction::File(_) => "file",
            UnstageAction::Staged => "staged",
            UnstageAction::Interactive => "interactive",
        }
    }

    fn argument(&self) -> Option<&str> {
        match self {
            UnstageAction::File(path) => Some(path),
            _ => None,
        }
    }
}

impl UnstageFlags {
    #[must_use]
    pub fn candidates(&self) -> Vec<UnstageAction> {
        let mut candidates = Vec::new();
        if self.all {
            candidates.push(UnstageAction::All);
        }
        if let Some(path) = &self.file {
            candidates.push(UnstageAction::File(path.clone()));
        }
        if self.staged {
            candidates.push(UnstageAction::Staged);
        }
        if self.interactive {
            candidates.push(UnstageAction::Interactive);
        }
        candidates
    }
}

/// # Errors
/// Returns an error if the directory is not a repository or the reset fails
pub fn run(ctx: &AppContext, flags: &UnstageFlags) -> Result<Outcome> {
    run_with(&ctx.git(), &RealSelectionProvider, flags)
}

/// # Errors
/// Returns an error if the directory is not a repository or the reset fails
pub fn run_with(
    git: &dyn GitOperations,
    provider: &dyn SelectionProvider,
    flags: &UnstageFlags,
) -> Result<Outcome> {
    require_repository(git)?;

    match answer_or_cancel!(resolve(flags.candidates(), provider)) {
        UnstageAction::All => {
            git.run(&["reset", "HEAD"])?;
            println!("✓ Unstaged all changes");
        }
        UnstageAction::File(path) => {
            let path = path.trim();
            git.run(&["reset", "HEAD", "--", path])?;
            println!("✓ Unstaged {path}");
        }
        UnstageAction::Staged => {
            let staged = git.staged_files()?;
            if staged.is_empty() {
                println!("Nothing is staged.");
                return Ok(Outcome::Completed);
            }
            let pathspecs: Vec<String> = staged.iter().map(|path| top_pathspec(path)).collect();
            let mut args = vec!["reset", "HEAD", "--"];
            args.extend(pathspecs.iter().map(String::as_str));
            git.run(&args)?;
            println!("✓ Unstaged {} file(s):", staged.len());
            for path in &staged {
                println!("  - {path}");
            }
        }
        UnstageAction::Interactive => {
            git.run_interactive(&["reset", "-p"])?;
            println!("✓ Interactive unstage finished");
        }
    }
    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::ScriptedGit;
    use crate::selection::MockSelectionProvider;

    #[test]
    fn test_unstage_staged_lists_and_resets() -> Result<()> {
        let git = ScriptedGit::in_repo("/repo").respond("diff --cached --name-only -z", "a.rs\0src/b.rs\0");
        let flags = UnstageFlags {
            staged: true,
            ..UnstageFlags::default()
        };

        run_with(&git, &MockSelectionProvider::silent(), &flags)?;
        assert!(git.was_called("reset HEAD -- :(top,literal)a.rs :(top,literal)src/b.rs"));
        Ok(())
    }

    #[test]
    fn test_unstage_staged_with_nothing_staged() -> Result<()> {
        let git = ScriptedGit::in_repo("/repo");
        let flags = UnstageFlags {
            staged: true,
            ..UnstageFlags::default()
        };

        run_with(&git, &MockSelectionProvider::silent(), &flags)?;
        assert!(!git.calls().iter().any(|call| call.starts_with("reset")));
        Ok(())
    }

    #[test]
    fn test_unstage_file_and_interactive() -> Result<()> {
        let git = ScriptedGit::in_repo("/repo");
        let file = UnstageFlags {
            file: Some("notes.md".to_string()),
            ..UnstageFlags::default()
        };
        let interactive = UnstageFlags {
            interactive: true,
            ..UnstageFlags::default()
        };

        run_with(&git, &MockSelectionProvider::silent(), &file)?;
        run_with(&git, &MockSelectionProvider::silent(), &interactive)?;

        assert!(git.was_called("reset HEAD -- notes.md"));
        assert!(git.was_called("reset -p"));
        Ok(())
    }
}
