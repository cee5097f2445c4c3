use anyhow::Result;
use clap::Args;

use crate::commands::{Outcome, require_repository};
use crate::context::AppContext;
use crate::resolver::{Action, Choice, ResolveError, resolve};
use crate::selection::{RealSelectionProvider, SelectionProvider};
use crate::traits::GitOperations;

#[derive(Debug, Default, Clone, Args)]
pub struct UndoFlags {
    /// Undo the last commit, keep its changes staged
    #[arg(long)]
    pub soft: bool,
    /// Undo the last commit and discard its changes
    #[arg(long)]
    pub hard: bool,
    /// Undo the last commit, keep its changes unstaged
    #[arg(long)]
    pub mixed: bool,
    /// Reopen the last commit for amending
    #[arg(long)]
    pub amend: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndoAction {
    Soft,
    Hard,
    Mixed,
    Amend,
}

impl Action for UndoAction {
    const MENU_PROMPT: &'static str = "How do you want to undo the last commit?";
    const CHOICES: &'static [Choice] = &[
        Choice::plain("soft", "Soft: keep changes staged"),
        Choice::plain("hard", "Hard: discard all changes (cannot be undone)"),
        Choice::plain("mixed", "Mixed: keep changes, unstaged"),
        Choice::plain("amend", "Amend: reopen the commit to edit it"),
    ];

    fn from_choice(name: &str, _argument: Option<String>) -> Result<Self, ResolveError> {
        match name {
            "soft" => Ok(UndoAction::Soft),
            "hard" => Ok(UndoAction::Hard),
            "mixed" => Ok(UndoAction::Mixed),
            "amend" => Ok(UndoAction::Amend),
            other => Err(ResolveError::InvalidAction(other.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            UndoAction::Soft => "soft",
            UndoAction::Hard => "hard",
            UndoAction::Mixed => "mixed",
            UndoAction::Amend => "amend",
        }
    }
}

impl UndoFlags {
    #[must_use]
    pub fn candidates(&self) -> Vec<UndoAction> {
        [
            (self.soft, UndoAction::Soft),
            (self.hard, UndoAction::Hard),
            (self.mixed, UndoAction::Mixed),
            (self.amend, UndoAction::Amend),
        ]
        .into_iter()
        .filter_map(|(set, action)| set.then_some(action))
        .collect()
    }
}

/// # Errors
/// Returns an error if the directory is not a repository, there is no
/// commit to undo, or the reset fails
pub fn run(ctx: &AppContext, flags: &UndoFlags) -> Result<Outcome> {
    run_with(&ctx.git(), &RealSelectionProvider, flags)
}

/// # Errors
/// Returns an error if the directory is not a repository, there is no
/// commit to undo, or the reset fails
pub fn run_with(
    git: &dyn GitOperations,
    provider: &dyn SelectionProvider,
    flags: &UndoFlags,
) -> Result<Outcome> {
    require_repository(git)?;

    let action = answer_or_cancel!(resolve(flags.candidates(), provider));

    if !git.has_parent_commit() {
        anyhow::bail!("Nothing to undo: the current branch has fewer than two commits.");
    }

    let last = git.run(&["log", "-1", "--format=%h %s"]).unwrap_or_default();

    match action {
        UndoAction::Soft => {
            git.run(&["reset", "--soft", "HEAD~1"])?;
            println!("✓ Undid commit {last}; its changes are staged.");
        }
        UndoAction::Mixed => {
            git.run(&["reset", "--mixed", "HEAD~1"])?;
            println!("✓ Undid commit {last}; its changes are in your working tree.");
        }
        UndoAction::Hard => {
            git.run(&["reset", "--hard", "HEAD~1"])?;
            println!("✓ Undid commit {last} and discarded its changes.");
            println!("  Changed your mind? `glc recover --previous-head` brings it back.");
        }
        UndoAction::Amend => {
            git.run(&["reset", "--soft", "HEAD~1"])?;
            println!("✓ Reopened commit {last} for amending.");
            println!("  Make your edits, then run `glc save -m \"<message>\"`.");
        }
    }
    Ok(Outcome::Completed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::ScriptedGit;
    use crate::selection::{MockAnswer, MockSelectionProvider};

    #[test]
    fn test_each_flag_maps_to_reset_mode() -> Result<()> {
        let cases = [
            (UndoFlags { soft: true, ..UndoFlags::default() }, "reset --soft HEAD~1"),
            (UndoFlags { hard: true, ..UndoFlags::default() }, "reset --hard HEAD~1"),
            (UndoFlags { mixed: true, ..UndoFlags::default() }, "reset --mixed HEAD~1"),
            (UndoFlags { amend: true, ..UndoFlags::default() }, "reset --soft HEAD~1"),
        ];

        for (flags, expected) in cases {
            let git = ScriptedGit::in_repo("/repo");
            run_with(&git, &MockSelectionProvider::silent(), &flags)?;
            assert!(git.was_called(expected), "expected {expected}");
        }
        Ok(())
    }

    #[test]
    fn test_single_commit_refuses() {
        let git = ScriptedGit::in_repo("/repo").fail("rev-parse --verify --quiet HEAD~1", "");
        let flags = UndoFlags {
            soft: true,
            ..UndoFlags::default()
        };
        assert!(run_with(&git, &MockSelectionProvider::silent(), &flags).is_err());
        assert!(!git.calls().iter().any(|call| call.starts_with("reset")));
    }

    #[test]
    fn test_menu_selection() -> Result<()> {
        let git = ScriptedGit::in_repo("/repo");
        let provider = MockSelectionProvider::new([MockAnswer::text("Mixed: keep changes, unstaged")]);

        run_with(&git, &provider, &UndoFlags::default())?;
        assert!(git.was_called("reset --mixed HEAD~1"));
        Ok(())
    }
}
