use anyhow::{Context, Result};
use clap::Args;
use tracing::warn;

use crate::commands::sync::AUTO_STASH_LABEL;
use crate::commands::{Outcome, require_repository};
use crate::context::AppContext;
use crate::format::heading;
use crate::git::parse_branch_listing;
use crate::resolver::{Action, Choice, ResolveError, resolve};
use crate::selection::{RealSelectionProvider, SelectionProvider};
use crate::storage::{RepoConfig, update_repo_config};
use crate::traits::GitOperations;

#[derive(Debug, Default, Clone, Args)]
pub struct BranchFlags {
    /// List local and remote branches
    #[arg(short, long)]
    pub list: bool,
    /// Create a branch and switch to it
    #[arg(short, long, value_name = "NAME")]
    pub create: Option<String>,
    /// Rename the current branch
    #[arg(short, long, value_name = "NEW_NAME")]
    pub rename: Option<String>,
    /// Switch to another branch
    #[arg(short, long, value_name = "NAME")]
    pub switch: Option<String>,
    /// Delete a branch
    #[arg(short, long, value_name = "NAME")]
    pub delete: Option<String>,
    /// Rebase the current branch onto BASE
    #[arg(long, value_name = "BASE")]
    pub rebase: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchAction {
    List,
    Create(String),
    Rename(String),
    Switch(String),
    Delete(String),
    Rebase(String),
}

impl Action for BranchAction {
    const MENU_PROMPT: &'static str = "What would you like to do?";
    const CHOICES: &'static [Choice] = &[
        Choice::plain("list", "List branches"),
        Choice::with_argument("create", "Create a new branch", "Name of the new branch:", "branch name"),
        Choice::with_argument("rename", "Rename the current branch", "New name for the current branch:", "new branch name"),
        Choice::with_argument("switch", "Switch to another branch", "Branch to switch to:", "branch name"),
        Choice::with_argument("delete", "Delete a branch", "Branch to delete:", "branch name"),
        Choice::with_argument("rebase", "Rebase onto another branch", "Branch to rebase onto:", "base branch"),
    ];

    fn from_choice(name: &str, argument: Option<String>) -> Result<Self, ResolveError> {
        let argument = argument.unwrap_or_default();
        match name {
            "list" => Ok(BranchAction::List),
            "create" => Ok(BranchAction::Create(argument)),
            "rename" => Ok(BranchAction::Rename(argument)),
            "switch" => Ok(BranchAction::Switch(argument)),
            "delete" => Ok(BranchAction::Delete(argument)),
            "rebase" => Ok(BranchAction::Rebase(argument)),
            other => Err(ResolveError::InvalidAction(other.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            BranchAction::List => "list",
            BranchAction::Create(_) => "create",
            BranchAction::Rename(_) => "rename",
            BranchAction::Switch(_) => "switch",
            BranchAction::Delete(_) => "delete",
            BranchAction::Rebase(_) => "rebase",
        }
    }

    fn argument(&self) -> Option<&str> {
        match self {
            BranchAction::List => None,
            BranchAction::Create(name)
            | BranchAction::Rename(name)
            | BranchAction::Switch(name)
            | BranchAction::Delete(name)
            | BranchAction::Rebase(name) => Some(name),
        }
    }
}

impl BranchFlags {
    /// Requested actions in flag declaration order
    #[must_use]
    pub fn candidates(&self) -> Vec<BranchAction> {
        let mut candidates = Vec::new();
        if self.list {
            candidates.push(BranchAction::List);
        }
        if let Some(name) = &self.create {
            candidates.push(BranchAction::Create(name.clone()));
        }
        if let Some(name) = &self.rename {
            candidates.push(BranchAction::Rename(name.clone()));
        }
        if let Some(name) = &self.switch {
            candidates.push(BranchAction::Switch(name.clone()));
        }
        if let Some(name) = &self.delete {
            candidates.push(BranchAction::Delete(name.clone()));
        }
        if let Some(base) = &self.rebase {
            candidates.push(BranchAction::Rebase(base.clone()));
        }
        candidates
    }
}

/// # Errors
/// Returns an error if the directory is not a repository or the git step fails
pub fn run(ctx: &AppContext, flags: &BranchFlags) -> Result<Outcome> {
    run_with(&ctx.git(), &RealSelectionProvider, flags)
}

/// # Errors
/// Returns an error if:
/// - The directory is not a repository
/// - A required branch name is empty or invalid
/// - The git step fails
pub fn run_with(
    git: &dyn GitOperations,
    provider: &dyn SelectionProvider,
    flags: &BranchFlags,
) -> Result<Outcome> {
    require_repository(git)?;

    let action = answer_or_cancel!(resolve(flags.candidates(), provider));
    match action {
        BranchAction::List => list_branches(git),
        BranchAction::Create(name) => create_branch(git, name.trim()),
        BranchAction::Rename(name) => rename_branch(git, name.trim()),
        BranchAction::Switch(name) => switch_branch(git, name.trim()),
        BranchAction::Delete(name) => delete_branch(git, name.trim()),
        BranchAction::Rebase(base) => rebase_onto(git, provider, base.trim()),
    }
}

fn list_branches(git: &dyn GitOperations) -> Result<Outcome> {
    let listing = parse_branch_listing(&git.run(&["branch", "-a"])?);

    println!("{}", heading("Branches"));
    if listing.is_empty() {
        println!("No branches yet. Make a first commit with `glc save`.");
        return Ok(Outcome::Completed);
    }

    if let Some(current) = &listing.current {
        println!("Current:");
        println!("  * {current}");
    }
    if !listing.local.is_empty() {
        println!();
        println!("Local ({}):", listing.local.len());
        for branch in &listing.local {
            println!("    {branch}");
        }
    }
    if !listing.remote.is_empty() {
        println!();
        println!("Remote ({}):", listing.remote.len());
        for branch in &listing.remote {
            println!("    {branch}");
        }
    }
    Ok(Outcome::Completed)
}

fn validate_branch_name(git: &dyn GitOperations, name: &str) -> Result<()> {
    git.run(&["check-ref-format", "--branch", name])
        .map(|_| ())
        .map_err(|_| anyhow::anyhow!("'{name}' is not a valid branch name"))
}

fn create_branch(git: &dyn GitOperations, name: &str) -> Result<Outcome> {
    validate_branch_name(git, name)?;
    if git.branch_exists(name) {
        anyhow::bail!("Branch '{name}' already exists. Use `glc branch --switch {name}` instead.");
    }

    git.run(&["checkout", "-b", name])?;
    record_branches(git, |config| {
        config.add_branch(name);
    });
    println!("✓ Created and switched to branch '{name}'");
    Ok(Outcome::Completed)
}

fn rename_branch(git: &dyn GitOperations, new_name: &str) -> Result<Outcome> {
    validate_branch_name(git, new_name)?;
    let current = git.current_branch()?;
    if current.is_empty() {
        anyhow::bail!("HEAD is detached; there is no current branch to rename.");
    }
    if current == new_name {
        println!("Branch is already named '{new_name}'.");
        return Ok(Outcome::Completed);
    }

    git.run(&["branch", "-m", new_name])?;
    record_branches(git, |config| config.rename_branch(&current, new_name));
    println!("✓ Renamed '{current}' to '{new_name}'");
    Ok(Outcome::Completed)
}

fn switch_branch(git: &dyn GitOperations, name: &str) -> Result<Outcome> {
    if git.current_branch()? == name {
        println!("⚠ Already on '{name}'");
        return Ok(Outcome::Completed);
    }

    git.run(&["checkout", name])
        .with_context(|| format!("Could not switch to '{name}'"))?;
    println!("✓ Switched to branch '{name}'");
    Ok(Outcome::Completed)
}

fn delete_branch(git: &dyn GitOperations, name: &str) -> Result<Outcome> {
    if git.current_branch()? == name {
        anyhow::bail!(
            "Cannot delete '{name}' while it is checked out. Switch first with `glc branch --switch <other>`."
        );
    }

    git.run(&["branch", "-d", name])
        .with_context(|| format!("Could not delete '{name}'"))?;
    record_branches(git, |config| {
        config.remove_branch(name);
    });
    println!("✓ Deleted branch '{name}'");
    Ok(Outcome::Completed)
}

fn rebase_onto(
    git: &dyn GitOperations,
    provider: &dyn SelectionProvider,
    base: &str,
) -> Result<Outcome> {
    if !git.ref_exists(base) {
        anyhow::bail!("Base branch '{base}' does not exist.");
    }
    let current = git.current_branch()?;

    let mut stashed = false;
    if git.has_changes()? {
        println!("⚠ You have uncommitted changes.");
        confirm_or_cancel!(provider, "Stash them before rebasing?", true);
        git.run(&["stash", "push", "-u", "-m", AUTO_STASH_LABEL])?;
        println!("✓ Stashed local changes");
        stashed = true;
    }

    if let Err(error) = git.run(&["rebase", base]) {
        println!("✗ Rebase stopped: {}", error.message());
        println!("  Resolve the conflicts, then run `git rebase --continue` (or `git rebase --abort`).");
        if stashed {
            println!("  Your uncommitted changes are stashed as '{AUTO_STASH_LABEL}'.");
        }
        return Err(error).with_context(|| format!("Rebase of '{current}' onto '{base}' failed"));
    }
    println!("✓ Rebased '{current}' onto '{base}'");

    if stashed {
        let restore = answer_or_cancel!(provider.confirm("Restore your stashed changes now?", true));
        if restore {
            git.run(&["stash", "pop"])?;
            println!("✓ Restored stashed changes");
        } else {
            println!("Your changes remain stashed as '{AUTO_STASH_LABEL}'.");
        }
    }
    Ok(Outcome::Completed)
}

fn record_branches(git: &dyn GitOperations, change: impl FnOnce(&mut RepoConfig)) {
    let Ok(root) = git.toplevel() else {
        return;
    };
    if root.as_os_str().is_empty() {
        return;
    }
    if let Err(error) = update_repo_config(&root, change) {
        warn!(%error, "could not update project branch list");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::ScriptedGit;
    use crate::selection::{MockAnswer, MockSelectionProvider};

    fn on_main() -> ScriptedGit {
        ScriptedGit::in_repo("/repo").respond("branch --show-current", "main")
    }

    #[test]
    fn test_candidates_follow_flag_order() {
        let flags = BranchFlags {
            delete: Some("old".to_string()),
            list: true,
            ..BranchFlags::default()
        };
        assert_eq!(
            flags.candidates(),
            vec![BranchAction::List, BranchAction::Delete("old".to_string())]
        );
    }

    #[test]
    fn test_create_single_flag_without_prompt() -> Result<()> {
        let git = on_main().fail("rev-parse --verify --quiet refs/heads/feature", "");
        let flags = BranchFlags {
            create: Some("feature".to_string()),
            ..BranchFlags::default()
        };
        let provider = MockSelectionProvider::silent();

        run_with(&git, &provider, &flags)?;

        assert!(provider.prompts().is_empty());
        assert!(git.was_called("checkout -b feature"));
        Ok(())
    }

    #[test]
    fn test_create_existing_branch_fails() {
        let git = on_main();
        let flags = BranchFlags {
            create: Some("main".to_string()),
            ..BranchFlags::default()
        };
        assert!(run_with(&git, &MockSelectionProvider::silent(), &flags).is_err());
        assert!(!git.was_called("checkout -b main"));
    }

    #[test]
    fn test_menu_path_prompts_for_name() -> Result<()> {
        let git = on_main();
        let provider = MockSelectionProvider::new([
            MockAnswer::text("Switch to another branch"),
            MockAnswer::text("develop"),
        ]);

        run_with(&git, &provider, &BranchFlags::default())?;
        assert!(git.was_called("checkout develop"));
        Ok(())
    }

    #[test]
    fn test_conflicting_flags_declined_runs_nothing() -> Result<()> {
        let git = on_main();
        let flags = BranchFlags {
            create: Some("a".to_string()),
            delete: Some("b".to_string()),
            ..BranchFlags::default()
        };
        let provider = MockSelectionProvider::new([MockAnswer::Confirm(false)]);

        assert_eq!(run_with(&git, &provider, &flags)?, Outcome::Cancelled);
        assert_eq!(git.calls(), vec!["rev-parse --is-inside-work-tree"]);
        Ok(())
    }

    #[test]
    fn test_delete_current_branch_refused() {
        let git = on_main();
        let flags = BranchFlags {
            delete: Some("main".to_string()),
            ..BranchFlags::default()
        };
        assert!(run_with(&git, &MockSelectionProvider::silent(), &flags).is_err());
        assert!(!git.was_called("branch -d main"));
    }

    #[test]
    fn test_switch_to_current_branch_is_noop() -> Result<()> {
        let git = on_main();
        let flags = BranchFlags {
            switch: Some("main".to_string()),
            ..BranchFlags::default()
        };
        run_with(&git, &MockSelectionProvider::silent(), &flags)?;
        assert!(!git.was_called("checkout main"));
        Ok(())
    }

    #[test]
    fn test_rebase_with_stash_and_restore() -> Result<()> {
        let git = on_main().respond("status --porcelain", " M a.rs");
        let provider =
            MockSelectionProvider::new([MockAnswer::Confirm(true), MockAnswer::Confirm(true)]);
        let flags = BranchFlags {
            rebase: Some("develop".to_string()),
            ..BranchFlags::default()
        };

        run_with(&git, &provider, &flags)?;

        let calls = git.calls();
        let position = |command: &str| calls.iter().position(|call| call == command);
        assert!(position("stash push -u -m glc-auto-stash") < position("rebase develop"));
        assert!(position("rebase develop") < position("stash pop"));
        Ok(())
    }

    #[test]
    fn test_rebase_unknown_base_fails() {
        let git = on_main().fail("rev-parse --verify --quiet nowhere", "");
        let flags = BranchFlags {
            rebase: Some("nowhere".to_string()),
            ..BranchFlags::default()
        };
        assert!(run_with(&git, &MockSelectionProvider::silent(), &flags).is_err());
    }

    #[test]
    fn test_blank_flag_value_is_rejected() {
        let git = on_main();
        let flags = BranchFlags {
            create: Some("   ".to_string()),
            ..BranchFlags::default()
        };
        let result = run_with(&git, &MockSelectionProvider::silent(), &flags);
        assert!(result.is_err_and(|e| e.to_string() == "branch name cannot be empty"));
    }
}
