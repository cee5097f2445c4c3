use anyhow::{Context, Result};
use clap::Args;
use tracing::{debug, warn};

use crate::commands::{Outcome, require_repository};
use crate::config::SyncSettings;
use crate::context::AppContext;
use crate::traits::GitOperations;

/// Message of the stash `sync` creates for uncommitted work
pub const AUTO_STASH_LABEL: &str = "glc-auto-stash";

#[derive(Debug, Default, Clone, Args)]
pub struct SyncFlags {
    /// Branch to sync (defaults to the current branch)
    #[arg(short, long)]
    pub branch: Option<String>,
    /// Skip `git pull --rebase`
    #[arg(long)]
    pub no_pull: bool,
    /// Skip `git push`
    #[arg(long)]
    pub no_push: bool,
    /// Do not stash uncommitted changes first
    #[arg(long)]
    pub no_stash: bool,
    /// Leave the automatic stash in place when pull or push fails
    #[arg(long)]
    pub keep_stash_on_failure: bool,
}

/// Fully resolved sync steps
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncPlan {
    pub remote: String,
    pub branch: String,
    pub stash: bool,
    pub pull: bool,
    pub push: bool,
    pub restore_stash_on_failure: bool,
}

impl SyncPlan {
    #[must_use]
    pub fn new(branch: impl Into<String>, flags: &SyncFlags, settings: &SyncSettings) -> Self {
        Self {
            remote: settings.remote.clone(),
            branch: branch.into(),
            stash: !flags.no_stash,
            pull: !flags.no_pull,
            push: !flags.no_push,
            restore_stash_on_failure: settings.restore_stash_on_failure
                && !flags.keep_stash_on_failure,
        }
    }
}

/// Stash, pull with rebase, push and restore the stash
///
/// # Errors
/// Returns an error if:
/// - The directory is not a repository or HEAD is detached
/// - Any git step fails
pub fn run(ctx: &AppContext, flags: &SyncFlags) -> Result<Outcome> {
    run_with(&ctx.git(), &ctx.settings.sync, flags)
}

/// # Errors
/// Returns an error if:
/// - The directory is not a repository or HEAD is detached
/// - Any git step fails
pub fn run_with(
    git: &dyn GitOperations,
    settings: &SyncSettings,
    flags: &SyncFlags,
) -> Result<Outcome> {
    require_repository(git)?;

    let branch = match flags
        .branch
        .as_deref()
        .map(str::trim)
        .filter(|branch| !branch.is_empty())
    {
        Some(branch) => branch.to_string(),
        None => git.current_branch()?,
    };
    if branch.is_empty() {
        anyhow::bail!("No branch to sync: HEAD is detached. Pass one with --branch <name>.");
    }

    sync_branch(git, &SyncPlan::new(branch, flags, settings))?;
    Ok(Outcome::Completed)
}

/// Execute a plan step by step, stopping at the first failure
///
/// When a stash was made and pull or push fails, the stash is popped before
/// the error is returned if `restore_stash_on_failure` is set.
///
/// # Errors
/// Returns the first failing step's error
pub fn sync_branch(git: &dyn GitOperations, plan: &SyncPlan) -> Result<()> {
    println!("Syncing '{}' with {}", plan.branch, plan.remote);
    debug!(?plan, "sync plan");

    let stashed = if plan.stash && git.has_changes()? {
        git.run(&["stash", "push", "-u", "-m", AUTO_STASH_LABEL])
            .context("Failed to stash local changes")?;
        println!("✓ Stashed local changes");
        true
    } else {
        false
    };

    if let Err(error) = exchange(git, plan) {
        if stashed {
            if plan.restore_stash_on_failure {
                restore_after_failure(git);
            } else {
                println!(
                    "⚠ Your changes are still stashed as '{AUTO_STASH_LABEL}'. Run `git stash pop` when ready."
                );
            }
        }
        return Err(error);
    }

    if stashed {
        git.run(&["stash", "pop"]).context(
            "Synced, but restoring your stashed changes failed; they are still in `git stash list`",
        )?;
        println!("✓ Restored stashed changes");
    }

    println!("✓ '{}' is in sync with {}", plan.branch, plan.remote);
    Ok(())
}

fn exchange(git: &dyn GitOperations, plan: &SyncPlan) -> Result<()> {
    if plan.pull {
        git.run(&["pull", "--rebase", &plan.remote, &plan.branch])
            .with_context(|| format!("Failed to pull {}/{}", plan.remote, plan.branch))?;
        println!("✓ Pulled latest changes (rebase)");
    }

    if plan.push {
        git.run(&["push", &plan.remote, &plan.branch])
            .with_context(|| format!("Failed to push to {}/{}", plan.remote, plan.branch))?;
        println!("✓ Pushed to {}/{}", plan.remote, plan.branch);
    }

    Ok(())
}

fn restore_after_failure(git: &dyn GitOperations) {
    match git.run(&["stash", "pop"]) {
        Ok(_) => println!("✓ Restored stashed changes after the failed sync"),
        Err(error) => {
            warn!(%error, "stash pop after failed sync");
            println!(
                "⚠ Could not restore stashed changes ({}). They remain stashed as '{AUTO_STASH_LABEL}'.",
                error.message()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::ScriptedGit;

    fn dirty_repo() -> ScriptedGit {
        ScriptedGit::in_repo("/repo")
            .respond("branch --show-current", "main")
            .respond("status --porcelain", " M src/lib.rs")
    }

    #[test]
    fn test_dirty_tree_runs_steps_in_order() -> Result<()> {
        let git = dirty_repo();
        run_with(&git, &SyncSettings::default(), &SyncFlags::default())?;

        assert_eq!(
            git.calls(),
            vec![
                "rev-parse --is-inside-work-tree",
                "branch --show-current",
                "status --porcelain",
                "stash push -u -m glc-auto-stash",
                "pull --rebase origin main",
                "push origin main",
                "stash pop",
            ]
        );
        Ok(())
    }

    #[test]
    fn test_failed_push_still_pops_stash() {
        let git = dirty_repo().fail("push", "rejected (non-fast-forward)");
        let result = run_with(&git, &SyncSettings::default(), &SyncFlags::default());

        assert!(result.is_err_and(|e| e.to_string().contains("Failed to push to origin/main")));
        let calls = git.calls();
        assert_eq!(calls.last().map(String::as_str), Some("stash pop"));
        assert!(calls.contains(&"push origin main".to_string()));
    }

    #[test]
    fn test_keep_stash_on_failure_leaves_stash() {
        let git = dirty_repo().fail("pull", "conflict");
        let flags = SyncFlags {
            keep_stash_on_failure: true,
            ..SyncFlags::default()
        };

        assert!(run_with(&git, &SyncSettings::default(), &flags).is_err());
        assert!(!git.was_called("stash pop"));
        assert!(!git.was_called("push origin main"));
    }

    #[test]
    fn test_settings_can_disable_restore() {
        let git = dirty_repo().fail("push", "denied");
        let settings = SyncSettings {
            restore_stash_on_failure: false,
            ..SyncSettings::default()
        };

        assert!(run_with(&git, &settings, &SyncFlags::default()).is_err());
        assert!(!git.was_called("stash pop"));
    }

    #[test]
    fn test_clean_tree_skips_stash() -> Result<()> {
        let git = ScriptedGit::in_repo("/repo").respond("branch --show-current", "dev");
        run_with(&git, &SyncSettings::default(), &SyncFlags::default())?;

        assert!(!git.calls().iter().any(|call| call.starts_with("stash")));
        assert!(git.was_called("pull --rebase origin dev"));
        assert!(git.was_called("push origin dev"));
        Ok(())
    }

    #[test]
    fn test_flags_skip_steps() -> Result<()> {
        let git = dirty_repo();
        let flags = SyncFlags {
            branch: Some("release".to_string()),
            no_pull: true,
            no_stash: true,
            ..SyncFlags::default()
        };
        run_with(&git, &SyncSettings::default(), &flags)?;

        assert_eq!(
            git.calls(),
            vec!["rev-parse --is-inside-work-tree", "push origin release"]
        );
        Ok(())
    }

    #[test]
    fn test_detached_head_is_an_error() {
        let git = ScriptedGit::in_repo("/repo");
        assert!(run_with(&git, &SyncSettings::default(), &SyncFlags::default()).is_err());
    }
}
