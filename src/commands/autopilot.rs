use anyhow::Result;
use clap::Args;

use crate::commands::save::{commit_changes, validate_message};
use crate::commands::sync::{SyncFlags, SyncPlan, sync_branch};
use crate::commands::{Outcome, require_repository};
use crate::config::SyncSettings;
use crate::context::AppContext;
use crate::format::{classify_porcelain, heading};
use crate::traits::GitOperations;

#[derive(Debug, Default, Clone, Args)]
pub struct AutopilotFlags {
    /// Show the plan without running it
    #[arg(short = 'n', long)]
    pub dry_run: bool,
    /// Commit message (generated from the change count when omitted)
    #[arg(short, long)]
    pub message: Option<String>,
}

#[must_use]
pub fn generated_message(changed: usize) -> String {
    format!("glc autopilot: {changed} file(s) changed")
}

/// Commit everything, then sync the current branch
///
/// # Errors
/// Returns an error if the directory is not a repository, HEAD is detached,
/// the message is blank, or any git step fails
pub fn run(ctx: &AppContext, flags: &AutopilotFlags) -> Result<Outcome> {
    run_with(&ctx.git(), &ctx.settings.sync, flags)
}

/// # Errors
/// Returns an error if the directory is not a repository, HEAD is detached,
/// the message is blank, or any git step fails
pub fn run_with(
    git: &dyn GitOperations,
    settings: &SyncSettings,
    flags: &AutopilotFlags,
) -> Result<Outcome> {
    require_repository(git)?;

    let branch = git.current_branch()?;
    if branch.is_empty() {
        anyhow::bail!("Autopilot needs a branch: HEAD is detached.");
    }

    let changed = classify_porcelain(&git.status_porcelain()?).total();
    let message = match flags.message.as_deref() {
        Some(message) => validate_message(message)?,
        None => generated_message(changed),
    };
    let plan = SyncPlan::new(branch, &SyncFlags::default(), settings);

    if flags.dry_run {
        println!("{}", heading("Autopilot plan (dry run)"));
        if changed == 0 {
            println!("1. Nothing to commit");
        } else {
            println!("1. Commit {changed} file(s): \"{message}\"");
        }
        println!("2. Pull {}/{} with rebase", plan.remote, plan.branch);
        println!("3. Push {} to {}", plan.branch, plan.remote);
        return Ok(Outcome::Completed);
    }

    let committed = if changed > 0 {
        commit_changes(git, true, &[], &message)?
    } else {
        0
    };
    if committed == 0 {
        println!("Nothing to commit, syncing only.");
    }
    sync_branch(git, &plan)?;
    Ok(Outcome::Completed)
}
