use anyhow::Result;
use clap::Args;

use crate::commands::{Outcome, require_repository, top_pathspec};
use crate::context::AppContext;
use crate::format::PorcelainEntry;
use crate::resolver::{Action, Choice, ResolveError, resolve};
use crate::selection::{RealSelectionProvider, SelectionProvider};
use crate::traits::GitOperations;

const NOTHING_SELECTED: &str = "You must specify at least one of --interactive, --all, or provide specific files to recover.";

#[derive(Debug, Default, Clone, Args)]
pub struct RecoverFlags {
    /// Files to restore to their last committed state
    #[arg(value_name = "FILES")]
    pub files: Vec<String>,
    /// Choose the files to restore from a list
    #[arg(short, long)]
    pub interactive: bool,
    /// Restore every modified or deleted tracked file
    #[arg(long)]
    pub all: bool,
    /// Move HEAD back to where it was before the last reset or commit (uses the reflog)
    #[arg(long)]
    pub previous_head: bool,
    /// Show what would be restored without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoverAction {
    Files(Vec<String>),
    Interactive,
    All,
    PreviousHead,
}

impl Action for RecoverAction {
    const MENU_PROMPT: &'static str = "What do you want to recover?";
    const CHOICES: &'static [Choice] = &[
        Choice::plain("files", "Specific files"),
        Choice::plain("interactive", "Pick files from a list"),
        Choice::plain("all", "All modified files"),
        Choice::plain("previous-head", "The state before the last reset"),
    ];

    fn from_choice(name: &str, argument: Option<String>) -> Result<Self, ResolveError> {
        match name {
            "files" => Ok(RecoverAction::Files(argument.into_iter().collect())),
            "interactive" => Ok(RecoverAction::Interactive),
            "all" => Ok(RecoverAction::All),
            "previous-head" => Ok(RecoverAction::PreviousHead),
            other => Err(ResolveError::InvalidAction(other.to_string())),
        }
    }

    fn name(&self) -> &'static str {
        match self {
            RecoverAction::Files(_) => "files",
            RecoverAction::Interactive => "interactive",
            RecoverAction::All => "all",
            RecoverAction::PreviousHead => "previous-head",
        }
    }
}

impl RecoverFlags {
    #[must_use]
    pub fn candidates(&self) -> Vec<RecoverAction> {
        let mut candidates = Vec::new();
        if !self.files.is_empty() {
            candidates.push(RecoverAction::Files(self.files.clone()));
        }
        if self.interactive {
            candidates.push(RecoverAction::Interactive);
        }
        if self.all {
            candidates.push(RecoverAction::All);
        }
        if self.previous_head {
            candidates.push(RecoverAction::PreviousHead);
        }
        candidates
    }
}

/// Where the paths handed to `git checkout` are resolved from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PathBase {
    /// Typed by the user, relative to the working directory
    Workdir,
    /// Reported by git status, relative to the top level
    Toplevel,
}

/// Tracked files whose working copy differs from HEAD and that HEAD can restore
///
/// Newly added and renamed files are left out since HEAD has no version of them.
#[must_use]
pub fn recoverable_files(entries: Vec<PorcelainEntry>) -> Vec<String> {
    entries
        .into_iter()
        .filter(|entry| !entry.is_untracked() && !matches!(entry.index, 'A' | 'R' | 'C' | '!'))
        .filter(|entry| entry.is_staged() || entry.is_unstaged())
        .map(|entry| entry.path)
        .collect()
}

/// # Errors
/// Returns an error if nothing was selected, the directory is not a
/// repository, or the restore fails
pub fn run(ctx: &AppContext, flags: &RecoverFlags) -> Result<Outcome> {
    run_with(&ctx.git(), &RealSelectionProvider, flags)
}

/// # Errors
/// Returns an error if nothing was selected, the directory is not a
/// repository, or the restore fails
pub fn run_with(
    git: &dyn GitOperations,
    provider: &dyn SelectionProvider,
    flags: &RecoverFlags,
) -> Result<Outcome> {
    let candidates = flags.candidates();
    if candidates.is_empty() {
        anyhow::bail!(NOTHING_SELECTED);
    }
    require_repository(git)?;

    match answer_or_cancel!(resolve(candidates, provider)) {
        RecoverAction::Files(files) => restore(git, &files, PathBase::Workdir, flags.dry_run),
        RecoverAction::All => {
            let files = recoverable_files(git.status_entries()?);
            if files.is_empty() {
                println!("Nothing to recover: no modified or deleted tracked files.");
                return Ok(Outcome::Completed);
            }
            if !flags.dry_run {
                println!("This will discard your changes in:");
                for file in &files {
                    println!("  - {file}");
                }
                let question = format!("Restore {} file(s) to their last committed state?", files.len());
                confirm_or_cancel!(provider, &question, false);
            }
            restore(git, &files, PathBase::Toplevel, flags.dry_run)
        }
        RecoverAction::Interactive => {
            let files = recoverable_files(git.status_entries()?);
            if files.is_empty() {
                println!("Nothing to recover: no modified or deleted tracked files.");
                return Ok(Outcome::Completed);
            }
            let chosen = answer_or_cancel!(provider.multi_select("Select files to restore:", files));
            if chosen.is_empty() {
                println!("No files selected.");
                return Ok(Outcome::Completed);
            }
            restore(git, &chosen, PathBase::Toplevel, flags.dry_run)
        }
        RecoverAction::PreviousHead => restore_previous_head(git, provider, flags.dry_run),
    }
}

fn restore(
    git: &dyn GitOperations,
    files: &[String],
    base: PathBase,
    dry_run: bool,
) -> Result<Outcome> {
    if dry_run {
        println!("Dry run, nothing changed. Would restore:");
        for file in files {
            println!("  - {file}");
        }
        return Ok(Outcome::Completed);
    }

    let pathspecs: Vec<String> = match base {
        PathBase::Workdir => files.to_vec(),
        PathBase::Toplevel => files.iter().map(|file| top_pathspec(file)).collect(),
    };
    let mut args = vec!["checkout", "HEAD", "--"];
    args.extend(pathspecs.iter().map(String::as_str));
    git.run(&args)?;

    println!("✓ Restored {} file(s):", files.len());
    for file in files {
        println!("  - {file}");
    }
    Ok(Outcome::Completed)
}

fn restore_previous_head(
    git: &dyn GitOperations,
    provider: &dyn SelectionProvider,
    dry_run: bool,
) -> Result<Outcome> {
    let history = git.run(&["reflog", "-n", "5"])?;
    println!("Recent HEAD history:");
    for line in history.lines() {
        println!("  {line}");
    }

    if dry_run {
        println!("Dry run, nothing changed. Would run `git reset --hard HEAD@{{1}}`.");
        return Ok(Outcome::Completed);
    }

    confirm_or_cancel!(
        provider,
        "Reset to HEAD@{1}? Uncommitted changes will be lost.",
        false
    );
    git.run(&["reset", "--hard", "HEAD@{1}"])?;
    println!("✓ Restored the previous HEAD");
    Ok(Outcome::Completed)
}
