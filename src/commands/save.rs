use anyhow::Result;
use clap::Args;

use crate::commands::Outcome;
use crate::context::AppContext;
use crate::selection::{RealSelectionProvider, SelectionProvider};
use crate::traits::GitOperations;

#[derive(Debug, Default, Clone, Args)]
pub struct SaveFlags {
    /// Stage every change, including deletions outside the current directory
    #[arg(short, long)]
    pub all: bool,
    /// Files to leave out of this commit
    #[arg(short, long, num_args = 1.., value_name = "FILES")]
    pub exclude: Vec<String>,
    /// Commit message (prompted for when omitted)
    #[arg(short, long)]
    pub message: Option<String>,
}

/// Stage and commit the working tree
///
/// # Errors
/// Returns an error if:
/// - The commit message is empty
/// - Any git step fails
pub fn run(ctx: &AppContext, flags: &SaveFlags) -> Result<Outcome> {
    run_with(&ctx.git(), &RealSelectionProvider, flags)
}

/// # Errors
/// Returns an error if:
/// - The commit message is empty (checked before git is touched)
/// - Initialising, staging or committing fails
pub fn run_with(
    git: &dyn GitOperations,
    provider: &dyn SelectionProvider,
    flags: &SaveFlags,
) -> Result<Outcome> {
    let message = match &flags.message {
        Some(message) => message.clone(),
        None => answer_or_cancel!(provider.get_text_input("Commit message:", None, None)),
    };
    let message = validate_message(&message)?;

    if !git.is_inside_work_tree() {
        println!("⚠ {} is not a git repository.", git.workdir().display());
        confirm_or_cancel!(provider, "Initialize a new repository here?", true);
        git.run(&["init"])?;
        println!("✓ Initialized empty git repository");
    }

    commit_changes(git, flags.all, &flags.exclude, &message)?;
    Ok(Outcome::Completed)
}

/// # Errors
/// Returns an error if the message is blank
pub fn validate_message(message: &str) -> Result<String> {
    let trimmed = message.trim();
    if trimmed.is_empty() {
        anyhow::bail!("commit message cannot be empty");
    }
    Ok(trimmed.to_string())
}

/// Stage, drop the excluded paths from the index, then commit
///
/// Returns how many files went into the commit; zero means nothing was staged
/// and no commit was made.
///
/// # Errors
/// Returns an error if any git step fails
pub fn commit_changes(
    git: &dyn GitOperations,
    all: bool,
    exclude: &[String],
    message: &str,
) -> Result<usize> {
    git.run(&["add", if all { "-A" } else { "." }])?;

    if !exclude.is_empty() {
        let mut args = vec!["reset", "-q", "--"];
        args.extend(exclude.iter().map(String::as_str));
        git.run(&args)?;
        println!("Excluded: {}", exclude.join(", "));
    }

    let staged = git.staged_files()?;
    if staged.is_empty() {
        println!("Nothing to save: working tree clean.");
        return Ok(0);
    }

    git.run(&["commit", "-m", message])?;
    println!("✓ Saved {} file(s): \"{}\"", staged.len(), message);
    Ok(staged.len())
}
