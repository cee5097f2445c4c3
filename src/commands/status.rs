use anyhow::Result;

use crate::commands::{Outcome, require_repository};
use crate::context::AppContext;
use crate::format::{classify_porcelain, format_status, parse_branch_header};
use crate::traits::GitOperations;

/// # Errors
/// Returns an error if the directory is not a repository or git fails
pub fn run(ctx: &AppContext) -> Result<Outcome> {
    run_with(&ctx.git())
}

/// # Errors
/// Returns an error if the directory is not a repository or git fails
pub fn run_with(git: &dyn GitOperations) -> Result<Outcome> {
    println!("{}", render(git)?);
    Ok(Outcome::Completed)
}

/// The formatted report for the repository `git` runs in
///
/// # Errors
/// Returns an error if the directory is not a repository or git fails
pub fn render(git: &dyn GitOperations) -> Result<String> {
    require_repository(git)?;

    let output = git.run(&["status", "--porcelain=v1", "--branch"])?;
    let mut lines = output.lines();
    let tracking = lines
        .next()
        .map(parse_branch_header)
        .unwrap_or_default();
    let report = classify_porcelain(&lines.collect::<Vec<_>>().join("\n"));

    Ok(format_status(&tracking, &report))
}
