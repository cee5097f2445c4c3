use clap::{ArgAction, Parser, Subcommand};
use std::process::ExitCode;

use git_lite::Result;
use git_lite::commands::auth::{AuthFlags, WhoamiFlags};
use git_lite::commands::autopilot::AutopilotFlags;
use git_lite::commands::branch::BranchFlags;
use git_lite::commands::clone::CloneFlags;
use git_lite::commands::create::CreateFlags;
use git_lite::commands::doctor::DoctorFlags;
use git_lite::commands::ignore::IgnoreFlags;
use git_lite::commands::recover::RecoverFlags;
use git_lite::commands::save::SaveFlags;
use git_lite::commands::size::SizeFlags;
use git_lite::commands::sync::SyncFlags;
use git_lite::commands::undo::UndoFlags;
use git_lite::commands::unstage::UnstageFlags;
use git_lite::commands::{
    Outcome, auth, autopilot, branch, clone, create, doctor, ignore, recover, save, size, status,
    sync, undo, unstage,
};
use git_lite::context::AppContext;
use git_lite::git::GitError;
use git_lite::github::GithubError;
use git_lite::logging;

#[derive(Parser)]
#[command(name = "glc")]
#[command(about = "Everyday git and GitHub chores without the ceremony")]
#[command(version, disable_version_flag = true)]
pub struct Cli {
    /// Print version
    #[arg(short = 'v', long = "version", action = ArgAction::Version)]
    version: Option<bool>,

    /// Show debug logs and full error chains
    #[arg(short = 'V', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in to GitHub, log out, or show the stored login
    Auth(AuthFlags),
    /// Show the GitHub account you are logged in as
    Whoami(WhoamiFlags),
    /// Create a GitHub repository and optionally publish or clone it
    Create(CreateFlags),
    /// Stage and commit changes
    Save(SaveFlags),
    /// Pull with rebase, then push the current branch
    Sync(SyncFlags),
    /// List, create, switch, delete or rename branches
    Branch(BranchFlags),
    /// Clone a repository
    Clone(CloneFlags),
    /// Add a .gitignore template from github/gitignore
    Ignore(IgnoreFlags),
    /// Commit everything and sync in one go
    Autopilot(AutopilotFlags),
    /// Undo the last commit
    Undo(UndoFlags),
    /// Remove files from the staging area
    Unstage(UnstageFlags),
    /// Discard local changes or jump back to the previous HEAD
    Recover(RecoverFlags),
    /// Show a friendly working tree status
    Status,
    /// Report repository size and the largest files
    Size(SizeFlags),
    /// Check repository health
    Doctor(DoctorFlags),
}

fn dispatch(ctx: &AppContext, command: &Commands) -> Result<Outcome> {
    match command {
        Commands::Auth(flags) => auth::run(ctx, flags),
        Commands::Whoami(flags) => auth::whoami(ctx, flags),
        Commands::Create(flags) => create::run(ctx, flags),
        Commands::Save(flags) => save::run(ctx, flags),
        Commands::Sync(flags) => sync::run(ctx, flags),
        Commands::Branch(flags) => branch::run(ctx, flags),
        Commands::Clone(flags) => clone::run(ctx, flags),
        Commands::Ignore(flags) => ignore::run(ctx, flags),
        Commands::Autopilot(flags) => autopilot::run(ctx, flags),
        Commands::Undo(flags) => undo::run(ctx, flags),
        Commands::Unstage(flags) => unstage::run(ctx, flags),
        Commands::Recover(flags) => recover::run(ctx, flags),
        Commands::Status => status::run(ctx),
        Commands::Size(flags) => size::run(ctx, flags),
        Commands::Doctor(flags) => doctor::run(ctx, flags),
    }
}

fn report_error(error: &anyhow::Error, verbose: bool) {
    eprintln!("✗ {error:#}");

    if let Some(guidance) = error
        .chain()
        .find_map(|cause| cause.downcast_ref::<GithubError>())
        .and_then(GithubError::guidance)
    {
        eprintln!("  {guidance}");
    }

    if verbose {
        for (depth, cause) in error.chain().enumerate().skip(1) {
            eprintln!("  {depth}: {cause}");
        }
        if let Some(code) = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<GitError>())
            .and_then(GitError::exit_code)
        {
            eprintln!("  git exited with status {code}");
        }
        if let Some(status) = error
            .chain()
            .find_map(|cause| cause.downcast_ref::<GithubError>())
            .and_then(GithubError::status)
        {
            eprintln!("  GitHub answered with HTTP {status}");
        }
    }

    if error.root_cause().downcast_ref::<std::io::Error>().is_some() {
        eprintln!("Sorry, something unexpected went wrong. Run again with --verbose for details.");
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = AppContext::from_env().and_then(|ctx| dispatch(&ctx, &cli.command));

    match result {
        Ok(Outcome::Completed) => ExitCode::SUCCESS,
        Ok(Outcome::Cancelled) => {
            println!("Operation cancelled.");
            ExitCode::SUCCESS
        }
        Err(error) => {
            report_error(&error, cli.verbose);
            ExitCode::FAILURE
        }
    }
}
