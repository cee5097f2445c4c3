//! # git-lite
//!
//! `glc` wraps the everyday git and GitHub chores (committing, syncing,
//! switching branches, creating and cloning repositories, recovering work)
//! behind short commands that prompt for whatever the flags leave out.
//!
//! ## Quick Start
//!
//! ```bash
//! # Log in once with a personal access token
//! glc auth --login
//!
//! # Commit everything and push
//! glc save -m "Fix the login form"
//! glc sync
//!
//! # Create a GitHub repository from the current directory
//! glc create --name my-project --private --publish
//!
//! # Check repository health
//! glc doctor --detailed
//! ```
//!
//! ## Module Structure
//!
//! - [`commands`] - One module per subcommand, each with `run` and a testable `run_with`
//! - [`resolver`] - Picks a command's action from its flags or asks for one
//! - [`selection`] - Abstracts interactive prompts for testability
//! - [`git`] - Runs the `git` binary and parses what it prints
//! - [`github`] - GitHub REST client and template name handling
//! - [`storage`] - Stored login, `.env` mirror and per-repository metadata
//! - [`config`] - Project settings from `.gitlite.toml`
//! - [`context`] - Everything a command needs, resolved once at startup
//! - [`format`] - Status classification and report rendering
//! - [`logging`] - `tracing` subscriber setup
//! - [`traits`] - `GitOperations` and `GithubApi` seams used by the test doubles

pub mod commands;
pub mod config;
pub mod context;
pub mod format;
pub mod git;
pub mod github;
pub mod logging;
pub mod resolver;
pub mod selection;
pub mod storage;
pub mod traits;

pub use anyhow::Result;
