use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::commands::Outcome;
use crate::context::AppContext;
use crate::github::{parse_github_url, repo_name_from_url};
use crate::selection::{
    Prompt, RealSelectionProvider, SelectionProvider, optional_positive_number, required,
};
use crate::storage::{ConfigStore, RepoConfig, save_repo_config};
use crate::traits::{GitOperations, GithubApi};

#[derive(Debug, Default, Clone, Args)]
pub struct CloneFlags {
    /// Repository URL (https or ssh)
    #[arg(short, long)]
    pub url: Option<String>,
    /// Directory to clone into
    #[arg(short, long)]
    pub dir: Option<String>,
    /// Create a shallow clone with this many commits
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..))]
    pub depth: Option<u32>,
    /// Branch to check out instead of the default
    #[arg(short, long)]
    pub branch: Option<String>,
    /// Only fetch the history of the checked-out branch
    #[arg(long)]
    pub single_branch: bool,
}

/// Fully resolved clone request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClonePlan {
    pub url: String,
    pub dir: Option<String>,
    pub depth: Option<u32>,
    pub branch: Option<String>,
    pub single_branch: bool,
}

impl ClonePlan {
    /// Arguments for `git clone`
    #[must_use]
    pub fn args(&self) -> Vec<String> {
        let mut args = vec!["clone".to_string()];
        if let Some(depth) = self.depth.filter(|depth| *depth > 0) {
            args.push("--depth".to_string());
            args.push(depth.to_string());
        }
        if let Some(branch) = &self.branch {
            args.push("--branch".to_string());
            args.push(branch.clone());
        }
        if self.single_branch {
            args.push("--single-branch".to_string());
        }
        args.push(self.url.clone());
        if let Some(dir) = &self.dir {
            args.push(dir.clone());
        }
        args
    }

    /// Directory the clone ends up in, relative to `base`
    #[must_use]
    pub fn target(&self, base: &Path) -> Option<PathBuf> {
        self.dir
            .clone()
            .or_else(|| repo_name_from_url(&self.url))
            .map(|dir| base.join(dir))
    }
}

fn non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(String::from)
}

impl From<&CloneFlags> for ClonePlan {
    fn from(flags: &CloneFlags) -> Self {
        Self {
            url: flags.url.as_deref().unwrap_or_default().trim().to_string(),
            dir: non_empty(flags.dir.as_deref()),
            depth: flags.depth,
            branch: non_empty(flags.branch.as_deref()),
            single_branch: flags.single_branch,
        }
    }
}

/// # Errors
/// Returns an error if `git clone` fails
pub fn run(ctx: &AppContext, flags: &CloneFlags) -> Result<Outcome> {
    run_with(
        &ctx.git(),
        &ctx.github()?,
        &ctx.store,
        &RealSelectionProvider,
        flags,
    )
}

/// # Errors
/// Returns an error if `git clone` fails
pub fn run_with(
    git: &dyn GitOperations,
    api: &dyn GithubApi,
    store: &ConfigStore,
    provider: &dyn SelectionProvider,
    flags: &CloneFlags,
) -> Result<Outcome> {
    let plan = if non_empty(flags.url.as_deref()).is_some() {
        ClonePlan::from(flags)
    } else {
        answer_or_cancel!(prompt_for_plan(provider))
    };

    let args = plan.args();
    debug!(?args, "clone");
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    git.run(&args)
        .with_context(|| format!("Failed to clone {}", plan.url))?;

    let target = plan.target(git.workdir());
    match &target {
        Some(target) => println!("✓ Cloned into {}", target.display()),
        None => println!("✓ Cloned {}", plan.url),
    }

    if let (Some(target), Some((owner, name))) = (&target, parse_github_url(&plan.url)) {
        let token = match store.load_credentials() {
            Ok(credential) => credential.map(|credential| credential.token),
            Err(error) => {
                warn!(%error, "ignoring unreadable credentials");
                None
            }
        };
        if let Err(error) = link_clone(api, token.as_deref(), &owner, &name, target) {
            println!("⚠ Cloned, but could not record repository details: {error:#}");
        }
    }
    Ok(Outcome::Completed)
}

fn link_clone(
    api: &dyn GithubApi,
    token: Option<&str>,
    owner: &str,
    name: &str,
    target: &Path,
) -> Result<()> {
    let repository = api.repository(token, owner, name)?;
    save_repo_config(target, &RepoConfig::from_repository(&repository, target))
}

fn prompt_for_plan(provider: &dyn SelectionProvider) -> Result<Prompt<ClonePlan>> {
    let url = match provider.get_text_input("Repository URL to clone:", None, Some(required))? {
        Prompt::Answer(url) => url.trim().to_string(),
        Prompt::Cancelled => return Ok(Prompt::Cancelled),
    };
    if url.is_empty() {
        anyhow::bail!("Repository URL cannot be empty");
    }

    let dir = match provider.get_text_input(
        "Directory to clone into (leave empty for default):",
        None,
        None,
    )? {
        Prompt::Answer(dir) => non_empty(Some(&dir)),
        Prompt::Cancelled => return Ok(Prompt::Cancelled),
    };

    let depth = match provider.get_text_input(
        "Clone depth (leave empty for full history):",
        None,
        Some(optional_positive_number),
    )? {
        Prompt::Answer(depth) => non_empty(Some(&depth))
            .map(|depth| depth.parse::<u32>())
            .transpose()
            .context("Clone depth must be a positive number")?,
        Prompt::Cancelled => return Ok(Prompt::Cancelled),
    };

    let branch = match provider.get_text_input(
        "Branch to clone (leave empty for default):",
        None,
        None,
    )? {
        Prompt::Answer(branch) => non_empty(Some(&branch)),
        Prompt::Cancelled => return Ok(Prompt::Cancelled),
    };

    let single_branch = if branch.is_some() {
        match provider.confirm("Clone only this branch?", false)? {
            Prompt::Answer(single) => single,
            Prompt::Cancelled => return Ok(Prompt::Cancelled),
        }
    } else {
        false
    };

    Ok(Prompt::Answer(ClonePlan {
        url,
        dir,
        depth,
        branch,
        single_branch,
    }))
}
