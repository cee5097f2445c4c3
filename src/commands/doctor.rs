//! `glc doctor`: repository health checks with a 0-100 score.
//!
//! Every check appends zero or more [`Issue`]s. A check that cannot run (git
//! missing, not a repository) reports that instead of the checks that depend
//! on it. The score subtracts a fixed penalty per issue.

use anyhow::{Context, Result};
use clap::Args;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

use crate::commands::Outcome;
use crate::commands::size::{IgnoreRules, scan};
use crate::config::DoctorSettings;
use crate::context::AppContext;
use crate::format::{heading, parse_branch_header};
use crate::git::GitError;
use crate::selection::{Prompt, RealSelectionProvider, SelectionProvider, required};
use crate::storage::ConfigStore;
use crate::traits::{GitOperations, GithubApi};

const UNWANTED_TRACKED: &[&str] = &["node_modules", "dist", "build", ".env", ".DS_Store"];
const BINARY_SAMPLE: usize = 100;
const BINARY_WARNING_COUNT: usize = 10;
const REMOTE_BRANCH_WARNING_COUNT: usize = 10;
const STARTER_GITIGNORE: &str = "# Created by glc doctor. Run `glc ignore` to add a language template.\n.env\n.DS_Store\n";

#[derive(Debug, Default, Clone, Args)]
pub struct DoctorFlags {
    /// Offer to fix the issues that can be fixed automatically
    #[arg(long)]
    pub fix: bool,
    /// Also list informational findings
    #[arg(long)]
    pub detailed: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueKind {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fix {
    CreateGitignore,
    ConfigureUser,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub severity: Severity,
    pub category: &'static str,
    pub title: String,
    pub description: String,
    pub guidance: Option<String>,
    pub fix: Option<Fix>,
}

impl Issue {
    fn new(
        kind: IssueKind,
        severity: Severity,
        category: &'static str,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            severity,
            category,
            title: title.into(),
            description: description.into(),
            guidance: None,
            fix: None,
        }
    }

    fn guidance(mut self, guidance: impl Into<String>) -> Self {
        self.guidance = Some(guidance.into());
        self
    }

    fn fixable(mut self, fix: Fix) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Points this issue takes off the score
    #[must_use]
    pub fn penalty(&self) -> u32 {
        match (self.severity, self.kind) {
            (Severity::High, IssueKind::Error) => 25,
            (Severity::High, _) | (Severity::Medium, IssueKind::Error) => 15,
            (Severity::Medium, _) => 10,
            (Severity::Low, _) => 5,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  {}", self.title)?;
        writeln!(f, "    Category: {}", self.category)?;
        writeln!(f, "    {}", self.description)?;
        if let Some(guidance) = &self.guidance {
            writeln!(f, "    Guidance: {guidance}")?;
        }
        Ok(())
    }
}

#[must_use]
pub fn health_score(issues: &[Issue]) -> u32 {
    let penalty: u32 = issues.iter().map(Issue::penalty).sum();
    100u32.saturating_sub(penalty)
}

fn count(issues: &[Issue], kind: IssueKind) -> usize {
    issues.iter().filter(|issue| issue.kind == kind).count()
}

#[must_use]
pub fn summary(issues: &[Issue], score: u32) -> String {
    let errors = count(issues, IssueKind::Error);
    let warnings = count(issues, IssueKind::Warning);

    match score {
        90.. => format!("Excellent health! {} minor item(s) to review.", issues.len()),
        75..=89 => format!("Good health with {warnings} warning(s) and {errors} error(s) to address."),
        50..=74 => format!(
            "Moderate health issues detected. {errors} error(s) and {warnings} warning(s) need attention."
        ),
        _ => format!("Poor repository health. Immediate attention required for {errors} critical error(s)."),
    }
}

#[must_use]
pub fn closing_message(score: u32) -> &'static str {
    match score {
        90.. => "Health check complete. Your repository is in excellent condition.",
        75..=89 => "Health check complete. Address the warnings for optimal health.",
        50..=74 => "Health check complete. Several issues need attention.",
        _ => "Health check complete. Critical issues detected, act soon.",
    }
}

/// Runs the individual checks against one repository
pub struct Doctor<'a> {
    git: &'a dyn GitOperations,
    api: &'a dyn GithubApi,
    store: &'a ConfigStore,
    settings: &'a DoctorSettings,
}

impl<'a> Doctor<'a> {
    #[must_use]
    pub fn new(
        git: &'a dyn GitOperations,
        api: &'a dyn GithubApi,
        store: &'a ConfigStore,
        settings: &'a DoctorSettings,
    ) -> Self {
        Self {
            git,
            api,
            store,
            settings,
        }
    }

    /// Run every check and collect the findings
    #[must_use]
    pub fn examine(&self) -> Vec<Issue> {
        let mut issues = Vec::new();

        let in_repository = self.check_git_environment(&mut issues);
        self.check_stored_login(&mut issues);
        self.check_github_reachable(&mut issues);
        if !in_repository {
            return issues;
        }

        let root = self
            .git
            .toplevel()
            .ok()
            .filter(|root| !root.as_os_str().is_empty())
            .unwrap_or_else(|| self.git.workdir().to_path_buf());

        self.check_integrity(&mut issues);
        self.check_remote(&mut issues);
        self.check_large_files(&root, &mut issues);
        self.check_hooks(&root, &mut issues);
        self.check_branches(&mut issues);
        self.check_gitignore(&root, &mut issues);
        self.check_tracked_files(&root, &mut issues);
        issues
    }

    /// Returns whether the working directory is a repository
    fn check_git_environment(&self, issues: &mut Vec<Issue>) -> bool {
        if let Err(error) = self.git.run(&["--version"]) {
            debug!(%error, "git --version failed");
            issues.push(
                Issue::new(
                    IssueKind::Error,
                    Severity::High,
                    "Git Environment",
                    "Git Not Available",
                    "Git is not installed or not in PATH",
                )
                .guidance("Install Git from https://git-scm.com/downloads"),
            );
            return false;
        }

        if !self.git.is_inside_work_tree() {
            issues.push(
                Issue::new(
                    IssueKind::Error,
                    Severity::High,
                    "Git Environment",
                    "Not a Git Repository",
                    "The current directory is not a git repository",
                )
                .guidance("Run `git init` (or `glc save`) here, or move to an existing repository"),
            );
            return false;
        }

        let configured = |key: &str| {
            self.git
                .run(&["config", key])
                .is_ok_and(|value| !value.trim().is_empty())
        };
        if !configured("user.name") || !configured("user.email") {
            issues.push(
                Issue::new(
                    IssueKind::Warning,
                    Severity::Medium,
                    "Git Environment",
                    "Git User Not Configured",
                    "user.name or user.email is not set",
                )
                .guidance("git config --global user.name \"Your Name\" && git config --global user.email \"you@example.com\"")
                .fixable(Fix::ConfigureUser),
            );
        }
        true
    }

    fn check_integrity(&self, issues: &mut Vec<Issue>) {
        if let Err(error) = self.git.run(&["fsck", "--no-progress"]) {
            debug!(%error, "fsck failed");
            issues.push(
                Issue::new(
                    IssueKind::Error,
                    Severity::High,
                    "Repository Integrity",
                    "Repository Corruption Detected",
                    "`git fsck` reported problems",
                )
                .guidance("Run `git fsck --full` for details, or clone a fresh copy"),
            );
            return;
        }

        if self.git.run(&["rev-parse", "HEAD"]).is_err() {
            issues.push(
                Issue::new(
                    IssueKind::Warning,
                    Severity::Medium,
                    "Repository Integrity",
                    "No Commits Found",
                    "The repository has no commits yet",
                )
                .guidance("Make your first commit with `glc save -m \"Initial commit\"`"),
            );
        }
    }

    fn check_stored_login(&self, issues: &mut Vec<Issue>) {
        match self.store.load_credentials() {
            Ok(Some(_)) => {}
            Ok(None) => issues.push(
                Issue::new(
                    IssueKind::Info,
                    Severity::Low,
                    "Authentication",
                    "Not Logged In to GitHub",
                    "No GitHub token is stored",
                )
                .guidance("Run `glc auth --login` to enable `glc create`"),
            ),
            Err(error) => issues.push(
                Issue::new(
                    IssueKind::Warning,
                    Severity::Medium,
                    "Authentication",
                    "Stored Login Unreadable",
                    format!("{error:#}"),
                )
                .guidance("Run `glc auth --logout` and log in again"),
            ),
        }
    }

    fn check_remote(&self, issues: &mut Vec<Issue>) {
        let remotes = self.git.run(&["remote"]).unwrap_or_default();
        if remotes.trim().is_empty() {
            issues.push(
                Issue::new(
                    IssueKind::Info,
                    Severity::Low,
                    "Remote",
                    "No Remote Repository",
                    "The repository has no remote configured",
                )
                .guidance("Add one with `git remote add origin <url>`, or use `glc create`"),
            );
            return;
        }

        let timeout = Duration::from_secs(self.settings.remote_timeout_secs);
        match self.git.run_with_timeout(&["ls-remote", "--heads"], timeout) {
            Ok(_) => {}
            Err(GitError::TimedOut { .. }) => issues.push(
                Issue::new(
                    IssueKind::Warning,
                    Severity::Medium,
                    "Remote",
                    "Cannot Reach Remote",
                    format!(
                        "The remote did not answer within {} seconds",
                        self.settings.remote_timeout_secs
                    ),
                )
                .guidance("Check your internet connection and the remote URL"),
            ),
            Err(error) => issues.push(
                Issue::new(
                    IssueKind::Warning,
                    Severity::Medium,
                    "Remote",
                    "Remote Authentication Failed",
                    error.message().to_string(),
                )
                .guidance("Check your credentials, or run `glc auth --login`"),
            ),
        }
    }

    fn check_github_reachable(&self, issues: &mut Vec<Issue>) {
        if !self.api.is_reachable() {
            issues.push(
                Issue::new(
                    IssueKind::Warning,
                    Severity::Low,
                    "Remote",
                    "GitHub Unreachable",
                    "The GitHub API did not respond",
                )
                .guidance("Check your internet connection or https://www.githubstatus.com"),
            );
        }
    }

    fn check_large_files(&self, root: &Path, issues: &mut Vec<Issue>) {
        let stats = scan(root, &IgnoreRules::default());
        #[allow(clippy::cast_precision_loss)]
        let threshold_mb = self.settings.large_file_mb as f64;
        let large = stats.large_files(threshold_mb);
        if large.is_empty() {
            return;
        }

        let mut listed: Vec<&str> = large.iter().take(3).map(|file| file.path.as_str()).collect();
        if large.len() > 3 {
            listed.push("...");
        }
        issues.push(
            Issue::new(
                IssueKind::Warning,
                Severity::Medium,
                "Large Files",
                format!("Found {} Large File(s)", large.len()),
                format!(
                    "Files larger than {}MB: {}",
                    self.settings.large_file_mb,
                    listed.join(", ")
                ),
            )
            .guidance("Use Git LFS for large files, or ignore them if they are build output"),
        );
    }

    fn git_dir(&self, root: &Path) -> PathBuf {
        self.git
            .run(&["rev-parse", "--absolute-git-dir"])
            .ok()
            .filter(|dir| !dir.is_empty())
            .map_or_else(|| root.join(".git"), PathBuf::from)
    }

    fn check_hooks(&self, root: &Path, issues: &mut Vec<Issue>) {
        let Ok(entries) = fs::read_dir(self.git_dir(root).join("hooks")) else {
            return;
        };
        let mut active: Vec<String> = entries
            .filter_map(Result::ok)
            .map(|entry| entry.file_name().to_string_lossy().into_owned())
            .filter(|name| !name.ends_with(".sample"))
            .collect();
        if active.is_empty() {
            return;
        }
        active.sort();

        issues.push(
            Issue::new(
                IssueKind::Info,
                Severity::Low,
                "Git Hooks",
                format!("{} Active Git Hook(s)", active.len()),
                format!("Active hooks: {}", active.join(", ")),
            )
            .guidance("Make sure these hooks are still needed for your workflow"),
        );
    }

    fn check_branches(&self, issues: &mut Vec<Issue>) {
        let remote_branches = self
            .git
            .run(&["branch", "-r"])
            .map(|output| {
                output
                    .lines()
                    .filter(|line| !line.trim().is_empty() && !line.contains("HEAD"))
                    .count()
            })
            .unwrap_or(0);
        if remote_branches > REMOTE_BRANCH_WARNING_COUNT {
            issues.push(
                Issue::new(
                    IssueKind::Info,
                    Severity::Low,
                    "Branches",
                    "Many Remote Branches",
                    format!("Found {remote_branches} remote branches"),
                )
                .guidance("Delete merged or stale branches to keep the repository tidy"),
            );
        }

        let Ok(status) = self.git.run(&["status", "-b", "--porcelain"]) else {
            return;
        };
        let tracking = status.lines().next().map(parse_branch_header).unwrap_or_default();
        if tracking.ahead > 0 || tracking.behind > 0 {
            issues.push(
                Issue::new(
                    IssueKind::Info,
                    Severity::Low,
                    "Branches",
                    "Branch Out of Sync",
                    format!(
                        "The current branch is {} ahead and {} behind its upstream",
                        tracking.ahead, tracking.behind
                    ),
                )
                .guidance("Run `glc sync`"),
            );
        }
    }

    fn check_gitignore(&self, root: &Path, issues: &mut Vec<Issue>) {
        if root.join(".gitignore").exists() {
            return;
        }
        issues.push(
            Issue::new(
                IssueKind::Warning,
                Severity::Medium,
                "Configuration",
                "No .gitignore File",
                "The repository has no .gitignore",
            )
            .guidance("Run `glc ignore` to add one for your language")
            .fixable(Fix::CreateGitignore),
        );
    }

    fn check_tracked_files(&self, root: &Path, issues: &mut Vec<Issue>) {
        let Ok(listing) = self.git.run(&["ls-files", "--full-name"]) else {
            return;
        };
        let tracked: Vec<&str> = listing.lines().filter(|line| !line.is_empty()).collect();

        for pattern in UNWANTED_TRACKED {
            let hit = tracked
                .iter()
                .any(|path| path.split('/').any(|component| component == *pattern));
            if hit {
                issues.push(
                    Issue::new(
                        IssueKind::Warning,
                        Severity::Medium,
                        "Configuration",
                        format!("Tracking {pattern}"),
                        format!("{pattern} is committed to the repository"),
                    )
                    .guidance(format!(
                        "Add {pattern} to .gitignore, then `git rm -r --cached {pattern}`"
                    )),
                );
            }
        }

        let binaries = tracked
            .iter()
            .take(BINARY_SAMPLE)
            .filter(|path| is_binary(&root.join(path)))
            .count();
        if binaries > BINARY_WARNING_COUNT {
            issues.push(
                Issue::new(
                    IssueKind::Warning,
                    Severity::Medium,
                    "Binary Files",
                    "Many Binary Files Tracked",
                    format!("About {binaries} tracked files look binary"),
                )
                .guidance("Consider Git LFS for binary assets"),
            );
        }
    }
}

fn is_binary(path: &Path) -> bool {
    fs::read(path).is_ok_and(|bytes| bytes.contains(&0))
}

/// The report `glc doctor` prints
#[must_use]
pub fn render_report(issues: &[Issue], detailed: bool) -> String {
    let score = health_score(issues);
    let mut out = format!(
        "{}\nHealth score: {score}/100\nSummary: {}\n",
        heading("Repository health"),
        summary(issues, score)
    );

    if issues.is_empty() {
        out.push_str("\n✓ No issues found.\n");
        return out;
    }

    let sections = [
        (IssueKind::Error, "✗ Errors"),
        (IssueKind::Warning, "⚠ Warnings"),
        (IssueKind::Info, "Information"),
    ];
    for (kind, title) in sections {
        if kind == IssueKind::Info && !detailed {
            continue;
        }
        let matching: Vec<&Issue> = issues.iter().filter(|issue| issue.kind == kind).collect();
        if matching.is_empty() {
            continue;
        }
        out.push_str(&format!("\n{title} ({}):\n", matching.len()));
        for issue in matching {
            out.push_str(&issue.to_string());
        }
    }
    out
}

/// # Errors
/// Returns an error if a fix or prompt fails
pub fn run(ctx: &AppContext, flags: &DoctorFlags) -> Result<Outcome> {
    run_with(
        &ctx.git(),
        &ctx.github()?,
        &ctx.store,
        &RealSelectionProvider,
        &ctx.settings.doctor,
        flags,
    )
}

/// Health problems are reported, not returned as errors
///
/// # Errors
/// Returns an error if a fix or prompt fails
pub fn run_with(
    git: &dyn GitOperations,
    api: &dyn GithubApi,
    store: &ConfigStore,
    provider: &dyn SelectionProvider,
    settings: &DoctorSettings,
    flags: &DoctorFlags,
) -> Result<Outcome> {
    let issues = Doctor::new(git, api, store, settings).examine();
    print!("{}", render_report(&issues, flags.detailed));

    if flags.fix {
        let outcome = apply_fixes(git, provider, &issues)?;
        if outcome == Outcome::Cancelled {
            return Ok(outcome);
        }
    }

    println!("\n{}", closing_message(health_score(&issues)));
    Ok(Outcome::Completed)
}

fn apply_fixes(
    git: &dyn GitOperations,
    provider: &dyn SelectionProvider,
    issues: &[Issue],
) -> Result<Outcome> {
    let fixes: Vec<(Fix, &str)> = issues
        .iter()
        .filter_map(|issue| issue.fix.map(|fix| (fix, issue.title.as_str())))
        .collect();
    if fixes.is_empty() {
        println!("\nNo automatically fixable issues found.");
        return Ok(Outcome::Completed);
    }

    let question = format!("Attempt to fix {} issue(s)?", fixes.len());
    confirm_or_cancel!(provider, &question, true);

    for (fix, title) in fixes {
        match apply_fix(git, provider, fix) {
            Ok(Outcome::Completed) => println!("✓ Fixed: {title}"),
            Ok(Outcome::Cancelled) => println!("Skipped: {title}"),
            Err(error) => println!("✗ Failed to fix {title}: {error:#}"),
        }
    }
    Ok(Outcome::Completed)
}

fn apply_fix(git: &dyn GitOperations, provider: &dyn SelectionProvider, fix: Fix) -> Result<Outcome> {
    match fix {
        Fix::CreateGitignore => {
            let root = git
                .toplevel()
                .ok()
                .filter(|root| !root.as_os_str().is_empty())
                .unwrap_or_else(|| git.workdir().to_path_buf());
            let path = root.join(".gitignore");
            fs::write(&path, STARTER_GITIGNORE)
                .with_context(|| format!("Failed to write {}", path.display()))?;
        }
        Fix::ConfigureUser => {
            let name = match provider.get_text_input("Your name for commits:", None, Some(required))? {
                Prompt::Answer(name) => name.trim().to_string(),
                Prompt::Cancelled => return Ok(Outcome::Cancelled),
            };
            let email = match provider.get_text_input("Your email for commits:", None, Some(required))? {
                Prompt::Answer(email) => email.trim().to_string(),
                Prompt::Cancelled => return Ok(Outcome::Cancelled),
            };
            git.run(&["config", "user.name", &name])?;
            git.run(&["config", "user.email", &email])?;
        }
    }
    Ok(Outcome::Completed)
}
