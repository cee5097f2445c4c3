use anyhow::Result;
use clap::Args;
use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::commands::{Outcome, require_repository};
use crate::config::SizeSettings;
use crate::context::AppContext;
use crate::format::{format_size, group_thousands, heading};
use crate::git::GitCli;
use crate::traits::GitOperations;

const MIB: f64 = 1024.0 * 1024.0;
const LARGE_FILE_LISTING_LIMIT: usize = 20;
const MANY_FILES: u64 = 10_000;

#[derive(Debug, Default, Clone, Args)]
pub struct SizeFlags {
    /// Show the working-tree to history ratio and average file size
    #[arg(long)]
    pub details: bool,
    /// Size in MB above which a file counts as large
    #[arg(long, value_name = "MB")]
    pub large: Option<f64>,
    /// How many of the largest files to list
    #[arg(long, value_name = "N")]
    pub top: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Path relative to the repository root, `/` separated
    pub path: String,
    pub size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeStats {
    pub total_files: u64,
    pub total_directories: u64,
    pub working_tree_size: u64,
    pub git_size: u64,
    /// Every scanned file, largest first
    pub files: Vec<FileEntry>,
}

impl SizeStats {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn large_files(&self, threshold_mb: f64) -> Vec<&FileEntry> {
        self.files
            .iter()
            .filter(|file| file.size as f64 > threshold_mb * MIB)
            .collect()
    }

    #[must_use]
    pub fn top_files(&self, count: usize) -> &[FileEntry] {
        &self.files[..count.min(self.files.len())]
    }
}

/// Paths left out of the scan
///
/// Plain patterns match any path component; patterns with glob metacharacters
/// match the whole relative path. Entries reported by git as ignored match
/// themselves and everything below them.
#[derive(Debug, Default)]
pub struct IgnoreRules {
    names: Vec<String>,
    globs: Vec<Pattern>,
    git_ignored: Vec<String>,
}

impl IgnoreRules {
    #[must_use]
    pub fn new(patterns: &[String], git_ignored: &str) -> Self {
        let mut rules = Self::default();
        for pattern in patterns {
            if pattern.contains(['*', '?', '[']) {
                match Pattern::new(pattern) {
                    Ok(glob) => rules.globs.push(glob),
                    Err(error) => debug!(%pattern, %error, "skipping invalid ignore pattern"),
                }
            } else {
                rules.names.push(pattern.trim_matches('/').to_string());
            }
        }
        rules.git_ignored = git_ignored
            .lines()
            .map(|line| line.trim().trim_end_matches('/').to_string())
            .filter(|line| !line.is_empty())
            .collect();
        rules
    }

    #[must_use]
    pub fn is_ignored(&self, relative: &str) -> bool {
        if relative
            .split('/')
            .any(|component| self.names.iter().any(|name| name == component))
        {
            return true;
        }
        if self.globs.iter().any(|glob| glob.matches(relative)) {
            return true;
        }
        self.git_ignored.iter().any(|entry| {
            relative == entry
                || relative
                    .strip_prefix(entry.as_str())
                    .is_some_and(|rest| rest.starts_with('/'))
        })
    }
}

/// Walk `root`, skipping ignored paths; `.git` is never descended into
#[must_use]
pub fn scan(root: &Path, rules: &IgnoreRules) -> SizeStats {
    let mut stats = SizeStats::default();
    scan_dir(root, root, rules, &mut stats);
    stats.files.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
    stats
}

fn scan_dir(root: &Path, dir: &Path, rules: &IgnoreRules, stats: &mut SizeStats) {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            debug!(dir = %dir.display(), %error, "cannot read directory");
            return;
        }
    };

    for entry in entries.filter_map(Result::ok) {
        let path = entry.path();
        let Ok(relative) = path.strip_prefix(root) else {
            continue;
        };
        let relative = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        if relative == ".git" || rules.is_ignored(&relative) {
            continue;
        }

        let Ok(metadata) = fs::symlink_metadata(&path) else {
            continue;
        };
        if metadata.is_dir() {
            stats.total_directories += 1;
            scan_dir(root, &path, rules, stats);
        } else if metadata.is_file() {
            stats.total_files += 1;
            stats.working_tree_size += metadata.len();
            stats.files.push(FileEntry {
                path: relative,
                size: metadata.len(),
            });
        }
    }
}

/// Total size of every file below `dir`; unreadable entries count as zero
#[must_use]
pub fn directory_size(dir: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .filter_map(|entry| {
            let metadata = fs::symlink_metadata(entry.path()).ok()?;
            Some(if metadata.is_dir() {
                directory_size(&entry.path())
            } else {
                metadata.len()
            })
        })
        .sum()
}

#[must_use]
pub fn recommendations(stats: &SizeStats, threshold_mb: f64) -> Vec<String> {
    let mut advice = Vec::new();
    let large = stats.large_files(threshold_mb).len();

    if large > 0 {
        advice.push(format!(
            "⚠ Review {large} large file(s) (>{threshold_mb}MB)"
        ));
        advice.push("  Use Git LFS for large binary files".to_string());
        advice.push("  Compress or optimise large assets".to_string());
    }
    if stats.git_size > stats.working_tree_size.saturating_mul(2) {
        advice.push("⚠ Git history is large relative to the working tree".to_string());
        advice.push("  `git gc --aggressive` may reclaim space".to_string());
    }
    if stats.total_files > MANY_FILES {
        advice.push("⚠ The repository has many files".to_string());
        advice.push("  Check that build output and dependencies are ignored".to_string());
    }
    if large == 0 && stats.git_size < stats.working_tree_size {
        advice.push("✓ Repository size looks healthy".to_string());
    }
    advice
}

/// # Errors
/// Returns an error if the directory is not a repository
pub fn run(ctx: &AppContext, flags: &SizeFlags) -> Result<Outcome> {
    let git = ctx.git();
    require_repository(&git)?;
    let root = git.toplevel()?;
    run_with(&GitCli::new(root), &ctx.settings.size, flags)
}

/// `git` must run at the repository root so ignored paths come back root-relative
///
/// # Errors
/// Returns an error if the directory is not a repository
pub fn run_with(git: &dyn GitOperations, settings: &SizeSettings, flags: &SizeFlags) -> Result<Outcome> {
    require_repository(git)?;

    let root = git.workdir().to_path_buf();
    let threshold_mb = flags.large.unwrap_or(settings.large_threshold_mb);
    let top = flags.top.unwrap_or(settings.top);

    let git_ignored = git
        .run(&["ls-files", "--others", "--ignored", "--exclude-standard", "--directory"])
        .unwrap_or_else(|error| {
            debug!(%error, "could not list ignored files");
            String::new()
        });
    let rules = IgnoreRules::new(&settings.ignore_patterns(), &git_ignored);

    let mut stats = scan(&root, &rules);
    stats.git_size = directory_size(&git_dir(git, &root));

    print!("{}", report(&stats, flags.details, threshold_mb, top));
    Ok(Outcome::Completed)
}

fn git_dir(git: &dyn GitOperations, root: &Path) -> PathBuf {
    git.run(&["rev-parse", "--absolute-git-dir"])
        .ok()
        .filter(|dir| !dir.is_empty())
        .map_or_else(|| root.join(".git"), PathBuf::from)
}

/// The text `glc size` prints
#[must_use]
pub fn report(stats: &SizeStats, details: bool, threshold_mb: f64, top: usize) -> String {
    let mut out = String::new();
    let mut line = |text: String| {
        out.push_str(&text);
        out.push('\n');
    };

    line(heading("Repository size"));
    line(format!("Files:          {}", group_thousands(stats.total_files)));
    line(format!("Directories:    {}", group_thousands(stats.total_directories)));
    line(format!("Working tree:   {}", format_size(stats.working_tree_size)));
    line(format!("Git directory:  {}", format_size(stats.git_size)));
    line(format!(
        "Total:          {}",
        format_size(stats.working_tree_size + stats.git_size)
    ));

    if details {
        line(String::new());
        line("Details:".to_string());
        #[allow(clippy::cast_precision_loss)]
        let ratio = if stats.git_size > 0 {
            format!("{:.2}:1", stats.working_tree_size as f64 / stats.git_size as f64)
        } else {
            "N/A".to_string()
        };
        line(format!("  Working tree to history ratio: {ratio}"));
        if stats.total_files > 0 {
            line(format!(
                "  Average file size: {}",
                format_size(stats.working_tree_size / stats.total_files)
            ));
        }
    }

    let large = stats.large_files(threshold_mb);
    if !large.is_empty() {
        line(String::new());
        line(format!("Large files (>{threshold_mb}MB):"));
        for file in large.iter().take(LARGE_FILE_LISTING_LIMIT) {
            line(format!("  {:<12} {}", format_size(file.size), file.path));
        }
        if large.len() > LARGE_FILE_LISTING_LIMIT {
            line(format!(
                "  ... and {} more",
                large.len() - LARGE_FILE_LISTING_LIMIT
            ));
        }
    }

    let top_files = stats.top_files(top);
    if !top_files.is_empty() {
        line(String::new());
        line(format!("Top {} largest files:", top_files.len()));
        for (rank, file) in top_files.iter().enumerate() {
            line(format!(
                "  {:<3} {:<12} {}",
                format!("{}.", rank + 1),
                format_size(file.size),
                file.path
            ));
        }
    }

    line(String::new());
    line("Recommendations:".to_string());
    for advice in recommendations(stats, threshold_mb) {
        line(format!("  {advice}"));
    }
    out
}
