//! Turning raw git output into the branded terminal report.
//!
//! Status lines follow git's porcelain v1 format: two status columns (index,
//! work tree), a space, then the path. See `git help status`.

use std::fmt;

/// Left gutter used for every report body line
pub const GUTTER: &str = "│  ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Modified,
    Added,
    Deleted,
    Renamed,
    Copied,
    Unmerged,
    TypeChanged,
    Untracked,
}

impl ChangeKind {
    #[must_use]
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'M' => Some(ChangeKind::Modified),
            'A' => Some(ChangeKind::Added),
            'D' => Some(ChangeKind::Deleted),
            'R' => Some(ChangeKind::Renamed),
            'C' => Some(ChangeKind::Copied),
            'U' => Some(ChangeKind::Unmerged),
            'T' => Some(ChangeKind::TypeChanged),
            '?' => Some(ChangeKind::Untracked),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ChangeKind::Modified => "modified",
            ChangeKind::Added => "new file",
            ChangeKind::Deleted => "deleted",
            ChangeKind::Renamed => "renamed",
            ChangeKind::Copied => "copied",
            ChangeKind::Unmerged => "updated but unmerged",
            ChangeKind::TypeChanged => "typechange",
            ChangeKind::Untracked => "untracked",
        }
    }
}

impl fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One `XY path` line of `git status --porcelain`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PorcelainEntry {
    pub index: char,
    pub worktree: char,
    pub path: String,
}

impl PorcelainEntry {
    /// Parse a porcelain v1 line; `None` for headers and malformed lines
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        if line.starts_with("##") {
            return None;
        }
        let mut chars = line.chars();
        let index = chars.next()?;
        let worktree = chars.next()?;
        let rest = chars.as_str();
        let path = rest.strip_prefix(' ').unwrap_or(rest).trim_end();
        if path.is_empty() {
            return None;
        }
        Some(Self {
            index,
            worktree,
            path: path.to_string(),
        })
    }

    #[must_use]
    pub fn is_untracked(&self) -> bool {
        self.index == '?' && self.worktree == '?'
    }

    #[must_use]
    pub fn is_staged(&self) -> bool {
        self.index != ' ' && self.index != '?' && self.index != '!'
    }

    #[must_use]
    pub fn is_unstaged(&self) -> bool {
        self.worktree != ' ' && self.index != '?' && self.index != '!'
    }

    /// Path git would check out, the destination for renames
    #[must_use]
    pub fn target_path(&self) -> &str {
        self.path
            .split_once(" -> ")
            .map_or(self.path.as_str(), |(_, to)| to)
    }
}

/// Parse `git status --porcelain -z`
///
/// Records are NUL separated and paths are never quoted. A rename or copy is
/// followed by an extra record holding the source path, which is skipped, so
/// `path` is always the destination.
#[must_use]
pub fn parse_porcelain_z(output: &str) -> Vec<PorcelainEntry> {
    let mut entries = Vec::new();
    let mut records = output.split('\0');

    while let Some(record) = records.next() {
        let mut chars = record.chars();
        let (Some(index), Some(worktree), Some(' ')) = (chars.next(), chars.next(), chars.next())
        else {
            continue;
        };
        let path = chars.as_str();
        if path.is_empty() {
            continue;
        }
        if matches!(index, 'R' | 'C') || matches!(worktree, 'R' | 'C') {
            records.next();
        }
        entries.push(PorcelainEntry {
            index,
            worktree,
            path: path.to_string(),
        });
    }

    entries
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChange {
    pub kind: ChangeKind,
    pub path: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusReport {
    pub staged: Vec<FileChange>,
    pub unstaged: Vec<FileChange>,
    pub untracked: Vec<String>,
}

impl StatusReport {
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.staged.is_empty() && self.unstaged.is_empty() && self.untracked.is_empty()
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.staged.len() + self.unstaged.len() + self.untracked.len()
    }
}

/// Sort porcelain lines into staged, unstaged and untracked
///
/// A line like `MM file` appears in both staged and unstaged.
#[must_use]
pub fn classify_porcelain(output: &str) -> StatusReport {
    let mut report = StatusReport::default();

    for entry in output.lines().filter_map(PorcelainEntry::parse) {
        if entry.is_untracked() {
            report.untracked.push(entry.path);
            continue;
        }
        if entry.is_staged() {
            if let Some(kind) = ChangeKind::from_code(entry.index) {
                report.staged.push(FileChange {
                    kind,
                    path: entry.path.clone(),
                });
            }
        }
        if entry.is_unstaged() {
            if let Some(kind) = ChangeKind::from_code(entry.worktree) {
                report.unstaged.push(FileChange {
                    kind,
                    path: entry.path.clone(),
                });
            }
        }
    }

    report
}

/// Upstream tracking from the `## ` header of `status --branch --porcelain`
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BranchTracking {
    pub branch: Option<String>,
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
}

/// Parse `## main...origin/main [ahead 1, behind 2]` and its variants
#[must_use]
pub fn parse_branch_header(line: &str) -> BranchTracking {
    let Some(header) = line.strip_prefix("## ") else {
        return BranchTracking::default();
    };

    let (names, counts) = match header.split_once(" [") {
        Some((names, counts)) => (names, counts.trim_end_matches(']')),
        None => (header, ""),
    };

    let names = names
        .strip_prefix("No commits yet on ")
        .or_else(|| names.strip_prefix("Initial commit on "))
        .unwrap_or(names);

    let (branch, upstream) = match names.split_once("...") {
        Some((branch, upstream)) => (branch, Some(upstream.to_string())),
        None => (names, None),
    };

    let mut tracking = BranchTracking {
        branch: (!branch.starts_with("HEAD (")).then(|| branch.to_string()),
        upstream,
        ..BranchTracking::default()
    };

    for part in counts.split(", ") {
        if let Some(n) = part.strip_prefix("ahead ") {
            tracking.ahead = n.trim().parse().unwrap_or(0);
        } else if let Some(n) = part.strip_prefix("behind ") {
            tracking.behind = n.trim().parse().unwrap_or(0);
        }
    }

    tracking
}

/// Full `glc status` report
#[must_use]
pub fn format_status(tracking: &BranchTracking, report: &StatusReport) -> String {
    let mut lines = Vec::new();
    let branch = tracking.branch.as_deref().unwrap_or("(detached HEAD)");
    lines.push(format!("┌  On branch {branch}"));
    lines.push(GUTTER.trim_end().to_string());

    match (&tracking.upstream, tracking.ahead, tracking.behind) {
        (None, _, _) => lines.push(format!("{GUTTER}Your branch is not tracking a remote branch.")),
        (Some(upstream), 0, 0) => {
            lines.push(format!("{GUTTER}Your branch is up to date with '{upstream}'."));
        }
        (Some(upstream), ahead, 0) => lines.push(format!(
            "{GUTTER}Your branch is ahead of '{upstream}' by {ahead} commit(s). Run `glc sync` to push."
        )),
        (Some(upstream), 0, behind) => lines.push(format!(
            "{GUTTER}Your branch is behind '{upstream}' by {behind} commit(s). Run `glc sync` to pull."
        )),
        (Some(upstream), ahead, behind) => lines.push(format!(
            "{GUTTER}Your branch and '{upstream}' have diverged ({ahead} ahead, {behind} behind)."
        )),
    }

    if report.is_clean() {
        lines.push(GUTTER.trim_end().to_string());
        lines.push(format!("{GUTTER}✓ Nothing to commit, working tree clean"));
        lines.push("└".to_string());
        return lines.join("\n");
    }

    if !report.staged.is_empty() {
        lines.push(GUTTER.trim_end().to_string());
        lines.push(format!("{GUTTER}Changes to be committed:"));
        lines.push(format!("{GUTTER}  (use `glc undo --soft` or `glc unstage --all` to unstage)"));
        for change in &report.staged {
            lines.push(format!("{GUTTER}    {:<22}{}", format!("{}:", change.kind), change.path));
        }
    }

    if !report.unstaged.is_empty() {
        lines.push(GUTTER.trim_end().to_string());
        lines.push(format!("{GUTTER}Changes not staged for commit:"));
        lines.push(format!("{GUTTER}  (use `glc save` to commit, `glc recover` to discard)"));
        for change in &report.unstaged {
            lines.push(format!("{GUTTER}    {:<22}{}", format!("{}:", change.kind), change.path));
        }
    }

    if !report.untracked.is_empty() {
        lines.push(GUTTER.trim_end().to_string());
        lines.push(format!("{GUTTER}Untracked files:"));
        lines.push(format!("{GUTTER}  (use `glc save --all` to include them)"));
        for path in &report.untracked {
            lines.push(format!("{GUTTER}    {path}"));
        }
    }

    lines.push("└".to_string());
    lines.join("\n")
}

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Human readable size: whole bytes, then one decimal in KB..TB (base 1024)
#[must_use]
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        return format!("{bytes}B");
    }

    #[allow(clippy::cast_precision_loss)]
    let mut value = bytes as f64;
    let mut unit = 0;
    // Compare the value as printed so 1023.96KB becomes 1.0MB, not 1024.0KB
    while (value * 10.0).round() / 10.0 >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.1}{}", UNITS[unit])
}

/// `1234567` → `1,234,567`
#[must_use]
pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, digit) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    grouped
}

/// Title underlined with a rule of `=`
#[must_use]
pub fn heading(title: &str) -> String {
    format!("{title}\n{}", "=".repeat(40))
}
