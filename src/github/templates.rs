//! Name normalisation for GitHub's license and `.gitignore` templates.
//!
//! GitHub expects license keys in lowercase SPDX-like form (`apache-2.0`) and
//! gitignore templates by their exact file stem in `github/gitignore`
//! (`Node`, `VisualStudio`). Users type all sorts of variations.

/// License keys accepted by `POST /user/repos`
pub const COMMON_LICENSES: &[&str] = &[
    "mit",
    "apache-2.0",
    "gpl-3.0",
    "gpl-2.0",
    "lgpl-3.0",
    "lgpl-2.1",
    "bsd-2-clause",
    "bsd-3-clause",
    "isc",
    "unlicense",
    "cc0-1.0",
    "mpl-2.0",
    "agpl-3.0",
    "ms-pl",
    "artistic-2.0",
];

/// Templates available at the root of `github/gitignore`
pub const COMMON_GITIGNORE_TEMPLATES: &[&str] = &[
    "Node",
    "Python",
    "Java",
    "C++",
    "C",
    "Go",
    "Rust",
    "Ruby",
    "Rails",
    "Swift",
    "Kotlin",
    "Scala",
    "Dart",
    "Elixir",
    "VisualStudio",
    "Unity",
    "Android",
    "Laravel",
    "WordPress",
];

const LICENSE_ALIASES: &[(&str, &str)] = &[
    ("apache", "apache-2.0"),
    ("apache2", "apache-2.0"),
    ("apache 2.0", "apache-2.0"),
    ("apache-2", "apache-2.0"),
    ("gpl", "gpl-3.0"),
    ("gpl3", "gpl-3.0"),
    ("gpl-3", "gpl-3.0"),
    ("gpl 3.0", "gpl-3.0"),
    ("gpl2", "gpl-2.0"),
    ("gpl-2", "gpl-2.0"),
    ("gpl 2.0", "gpl-2.0"),
    ("lgpl", "lgpl-3.0"),
    ("lgpl3", "lgpl-3.0"),
    ("lgpl-3", "lgpl-3.0"),
    ("lgpl 3.0", "lgpl-3.0"),
    ("bsd", "bsd-3-clause"),
    ("bsd3", "bsd-3-clause"),
    ("bsd-3", "bsd-3-clause"),
    ("bsd 3", "bsd-3-clause"),
    ("bsd2", "bsd-2-clause"),
    ("bsd-2", "bsd-2-clause"),
    ("bsd 2", "bsd-2-clause"),
    ("public domain", "unlicense"),
    ("cc0", "cc0-1.0"),
    ("creative commons", "cc0-1.0"),
    ("mozilla", "mpl-2.0"),
    ("mpl", "mpl-2.0"),
    ("mpl2", "mpl-2.0"),
    ("agpl", "agpl-3.0"),
    ("agpl3", "agpl-3.0"),
    ("microsoft", "ms-pl"),
    ("artistic", "artistic-2.0"),
];

const GITIGNORE_ALIASES: &[(&str, &str)] = &[
    ("nodejs", "Node"),
    ("node.js", "Node"),
    ("javascript", "Node"),
    ("js", "Node"),
    ("typescript", "Node"),
    ("ts", "Node"),
    ("react", "Node"),
    ("reactjs", "Node"),
    ("react.js", "Node"),
    ("vue", "Node"),
    ("vuejs", "Node"),
    ("vue.js", "Node"),
    ("angular", "Node"),
    ("angularjs", "Node"),
    ("django", "Python"),
    ("flask", "Python"),
    ("py", "Python"),
    ("cpp", "C++"),
    ("c#", "VisualStudio"),
    ("csharp", "VisualStudio"),
    ("dotnet", "VisualStudio"),
    (".net", "VisualStudio"),
    ("golang", "Go"),
    ("rubyonrails", "Rails"),
    ("ror", "Rails"),
    ("ios", "Swift"),
    ("xcode", "Swift"),
    ("flutter", "Dart"),
];

/// Map user input to a GitHub license key; `None` for blank input
#[must_use]
pub fn normalize_license(input: &str) -> Option<String> {
    let lowered = input.trim().to_lowercase();
    if lowered.is_empty() {
        return None;
    }

    if let Some(exact) = COMMON_LICENSES.iter().find(|key| **key == lowered) {
        return Some((*exact).to_string());
    }

    if let Some((_, key)) = LICENSE_ALIASES.iter().find(|(alias, _)| *alias == lowered) {
        return Some((*key).to_string());
    }

    Some(lowered.split_whitespace().collect::<Vec<_>>().join("-"))
}

/// Map user input to a `github/gitignore` template name; `None` for blank input
#[must_use]
pub fn normalize_gitignore(input: &str) -> Option<String> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lowered = trimmed.to_lowercase();

    if let Some(exact) = COMMON_GITIGNORE_TEMPLATES
        .iter()
        .find(|name| name.to_lowercase() == lowered)
    {
        return Some((*exact).to_string());
    }

    if let Some((_, name)) = GITIGNORE_ALIASES.iter().find(|(alias, _)| *alias == lowered) {
        return Some((*name).to_string());
    }

    let mut chars = lowered.chars();
    chars
        .next()
        .map(|first| first.to_uppercase().chain(chars).collect())
}
