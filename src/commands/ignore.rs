use anyhow::{Context, Result};
use clap::Args;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::commands::Outcome;
use crate::context::AppContext;
use crate::github::{COMMON_GITIGNORE_TEMPLATES, normalize_gitignore};
use crate::selection::{RealSelectionProvider, SelectionProvider};
use crate::traits::{GitOperations, GithubApi};

const GITIGNORE: &str = ".gitignore";
const DETECTED_SUFFIX: &str = " (detected)";

#[derive(Debug, Default, Clone, Args)]
pub struct IgnoreFlags {
    /// Template name from github/gitignore (e.g. Node, Python, Rust)
    pub template: Option<String>,
    /// Append to an existing .gitignore
    #[arg(long, conflicts_with = "force")]
    pub append: bool,
    /// Overwrite an existing .gitignore
    #[arg(long)]
    pub force: bool,
}

/// A project type recognised from marker files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedFramework {
    pub name: &'static str,
    /// `github/gitignore` template covering it
    pub template: &'static str,
    pub confidence: u8,
}

impl DetectedFramework {
    const fn new(name: &'static str, template: &'static str, confidence: u8) -> Self {
        Self {
            name,
            template,
            confidence,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PackageManifest {
    #[serde(default)]
    dependencies: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    dev_dependencies: BTreeMap<String, serde_json::Value>,
}

impl PackageManifest {
    fn depends_on(&self, name: &str) -> bool {
        self.dependencies.contains_key(name) || self.dev_dependencies.contains_key(name)
    }
}

/// Frameworks found in `dir`, most confident first
#[must_use]
pub fn detect_frameworks(dir: &Path) -> Vec<DetectedFramework> {
    let Ok(entries) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let names: Vec<String> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    let has = |name: &str| names.iter().any(|entry| entry == name);
    let has_extension = |ext: &str| names.iter().any(|entry| entry.ends_with(ext));

    let mut found = Vec::new();

    if has("package.json") {
        let manifest: PackageManifest = fs::read_to_string(dir.join("package.json"))
            .ok()
            .and_then(|content| serde_json::from_str(&content).ok())
            .unwrap_or_default();

        if manifest.depends_on("next") {
            found.push(DetectedFramework::new("Next.js", "Node", 95));
        } else if manifest.depends_on("react") || manifest.depends_on("@types/react") {
            found.push(DetectedFramework::new("React", "Node", 90));
        } else if manifest.depends_on("vue") {
            found.push(DetectedFramework::new("Vue.js", "Node", 90));
        } else if manifest.depends_on("@angular/core") {
            found.push(DetectedFramework::new("Angular", "Node", 95));
        } else if manifest.depends_on("express") {
            found.push(DetectedFramework::new("Node.js/Express", "Node", 80));
        }

        if manifest.depends_on("typescript") || has("tsconfig.json") {
            found.push(DetectedFramework::new("TypeScript", "Node", 85));
        }
        if found.is_empty() {
            found.push(DetectedFramework::new("Node.js", "Node", 70));
        }
    }
    if has("go.mod") || has("go.sum") {
        found.push(DetectedFramework::new("Go", "Go", 95));
    }
    if has("Cargo.toml") {
        found.push(DetectedFramework::new("Rust", "Rust", 95));
    }
    if ["requirements.txt", "pyproject.toml", "setup.py", "Pipfile"]
        .into_iter()
        .any(|marker| has(marker))
    {
        found.push(DetectedFramework::new("Python", "Python", 90));
    }
    if has("pom.xml") || has("build.gradle") {
        found.push(DetectedFramework::new("Java", "Java", 90));
    }
    if has_extension(".csproj") || has_extension(".sln") {
        found.push(DetectedFramework::new("C#", "VisualStudio", 90));
    }
    if has("pubspec.yaml") {
        found.push(DetectedFramework::new("Flutter", "Dart", 90));
    }
    if has("Gemfile") {
        found.push(DetectedFramework::new("Ruby", "Ruby", 85));
    }
    if has("Assets") && has("ProjectSettings") {
        found.push(DetectedFramework::new("Unity", "Unity", 95));
    }

    found.sort_by(|a, b| b.confidence.cmp(&a.confidence));
    found
}

/// Menu entries: detected templates first (marked), then the common ones
#[must_use]
pub fn template_options(detected: &[DetectedFramework]) -> Vec<String> {
    let mut options: Vec<String> = Vec::new();
    let mut seen: Vec<&str> = Vec::new();

    for framework in detected {
        if !seen.contains(&framework.template) {
            seen.push(framework.template);
            options.push(format!("{}{DETECTED_SUFFIX}", framework.template));
        }
    }
    for template in COMMON_GITIGNORE_TEMPLATES {
        if !seen.contains(template) {
            options.push((*template).to_string());
        }
    }
    options
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteMode {
    Create,
    Append,
    Overwrite,
}

/// # Errors
/// Returns an error if the template cannot be fetched or `.gitignore` cannot be written
pub fn run(ctx: &AppContext, flags: &IgnoreFlags) -> Result<Outcome> {
    run_with(&ctx.git(), &ctx.github()?, &RealSelectionProvider, flags)
}

/// # Errors
/// Returns an error if the template cannot be fetched or `.gitignore` cannot be written
pub fn run_with(
    git: &dyn GitOperations,
    api: &dyn GithubApi,
    provider: &dyn SelectionProvider,
    flags: &IgnoreFlags,
) -> Result<Outcome> {
    let root = project_root(git);

    let template = match flags.template.as_deref().and_then(normalize_gitignore) {
        Some(template) => template,
        None => {
            let detected = detect_frameworks(&root);
            for framework in &detected {
                debug!(name = framework.name, template = framework.template, "detected framework");
            }
            if let Some(best) = detected.first() {
                println!("Detected {} project", best.name);
            }
            let choice = answer_or_cancel!(
                provider.select(".gitignore template:", template_options(&detected))
            );
            choice.trim_end_matches(DETECTED_SUFFIX).to_string()
        }
    };

    let path = root.join(GITIGNORE);
    let mode = if !path.exists() {
        WriteMode::Create
    } else if flags.append {
        WriteMode::Append
    } else if flags.force {
        WriteMode::Overwrite
    } else {
        let options = vec![
            "Append to it".to_string(),
            "Overwrite it".to_string(),
            "Cancel".to_string(),
        ];
        match answer_or_cancel!(provider.select("A .gitignore already exists:", options)).as_str()
        {
            "Append to it" => WriteMode::Append,
            "Overwrite it" => WriteMode::Overwrite,
            _ => return Ok(Outcome::Cancelled),
        }
    };

    println!("Fetching {template} template from github/gitignore...");
    let body = api
        .gitignore_template(&template)
        .with_context(|| format!("Failed to fetch the {template} template"))?;

    if !write_gitignore(&path, &template, &body, mode)? {
        println!("⚠ {} already contains the {template} template", path.display());
        return Ok(Outcome::Completed);
    }
    let verb = match mode {
        WriteMode::Create => "Created",
        WriteMode::Append => "Appended to",
        WriteMode::Overwrite => "Replaced",
    };
    println!("✓ {verb} {} with the {template} template", path.display());
    Ok(Outcome::Completed)
}

fn project_root(git: &dyn GitOperations) -> PathBuf {
    git.toplevel()
        .ok()
        .filter(|root| !root.as_os_str().is_empty())
        .unwrap_or_else(|| git.workdir().to_path_buf())
}

fn section_header(template: &str) -> String {
    format!("# ==== {template} (github/gitignore) ====")
}

/// Returns false when appending would duplicate an existing section
fn write_gitignore(path: &Path, template: &str, body: &str, mode: WriteMode) -> Result<bool> {
    let content = match mode {
        WriteMode::Create | WriteMode::Overwrite => body.to_string(),
        WriteMode::Append => {
            let existing = fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let header = section_header(template);
            if existing.contains(&header) {
                return Ok(false);
            }
            let separator = if existing.is_empty() || existing.ends_with('\n') {
                "\n"
            } else {
                "\n\n"
            };
            format!("{existing}{separator}{header}\n{body}")
        }
    };
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(true)
}
