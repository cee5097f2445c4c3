#![allow(clippy::unwrap_used)] // Tests use unwrap for simplicity

use anyhow::Result;
use assert_fs::prelude::*;
use predicates::prelude::*;

use git_lite::commands::Outcome;
use git_lite::commands::save::{self, SaveFlags};
use git_lite::git::GitCli;
use git_lite::selection::{MockAnswer, MockSelectionProvider};
use test_support::CliTestEnvironment;

use test_helpers::TestEnvironment;

fn message(text: &str) -> SaveFlags {
    SaveFlags {
        message: Some(text.to_string()),
        ..SaveFlags::default()
    }
}

// ==================== LIBRARY ====================

#[test]
fn test_save_commits_changes() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("src/app.txt", "hello\n")?;

    let outcome = save::run_with(&env.git(), &MockSelectionProvider::silent(), &message("Add app"))?;

    assert_eq!(outcome, Outcome::Completed);
    assert_eq!(env.raw_git(&["log", "-1", "--format=%s"])?, "Add app");
    assert_eq!(env.raw_git(&["status", "--porcelain"])?, "");
    Ok(())
}

#[test]
fn test_save_leaves_excluded_files_out() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("keep.txt", "keep\n")?;
    env.write("secret.txt", "secret\n")?;

    let flags = SaveFlags {
        exclude: vec!["secret.txt".to_string()],
        ..message("Only keep")
    };
    save::run_with(&env.git(), &MockSelectionProvider::silent(), &flags)?;

    let committed = env.raw_git(&["show", "--name-only", "--format=", "HEAD"])?;
    assert!(committed.contains("keep.txt"));
    assert!(!committed.contains("secret.txt"));
    assert!(env.raw_git(&["status", "--porcelain"])?.contains("secret.txt"));
    Ok(())
}

#[test]
fn test_save_prompts_for_message() -> Result<()> {
    let env = TestEnvironment::new()?;
    env.write("notes.md", "notes\n")?;
    let provider = MockSelectionProvider::new([MockAnswer::text("Write notes")]);

    save::run_with(&env.git(), &provider, &SaveFlags::default())?;

    assert_eq!(env.raw_git(&["log", "-1", "--format=%s"])?, "Write notes");
    assert_eq!(provider.remaining(), 0);
    Ok(())
}

#[test]
fn test_save_declines_init_in_plain_directory() -> Result<()> {
    let temp = tempfile::tempdir()?;
    std::fs::write(temp.path().join("first.txt"), "first\n")?;
    let provider = MockSelectionProvider::new([MockAnswer::Confirm(false)]);

    let outcome = save::run_with(&GitCli::new(temp.path()), &provider, &message("First"))?;

    assert_eq!(outcome, Outcome::Cancelled);
    assert!(!temp.path().join(".git").exists());
    Ok(())
}

// ==================== CLI ====================

#[test]
fn test_cli_save_with_message() -> Result<()> {
    let env = CliTestEnvironment::new()?;
    env.repo_dir.child("feature.txt").write_str("feature\n")?;

    env.run_command(&["save", "-m", "Add feature"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Saved 1 file(s)"));

    assert_eq!(env.git(&["log", "-1", "--format=%s"])?, "Add feature");
    Ok(())
}

#[test]
fn test_cli_save_clean_tree() -> Result<()> {
    let env = CliTestEnvironment::new()?;

    env.run_command(&["save", "-m", "Nothing"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing to save"));

    assert_eq!(env.git(&["rev-list", "--count", "HEAD"])?, "1");
    Ok(())
}

#[test]
fn test_cli_save_blank_message_fails_before_git() -> Result<()> {
    let env = CliTestEnvironment::new()?;
    env.repo_dir.child("feature.txt").write_str("feature\n")?;

    env.run_command(&["save", "-m", "   "])?
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("✗ commit message cannot be empty"));

    assert!(env.git(&["diff", "--cached", "--name-only"])?.is_empty());
    Ok(())
}
