#![allow(clippy::unwrap_used)] // Tests use unwrap for simplicity

use anyhow::Result;
use assert_fs::prelude::*;
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;

use test_support::CliTestEnvironment;

/// Clone the bare remote somewhere else and push a commit from there
fn push_from_other_clone(env: &CliTestEnvironment, file: &str) -> Result<()> {
    let remote = env.remote_dir.as_ref().unwrap();
    let other = tempfile::tempdir()?;
    let run = |dir: &Path, args: &[&str]| -> Result<()> {
        let status = Command::new("git").args(args).current_dir(dir).status()?;
        anyhow::ensure!(status.success(), "git {} failed", args.join(" "));
        Ok(())
    };

    run(
        other.path(),
        &["clone", "-q", "-b", "main", &remote.path().to_string_lossy(), "work"],
    )?;
    let work = other.path().join("work");
    run(&work, &["config", "user.name", "Other User"])?;
    run(&work, &["config", "user.email", "other@example.com"])?;
    std::fs::write(work.join(file), "from elsewhere\n")?;
    run(&work, &["add", "."])?;
    run(&work, &["commit", "-q", "-m", "Remote change"])?;
    run(&work, &["push", "-q", "origin", "main"])?;
    Ok(())
}

// ==================== HAPPY PATH ====================

#[test]
fn test_sync_pushes_local_commits() -> Result<()> {
    let env = CliTestEnvironment::with_remote()?;
    env.repo_dir.child("local.txt").write_str("local\n")?;
    env.git(&["add", "."])?;
    env.git(&["commit", "-m", "Local change"])?;

    env.run_command(&["sync"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Pushed to origin/main"))
        .stdout(predicate::str::contains("✓ 'main' is in sync with origin"));

    assert_eq!(
        env.remote_git(&["log", "-1", "--format=%s", "main"])?,
        "Local change"
    );
    Ok(())
}

#[test]
fn test_sync_pulls_remote_commits() -> Result<()> {
    let env = CliTestEnvironment::with_remote()?;
    push_from_other_clone(&env, "remote.txt")?;

    env.run_command(&["sync", "--no-push"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Pulled latest changes (rebase)"))
        .stdout(predicate::str::contains("Pushed").not());

    env.repo_dir.child("remote.txt").assert(predicate::path::exists());
    Ok(())
}

#[test]
fn test_sync_stashes_and_restores_uncommitted_work() -> Result<()> {
    let env = CliTestEnvironment::with_remote()?;
    push_from_other_clone(&env, "remote.txt")?;
    env.repo_dir.child("README.md").write_str("# Edited locally\n")?;

    env.run_command(&["sync"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Stashed local changes"))
        .stdout(predicate::str::contains("✓ Restored stashed changes"));

    env.repo_dir
        .child("README.md")
        .assert(predicate::str::contains("Edited locally"));
    env.repo_dir.child("remote.txt").assert(predicate::path::exists());
    assert!(env.git(&["stash", "list"])?.is_empty());
    Ok(())
}

// ==================== FAILURES ====================

#[test]
fn test_failed_sync_restores_stash() -> Result<()> {
    let env = CliTestEnvironment::new()?;
    env.repo_dir.child("README.md").write_str("# Work in progress\n")?;

    env.run_command(&["sync"])?
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Failed to pull origin/main"))
        .stdout(predicate::str::contains("Restored stashed changes after the failed sync"));

    env.repo_dir
        .child("README.md")
        .assert(predicate::str::contains("Work in progress"));
    assert!(env.git(&["stash", "list"])?.is_empty());
    Ok(())
}

#[test]
fn test_failed_sync_can_keep_stash() -> Result<()> {
    let env = CliTestEnvironment::new()?;
    env.repo_dir.child("README.md").write_str("# Work in progress\n")?;

    env.run_command(&["sync", "--keep-stash-on-failure"])?
        .assert()
        .failure()
        .stdout(predicate::str::contains("still stashed"));

    assert!(env.git(&["stash", "list"])?.contains("glc-auto-stash"));
    Ok(())
}

#[test]
fn test_sync_outside_repository() -> Result<()> {
    let env = CliTestEnvironment::new()?;
    let plain = env.plain_dir()?;

    env.run_command_in(plain.path(), &["sync"])?
        .assert()
        .failure()
        .stderr(predicate::str::contains("Not a git repository"));
    Ok(())
}

// ==================== SETTINGS ====================

#[test]
fn test_sync_uses_configured_remote() -> Result<()> {
    let env = CliTestEnvironment::with_remote()?;
    env.git(&["remote", "rename", "origin", "upstream"])?;
    env.repo_dir
        .child(".gitlite.toml")
        .write_str("[sync]\nremote = \"upstream\"\n")?;
    env.git(&["add", "."])?;
    env.git(&["commit", "-m", "Configure glc"])?;

    env.run_command(&["sync"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Pushed to upstream/main"));

    assert_eq!(
        env.remote_git(&["log", "-1", "--format=%s", "main"])?,
        "Configure glc"
    );
    Ok(())
}
