#![allow(clippy::unwrap_used)] // Tests use unwrap for simplicity

use anyhow::Result;
use predicates::prelude::*;

use test_support::CliTestEnvironment;

fn current_branch(env: &CliTestEnvironment) -> Result<String> {
    env.git(&["branch", "--show-current"])
}

// ==================== CREATE / SWITCH ====================

#[test]
fn test_create_switches_to_new_branch() -> Result<()> {
    let env = CliTestEnvironment::new()?;

    env.run_command(&["branch", "--create", "feature/login"])?
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "✓ Created and switched to branch 'feature/login'",
        ));

    assert_eq!(current_branch(&env)?, "feature/login");
    Ok(())
}

#[test]
fn test_create_existing_branch_fails() -> Result<()> {
    let env = CliTestEnvironment::new()?;
    env.git(&["branch", "dev"])?;

    env.run_command(&["branch", "--create", "dev"])?
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("already exists"));

    assert_eq!(current_branch(&env)?, "main");
    Ok(())
}

#[test]
fn test_switch_between_branches() -> Result<()> {
    let env = CliTestEnvironment::new()?;
    env.git(&["branch", "dev"])?;

    env.run_command(&["branch", "--switch", "dev"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Switched to branch 'dev'"));
    assert_eq!(current_branch(&env)?, "dev");

    env.run_command(&["branch", "--switch", "dev"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("⚠ Already on 'dev'"));
    Ok(())
}

// ==================== RENAME / DELETE ====================

#[test]
fn test_rename_current_branch() -> Result<()> {
    let env = CliTestEnvironment::new()?;
    env.git(&["checkout", "-q", "-b", "draft"])?;

    env.run_command(&["branch", "--rename", "final"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Renamed 'draft' to 'final'"));

    assert_eq!(current_branch(&env)?, "final");
    Ok(())
}

#[test]
fn test_delete_merged_branch() -> Result<()> {
    let env = CliTestEnvironment::new()?;
    env.git(&["branch", "old"])?;

    env.run_command(&["branch", "--delete", "old"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("✓ Deleted branch 'old'"));

    assert!(env.git(&["branch", "--list", "old"])?.is_empty());
    Ok(())
}

#[test]
fn test_delete_current_branch_is_refused() -> Result<()> {
    let env = CliTestEnvironment::new()?;

    env.run_command(&["branch", "--delete", "main"])?
        .assert()
        .failure()
        .stderr(predicate::str::contains("while it is checked out"));

    assert_eq!(current_branch(&env)?, "main");
    Ok(())
}

// ==================== LIST ====================

#[test]
fn test_list_shows_current_and_local() -> Result<()> {
    let env = CliTestEnvironment::new()?;
    env.git(&["branch", "dev"])?;

    env.run_command(&["branch", "--list"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("* main"))
        .stdout(predicate::str::contains("dev"));
    Ok(())
}

#[test]
fn test_list_includes_remote_branches() -> Result<()> {
    let env = CliTestEnvironment::with_remote()?;
    env.git(&["fetch", "-q", "origin"])?;

    env.run_command(&["branch", "--list"])?
        .assert()
        .success()
        .stdout(predicate::str::contains("Remote (1):"))
        .stdout(predicate::str::contains("origin/main"));
    Ok(())
}
