//! Workspace bootstrap and recovery from prior state

mod common;

use std::fs;

use common::{FakeHosting, Fixture};
use pretty_assertions::assert_eq;
use vault_core::{AuditLog, BootstrapOutcome, Bootstrapper, Error};
use vault_git::is_repository;
use vault_test_utils::git::test_git_client;

#[test]
fn test_fresh_bootstrap_clones_remote() {
    let fx = Fixture::new();
    let audit = AuditLog::new(fx.config.audit_log_path());
    let git = test_git_client();
    let hosting = FakeHosting::new(&fx.remote);

    let outcome = Bootstrapper::new(&fx.config, &git, &hosting, &audit)
        .ensure_workspace()
        .unwrap();

    assert_eq!(
        outcome,
        BootstrapOutcome::Cloned {
            owner: "tester".to_string(),
            backup: None
        }
    );
    assert!(is_repository(fx.workspace()));
    let ignore = fs::read_to_string(fx.workspace().join(".gitignore")).unwrap();
    assert!(ignore.contains(".sync.lock"));
    assert!(ignore.contains("/*.bak.*"));
}

#[test]
fn test_bootstrap_is_idempotent() {
    let fx = Fixture::new();
    let audit = AuditLog::new(fx.config.audit_log_path());
    let git = test_git_client();
    let hosting = FakeHosting::new(&fx.remote);
    let bootstrapper = Bootstrapper::new(&fx.config, &git, &hosting, &audit);

    bootstrapper.ensure_workspace().unwrap();
    let second = bootstrapper.ensure_workspace().unwrap();

    assert_eq!(second, BootstrapOutcome::AlreadyPresent);
}

#[test]
fn test_engine_files_do_not_trigger_backup() {
    let fx = Fixture::new();
    let audit = AuditLog::new(fx.config.audit_log_path());
    audit.info("written before bootstrap");
    let git = test_git_client();
    let hosting = FakeHosting::new(&fx.remote);

    let outcome = Bootstrapper::new(&fx.config, &git, &hosting, &audit)
        .ensure_workspace()
        .unwrap();

    assert!(matches!(outcome, BootstrapOutcome::Cloned { backup: None, .. }));
    let entries = audit.recent(10).unwrap();
    assert_eq!(entries[0].message, "written before bootstrap");
}

#[test]
fn test_unexplained_state_is_moved_aside() {
    let fx = Fixture::new();
    let audit = AuditLog::new(fx.config.audit_log_path());
    audit.info("history");
    fs::write(fx.workspace().join("leftover.txt"), "partial").unwrap();
    let git = test_git_client();
    let hosting = FakeHosting::new(&fx.remote);

    let outcome = Bootstrapper::new(&fx.config, &git, &hosting, &audit)
        .ensure_workspace()
        .unwrap();

    let BootstrapOutcome::Cloned {
        backup: Some(backup),
        ..
    } = outcome
    else {
        panic!("expected a backup, got {outcome:?}");
    };
    assert_eq!(
        fs::read_to_string(backup.join("leftover.txt")).unwrap(),
        "partial"
    );
    assert!(
        backup
            .file_name()
            .unwrap()
            .to_string_lossy()
            .starts_with(".session-vault.bak.")
    );
    // The audit log stays with the workspace
    assert!(!backup.join(".security-audit.log").exists());
    assert!(audit.recent(10).unwrap().iter().any(|e| e.message == "history"));
    assert!(is_repository(fx.workspace()));
    assert!(!fx.workspace().join("leftover.txt").exists());
}

#[test]
fn test_broken_repository_is_moved_aside() {
    let fx = Fixture::new();
    fs::create_dir_all(fx.workspace().join(".git")).unwrap();
    let audit = AuditLog::new(fx.config.audit_log_path());
    let git = test_git_client();
    let hosting = FakeHosting::new(&fx.remote);

    let outcome = Bootstrapper::new(&fx.config, &git, &hosting, &audit)
        .ensure_workspace()
        .unwrap();

    assert!(matches!(outcome, BootstrapOutcome::Cloned { backup: Some(_), .. }));
    assert!(is_repository(fx.workspace()));
}

#[test]
fn test_authentication_failure_is_fatal() {
    let fx = Fixture::new();
    let audit = AuditLog::new(fx.config.audit_log_path());
    let git = test_git_client();
    let hosting = FakeHosting::unauthenticated(&fx.remote);

    let err = Bootstrapper::new(&fx.config, &git, &hosting, &audit)
        .ensure_workspace()
        .unwrap_err();

    assert!(matches!(err, Error::AuthenticationFailure { .. }));
    assert!(!is_repository(fx.workspace()));
}

#[test]
fn test_clone_failure_leaves_no_staging_directory() {
    let fx = Fixture::new();
    let audit = AuditLog::new(fx.config.audit_log_path());
    let git = test_git_client();
    let hosting = FakeHosting::new(&fx.home.path("nowhere.git"));

    let err = Bootstrapper::new(&fx.config, &git, &hosting, &audit)
        .ensure_workspace()
        .unwrap_err();

    assert!(matches!(err, Error::BootstrapFailure { .. }));
    assert_eq!(fx.staging_leftovers(), Vec::<String>::new());
}

#[test]
fn test_unrelated_clone_directory_is_left_alone() {
    let fx = Fixture::new();
    fx.home.write(".session-vault.clone/keep.txt", "mine");
    let audit = AuditLog::new(fx.config.audit_log_path());
    let git = test_git_client();
    let hosting = FakeHosting::new(&fx.remote);

    Bootstrapper::new(&fx.config, &git, &hosting, &audit)
        .ensure_workspace()
        .unwrap();

    assert!(is_repository(fx.workspace()));
    assert_eq!(
        fs::read_to_string(fx.home.path(".session-vault.clone/keep.txt")).unwrap(),
        "mine"
    );
    assert!(!fx.workspace().join("keep.txt").exists());
    assert_eq!(fx.staging_leftovers(), Vec::<String>::new());
}

#[test]
fn test_existing_ignore_rules_are_extended() {
    let fx = Fixture::new();
    fx.seed_remote(&[(".gitignore", "scratch/\n")]);
    let audit = AuditLog::new(fx.config.audit_log_path());
    let git = test_git_client();
    let hosting = FakeHosting::new(&fx.remote);

    Bootstrapper::new(&fx.config, &git, &hosting, &audit)
        .ensure_workspace()
        .unwrap();

    let ignore = fs::read_to_string(fx.workspace().join(".gitignore")).unwrap();
    assert!(ignore.starts_with("scratch/\n"));
    assert!(ignore.contains(".security-audit.log"));
}
