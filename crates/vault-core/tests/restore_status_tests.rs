//! Restore and status flows

mod common;

use std::fs;

use common::Fixture;
use vault_core::{BootstrapOutcome, Error, LockGuard, LockStatus, WorkerReport};

mod restore {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_restore_bootstraps_without_mirroring() {
        let fx = Fixture::new();
        fx.seed_remote(&[("~__claude__sessions/old.json", "{\"v\":1}")]);
        fx.home.write(".claude/sessions/new.json", "{}");

        let report = fx.engine().restore().unwrap();

        assert_eq!(report.workspace, fx.config.workspace);
        assert!(matches!(report.bootstrap, BootstrapOutcome::Cloned { .. }));
        assert!(report.pulled);
        assert_eq!(
            fs::read_to_string(fx.workspace().join("~__claude__sessions/old.json")).unwrap(),
            "{\"v\":1}"
        );
        assert!(!fx.workspace().join("~__claude__sessions/new.json").exists());
        assert!(!fx.config.lock_path().exists());
    }

    #[test]
    fn test_restore_pulls_into_existing_workspace() {
        let fx = Fixture::new();
        fx.home.write(".claude/sessions/a.json", "{}");
        let engine = fx.engine();
        engine.run_worker();
        fx.seed_remote(&[("~__copilot__sessions/b.json", "{}")]);

        let report = engine.restore().unwrap();

        assert_eq!(report.bootstrap, BootstrapOutcome::AlreadyPresent);
        assert!(fx.workspace().join("~__copilot__sessions/b.json").exists());
    }

    #[test]
    fn test_restore_of_empty_remote_reports_nothing_pulled() {
        let fx = Fixture::new();

        let report = fx.engine().restore().unwrap();

        assert!(!report.pulled);
    }

    #[test]
    fn test_restore_refuses_while_locked() {
        let fx = Fixture::new();
        let _held = LockGuard::for_config(&fx.config).try_acquire().unwrap();

        let err = fx.engine().restore().unwrap_err();

        assert!(matches!(err, Error::LockBusy { .. }), "got {err:?}");
    }
}

mod status {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_status_before_first_run() {
        let fx = Fixture::new();

        let status = fx.engine().status().unwrap();

        assert!(!status.is_repository);
        assert_eq!(status.branch, None);
        assert!(status.last_commit.is_none());
        assert_eq!(status.lock, LockStatus::Idle);
        assert_eq!(status.sources.len(), 3);
        assert!(status.sources.iter().all(|s| !s.exists));
        assert!(status.recent_events.is_empty());
    }

    #[test]
    fn test_status_after_sync() {
        let fx = Fixture::new();
        fx.home.write(".claude/sessions/a.json", "{}");
        let engine = fx.engine();
        assert!(matches!(engine.run_worker(), WorkerReport::Synced { .. }));

        let status = engine.status().unwrap();

        assert!(status.is_repository);
        assert_eq!(status.branch.as_deref(), Some("main"));
        let commit = status.last_commit.unwrap();
        assert!(commit.message.starts_with("Sync sessions "));
        assert_eq!(commit.hash.len(), 7);
        assert!(!status.recent_events.is_empty());
    }

    #[test]
    fn test_status_lists_backups_and_lock() {
        let fx = Fixture::new();
        fx.home.write(".claude/sessions/a.json", "AKIA");
        let engine = fx.engine_with(common::FakeScanner::flagging("AKIA"));
        engine.run_worker();
        let _held = LockGuard::for_config(&fx.config).try_acquire().unwrap();

        let status = engine.status().unwrap();

        assert_eq!(status.backups.len(), 1);
        assert!(status.backups[0].starts_with("~__claude__sessions.bak."));
        assert!(matches!(status.lock, LockStatus::Locked { pid: Some(_), .. }));
    }

    #[test]
    fn test_status_serializes_to_json() {
        let fx = Fixture::new();

        let status = fx.engine().status().unwrap();
        let json = serde_json::to_value(&status).unwrap();

        assert_eq!(json["lock"]["state"], "idle");
        assert_eq!(json["is_repository"], false);
    }
}
