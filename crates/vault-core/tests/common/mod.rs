//! Shared fixtures and fake collaborators for engine tests.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use vault_core::{
    AuditLevel, CreateRepoOutcome, Engine, Error, HostingClient, Result, ScanVerdict,
    SecretScanner, SyncConfig, WorkerLauncher,
};
use vault_process::ProcessError;
use vault_test_utils::git::{bare_remote, test_git_client};
use vault_test_utils::TestHome;

/// Hosting service backed by a local bare repository.
pub struct FakeHosting {
    remote: PathBuf,
    authenticated: bool,
}

impl FakeHosting {
    pub fn new(remote: &Path) -> Self {
        Self {
            remote: remote.to_path_buf(),
            authenticated: true,
        }
    }

    pub fn unauthenticated(remote: &Path) -> Self {
        Self {
            authenticated: false,
            ..Self::new(remote)
        }
    }
}

impl HostingClient for FakeHosting {
    fn authenticated_user(&self) -> Result<String> {
        if self.authenticated {
            Ok("tester".to_string())
        } else {
            Err(Error::AuthenticationFailure {
                reason: "not logged in".to_string(),
            })
        }
    }

    fn create_private_repo(&self, _name: &str) -> CreateRepoOutcome {
        CreateRepoOutcome::MayAlreadyExist {
            reason: "already exists".to_string(),
        }
    }

    fn clone_url(&self, _owner: &str, _name: &str) -> String {
        self.remote.display().to_string()
    }
}

/// Scanner that flags any file containing a marker string.
pub enum FakeScanner {
    Clean,
    Flagging(String),
    Broken,
    Panicking,
}

impl FakeScanner {
    pub fn flagging(marker: &str) -> Self {
        Self::Flagging(marker.to_string())
    }
}

impl SecretScanner for FakeScanner {
    fn scan(&self, target: &Path) -> Result<ScanVerdict> {
        match self {
            Self::Clean => Ok(ScanVerdict::Clean),
            Self::Flagging(marker) => {
                if tree_contains(target, marker) {
                    Ok(ScanVerdict::Findings {
                        summary: "leaks found: 1".to_string(),
                    })
                } else {
                    Ok(ScanVerdict::Clean)
                }
            }
            Self::Broken => Err(ProcessError::CommandFailed {
                program: "gitleaks".to_string(),
                code: 126,
                stderr: "cannot execute".to_string(),
            }
            .into()),
            Self::Panicking => panic!("scanner exploded"),
        }
    }
}

fn tree_contains(dir: &Path, marker: &str) -> bool {
    let mut stack = vec![dir.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap().flatten() {
            let path = entry.path();
            if entry.file_type().unwrap().is_dir() {
                stack.push(path);
            } else if fs::read_to_string(&path).is_ok_and(|c| c.contains(marker)) {
                return true;
            }
        }
    }
    false
}

/// Launcher that records launches and reports a chosen pid.
#[derive(Clone)]
pub struct FakeLauncher {
    pid: Option<u32>,
    launches: Arc<AtomicUsize>,
    /// Lock file removed during launch, as a worker that already finished would
    finished_lock: Option<PathBuf>,
}

impl FakeLauncher {
    /// Reports the test process itself, which stays alive
    pub fn alive() -> Self {
        Self {
            pid: Some(std::process::id()),
            launches: Arc::default(),
            finished_lock: None,
        }
    }

    /// Reports a process that has already exited
    pub fn dead() -> Self {
        Self {
            pid: Some(dead_pid()),
            launches: Arc::default(),
            finished_lock: None,
        }
    }

    pub fn failing() -> Self {
        Self {
            pid: None,
            launches: Arc::default(),
            finished_lock: None,
        }
    }

    /// Simulates a worker that adopts and releases `lock` before launch returns
    pub fn finishing(lock: &Path) -> Self {
        Self {
            pid: Some(std::process::id()),
            launches: Arc::default(),
            finished_lock: Some(lock.to_path_buf()),
        }
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

impl WorkerLauncher for FakeLauncher {
    fn launch(&self) -> Result<u32> {
        match self.pid {
            Some(pid) => {
                self.launches.fetch_add(1, Ordering::SeqCst);
                if let Some(lock) = &self.finished_lock {
                    fs::remove_file(lock).unwrap();
                }
                Ok(pid)
            }
            None => Err(ProcessError::NotFound {
                program: "session-vault".to_string(),
            }
            .into()),
        }
    }
}

/// Pid of a child that has exited and been reaped.
pub fn dead_pid() -> u32 {
    let mut child = std::process::Command::new("true").spawn().unwrap();
    let pid = child.id();
    child.wait().unwrap();
    pid
}

/// A temporary home with a bare remote standing in for the hosted repo.
pub struct Fixture {
    pub home: TestHome,
    pub remote: PathBuf,
    pub config: SyncConfig,
}

impl Fixture {
    pub fn new() -> Self {
        let home = TestHome::new();
        let remote = home.path("remote.git");
        bare_remote(&remote);
        let config = SyncConfig::for_home(home.root())
            .with_debounce_window(Duration::from_secs(10))
            .with_command_timeout(Some(Duration::from_secs(60)));
        Self {
            home,
            remote,
            config,
        }
    }

    pub fn workspace(&self) -> &Path {
        &self.config.workspace
    }

    /// Engine wired to the bare remote with a clean scanner.
    pub fn engine(&self) -> Engine {
        self.engine_with(FakeScanner::Clean)
    }

    pub fn engine_with(&self, scanner: FakeScanner) -> Engine {
        Engine::new(self.config.clone())
            .unwrap()
            .with_git_client(test_git_client())
            .with_hosting(FakeHosting::new(&self.remote))
            .with_scanner(scanner)
            .with_launcher(FakeLauncher::alive())
    }

    /// Names of entries at the workspace root
    pub fn workspace_entries(&self) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(self.workspace())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    /// Clone staging directories left next to the workspace
    pub fn staging_leftovers(&self) -> Vec<String> {
        fs::read_dir(self.home.root())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .filter(|name| name.starts_with(".session-vault.clone-"))
            .collect()
    }

    /// Push `files` to the remote from a throwaway clone.
    pub fn seed_remote(&self, files: &[(&str, &str)]) {
        let scratch = tempfile::tempdir().unwrap();
        let clone = scratch.path().join("seed");
        let git = test_git_client();
        git.clone_repo(&self.remote.display().to_string(), &clone)
            .unwrap();
        for (name, content) in files {
            let path = clone.join(name);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        }
        git.add_all(&clone).unwrap();
        git.commit(&clone, "seed").unwrap();
        git.push(&clone, "origin", "main").unwrap();
    }
}

/// Levels of every audit entry written so far
pub fn audit_levels(engine: &Engine) -> Vec<AuditLevel> {
    engine
        .audit()
        .recent(usize::MAX)
        .unwrap()
        .into_iter()
        .map(|e| e.level)
        .collect()
}
