//! Cross-process lock and debounce decision
//!
//! The lock is a JSON record `{timestamp, pid}` created with exclusive-create
//! semantics at `Workspace/.sync.lock`. A record is live while its owner is
//! alive and it is younger than the debounce window; anything else is stale
//! and may be reclaimed. The worker refreshes the timestamp between stages.

use std::fs::{self, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use vault_fs::io::{create_exclusive, create_private_dir, write_atomic};
use vault_process::is_process_alive;

use crate::{Error, Result, SyncConfig};

/// Contents of the lock file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub timestamp: DateTime<Utc>,
    pub pid: u32,
}

impl LockRecord {
    fn now(pid: u32) -> Self {
        Self {
            timestamp: Utc::now(),
            pid,
        }
    }

    /// Age of the record; a timestamp in the future counts as zero.
    pub fn age(&self) -> Duration {
        (Utc::now() - self.timestamp).to_std().unwrap_or_default()
    }
}

/// Observed state of the lock file.
///
/// The record is `None` when the file exists but cannot be parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LockState {
    Idle,
    Locked(Option<LockRecord>),
    Stale(Option<LockRecord>),
}

/// Result of [`LockGuard::try_acquire`]
#[derive(Debug)]
pub enum Acquisition {
    Acquired(LockHandle),
    /// A live record is present; no work should be scheduled
    Debounced(Option<LockRecord>),
}

/// Decides whether a run may start and creates the lock record.
#[derive(Debug, Clone)]
pub struct LockGuard {
    path: PathBuf,
    window: Duration,
}

impl LockGuard {
    pub fn new(path: impl Into<PathBuf>, window: Duration) -> Self {
        Self {
            path: path.into(),
            window,
        }
    }

    pub fn for_config(config: &SyncConfig) -> Self {
        Self::new(config.lock_path(), config.debounce_window)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Create the lock record for the current process unless a live one
    /// exists. A stale record is removed and creation retried once; losing
    /// that race to another trigger is reported as debounced.
    pub fn try_acquire(&self) -> Result<Acquisition> {
        let pid = std::process::id();

        for _ in 0..2 {
            if self.create(pid)? {
                tracing::debug!(path = %self.path.display(), pid, "Lock acquired");
                return Ok(Acquisition::Acquired(LockHandle::new(self.path.clone(), pid)));
            }

            match self.inspect() {
                LockState::Locked(record) => return Ok(Acquisition::Debounced(record)),
                LockState::Stale(record) => {
                    tracing::info!(
                        path = %self.path.display(),
                        owner = record.as_ref().map(|r| r.pid),
                        "Reclaiming stale lock"
                    );
                    remove_if_present(&self.path)?;
                }
                LockState::Idle => {}
            }
        }

        Ok(Acquisition::Debounced(self.read()))
    }

    /// Take over the lock on behalf of `pid`, whatever its current state.
    ///
    /// Used by the worker, whose trigger already won the race.
    pub fn adopt(&self, pid: u32) -> Result<LockHandle> {
        let handle = LockHandle::new(self.path.clone(), pid);
        handle.write()?;
        Ok(handle)
    }

    /// Current state of the lock file
    pub fn inspect(&self) -> LockState {
        if self.path.symlink_metadata().is_err() {
            return LockState::Idle;
        }

        let record = self.read();
        let stale = match &record {
            Some(record) => !is_process_alive(record.pid) || record.age() > self.window,
            None => self.file_age().is_none_or(|age| age > self.window),
        };

        if stale {
            LockState::Stale(record)
        } else {
            LockState::Locked(record)
        }
    }

    fn create(&self, pid: u32) -> Result<bool> {
        if let Some(parent) = self.path.parent() {
            create_private_dir(parent)?;
        }
        let content = serde_json::to_vec(&LockRecord::now(pid))?;
        match create_exclusive(&self.path, &content) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn read(&self) -> Option<LockRecord> {
        let content = fs::read(&self.path).ok()?;
        serde_json::from_slice(&content).ok()
    }

    fn file_age(&self) -> Option<Duration> {
        let modified = fs::metadata(&self.path).and_then(|m| m.modified()).ok()?;
        Some(
            SystemTime::now()
                .duration_since(modified)
                .unwrap_or_default(),
        )
    }
}

/// Ownership of the lock record.
///
/// Dropping the handle removes the lock file, so every exit path of a run
/// releases it. [`LockHandle::hand_off`] gives ownership away instead.
#[derive(Debug)]
pub struct LockHandle {
    path: PathBuf,
    pid: u32,
    armed: bool,
}

impl LockHandle {
    fn new(path: PathBuf, pid: u32) -> Self {
        Self {
            path,
            pid,
            armed: true,
        }
    }

    /// Pid recorded as the owner
    pub fn pid(&self) -> u32 {
        self.pid
    }

    /// Pass the record to `pid` if it still names this handle's owner.
    ///
    /// The existing file is rewritten in place and never recreated, so a
    /// worker that already adopted or released the lock keeps its state.
    /// Returns whether ownership was transferred.
    pub fn set_owner(&mut self, pid: u32) -> Result<bool> {
        let mut file = match OpenOptions::new().read(true).write(true).open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };
        file.lock_exclusive()?;

        let mut content = Vec::new();
        file.read_to_end(&mut content)?;
        let current: Option<LockRecord> = serde_json::from_slice(&content).ok();
        if current.is_none_or(|record| record.pid != self.pid) {
            return Ok(false);
        }

        let record = serde_json::to_vec(&LockRecord::now(pid))?;
        file.set_len(0)?;
        file.seek(SeekFrom::Start(0))?;
        file.write_all(&record)?;
        file.sync_all()?;

        self.pid = pid;
        Ok(true)
    }

    /// Refresh the record's timestamp
    pub fn touch(&self) -> Result<()> {
        self.write()
    }

    /// Leave the record in place for the process now owning it.
    pub fn hand_off(mut self) {
        tracing::debug!(path = %self.path.display(), pid = self.pid, "Lock handed off");
        self.armed = false;
    }

    /// Remove the record now, reporting failure.
    pub fn release(mut self) -> Result<()> {
        self.armed = false;
        remove_if_present(&self.path)
    }

    fn write(&self) -> Result<()> {
        let content = serde_json::to_vec(&LockRecord::now(self.pid))?;
        write_atomic(&self.path, &content).map_err(Error::from)
    }
}

impl Drop for LockHandle {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        if let Err(e) = remove_if_present(&self.path) {
            tracing::warn!(path = %self.path.display(), error = %e, "Failed to release lock");
        } else {
            tracing::debug!(path = %self.path.display(), "Lock released");
        }
    }
}

fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}
