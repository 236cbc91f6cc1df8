//! Process liveness and detached background spawns

use std::ffi::OsStr;
use std::path::Path;
use std::process::{Command, Stdio};

use crate::error::{ProcessError, Result};

/// Check if a process is still alive by PID
pub fn is_process_alive(pid: u32) -> bool {
    if pid == 0 {
        return false;
    }
    #[cfg(unix)]
    {
        // kill -0 probes for existence without delivering a signal
        Command::new("kill")
            .args(["-0", &pid.to_string()])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map(|s| s.success())
            .unwrap_or(false)
    }
    #[cfg(windows)]
    {
        Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH"])
            .output()
            .map(|o| String::from_utf8_lossy(&o.stdout).contains(&pid.to_string()))
            .unwrap_or(false)
    }
    #[cfg(not(any(unix, windows)))]
    {
        true
    }
}

/// Spawn `program` detached from the caller and return its pid.
///
/// The child gets null stdio and, on Unix, its own process group so it
/// outlives the invoking shell. The child handle is dropped without
/// waiting.
pub fn spawn_detached<I, S>(program: &Path, args: I) -> Result<u32>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let name = program.display().to_string();

    let mut cmd = Command::new(program);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null());

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        cmd.process_group(0);
    }

    let child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => ProcessError::NotFound {
            program: name.clone(),
        },
        _ => ProcessError::Io {
            program: name.clone(),
            source: e,
        },
    })?;
    let pid = child.id();
    tracing::debug!(program = %name, pid, "Spawned detached process");

    // Dropping the handle does not signal the child; it keeps running.
    drop(child);
    Ok(pid)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn current_process_is_alive() {
        assert!(is_process_alive(std::process::id()));
    }

    #[test]
    fn pid_zero_is_never_alive() {
        assert!(!is_process_alive(0));
    }

    #[test]
    fn reaped_child_is_dead() {
        let mut child = Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        assert!(!is_process_alive(pid));
    }

    #[test]
    fn spawn_detached_returns_without_waiting() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join("done");
        let script = format!("sleep 1; touch '{}'", marker.display());

        let started = std::time::Instant::now();
        let pid = spawn_detached(Path::new("sh"), ["-c", script.as_str()]).unwrap();

        assert!(pid > 0);
        assert!(started.elapsed() < std::time::Duration::from_millis(900));
        for _ in 0..100 {
            if marker.exists() {
                return;
            }
            std::thread::sleep(std::time::Duration::from_millis(50));
        }
        panic!("detached child never ran");
    }
}
