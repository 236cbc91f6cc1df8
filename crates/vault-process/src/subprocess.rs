//! Run external programs to completion under an optional timeout
//!
//! Output is captured on reader threads so a chatty child never blocks on a
//! full pipe while the caller polls for its exit.

use std::ffi::{OsStr, OsString};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{ProcessError, Result};

/// Interval between exit checks while a timeout is armed
const POLL_INTERVAL: Duration = Duration::from_millis(25);

/// Captured result of a finished subprocess
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Captured stdout (lossy UTF-8)
    pub stdout: String,
    /// Captured stderr (lossy UTF-8)
    pub stderr: String,
}

impl CommandOutput {
    /// Whether the process exited with status 0
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// First non-empty line of stdout, trimmed
    pub fn first_line(&self) -> Option<&str> {
        self.stdout.lines().map(str::trim).find(|l| !l.is_empty())
    }
}

/// A single external command invocation
#[derive(Debug, Clone)]
pub struct Invocation {
    program: PathBuf,
    args: Vec<OsString>,
    cwd: Option<PathBuf>,
    envs: Vec<(OsString, OsString)>,
    timeout: Option<Duration>,
}

impl Invocation {
    /// Start building an invocation of `program`
    pub fn new(program: impl AsRef<OsStr>) -> Self {
        Self {
            program: PathBuf::from(program.as_ref()),
            args: Vec::new(),
            cwd: None,
            envs: Vec::new(),
            timeout: None,
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn current_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.cwd = Some(dir.as_ref().to_path_buf());
        self
    }

    pub fn env(mut self, key: impl AsRef<OsStr>, value: impl AsRef<OsStr>) -> Self {
        self.envs
            .push((key.as_ref().to_os_string(), value.as_ref().to_os_string()));
        self
    }

    /// Kill the child if it has not exited after `timeout`
    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// Display name of the program, used in errors and logs
    pub fn program_name(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Run to completion. A non-zero exit status is not an error here;
    /// callers decide what each status means.
    pub fn output(&self) -> Result<CommandOutput> {
        let program = self.program_name();
        tracing::debug!(program = %program, args = ?self.args, "Running external command");

        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(dir) = &self.cwd {
            cmd.current_dir(dir);
        }
        for (key, value) in &self.envs {
            cmd.env(key, value);
        }

        let mut child = cmd.spawn().map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => ProcessError::NotFound {
                program: program.clone(),
            },
            _ => ProcessError::Io {
                program: program.clone(),
                source: e,
            },
        })?;

        let stdout = drain(child.stdout.take());
        let stderr = drain(child.stderr.take());

        let status = match self.timeout {
            Some(limit) => wait_with_deadline(&mut child, limit, &program)?,
            None => Some(child.wait().map_err(|e| ProcessError::Io {
                program: program.clone(),
                source: e,
            })?),
        };

        let stdout = collect(stdout);
        let stderr = collect(stderr);

        match status {
            Some(status) => Ok(CommandOutput {
                code: status.code(),
                stdout,
                stderr,
            }),
            None => {
                tracing::warn!(program = %program, "External command timed out and was killed");
                Err(ProcessError::TimedOut {
                    program,
                    timeout: self.timeout.unwrap_or_default(),
                })
            }
        }
    }

    /// Run to completion and treat a non-zero exit as an error
    pub fn run_checked(&self) -> Result<CommandOutput> {
        let output = self.output()?;
        if output.success() {
            Ok(output)
        } else {
            Err(ProcessError::CommandFailed {
                program: self.program_name(),
                code: output.code.unwrap_or(-1),
                stderr: output.stderr.trim().to_string(),
            })
        }
    }
}

/// Poll the child until it exits or the deadline passes.
///
/// Returns `None` after killing a child that overran.
fn wait_with_deadline(
    child: &mut Child,
    limit: Duration,
    program: &str,
) -> Result<Option<ExitStatus>> {
    let deadline = Instant::now() + limit;
    loop {
        let polled = child.try_wait().map_err(|e| ProcessError::Io {
            program: program.to_string(),
            source: e,
        })?;
        if let Some(status) = polled {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

fn drain<R: Read + Send + 'static>(stream: Option<R>) -> Option<JoinHandle<Vec<u8>>> {
    stream.map(|mut stream| {
        thread::spawn(move || {
            let mut buffer = Vec::new();
            let _ = stream.read_to_end(&mut buffer);
            buffer
        })
    })
}

fn collect(handle: Option<JoinHandle<Vec<u8>>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
        .unwrap_or_default()
}
