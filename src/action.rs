use std::ffi::OsStr;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Mutex;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;

use crate::error::{AppError, Result};

/// Environment variable carrying the repository's full name.
pub const REPOSITORY_ENV: &str = "REPOSITORY";

const READ_CHUNK: usize = 8 * 1024;

/// Receives the action's output streams as they are produced.
///
/// Shared by every concurrent run, so each chunk must be written atomically.
pub trait OutputSink: Send + Sync {
    fn stdout(&self, chunk: &[u8]);
    fn stderr(&self, chunk: &[u8]);
}

/// Forwards to this process's own stdout and stderr.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdioSink;

impl OutputSink for StdioSink {
    fn stdout(&self, chunk: &[u8]) {
        let mut out = std::io::stdout().lock();
        let _ = out.write_all(chunk);
        let _ = out.flush();
    }

    fn stderr(&self, chunk: &[u8]) {
        let mut err = std::io::stderr().lock();
        let _ = err.write_all(chunk);
        let _ = err.flush();
    }
}

/// Collects both streams in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    stdout: Mutex<Vec<u8>>,
    stderr: Mutex<Vec<u8>>,
}

impl MemorySink {
    pub fn stdout_string(&self) -> String {
        let buf = self.stdout.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub fn stderr_string(&self) -> String {
        let buf = self.stderr.lock().unwrap_or_else(|e| e.into_inner());
        String::from_utf8_lossy(&buf).into_owned()
    }
}

impl OutputSink for MemorySink {
    fn stdout(&self, chunk: &[u8]) {
        self.stdout
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(chunk);
    }

    fn stderr(&self, chunk: &[u8]) {
        self.stderr
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .extend_from_slice(chunk);
    }
}

#[derive(Debug, Clone, Copy)]
enum Stream {
    Stdout,
    Stderr,
}

/// The external program run once per repository.
#[derive(Debug, Clone)]
pub struct ActionTemplate {
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl ActionTemplate {
    /// Resolve `program` to an absolute path up front, so every run finds the
    /// same executable regardless of its working directory.
    pub fn resolve(program: &str, args: Vec<String>) -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let path_var = std::env::var_os("PATH");
        let program = resolve_executable_in(program, &cwd, path_var.as_deref())?;
        Ok(Self { program, args })
    }

    /// Run the action inside `workdir` and wait for it to exit.
    ///
    /// Only the exit status matters; output is handed to `sink` untouched.
    pub async fn run(&self, workdir: &Path, full_name: &str, sink: &dyn OutputSink) -> Result<()> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .current_dir(workdir)
            .env(REPOSITORY_ENV, full_name)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| AppError::ActionLaunch(format!("{}: {e}", self.program.display())))?;

        let stdout = child.stdout.take();
        let stderr = child.stderr.take();

        let (status, _, _) = tokio::join!(
            child.wait(),
            forward(stdout, sink, Stream::Stdout),
            forward(stderr, sink, Stream::Stderr),
        );

        let status = status
            .map_err(|e| AppError::ActionLaunch(format!("{}: {e}", self.program.display())))?;

        if !status.success() {
            return Err(AppError::ActionExit(status.to_string()));
        }

        Ok(())
    }
}

/// Copy one child stream into the sink until EOF.
async fn forward<R>(reader: Option<R>, sink: &dyn OutputSink, stream: Stream)
where
    R: AsyncRead + Unpin,
{
    let Some(mut reader) = reader else {
        return;
    };

    let mut buf = vec![0u8; READ_CHUNK];
    loop {
        match reader.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => match stream {
                Stream::Stdout => sink.stdout(&buf[..n]),
                Stream::Stderr => sink.stderr(&buf[..n]),
            },
            Err(e) => {
                tracing::debug!(stream = ?stream, error = %e, "Stopped forwarding action output");
                break;
            }
        }
    }
}

/// Resolve a program the way a shell would: paths relative to `cwd`, bare
/// names through `PATH`.
pub fn resolve_executable_in(program: &str, cwd: &Path, path_var: Option<&OsStr>) -> Result<PathBuf> {
    if program.is_empty() {
        return Err(AppError::Config("Empty action path".to_string()));
    }

    let as_path = Path::new(program);
    if as_path.components().count() > 1 || as_path.is_absolute() {
        let absolute = if as_path.is_absolute() {
            as_path.to_path_buf()
        } else {
            cwd.join(as_path)
        };
        if !absolute.is_file() {
            return Err(AppError::Config(format!(
                "Action not found: {}",
                absolute.display()
            )));
        }
        return Ok(absolute);
    }

    path_var
        .into_iter()
        .flat_map(std::env::split_paths)
        .map(|dir| dir.join(program))
        .find(|candidate| is_executable(candidate))
        .map(|candidate| {
            if candidate.is_absolute() {
                candidate
            } else {
                cwd.join(candidate)
            }
        })
        .ok_or_else(|| AppError::Config(format!("Action not found in PATH: {program}")))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    std::fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
