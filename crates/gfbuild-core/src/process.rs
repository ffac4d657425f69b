//! Compiler process execution.
//!
//! [`ProcessExecutor`] implements the [`CompilerExecutor`] trait by spawning
//! the compiler as a child process with stdout and stderr piped separately,
//! draining both streams on dedicated reader threads, and polling for exit.
//! Cancellation is cooperative: the caller flips a [`CancelToken`] and the
//! poll loop kills and reaps the child. There is no timeout unless one is
//! configured.

use std::io::{BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::command::CommandSpec;
use crate::error::InvokeError;

/// Tracing target for process operations.
const PROCESS_TARGET: &str = "gfbuild_core::process";

/// Interval between exit polls while the child is running.
const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Cooperative cancellation flag shared between a build pass and its caller.
///
/// Cloning the token shares the underlying flag. The raw flag is exposed for
/// signal-handler registration.
///
/// # Example
///
/// ```
/// use gfbuild_core::process::CancelToken;
///
/// let token = CancelToken::new();
/// assert!(!token.is_cancelled());
/// token.cancel();
/// assert!(token.is_cancelled());
/// ```
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Creates a token in the not-cancelled state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Irreversible for the lifetime of the token.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Returns the shared flag, suitable for `signal_hook::flag::register`.
    #[must_use]
    pub fn flag(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.flag)
    }
}

/// Captured outcome of a finished compiler invocation.
///
/// Stdout and stderr are captured separately and never merged; diagnostics
/// extraction depends on an unpolluted stderr stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessResult {
    status: i32,
    stdout: Vec<String>,
    stderr: Vec<String>,
}

impl ProcessResult {
    /// Creates a result from an exit status and captured stream lines.
    #[must_use]
    pub const fn new(status: i32, stdout: Vec<String>, stderr: Vec<String>) -> Self {
        Self {
            status,
            stdout,
            stderr,
        }
    }

    /// Whether the process exited with status zero.
    #[must_use]
    pub const fn success(&self) -> bool {
        self.status == 0
    }

    /// The raw exit status. `-1` when the process was terminated by a
    /// signal.
    #[must_use]
    pub const fn status(&self) -> i32 {
        self.status
    }

    /// Captured stdout lines.
    #[must_use]
    pub fn stdout(&self) -> &[String] {
        &self.stdout
    }

    /// Captured stderr lines.
    #[must_use]
    pub fn stderr(&self) -> &[String] {
        &self.stderr
    }
}

/// Trait abstracting compiler process execution for testability.
///
/// The production implementation is [`ProcessExecutor`]. Test code implements
/// this trait to script outcomes without spawning real processes.
///
/// # Example
///
/// ```
/// use gfbuild_core::command::CommandSpec;
/// use gfbuild_core::error::InvokeError;
/// use gfbuild_core::process::{CancelToken, CompilerExecutor, ProcessResult};
///
/// struct AlwaysSucceeds;
///
/// impl CompilerExecutor for AlwaysSucceeds {
///     fn run(
///         &self,
///         _spec: &CommandSpec,
///         _cancel: &CancelToken,
///     ) -> Result<ProcessResult, InvokeError> {
///         Ok(ProcessResult::new(0, Vec::new(), Vec::new()))
///     }
/// }
/// ```
pub trait CompilerExecutor {
    /// Runs the command to completion and captures its output.
    ///
    /// # Errors
    ///
    /// Returns an [`InvokeError`] if the process cannot be spawned, exceeds
    /// the configured timeout, or is cancelled while running. A nonzero exit
    /// status is not an error at this level; it is reported through the
    /// [`ProcessResult`].
    fn run(&self, spec: &CommandSpec, cancel: &CancelToken) -> Result<ProcessResult, InvokeError>;
}

/// Executes compiler commands as real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessExecutor {
    timeout_secs: Option<u64>,
}

impl ProcessExecutor {
    /// Creates an executor with no timeout.
    #[must_use]
    pub const fn new() -> Self {
        Self { timeout_secs: None }
    }

    /// Sets an upper bound, in seconds, on a single invocation.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

impl CompilerExecutor for ProcessExecutor {
    fn run(&self, spec: &CommandSpec, cancel: &CancelToken) -> Result<ProcessResult, InvokeError> {
        run_process(spec, cancel, self.timeout_secs)
    }
}

/// Spawns the command, drains its streams, and waits for exit.
fn run_process(
    spec: &CommandSpec,
    cancel: &CancelToken,
    timeout_secs: Option<u64>,
) -> Result<ProcessResult, InvokeError> {
    if cancel.is_cancelled() {
        return Err(InvokeError::Cancelled);
    }

    debug!(
        target: PROCESS_TARGET,
        program = %spec.program(),
        args = ?spec.args(),
        working_dir = %spec.working_dir(),
        "spawning compiler process"
    );

    let mut command = Command::new(spec.program().as_std_path());
    command
        .args(spec.args())
        .current_dir(spec.working_dir().as_std_path())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    let mut child = command.spawn().map_err(|err| {
        if err.kind() == std::io::ErrorKind::NotFound {
            InvokeError::BinaryNotFound {
                program: spec.program().to_string(),
                source: Arc::new(err),
            }
        } else {
            InvokeError::Spawn {
                program: spec.program().to_string(),
                source: Arc::new(err),
            }
        }
    })?;

    // Drain both pipes off-thread so a chatty compiler cannot dead-lock on a
    // full pipe buffer while we poll for exit.
    let stdout_reader = spawn_line_reader(child.stdout.take());
    let stderr_reader = spawn_line_reader(child.stderr.take());

    let status = wait_for_exit(spec, &mut child, cancel, timeout_secs)?;
    let stdout = collect_lines(stdout_reader);
    let stderr = collect_lines(stderr_reader);

    debug!(
        target: PROCESS_TARGET,
        program = %spec.program(),
        status,
        stdout_lines = stdout.len(),
        stderr_lines = stderr.len(),
        "compiler process exited"
    );

    Ok(ProcessResult::new(status, stdout, stderr))
}

/// Collects a stream's lines on a dedicated thread.
fn spawn_line_reader<R>(stream: Option<R>) -> Option<JoinHandle<Vec<String>>>
where
    R: Read + Send + 'static,
{
    stream.map(|readable| thread::spawn(move || read_lines_lossy(readable)))
}

/// Reads a stream to EOF, splitting on newlines without requiring valid
/// UTF-8.
///
/// Invalid UTF-8 is replaced rather than truncating the capture; compilers
/// occasionally emit raw bytes into otherwise textual streams. An I/O error
/// ends the capture early with a warning.
fn read_lines_lossy(readable: impl Read) -> Vec<String> {
    let mut reader = BufReader::new(readable);
    let mut lines = Vec::new();
    let mut buffer = Vec::new();
    loop {
        buffer.clear();
        match reader.read_until(b'\n', &mut buffer) {
            Ok(0) => break,
            Ok(_) => {
                if buffer.ends_with(b"\n") {
                    buffer.pop();
                    if buffer.ends_with(b"\r") {
                        buffer.pop();
                    }
                }
                lines.push(String::from_utf8_lossy(&buffer).into_owned());
            }
            Err(error) => {
                warn!(target: PROCESS_TARGET, %error, "stream capture aborted early");
                break;
            }
        }
    }
    lines
}

/// Joins a reader thread, swallowing panics into an empty capture.
fn collect_lines(handle: Option<JoinHandle<Vec<String>>>) -> Vec<String> {
    handle
        .and_then(|reader| reader.join().ok())
        .unwrap_or_default()
}

/// Polls the child until exit, cancellation, or timeout.
fn wait_for_exit(
    spec: &CommandSpec,
    child: &mut Child,
    cancel: &CancelToken,
    timeout_secs: Option<u64>,
) -> Result<i32, InvokeError> {
    let start = Instant::now();

    loop {
        if cancel.is_cancelled() {
            warn!(
                target: PROCESS_TARGET,
                program = %spec.program(),
                "cancellation requested, killing compiler process"
            );
            drop(child.kill());
            drop(child.wait());
            return Err(InvokeError::Cancelled);
        }

        match child.try_wait() {
            Ok(Some(status)) => {
                return Ok(status.code().unwrap_or(-1));
            }
            Ok(None) => {
                if let Some(secs) = timeout_secs {
                    if start.elapsed() > Duration::from_secs(secs) {
                        warn!(
                            target: PROCESS_TARGET,
                            program = %spec.program(),
                            timeout_secs = secs,
                            "compiler timed out, killing process"
                        );
                        drop(child.kill());
                        drop(child.wait());
                        return Err(InvokeError::Timeout {
                            program: spec.program().to_string(),
                            timeout_secs: secs,
                        });
                    }
                }
                thread::sleep(POLL_INTERVAL);
            }
            Err(err) => {
                drop(child.kill());
                drop(child.wait());
                return Err(InvokeError::Wait {
                    program: spec.program().to_string(),
                    source: Arc::new(err),
                });
            }
        }
    }
}
