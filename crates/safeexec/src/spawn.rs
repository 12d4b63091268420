//! Streaming command execution.
//!
//! [`safe_spawn`] starts the process and returns at once. A background Tokio
//! task owns the child: it forwards output chunks to the callbacks as they
//! arrive, enforces the optional timeout and settles the result exactly once.

use std::ffi::OsStr;
use std::process::ExitStatus;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::error::{ProcessError, SafeExecError};
use crate::options::{OutputCallback, SpawnOptions};
use crate::process::{
    build_command, read_pipe, request_termination, terminate, terminating_signal, Utf8Decoder,
    READ_CHUNK,
};
use crate::result::CommandResult;
use crate::validate::{validate_arguments, validate_command};
use crate::Result;

/// Far-off deadline for timers that are not armed.
const NEVER: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Opaque handle to a streamed process.
///
/// Cloneable; every clone controls the same process.
#[derive(Debug, Clone)]
pub struct ProcessHandle {
    pid: Option<u32>,
    kill_tx: mpsc::Sender<()>,
}

impl ProcessHandle {
    /// OS process id, if the process was created.
    pub fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Ask the process to terminate (SIGTERM, SIGKILL after the grace period).
    ///
    /// Returns false when the process has already been settled.
    pub fn terminate(&self) -> bool {
        match self.kill_tx.try_send(()) {
            Ok(()) | Err(TrySendError::Full(())) => true,
            Err(TrySendError::Closed(())) => false,
        }
    }

    /// Whether the result has been settled (or the process never started).
    pub fn is_finished(&self) -> bool {
        self.kill_tx.is_closed()
    }
}

/// A running command: its handle plus the pending result.
#[derive(Debug)]
pub struct SpawnedProcess {
    handle: ProcessHandle,
    result: oneshot::Receiver<Result<CommandResult>>,
}

impl SpawnedProcess {
    /// Handle for terminating the process from elsewhere.
    pub fn handle(&self) -> &ProcessHandle {
        &self.handle
    }

    pub fn pid(&self) -> Option<u32> {
        self.handle.pid()
    }

    /// Shorthand for `self.handle().terminate()`.
    pub fn terminate(&self) -> bool {
        self.handle.terminate()
    }

    /// Wait for the process to settle.
    ///
    /// Resolves `Ok` for normal exits (any code), spawn failures
    /// (`exit_code: None`, `error: Spawn`) and caller terminations
    /// (`exit_code: None`, `error: Signal`). Resolves
    /// `Err(SafeExecError::TimedOut)` as soon as the timeout elapses; the
    /// process is then terminated (SIGKILL after the grace period) and reaped
    /// in the background.
    pub async fn wait(self) -> Result<CommandResult> {
        self.result.await.map_err(|_| {
            SafeExecError::Internal("process driver stopped before reporting a result".to_string())
        })?
    }
}

/// Start a command and stream its output.
///
/// Must be called from within a Tokio runtime. Validation failures are
/// returned immediately; everything else is reported through
/// [`SpawnedProcess::wait`]. No shell is involved and none can be requested.
///
/// ```no_run
/// # async fn demo() -> safeexec::Result<()> {
/// use safeexec::{safe_spawn, SpawnOptions};
///
/// let child = safe_spawn(
///     "npm",
///     &["install", "package-name"],
///     SpawnOptions::new()
///         .on_stdout(|chunk| print!("{chunk}"))
///         .on_stderr(|chunk| eprint!("{chunk}")),
/// )?;
/// let result = child.wait().await?;
/// # let _ = result;
/// # Ok(())
/// # }
/// ```
pub fn safe_spawn<S: AsRef<OsStr>>(
    command: &str,
    args: &[S],
    options: SpawnOptions,
) -> Result<SpawnedProcess> {
    validate_command(command)?;
    validate_arguments(args)?;

    let SpawnOptions {
        options,
        on_stdout,
        on_stderr,
    } = options;

    let (kill_tx, kill_rx) = mpsc::channel(1);
    let (result_tx, result_rx) = oneshot::channel();

    let child = match build_command(command, args, &options).spawn() {
        Ok(child) => child,
        Err(e) => {
            debug!(command, error = %e, "failed to spawn streamed command");
            let _ = result_tx.send(Ok(CommandResult::failed(
                String::new(),
                String::new(),
                None,
                ProcessError::spawn(command, &e),
            )));
            return Ok(SpawnedProcess {
                handle: ProcessHandle { pid: None, kill_tx },
                result: result_rx,
            });
        }
    };

    let pid = child.id();
    debug!(command, args = args.len(), pid, "spawned streamed command");

    let driver = Driver {
        command: command.to_string(),
        child,
        timeout: options.timeout(),
        grace: options.kill_grace(),
        stdout: Collector::new(on_stdout),
        stderr: Collector::new(on_stderr),
        kill_rx,
    };
    tokio::spawn(async move {
        let result = driver.run().await;
        let _ = result_tx.send(result);
    });

    Ok(SpawnedProcess {
        handle: ProcessHandle { pid, kill_tx },
        result: result_rx,
    })
}

/// Accumulates one output stream and forwards each decoded chunk.
struct Collector {
    decoder: Utf8Decoder,
    text: String,
    callback: Option<OutputCallback>,
}

impl Collector {
    fn new(callback: Option<OutputCallback>) -> Self {
        Self {
            decoder: Utf8Decoder::default(),
            text: String::new(),
            callback,
        }
    }

    fn push(&mut self, bytes: &[u8]) {
        let chunk = self.decoder.decode(bytes);
        self.emit(chunk);
    }

    fn emit(&mut self, chunk: String) {
        if chunk.is_empty() {
            return;
        }
        if let Some(callback) = self.callback.as_mut() {
            callback(&chunk);
        }
        self.text.push_str(&chunk);
    }

    fn finish(mut self) -> String {
        let rest = self.decoder.finish();
        self.emit(rest);
        self.text
    }
}

struct Driver {
    command: String,
    child: Child,
    timeout: Option<Duration>,
    grace: Duration,
    stdout: Collector,
    stderr: Collector,
    kill_rx: mpsc::Receiver<()>,
}

impl Driver {
    async fn run(mut self) -> Result<CommandResult> {
        let mut stdout_pipe = self.child.stdout.take();
        let mut stderr_pipe = self.child.stderr.take();
        let mut out_done = stdout_pipe.is_none();
        let mut err_done = stderr_pipe.is_none();
        let mut out_buf = [0u8; READ_CHUNK];
        let mut err_buf = [0u8; READ_CHUNK];

        let mut status: Option<ExitStatus> = None;
        let mut listening = true;
        let mut escalation_armed = false;

        let deadline = sleep_until(Instant::now() + self.timeout.unwrap_or(NEVER));
        tokio::pin!(deadline);
        let escalation = sleep_until(Instant::now() + NEVER);
        tokio::pin!(escalation);

        let status = loop {
            if let (true, true, Some(status)) = (out_done, err_done, status) {
                break status;
            }

            tokio::select! {
                read = read_pipe(&mut stdout_pipe, &mut out_buf), if !out_done => match read {
                    Ok(0) => out_done = true,
                    Ok(n) => self.stdout.push(&out_buf[..n]),
                    Err(e) => {
                        warn!(command = %self.command, error = %e, "failed reading stdout");
                        out_done = true;
                    }
                },
                read = read_pipe(&mut stderr_pipe, &mut err_buf), if !err_done => match read {
                    Ok(0) => err_done = true,
                    Ok(n) => self.stderr.push(&err_buf[..n]),
                    Err(e) => {
                        warn!(command = %self.command, error = %e, "failed reading stderr");
                        err_done = true;
                    }
                },
                exited = self.child.wait(), if status.is_none() => match exited {
                    Ok(s) => status = Some(s),
                    Err(e) => {
                        warn!(command = %self.command, error = %e, "failed waiting for process");
                        return Ok(CommandResult::failed(
                            self.stdout.finish(),
                            self.stderr.finish(),
                            None,
                            ProcessError::io(&e),
                        ));
                    }
                },
                _ = &mut deadline, if self.timeout.is_some() => {
                    let timeout_ms = self.timeout.map(|t| t.as_millis() as u64).unwrap_or_default();
                    warn!(command = %self.command, timeout_ms, "streamed command timed out; terminating");
                    // Settle now; the child is reaped in the background.
                    let command = self.command;
                    let grace = self.grace;
                    let mut child = self.child;
                    tokio::spawn(async move {
                        if let Err(e) = terminate(&mut child, grace).await {
                            warn!(command = %command, error = %e, "failed to terminate timed out process");
                        }
                    });
                    return Err(SafeExecError::TimedOut(timeout_ms));
                },
                request = self.kill_rx.recv(), if listening => {
                    listening = false;
                    if request.is_some() && status.is_none() {
                        info!(command = %self.command, "termination requested; sending SIGTERM");
                        if let Err(e) = request_termination(&mut self.child) {
                            warn!(command = %self.command, error = %e, "failed to send SIGTERM");
                        }
                        escalation.as_mut().reset(Instant::now() + self.grace);
                        escalation_armed = true;
                    }
                },
                _ = &mut escalation, if escalation_armed && status.is_none() => {
                    escalation_armed = false;
                    warn!(command = %self.command, "process ignored SIGTERM; sending SIGKILL");
                    if let Err(e) = self.child.start_kill() {
                        warn!(command = %self.command, error = %e, "failed to send SIGKILL");
                    }
                },
            }
        };

        let stdout = self.stdout.finish();
        let stderr = self.stderr.finish();

        debug!(command = %self.command, code = ?status.code(), "streamed command closed");

        Ok(match status.code() {
            Some(code) => CommandResult {
                stdout,
                stderr,
                exit_code: Some(code),
                error: None,
            },
            None => CommandResult::failed(
                stdout,
                stderr,
                None,
                ProcessError::Signal {
                    signal: terminating_signal(&status).unwrap_or(-1),
                },
            ),
        })
    }
}
