//! Buffered command execution.

use std::ffi::OsStr;
use std::io;
use std::process::ExitStatus;

use tokio::process::Child;
use tracing::{debug, warn};

use crate::error::ProcessError;
use crate::options::SafeCommandOptions;
use crate::process::{build_command, read_pipe, terminate, terminating_signal, READ_CHUNK};
use crate::result::CommandResult;
use crate::validate::{validate_arguments, validate_command};
use crate::Result;

/// Run a command to completion and collect its output.
///
/// Only validation failures are returned as `Err`, before anything is
/// spawned. Every process-level outcome (non-zero exit, spawn failure,
/// timeout, output overrun) comes back as `Ok` with `exit_code` set (`1` when
/// the process produced none) and `error` describing what happened.
///
/// ```no_run
/// # async fn demo() -> safeexec::Result<()> {
/// use safeexec::{safe_execute, SafeCommandOptions};
///
/// let result = safe_execute("cat", &["file.txt"], &SafeCommandOptions::default()).await?;
/// if result.success() {
///     println!("{}", result.stdout);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn safe_execute<S: AsRef<OsStr>>(
    command: &str,
    args: &[S],
    options: &SafeCommandOptions,
) -> Result<CommandResult> {
    validate_command(command)?;
    validate_arguments(args)?;

    let timeout = options.effective_timeout();
    let max_buffer = options.effective_max_buffer();
    let timeout_ms = timeout.as_millis() as u64;

    debug!(
        command,
        args = args.len(),
        timeout_ms,
        max_buffer,
        "executing command"
    );

    let mut child = match build_command(command, args, options).spawn() {
        Ok(child) => child,
        Err(e) => {
            debug!(command, error = %e, "failed to spawn command");
            return Ok(CommandResult::failed(
                String::new(),
                String::new(),
                Some(1),
                ProcessError::spawn(command, &e),
            ));
        }
    };

    let mut capture = Capture::new(max_buffer);
    let outcome = tokio::time::timeout(timeout, capture.run(&mut child)).await;

    let (exit_code, error) = match outcome {
        Ok(RunOutcome::Exited(status)) => classify_exit(status),
        Ok(RunOutcome::Overflow) => {
            warn!(command, max_buffer, "command output exceeded buffer; terminating");
            stop(&mut child, options).await;
            (1, Some(ProcessError::MaxBufferExceeded { limit: max_buffer }))
        }
        Ok(RunOutcome::Failed(e)) => {
            warn!(command, error = %e, "failed while collecting command output");
            stop(&mut child, options).await;
            (1, Some(ProcessError::io(&e)))
        }
        Err(_) => {
            warn!(command, timeout_ms, "command timed out; terminating");
            stop(&mut child, options).await;
            (1, Some(ProcessError::TimedOut { timeout_ms }))
        }
    };

    Ok(capture.into_result(exit_code, error))
}

fn classify_exit(status: ExitStatus) -> (i32, Option<ProcessError>) {
    match status.code() {
        Some(0) => (0, None),
        Some(code) => (code, Some(ProcessError::NonZeroExit { code })),
        None => match terminating_signal(&status) {
            Some(signal) => (1, Some(ProcessError::Signal { signal })),
            None => (1, Some(ProcessError::NonZeroExit { code: 1 })),
        },
    }
}

async fn stop(child: &mut Child, options: &SafeCommandOptions) {
    if let Err(e) = terminate(child, options.kill_grace()).await {
        warn!(error = %e, "failed to terminate command");
    }
}

enum RunOutcome {
    Exited(ExitStatus),
    Overflow,
    Failed(io::Error),
}

/// Output collected so far, bounded by a combined byte cap.
struct Capture {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
    limit: usize,
}

impl Capture {
    fn new(limit: usize) -> Self {
        Self {
            stdout: Vec::new(),
            stderr: Vec::new(),
            limit,
        }
    }

    fn total(&self) -> usize {
        self.stdout.len() + self.stderr.len()
    }

    /// Append as much of `bytes` as fits. Returns false once the cap is hit.
    fn push(&mut self, to_stderr: bool, bytes: &[u8]) -> bool {
        let room = self.limit.saturating_sub(self.total());
        let take = bytes.len().min(room);
        let target = if to_stderr {
            &mut self.stderr
        } else {
            &mut self.stdout
        };
        target.extend_from_slice(&bytes[..take]);
        take == bytes.len()
    }

    /// Drain both pipes to EOF, then wait for the exit status.
    async fn run(&mut self, child: &mut Child) -> RunOutcome {
        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut out_done = stdout.is_none();
        let mut err_done = stderr.is_none();
        let mut out_buf = [0u8; READ_CHUNK];
        let mut err_buf = [0u8; READ_CHUNK];

        while !(out_done && err_done) {
            tokio::select! {
                read = read_pipe(&mut stdout, &mut out_buf), if !out_done => match read {
                    Ok(0) => out_done = true,
                    Ok(n) => {
                        if !self.push(false, &out_buf[..n]) {
                            return RunOutcome::Overflow;
                        }
                    }
                    Err(e) => return RunOutcome::Failed(e),
                },
                read = read_pipe(&mut stderr, &mut err_buf), if !err_done => match read {
                    Ok(0) => err_done = true,
                    Ok(n) => {
                        if !self.push(true, &err_buf[..n]) {
                            return RunOutcome::Overflow;
                        }
                    }
                    Err(e) => return RunOutcome::Failed(e),
                },
            }
        }

        match child.wait().await {
            Ok(status) => RunOutcome::Exited(status),
            Err(e) => RunOutcome::Failed(e),
        }
    }

    fn into_result(self, exit_code: i32, error: Option<ProcessError>) -> CommandResult {
        CommandResult {
            stdout: String::from_utf8_lossy(&self.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
            exit_code: Some(exit_code),
            error,
        }
    }
}
