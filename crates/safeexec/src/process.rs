//! Process plumbing shared by the buffered and streaming executors.

use std::ffi::OsStr;
use std::io;
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::warn;

use crate::options::SafeCommandOptions;

/// Read buffer size for output pipes.
pub(crate) const READ_CHUNK: usize = 8 * 1024;

/// Build an argv-based command. The program is executed directly; no shell
/// is ever involved, so arguments reach it verbatim.
pub(crate) fn build_command<S: AsRef<OsStr>>(
    command: &str,
    args: &[S],
    options: &SafeCommandOptions,
) -> Command {
    let mut cmd = Command::new(command);
    cmd.args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    if let Some(cwd) = &options.cwd {
        cmd.current_dir(cwd);
    }
    if let Some(env) = &options.env {
        cmd.env_clear().envs(env);
    }

    cmd
}

/// Read from an optional pipe. A missing pipe never yields.
pub(crate) async fn read_pipe<R>(pipe: &mut Option<R>, buf: &mut [u8]) -> io::Result<usize>
where
    R: AsyncRead + Unpin,
{
    match pipe {
        Some(pipe) => pipe.read(buf).await,
        None => std::future::pending().await,
    }
}

/// Ask the process to exit with SIGTERM.
#[cfg(unix)]
pub(crate) fn request_termination(child: &mut Child) -> io::Result<()> {
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    // No pid means the child was already reaped.
    let Some(pid) = child.id() else {
        return Ok(());
    };
    kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(io::Error::from)
}

#[cfg(not(unix))]
pub(crate) fn request_termination(child: &mut Child) -> io::Result<()> {
    child.start_kill()
}

/// Terminate the process: SIGTERM, then SIGKILL if it is still running after
/// `grace`. Returns once the process has been reaped.
pub(crate) async fn terminate(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    if let Err(e) = request_termination(child) {
        warn!(error = %e, "failed to send SIGTERM");
    }

    match tokio::time::timeout(grace, child.wait()).await {
        Ok(status) => status,
        Err(_) => {
            warn!(
                grace_ms = grace.as_millis() as u64,
                "process ignored SIGTERM; sending SIGKILL"
            );
            child.kill().await?;
            child.wait().await
        }
    }
}

/// Signal that terminated the process, if any.
pub(crate) fn terminating_signal(status: &ExitStatus) -> Option<i32> {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        status.signal()
    }
    #[cfg(not(unix))]
    {
        let _ = status;
        None
    }
}

/// Incremental UTF-8 decoder for output chunks.
///
/// A multi-byte sequence split across reads is held back until its remaining
/// bytes arrive. Invalid bytes decode to U+FFFD; NUL is ordinary text.
#[derive(Debug, Default)]
pub(crate) struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub(crate) fn decode(&mut self, bytes: &[u8]) -> String {
        self.pending.extend_from_slice(bytes);
        let split = self.pending.len() - incomplete_suffix_len(&self.pending);
        let text = String::from_utf8_lossy(&self.pending[..split]).into_owned();
        self.pending.drain(..split);
        text
    }

    /// Flush whatever is left, lossily.
    pub(crate) fn finish(&mut self) -> String {
        let text = String::from_utf8_lossy(&self.pending).into_owned();
        self.pending.clear();
        text
    }
}

/// Length of a trailing, not yet complete UTF-8 sequence.
fn incomplete_suffix_len(bytes: &[u8]) -> usize {
    let len = bytes.len();
    for back in 1..=len.min(3) {
        let byte = bytes[len - back];
        if byte & 0xC0 == 0x80 {
            continue;
        }
        let needed = match byte {
            b if b & 0xE0 == 0xC0 => 2,
            b if b & 0xF0 == 0xE0 => 3,
            b if b & 0xF8 == 0xF0 => 4,
            _ => 1,
        };
        return if needed > back { back } else { 0 };
    }
    0
}
