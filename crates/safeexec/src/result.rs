//! Outcome of one process invocation.

use serde::Serialize;

use crate::error::ProcessError;

/// Captured output and exit status of one command.
///
/// A non-zero `exit_code` is an ordinary outcome; callers must inspect it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandResult {
    /// Standard output, decoded as UTF-8.
    pub stdout: String,

    /// Standard error, decoded as UTF-8.
    pub stderr: String,

    /// Exit status; `None` when the process never exited normally.
    pub exit_code: Option<i32>,

    /// Process-level failure, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ProcessError>,
}

impl CommandResult {
    /// Check if the command exited with status 0 and no error.
    pub fn success(&self) -> bool {
        self.exit_code == Some(0) && self.error.is_none()
    }

    /// Exit code for reporting, using `1` when none was produced.
    pub fn exit_code_or_failure(&self) -> i32 {
        self.exit_code.unwrap_or(1)
    }

    pub(crate) fn failed(
        stdout: String,
        stderr: String,
        exit_code: Option<i32>,
        error: ProcessError,
    ) -> Self {
        Self {
            stdout,
            stderr,
            exit_code,
            error: Some(error),
        }
    }
}
