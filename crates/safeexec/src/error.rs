//! Error types for safe command execution.

use serde::Serialize;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the safeexec API.
///
/// Validation variants are programmer errors and are returned before any
/// process is created. Process-level failures are never returned through this
/// type by [`safe_execute`](crate::safe_execute); they are reported as
/// [`ProcessError`] inside a [`CommandResult`](crate::CommandResult).
#[derive(Debug, Error)]
pub enum SafeExecError {
    /// Command name contains characters outside `[A-Za-z0-9._/-]`.
    #[error("Invalid command: \"{0}\". Command contains unsafe characters.")]
    InvalidCommand(String),

    /// An argument is not a string.
    #[error("Invalid argument type: {kind} at index {index}. All arguments must be strings.")]
    InvalidArgumentType { index: usize, kind: String },

    /// Normalized path contains a parent-directory segment.
    #[error("Invalid file path: \"{}\". Directory traversal detected.", .0.display())]
    DirectoryTraversal(PathBuf),

    /// Resolved path escapes the declared base directory.
    #[error("Invalid file path: \"{}\". Path is outside base directory.", .0.display())]
    OutsideBaseDirectory(PathBuf),

    /// Package name rejected by [`is_valid_package_name`](crate::is_valid_package_name).
    #[error("Invalid package name: \"{0}\"")]
    InvalidPackageName(String),

    /// A streamed command exceeded its timeout and was terminated.
    #[error("Command timed out after {0}ms")]
    TimedOut(u64),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// I/O error outside of a child process (e.g. resolving the working directory).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The process driver stopped without reporting a result.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl SafeExecError {
    /// Whether this error was raised by input validation, before spawning.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidCommand(_)
                | Self::InvalidArgumentType { .. }
                | Self::DirectoryTraversal(_)
                | Self::OutsideBaseDirectory(_)
                | Self::InvalidPackageName(_)
        )
    }

    /// Whether this error is the streaming executor's timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::TimedOut(_))
    }
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON5 parse error: {0}")]
    Json5(String),
}

/// A process-level failure recorded in a [`CommandResult`](crate::CommandResult).
///
/// This is data, not a raised error: callers inspect it alongside the exit code.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ProcessError {
    /// The OS could not create the process.
    #[error("Failed to spawn \"{command}\": {message}")]
    Spawn {
        command: String,
        #[serde(skip)]
        io_kind: io::ErrorKind,
        message: String,
    },

    /// The process exited with a non-zero status.
    #[error("Command failed with exit code {code}")]
    NonZeroExit { code: i32 },

    /// The process ran past its timeout and was terminated.
    #[error("Command timed out after {timeout_ms}ms")]
    TimedOut { timeout_ms: u64 },

    /// Combined output exceeded the buffer cap; the process was terminated.
    #[error("Output exceeded maxBuffer of {limit} bytes")]
    MaxBufferExceeded { limit: usize },

    /// The process was terminated by a signal.
    #[error("Command terminated by signal {signal}")]
    Signal { signal: i32 },

    /// Reading output or waiting for the process failed.
    #[error("I/O error while running command: {message}")]
    Io { message: String },
}

impl ProcessError {
    pub(crate) fn spawn(command: &str, err: &io::Error) -> Self {
        Self::Spawn {
            command: command.to_string(),
            io_kind: err.kind(),
            message: err.to_string(),
        }
    }

    pub(crate) fn io(err: &io::Error) -> Self {
        Self::Io {
            message: err.to_string(),
        }
    }

    /// Whether the executable could not be found.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::Spawn {
                io_kind: io::ErrorKind::NotFound,
                ..
            }
        )
    }
}
