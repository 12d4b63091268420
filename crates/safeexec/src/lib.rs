//! Shell-free external process execution.
//!
//! Caller-supplied strings (filenames, search terms, package names, arbitrary
//! text) are passed to programs as discrete argv entries and are never seen
//! by a shell. On top of that this crate provides:
//! - Validation: command names, argument types, package names, filenames
//! - Buffered execution with timeout and output cap: [`safe_execute`]
//! - Streaming execution with callbacks and termination: [`safe_spawn`]
//! - Path containment: [`sanitize_file_path`]
//! - Last-resort shell quoting: [`escape_shell_arg`]

pub mod config;
pub mod env;
pub mod error;
pub mod escape;
pub mod execute;
pub mod options;
pub mod path;
mod process;
pub mod recipes;
pub mod result;
pub mod spawn;
pub mod validate;

pub use config::ExecConfig;
pub use error::{ConfigError, ProcessError, SafeExecError};
pub use escape::escape_shell_arg;
pub use execute::safe_execute;
pub use options::{OutputCallback, SafeCommandOptions, SpawnOptions};
pub use path::sanitize_file_path;
pub use recipes::{safe_npm_install, safe_read_file};
pub use result::CommandResult;
pub use spawn::{safe_spawn, ProcessHandle, SpawnedProcess};
pub use validate::{
    arguments_from_json, is_valid_filename, is_valid_package_name, validate_arguments,
    validate_command,
};

/// Result type for safeexec operations.
pub type Result<T> = std::result::Result<T, SafeExecError>;
