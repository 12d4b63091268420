//! CLI command implementations.

pub mod check;
pub mod config;
pub mod exec;
pub mod run;
pub mod spawn;

use std::path::{Path, PathBuf};

use clap::Args;
use safeexec::{ConfigError, ExecConfig, SafeCommandOptions};

/// Load the config from `path`, or from the default location.
///
/// An explicitly named file must exist; the default one may be absent.
pub fn load_config(path: Option<&Path>) -> anyhow::Result<ExecConfig> {
    let config = match path {
        Some(path) => ExecConfig::load(path)?,
        None => ExecConfig::load_default()?,
    };
    tracing::debug!(?config, "Loaded configuration");
    Ok(config)
}

/// Resolve the config file path shown to the user.
pub fn config_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    match path {
        Some(path) => Ok(path.to_path_buf()),
        None => ExecConfig::default_path(),
    }
}

/// Process options shared by the commands that run something.
#[derive(Args, Debug, Default, Clone)]
pub struct CommandOptionArgs {
    /// Working directory for the child
    #[arg(long)]
    pub cwd: Option<PathBuf>,

    /// Timeout in milliseconds
    #[arg(long)]
    pub timeout_ms: Option<u64>,

    /// Maximum combined stdout and stderr bytes to capture
    #[arg(long)]
    pub max_buffer: Option<usize>,

    /// Give the child a scrubbed copy of the environment
    #[arg(long)]
    pub scrub_env: bool,
}

impl CommandOptionArgs {
    /// Merge flags over config defaults. Flags win.
    pub fn resolve(&self, config: &ExecConfig) -> SafeCommandOptions {
        let mut config = config.clone();
        if self.scrub_env {
            config.scrub_env = true;
        }

        SafeCommandOptions {
            cwd: self.cwd.clone(),
            timeout_ms: self.timeout_ms,
            max_buffer: self.max_buffer,
            ..Default::default()
        }
        .or(&config.command_options())
    }
}
