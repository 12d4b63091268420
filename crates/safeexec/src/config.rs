//! Configuration loading and persistence.
//!
//! The config file is JSON5 and only supplies defaults: options passed
//! explicitly to a call always win.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::env::scrubbed_env;
use crate::error::ConfigError;
use crate::options::SafeCommandOptions;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV_VAR: &str = "SAFEEXEC_CONFIG";

/// Defaults applied to every command run through the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecConfig {
    /// Default command options.
    #[serde(default)]
    pub defaults: SafeCommandOptions,

    /// Replace the inherited environment with a scrubbed copy.
    #[serde(default)]
    pub scrub_env: bool,

    /// Extra variable names stripped when scrubbing.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub blocked_env: Vec<String>,
}

impl ExecConfig {
    /// Default config path (`~/.safeexec/config.json5`).
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let home = dirs::home_dir().ok_or_else(|| {
            ConfigError::Validation("Could not determine home directory".to_string())
        })?;
        Ok(home.join(".safeexec").join("config.json5"))
    }

    /// Load from the default path; a missing file yields built-in defaults.
    pub fn load_default() -> Result<Self, ConfigError> {
        let path = Self::default_path()?;
        match Self::load(&path) {
            Err(ConfigError::NotFound(_)) => Ok(Self::default()),
            other => other,
        }
    }

    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        json5::from_str(content).map_err(|e| ConfigError::Json5(e.to_string()))
    }

    /// Save configuration to a file path.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let content = self.to_json5()?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        // Write atomically
        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, &content)?;
        fs::rename(&temp_path, path)?;

        Ok(())
    }

    /// Serialize to a JSON5-compatible string.
    pub fn to_json5(&self) -> Result<String, ConfigError> {
        // json5 has no serializer; plain JSON is valid JSON5.
        serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Validate the configuration, collecting all errors before returning.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.defaults.max_buffer == Some(0) {
            errors.push("defaults.max_buffer must be greater than 0".to_string());
        }

        if self.defaults.timeout_ms == Some(0) {
            errors.push("defaults.timeout_ms must be greater than 0".to_string());
        }

        if let Some(cwd) = &self.defaults.cwd {
            if !cwd.is_dir() {
                errors.push(format!(
                    "defaults.cwd '{}' is not a directory",
                    cwd.display()
                ));
            }
        }

        for name in &self.blocked_env {
            if name.is_empty() || name.contains('=') {
                errors.push(format!("blocked_env entry '{}' is not a variable name", name));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation(errors.join("; ")))
        }
    }

    /// Command options with config defaults applied. With `scrub_env` and no
    /// explicit environment, the child gets a scrubbed copy of ours.
    pub fn command_options(&self) -> SafeCommandOptions {
        let mut options = self.defaults.clone();
        if self.scrub_env && options.env.is_none() {
            options.env = Some(scrubbed_env(&self.blocked_env));
        }
        options
    }
}
