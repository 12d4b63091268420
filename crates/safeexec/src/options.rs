//! Execution options shared by both executors.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Default wall-clock limit for [`safe_execute`](crate::safe_execute).
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

/// Default cap on combined stdout + stderr bytes for the buffered executor.
pub const DEFAULT_MAX_BUFFER: usize = 1024 * 1024;

/// Default delay between SIGTERM and SIGKILL.
pub const DEFAULT_KILL_GRACE_MS: u64 = 2_000;

/// Options for one command invocation.
///
/// All fields are optional; zero values count as unset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafeCommandOptions {
    /// Working directory override.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cwd: Option<PathBuf>,

    /// Replacement environment. `None` inherits the host environment,
    /// including any secrets it holds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<HashMap<String, String>>,

    /// Wall-clock limit in milliseconds before forced termination.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Maximum combined output bytes before the buffered executor aborts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_buffer: Option<usize>,

    /// Delay between SIGTERM and SIGKILL when terminating.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kill_grace_ms: Option<u64>,
}

impl SafeCommandOptions {
    /// Create options with every field unset.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style method to set the working directory.
    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    /// Builder-style method to replace the environment.
    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }

    /// Builder-style method to set the timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Builder-style method to set the output cap.
    pub fn with_max_buffer(mut self, bytes: usize) -> Self {
        self.max_buffer = Some(bytes);
        self
    }

    /// Builder-style method to set the SIGTERM to SIGKILL grace period.
    pub fn with_kill_grace(mut self, grace: Duration) -> Self {
        self.kill_grace_ms = Some(grace.as_millis() as u64);
        self
    }

    /// Configured timeout, if any.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_ms.filter(|ms| *ms > 0).map(Duration::from_millis)
    }

    /// Timeout applied by the buffered executor.
    pub(crate) fn effective_timeout(&self) -> Duration {
        self.timeout()
            .unwrap_or(Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }

    /// Output cap applied by the buffered executor.
    pub(crate) fn effective_max_buffer(&self) -> usize {
        self.max_buffer
            .filter(|n| *n > 0)
            .unwrap_or(DEFAULT_MAX_BUFFER)
    }

    pub(crate) fn kill_grace(&self) -> Duration {
        Duration::from_millis(
            self.kill_grace_ms
                .filter(|ms| *ms > 0)
                .unwrap_or(DEFAULT_KILL_GRACE_MS),
        )
    }

    /// Fill unset fields from `defaults`.
    pub fn or(mut self, defaults: &SafeCommandOptions) -> Self {
        if self.cwd.is_none() {
            self.cwd = defaults.cwd.clone();
        }
        if self.env.is_none() {
            self.env = defaults.env.clone();
        }
        if self.timeout_ms.is_none() {
            self.timeout_ms = defaults.timeout_ms;
        }
        if self.max_buffer.is_none() {
            self.max_buffer = defaults.max_buffer;
        }
        if self.kill_grace_ms.is_none() {
            self.kill_grace_ms = defaults.kill_grace_ms;
        }
        self
    }
}

/// Callback receiving decoded output chunks as they arrive.
pub type OutputCallback = Box<dyn FnMut(&str) + Send + 'static>;

/// Options for [`safe_spawn`](crate::safe_spawn).
///
/// `max_buffer` is ignored and there is no default timeout: a streamed
/// process runs until it exits unless `timeout_ms` is set.
#[derive(Default)]
pub struct SpawnOptions {
    pub options: SafeCommandOptions,
    pub on_stdout: Option<OutputCallback>,
    pub on_stderr: Option<OutputCallback>,
}

impl SpawnOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from existing command options.
    pub fn from_options(options: SafeCommandOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options = self.options.with_timeout(timeout);
        self
    }

    pub fn with_cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.options = self.options.with_cwd(cwd);
        self
    }

    pub fn with_env(mut self, env: HashMap<String, String>) -> Self {
        self.options = self.options.with_env(env);
        self
    }

    /// Forward each stdout chunk to `f`.
    pub fn on_stdout(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_stdout = Some(Box::new(f));
        self
    }

    /// Forward each stderr chunk to `f`.
    pub fn on_stderr(mut self, f: impl FnMut(&str) + Send + 'static) -> Self {
        self.on_stderr = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for SpawnOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpawnOptions")
            .field("options", &self.options)
            .field("on_stdout", &self.on_stdout.is_some())
            .field("on_stderr", &self.on_stderr.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = SafeCommandOptions::default();
        assert_eq!(opts.timeout(), None);
        assert_eq!(opts.effective_timeout(), Duration::from_millis(30_000));
        assert_eq!(opts.effective_max_buffer(), 1024 * 1024);
        assert_eq!(opts.kill_grace(), Duration::from_secs(2));
    }

    #[test]
    fn test_zero_counts_as_unset() {
        let opts = SafeCommandOptions {
            timeout_ms: Some(0),
            max_buffer: Some(0),
            ..Default::default()
        };
        assert_eq!(opts.timeout(), None);
        assert_eq!(opts.effective_timeout(), Duration::from_millis(DEFAULT_TIMEOUT_MS));
        assert_eq!(opts.effective_max_buffer(), DEFAULT_MAX_BUFFER);
    }

    #[test]
    fn test_builder() {
        let opts = SafeCommandOptions::new()
            .with_cwd("/tmp")
            .with_timeout(Duration::from_millis(250))
            .with_max_buffer(64);

        assert_eq!(opts.cwd, Some(PathBuf::from("/tmp")));
        assert_eq!(opts.timeout_ms, Some(250));
        assert_eq!(opts.effective_max_buffer(), 64);
    }

    #[test]
    fn test_or_keeps_explicit_values() {
        let defaults = SafeCommandOptions::new()
            .with_timeout(Duration::from_secs(5))
            .with_max_buffer(10);
        let opts = SafeCommandOptions::new().with_max_buffer(20).or(&defaults);

        assert_eq!(opts.timeout_ms, Some(5_000));
        assert_eq!(opts.max_buffer, Some(20));
    }

    #[test]
    fn test_deserialize_partial() {
        let opts: SafeCommandOptions = serde_json::from_str(r#"{"timeout_ms": 100}"#).unwrap();
        assert_eq!(opts.timeout_ms, Some(100));
        assert!(opts.env.is_none());
    }

    #[test]
    fn test_spawn_options_debug_hides_callbacks() {
        let opts = SpawnOptions::new().on_stdout(|_| {});
        let debug = format!("{:?}", opts);
        assert!(debug.contains("on_stdout: true"));
        assert!(debug.contains("on_stderr: false"));
    }
}
