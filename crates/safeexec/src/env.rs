//! Environment scrubbing for child processes.
//!
//! Children inherit the host environment unless
//! [`SafeCommandOptions::env`](crate::SafeCommandOptions::env) replaces it.
//! These helpers build a replacement without loader-injection hooks or
//! obvious credentials.

use std::collections::HashMap;
use std::env;

/// Variables that change how the child loads code or interprets input.
pub const BLOCKED_ENV_VARS: &[&str] = &[
    // Dynamic linker injection
    "LD_PRELOAD",
    "LD_LIBRARY_PATH",
    "LD_AUDIT",
    "DYLD_INSERT_LIBRARIES",
    "DYLD_LIBRARY_PATH",
    // Runtime injection
    "NODE_OPTIONS",
    "NODE_PATH",
    "PYTHONPATH",
    "PYTHONHOME",
    "RUBYLIB",
    "PERL5LIB",
    // Shell startup
    "BASH_ENV",
    "ENV",
    "IFS",
    // Other dangerous
    "GCONV_PATH",
    "SSLKEYLOGFILE",
];

/// Blocked variable prefixes.
pub const BLOCKED_ENV_PREFIXES: &[&str] = &["DYLD_", "LD_"];

/// Name fragments that mark a variable as a credential.
const SECRET_MARKERS: &[&str] = &[
    "SECRET",
    "TOKEN",
    "PASSWORD",
    "PASSWD",
    "API_KEY",
    "APIKEY",
    "PRIVATE_KEY",
    "CREDENTIAL",
];

/// Check if an environment variable name is blocked.
pub fn is_env_var_blocked(name: &str) -> bool {
    if BLOCKED_ENV_VARS.contains(&name) {
        return true;
    }
    BLOCKED_ENV_PREFIXES.iter().any(|prefix| name.starts_with(prefix))
}

/// Check if an environment variable name looks like it holds a credential.
pub fn is_secret_env_var(name: &str) -> bool {
    let upper = name.to_ascii_uppercase();
    SECRET_MARKERS.iter().any(|marker| upper.contains(marker))
}

/// Filter a mapping, dropping blocked and credential-like variables plus any
/// name listed in `extra_blocked`.
pub fn filter_env(
    env: &HashMap<String, String>,
    extra_blocked: &[String],
) -> HashMap<String, String> {
    env.iter()
        .filter(|(k, _)| {
            !is_env_var_blocked(k) && !is_secret_env_var(k) && !extra_blocked.contains(k)
        })
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Filtered copy of the current process environment.
///
/// Variables whose name or value is not valid UTF-8 are left out.
pub fn scrubbed_env(extra_blocked: &[String]) -> HashMap<String, String> {
    let current: HashMap<String, String> = env::vars_os()
        .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
        .collect();
    filter_env(&current, extra_blocked)
}
