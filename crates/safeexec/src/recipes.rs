//! Ready-made invocations for common caller-supplied inputs.

use std::ffi::OsStr;
use std::path::Path;

use crate::error::SafeExecError;
use crate::execute::safe_execute;
use crate::options::SafeCommandOptions;
use crate::path::sanitize_file_path;
use crate::result::CommandResult;
use crate::validate::is_valid_package_name;
use crate::Result;

/// `npm install <package>`, after checking the package name.
pub async fn safe_npm_install(
    package_name: &str,
    options: &SafeCommandOptions,
) -> Result<CommandResult> {
    if !is_valid_package_name(package_name) {
        return Err(SafeExecError::InvalidPackageName(package_name.to_string()));
    }

    // `--` keeps a name like `--global` from being read as an npm option.
    safe_execute("npm", &npm_install_args(package_name), options).await
}

/// `cat <path>`, after constraining the path (optionally to `base_dir`).
pub async fn safe_read_file(
    filename: &str,
    base_dir: Option<&Path>,
    options: &SafeCommandOptions,
) -> Result<CommandResult> {
    let safe_path = sanitize_file_path(filename, base_dir)?;
    safe_execute("cat", &[OsStr::new("--"), safe_path.as_os_str()], options).await
}

fn npm_install_args(package_name: &str) -> [&str; 3] {
    ["install", "--", package_name]
}
