//! Shared helpers for the integration test binaries in `tests/`.

use std::path::PathBuf;

/// Locate the compiled `safeexec` binary in the workspace target directory.
///
/// `CARGO_MANIFEST_DIR` points at `tests/integration`; the binary lives under
/// `target/debug/` at the workspace root.
pub fn safeexec_bin() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let workspace_root = manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .map(PathBuf::from)
        .unwrap_or(manifest_dir);
    let name = if cfg!(windows) { "safeexec.exe" } else { "safeexec" };
    workspace_root.join("target").join("debug").join(name)
}
