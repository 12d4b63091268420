//! File path sanitization.
//!
//! Normalization here is purely lexical: the path does not need to exist and
//! symlinks are not followed.

use std::path::{Component, Path, PathBuf};

use crate::error::SafeExecError;
use crate::Result;

/// Constrain a caller-supplied path, optionally to a base directory.
///
/// Without `base_dir`, a path that spells a `..` segment (before or after
/// normalization) fails with [`SafeExecError::DirectoryTraversal`]; otherwise
/// the normalized path is returned (`a/b.txt` comes back unchanged).
///
/// With `base_dir`, the path is resolved against the absolute form of the base
/// and must stay inside it, else [`SafeExecError::OutsideBaseDirectory`]. An
/// absolute path already inside the base is accepted and returned as is.
pub fn sanitize_file_path(file_path: impl AsRef<Path>, base_dir: Option<&Path>) -> Result<PathBuf> {
    let file_path = file_path.as_ref();
    let normalized = normalize(file_path);

    let Some(base_dir) = base_dir else {
        if has_parent_segment(file_path) || has_parent_segment(&normalized) {
            return Err(SafeExecError::DirectoryTraversal(file_path.to_path_buf()));
        }
        return Ok(normalized);
    };

    let absolute_base = absolutize(base_dir)?;
    let absolute_path = normalize(&absolute_base.join(&normalized));

    if !absolute_path.starts_with(&absolute_base) {
        return Err(SafeExecError::OutsideBaseDirectory(file_path.to_path_buf()));
    }
    if has_parent_segment(file_path) {
        return Err(SafeExecError::DirectoryTraversal(file_path.to_path_buf()));
    }

    Ok(absolute_path)
}

/// Lexically normalize a path: drop `.` segments and redundant separators and
/// fold `name/..` pairs. Leading `..` segments of a relative path are kept;
/// `..` directly under the root is dropped. An empty result becomes `.`.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out: Vec<Component<'_>> = Vec::new();

    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.last() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }

    if out.is_empty() {
        return PathBuf::from(".");
    }
    out.iter().collect()
}

fn has_parent_segment(path: &Path) -> bool {
    path.components().any(|c| matches!(c, Component::ParentDir))
}

fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(normalize(path))
    } else {
        Ok(normalize(&std::env::current_dir()?.join(path)))
    }
}
