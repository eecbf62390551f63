//! Shared path-safety validator used by every adapter's
//! `Detect`/`Apply`.
//!
//! Cleaning a path here means lexical normalization, not `canonicalize`
//! — we never touch the filesystem or resolve symlinks, we just reject
//! any `..` that survives a textbook `.`/`..` collapse.

use crate::error::Error;
use std::path::{Component, Path, PathBuf};

/// Joins `candidate` onto `repo_root` (if relative), lexically cleans the
/// result, and rejects it if any `..` component survives.
pub fn sanitize(repo_root: &Path, candidate: &Path) -> Result<PathBuf, Error> {
    let joined = if candidate.is_absolute() {
        candidate.to_path_buf()
    } else {
        repo_root.join(candidate)
    };

    let cleaned = clean(&joined);

    if cleaned
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(Error::PathEscape(candidate.to_path_buf()));
    }

    Ok(cleaned)
}

/// Lexically collapses `.` and `..` components without touching the
/// filesystem (equivalent to Go's `path/filepath.Clean`, adapted for
/// `Path`).
fn clean(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                match out.components().next_back() {
                    Some(Component::Normal(_)) => {
                        out.pop();
                    }
                    _ => out.push(".."),
                }
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Writes `contents` to `path` atomically (temp file in the same
/// directory, then rename) with Unix mode `0o600`
pub fn write_atomic(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"))?;
    let tmp_path = dir.join(format!(".{}.uptool-tmp", file_name.to_string_lossy()));

    std::fs::write(&tmp_path, contents)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(&tmp_path, std::fs::Permissions::from_mode(0o600))?;
    }

    std::fs::rename(&tmp_path, path)
}
