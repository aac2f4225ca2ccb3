//! Request path resolution.
//!
//! Maps a logical, slash-separated request path onto an absolute path inside
//! the image root. The whole decision is lexical: no filesystem access and no
//! symlink resolution, so every rule here is unit-testable without a disk.
//!
//! ## Rules
//!
//! 1. NUL bytes are rejected.
//! 2. `/` and `\` both separate segments; leading, trailing and repeated
//!    separators are dropped.
//! 3. `.` segments are dropped, `..` pops the previous segment.
//! 4. A `..` that survives normalization (it would climb above the root) or a
//!    drive/volume marker (`C:`) makes the path [`PathError::InvalidPath`].
//! 5. The result is joined onto the absolute root and must be the root itself
//!    or a descendant of it, else [`PathError::AccessDenied`].

use std::path::{Component, Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Access denied: {0}")]
    AccessDenied(String),
}

/// A request path that has been normalized and confined to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SafePath {
    relative: PathBuf,
    absolute: PathBuf,
}

impl SafePath {
    /// Normalized path relative to the root (empty for the root itself).
    pub fn relative(&self) -> &Path {
        &self.relative
    }

    /// Absolute filesystem path, always inside the root.
    pub fn absolute(&self) -> &Path {
        &self.absolute
    }

    pub fn is_root(&self) -> bool {
        self.relative.as_os_str().is_empty()
    }

    /// True when any root-relative component is a dotfile.
    pub fn is_hidden(&self) -> bool {
        contains_hidden_component(&self.relative)
    }
}

/// Resolve `request` against `root`.
///
/// ```
/// # use imgvar::paths::{resolve_request_path, PathError};
/// # use std::path::Path;
/// let safe = resolve_request_path(Path::new("/data"), "/avatars/./u1").unwrap();
/// assert_eq!(safe.absolute(), Path::new("/data/avatars/u1"));
///
/// let err = resolve_request_path(Path::new("/data"), "../../etc/passwd").unwrap_err();
/// assert!(matches!(err, PathError::InvalidPath(_)));
/// ```
pub fn resolve_request_path(root: &Path, request: &str) -> Result<SafePath, PathError> {
    let segments = normalize_request(request)?;
    let relative: PathBuf = segments.iter().collect();

    // A segment like `C:` parses as a prefix on Windows; anything that is not
    // a plain name at this point must not reach the join.
    if relative
        .components()
        .any(|c| !matches!(c, Component::Normal(_)))
    {
        return Err(PathError::InvalidPath(request.to_string()));
    }

    let root = absolute_root(root);
    let absolute = lexical_normalize(&root.join(&relative));
    ensure_within(&root, &absolute)?;

    Ok(SafePath { relative, absolute })
}

/// Split a request into clean segments, collapsing `.` and `..`.
pub fn normalize_request(request: &str) -> Result<Vec<&str>, PathError> {
    if request.contains('\0') {
        return Err(PathError::InvalidPath("path contains NUL byte".into()));
    }

    let mut segments: Vec<&str> = Vec::new();
    for segment in request.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => match segments.last() {
                Some(last) if *last != ".." => {
                    segments.pop();
                }
                _ => segments.push(".."),
            },
            other => segments.push(other),
        }
    }

    if segments.contains(&"..") {
        return Err(PathError::InvalidPath(format!(
            "{request}: path escapes the root"
        )));
    }
    if segments.iter().any(|s| has_drive_marker(s)) {
        return Err(PathError::InvalidPath(format!(
            "{request}: drive or volume marker"
        )));
    }

    Ok(segments)
}

/// Fail with [`PathError::AccessDenied`] unless `candidate` is `root` or
/// lies below it (both compared after lexical normalization).
pub fn ensure_within(root: &Path, candidate: &Path) -> Result<(), PathError> {
    let root = lexical_normalize(root);
    let candidate = lexical_normalize(candidate);
    if candidate.starts_with(&root) {
        Ok(())
    } else {
        Err(PathError::AccessDenied(candidate.display().to_string()))
    }
}

/// Absolute, lexically normalized form of the configured root.
pub fn absolute_root(root: &Path) -> PathBuf {
    match std::path::absolute(root) {
        Ok(abs) => lexical_normalize(&abs),
        Err(_) => lexical_normalize(root),
    }
}

/// True when any normal component of `path` starts with `.`.
pub fn contains_hidden_component(path: &Path) -> bool {
    path.components().any(|c| match c {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

fn has_drive_marker(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':'
}

/// Resolve `.` and `..` without touching the filesystem. `..` never pops
/// past the root component.
fn lexical_normalize(path: &Path) -> PathBuf {
    let mut components = Vec::new();
    for component in path.components() {
        match component {
            Component::ParentDir => {
                if let Some(last) = components.last()
                    && matches!(last, Component::Normal(_))
                {
                    components.pop();
                }
            }
            Component::CurDir => {}
            c => components.push(c),
        }
    }
    components.iter().collect()
}
