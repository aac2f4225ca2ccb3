//! Source file lookup.
//!
//! Uploaded images are usually stored without an extension (`avatars/u1`),
//! but older content and hand-copied files carry one. A logical image path is
//! therefore matched against a fixed list of candidates, first hit wins:
//!
//! ```text
//! avatars/u1
//! avatars/u1.png
//! avatars/u1.jpg
//! avatars/u1.webp
//! avatars/u1.jpeg
//! ```
//!
//! The order is part of the on-disk contract and must not change: when two
//! candidates exist, the earlier one is the source.
//!
//! Existence is checked through the [`FileProbe`] trait so the search order
//! can be tested without a filesystem.

use crate::format::source_extension;
use crate::paths::SafePath;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};

/// Candidate suffixes, tried in order. `None` is the path exactly as given.
pub const SOURCE_EXTENSION_ORDER: &[Option<&str>] =
    &[None, Some("png"), Some("jpg"), Some("webp"), Some("jpeg")];

/// Answers "is there a regular file at this path?".
///
/// Absence is `Ok(false)`; only genuine I/O failures are errors.
pub trait FileProbe {
    fn is_file(&self, path: &Path) -> io::Result<bool>;
}

/// [`FileProbe`] backed by `std::fs::metadata`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsProbe;

impl FileProbe for FsProbe {
    fn is_file(&self, path: &Path) -> io::Result<bool> {
        match std::fs::metadata(path) {
            Ok(meta) => Ok(meta.is_file()),
            Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }
}

/// The file that backs a logical image path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocatedSource {
    pub path: PathBuf,
    /// Raster extension of the located file; `None` for extensionless
    /// sources, whose format is sniffed at decode time.
    pub extension: Option<&'static str>,
}

/// All candidate paths for `base`, in search order.
pub fn candidates(base: &Path) -> Vec<(PathBuf, Option<&'static str>)> {
    SOURCE_EXTENSION_ORDER
        .iter()
        .map(|suffix| match suffix {
            None => (base.to_path_buf(), source_extension(base)),
            Some(ext) => {
                let mut name = OsString::from(base.as_os_str());
                name.push(".");
                name.push(ext);
                (PathBuf::from(name), Some(*ext))
            }
        })
        .collect()
}

/// Find the source for `safe`. Hidden paths are never found.
pub fn locate(probe: &impl FileProbe, safe: &SafePath) -> io::Result<Option<LocatedSource>> {
    if safe.is_root() || safe.is_hidden() {
        return Ok(None);
    }
    for (path, extension) in candidates(safe.absolute()) {
        if probe.is_file(&path)? {
            return Ok(Some(LocatedSource { path, extension }));
        }
    }
    Ok(None)
}
