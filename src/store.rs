//! Derived artifact store.
//!
//! Generated variants live next to their source, named after it:
//!
//! ```text
//! avatars/u1                  source (extensionless upload)
//! avatars/u1.preview.png      preview of `avatars/u1`, PNG
//! avatars/u1.original.jpg     `avatars/u1` re-encoded as JPEG
//! avatars/u2.jpg              source (with extension)
//! avatars/u2.jpg.preview.png  preview of `avatars/u2.jpg`, PNG
//! ```
//!
//! The name is `<requested file name>.<variant token>.<format extension>`.
//! The requested name is kept whole, extension included, so `u2.png` and
//! `u2.jpg` never share an artifact. The scheme is stable across restarts:
//! an artifact on disk is reused forever and never refreshed when its source
//! changes.
//!
//! An artifact is itself a source candidate for the logical path it extends:
//! `u1.preview.png` is what a request for `u1.preview` locates. Such a request
//! only reads it. The artifacts it derives (`u1.preview.preview.png`, ...) have
//! names of their own, so no request ever writes over a file it could read as
//! a source.
//!
//! ## Writes
//!
//! [`persist`] writes into a hidden temp file in the target directory and
//! renames it over the final name, so a reader never sees a half-written
//! artifact. Concurrent writers of the same artifact each rename a complete
//! file; the last rename wins.

use crate::format::OutputFormat;
use crate::variant::Variant;
use std::ffi::OsString;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Path has no file name: {0}")]
    NoFileName(PathBuf),
}

/// Canonical artifact path for `(source, variant, format)`.
///
/// Pure and deterministic. Returns `None` only for paths without a file
/// name component.
pub fn derived_path(source: &Path, variant: Variant, format: OutputFormat) -> Option<PathBuf> {
    let mut file_name = OsString::from(source.file_name()?);
    file_name.push(".");
    file_name.push(variant.token());
    file_name.push(".");
    file_name.push(format.extension());
    Some(source.with_file_name(file_name))
}

/// True when `path` names a regular file.
pub fn exists(path: &Path) -> bool {
    std::fs::metadata(path).is_ok_and(|meta| meta.is_file())
}

/// Write `bytes` to `path`, creating parent directories and replacing any
/// existing file.
pub fn persist(path: &Path, bytes: &[u8]) -> Result<(), StoreError> {
    if path.file_name().is_none() {
        return Err(StoreError::NoFileName(path.to_path_buf()));
    }
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let mut tmp = tempfile::Builder::new()
        .prefix(".")
        .suffix(".tmp")
        .tempfile_in(parent)?;
    tmp.write_all(bytes)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| StoreError::Io(e.error))?;
    Ok(())
}

/// True when the file name has the shape of a derived artifact
/// (`<stem>.<token>.<png|jpg>`).
pub fn is_derived_name(path: &Path) -> bool {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return false;
    };
    if !matches!(OutputFormat::parse(ext), Some(f) if f.is_convertible()) {
        return false;
    }
    let Some(stem) = path.file_stem().map(Path::new) else {
        return false;
    };
    stem.extension()
        .and_then(|t| t.to_str())
        .is_some_and(|token| Variant::all_tokens().contains(&token))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::candidates;
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // derived_path
    // =========================================================================

    #[test]
    fn extensionless_source() {
        assert_eq!(
            derived_path(
                Path::new("/data/avatars/u1"),
                Variant::Preview,
                OutputFormat::Png
            ),
            Some(PathBuf::from("/data/avatars/u1.preview.png"))
        );
    }

    #[test]
    fn known_extension_is_kept_in_stem() {
        assert_eq!(
            derived_path(
                Path::new("/data/avatars/u1.jpg"),
                Variant::Preview,
                OutputFormat::Png
            ),
            Some(PathBuf::from("/data/avatars/u1.jpg.preview.png"))
        );
    }

    #[test]
    fn sources_sharing_a_stem_get_distinct_artifacts() {
        let sources = ["/data/u1", "/data/u1.png", "/data/u1.jpg", "/data/u1.webp"];
        let mut seen = Vec::new();
        for source in sources {
            for variant in [Variant::Identity, Variant::Preview] {
                for format in [OutputFormat::Png, OutputFormat::Jpeg] {
                    let derived = derived_path(Path::new(source), variant, format).unwrap();
                    assert!(!seen.contains(&derived), "{}", derived.display());
                    seen.push(derived);
                }
            }
        }
    }

    #[test]
    fn unknown_extension_is_kept_in_stem() {
        assert_eq!(
            derived_path(
                Path::new("/data/john.smith"),
                Variant::Preview,
                OutputFormat::Jpeg
            ),
            Some(PathBuf::from("/data/john.smith.preview.jpg"))
        );
    }

    #[test]
    fn identity_uses_original_token() {
        assert_eq!(
            derived_path(
                Path::new("/data/u1.png"),
                Variant::Identity,
                OutputFormat::Jpeg
            ),
            Some(PathBuf::from("/data/u1.png.original.jpg"))
        );
    }

    #[test]
    fn distinct_variant_and_format_never_collide() {
        let source = Path::new("/data/u1");
        let paths = [
            derived_path(source, Variant::Preview, OutputFormat::Png),
            derived_path(source, Variant::Preview, OutputFormat::Jpeg),
            derived_path(source, Variant::Identity, OutputFormat::Png),
            derived_path(source, Variant::Identity, OutputFormat::Jpeg),
        ];
        for (i, a) in paths.iter().enumerate() {
            for b in &paths[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn derived_path_never_matches_a_source_candidate() {
        for base in ["/data/u1", "/data/u1.jpg", "/data/u1.preview"] {
            let source = Path::new(base);
            let sources: Vec<PathBuf> = candidates(source).into_iter().map(|(p, _)| p).collect();
            for variant in [Variant::Identity, Variant::Preview] {
                for format in [OutputFormat::Png, OutputFormat::Jpeg] {
                    let derived = derived_path(source, variant, format).unwrap();
                    assert!(!sources.contains(&derived), "{}", derived.display());
                }
            }
        }
    }

    #[test]
    fn artifact_is_a_source_candidate_only_for_the_path_it_extends() {
        let artifact =
            derived_path(Path::new("/data/u1"), Variant::Preview, OutputFormat::Png).unwrap();
        let extended: Vec<PathBuf> = candidates(Path::new("/data/u1.preview"))
            .into_iter()
            .map(|(p, _)| p)
            .collect();
        assert!(extended.contains(&artifact));

        let from_extended = derived_path(
            Path::new("/data/u1.preview"),
            Variant::Preview,
            OutputFormat::Png,
        )
        .unwrap();
        assert_eq!(from_extended, PathBuf::from("/data/u1.preview.preview.png"));
        assert_ne!(from_extended, artifact);
    }

    #[test]
    fn derived_path_is_deterministic() {
        let a = derived_path(Path::new("/d/x.webp"), Variant::Preview, OutputFormat::Png);
        let b = derived_path(Path::new("/d/x.webp"), Variant::Preview, OutputFormat::Png);
        assert_eq!(a, b);
    }

    #[test]
    fn root_has_no_derived_path() {
        assert_eq!(
            derived_path(Path::new("/"), Variant::Preview, OutputFormat::Png),
            None
        );
    }

    // =========================================================================
    // exists / persist
    // =========================================================================

    #[test]
    fn persist_creates_parent_directories() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("a/b/c.preview.png");

        persist(&path, b"bytes").unwrap();

        assert!(exists(&path));
        assert_eq!(fs::read(&path).unwrap(), b"bytes");
    }

    #[test]
    fn persist_overwrites_existing_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("x.preview.png");

        persist(&path, b"first").unwrap();
        persist(&path, b"second").unwrap();

        assert_eq!(fs::read(&path).unwrap(), b"second");
    }

    #[test]
    fn persist_leaves_no_temp_files() {
        let tmp = TempDir::new().unwrap();
        persist(&tmp.path().join("x.preview.png"), b"data").unwrap();

        let names: Vec<String> = fs::read_dir(tmp.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["x.preview.png"]);
    }

    #[test]
    fn exists_is_false_for_directories_and_missing() {
        let tmp = TempDir::new().unwrap();
        assert!(!exists(tmp.path()));
        assert!(!exists(&tmp.path().join("missing.png")));
    }

    // =========================================================================
    // is_derived_name
    // =========================================================================

    #[test]
    fn recognizes_derived_names() {
        assert!(is_derived_name(Path::new("a/u1.preview.png")));
        assert!(is_derived_name(Path::new("a/u1.original.jpg")));
        assert!(is_derived_name(Path::new("a/u1.jpg.preview.png")));
    }

    #[test]
    fn sources_are_not_derived_names() {
        assert!(!is_derived_name(Path::new("a/u1.png")));
        assert!(!is_derived_name(Path::new("a/u1")));
        assert!(!is_derived_name(Path::new("a/u1.preview.webp")));
        assert!(!is_derived_name(Path::new("a/u1.thumb.png")));
    }
}
