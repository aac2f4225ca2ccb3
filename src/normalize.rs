//! Bulk source normalization.
//!
//! Uploads are stored as extensionless PNG files (`avatars/u1`). Content
//! copied in by hand usually keeps its extension (`avatars/u1.jpg`). This
//! pass walks the root and writes the canonical extensionless PNG next to
//! every raster source that lacks one:
//!
//! ```text
//! avatars/u1.jpg   ──►  avatars/u1        (PNG)
//! logos/acme.webp  ──►  logos/acme        (PNG)
//! avatars/u1.preview.png                  (derived artifact, ignored)
//! .trash/old.png                          (hidden, ignored)
//! ```
//!
//! When several sources map onto the same target (`u1.png` and `u1.jpg`)
//! the one the resolver would pick wins, following the source search order.
//! Existing targets are never overwritten.
//!
//! Conversions run in parallel on the global rayon pool. A file that fails
//! to convert is logged and counted; it never aborts the walk.

use crate::format::{OutputFormat, source_extension};
use crate::imaging::{CodecError, ImageBackend};
use crate::source::SOURCE_EXTENSION_ORDER;
use crate::store::{self, StoreError};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

#[derive(Error, Debug)]
pub enum NormalizeError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Image root is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("Image processing failed: {0}")]
    Codec(#[from] CodecError),
    #[error("Store failed: {0}")]
    Store(#[from] StoreError),
}

/// One pending conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeJob {
    pub source: PathBuf,
    pub extension: &'static str,
    pub target: PathBuf,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub converted: u32,
    pub skipped: u32,
    pub failed: u32,
}

impl NormalizeStats {
    pub fn total(&self) -> u32 {
        self.converted + self.skipped + self.failed
    }
}

impl fmt::Display for NormalizeStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.failed > 0 {
            write!(
                f,
                "{} converted, {} skipped, {} failed ({} total)",
                self.converted,
                self.skipped,
                self.failed,
                self.total()
            )
        } else if self.skipped > 0 {
            write!(
                f,
                "{} converted, {} skipped ({} total)",
                self.converted,
                self.skipped,
                self.total()
            )
        } else {
            write!(f, "{} converted", self.converted)
        }
    }
}

/// Walk `root` and collect the conversions to run.
///
/// Returns the jobs, sorted by source path, and the number of sources
/// skipped because their target already exists or another source claims it.
pub fn plan(root: &Path) -> Result<(Vec<NormalizeJob>, u32), NormalizeError> {
    if !std::fs::metadata(root)?.is_dir() {
        return Err(NormalizeError::NotADirectory(root.to_path_buf()));
    }

    let mut claimed: BTreeMap<PathBuf, NormalizeJob> = BTreeMap::new();
    let mut skipped = 0;

    let walker = WalkDir::new(root)
        .min_depth(1)
        .into_iter()
        .filter_entry(|e| !is_hidden(e));
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let Some(extension) = source_extension(path) else {
            continue;
        };
        if store::is_derived_name(path) {
            continue;
        }

        let target = path.with_extension("");
        if store::exists(&target) {
            debug!(path = %path.display(), "canonical source already present");
            skipped += 1;
            continue;
        }

        let job = NormalizeJob {
            source: path.to_path_buf(),
            extension,
            target: target.clone(),
        };
        match claimed.get(&target) {
            Some(existing) if rank(existing.extension) <= rank(extension) => skipped += 1,
            Some(_) => {
                skipped += 1;
                claimed.insert(target, job);
            }
            None => {
                claimed.insert(target, job);
            }
        }
    }

    let mut jobs: Vec<NormalizeJob> = claimed.into_values().collect();
    jobs.sort_by(|a, b| a.source.cmp(&b.source));
    Ok((jobs, skipped))
}

/// Convert every raster source under `root` to its canonical PNG.
pub fn normalize_root(
    backend: &impl ImageBackend,
    root: &Path,
) -> Result<NormalizeStats, NormalizeError> {
    let (jobs, skipped) = plan(root)?;

    let results: Vec<bool> = jobs
        .par_iter()
        .map(|job| match convert(backend, job) {
            Ok(()) => {
                debug!(source = %job.source.display(), target = %job.target.display(), "normalized");
                true
            }
            Err(e) => {
                warn!(source = %job.source.display(), error = %e, "normalization failed");
                false
            }
        })
        .collect();

    let converted = results.iter().filter(|ok| **ok).count() as u32;
    let stats = NormalizeStats {
        converted,
        skipped,
        failed: results.len() as u32 - converted,
    };
    info!(root = %root.display(), %stats, "normalization finished");
    Ok(stats)
}

fn convert(backend: &impl ImageBackend, job: &NormalizeJob) -> Result<(), NormalizeError> {
    let bytes = std::fs::read(&job.source)?;
    let raster = backend.decode(&bytes, Some(job.extension))?;
    let encoded = backend.encode(&raster, OutputFormat::Png)?;
    store::persist(&job.target, &encoded)?;
    Ok(())
}

/// Hidden below the root. The root itself may be a dot-directory.
fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

/// Position in the source search order; lower wins.
fn rank(extension: &str) -> usize {
    SOURCE_EXTENSION_ORDER
        .iter()
        .position(|e| *e == Some(extension))
        .unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::RustBackend;
    use crate::imaging::backend::tests::MockBackend;
    use crate::test_helpers::{dimensions_of, write_jpeg, write_png, write_webp};
    use std::fs;
    use tempfile::TempDir;

    // =========================================================================
    // plan
    // =========================================================================

    #[test]
    fn plan_finds_rasters_and_ignores_the_rest() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("a")).unwrap();
        fs::write(root.join("a/u1.jpg"), b"x").unwrap();
        fs::write(root.join("a/logo.svg"), b"x").unwrap();
        fs::write(root.join("a/u1.preview.png"), b"x").unwrap();
        fs::write(root.join("notes.txt"), b"x").unwrap();

        let (jobs, skipped) = plan(root).unwrap();

        assert_eq!(skipped, 0);
        assert_eq!(
            jobs,
            vec![NormalizeJob {
                source: root.join("a/u1.jpg"),
                extension: "jpg",
                target: root.join("a/u1"),
            }]
        );
    }

    #[test]
    fn plan_skips_hidden_files_and_directories() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join(".trash")).unwrap();
        fs::write(root.join(".trash/old.png"), b"x").unwrap();
        fs::write(root.join(".draft.jpg"), b"x").unwrap();

        let (jobs, _) = plan(root).unwrap();
        assert!(jobs.is_empty());
    }

    #[test]
    fn plan_skips_existing_targets() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("u1"), b"png").unwrap();
        fs::write(tmp.path().join("u1.jpg"), b"jpg").unwrap();

        let (jobs, skipped) = plan(tmp.path()).unwrap();
        assert!(jobs.is_empty());
        assert_eq!(skipped, 1);
    }

    #[test]
    fn plan_prefers_earlier_extension_on_conflict() {
        let tmp = TempDir::new().unwrap();
        for name in ["u1.jpeg", "u1.webp", "u1.png"] {
            fs::write(tmp.path().join(name), b"x").unwrap();
        }

        let (jobs, skipped) = plan(tmp.path()).unwrap();
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].extension, "png");
        assert_eq!(skipped, 2);
    }

    #[test]
    fn plan_rejects_file_as_root() {
        let tmp = TempDir::new().unwrap();
        let file = tmp.path().join("f");
        fs::write(&file, b"x").unwrap();
        assert!(matches!(
            plan(&file),
            Err(NormalizeError::NotADirectory(_))
        ));
    }

    #[test]
    fn plan_missing_root_is_io_error() {
        let tmp = TempDir::new().unwrap();
        assert!(matches!(
            plan(&tmp.path().join("missing")),
            Err(NormalizeError::Io(_))
        ));
    }

    // =========================================================================
    // normalize_root
    // =========================================================================

    #[test]
    fn converts_all_formats_to_png() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        write_jpeg(&root.join("a/u1.jpg"), 40, 20);
        write_webp(&root.join("b/logo.webp"), 8, 8);
        write_png(&root.join("c.png"), 3, 9);

        let stats = normalize_root(&RustBackend::new(), root).unwrap();

        assert_eq!(
            stats,
            NormalizeStats {
                converted: 3,
                skipped: 0,
                failed: 0
            }
        );
        let bytes = fs::read(root.join("a/u1")).unwrap();
        assert_eq!(image::guess_format(&bytes).unwrap(), image::ImageFormat::Png);
        assert_eq!(dimensions_of(&root.join("c")), (3, 9));
        assert!(root.join("b/logo").is_file());
    }

    #[test]
    fn failures_are_counted_not_fatal() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("broken.jpg"), b"not a jpeg").unwrap();
        write_png(&tmp.path().join("ok.png"), 2, 2);

        let stats = normalize_root(&RustBackend::new(), tmp.path()).unwrap();

        assert_eq!(stats.converted, 1);
        assert_eq!(stats.failed, 1);
        assert!(!tmp.path().join("broken").exists());
    }

    #[test]
    fn decodes_with_source_extension_hint() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("u1.JPG"), b"x").unwrap();
        let backend = MockBackend::new();

        normalize_root(&backend, tmp.path()).unwrap();

        assert!(backend.get_operations().contains(
            &crate::imaging::backend::tests::RecordedOp::Decode {
                bytes: 1,
                extension: Some("jpg".into())
            }
        ));
        assert_eq!(fs::read(tmp.path().join("u1")).unwrap(), b"mock-png-4x2");
    }

    #[test]
    fn second_run_skips_everything() {
        let tmp = TempDir::new().unwrap();
        write_jpeg(&tmp.path().join("u1.jpg"), 10, 10);
        let backend = RustBackend::new();

        normalize_root(&backend, tmp.path()).unwrap();
        let stats = normalize_root(&backend, tmp.path()).unwrap();

        assert_eq!(stats.converted, 0);
        assert_eq!(stats.skipped, 1);
    }

    // =========================================================================
    // NormalizeStats
    // =========================================================================

    #[test]
    fn stats_display() {
        let only = NormalizeStats {
            converted: 4,
            ..Default::default()
        };
        assert_eq!(only.to_string(), "4 converted");

        let skipped = NormalizeStats {
            converted: 1,
            skipped: 2,
            failed: 0,
        };
        assert_eq!(skipped.to_string(), "1 converted, 2 skipped (3 total)");

        let failed = NormalizeStats {
            converted: 1,
            skipped: 0,
            failed: 1,
        };
        assert_eq!(
            failed.to_string(),
            "1 converted, 0 skipped, 1 failed (2 total)"
        );
    }
}
