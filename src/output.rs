//! CLI output formatting.
//!
//! # Output Format
//!
//! ## Resolve
//!
//! The header names how the request was answered and the file that answers
//! it, relative to the image root. Response metadata follows as indented
//! context lines:
//!
//! ```text
//! generated → avatars/u1.preview.png
//!     Status: 201 Created
//!     Content-Type: image/png
//!     Cache-Control: public, max-age=31536000
//! ```
//!
//! Failures print the status the transport layer would answer with:
//!
//! ```text
//! error 404 → Not found: avatars/ghost
//! ```
//!
//! ## Normalize
//!
//! ```text
//! Normalized ./data
//!     3 converted, 1 skipped (4 total)
//! ```
//!
//! # Architecture
//!
//! Each command has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::normalize::NormalizeStats;
use crate::resolver::{CACHE_CONTROL, Resolution, ResolveError, ResolvedImage};
use std::path::Path;

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn status_line(status: u16) -> String {
    let reason = match status {
        200 => "OK",
        201 => "Created",
        400 => "Bad Request",
        403 => "Forbidden",
        404 => "Not Found",
        _ => "Internal Server Error",
    };
    format!("{status} {reason}")
}

/// Path relative to `root` when possible, absolute otherwise.
fn display_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn resolution_kind(resolution: &Resolution) -> &'static str {
    match resolution {
        Resolution::Direct { .. } => "direct",
        Resolution::Generated { created: false, .. } => "cached",
        Resolution::Generated { created: true, .. } => "generated",
    }
}

// ============================================================================
// Resolve
// ============================================================================

pub fn format_resolution(resolved: &ResolvedImage, root: &Path) -> Vec<String> {
    vec![
        format!(
            "{} → {}",
            resolution_kind(&resolved.resolution),
            display_path(resolved.path(), root)
        ),
        format!("{}Status: {}", indent(1), status_line(resolved.status())),
        format!("{}Content-Type: {}", indent(1), resolved.content_type),
        format!("{}Cache-Control: {}", indent(1), CACHE_CONTROL),
    ]
}

pub fn print_resolution(resolved: &ResolvedImage, root: &Path) {
    for line in format_resolution(resolved, root) {
        println!("{}", line);
    }
}

pub fn format_resolve_error(err: &ResolveError) -> Vec<String> {
    vec![format!("error {} → {}", err.status(), err)]
}

/// Print a resolve failure to stderr.
pub fn print_resolve_error(err: &ResolveError) {
    for line in format_resolve_error(err) {
        eprintln!("{}", line);
    }
}

// ============================================================================
// Normalize
// ============================================================================

pub fn format_normalize_stats(stats: &NormalizeStats, root: &Path) -> Vec<String> {
    vec![
        format!("Normalized {}", root.display()),
        format!("{}{}", indent(1), stats),
    ]
}

pub fn print_normalize_stats(stats: &NormalizeStats, root: &Path) {
    for line in format_normalize_stats(stats, root) {
        println!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn generated(created: bool) -> ResolvedImage {
        ResolvedImage {
            resolution: Resolution::Generated {
                path: PathBuf::from("/data/avatars/u1.preview.png"),
                created,
            },
            content_type: "image/png",
        }
    }

    #[test]
    fn resolution_generated() {
        let lines = format_resolution(&generated(true), Path::new("/data"));
        assert_eq!(
            lines,
            vec![
                "generated → avatars/u1.preview.png",
                "    Status: 201 Created",
                "    Content-Type: image/png",
                "    Cache-Control: public, max-age=31536000",
            ]
        );
    }

    #[test]
    fn resolution_cached() {
        let lines = format_resolution(&generated(false), Path::new("/data"));
        assert_eq!(lines[0], "cached → avatars/u1.preview.png");
        assert_eq!(lines[1], "    Status: 200 OK");
    }

    #[test]
    fn resolution_direct_outside_root_shows_full_path() {
        let resolved = ResolvedImage {
            resolution: Resolution::Direct {
                path: PathBuf::from("/elsewhere/logo.svg"),
            },
            content_type: "image/svg+xml",
        };
        let lines = format_resolution(&resolved, Path::new("/data"));
        assert_eq!(lines[0], "direct → /elsewhere/logo.svg");
        assert_eq!(lines[2], "    Content-Type: image/svg+xml");
    }

    #[test]
    fn resolve_error_shows_status() {
        let err = ResolveError::NotFound("avatars/ghost".into());
        assert_eq!(
            format_resolve_error(&err),
            vec!["error 404 → Not found: avatars/ghost"]
        );
    }

    #[test]
    fn normalize_stats_lines() {
        let stats = NormalizeStats {
            converted: 3,
            skipped: 1,
            failed: 0,
        };
        assert_eq!(
            format_normalize_stats(&stats, Path::new("./data")),
            vec!["Normalized ./data", "    3 converted, 1 skipped (4 total)"]
        );
    }

    #[test]
    fn status_reasons() {
        assert_eq!(status_line(400), "400 Bad Request");
        assert_eq!(status_line(403), "403 Forbidden");
        assert_eq!(status_line(500), "500 Internal Server Error");
    }
}
