//! Output formats and content types.
//!
//! | Format | Accepted names | Decode | Encode | Content type |
//! |---|---|---|---|---|
//! | PNG | `png` | yes | yes | `image/png` |
//! | JPEG | `jpg`, `jpeg` | yes | yes (quality 100) | `image/jpeg` |
//! | WebP | `webp` | yes | no | `image/webp` |
//! | GIF | `gif` | — | — | `image/gif` |
//! | SVG | `svg` | — | — | `image/svg+xml` |
//!
//! Only PNG and JPEG are *convertible*: a request for any other format is
//! served as a raw passthrough of the requested file, and only when that file
//! is already stored in the requested format.

use std::fmt;
use std::path::Path;

/// Extensions the system recognizes as raster sources, in lowercase.
pub const SOURCE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp"];

/// A format a caller may ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
    Svg,
}

impl OutputFormat {
    /// Parse a format name (case-insensitive). `jpg` and `jpeg` are the same.
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "webp" => Some(Self::WebP),
            "gif" => Some(Self::Gif),
            "svg" => Some(Self::Svg),
            _ => None,
        }
    }

    /// Format implied by a file extension, if any.
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::parse)
    }

    /// Canonical file extension used when naming derived artifacts.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpg",
            Self::WebP => "webp",
            Self::Gif => "gif",
            Self::Svg => "svg",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::WebP => "image/webp",
            Self::Gif => "image/gif",
            Self::Svg => "image/svg+xml",
        }
    }

    /// Whether the pipeline can re-encode into this format.
    pub fn is_convertible(self) -> bool {
        matches!(self, Self::Png | Self::Jpeg)
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Known raster source extension of `path`, lowercased.
pub fn source_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    SOURCE_EXTENSIONS.iter().copied().find(|known| *known == ext)
}
