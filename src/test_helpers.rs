//! Shared test utilities for the imgvar test suite.
//!
//! Encodes small synthetic rasters so codec and pipeline tests work on real
//! image bytes without checked-in fixtures.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! write_jpeg(&tmp.path().join("avatars/u1.jpg"), 400, 200);
//! let bytes = png_bytes(16, 8);
//! ```

use image::{DynamicImage, ImageFormat, RgbImage};
use std::io::Cursor;
use std::path::Path;

// =========================================================================
// Synthetic rasters
// =========================================================================

/// A horizontal/vertical gradient; distinct enough to survive lossy codecs.
pub fn gradient(width: u32, height: u32) -> DynamicImage {
    let img = RgbImage::from_fn(width, height, |x, y| {
        let r = (x * 255 / width.max(1)) as u8;
        let g = (y * 255 / height.max(1)) as u8;
        image::Rgb([r, g, 128])
    });
    DynamicImage::ImageRgb8(img)
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let mut buf = Cursor::new(Vec::new());
    gradient(width, height).write_to(&mut buf, format).unwrap();
    buf.into_inner()
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Jpeg)
}

/// Lossless WebP.
pub fn webp_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::WebP)
}

// =========================================================================
// On-disk fixtures
// =========================================================================

fn write(path: &Path, bytes: &[u8]) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, bytes).unwrap();
}

/// Write a JPEG gradient to `path`, creating parent directories.
pub fn write_jpeg(path: &Path, width: u32, height: u32) {
    write(path, &jpeg_bytes(width, height));
}

/// Write a PNG gradient to `path`, creating parent directories.
pub fn write_png(path: &Path, width: u32, height: u32) {
    write(path, &png_bytes(width, height));
}

pub fn write_webp(path: &Path, width: u32, height: u32) {
    write(path, &webp_bytes(width, height));
}

/// Decode a file and return its dimensions. Panics on failure.
pub fn dimensions_of(path: &Path) -> (u32, u32) {
    let img = image::ImageReader::open(path)
        .and_then(|r| r.with_guessed_format())
        .map_err(image::ImageError::from)
        .and_then(|r| r.decode())
        .unwrap_or_else(|e| panic!("failed to open {}: {e}", path.display()));
    (img.width(), img.height())
}
