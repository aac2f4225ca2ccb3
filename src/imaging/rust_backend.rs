//! Pure Rust codec backend built on the `image` crate.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Decode (PNG, JPEG, WebP) | `image::load_from_memory_with_format` |
//! | Format sniffing (extensionless sources) | `image::guess_format` |
//! | Resize | `DynamicImage::resize_exact` with `CatmullRom` |
//! | Encode → PNG | `DynamicImage::write_to` |
//! | Encode → JPEG | `JpegEncoder::new_with_quality` at quality 100 |

use super::backend::{CodecError, ImageBackend, Raster};
use crate::format::OutputFormat;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ExtendedColorType, ImageEncoder, ImageFormat};
use std::io::Cursor;

/// Extensions with a compiled-in decoder.
const DECODABLE: &[(&str, ImageFormat)] = &[
    ("png", ImageFormat::Png),
    ("jpg", ImageFormat::Jpeg),
    ("jpeg", ImageFormat::Jpeg),
    ("webp", ImageFormat::WebP),
];

/// JPEG output always uses maximum quality.
pub const JPEG_QUALITY: u8 = 100;

/// Resampling filter for every resize. Never nearest-neighbor.
pub const RESIZE_FILTER: FilterType = FilterType::CatmullRom;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn format_for_extension(ext: &str) -> Result<ImageFormat, CodecError> {
    DECODABLE
        .iter()
        .find(|(known, _)| known.eq_ignore_ascii_case(ext))
        .map(|(_, format)| *format)
        .ok_or_else(|| CodecError::UnsupportedFormat(ext.to_string()))
}

/// Identify the format of extensionless data from its magic bytes.
fn sniff_format(bytes: &[u8]) -> Result<ImageFormat, CodecError> {
    let format = image::guess_format(bytes)
        .map_err(|_| CodecError::CorruptData("unrecognized image data".into()))?;
    if DECODABLE.iter().any(|(_, known)| *known == format) {
        Ok(format)
    } else {
        Err(CodecError::UnsupportedFormat(format!("{format:?}")))
    }
}

fn encode_png(raster: &Raster) -> Result<Vec<u8>, CodecError> {
    let mut buf = Cursor::new(Vec::new());
    raster
        .image()
        .write_to(&mut buf, ImageFormat::Png)
        .map_err(|e| CodecError::EncodeFailure(format!("PNG encode failed: {e}")))?;
    Ok(buf.into_inner())
}

/// JPEG has no alpha channel; the raster is flattened to RGB8 first.
fn encode_jpeg(raster: &Raster) -> Result<Vec<u8>, CodecError> {
    let rgb = raster.image().to_rgb8();
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, JPEG_QUALITY)
        .write_image(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
        .map_err(|e| CodecError::EncodeFailure(format!("JPEG encode failed: {e}")))?;
    Ok(out)
}

impl ImageBackend for RustBackend {
    fn decode(&self, bytes: &[u8], extension: Option<&str>) -> Result<Raster, CodecError> {
        let format = match extension {
            Some(ext) => format_for_extension(ext)?,
            None => sniff_format(bytes)?,
        };
        image::load_from_memory_with_format(bytes, format)
            .map(Raster::new)
            .map_err(|e| CodecError::CorruptData(format!("{format:?}: {e}")))
    }

    fn encode(&self, raster: &Raster, format: OutputFormat) -> Result<Vec<u8>, CodecError> {
        match format {
            OutputFormat::Png => encode_png(raster),
            OutputFormat::Jpeg => encode_jpeg(raster),
            other => Err(CodecError::UnsupportedFormat(format!(
                "cannot encode {other}"
            ))),
        }
    }

    fn resize(&self, raster: &Raster, width: u32, height: u32) -> Raster {
        Raster::new(raster.image().resize_exact(width, height, RESIZE_FILTER))
    }
}
