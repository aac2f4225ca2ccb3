//! Image codec backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the three operations the variant
//! pipeline needs: decode, encode, and resize. Decoding and encoding are
//! asymmetric: WebP sources can be read but never written.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust on top of
//! the `image` crate.

use crate::format::OutputFormat;
use image::DynamicImage;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Corrupt image data: {0}")]
    CorruptData(String),
    #[error("Encode failed: {0}")]
    EncodeFailure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// A decoded image, owned by the request that decoded it.
#[derive(Debug, Clone)]
pub struct Raster(DynamicImage);

impl Raster {
    pub fn new(image: DynamicImage) -> Self {
        Self(image)
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions {
            width: self.0.width(),
            height: self.0.height(),
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.0
    }

    pub fn into_image(self) -> DynamicImage {
        self.0
    }
}

/// Trait for image codec backends.
///
/// `Sync` so a single backend can be shared by every request thread and by
/// rayon workers during normalization.
pub trait ImageBackend: Sync {
    /// Decode `bytes`. `extension` is the source's file extension when it
    /// has one; without it the format is sniffed from the data.
    fn decode(&self, bytes: &[u8], extension: Option<&str>) -> Result<Raster, CodecError>;

    /// Encode into `format`. Only PNG and JPEG are writable.
    fn encode(&self, raster: &Raster, format: OutputFormat) -> Result<Vec<u8>, CodecError>;

    /// Resample to exactly `width`×`height` with a smooth filter.
    fn resize(&self, raster: &Raster, width: u32, height: u32) -> Raster;
}
