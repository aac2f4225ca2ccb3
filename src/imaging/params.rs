//! Parameter types for variant transforms.
//!
//! These describe *what* a transform should produce, independent of the
//! backend that does the pixel work.

/// Default long-edge size of the `preview` variant, in pixels.
pub const DEFAULT_PREVIEW_SIZE: u32 = 256;

/// Upper bound accepted for the preview size.
pub const MAX_PREVIEW_SIZE: u32 = 8192;

/// Tunables for the variant transforms, fixed at resolver construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransformSettings {
    /// Longer edge of `preview` output.
    pub preview_size: u32,
}

impl TransformSettings {
    pub fn new(preview_size: u32) -> Self {
        Self {
            preview_size: preview_size.clamp(1, MAX_PREVIEW_SIZE),
        }
    }
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            preview_size: DEFAULT_PREVIEW_SIZE,
        }
    }
}
