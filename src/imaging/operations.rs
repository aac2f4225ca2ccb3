//! High-level image operations.
//!
//! These functions combine calculations with backend execution.

use super::backend::{ImageBackend, Raster};
use super::calculations::calculate_long_edge_dimensions;
use super::params::TransformSettings;
use crate::variant::Variant;

/// Apply `variant` to `raster`.
///
/// [`Variant::Identity`] hands the raster back untouched.
pub fn apply_variant(
    backend: &impl ImageBackend,
    raster: Raster,
    variant: Variant,
    settings: &TransformSettings,
) -> Raster {
    match variant {
        Variant::Preview => create_preview(backend, &raster, settings.preview_size),
        Variant::Identity => raster,
    }
}

/// Resize so the longer edge is `long_edge`, keeping the aspect ratio.
pub fn create_preview(backend: &impl ImageBackend, raster: &Raster, long_edge: u32) -> Raster {
    let dims = raster.dimensions();
    let (width, height) = calculate_long_edge_dimensions((dims.width, dims.height), long_edge);
    backend.resize(raster, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{Dimensions, RustBackend};
    use crate::test_helpers::png_bytes;

    fn decoded(backend: &MockBackend) -> Raster {
        backend.decode(b"x", None).unwrap()
    }

    #[test]
    fn preview_landscape_uses_configured_size() {
        let backend = MockBackend::with_dimensions(400, 200);
        let raster = decoded(&backend);

        let out = apply_variant(
            &backend,
            raster,
            Variant::Preview,
            &TransformSettings::new(256),
        );

        assert_eq!(
            out.dimensions(),
            Dimensions {
                width: 256,
                height: 128
            }
        );
        assert!(backend.get_operations().contains(&RecordedOp::Resize {
            width: 256,
            height: 128
        }));
    }

    #[test]
    fn preview_portrait_uses_height() {
        let backend = MockBackend::with_dimensions(300, 900);
        let raster = decoded(&backend);

        let out = apply_variant(
            &backend,
            raster,
            Variant::Preview,
            &TransformSettings::new(384),
        );

        assert_eq!(out.dimensions().width, 128);
        assert_eq!(out.dimensions().height, 384);
    }

    #[test]
    fn identity_does_not_resize() {
        let backend = MockBackend::with_dimensions(33, 44);
        let raster = decoded(&backend);

        let out = apply_variant(
            &backend,
            raster,
            Variant::Identity,
            &TransformSettings::default(),
        );

        assert_eq!(out.dimensions().width, 33);
        assert!(
            !backend
                .get_operations()
                .iter()
                .any(|op| matches!(op, RecordedOp::Resize { .. }))
        );
    }

    #[test]
    fn identity_keeps_pixels_with_real_backend() {
        let backend = RustBackend::new();
        let raster = backend.decode(&png_bytes(20, 10), Some("png")).unwrap();
        let before = raster.image().to_rgb8();

        let out = apply_variant(
            &backend,
            raster,
            Variant::Identity,
            &TransformSettings::default(),
        );

        assert_eq!(out.image().to_rgb8(), before);
    }
}
