//! Image processing in pure Rust, no system libraries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Decode** | `image` (PNG, JPEG, WebP; magic-byte sniffing for extensionless files) |
//! | **Encode** | `image` (PNG, JPEG at quality 100) |
//! | **Preview** | long-edge resize with Catmull-Rom resampling |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for dimension math (unit testable)
//! - **Parameters**: Transform settings fixed at startup
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: Variant transforms combining calculations + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{CodecError, Dimensions, ImageBackend, Raster};
pub use calculations::calculate_long_edge_dimensions;
pub use operations::{apply_variant, create_preview};
pub use params::{DEFAULT_PREVIEW_SIZE, MAX_PREVIEW_SIZE, TransformSettings};
pub use rust_backend::RustBackend;
