//! Variant resolution, the entry point of the library.
//!
//! Given a request path, an optional variant name and an optional output
//! format, [`VariantResolver::resolve`] decides which file answers the
//! request and produces it if needed:
//!
//! ```text
//! Validating ──► FormatDeciding ──┬──► Direct      (file exists as requested)
//!                                 ├──► Cached      (derived artifact on disk)
//!                                 └──► Generating  (decode → transform → encode → persist)
//! ```
//!
//! 1. The request path is confined to the root ([`crate::paths`]); its
//!    errors are returned as-is. Hidden paths and the root itself are
//!    `NotFound`.
//! 2. The format is the caller's (validated), else the request's extension,
//!    else PNG.
//! 3. Formats the pipeline cannot write (WebP, GIF, SVG) are a raw
//!    passthrough of the exact file, whatever the variant, provided the file
//!    is stored in that format. Asking for one of them from a file in any
//!    other format is `UnsupportedFormat`.
//! 4. An identity request whose exact file exists in the requested format is
//!    served directly, without decoding.
//! 5. An existing derived artifact is served as-is (never refreshed).
//! 6. Otherwise the source is located, decoded, transformed, encoded and
//!    persisted; the result is reported as freshly created.
//!
//! Every step is synchronous and may block on disk or CPU. The resolver
//! holds no mutable state, so one instance can serve concurrent requests.

use crate::format::OutputFormat;
use crate::imaging::{CodecError, ImageBackend, RustBackend, TransformSettings, apply_variant};
use crate::paths::{PathError, absolute_root, resolve_request_path};
use crate::source::{FileProbe, FsProbe, locate};
use crate::store::{self, StoreError};
use crate::variant::Variant;
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Cache directive callers attach to every successful response.
pub const CACHE_CONTROL: &str = "public, max-age=31536000";

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("Access denied: {0}")]
    AccessDenied(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
    #[error("Corrupt image data: {0}")]
    CorruptData(String),
    #[error("Encode failed: {0}")]
    EncodeFailed(String),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl ResolveError {
    /// HTTP status a transport layer should answer with.
    pub fn status(&self) -> u16 {
        match self {
            Self::InvalidPath(_) | Self::UnsupportedFormat(_) => 400,
            Self::AccessDenied(_) => 403,
            Self::NotFound(_) => 404,
            Self::CorruptData(_) | Self::EncodeFailed(_) | Self::Io(_) => 500,
        }
    }
}

impl From<PathError> for ResolveError {
    fn from(err: PathError) -> Self {
        match err {
            PathError::InvalidPath(p) => Self::InvalidPath(p),
            PathError::AccessDenied(p) => Self::AccessDenied(p),
        }
    }
}

impl From<CodecError> for ResolveError {
    fn from(err: CodecError) -> Self {
        match err {
            CodecError::UnsupportedFormat(m) => Self::UnsupportedFormat(m),
            CodecError::CorruptData(m) => Self::CorruptData(m),
            CodecError::EncodeFailure(m) => Self::EncodeFailed(m),
        }
    }
}

impl From<StoreError> for ResolveError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(e) => Self::Io(e),
            StoreError::NoFileName(p) => Self::NotFound(p.display().to_string()),
        }
    }
}

/// Which file answers a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Resolution {
    /// The requested file itself, streamed verbatim.
    Direct { path: PathBuf },
    /// A derived artifact; `created` is true when this request wrote it.
    Generated { path: PathBuf, created: bool },
}

/// Result descriptor: the file to stream and its content type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedImage {
    #[serde(flatten)]
    pub resolution: Resolution,
    pub content_type: &'static str,
}

impl ResolvedImage {
    pub fn path(&self) -> &Path {
        match &self.resolution {
            Resolution::Direct { path } | Resolution::Generated { path, .. } => path,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self.resolution, Resolution::Generated { created: true, .. })
    }

    /// 201 for a freshly generated artifact, 200 otherwise.
    pub fn status(&self) -> u16 {
        if self.is_created() { 201 } else { 200 }
    }

    /// Read the resolved file.
    pub fn read_bytes(&self) -> io::Result<Vec<u8>> {
        std::fs::read(self.path())
    }
}

/// Immutable resolver configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolverConfig {
    /// Absolute image root; every resolved path lies inside it.
    pub root: PathBuf,
    pub transforms: TransformSettings,
}

impl ResolverConfig {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: absolute_root(root.as_ref()),
            transforms: TransformSettings::default(),
        }
    }

    pub fn with_preview_size(mut self, preview_size: u32) -> Self {
        self.transforms = TransformSettings::new(preview_size);
        self
    }
}

/// Orchestrates path resolution, source lookup, transforms and the store.
pub struct VariantResolver<B = RustBackend, P = FsProbe> {
    config: ResolverConfig,
    backend: B,
    probe: P,
}

impl VariantResolver {
    /// Resolver on the real filesystem with the pure Rust backend.
    pub fn new(config: ResolverConfig) -> Self {
        Self::with_backend(config, RustBackend::new(), FsProbe)
    }
}

impl<B: ImageBackend, P: FileProbe> VariantResolver<B, P> {
    pub fn with_backend(config: ResolverConfig, backend: B, probe: P) -> Self {
        Self {
            config,
            backend,
            probe,
        }
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Resolve one request. See the [module docs](self) for the algorithm.
    pub fn resolve(
        &self,
        request_path: &str,
        variant: Option<&str>,
        format: Option<&str>,
    ) -> Result<ResolvedImage, ResolveError> {
        let safe = resolve_request_path(&self.config.root, request_path)?;
        if safe.is_root() || safe.is_hidden() {
            return Err(ResolveError::NotFound(request_path.to_string()));
        }
        let exact = safe.absolute();

        let format = decide_format(exact, format)?;
        let variant = Variant::from_name(variant);

        if !format.is_convertible() {
            if stored_format(exact) != Some(format) {
                return Err(ResolveError::UnsupportedFormat(format!(
                    "cannot encode {format}"
                )));
            }
            return self.passthrough(exact, format, request_path);
        }

        if variant.is_identity()
            && stored_format(exact) == Some(format)
            && self.probe.is_file(exact)?
        {
            debug!(path = %exact.display(), "serving file directly");
            return Ok(direct(exact, format));
        }

        let derived = store::derived_path(exact, variant, format)
            .ok_or_else(|| ResolveError::NotFound(request_path.to_string()))?;
        if self.probe.is_file(&derived)? {
            debug!(path = %derived.display(), "serving cached variant");
            return Ok(generated(derived, format, false));
        }

        let source = locate(&self.probe, &safe)?
            .ok_or_else(|| ResolveError::NotFound(request_path.to_string()))?;
        let bytes = read_source(&source.path, request_path)?;
        let raster = self.backend.decode(&bytes, source.extension)?;
        let raster = apply_variant(&self.backend, raster, variant, &self.config.transforms);
        let encoded = self.backend.encode(&raster, format)?;
        store::persist(&derived, &encoded)?;

        let dims = raster.dimensions();
        info!(
            source = %source.path.display(),
            path = %derived.display(),
            variant = %variant,
            format = %format,
            width = dims.width,
            height = dims.height,
            "generated variant"
        );
        Ok(generated(derived, format, true))
    }

    fn passthrough(
        &self,
        exact: &Path,
        format: OutputFormat,
        request_path: &str,
    ) -> Result<ResolvedImage, ResolveError> {
        if self.probe.is_file(exact)? {
            debug!(path = %exact.display(), %format, "passthrough");
            Ok(direct(exact, format))
        } else {
            Err(ResolveError::NotFound(request_path.to_string()))
        }
    }
}

/// Caller's format if given (must be known), else the path's extension,
/// else PNG.
fn decide_format(exact: &Path, requested: Option<&str>) -> Result<OutputFormat, ResolveError> {
    match requested.map(str::trim).filter(|f| !f.is_empty()) {
        Some(name) => {
            OutputFormat::parse(name).ok_or_else(|| ResolveError::UnsupportedFormat(name.into()))
        }
        None => Ok(OutputFormat::from_path(exact).unwrap_or(OutputFormat::Png)),
    }
}

/// Format of a file as stored. Extensionless files are canonical PNG
/// sources; an unrecognized extension has no format.
fn stored_format(path: &Path) -> Option<OutputFormat> {
    match path.extension() {
        None => Some(OutputFormat::Png),
        Some(_) => OutputFormat::from_path(path),
    }
}

fn read_source(path: &Path, request_path: &str) -> Result<Vec<u8>, ResolveError> {
    std::fs::read(path).map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => ResolveError::NotFound(request_path.to_string()),
        _ => ResolveError::Io(e),
    })
}

fn direct(path: &Path, format: OutputFormat) -> ResolvedImage {
    ResolvedImage {
        resolution: Resolution::Direct {
            path: path.to_path_buf(),
        },
        content_type: format.content_type(),
    }
}

fn generated(path: PathBuf, format: OutputFormat, created: bool) -> ResolvedImage {
    ResolvedImage {
        resolution: Resolution::Generated { path, created },
        content_type: format.content_type(),
    }
}
