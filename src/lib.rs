//! # imgvar
//!
//! On-demand image variants served from a directory tree. A request names a
//! logical image path, an optional variant and an optional output format;
//! the library decides which file on disk answers it, generating and
//! persisting a derived file the first time a variant is asked for.
//!
//! # Architecture: Resolve, Then Stream
//!
//! The library never streams bytes itself. [`resolver::VariantResolver`]
//! returns a [`resolver::ResolvedImage`] naming a file and its content type;
//! the transport layer (HTTP server, CLI) streams that file with the status
//! and cache header the descriptor carries.
//!
//! ```text
//! request ──► paths ──► format ──┬──► passthrough / direct file
//!                                ├──► derived file already in store
//!                                └──► source ──► imaging ──► store
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`paths`] | Confines request paths to the image root; rejects traversal, detects hidden components |
//! | [`source`] | Finds the file backing a logical path (exact, `.png`, `.jpg`, `.webp`, `.jpeg`) |
//! | [`format`] | Output formats, content types, which formats can be re-encoded |
//! | [`variant`] | Named variants: `preview` or the identity transform |
//! | [`imaging`] | Pure-Rust decode, resize and encode behind the [`imaging::ImageBackend`] trait |
//! | [`store`] | Derived file naming and atomic persistence |
//! | [`resolver`] | The orchestrator: decide, reuse or generate |
//! | [`normalize`] | Bulk conversion of sources to canonical extensionless PNGs |
//! | [`config`] | `imgvar.toml` loading, validation and merging |
//! | [`logging`] | `tracing` subscriber setup for the binary |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## The Filesystem Is the Cache
//!
//! Derived files live next to their sources under a deterministic name
//! (`u1.preview.png`). There is no index and no expiry: a restart finds every
//! artifact where the last run left it, and an artifact is never refreshed
//! when its source changes. Deleting a derived file is the way to force
//! regeneration.
//!
//! ## No Locks Around Generation
//!
//! Two requests for the same missing variant may both generate it. Each
//! writes to its own temp file and renames it into place, so readers only
//! ever see complete files and the duplicate work is harmless.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, resampling and encoding use the `image` crate only. No system
//! libraries, no external processes.

pub mod config;
pub mod format;
pub mod imaging;
pub mod logging;
pub mod normalize;
pub mod output;
pub mod paths;
pub mod resolver;
pub mod source;
pub mod store;
pub mod variant;

#[cfg(test)]
pub(crate) mod test_helpers;
