//! This package's own build capture.
//!
//! `build.rs` runs the same capture as `provenance::build::emit()`, so the
//! values here describe the provenance library build itself: its checkout,
//! its `[package.metadata.provenance]` table and the `PROVENANCE_*` variables
//! set when it was compiled. Binaries depending on the library read their own
//! capture through `provenance::reporter!()`.

use crate::provenance::embedded::EmbeddedBuild;

/// Compile-time capture for this package
pub fn embedded() -> EmbeddedBuild {
    crate::embedded_build!()
}
