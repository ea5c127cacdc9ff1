//! Build-script support for binaries that report their own provenance
//!
//! A binary crate adds `provenance` as a build-dependency and calls
//! [`emit`] from its `build.rs`:
//!
//! ```rust,no_run
//! fn main() {
//!     provenance::build::emit();
//! }
//! ```
//!
//! Its own git checkout, `[package.metadata.provenance]` table and
//! `PROVENANCE_*` variables are then compiled into that binary, where
//! `provenance::reporter!()` reads them back.

pub mod capture;

use std::path::PathBuf;

pub use capture::{Capture, SLOTS};

/// Capture for the package whose build script is running
pub fn capture_from_env() -> Capture {
    let manifest_dir = std::env::var_os("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    capture::capture(&manifest_dir, &|var| std::env::var(var).ok())
}

/// Print the `cargo:` instructions for the running build script
pub fn emit() {
    for line in capture_from_env().instructions() {
        println!("{}", line);
    }
}
