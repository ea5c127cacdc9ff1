//! Build provenance reporting
//!
//! Produces one sentence describing how the running binary was built:
//!
//! ```text
//! <executable> <version> built by <built_by> from commit <commit> with <toolchain> at <build_date>.
//! ```
//!
//! Values captured by the binary's build script (see [`crate::build`]) always
//! win. Anything missing is derived once from the host (executable path, OS
//! user, file timestamps, embedded revision-control settings) and then kept
//! for the life of the reporter.
//!
//! See [`api`] for the entry points.

pub mod api;
pub mod embedded;
pub mod error;
pub mod host;
pub mod metadata;
pub mod policy;
pub mod reporter;
pub mod settings;

#[cfg(test)]
mod tests;
