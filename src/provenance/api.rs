//! Public API for build provenance reporting
//!
//! External modules should import from here rather than directly from the
//! internal modules.
//!
//! A binary installs its own reporter once, early in `main`:
//!
//! ```rust,no_run
//! let _ = provenance::install(provenance::reporter!());
//! println!("{}", provenance::details().unwrap_or_default());
//! ```

use std::sync::OnceLock;

use crate::core::error_handling::log_error_with_context;

pub use crate::provenance::embedded::EmbeddedBuild;
pub use crate::provenance::error::{ProvenanceError, ProvenanceResult};
pub use crate::provenance::host::{HostInfoProvider, SystemHostInfo};
pub use crate::provenance::metadata::{BuildMetadata, ResolvedMetadata, DEFAULT_VERSION, UNKNOWN};
pub use crate::provenance::policy::FailurePolicy;
pub use crate::provenance::reporter::VersionReporter;
pub use crate::provenance::settings::BuildSettings;

/// Process-wide reporter
static REPORTER: OnceLock<VersionReporter> = OnceLock::new();

/// Make `reporter` the process-wide one. Fails, handing it back, when a
/// reporter is already installed.
pub fn install(reporter: VersionReporter) -> Result<(), VersionReporter> {
    REPORTER.set(reporter)
}

/// The process-wide reporter, installing the one built by `init` if none is
pub fn get_or_install_with(init: impl FnOnce() -> VersionReporter) -> &'static VersionReporter {
    REPORTER.get_or_init(init)
}

/// Get the process-wide reporter.
///
/// Without an [`install`]ed reporter this falls back to
/// [`VersionReporter::from_build`], which only knows this library's own build.
pub fn get_reporter() -> &'static VersionReporter {
    get_or_install_with(VersionReporter::from_build)
}

/// Version sentence for the running binary
pub fn details() -> ProvenanceResult<String> {
    get_reporter().details()
}

/// Log the version sentence at info level, or the reason it is unavailable
pub fn log_details() {
    match details() {
        Ok(sentence) => log::info!("{}", sentence),
        Err(err) => log_error_with_context(&err, "Could not determine build provenance"),
    }
}
