//! Build metadata records
//!
//! [`BuildMetadata`] is what is known before resolution (injected at build
//! time or set by the embedding program); [`ResolvedMetadata`] is the fully
//! populated record a reporter produces once and then keeps.

use std::fmt;

/// Sentinel for a field that could not be derived
pub const UNKNOWN: &str = "unknown";

/// Version reported when none was injected
pub const DEFAULT_VERSION: &str = "v0.0.0-unknown";

/// Pre-set metadata; `None` (or an empty string) means "derive at runtime"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildMetadata {
    /// Base name of the running binary
    pub executable: Option<String>,
    /// Semver-like tag the binary was built from
    pub version: Option<String>,
    /// User that built the binary
    pub built_by: Option<String>,
    /// Source revision, optionally `-dirty` suffixed
    pub commit: Option<String>,
    /// Compiler identifier
    pub toolchain: Option<String>,
    /// RFC3339 build timestamp
    pub build_date: Option<String>,
}

impl BuildMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_executable(mut self, executable: impl Into<String>) -> Self {
        self.executable = non_empty(executable.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = non_empty(version.into());
        self
    }

    pub fn with_built_by(mut self, built_by: impl Into<String>) -> Self {
        self.built_by = non_empty(built_by.into());
        self
    }

    pub fn with_commit(mut self, commit: impl Into<String>) -> Self {
        self.commit = non_empty(commit.into());
        self
    }

    pub fn with_toolchain(mut self, toolchain: impl Into<String>) -> Self {
        self.toolchain = non_empty(toolchain.into());
        self
    }

    pub fn with_build_date(mut self, build_date: impl Into<String>) -> Self {
        self.build_date = non_empty(build_date.into());
        self
    }

    /// Treat empty strings as unset
    pub fn normalized(self) -> Self {
        Self {
            executable: self.executable.and_then(non_empty),
            version: self.version.and_then(non_empty),
            built_by: self.built_by.and_then(non_empty),
            commit: self.commit.and_then(non_empty),
            toolchain: self.toolchain.and_then(non_empty),
            build_date: self.build_date.and_then(non_empty),
        }
    }

    /// Fields from `self` win; `fallback` only fills the gaps
    pub fn or(self, fallback: BuildMetadata) -> Self {
        Self {
            executable: self.executable.or(fallback.executable),
            version: self.version.or(fallback.version),
            built_by: self.built_by.or(fallback.built_by),
            commit: self.commit.or(fallback.commit),
            toolchain: self.toolchain.or(fallback.toolchain),
            build_date: self.build_date.or(fallback.build_date),
        }
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Fully populated metadata; `Display` renders the version sentence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMetadata {
    pub executable: String,
    pub version: String,
    pub built_by: String,
    pub commit: String,
    pub toolchain: String,
    pub build_date: String,
}

impl fmt::Display for ResolvedMetadata {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} built by {} from commit {} with {} at {}.",
            self.executable,
            self.version,
            self.built_by,
            self.commit,
            self.toolchain,
            self.build_date
        )
    }
}
