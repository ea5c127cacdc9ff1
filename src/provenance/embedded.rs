//! Provenance compiled into a binary
//!
//! [`EmbeddedBuild`] holds whatever `provenance::build::emit()` handed the
//! compiler for one package. The [`embedded_build!`](crate::embedded_build)
//! macro expands `option_env!` in the calling crate, so each binary reads the
//! values captured by its own build script.

use crate::provenance::metadata::BuildMetadata;
use crate::provenance::policy::FailurePolicy;
use crate::provenance::settings::BuildSettings;

/// Raw compile-time values; `None` where the build script captured nothing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmbeddedBuild {
    pub executable: Option<&'static str>,
    pub version: Option<&'static str>,
    pub built_by: Option<&'static str>,
    pub commit: Option<&'static str>,
    pub toolchain: Option<&'static str>,
    pub build_date: Option<&'static str>,
    pub failure_policy: Option<&'static str>,
    pub rustc_version: Option<&'static str>,
    pub vcs: Option<&'static str>,
    pub vcs_revision: Option<&'static str>,
    pub vcs_time: Option<&'static str>,
    pub vcs_modified: Option<&'static str>,
}

impl EmbeddedBuild {
    /// The six injected slots
    pub fn metadata(&self) -> BuildMetadata {
        BuildMetadata {
            executable: self.executable.map(str::to_string),
            version: self.version.map(str::to_string),
            built_by: self.built_by.map(str::to_string),
            commit: self.commit.map(str::to_string),
            toolchain: self.toolchain.map(str::to_string),
            build_date: self.build_date.map(str::to_string),
        }
        .normalized()
    }

    /// Revision-control settings in `vcs.*` key form
    pub fn settings(&self) -> BuildSettings {
        BuildSettings::from_pairs(
            [
                ("vcs", self.vcs),
                ("vcs.revision", self.vcs_revision),
                ("vcs.time", self.vcs_time),
                ("vcs.modified", self.vcs_modified),
            ]
            .into_iter()
            .filter_map(|(key, value)| value.map(|v| (key, v))),
        )
    }

    /// Configured policy; unset is lenient, unrecognised is lenient with a warning
    pub fn policy(&self) -> FailurePolicy {
        match self.failure_policy {
            None => FailurePolicy::default(),
            Some(name) => name.parse().unwrap_or_else(|e| {
                log::warn!("{}; using lenient", e);
                FailurePolicy::Lenient
            }),
        }
    }
}

/// Build an [`EmbeddedBuild`] from the calling crate's compile-time environment
#[macro_export]
macro_rules! embedded_build {
    () => {
        $crate::provenance::embedded::EmbeddedBuild {
            executable: option_env!("PROVENANCE_BUILD_EXECUTABLE"),
            version: option_env!("PROVENANCE_BUILD_VERSION"),
            built_by: option_env!("PROVENANCE_BUILD_BUILT_BY"),
            commit: option_env!("PROVENANCE_BUILD_COMMIT"),
            toolchain: option_env!("PROVENANCE_BUILD_TOOLCHAIN"),
            build_date: option_env!("PROVENANCE_BUILD_DATE"),
            failure_policy: option_env!("PROVENANCE_BUILD_FAILURE_POLICY"),
            rustc_version: option_env!("PROVENANCE_BUILD_RUSTC"),
            vcs: option_env!("PROVENANCE_BUILD_VCS"),
            vcs_revision: option_env!("PROVENANCE_BUILD_VCS_REVISION"),
            vcs_time: option_env!("PROVENANCE_BUILD_VCS_TIME"),
            vcs_modified: option_env!("PROVENANCE_BUILD_VCS_MODIFIED"),
        }
    };
}

/// A [`VersionReporter`](crate::provenance::reporter::VersionReporter) for the
/// calling crate's binary. An optional `BuildMetadata` argument overrides the
/// embedded slots field by field.
#[macro_export]
macro_rules! reporter {
    () => {
        $crate::reporter!($crate::provenance::metadata::BuildMetadata::new())
    };
    ($preset:expr) => {
        $crate::provenance::reporter::VersionReporter::from_embedded($crate::embedded_build!(), $preset)
    };
}

/// Version sentence of the calling binary, installing its reporter as the
/// process-wide one on first use
#[macro_export]
macro_rules! details {
    () => {
        $crate::provenance::api::get_or_install_with(|| $crate::reporter!()).details()
    };
}
