//! Version Reporter
//!
//! Resolves the six provenance fields once and renders them as the version
//! sentence. Pre-set fields are taken verbatim; every other field is derived
//! in a fixed order:
//!
//! 1. executable path (only looked up when `executable` or `build_date` needs it)
//! 2. `executable`: base name of that path
//! 3. `version`: `v0.0.0-unknown`
//! 4. `built_by`: current OS username
//! 5. `commit`: revision recorded in the embedded build settings, `-dirty` if modified
//! 6. `toolchain`: compiler identifier recorded at build time
//! 7. `build_date`: modification time of the executable, RFC3339
//!
//! Under [`FailurePolicy::Lenient`] any failed lookup becomes `"unknown"`.
//! Under [`FailurePolicy::Strict`] the first failure is returned and nothing
//! is memoized, so the next call starts over.

use std::io;
use std::path::Path;
use std::time::SystemTime;

use chrono::{DateTime, Local, SecondsFormat};
use once_cell::sync::OnceCell;

use crate::provenance::embedded::EmbeddedBuild;
use crate::provenance::error::{ProvenanceError, ProvenanceResult};
use crate::provenance::host::{HostInfoProvider, SystemHostInfo};
use crate::provenance::metadata::{BuildMetadata, ResolvedMetadata, DEFAULT_VERSION, UNKNOWN};
use crate::provenance::policy::FailurePolicy;

/// Lazily resolving, memoizing version reporter
#[derive(Debug)]
pub struct VersionReporter<P: HostInfoProvider = SystemHostInfo> {
    preset: BuildMetadata,
    policy: FailurePolicy,
    host: P,
    resolved: OnceCell<ResolvedMetadata>,
}

impl VersionReporter<SystemHostInfo> {
    /// Reporter over the real host with the given pre-set fields and no
    /// compile-time capture
    pub fn new(preset: BuildMetadata) -> Self {
        Self::with_host(preset, SystemHostInfo::default())
    }

    /// Reporter for the binary that captured `embedded` at build time.
    ///
    /// Fields set in `preset` win over the captured slots. Usually reached
    /// through `provenance::reporter!()`.
    pub fn from_embedded(embedded: EmbeddedBuild, preset: BuildMetadata) -> Self {
        Self::with_host(preset.or(embedded.metadata()), SystemHostInfo::new(embedded))
            .with_policy(embedded.policy())
    }

    /// Reporter for this library's own package build; binaries that depend on
    /// it use `provenance::reporter!()` instead
    pub fn from_build() -> Self {
        Self::from_embedded(crate::core::version::embedded(), BuildMetadata::new())
    }
}

impl<P: HostInfoProvider> VersionReporter<P> {
    pub fn with_host(preset: BuildMetadata, host: P) -> Self {
        Self {
            preset: preset.normalized(),
            policy: FailurePolicy::default(),
            host,
            resolved: OnceCell::new(),
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn preset(&self) -> &BuildMetadata {
        &self.preset
    }

    /// Whether a successful resolution has been memoized
    pub fn is_resolved(&self) -> bool {
        self.resolved.get().is_some()
    }

    /// The version sentence, resolving unset fields on first use
    pub fn details(&self) -> ProvenanceResult<String> {
        self.metadata().map(ToString::to_string)
    }

    /// The memoized record behind [`details`](Self::details).
    ///
    /// Concurrent first callers block until a single resolution finishes.
    pub fn metadata(&self) -> ProvenanceResult<&ResolvedMetadata> {
        self.resolved.get_or_try_init(|| self.resolve())
    }

    fn resolve(&self) -> ProvenanceResult<ResolvedMetadata> {
        let preset = &self.preset;
        log::debug!("Resolving build provenance ({} policy)", self.policy);

        let exe_path = if preset.executable.is_none() || preset.build_date.is_none() {
            match self.host.current_exe() {
                Ok(path) => Some(path),
                Err(source) => {
                    self.degrade("executable path", ProvenanceError::PathResolution { source })?;
                    None
                }
            }
        } else {
            None
        };

        let executable = match (&preset.executable, exe_path.as_deref()) {
            (Some(executable), _) => executable.clone(),
            (None, Some(path)) => self.settle("executable", base_name(path))?,
            (None, None) => UNKNOWN.to_string(),
        };

        let version = preset
            .version
            .clone()
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());

        let built_by = match &preset.built_by {
            Some(built_by) => built_by.clone(),
            None => self.settle(
                "built_by",
                self.host
                    .current_username()
                    .map_err(|source| ProvenanceError::UserLookup { source }),
            )?,
        };

        let commit = match &preset.commit {
            Some(commit) => commit.clone(),
            None => self.settle(
                "commit",
                self.host
                    .build_settings()
                    .commit()
                    .ok_or_else(|| ProvenanceError::RevisionLookup {
                        reason: "no vcs.revision was recorded at build time".to_string(),
                    }),
            )?,
        };

        let toolchain = match &preset.toolchain {
            Some(toolchain) => toolchain.clone(),
            None => self.settle(
                "toolchain",
                self.host
                    .toolchain()
                    .ok_or_else(|| ProvenanceError::ToolchainLookup {
                        reason: "no compiler version was recorded at build time".to_string(),
                    }),
            )?,
        };

        let build_date = match (&preset.build_date, exe_path) {
            (Some(build_date), _) => build_date.clone(),
            (None, Some(path)) => {
                let lookup = self
                    .host
                    .modified_time(&path)
                    .map(format_rfc3339)
                    .map_err(|source| ProvenanceError::Stat { path, source });
                self.settle("build_date", lookup)?
            }
            (None, None) => UNKNOWN.to_string(),
        };

        let resolved = ResolvedMetadata {
            executable,
            version,
            built_by,
            commit,
            toolchain,
            build_date,
        };
        log::debug!("Resolved build provenance: {}", resolved);
        Ok(resolved)
    }

    /// A looked-up value, or the sentinel when the lookup failed leniently
    fn settle(&self, field: &str, lookup: ProvenanceResult<String>) -> ProvenanceResult<String> {
        lookup.or_else(|err| self.degrade(field, err).map(|()| UNKNOWN.to_string()))
    }

    fn degrade(&self, field: &str, err: ProvenanceError) -> ProvenanceResult<()> {
        match self.policy {
            FailurePolicy::Strict => Err(err),
            FailurePolicy::Lenient => {
                log::debug!("Using '{}' for {}: {}", UNKNOWN, field, err);
                Ok(())
            }
        }
    }
}

fn base_name(path: &Path) -> ProvenanceResult<String> {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .ok_or_else(|| ProvenanceError::PathResolution {
            source: io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("executable path {} has no file name", path.display()),
            ),
        })
}

/// RFC3339 in local time, `Z` when the local offset is zero
pub(crate) fn format_rfc3339(time: SystemTime) -> String {
    DateTime::<Local>::from(time).to_rfc3339_opts(SecondsFormat::Secs, true)
}
