use std::time::{Duration, SystemTime};

use crate::provenance::host::MockHostInfo;
use crate::provenance::metadata::BuildMetadata;
use crate::provenance::settings::BuildSettings;

pub const EXE_PATH: &str = "/usr/local/bin/myapp";

/// 2023-01-01T00:00:00Z
pub fn build_time() -> SystemTime {
    SystemTime::UNIX_EPOCH + Duration::from_secs(1_672_531_200)
}

pub fn all_preset() -> BuildMetadata {
    BuildMetadata::new()
        .with_executable("app")
        .with_version("v1.2.3")
        .with_built_by("alice")
        .with_commit("deadbeef")
        .with_toolchain("go1.21")
        .with_build_date("2023-01-01T00:00:00Z")
}

/// A host where every lookup succeeds
pub fn healthy_host() -> MockHostInfo {
    MockHostInfo::new()
        .with_exe(EXE_PATH)
        .with_mtime(EXE_PATH, build_time())
        .with_username("bob")
        .with_settings(BuildSettings::from_pairs([
            ("vcs", "git"),
            ("vcs.revision", "abc123"),
            ("vcs.modified", "true"),
        ]))
        .with_toolchain("rustc 1.80.1")
}
