//! Common test utilities and helpers

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::SystemTime;

use provenance::provenance::api::{BuildSettings, HostInfoProvider};

static INIT: Once = Once::new();

pub fn init_test_logging() {
    INIT.call_once(|| {
        // Only once per test binary; a second logger would fail to install
        let _ = provenance::core::logging::init_logging(Some("debug"), None, None, false);
    });
}

/// Host backed by a real file on disk, so the filesystem is stat'ed for real
pub struct FixtureHost {
    pub exe: PathBuf,
    pub username: Option<String>,
    pub revision: Option<(String, bool)>,
}

impl FixtureHost {
    pub fn new(exe: impl Into<PathBuf>) -> Self {
        Self {
            exe: exe.into(),
            username: Some("builder".to_string()),
            revision: Some(("0123abcd".to_string(), false)),
        }
    }
}

impl HostInfoProvider for FixtureHost {
    fn current_exe(&self) -> io::Result<PathBuf> {
        Ok(self.exe.clone())
    }

    fn current_username(&self) -> io::Result<String> {
        self.username
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such user"))
    }

    fn modified_time(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn build_settings(&self) -> BuildSettings {
        match &self.revision {
            Some((revision, modified)) => BuildSettings::from_pairs([
                ("vcs".to_string(), "git".to_string()),
                ("vcs.revision".to_string(), revision.clone()),
                ("vcs.modified".to_string(), modified.to_string()),
            ]),
            None => BuildSettings::default(),
        }
    }

    fn toolchain(&self) -> Option<String> {
        Some("rustc 1.80.1".to_string())
    }
}
