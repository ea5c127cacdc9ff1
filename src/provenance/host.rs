//! Host information provider abstraction
//!
//! Everything the reporter learns from the running system goes through
//! [`HostInfoProvider`], so resolution can be tested deterministically.

#[cfg(test)]
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
#[cfg(test)]
use std::sync::atomic::{AtomicUsize, Ordering};
#[cfg(test)]
use std::sync::Arc;
use std::time::SystemTime;

use crate::provenance::embedded::EmbeddedBuild;
use crate::provenance::settings::BuildSettings;

/// Source of runtime facts about the current process and its binary
pub trait HostInfoProvider: Send + Sync {
    /// Path of the running executable
    fn current_exe(&self) -> io::Result<PathBuf>;

    /// Username of the current OS user
    fn current_username(&self) -> io::Result<String>;

    /// Modification time of the file at `path`
    fn modified_time(&self, path: &Path) -> io::Result<SystemTime>;

    /// Revision-control settings recorded when the binary was built
    fn build_settings(&self) -> BuildSettings;

    /// Identifier of the compiler that built the binary
    fn toolchain(&self) -> Option<String>;
}

/// Production provider backed by the OS and one binary's compile-time capture.
///
/// The default carries no capture, so commit and toolchain lookups fail.
#[derive(Debug, Default, Clone)]
pub struct SystemHostInfo {
    embedded: EmbeddedBuild,
}

impl SystemHostInfo {
    pub fn new(embedded: EmbeddedBuild) -> Self {
        Self { embedded }
    }
}

impl HostInfoProvider for SystemHostInfo {
    fn current_exe(&self) -> io::Result<PathBuf> {
        std::env::current_exe()
    }

    fn current_username(&self) -> io::Result<String> {
        lookup_username()
    }

    fn modified_time(&self, path: &Path) -> io::Result<SystemTime> {
        std::fs::metadata(path)?.modified()
    }

    fn build_settings(&self) -> BuildSettings {
        self.embedded.settings()
    }

    fn toolchain(&self) -> Option<String> {
        self.embedded.rustc_version.map(str::to_string)
    }
}

/// Password database entry for the real uid, then `$USER`
#[cfg(unix)]
fn lookup_username() -> io::Result<String> {
    // SAFETY: getuid has no preconditions and cannot fail
    let uid = unsafe { libc::getuid() };
    match passwd_username(uid) {
        Ok(name) => Ok(name),
        Err(err) => {
            log::debug!("passwd lookup for uid {} failed: {}", uid, err);
            std::env::var("USER")
                .ok()
                .filter(|user| !user.is_empty())
                .ok_or(err)
        }
    }
}

#[cfg(unix)]
fn passwd_username(uid: libc::uid_t) -> io::Result<String> {
    const MAX_BUFFER: usize = 1 << 20;

    let mut buf: Vec<libc::c_char> = vec![0; 1024];
    loop {
        // SAFETY: passwd is plain old data; getpwuid_r fills it on success
        let mut pwd: libc::passwd = unsafe { std::mem::zeroed() };
        let mut result: *mut libc::passwd = std::ptr::null_mut();
        // SAFETY: buf outlives every pointer getpwuid_r stores in pwd
        let rc = unsafe {
            libc::getpwuid_r(uid, &mut pwd, buf.as_mut_ptr(), buf.len(), &mut result)
        };
        match rc {
            libc::ERANGE if buf.len() < MAX_BUFFER => {
                let grown = buf.len() * 2;
                buf.resize(grown, 0);
            }
            0 if !result.is_null() && !pwd.pw_name.is_null() => {
                // SAFETY: pw_name points to a NUL-terminated string inside buf
                let name = unsafe { std::ffi::CStr::from_ptr(pwd.pw_name) };
                let name = name.to_string_lossy().into_owned();
                if name.is_empty() {
                    return Err(io::Error::new(
                        io::ErrorKind::InvalidData,
                        format!("empty username for uid {uid}"),
                    ));
                }
                return Ok(name);
            }
            0 => {
                return Err(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no passwd entry for uid {uid}"),
                ))
            }
            errno => return Err(io::Error::from_raw_os_error(errno)),
        }
    }
}

#[cfg(not(unix))]
fn lookup_username() -> io::Result<String> {
    ["USERNAME", "USER"]
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|user| !user.is_empty())
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "current user is not set"))
}

/// Per-lookup call counts recorded by [`MockHostInfo`]
#[cfg(test)]
#[derive(Debug, Default)]
pub struct LookupCounts {
    pub current_exe: AtomicUsize,
    pub current_username: AtomicUsize,
    pub modified_time: AtomicUsize,
    pub build_settings: AtomicUsize,
    pub toolchain: AtomicUsize,
}

#[cfg(test)]
impl LookupCounts {
    pub fn total(&self) -> usize {
        [
            &self.current_exe,
            &self.current_username,
            &self.modified_time,
            &self.build_settings,
            &self.toolchain,
        ]
        .iter()
        .map(|c| c.load(Ordering::SeqCst))
        .sum()
    }
}

/// Mock provider for deterministic testing; `None` answers fail the lookup
#[derive(Debug, Clone, Default)]
#[cfg(test)]
pub struct MockHostInfo {
    pub exe: Option<PathBuf>,
    pub username: Option<String>,
    pub mtimes: HashMap<PathBuf, SystemTime>,
    pub settings: BuildSettings,
    pub toolchain: Option<String>,
    pub counts: Arc<LookupCounts>,
}

#[cfg(test)]
impl MockHostInfo {
    /// A host where every lookup fails
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_exe(mut self, path: impl Into<PathBuf>) -> Self {
        self.exe = Some(path.into());
        self
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn with_mtime(mut self, path: impl Into<PathBuf>, mtime: SystemTime) -> Self {
        self.mtimes.insert(path.into(), mtime);
        self
    }

    pub fn with_settings(mut self, settings: BuildSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_toolchain(mut self, toolchain: impl Into<String>) -> Self {
        self.toolchain = Some(toolchain.into());
        self
    }
}

#[cfg(test)]
impl HostInfoProvider for MockHostInfo {
    fn current_exe(&self) -> io::Result<PathBuf> {
        self.counts.current_exe.fetch_add(1, Ordering::SeqCst);
        self.exe
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no executable path"))
    }

    fn current_username(&self) -> io::Result<String> {
        self.counts.current_username.fetch_add(1, Ordering::SeqCst);
        self.username
            .clone()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such user"))
    }

    fn modified_time(&self, path: &Path) -> io::Result<SystemTime> {
        self.counts.modified_time.fetch_add(1, Ordering::SeqCst);
        self.mtimes
            .get(path)
            .copied()
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no such file"))
    }

    fn build_settings(&self) -> BuildSettings {
        self.counts.build_settings.fetch_add(1, Ordering::SeqCst);
        self.settings.clone()
    }

    fn toolchain(&self) -> Option<String> {
        self.counts.toolchain.fetch_add(1, Ordering::SeqCst);
        self.toolchain.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_system_provider_resolves_test_binary() {
        let provider = SystemHostInfo::default();
        let exe = provider.current_exe().expect("test binary path");
        let mtime = provider.modified_time(&exe).expect("test binary is stat-able");
        assert!(mtime > SystemTime::UNIX_EPOCH);
    }

    #[test]
    fn test_system_provider_stat_missing_file_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("not-there");
        let err = SystemHostInfo::default().modified_time(&missing).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_system_provider_stat_reads_real_mtime() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let expected = SystemTime::UNIX_EPOCH + Duration::from_secs(1_672_531_200);
        file.as_file().set_modified(expected).unwrap();

        let mtime = SystemHostInfo::default().modified_time(file.path()).unwrap();
        assert_eq!(mtime, expected);
    }

    #[test]
    fn test_system_provider_reads_embedded_build() {
        let provider = SystemHostInfo::new(EmbeddedBuild {
            rustc_version: Some("rustc 1.80.1"),
            vcs_revision: Some("abc123"),
            vcs_modified: Some("false"),
            ..Default::default()
        });
        assert_eq!(provider.toolchain().as_deref(), Some("rustc 1.80.1"));
        assert_eq!(provider.build_settings().commit().as_deref(), Some("abc123"));

        let bare = SystemHostInfo::default();
        assert_eq!(bare.toolchain(), None);
        assert_eq!(bare.build_settings().commit(), None);
    }

    #[test]
    fn test_mock_provider_counts_lookups() {
        let mock = MockHostInfo::new().with_username("alice");

        assert!(mock.current_exe().is_err());
        assert_eq!(mock.current_username().unwrap(), "alice");
        assert_eq!(mock.toolchain(), None);

        assert_eq!(mock.counts.current_exe.load(Ordering::SeqCst), 1);
        assert_eq!(mock.counts.current_username.load(Ordering::SeqCst), 1);
        assert_eq!(mock.counts.total(), 3);
    }
}
