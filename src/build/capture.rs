//! Build-time capture of provenance values
//!
//! Runs inside a build script. Everything is read relative to the package
//! being built (its manifest dir, its `[package.metadata.provenance]` table,
//! its git checkout) and handed to the compiler as `cargo:rustc-env` values
//! that `embedded_build!` picks up with `option_env!` in that same package.
//!
//! This file is also compiled directly into this crate's own `build.rs`, so
//! it only depends on std, `chrono` and `toml`.

use chrono::{DateTime, SecondsFormat, Utc};
use std::path::{Path, PathBuf};
use std::process::Command;

/// An injectable slot: compiler env name, build-time input variable, manifest key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub output: &'static str,
    pub env: &'static str,
    pub key: &'static str,
}

pub const SLOTS: &[Slot] = &[
    Slot {
        output: "PROVENANCE_BUILD_EXECUTABLE",
        env: "PROVENANCE_EXECUTABLE",
        key: "executable",
    },
    Slot {
        output: "PROVENANCE_BUILD_VERSION",
        env: "PROVENANCE_VERSION",
        key: "version",
    },
    Slot {
        output: "PROVENANCE_BUILD_BUILT_BY",
        env: "PROVENANCE_BUILT_BY",
        key: "built-by",
    },
    Slot {
        output: "PROVENANCE_BUILD_COMMIT",
        env: "PROVENANCE_COMMIT",
        key: "commit",
    },
    Slot {
        output: "PROVENANCE_BUILD_TOOLCHAIN",
        env: "PROVENANCE_TOOLCHAIN",
        key: "toolchain",
    },
    Slot {
        output: "PROVENANCE_BUILD_DATE",
        env: "PROVENANCE_BUILD_DATE",
        key: "build-date",
    },
    Slot {
        output: "PROVENANCE_BUILD_FAILURE_POLICY",
        env: "PROVENANCE_FAILURE_POLICY",
        key: "failure-policy",
    },
];

pub const VERSION_FILE_ENV: &str = "PROVENANCE_VERSION_FILE";
pub const VERSION_FILE_KEY: &str = "version-file";
pub const SOURCE_DATE_EPOCH: &str = "SOURCE_DATE_EPOCH";
pub const RUSTC_OUTPUT: &str = "PROVENANCE_BUILD_RUSTC";

/// Build setting key -> compiler env name
pub const VCS_OUTPUTS: &[(&str, &str)] = &[
    ("vcs", "PROVENANCE_BUILD_VCS"),
    ("vcs.revision", "PROVENANCE_BUILD_VCS_REVISION"),
    ("vcs.time", "PROVENANCE_BUILD_VCS_TIME"),
    ("vcs.modified", "PROVENANCE_BUILD_VCS_MODIFIED"),
];

/// What a build script hands to cargo
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Capture {
    /// (compiler env name, value); only slots that were filled
    pub values: Vec<(&'static str, String)>,
    pub rerun_paths: Vec<PathBuf>,
    pub rerun_env: Vec<&'static str>,
}

impl Capture {
    pub fn get(&self, output: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(name, _)| *name == output)
            .map(|(_, value)| value.as_str())
    }

    /// `cargo:` lines in the order they should be printed
    pub fn instructions(&self) -> Vec<String> {
        let mut lines: Vec<String> = self
            .values
            .iter()
            // rustc-env values end at the first newline
            .map(|(name, value)| format!("cargo:rustc-env={}={}", name, value.replace(['\r', '\n'], " ")))
            .collect();
        lines.extend(
            self.rerun_paths
                .iter()
                .map(|path| format!("cargo:rerun-if-changed={}", path.display())),
        );
        lines.extend(
            self.rerun_env
                .iter()
                .map(|var| format!("cargo:rerun-if-env-changed={}", var)),
        );
        lines
    }
}

/// Capture everything for the package at `manifest_dir`.
///
/// `env` reads the build script's environment; tests pass a fixed map.
pub fn capture(manifest_dir: &Path, env: &dyn Fn(&str) -> Option<String>) -> Capture {
    let cargo_toml_path = manifest_dir.join("Cargo.toml");
    let table = std::fs::read_to_string(&cargo_toml_path)
        .map(|contents| manifest_table(&contents))
        .unwrap_or_default();

    let mut capture = Capture::default();
    for slot in SLOTS {
        let mut value = lookup(env, &table, slot.env, slot.key);
        if slot.key == "version" && value.is_none() {
            if let Some(file) = lookup(env, &table, VERSION_FILE_ENV, VERSION_FILE_KEY) {
                let path = manifest_dir.join(file);
                value = read_version_file(&path);
                capture.rerun_paths.push(path);
            }
        }
        if slot.key == "build-date" && value.is_none() {
            value = env(SOURCE_DATE_EPOCH).and_then(|secs| source_date_epoch(&secs));
        }
        if let Some(value) = value {
            capture.values.push((slot.output, value));
        }
        capture.rerun_env.push(slot.env);
    }
    capture.rerun_env.push(VERSION_FILE_ENV);
    capture.rerun_env.push(SOURCE_DATE_EPOCH);

    let rustc = env("RUSTC").unwrap_or_else(|| "rustc".to_string());
    if let Some(version) = command_output(Command::new(rustc).arg("--version"))
        .and_then(|output| first_two_words(&output))
    {
        capture.values.push((RUSTC_OUTPUT, version));
    }

    for (key, value) in vcs_settings(manifest_dir) {
        if let Some(&(_, output)) = VCS_OUTPUTS.iter().find(|(k, _)| *k == key) {
            capture.values.push((output, value));
        }
    }

    capture.rerun_paths.push(cargo_toml_path);
    capture.rerun_paths.extend(git_watch_paths(manifest_dir));
    capture
}

/// The `[package.metadata.provenance]` table, empty when absent or malformed
pub fn manifest_table(cargo_toml: &str) -> toml::Table {
    cargo_toml
        .parse::<toml::Table>()
        .ok()
        .and_then(|t| {
            t.get("package")
                .and_then(|p| p.as_table())
                .and_then(|p| p.get("metadata"))
                .and_then(|m| m.as_table())
                .and_then(|m| m.get("provenance"))
                .and_then(|p| p.as_table())
                .cloned()
        })
        .unwrap_or_default()
}

/// Environment first, then the manifest table; blank values count as unset
pub fn lookup(
    env: &dyn Fn(&str) -> Option<String>,
    table: &toml::Table,
    var: &str,
    key: &str,
) -> Option<String> {
    let from_env = env(var)
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    from_env.or_else(|| {
        table
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    })
}

/// First non-blank line of the file
pub fn read_version_file(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok().and_then(|contents| {
        contents
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
    })
}

/// Seconds since the epoch -> RFC3339 UTC
pub fn source_date_epoch(secs: &str) -> Option<String> {
    let secs = secs.trim().parse::<i64>().ok()?;
    DateTime::<Utc>::from_timestamp(secs, 0).map(|d| d.to_rfc3339_opts(SecondsFormat::Secs, true))
}

/// "rustc 1.80.1 (3f5fd8dd4 2024-08-06)" -> "rustc 1.80.1"
pub fn first_two_words(output: &str) -> Option<String> {
    let words: Vec<&str> = output.split_whitespace().take(2).collect();
    if words.is_empty() {
        None
    } else {
        Some(words.join(" "))
    }
}

/// `vcs`, `vcs.revision`, `vcs.time`, `vcs.modified` for the checkout containing `dir`
pub fn vcs_settings(dir: &Path) -> Vec<(&'static str, String)> {
    let Some(revision) = git(dir, &["rev-parse", "HEAD"]) else {
        return Vec::new();
    };
    let mut settings = vec![("vcs", "git".to_string()), ("vcs.revision", revision)];
    if let Some(time) = git(dir, &["log", "-1", "--format=%cI"]) {
        settings.push(("vcs.time", time));
    }
    // command_output drops empty output, so a clean tree comes back as None
    let modified = Command::new("git")
        .args(["status", "--porcelain"])
        .current_dir(dir)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| !output.stdout.iter().all(u8::is_ascii_whitespace));
    if let Some(modified) = modified {
        settings.push(("vcs.modified", modified.to_string()));
    }
    settings
}

/// Files whose change means the recorded revision is stale: HEAD, the
/// index, the branch ref HEAD points at and packed-refs. Only existing
/// files are returned, so a missing one never forces a rebuild.
pub fn git_watch_paths(dir: &Path) -> Vec<PathBuf> {
    let Some(git_dir) = git(dir, &["rev-parse", "--git-dir"]) else {
        return Vec::new();
    };
    let git_dir = dir.join(git_dir);
    // Branch refs live in the common dir for linked worktrees
    let common_dir = git(dir, &["rev-parse", "--git-common-dir"])
        .map(|common| dir.join(common))
        .unwrap_or_else(|| git_dir.clone());

    let mut paths = vec![git_dir.join("HEAD"), git_dir.join("index")];
    if let Some(head_ref) = git(dir, &["symbolic-ref", "-q", "HEAD"]) {
        paths.push(common_dir.join(head_ref));
    }
    paths.push(common_dir.join("packed-refs"));
    paths.retain(|path| path.exists());
    paths
}

fn git(dir: &Path, args: &[&str]) -> Option<String> {
    command_output(Command::new("git").args(args).current_dir(dir))
}

fn command_output(command: &mut Command) -> Option<String> {
    command
        .output()
        .ok()
        .and_then(|output| {
            if output.status.success() {
                String::from_utf8(output.stdout).ok()
            } else {
                None
            }
        })
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    fn package(manifest: &str) -> TempDir {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), manifest).unwrap();
        dir
    }

    const MANIFEST: &str = r#"
[package]
name = "consumer"
version = "0.1.0"

[package.metadata.provenance]
version = "v1.0.0"
built-by = "release-bot"
failure-policy = "strict"
"#;

    #[test]
    fn test_manifest_table_reads_provenance_metadata() {
        let table = manifest_table(MANIFEST);
        assert_eq!(table.get("built-by").and_then(|v| v.as_str()), Some("release-bot"));
        assert!(manifest_table("not = [valid").is_empty());
        assert!(manifest_table("[package]\nname = \"x\"").is_empty());
    }

    #[test]
    fn test_env_wins_over_manifest_table() {
        let table = manifest_table(MANIFEST);
        let env = env_of(&[("PROVENANCE_VERSION", "v2.0.0"), ("PROVENANCE_BUILT_BY", "  ")]);

        assert_eq!(
            lookup(&env, &table, "PROVENANCE_VERSION", "version").as_deref(),
            Some("v2.0.0")
        );
        // Blank env falls through to the table
        assert_eq!(
            lookup(&env, &table, "PROVENANCE_BUILT_BY", "built-by").as_deref(),
            Some("release-bot")
        );
        assert_eq!(lookup(&env, &table, "PROVENANCE_COMMIT", "commit"), None);
    }

    #[test]
    fn test_source_date_epoch_is_rfc3339_utc() {
        assert_eq!(
            source_date_epoch("1672531200").as_deref(),
            Some("2023-01-01T00:00:00Z")
        );
        assert_eq!(source_date_epoch(" 0\n").as_deref(), Some("1970-01-01T00:00:00Z"));
        assert_eq!(source_date_epoch("yesterday"), None);
    }

    #[test]
    fn test_rustc_version_cut_to_two_words() {
        assert_eq!(
            first_two_words("rustc 1.80.1 (3f5fd8dd4 2024-08-06)\n").as_deref(),
            Some("rustc 1.80.1")
        );
        assert_eq!(first_two_words("rustc").as_deref(), Some("rustc"));
        assert_eq!(first_two_words("  \n"), None);
    }

    #[test]
    fn test_env_value_becomes_injected_slot() {
        let dir = package(MANIFEST);
        let env = env_of(&[("PROVENANCE_VERSION", "v2.0.0"), ("PROVENANCE_COMMIT", "f867bc2f")]);

        let capture = capture(dir.path(), &env);
        assert_eq!(capture.get("PROVENANCE_BUILD_VERSION"), Some("v2.0.0"));
        assert_eq!(capture.get("PROVENANCE_BUILD_COMMIT"), Some("f867bc2f"));
        assert_eq!(capture.get("PROVENANCE_BUILD_BUILT_BY"), Some("release-bot"));
        assert_eq!(capture.get("PROVENANCE_BUILD_FAILURE_POLICY"), Some("strict"));
        assert_eq!(capture.get("PROVENANCE_BUILD_EXECUTABLE"), None);
    }

    #[test]
    fn test_version_file_fills_missing_version() {
        let dir = package("[package]\nname = \"consumer\"\n\n[package.metadata.provenance]\nversion-file = \"VERSION\"\n");
        std::fs::write(dir.path().join("VERSION"), "\nv3.1.4\nignored\n").unwrap();

        let capture = capture(dir.path(), &env_of(&[]));
        assert_eq!(capture.get("PROVENANCE_BUILD_VERSION"), Some("v3.1.4"));
        assert!(capture.rerun_paths.contains(&dir.path().join("VERSION")));
    }

    #[test]
    fn test_direct_version_beats_version_file() {
        let dir = package("[package]\nname = \"consumer\"\n");
        std::fs::write(dir.path().join("VERSION"), "v3.1.4\n").unwrap();
        let env = env_of(&[("PROVENANCE_VERSION", "v9.0.0"), ("PROVENANCE_VERSION_FILE", "VERSION")]);

        let capture = capture(dir.path(), &env);
        assert_eq!(capture.get("PROVENANCE_BUILD_VERSION"), Some("v9.0.0"));
    }

    #[test]
    fn test_source_date_epoch_fills_missing_build_date() {
        let dir = package("[package]\nname = \"consumer\"\n");

        let capture = capture(dir.path(), &env_of(&[("SOURCE_DATE_EPOCH", "1672531200")]));
        assert_eq!(capture.get("PROVENANCE_BUILD_DATE"), Some("2023-01-01T00:00:00Z"));

        let env = env_of(&[
            ("SOURCE_DATE_EPOCH", "1672531200"),
            ("PROVENANCE_BUILD_DATE", "2024-06-01T12:00:00Z"),
        ]);
        let capture = super::capture(dir.path(), &env);
        assert_eq!(capture.get("PROVENANCE_BUILD_DATE"), Some("2024-06-01T12:00:00Z"));
    }

    #[test]
    fn test_instructions_cover_values_paths_and_env() {
        let capture = Capture {
            values: vec![("PROVENANCE_BUILD_VERSION", "v1.0.0\nsecond".to_string())],
            rerun_paths: vec![PathBuf::from("/work/.git/HEAD")],
            rerun_env: vec!["PROVENANCE_VERSION"],
        };
        assert_eq!(
            capture.instructions(),
            vec![
                "cargo:rustc-env=PROVENANCE_BUILD_VERSION=v1.0.0 second".to_string(),
                "cargo:rerun-if-changed=/work/.git/HEAD".to_string(),
                "cargo:rerun-if-env-changed=PROVENANCE_VERSION".to_string(),
            ]
        );
    }

    #[test]
    fn test_every_input_variable_is_watched() {
        let dir = package("[package]\nname = \"consumer\"\n");
        let capture = capture(dir.path(), &env_of(&[]));
        for slot in SLOTS {
            assert!(capture.rerun_env.contains(&slot.env), "missing {}", slot.env);
        }
        assert!(capture.rerun_env.contains(&SOURCE_DATE_EPOCH));
        assert!(capture.rerun_paths.contains(&dir.path().join("Cargo.toml")));
    }

    #[test]
    fn test_git_watch_paths_only_lists_existing_files() {
        let dir = TempDir::new().unwrap();
        for path in git_watch_paths(dir.path()) {
            assert!(path.exists(), "{} does not exist", path.display());
        }
    }

    #[test]
    fn test_git_watch_paths_resolve_repository_above_package() {
        let repo = TempDir::new().unwrap();
        let git_ok = |args: &[&str]| {
            Command::new("git")
                .args(["-c", "user.name=test", "-c", "user.email=test@example.com"])
                .args(args)
                .current_dir(repo.path())
                .output()
                .map(|out| out.status.success())
                .unwrap_or(false)
        };
        if !git_ok(&["init", "-q"]) {
            eprintln!("git unavailable, skipping");
            return;
        }
        std::fs::write(repo.path().join("README"), "app\n").unwrap();
        assert!(git_ok(&["add", "README"]));
        assert!(git_ok(&["commit", "-q", "-m", "init"]));

        let package = repo.path().join("crates").join("app");
        std::fs::create_dir_all(&package).unwrap();
        let head_ref = git(&package, &["symbolic-ref", "-q", "HEAD"]).unwrap();

        let paths = git_watch_paths(&package);
        assert!(paths.iter().any(|p| p.ends_with(".git/HEAD")), "got: {:?}", paths);
        assert!(paths.iter().any(|p| p.ends_with(".git/index")), "got: {:?}", paths);
        assert!(paths.iter().any(|p| p.ends_with(&head_ref)), "got: {:?}", paths);
        assert!(paths.iter().all(|p| !p.starts_with(&package)), "got: {:?}", paths);
    }
}
