//! Revision-control settings embedded at build time
//!
//! `provenance::build::emit()` records what git reported when the crate was compiled as
//! plain key/value pairs (`vcs`, `vcs.revision`, `vcs.time`, `vcs.modified`).

pub const VCS_REVISION: &str = "vcs.revision";
pub const VCS_MODIFIED: &str = "vcs.modified";

/// Ordered key/value build settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildSettings {
    entries: Vec<(String, String)>,
}

impl BuildSettings {
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Commit identifier: the recorded revision, suffixed with `-dirty` when
    /// the working tree had uncommitted changes. `None` without a revision.
    pub fn commit(&self) -> Option<String> {
        let revision = self.get(VCS_REVISION).filter(|r| !r.is_empty())?;
        // Only the literal "true" marks a dirty tree
        if self.get(VCS_MODIFIED) == Some("true") {
            Some(format!("{revision}-dirty"))
        } else {
            Some(revision.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dirty_revision_gets_suffix() {
        let settings =
            BuildSettings::from_pairs([(VCS_REVISION, "abc123"), (VCS_MODIFIED, "true")]);
        assert_eq!(settings.commit().as_deref(), Some("abc123-dirty"));
    }

    #[test]
    fn test_clean_revision_is_used_verbatim() {
        let settings = BuildSettings::from_pairs([
            ("vcs", "git"),
            (VCS_REVISION, "abc123"),
            (VCS_MODIFIED, "false"),
        ]);
        assert_eq!(settings.commit().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_modified_flag_without_revision_yields_nothing() {
        let settings = BuildSettings::from_pairs([(VCS_MODIFIED, "true")]);
        assert_eq!(settings.commit(), None);
        assert_eq!(BuildSettings::default().commit(), None);
    }

    #[test]
    fn test_get_returns_first_match() {
        let settings = BuildSettings::from_pairs([("vcs.time", "2023-01-01T00:00:00Z")]);
        assert_eq!(settings.get("vcs.time"), Some("2023-01-01T00:00:00Z"));
        assert_eq!(settings.get("vcs"), None);
    }
}
