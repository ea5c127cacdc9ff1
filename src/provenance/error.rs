//! Provenance Error Types

use std::io;
use std::path::PathBuf;

/// Lookup failures surfaced by a strict reporter
#[derive(Debug, thiserror::Error)]
pub enum ProvenanceError {
    #[error("could not look up path of current executable: {source}")]
    PathResolution { source: io::Error },

    #[error("could not get current user: {source}")]
    UserLookup { source: io::Error },

    #[error("could not stat current executable {}: {source}", path.display())]
    Stat { path: PathBuf, source: io::Error },

    #[error("could not determine source revision: {reason}")]
    RevisionLookup { reason: String },

    #[error("could not determine toolchain: {reason}")]
    ToolchainLookup { reason: String },
}

impl crate::core::error_handling::ContextualError for ProvenanceError {
    fn is_user_actionable(&self) -> bool {
        match self {
            // Fixed by building from a checkout or injecting the value
            ProvenanceError::RevisionLookup { .. } => true,
            ProvenanceError::ToolchainLookup { .. } => true,
            ProvenanceError::PathResolution { .. } => false,
            ProvenanceError::UserLookup { .. } => false,
            ProvenanceError::Stat { .. } => false,
        }
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            ProvenanceError::RevisionLookup { reason }
            | ProvenanceError::ToolchainLookup { reason } => Some(reason),
            _ => None,
        }
    }
}

/// Result type for provenance operations
pub type ProvenanceResult<T> = Result<T, ProvenanceError>;
