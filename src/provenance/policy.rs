//! How a reporter reacts to lookup failures

use std::fmt;
use std::str::FromStr;

/// Failure handling applied uniformly to every derived field
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Substitute the `"unknown"` sentinel and keep going
    #[default]
    Lenient,
    /// Return the first lookup failure as an error
    Strict,
}

impl FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(FailurePolicy::Lenient),
            "strict" => Ok(FailurePolicy::Strict),
            other => Err(format!(
                "invalid failure policy '{}': expected 'lenient' or 'strict'",
                other
            )),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailurePolicy::Lenient => write!(f, "lenient"),
            FailurePolicy::Strict => write!(f, "strict"),
        }
    }
}
