//! Generic error handling utilities
//!
//! Lets callers log any crate error with the right level of detail: a specific
//! message when the user can act on it, generic context otherwise.

/// Trait for errors that can distinguish between user-actionable and system errors
///
/// # Implementation Consistency
/// When `is_user_actionable()` returns `true`, `user_message()` should return
/// `Some(message)`. When it returns `false`, `user_message()` should return `None`.
pub trait ContextualError: std::error::Error {
    /// Returns true if this error carries a message the user can act on directly,
    /// such as a missing build-time value that can be injected.
    ///
    /// I/O failures (path resolution, user lookup, file metadata) are system errors.
    fn is_user_actionable(&self) -> bool;

    /// Returns the specific user message if this is a user-actionable error
    fn user_message(&self) -> Option<&str>;
}

/// Log errors with appropriate detail level based on error specificity
///
/// - User-actionable errors log their specific message
/// - System errors log the operation context, with details at debug level
///
/// # Examples
/// ```rust,no_run
/// # use provenance::core::error_handling::log_error_with_context;
/// # use provenance::provenance::api::ProvenanceError;
/// let err = ProvenanceError::RevisionLookup {
///     reason: "no vcs.revision recorded at build time".to_string(),
/// };
/// log_error_with_context(&err, "Resolving build provenance");
/// // Logs: "FATAL: no vcs.revision recorded at build time"
/// ```
pub fn log_error_with_context<E: ContextualError + std::fmt::Display + std::fmt::Debug>(
    error: &E,
    operation_context: &str,
) {
    match error.user_message() {
        Some(user_msg) if error.is_user_actionable() => log::error!("FATAL: {}", user_msg),
        _ => log::error!("FATAL: {}", operation_context),
    }
    log::debug!("DETAIL: {}", error);
    log::debug!("DEBUG_DETAILS: {:?}", error);
}
