use thiserror::Error;

/// Error types for lead dispatch operations
///
/// Covers rule administration failures, break-state transition failures,
/// and configuration problems. Note that an unmatched lead (`NoMatch`) and
/// a fully-busy roster (`AllBusy`) are *not* errors; they are terminal
/// dispatch outcomes surfaced through
/// [`DispatchOutcome`](crate::dispatch::DispatchOutcome).
///
/// # Examples
///
/// ```
/// use leadroute_dispatch_engine::{DispatchError, Result};
///
/// fn activate(roster_len: usize) -> Result<()> {
///     if roster_len == 0 {
///         return Err(DispatchError::invalid_rule("active rule needs at least one agent"));
///     }
///     Ok(())
/// }
///
/// assert!(activate(0).is_err());
/// ```
#[derive(Error, Debug)]
pub enum DispatchError {
    /// Rule validation failures
    ///
    /// An active rule with an empty agent roster, a roster exceeding the
    /// configured cap, or a criteria set exceeding the per-dimension cap.
    #[error("Invalid rule: {0}")]
    InvalidRule(String),

    /// Requested rule or agent id is unknown
    #[error("Not found: {0}")]
    NotFound(String),

    /// `start_break` was called while the agent is already on break
    #[error("Already on break: {0}")]
    AlreadyOnBreak(String),

    /// `end_break` was called while the agent has no open break
    #[error("Not on break: {0}")]
    NotOnBreak(String),

    /// Configuration validation and parsing errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Unexpected internal errors
    ///
    /// Indicates a bug or corrupted engine state rather than bad input.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<anyhow::Error> for DispatchError {
    fn from(err: anyhow::Error) -> Self {
        // Map anyhow errors to Internal by default, as they are usually
        // unexpected errors from lower-level components.
        Self::Internal(err.to_string())
    }
}

impl DispatchError {
    /// Create a new InvalidRule error with the provided message
    pub fn invalid_rule<S: Into<String>>(msg: S) -> Self {
        Self::InvalidRule(msg.into())
    }

    /// Create a new NotFound error with the provided message
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create a new AlreadyOnBreak error with the provided message
    pub fn already_on_break<S: Into<String>>(msg: S) -> Self {
        Self::AlreadyOnBreak(msg.into())
    }

    /// Create a new NotOnBreak error with the provided message
    pub fn not_on_break<S: Into<String>>(msg: S) -> Self {
        Self::NotOnBreak(msg.into())
    }

    /// Create a new Configuration error with the provided message
    pub fn configuration<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a new Internal error with the provided message
    pub fn internal<S: Into<String>>(msg: S) -> Self {
        Self::Internal(msg.into())
    }
}

/// Result type for dispatch engine operations
pub type Result<T> = std::result::Result<T, DispatchError>;
