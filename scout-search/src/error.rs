//! Error types for the scout-search crate.
//!
//! All errors use stable string messages suitable for display to users
//! and programmatic handling. No API keys appear in error messages.

use serde::{Deserialize, Serialize};

/// Errors that can occur while querying the oracle or reconciling its reply.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// The caller supplied an empty or whitespace-only query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The oracle rejected our credential.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The oracle reported that the requested entity (model or key) does not exist.
    #[error("requested entity was not found: {0}")]
    EntityNotFound(String),

    /// The oracle could not be reached or answered with a non-success status.
    #[error("transport error: {0}")]
    Transport(String),

    /// The oracle did not answer before the client timeout.
    #[error("oracle timed out: {0}")]
    Timeout(String),

    /// The oracle replied but no usable payload could be extracted.
    #[error("parse error: {0}")]
    Parse(String),
}

/// Coarse failure category surfaced to hosts alongside the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    InvalidQuery,
    Config,
    Auth,
    EntityNotFound,
    Transport,
    Parse,
}

impl SearchError {
    /// Returns the failure category for this error.
    pub fn failure_kind(&self) -> FailureKind {
        match self {
            Self::InvalidQuery(_) => FailureKind::InvalidQuery,
            Self::Config(_) => FailureKind::Config,
            Self::Auth(_) => FailureKind::Auth,
            Self::EntityNotFound(_) => FailureKind::EntityNotFound,
            Self::Transport(_) | Self::Timeout(_) => FailureKind::Transport,
            Self::Parse(_) => FailureKind::Parse,
        }
    }

    /// Returns true if re-issuing the same request may succeed.
    ///
    /// Nothing in this crate retries automatically; hosts use this to decide
    /// whether to offer a retry affordance.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_) | Self::Parse(_))
    }

    /// Returns true if the stored credential should be treated as invalid.
    pub fn invalidates_credential(&self) -> bool {
        matches!(self, Self::EntityNotFound(_))
    }
}

/// Convenience type alias for scout-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
