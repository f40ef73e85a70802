//! Shared HTTP client for oracle requests.

use crate::config::ScoutConfig;
use crate::error::SearchError;
use std::time::Duration;

/// User-Agent sent with every oracle request.
pub const USER_AGENT: &str = concat!("scout-search/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] configured for oracle calls.
///
/// The client has:
/// - Timeout from config
/// - A fixed crate User-Agent
/// - gzip decompression
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the client cannot be constructed.
pub fn build_client(config: &ScoutConfig) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(config.timeout_seconds))
        .user_agent(USER_AGENT)
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Config(format!("failed to build HTTP client: {e}")))
}

/// Map a reqwest transport error onto the crate taxonomy.
pub fn map_transport_error(err: reqwest::Error) -> SearchError {
    if err.is_timeout() {
        SearchError::Timeout(format!("oracle request timed out: {err}"))
    } else {
        SearchError::Transport(format!("oracle request failed: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_with_default_config() {
        assert!(build_client(&ScoutConfig::default()).is_ok());
    }

    #[test]
    fn user_agent_names_the_crate() {
        assert!(USER_AGENT.starts_with("scout-search/"));
    }
}
