//! The oracle boundary.
//!
//! The generative search service is a black box behind [`Oracle`]: it takes
//! an [`OracleRequest`] and returns free text plus the grounding sources it
//! cites. [`GeminiOracle`] talks to the real API; tests substitute a
//! deterministic fake.

pub mod gemini;

pub use gemini::GeminiOracle;

use crate::error::SearchError;
use crate::query::OracleRequest;
use crate::types::GroundingSource;

/// Raw reply from one oracle call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OracleReply {
    /// Free text; expected to embed a JSON object but not guaranteed to.
    pub text: String,
    /// Evidence pages reported out-of-band by the platform.
    pub sources: Vec<GroundingSource>,
}

/// A generative search backend.
///
/// Implementations must be `Send + Sync` so a session can be shared with a
/// host task.
pub trait Oracle: Send + Sync {
    /// Perform one request and return the raw reply.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError`] on transport, authentication or decoding
    /// failures. Empty or non-JSON text is *not* an error at this layer.
    fn fetch_page(
        &self,
        request: &OracleRequest,
    ) -> impl std::future::Future<Output = Result<OracleReply, SearchError>> + Send;

    /// Short name used in logs.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A canned oracle for testing trait bounds and async execution.
    struct CannedOracle {
        reply: Option<OracleReply>,
    }

    impl Oracle for CannedOracle {
        async fn fetch_page(&self, _request: &OracleRequest) -> Result<OracleReply, SearchError> {
            self.reply
                .clone()
                .ok_or_else(|| SearchError::Transport("canned failure".into()))
        }

        fn name(&self) -> &str {
            "canned"
        }
    }

    fn request() -> OracleRequest {
        OracleRequest {
            model: "m".into(),
            system_instruction: String::new(),
            prompt: "p".into(),
            thinking_budget: 0,
            temperature: 0.2,
            grounding: true,
            count: 12,
        }
    }

    #[test]
    fn canned_oracle_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CannedOracle>();
    }

    #[tokio::test]
    async fn canned_oracle_returns_reply() {
        let oracle = CannedOracle {
            reply: Some(OracleReply {
                text: "{}".into(),
                sources: vec![GroundingSource::new("t", "https://fab.com")],
            }),
        };
        let reply = oracle.fetch_page(&request()).await.expect("reply");
        assert_eq!(reply.sources.len(), 1);
        assert_eq!(oracle.name(), "canned");
    }

    #[tokio::test]
    async fn canned_oracle_propagates_errors() {
        let oracle = CannedOracle { reply: None };
        let err = oracle.fetch_page(&request()).await.unwrap_err();
        assert!(err.to_string().contains("canned failure"));
    }
}
