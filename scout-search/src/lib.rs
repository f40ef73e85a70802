//! # scout-search
//!
//! Grounded 3D asset discovery over a generative search oracle.
//!
//! This crate asks a web-grounded language model for downloadable 3D models
//! on a topic and keeps only what the model's own citations (or a known
//! marketplace) can vouch for.
//!
//! ## Design
//!
//! - [`query`] builds self-contained oracle requests from a page request
//! - [`oracle`] abstracts the model behind a trait; [`GeminiOracle`] speaks
//!   the `generateContent` REST API with Google Search grounding
//! - [`reconcile`] extracts JSON from free text, enforces the admission
//!   invariant and the page count, and deduplicates sources
//! - [`session`] accumulates pages for one query with single-flight
//!   continuation and stale-reply rejection
//!
//! ## Security
//!
//! - The API key travels in a header, never in a URL or a log line
//! - Search queries are logged only at trace level
//! - Admitted download URLs always trace back to grounding or an allow-list

pub mod config;
pub mod error;
pub mod extract;
pub mod formats;
pub mod http;
pub mod marketplace;
pub mod normalize;
pub mod oracle;
pub mod query;
pub mod reconcile;
pub mod session;
pub mod types;

pub use config::ScoutConfig;
pub use error::{FailureKind, Result, SearchError};
pub use oracle::{GeminiOracle, Oracle, OracleReply};
pub use query::{OracleRequest, PageRequest};
pub use reconcile::Page;
pub use session::{
    ContinueOutcome, PendingSearch, SearchFailure, SearchOutcome, SearchSession, SessionState,
};
pub use types::{AssetRecord, GroundingSource, Language, LocalizedText, QualityMode};

/// Fetch and reconcile a single page.
///
/// Builds the request for `page`, sends it to `oracle`, and admits at most
/// `page.count` records. Session bookkeeping (ids, termination, exclusions)
/// is left to the caller; see [`SearchSession`] for that.
///
/// # Errors
///
/// Returns [`SearchError::InvalidQuery`] for a blank query, any transport
/// error from the oracle, or [`SearchError::Parse`] if the reply carries no
/// usable payload.
///
/// # Examples
///
/// ```no_run
/// # async fn example() -> scout_search::Result<()> {
/// use scout_search::{GeminiOracle, PageRequest, QualityMode, ScoutConfig};
///
/// let config = ScoutConfig {
///     api_key: Some("my-key".into()),
///     ..Default::default()
/// };
/// let oracle = GeminiOracle::new(&config)?;
/// let page = PageRequest::first("low poly dragon", QualityMode::Standard, &config);
/// let result = scout_search::search_page(&oracle, &page, &config).await?;
/// for record in &result.records {
///     println!("{}: {}", record.name.en, record.download_url);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn search_page<O: Oracle>(
    oracle: &O,
    page: &PageRequest,
    config: &ScoutConfig,
) -> Result<Page> {
    let request = query::build_request(page, config)?;
    let reply = oracle.fetch_page(&request).await?;
    reconcile::reconcile_page(reply, page.count)
}
