//! Paged search sessions.
//!
//! [`SessionState`] holds everything a host renders for the current query:
//! accumulated records, grounding sources and pagination flags. Its
//! transition methods are pure (no I/O) so they can be tested without an
//! oracle. [`SearchSession`] drives those transitions around oracle calls.
//!
//! # Lifecycle
//!
//! ```text
//! initiate_search ──► begin_search ──(oracle)──► apply_first_page
//! continue_search ──► begin_continuation ──(oracle)──► apply_next_page
//! ```
//!
//! Every query bumps `generation`. Replies are applied only if they carry
//! the current generation; anything older is dropped as stale.

use std::collections::HashSet;
use std::sync::Mutex;

use serde::Serialize;

use crate::config::ScoutConfig;
use crate::error::{FailureKind, SearchError};
use crate::formats::{available_formats, filter_by_format};
use crate::oracle::Oracle;
use crate::query::{exclusion_tail, PageRequest};
use crate::reconcile::{assign_unique_ids, merge_sources, Page};
use crate::types::{AssetRecord, GroundingSource, QualityMode};

/// A failure recorded in session state for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl From<&SearchError> for SearchFailure {
    fn from(err: &SearchError) -> Self {
        Self {
            kind: err.failure_kind(),
            message: err.to_string(),
        }
    }
}

/// Non-fatal conditions worth telling the user about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Notice {
    /// The first page admitted nothing.
    NoResults,
}

/// Result of [`SearchSession::initiate_search`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    /// At least one record was admitted.
    Results { admitted: usize, no_more_results: bool },
    /// The oracle answered but nothing was admitted.
    NoResults,
    /// Transport, auth or parse failure.
    Failed { failure: SearchFailure },
    /// A newer query started before this reply arrived.
    Stale,
}

/// Why a continuation was not issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No query has completed yet, or the first page is still loading.
    NotReady,
    /// A continuation is already outstanding.
    InFlight,
    /// Termination state is set.
    Exhausted,
}

/// Result of [`SearchSession::continue_search`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ContinueOutcome {
    /// Nothing was sent.
    Skipped { reason: SkipReason },
    /// Records were appended.
    Appended {
        admitted: usize,
        sources_added: usize,
        no_more_results: bool,
    },
    /// The page admitted nothing; pagination is over.
    Exhausted,
    /// The call failed; state is unchanged and the caller may retry.
    SoftFailed { failure: SearchFailure },
    /// A newer query started before this reply arrived.
    Stale,
}

/// A continuation page ready to send.
#[derive(Debug, Clone, PartialEq)]
pub struct Continuation {
    pub generation: u64,
    pub page: PageRequest,
}

/// A first-page request whose state reset has already been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingSearch {
    pub generation: u64,
    pub page: PageRequest,
}

/// Everything a host needs to render the current query.
#[derive(Debug, Clone, Serialize)]
pub struct SessionState {
    pub generation: u64,
    pub query: String,
    pub mode: QualityMode,
    pub results: Vec<AssetRecord>,
    pub sources: Vec<GroundingSource>,
    pub no_more_results: bool,
    pub is_loading: bool,
    pub is_loading_more: bool,
    pub has_searched: bool,
    pub error: Option<SearchFailure>,
    pub notice: Option<Notice>,
    /// Cleared when the oracle reports the credential's entity is missing.
    pub credential_valid: bool,
    pub selected_format: Option<String>,
    #[serde(skip)]
    ids: HashSet<String>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            generation: 0,
            query: String::new(),
            mode: QualityMode::default(),
            results: Vec::new(),
            sources: Vec::new(),
            no_more_results: false,
            is_loading: false,
            is_loading_more: false,
            has_searched: false,
            error: None,
            notice: None,
            credential_valid: true,
            selected_format: None,
            ids: HashSet::new(),
        }
    }
}

impl SessionState {
    /// Reset for a new query and return its generation.
    ///
    /// Results, sources, termination, error and format filter are cleared
    /// immediately, before any reply arrives.
    pub fn begin_search(&mut self, query: &str, mode: QualityMode) -> u64 {
        self.generation += 1;
        self.query = query.trim().to_string();
        self.mode = mode;
        self.results.clear();
        self.sources.clear();
        self.ids.clear();
        self.no_more_results = false;
        self.is_loading = true;
        self.is_loading_more = false;
        self.has_searched = false;
        self.error = None;
        self.notice = None;
        self.selected_format = None;
        self.generation
    }

    /// Apply the first page of the query tagged `generation`.
    pub fn apply_first_page(
        &mut self,
        generation: u64,
        outcome: Result<Page, SearchError>,
        config: &ScoutConfig,
    ) -> SearchOutcome {
        if generation != self.generation {
            return SearchOutcome::Stale;
        }
        self.is_loading = false;
        self.has_searched = true;

        match outcome {
            Ok(mut page) => {
                self.credential_valid = true;
                let admitted = page.admitted();
                assign_unique_ids(&mut page.records, &mut self.ids);
                self.results = page.records;
                merge_sources(&mut self.sources, page.sources);
                self.no_more_results = admitted < config.first_page_continue_min;
                if admitted == 0 {
                    self.notice = Some(Notice::NoResults);
                    SearchOutcome::NoResults
                } else {
                    SearchOutcome::Results {
                        admitted,
                        no_more_results: self.no_more_results,
                    }
                }
            }
            Err(err) => {
                if err.invalidates_credential() {
                    self.credential_valid = false;
                }
                self.no_more_results = true;
                let failure = SearchFailure::from(&err);
                self.error = Some(failure.clone());
                SearchOutcome::Failed { failure }
            }
        }
    }

    /// Why a continuation would be refused right now, if it would.
    pub fn continuation_blocker(&self) -> Option<SkipReason> {
        if self.is_loading || !self.has_searched || self.query.is_empty() {
            Some(SkipReason::NotReady)
        } else if self.is_loading_more {
            Some(SkipReason::InFlight)
        } else if self.no_more_results {
            Some(SkipReason::Exhausted)
        } else {
            None
        }
    }

    /// Claim the single continuation slot, or explain why not.
    pub fn begin_continuation(&mut self, config: &ScoutConfig) -> Result<Continuation, SkipReason> {
        if let Some(reason) = self.continuation_blocker() {
            return Err(reason);
        }

        let names: Vec<String> = self
            .results
            .iter()
            .map(|r| r.name.get(config.exclusion_language).to_string())
            .collect();
        let exclude = exclusion_tail(&names, config.exclusion_window);

        self.is_loading_more = true;
        self.error = None;
        Ok(Continuation {
            generation: self.generation,
            page: PageRequest::next(self.query.clone(), self.mode, exclude, config),
        })
    }

    /// Apply a continuation page of the query tagged `generation`.
    pub fn apply_next_page(
        &mut self,
        generation: u64,
        outcome: Result<Page, SearchError>,
        config: &ScoutConfig,
    ) -> ContinueOutcome {
        if generation != self.generation {
            return ContinueOutcome::Stale;
        }
        self.is_loading_more = false;

        let mut page = match outcome {
            Ok(page) => page,
            Err(err) => {
                tracing::warn!(error = %err, "load-more failed; keeping current results");
                return ContinueOutcome::SoftFailed {
                    failure: SearchFailure::from(&err),
                };
            }
        };

        let admitted = page.admitted();
        if admitted == 0 {
            self.no_more_results = true;
            return ContinueOutcome::Exhausted;
        }

        assign_unique_ids(&mut page.records, &mut self.ids);
        self.results.extend(page.records);
        let sources_added = merge_sources(&mut self.sources, page.sources);
        self.no_more_results = self.no_more_results || admitted < config.next_page_continue_min;

        ContinueOutcome::Appended {
            admitted,
            sources_added,
            no_more_results: self.no_more_results,
        }
    }

    /// Results after the format filter.
    pub fn visible_results(&self) -> Vec<&AssetRecord> {
        filter_by_format(&self.results, self.selected_format.as_deref())
    }

    /// Format facets available for the current results.
    pub fn available_formats(&self) -> Vec<String> {
        available_formats(&self.results)
    }
}

/// Drives a [`SessionState`] against an [`Oracle`].
///
/// Methods take `&self`; the state lock is never held across an oracle
/// call, so a host may read snapshots while a page is in flight.
pub struct SearchSession<O: Oracle> {
    oracle: O,
    config: ScoutConfig,
    state: Mutex<SessionState>,
}

impl<O: Oracle> std::fmt::Debug for SearchSession<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SearchSession")
            .field("oracle", &self.oracle.name())
            .finish_non_exhaustive()
    }
}

impl<O: Oracle> SearchSession<O> {
    /// Create a session after validating `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the configuration is invalid.
    pub fn new(oracle: O, config: ScoutConfig) -> Result<Self, SearchError> {
        config.validate()?;
        Ok(Self {
            oracle,
            config,
            state: Mutex::new(SessionState::default()),
        })
    }

    pub fn config(&self) -> &ScoutConfig {
        &self.config
    }

    fn with_state<T>(&self, f: impl FnOnce(&mut SessionState) -> T) -> T {
        let mut guard = self.state.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }

    /// A copy of the current state.
    pub fn snapshot(&self) -> SessionState {
        self.with_state(|s| s.clone())
    }

    /// Select a format facet (`None` shows everything).
    pub fn select_format(&self, format: Option<String>) {
        let format = format
            .map(|f| f.trim().to_ascii_uppercase())
            .filter(|f| !f.is_empty());
        self.with_state(|s| s.selected_format = format);
    }

    /// Start a new query, abandoning whatever was in flight.
    ///
    /// Equivalent to [`begin_search`](Self::begin_search) followed by
    /// [`complete_search`](Self::complete_search). A blank query is
    /// rejected without touching state.
    pub async fn initiate_search(&self, query: &str, mode: QualityMode) -> SearchOutcome {
        match self.begin_search(query, mode) {
            Ok(pending) => self.complete_search(pending).await,
            Err(failure) => SearchOutcome::Failed { failure },
        }
    }

    /// Reset state for `query` and claim a new generation, without any I/O.
    ///
    /// After this returns, snapshots show the new query loading with an
    /// empty result set and continuations are refused until the first page
    /// is applied.
    ///
    /// # Errors
    ///
    /// Returns an `InvalidQuery` failure for a blank query; state is left
    /// untouched.
    pub fn begin_search(&self, query: &str, mode: QualityMode) -> Result<PendingSearch, SearchFailure> {
        let query = query.trim();
        if query.is_empty() {
            return Err(SearchFailure::from(&SearchError::InvalidQuery(
                "query must not be empty".into(),
            )));
        }
        let generation = self.with_state(|s| s.begin_search(query, mode));
        tracing::trace!(query, %mode, generation, "initiating search");
        Ok(PendingSearch {
            generation,
            page: PageRequest::first(query, mode, &self.config),
        })
    }

    /// Fetch and apply the first page claimed by [`begin_search`](Self::begin_search).
    pub async fn complete_search(&self, pending: PendingSearch) -> SearchOutcome {
        let PendingSearch { generation, page } = pending;
        let outcome = self.fetch(&page).await;

        let result = self.with_state(|s| s.apply_first_page(generation, outcome, &self.config));
        match &result {
            SearchOutcome::Stale => {
                tracing::debug!(generation, "discarding stale first page");
            }
            SearchOutcome::Failed { failure } => {
                tracing::warn!(kind = ?failure.kind, message = %failure.message, "search failed");
            }
            other => tracing::debug!(generation, outcome = ?other, "first page applied"),
        }
        result
    }

    /// Fetch and merge the next page, if pagination is still open.
    ///
    /// Single-flight: while one continuation is outstanding, or once
    /// termination is set, this returns [`ContinueOutcome::Skipped`].
    pub async fn continue_search(&self) -> ContinueOutcome {
        let continuation = match self.with_state(|s| s.begin_continuation(&self.config)) {
            Ok(c) => c,
            Err(reason) => return ContinueOutcome::Skipped { reason },
        };
        let outcome = self.fetch(&continuation.page).await;

        let result = self.with_state(|s| {
            s.apply_next_page(continuation.generation, outcome, &self.config)
        });
        tracing::debug!(generation = continuation.generation, outcome = ?result, "continuation applied");
        result
    }

    async fn fetch(&self, page: &PageRequest) -> Result<Page, SearchError> {
        crate::search_page(&self.oracle, page, &self.config).await
    }
}
