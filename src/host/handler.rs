//! Production host command handler backed by a [`SearchSession`].

use std::sync::{Arc, Mutex, MutexGuard};

use scout_search::{
    FailureKind, Language, Oracle, PendingSearch, QualityMode, SearchOutcome, SearchSession,
    SessionState,
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::AppConfig;
use crate::error::{AppError, Result};
use crate::history::HistoryStore;
use crate::host::channel::ScoutCommandHandler;
use crate::host::contract::EventEnvelope;
use crate::onboarding::OnboardingStore;

/// Handler that runs searches in the background and persists history.
pub struct ScoutHostHandler<O: Oracle + 'static> {
    session: Arc<SearchSession<O>>,
    history: Mutex<HistoryStore>,
    onboarding: OnboardingStore,
    default_mode: QualityMode,
    language: Language,
    tokio_handle: tokio::runtime::Handle,
    event_tx: broadcast::Sender<EventEnvelope>,
}

impl<O: Oracle + 'static> std::fmt::Debug for ScoutHostHandler<O> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScoutHostHandler")
            .field("session", &self.session)
            .field("default_mode", &self.default_mode)
            .finish_non_exhaustive()
    }
}

impl<O: Oracle + 'static> ScoutHostHandler<O> {
    pub fn new(
        session: Arc<SearchSession<O>>,
        history: HistoryStore,
        onboarding: OnboardingStore,
        config: &AppConfig,
        tokio_handle: tokio::runtime::Handle,
        event_tx: broadcast::Sender<EventEnvelope>,
    ) -> Self {
        Self {
            session,
            history: Mutex::new(history),
            onboarding,
            default_mode: config.search.default_mode,
            language: config.ui.language,
            tokio_handle,
            event_tx,
        }
    }

    pub fn session(&self) -> &Arc<SearchSession<O>> {
        &self.session
    }

    fn lock_history(&self) -> Result<MutexGuard<'_, HistoryStore>> {
        self.history
            .lock()
            .map_err(|e| AppError::History(format!("history lock poisoned: {e}")))
    }

    fn emit_event(&self, event: &str, payload: serde_json::Value) {
        emit(&self.event_tx, event, payload);
    }

    /// Run the first page of an already-begun search in the background.
    fn spawn_completion(&self, request_id: &str, pending: PendingSearch) {
        let session = Arc::clone(&self.session);
        let event_tx = self.event_tx.clone();
        let request_id = request_id.to_owned();
        let language = self.language;

        self.tokio_handle.spawn(async move {
            let outcome = session.complete_search(pending).await;
            if outcome == SearchOutcome::Stale {
                return;
            }
            if let SearchOutcome::Failed { failure } = &outcome {
                if failure.kind == FailureKind::EntityNotFound {
                    emit(
                        &event_tx,
                        "credential.invalid",
                        serde_json::json!({"request_id": request_id, "message": failure.message}),
                    );
                }
            }
            let state = session.snapshot();
            emit(
                &event_tx,
                "search.completed",
                serde_json::json!({
                    "request_id": request_id,
                    "outcome": outcome,
                    "state": state_payload(&state, language),
                }),
            );
        });
    }
}

/// Broadcast an event; dropped silently when nobody is listening.
fn emit(event_tx: &broadcast::Sender<EventEnvelope>, event: &str, payload: serde_json::Value) {
    let envelope = EventEnvelope::new(uuid::Uuid::new_v4().to_string(), event.to_owned(), payload);
    let _ = event_tx.send(envelope);
}

/// Render session state plus derived views for a front end.
pub fn state_payload(state: &SessionState, language: Language) -> serde_json::Value {
    let visible_ids: Vec<&str> = state.visible_results().into_iter().map(|r| r.id.as_str()).collect();
    serde_json::json!({
        "state": state,
        "visible_ids": visible_ids,
        "available_formats": state.available_formats(),
        "language": language,
    })
}

impl<O: Oracle + 'static> ScoutCommandHandler for ScoutHostHandler<O> {
    fn start_search(
        &self,
        request_id: &str,
        query: &str,
        mode: Option<QualityMode>,
    ) -> Result<serde_json::Value> {
        let mode = mode.unwrap_or(self.default_mode);
        let pending = self
            .session
            .begin_search(query, mode)
            .map_err(|failure| AppError::Contract(failure.message))?;
        let item = match self.lock_history()?.record(query, mode) {
            Ok(item) => item,
            Err(e) => {
                warn!(error = %e, "failed to persist search history");
                None
            }
        };

        self.emit_event(
            "search.started",
            serde_json::json!({"request_id": request_id, "mode": mode}),
        );
        self.spawn_completion(request_id, pending);
        Ok(serde_json::json!({
            "accepted": true,
            "mode": mode,
            "history_id": item.map(|i| i.id),
        }))
    }

    fn load_more(&self, request_id: &str) -> Result<serde_json::Value> {
        if let Some(reason) = self.session.snapshot().continuation_blocker() {
            return Ok(serde_json::json!({"accepted": false, "reason": reason}));
        }

        let session = Arc::clone(&self.session);
        let event_tx = self.event_tx.clone();
        let request_id = request_id.to_owned();
        let language = self.language;
        self.tokio_handle.spawn(async move {
            let outcome = session.continue_search().await;
            let state = session.snapshot();
            emit(
                &event_tx,
                "search.more_completed",
                serde_json::json!({
                    "request_id": request_id,
                    "outcome": outcome,
                    "state": state_payload(&state, language),
                }),
            );
        });
        Ok(serde_json::json!({"accepted": true}))
    }

    fn query_search_state(&self) -> Result<serde_json::Value> {
        Ok(state_payload(&self.session.snapshot(), self.language))
    }

    fn set_format_filter(&self, format: Option<&str>) -> Result<serde_json::Value> {
        self.session.select_format(format.map(str::to_owned));
        Ok(state_payload(&self.session.snapshot(), self.language))
    }

    fn query_history(&self) -> Result<serde_json::Value> {
        let history = self.lock_history()?;
        Ok(serde_json::json!({"items": history.log().items()}))
    }

    fn clear_history(&self) -> Result<()> {
        self.lock_history()?.clear()?;
        info!("search history cleared");
        self.emit_event("history.cleared", serde_json::json!({}));
        Ok(())
    }

    fn replay_history(&self, request_id: &str, id: &str) -> Result<serde_json::Value> {
        let item = self
            .lock_history()?
            .log()
            .find(id)
            .cloned()
            .ok_or_else(|| AppError::History(format!("unknown history id `{id}`")))?;
        let mut response = self.start_search(request_id, &item.query, Some(item.mode))?;
        response["query"] = serde_json::Value::String(item.query);
        Ok(response)
    }

    fn query_onboarding_state(&self) -> Result<serde_json::Value> {
        let intro_pending = self.onboarding.take_intro_pending()?;
        Ok(serde_json::json!({
            "intro_pending": intro_pending,
            "language": self.language,
            "credential_valid": self.session.snapshot().credential_valid,
        }))
    }

    fn request_runtime_stop(&self) -> Result<()> {
        info!("runtime.stop requested");
        self.emit_event("runtime.stopped", serde_json::json!({"status": "stopped"}));
        Ok(())
    }
}
