//! Host command channel and router.
//!
//! Commands travel from a [`HostCommandClient`] over an mpsc channel to the
//! [`HostCommandServer`], which validates payloads and dispatches to a
//! [`ScoutCommandHandler`]. Long-running work (oracle calls) is started by
//! the handler in the background; its completion arrives as an
//! [`EventEnvelope`] on the broadcast channel.

use scout_search::QualityMode;
use tokio::sync::{broadcast, mpsc, oneshot};

use crate::error::{AppError, Result};
use crate::host::contract::{
    CommandEnvelope, CommandName, EVENT_VERSION, EventEnvelope, ResponseEnvelope,
};

/// Operations the router dispatches to.
pub trait ScoutCommandHandler: Send + Sync + 'static {
    /// Begin a new query; completion is reported as a `search.completed` event.
    fn start_search(
        &self,
        request_id: &str,
        query: &str,
        mode: Option<QualityMode>,
    ) -> Result<serde_json::Value>;
    /// Request the next page; completion is reported as `search.more_completed`.
    fn load_more(&self, request_id: &str) -> Result<serde_json::Value>;
    fn query_search_state(&self) -> Result<serde_json::Value>;
    fn set_format_filter(&self, format: Option<&str>) -> Result<serde_json::Value>;
    fn query_history(&self) -> Result<serde_json::Value>;
    fn clear_history(&self) -> Result<()>;
    /// Re-run a remembered query with its recorded mode.
    fn replay_history(&self, request_id: &str, id: &str) -> Result<serde_json::Value>;
    fn query_onboarding_state(&self) -> Result<serde_json::Value>;
    fn request_runtime_stop(&self) -> Result<()> {
        Ok(())
    }
}

struct HostCommandRequest {
    envelope: CommandEnvelope,
    response_tx: oneshot::Sender<ResponseEnvelope>,
}

#[derive(Clone)]
pub struct HostCommandClient {
    request_tx: mpsc::Sender<HostCommandRequest>,
    event_tx: broadcast::Sender<EventEnvelope>,
}

impl HostCommandClient {
    /// Send a command and wait for its response.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Contract`] for an invalid envelope and
    /// [`AppError::Channel`] if the server has gone away.
    pub async fn send(&self, envelope: CommandEnvelope) -> Result<ResponseEnvelope> {
        envelope.validate().map_err(|e| {
            AppError::Contract(format!(
                "invalid host command envelope {}: {}",
                envelope.request_id, e
            ))
        })?;

        let (response_tx, response_rx) = oneshot::channel();
        self.request_tx
            .send(HostCommandRequest {
                envelope,
                response_tx,
            })
            .await
            .map_err(|e| AppError::Channel(format!("failed to send host command request: {e}")))?;

        response_rx
            .await
            .map_err(|e| AppError::Channel(format!("host command response dropped: {e}")))
    }

    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<EventEnvelope> {
        self.event_tx.subscribe()
    }
}

pub struct HostCommandServer<H: ScoutCommandHandler> {
    request_rx: mpsc::Receiver<HostCommandRequest>,
    handler: H,
}

/// Create a command channel whose events share `event_tx` with the handler.
#[must_use]
pub fn command_channel<H: ScoutCommandHandler>(
    request_capacity: usize,
    event_tx: broadcast::Sender<EventEnvelope>,
    handler: H,
) -> (HostCommandClient, HostCommandServer<H>) {
    let (request_tx, request_rx) = mpsc::channel(request_capacity.max(1));
    (
        HostCommandClient {
            request_tx,
            event_tx,
        },
        HostCommandServer {
            request_rx,
            handler,
        },
    )
}

impl<H: ScoutCommandHandler> HostCommandServer<H> {
    pub async fn run(mut self) {
        while let Some(request) = self.request_rx.recv().await {
            let envelope = &request.envelope;
            let response = self.route(envelope).unwrap_or_else(|e| {
                tracing::warn!(
                    command = envelope.command.as_str(),
                    error = %e,
                    "host command failed"
                );
                ResponseEnvelope::error(envelope.request_id.clone(), e.to_string())
            });
            let _ = request.response_tx.send(response);
        }
    }

    /// Route a command envelope to the appropriate handler.
    pub fn route(&self, envelope: &CommandEnvelope) -> Result<ResponseEnvelope> {
        let request_id = envelope.request_id.clone();
        let payload = &envelope.payload;
        let response = match envelope.command {
            CommandName::HostPing => ResponseEnvelope::ok(request_id, serde_json::json!({"pong": true})),
            CommandName::HostVersion => ResponseEnvelope::ok(
                request_id,
                serde_json::json!({
                    "contract_version": EVENT_VERSION,
                    "app_version": env!("CARGO_PKG_VERSION"),
                }),
            ),
            CommandName::SearchStart => {
                let query = parse_non_empty_field(payload, "query", "search.start")?;
                let mode = parse_optional_mode(payload, "search.start")?;
                let result = self.handler.start_search(&request_id, &query, mode)?;
                ResponseEnvelope::ok(request_id, result)
            }
            CommandName::SearchMore => {
                let result = self.handler.load_more(&request_id)?;
                ResponseEnvelope::ok(request_id, result)
            }
            CommandName::SearchState => {
                ResponseEnvelope::ok(request_id, self.handler.query_search_state()?)
            }
            CommandName::SearchFilter => {
                let format = parse_optional_string(payload, "format", "search.filter")?;
                let result = self.handler.set_format_filter(format.as_deref())?;
                ResponseEnvelope::ok(request_id, result)
            }
            CommandName::HistoryList => {
                ResponseEnvelope::ok(request_id, self.handler.query_history()?)
            }
            CommandName::HistoryClear => {
                self.handler.clear_history()?;
                ResponseEnvelope::ok(request_id, serde_json::json!({"cleared": true}))
            }
            CommandName::HistoryReplay => {
                let id = parse_non_empty_field(payload, "id", "history.replay")?;
                let result = self.handler.replay_history(&request_id, &id)?;
                ResponseEnvelope::ok(request_id, result)
            }
            CommandName::OnboardingGetState => {
                ResponseEnvelope::ok(request_id, self.handler.query_onboarding_state()?)
            }
            CommandName::RuntimeStop => {
                self.handler.request_runtime_stop()?;
                ResponseEnvelope::ok(request_id, serde_json::json!({"accepted": true}))
            }
        };
        Ok(response)
    }
}

fn parse_non_empty_field(payload: &serde_json::Value, field: &str, command: &str) -> Result<String> {
    let Some(raw) = payload.get(field).and_then(serde_json::Value::as_str) else {
        return Err(AppError::Contract(format!("{command} requires payload.{field}")));
    };
    let value = raw.trim();
    if value.is_empty() {
        return Err(AppError::Contract(format!(
            "{command} requires a non-empty payload.{field}"
        )));
    }
    Ok(value.to_owned())
}

fn parse_optional_string(
    payload: &serde_json::Value,
    field: &str,
    command: &str,
) -> Result<Option<String>> {
    match payload.get(field) {
        None | Some(serde_json::Value::Null) => Ok(None),
        Some(serde_json::Value::String(raw)) => {
            let value = raw.trim();
            Ok((!value.is_empty()).then(|| value.to_owned()))
        }
        Some(_) => Err(AppError::Contract(format!(
            "{command} payload.{field} must be a string when provided"
        ))),
    }
}

fn parse_optional_mode(payload: &serde_json::Value, command: &str) -> Result<Option<QualityMode>> {
    let Some(raw) = parse_optional_string(payload, "mode", command)? else {
        return Ok(None);
    };
    serde_json::from_value(serde_json::Value::String(raw.to_ascii_lowercase()))
        .map(Some)
        .map_err(|_| {
            AppError::Contract(format!(
                "unsupported mode `{raw}` (expected standard/expert)"
            ))
        })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used)]

    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingHandler {
        calls: Mutex<Vec<String>>,
    }

    impl RecordingHandler {
        fn record(&self, call: String) {
            self.calls.lock().unwrap().push(call);
        }
    }

    impl ScoutCommandHandler for RecordingHandler {
        fn start_search(
            &self,
            _request_id: &str,
            query: &str,
            mode: Option<QualityMode>,
        ) -> Result<serde_json::Value> {
            self.record(format!("start:{query}:{mode:?}"));
            Ok(serde_json::json!({"accepted": true}))
        }
        fn load_more(&self, _request_id: &str) -> Result<serde_json::Value> {
            self.record("more".into());
            Ok(serde_json::json!({"accepted": true}))
        }
        fn query_search_state(&self) -> Result<serde_json::Value> {
            Ok(serde_json::json!({"results": []}))
        }
        fn set_format_filter(&self, format: Option<&str>) -> Result<serde_json::Value> {
            self.record(format!("filter:{format:?}"));
            Ok(serde_json::json!({"selected_format": format}))
        }
        fn query_history(&self) -> Result<serde_json::Value> {
            Ok(serde_json::json!({"items": []}))
        }
        fn clear_history(&self) -> Result<()> {
            self.record("clear".into());
            Ok(())
        }
        fn replay_history(&self, _request_id: &str, id: &str) -> Result<serde_json::Value> {
            Err(AppError::History(format!("unknown history id `{id}`")))
        }
        fn query_onboarding_state(&self) -> Result<serde_json::Value> {
            Ok(serde_json::json!({"intro_pending": false}))
        }
    }

    fn server() -> HostCommandServer<RecordingHandler> {
        let (event_tx, _) = broadcast::channel(4);
        command_channel(4, event_tx, RecordingHandler::default()).1
    }

    fn env(command: CommandName, payload: serde_json::Value) -> CommandEnvelope {
        CommandEnvelope::new("req-1", command, payload)
    }

    #[test]
    fn ping_pongs() {
        let resp = server().route(&env(CommandName::HostPing, serde_json::json!({}))).unwrap();
        assert!(resp.ok);
        assert_eq!(resp.payload["pong"], true);
    }

    #[test]
    fn search_start_parses_query_and_mode() {
        let server = server();
        server
            .route(&env(
                CommandName::SearchStart,
                serde_json::json!({"query": "  dragon ", "mode": "Expert"}),
            ))
            .unwrap();
        server
            .route(&env(CommandName::SearchStart, serde_json::json!({"query": "tree", "mode": "flash"})))
            .unwrap();
        let calls = server.handler.calls.lock().unwrap();
        assert_eq!(calls[0], "start:dragon:Some(Expert)");
        assert_eq!(calls[1], "start:tree:Some(Standard)");
    }

    #[test]
    fn search_start_requires_query() {
        let err = server()
            .route(&env(CommandName::SearchStart, serde_json::json!({"query": "  "})))
            .unwrap_err();
        assert!(err.to_string().contains("non-empty payload.query"));
    }

    #[test]
    fn search_start_rejects_unknown_mode() {
        let err = server()
            .route(&env(CommandName::SearchStart, serde_json::json!({"query": "x", "mode": "ultra"})))
            .unwrap_err();
        assert!(err.to_string().contains("unsupported mode"));
    }

    #[test]
    fn filter_accepts_null_and_blank_as_clear() {
        let server = server();
        server.route(&env(CommandName::SearchFilter, serde_json::json!({"format": null}))).unwrap();
        server.route(&env(CommandName::SearchFilter, serde_json::json!({"format": " "}))).unwrap();
        server.route(&env(CommandName::SearchFilter, serde_json::json!({"format": "fbx"}))).unwrap();
        let calls = server.handler.calls.lock().unwrap();
        assert_eq!(calls[0], "filter:None");
        assert_eq!(calls[1], "filter:None");
        assert_eq!(calls[2], "filter:Some(\"fbx\")");
    }

    #[test]
    fn filter_rejects_non_string() {
        let err = server()
            .route(&env(CommandName::SearchFilter, serde_json::json!({"format": 3})))
            .unwrap_err();
        assert!(matches!(err, AppError::Contract(_)));
    }

    #[tokio::test]
    async fn handler_errors_become_error_responses() {
        let (event_tx, _) = broadcast::channel(4);
        let (client, server) = command_channel(4, event_tx, RecordingHandler::default());
        let task = tokio::spawn(server.run());

        let resp = client
            .send(env(CommandName::HistoryReplay, serde_json::json!({"id": "nope"})))
            .await
            .unwrap();
        assert!(!resp.ok);
        assert_eq!(resp.request_id, "req-1");
        assert!(resp.error.unwrap().contains("unknown history id"));

        drop(client);
        task.await.unwrap();
    }

    #[tokio::test]
    async fn client_rejects_invalid_envelope() {
        let (event_tx, _) = broadcast::channel(4);
        let (client, _server) = command_channel(4, event_tx, RecordingHandler::default());
        let mut envelope = env(CommandName::HostPing, serde_json::json!({}));
        envelope.v = 9;
        let err = client.send(envelope).await.unwrap_err();
        assert!(matches!(err, AppError::Contract(_)));
    }
}
