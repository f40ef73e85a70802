//! Versioned host command/event envelopes for front-end integration.

use serde::{Deserialize, Serialize};

/// Contract version for host command/event envelopes.
pub const EVENT_VERSION: u32 = 1;

/// Command set understood by the host bridge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandName {
    #[serde(rename = "host.ping")]
    HostPing,
    #[serde(rename = "host.version")]
    HostVersion,
    #[serde(rename = "search.start")]
    SearchStart,
    #[serde(rename = "search.more")]
    SearchMore,
    #[serde(rename = "search.state")]
    SearchState,
    #[serde(rename = "search.filter")]
    SearchFilter,
    #[serde(rename = "history.list")]
    HistoryList,
    #[serde(rename = "history.clear")]
    HistoryClear,
    #[serde(rename = "history.replay")]
    HistoryReplay,
    #[serde(rename = "onboarding.get_state")]
    OnboardingGetState,
    #[serde(rename = "runtime.stop")]
    RuntimeStop,
}

impl CommandName {
    /// Render command name to wire format.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::HostPing => "host.ping",
            Self::HostVersion => "host.version",
            Self::SearchStart => "search.start",
            Self::SearchMore => "search.more",
            Self::SearchState => "search.state",
            Self::SearchFilter => "search.filter",
            Self::HistoryList => "history.list",
            Self::HistoryClear => "history.clear",
            Self::HistoryReplay => "history.replay",
            Self::OnboardingGetState => "onboarding.get_state",
            Self::RuntimeStop => "runtime.stop",
        }
    }

    /// Parse a command name from wire format.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "host.ping" => Some(Self::HostPing),
            "host.version" => Some(Self::HostVersion),
            "search.start" => Some(Self::SearchStart),
            "search.more" => Some(Self::SearchMore),
            "search.state" => Some(Self::SearchState),
            "search.filter" => Some(Self::SearchFilter),
            "history.list" => Some(Self::HistoryList),
            "history.clear" => Some(Self::HistoryClear),
            "history.replay" => Some(Self::HistoryReplay),
            "onboarding.get_state" => Some(Self::OnboardingGetState),
            "runtime.stop" => Some(Self::RuntimeStop),
            _ => None,
        }
    }
}

/// A versioned response envelope from backend host -> frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    pub v: u32,
    pub request_id: String,
    pub ok: bool,
    pub payload: serde_json::Value,
    pub error: Option<String>,
}

impl ResponseEnvelope {
    /// Build a successful response envelope.
    #[must_use]
    pub fn ok(request_id: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: true,
            payload,
            error: None,
        }
    }

    /// Build an error response envelope.
    #[must_use]
    pub fn error(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            ok: false,
            payload: serde_json::Value::Null,
            error: Some(message.into()),
        }
    }
}

/// A versioned command envelope from frontend -> backend host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandEnvelope {
    pub v: u32,
    pub request_id: String,
    pub command: CommandName,
    #[serde(default)]
    pub payload: serde_json::Value,
}

impl CommandEnvelope {
    /// Build a v1 command envelope.
    #[must_use]
    pub fn new(
        request_id: impl Into<String>,
        command: CommandName,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            request_id: request_id.into(),
            command,
            payload,
        }
    }

    /// Validate envelope version and required identifiers.
    pub fn validate(&self) -> Result<(), ContractError> {
        if self.v != EVENT_VERSION {
            return Err(ContractError::new(
                ContractErrorKind::UnsupportedVersion,
                format!(
                    "unsupported contract version {}; expected {}",
                    self.v, EVENT_VERSION
                ),
            ));
        }
        if self.request_id.trim().is_empty() {
            return Err(ContractError::new(
                ContractErrorKind::InvalidEnvelope,
                "request_id cannot be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// A versioned event envelope from backend host -> frontend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventEnvelope {
    pub v: u32,
    pub event_id: String,
    pub event: String,
    pub payload: serde_json::Value,
}

impl EventEnvelope {
    /// Build a v1 event envelope.
    #[must_use]
    pub fn new(
        event_id: impl Into<String>,
        event: impl Into<String>,
        payload: serde_json::Value,
    ) -> Self {
        Self {
            v: EVENT_VERSION,
            event_id: event_id.into(),
            event: event.into(),
            payload,
        }
    }
}

/// Contract validation error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContractErrorKind {
    UnsupportedVersion,
    InvalidEnvelope,
}

/// Contract validation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct ContractError {
    pub kind: ContractErrorKind,
    pub message: String,
}

impl ContractError {
    #[must_use]
    pub fn new(kind: ContractErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [CommandName; 11] = [
        CommandName::HostPing,
        CommandName::HostVersion,
        CommandName::SearchStart,
        CommandName::SearchMore,
        CommandName::SearchState,
        CommandName::SearchFilter,
        CommandName::HistoryList,
        CommandName::HistoryClear,
        CommandName::HistoryReplay,
        CommandName::OnboardingGetState,
        CommandName::RuntimeStop,
    ];

    #[test]
    fn wire_names_agree_with_serde() {
        for command in ALL {
            let json = serde_json::to_string(&command).expect("serialize");
            assert_eq!(json, format!("\"{}\"", command.as_str()));
            assert_eq!(CommandName::parse(command.as_str()), Some(command));
        }
        assert_eq!(CommandName::parse("device.move"), None);
    }

    #[test]
    fn envelope_without_payload_decodes() {
        let env: CommandEnvelope =
            serde_json::from_str(r#"{"v":1,"request_id":"r1","command":"search.more"}"#)
                .expect("decode");
        assert_eq!(env.command, CommandName::SearchMore);
        assert!(env.payload.is_null());
    }

    #[test]
    fn validate_rejects_wrong_version() {
        let mut env = CommandEnvelope::new("r1", CommandName::HostPing, serde_json::json!({}));
        env.v = 2;
        let err = env.validate().unwrap_err();
        assert_eq!(err.kind, ContractErrorKind::UnsupportedVersion);
    }

    #[test]
    fn validate_rejects_blank_request_id() {
        let env = CommandEnvelope::new("  ", CommandName::HostPing, serde_json::json!({}));
        let err = env.validate().unwrap_err();
        assert_eq!(err.kind, ContractErrorKind::InvalidEnvelope);
        assert!(err.to_string().contains("request_id"));
    }
}
