//! Gemini `generateContent` adapter with Google Search grounding.
//!
//! # Request
//!
//! ```text
//! POST {base_url}/v1beta/models/{model}:generateContent
//! x-goog-api-key: <key>
//! { contents, systemInstruction, tools: [{google_search: {}}], generationConfig }
//! ```
//!
//! # Reply
//!
//! Text is the concatenation of `candidates[0].content.parts[].text`;
//! sources are `candidates[0].groundingMetadata.groundingChunks[].web`.

use serde::Deserialize;
use serde_json::json;

use super::{Oracle, OracleReply};
use crate::config::ScoutConfig;
use crate::error::SearchError;
use crate::http::{build_client, map_transport_error};
use crate::query::OracleRequest;
use crate::types::GroundingSource;

/// Marker the API uses for unknown models and unusable keys.
const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

/// Oracle backed by the Gemini API.
pub struct GeminiOracle {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl std::fmt::Debug for GeminiOracle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiOracle")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiOracle {
    /// Create an oracle from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if no API key is configured or the
    /// HTTP client cannot be built.
    pub fn new(config: &ScoutConfig) -> Result<Self, SearchError> {
        let api_key = config
            .api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .ok_or_else(|| SearchError::Config("no oracle API key configured".into()))?
            .to_owned();
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_owned(),
            api_key,
            client: build_client(config)?,
        })
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/v1beta/models/{model}:generateContent", self.base_url)
    }

    /// Map an HTTP error status to the appropriate [`SearchError`].
    fn map_http_error(status: reqwest::StatusCode, body: &str) -> SearchError {
        let message = extract_error_message(body);
        if status == reqwest::StatusCode::NOT_FOUND || message.contains(ENTITY_NOT_FOUND) {
            return SearchError::EntityNotFound(message);
        }
        match status.as_u16() {
            401 | 403 => SearchError::Auth(format!("oracle rejected credential: {message}")),
            429 => SearchError::Transport(format!("oracle rate limited: {message}")),
            code => SearchError::Transport(format!("oracle HTTP {code}: {message}")),
        }
    }
}

/// Build the JSON body for `request`.
pub fn build_body(request: &OracleRequest) -> serde_json::Value {
    let mut generation = json!({ "temperature": request.temperature });
    if request.thinking_budget > 0 {
        generation["thinkingConfig"] = json!({ "thinkingBudget": request.thinking_budget });
    }

    let mut body = json!({
        "contents": [{ "role": "user", "parts": [{ "text": request.prompt }] }],
        "systemInstruction": { "parts": [{ "text": request.system_instruction }] },
        "generationConfig": generation,
    });
    if request.grounding {
        body["tools"] = json!([{ "google_search": {} }]);
    }
    body
}

/// Extract an error message from a Gemini error response body.
fn extract_error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("error")
                .and_then(|e| e.get("message"))
                .and_then(|m| m.as_str())
                .map(String::from)
        })
        .unwrap_or_else(|| body.trim().to_string())
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Content {
    parts: Vec<Part>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Part {
    text: Option<String>,
    thought: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct GroundingMetadata {
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

/// Convert a decoded `generateContent` response into an [`OracleReply`].
///
/// Reasoning parts (`thought: true`) are excluded from the text. Grounding
/// chunks without both a title and a URI are dropped.
pub fn reply_from_json(raw: &str) -> Result<OracleReply, SearchError> {
    let response: GenerateResponse = serde_json::from_str(raw)
        .map_err(|e| SearchError::Parse(format!("undecodable oracle response: {e}")))?;

    let Some(first) = response.candidates.into_iter().next() else {
        return Ok(OracleReply::default());
    };

    let text = first
        .content
        .map(|c| {
            c.parts
                .into_iter()
                .filter(|p| p.thought != Some(true))
                .filter_map(|p| p.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    let sources = first
        .grounding_metadata
        .map(|g| {
            g.grounding_chunks
                .into_iter()
                .filter_map(|chunk| chunk.web)
                .filter_map(|web| match (web.title, web.uri) {
                    (Some(title), Some(uri)) if !title.trim().is_empty() && !uri.trim().is_empty() => {
                        Some(GroundingSource::new(title, uri))
                    }
                    _ => None,
                })
                .collect()
        })
        .unwrap_or_default();

    Ok(OracleReply { text, sources })
}

impl Oracle for GeminiOracle {
    async fn fetch_page(&self, request: &OracleRequest) -> Result<OracleReply, SearchError> {
        let url = self.endpoint(&request.model);
        let body = build_body(request);
        tracing::trace!(model = %request.model, prompt = %request.prompt, "sending oracle request");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let text = response.text().await.map_err(map_transport_error)?;
        if !status.is_success() {
            let err = Self::map_http_error(status, &text);
            tracing::warn!(status = status.as_u16(), error = %err, "oracle returned an error");
            return Err(err);
        }

        let reply = reply_from_json(&text)?;
        tracing::debug!(
            model = %request.model,
            text_len = reply.text.len(),
            sources = reply.sources.len(),
            "oracle replied"
        );
        Ok(reply)
    }

    fn name(&self) -> &str {
        "gemini"
    }
}
