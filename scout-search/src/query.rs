//! Oracle request construction.
//!
//! Turns a page request (topic, count, exclusions, quality mode) into a
//! self-contained [`OracleRequest`]. Building is pure: no I/O, no state.

use serde::Serialize;

use crate::config::ScoutConfig;
use crate::error::SearchError;
use crate::marketplace::{search_expression, site_filters};
use crate::types::QualityMode;

/// What the caller wants from one page.
#[derive(Debug, Clone, PartialEq)]
pub struct PageRequest {
    /// Free-text topic, e.g. "low poly dragon".
    pub query: String,
    /// Exact number of records to ask for.
    pub count: usize,
    /// Display names already accumulated, oldest first.
    pub exclude: Vec<String>,
    pub mode: QualityMode,
}

impl PageRequest {
    /// Request for the first page of a query.
    pub fn first(query: impl Into<String>, mode: QualityMode, config: &ScoutConfig) -> Self {
        Self {
            query: query.into(),
            count: config.first_page_size,
            exclude: Vec::new(),
            mode,
        }
    }

    /// Request for a continuation page excluding `exclude`.
    pub fn next(
        query: impl Into<String>,
        mode: QualityMode,
        exclude: Vec<String>,
        config: &ScoutConfig,
    ) -> Self {
        Self {
            query: query.into(),
            count: config.next_page_size,
            exclude,
            mode,
        }
    }
}

/// A fully-specified oracle call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OracleRequest {
    pub model: String,
    pub system_instruction: String,
    pub prompt: String,
    /// Reasoning tokens to allocate; 0 disables reasoning.
    pub thinking_budget: u32,
    pub temperature: f64,
    /// Ask the oracle to ground its answer with live web search.
    pub grounding: bool,
    /// Records the oracle was asked for; the reconciler enforces it.
    pub count: usize,
}

/// Structured-output shape described to the oracle.
const OUTPUT_SCHEMA: &str = r#"{
  "models": [
    {
      "id": "unique_slug",
      "name": { "zh": "名称", "en": "Name" },
      "platform": "Platform Name",
      "domain": "site.com",
      "description": { "zh": "描述", "en": "Description" },
      "visualSummary": { "zh": "视觉摘要", "en": "Visual summary" },
      "downloadUrl": "VERIFIED_URL_FROM_GROUNDING",
      "price": "$Price or Free",
      "format": "FBX/OBJ/GLB/etc",
      "qualityScore": 1-10,
      "technicalSpecs": [{ "zh": "技术规格", "en": "Technical spec" }]
    }
  ]
}"#;

/// Build the oracle request for `page`.
///
/// Only the most recent `config.exclusion_window` names of `page.exclude`
/// are sent.
///
/// # Errors
///
/// Returns [`SearchError::InvalidQuery`] if the query is blank and
/// [`SearchError::Config`] if `page.count` is zero.
pub fn build_request(page: &PageRequest, config: &ScoutConfig) -> Result<OracleRequest, SearchError> {
    let topic = page.query.trim();
    if topic.is_empty() {
        return Err(SearchError::InvalidQuery("query must not be empty".into()));
    }
    if page.count == 0 {
        return Err(SearchError::Config("requested count must be greater than 0".into()));
    }

    let exclude = exclusion_tail(&page.exclude, config.exclusion_window);

    Ok(OracleRequest {
        model: config.model_for(page.mode).to_owned(),
        system_instruction: system_instruction(page.count),
        prompt: user_prompt(topic, page.count, &exclude),
        thinking_budget: config.thinking_budget_for(page.mode),
        temperature: config.temperature,
        grounding: true,
        count: page.count,
    })
}

/// Returns the last `window` non-blank names, preserving order.
pub fn exclusion_tail(names: &[String], window: usize) -> Vec<String> {
    let names: Vec<&String> = names.iter().filter(|n| !n.trim().is_empty()).collect();
    let start = names.len().saturating_sub(window);
    names[start..].iter().map(|n| n.trim().to_string()).collect()
}

fn user_prompt(topic: &str, count: usize, exclude: &[String]) -> String {
    let mut prompt = format!(
        "Find and analyze exactly {count} unique and high-quality 3D models for the query: \"{topic}\".\n\
         Web search expression: {}\n\
         You MUST explore various platforms from this list: {}.",
        search_expression(topic),
        site_filters().join(", "),
    );
    if !exclude.is_empty() {
        prompt.push_str(&format!(
            "\nIMPORTANT: Do not include any of these models you already found: {}.",
            exclude.join(", ")
        ));
    }
    prompt
}

fn system_instruction(count: usize) -> String {
    format!(
        "You are a Global 3D Asset Scout. Your objective is to find EXACTLY {count} verified 3D models.\n\
         \n\
         STRICT AUDIT PROTOCOL:\n\
         1. QUANTITY GUARANTEE: Return an array of exactly {count} models in your JSON output.\n\
         2. MANDATORY SOURCE TRUTH: Every 'downloadUrl' MUST exist in the search grounding data.\n\
         3. NO DUPLICATES: Each model must be unique and not present in the provided exclusion list.\n\
         4. PLATFORM DIVERSITY: Pull results from multiple different sites to meet the count of {count}.\n\
         5. ACCURACY: If the search data cannot reach {count}, return as many unique, verified models as you can.\n\
         \n\
         Reply with a single JSON object using this OUTPUT SCHEMA:\n{OUTPUT_SCHEMA}"
    )
}
