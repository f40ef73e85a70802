//! Search configuration with sensible defaults.
//!
//! [`ScoutConfig`] controls which oracle endpoint and models are used, page
//! sizes, continuation thresholds and request behaviour. The defaults match
//! the first-page/next-page contract (12 then 6, continue at 6 and 3).

use crate::error::SearchError;
use crate::types::{Language, QualityMode};

/// Default oracle endpoint.
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Configuration for an asset search session.
///
/// Use [`Default::default()`] for sensible defaults, or construct with
/// field overrides for custom behaviour.
#[derive(Debug, Clone)]
pub struct ScoutConfig {
    /// Base URL of the oracle API.
    pub base_url: String,
    /// API key sent with every oracle request.
    pub api_key: Option<String>,
    /// Model used in [`QualityMode::Standard`].
    pub standard_model: String,
    /// Model used in [`QualityMode::Expert`].
    pub expert_model: String,
    /// Reasoning token budget in expert mode. Standard mode always uses 0.
    pub expert_thinking_budget: u32,
    /// Sampling temperature sent to the oracle.
    pub temperature: f64,
    /// HTTP request timeout in seconds.
    pub timeout_seconds: u64,
    /// Records requested for the first page of a query.
    pub first_page_size: usize,
    /// Records requested for each continuation page.
    pub next_page_size: usize,
    /// Minimum admitted first-page records needed to keep paginating.
    pub first_page_continue_min: usize,
    /// Minimum admitted continuation records needed to keep paginating.
    pub next_page_continue_min: usize,
    /// How many of the most recent accumulated names are sent as exclusions.
    pub exclusion_window: usize,
    /// Language whose display names are sent as exclusions.
    pub exclusion_language: Language,
}

impl Default for ScoutConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: None,
            standard_model: "gemini-3-flash-preview".to_owned(),
            expert_model: "gemini-3-pro-preview".to_owned(),
            expert_thinking_budget: 4000,
            temperature: 0.2,
            timeout_seconds: 120,
            first_page_size: 12,
            next_page_size: 6,
            first_page_continue_min: 6,
            next_page_continue_min: 3,
            exclusion_window: 30,
            exclusion_language: Language::En,
        }
    }
}

impl ScoutConfig {
    /// Returns the model name for `mode`.
    pub fn model_for(&self, mode: QualityMode) -> &str {
        match mode {
            QualityMode::Standard => &self.standard_model,
            QualityMode::Expert => &self.expert_model,
        }
    }

    /// Returns the reasoning budget for `mode`.
    pub fn thinking_budget_for(&self, mode: QualityMode) -> u32 {
        match mode {
            QualityMode::Standard => 0,
            QualityMode::Expert => self.expert_thinking_budget,
        }
    }

    /// Validates this configuration, returning an error if any field is invalid.
    ///
    /// Checks:
    /// - page sizes must be greater than 0
    /// - continuation minimums must not exceed their page size
    /// - `timeout_seconds` must be greater than 0
    /// - `base_url` must be an absolute http(s) URL
    /// - model names must not be empty
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.first_page_size == 0 || self.next_page_size == 0 {
            return Err(SearchError::Config(
                "page sizes must be greater than 0".into(),
            ));
        }
        if self.first_page_continue_min > self.first_page_size {
            return Err(SearchError::Config(
                "first_page_continue_min must be <= first_page_size".into(),
            ));
        }
        if self.next_page_continue_min > self.next_page_size {
            return Err(SearchError::Config(
                "next_page_continue_min must be <= next_page_size".into(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(SearchError::Config(
                "timeout_seconds must be greater than 0".into(),
            ));
        }
        match url::Url::parse(&self.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            _ => {
                return Err(SearchError::Config(format!(
                    "base_url is not an http(s) URL: {}",
                    self.base_url
                )));
            }
        }
        if self.standard_model.trim().is_empty() || self.expert_model.trim().is_empty() {
            return Err(SearchError::Config("model names must not be empty".into()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(SearchError::Config(
                "temperature must be between 0.0 and 2.0".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_paging_contract() {
        let config = ScoutConfig::default();
        assert_eq!(config.first_page_size, 12);
        assert_eq!(config.next_page_size, 6);
        assert_eq!(config.first_page_continue_min, 6);
        assert_eq!(config.next_page_continue_min, 3);
        assert_eq!(config.exclusion_window, 30);
        assert_eq!(config.exclusion_language, Language::En);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn valid_config_passes_validation() {
        assert!(ScoutConfig::default().validate().is_ok());
    }

    #[test]
    fn mode_selects_model_and_budget() {
        let config = ScoutConfig::default();
        assert_eq!(config.model_for(QualityMode::Standard), "gemini-3-flash-preview");
        assert_eq!(config.model_for(QualityMode::Expert), "gemini-3-pro-preview");
        assert_eq!(config.thinking_budget_for(QualityMode::Standard), 0);
        assert_eq!(config.thinking_budget_for(QualityMode::Expert), 4000);
    }

    #[test]
    fn zero_page_size_rejected() {
        let config = ScoutConfig {
            next_page_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("page sizes"));
    }

    #[test]
    fn threshold_above_page_size_rejected() {
        let config = ScoutConfig {
            first_page_continue_min: 13,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("first_page_continue_min"));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = ScoutConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_seconds"));
    }

    #[test]
    fn non_http_base_url_rejected() {
        let config = ScoutConfig {
            base_url: "ftp://example.com".into(),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn empty_model_rejected() {
        let config = ScoutConfig {
            expert_model: " ".into(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn out_of_range_temperature_rejected() {
        let config = ScoutConfig {
            temperature: 3.5,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("temperature"));
    }
}
