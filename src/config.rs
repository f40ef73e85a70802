//! Application configuration persisted as TOML.
//!
//! ```toml
//! [oracle]
//! base_url = "https://generativelanguage.googleapis.com"
//! api_key_env = "GEMINI_API_KEY"
//! standard_model = "gemini-3-flash-preview"
//! expert_model = "gemini-3-pro-preview"
//!
//! [search]
//! first_page_size = 12
//! next_page_size = 6
//!
//! [ui]
//! language = "zh"
//! ```
//!
//! The API key itself is never written to this file; it is read from the
//! environment variable named by `oracle.api_key_env`.

use std::path::{Path, PathBuf};

use scout_search::config::DEFAULT_BASE_URL;
use scout_search::{Language, QualityMode, ScoutConfig};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Env var consulted when the configured one is unset.
pub const FALLBACK_API_KEY_ENV: &str = "API_KEY";

/// Top-level configuration for the asset-scout host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Oracle endpoint, models and request behaviour.
    pub oracle: OracleConfig,
    /// Paging and exclusion settings.
    pub search: SearchSettings,
    /// Presentation preferences.
    pub ui: UiConfig,
}

/// Oracle connection settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleConfig {
    pub base_url: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub standard_model: String,
    pub expert_model: String,
    /// Reasoning budget for expert mode.
    pub expert_thinking_budget: u32,
    pub temperature: f64,
    /// HTTP timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OracleConfig {
    fn default() -> Self {
        let search = ScoutConfig::default();
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key_env: "GEMINI_API_KEY".to_owned(),
            standard_model: search.standard_model,
            expert_model: search.expert_model,
            expert_thinking_budget: search.expert_thinking_budget,
            temperature: search.temperature,
            timeout_seconds: search.timeout_seconds,
        }
    }
}

/// Paging settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub first_page_size: usize,
    pub next_page_size: usize,
    pub first_page_continue_min: usize,
    pub next_page_continue_min: usize,
    pub exclusion_window: usize,
    pub exclusion_language: Language,
    /// Mode used when a `search.start` command does not name one.
    pub default_mode: QualityMode,
}

impl Default for SearchSettings {
    fn default() -> Self {
        let search = ScoutConfig::default();
        Self {
            first_page_size: search.first_page_size,
            next_page_size: search.next_page_size,
            first_page_continue_min: search.first_page_continue_min,
            next_page_continue_min: search.next_page_continue_min,
            exclusion_window: search.exclusion_window,
            exclusion_language: search.exclusion_language,
            default_mode: QualityMode::Standard,
        }
    }
}

/// Presentation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Display language for bilingual fields.
    pub language: Language,
}

impl Default for UiConfig {
    fn default() -> Self {
        Self {
            language: Language::Zh,
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| AppError::Config(e.to_string()))
    }

    /// Save configuration to a TOML file, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written or the config cannot be serialized.
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AppError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Returns the default config file path.
    pub fn default_config_path() -> PathBuf {
        crate::scout_dirs::config_file()
    }

    /// Load from `path` if it exists, otherwise return defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.is_file() {
            Self::from_file(path)
        } else {
            tracing::info!(path = %path.display(), "no config file; using defaults");
            Ok(Self::default())
        }
    }

    /// Build the search configuration, reading the API key from the environment.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Search`] if the resulting configuration is invalid.
    pub fn to_scout_config(&self) -> Result<ScoutConfig> {
        let api_key = read_api_key(&self.oracle.api_key_env);
        self.to_scout_config_with_key(api_key)
    }

    /// Build the search configuration with an explicit API key.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Search`] if the resulting configuration is invalid.
    pub fn to_scout_config_with_key(&self, api_key: Option<String>) -> Result<ScoutConfig> {
        let config = ScoutConfig {
            base_url: self.oracle.base_url.clone(),
            api_key,
            standard_model: self.oracle.standard_model.clone(),
            expert_model: self.oracle.expert_model.clone(),
            expert_thinking_budget: self.oracle.expert_thinking_budget,
            temperature: self.oracle.temperature,
            timeout_seconds: self.oracle.timeout_seconds,
            first_page_size: self.search.first_page_size,
            next_page_size: self.search.next_page_size,
            first_page_continue_min: self.search.first_page_continue_min,
            next_page_continue_min: self.search.next_page_continue_min,
            exclusion_window: self.search.exclusion_window,
            exclusion_language: self.search.exclusion_language,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Read a non-empty API key from `var`, falling back to [`FALLBACK_API_KEY_ENV`].
fn read_api_key(var: &str) -> Option<String> {
    [var, FALLBACK_API_KEY_ENV]
        .into_iter()
        .filter(|name| !name.trim().is_empty())
        .find_map(|name| {
            std::env::var(name)
                .ok()
                .map(|v| v.trim().to_owned())
                .filter(|v| !v.is_empty())
        })
}
