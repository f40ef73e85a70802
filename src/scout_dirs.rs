//! Centralized application directory paths for asset-scout.
//!
//! Uses the [`dirs`] crate for platform-appropriate directory resolution.
//!
//! # Directory Layout
//!
//! | Purpose | macOS | Linux |
//! |---------|-------|-------|
//! | App data | `~/Library/Application Support/asset-scout/` | `~/.local/share/asset-scout/` |
//! | Config | `~/Library/Application Support/asset-scout/` | `~/.config/asset-scout/` |
//!
//! # Environment Overrides
//!
//! - `ASSET_SCOUT_DATA_DIR` overrides [`data_dir`]
//! - `ASSET_SCOUT_CONFIG_DIR` overrides [`config_dir`]

use std::path::PathBuf;

const APP_DIR: &str = "asset-scout";

/// Application data root directory.
///
/// Holds search history and the onboarding flag.
///
/// Resolves to `dirs::data_dir()/asset-scout/` by default. Override with
/// the `ASSET_SCOUT_DATA_DIR` environment variable.
#[must_use]
pub fn data_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ASSET_SCOUT_DATA_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::data_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("/tmp/asset-scout-data"))
}

/// Application config directory.
///
/// Resolves to `dirs::config_dir()/asset-scout/` by default. Override with
/// the `ASSET_SCOUT_CONFIG_DIR` environment variable.
#[must_use]
pub fn config_dir() -> PathBuf {
    if let Some(override_dir) = std::env::var_os("ASSET_SCOUT_CONFIG_DIR") {
        return PathBuf::from(override_dir);
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("/tmp/asset-scout-config"))
}

/// Main config file path (`config_dir()/config.toml`).
#[must_use]
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Search history file path (`data_dir()/search_history.json`).
#[must_use]
pub fn history_file() -> PathBuf {
    data_dir().join("search_history.json")
}

/// Onboarding flag file path (`data_dir()/onboarding.json`).
#[must_use]
pub fn onboarding_file() -> PathBuf {
    data_dir().join("onboarding.json")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn files_live_under_their_roots() {
        assert!(config_file().starts_with(config_dir()));
        assert!(history_file().starts_with(data_dir()));
        assert!(onboarding_file().starts_with(data_dir()));
    }

    #[test]
    fn file_names_are_stable() {
        assert!(config_file().ends_with("config.toml"));
        assert!(history_file().ends_with("search_history.json"));
        assert!(onboarding_file().ends_with("onboarding.json"));
    }
}
