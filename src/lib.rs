//! Asset Scout: grounded 3D-asset search with a headless host bridge.
//!
//! The search engine itself lives in the `scout_search` workspace crate.
//! This crate layers the application around it:
//!
//! - **Configuration**: TOML file under the config directory, see [`config`]
//! - **History**: the last fifteen queries, persisted as JSON, see [`history`]
//! - **Onboarding**: the one-time introduction flag, see [`onboarding`]
//! - **Host bridge**: newline-delimited JSON commands and events for a
//!   front end, see [`host`]

pub mod config;
pub mod error;
pub mod history;
pub mod host;
pub mod onboarding;
pub mod scout_dirs;

pub use config::AppConfig;
pub use error::{AppError, Result};
pub use history::{HistoryItem, HistoryLog, HistoryStore};
pub use onboarding::{OnboardingState, OnboardingStore};
