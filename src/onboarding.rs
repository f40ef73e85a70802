//! First-run introduction flag.
//!
//! Persisted as `onboarding.json` (`{"intro_shown": bool}`) under the data
//! directory so the introduction is offered once per installation.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::history::write_json_atomic;

/// Persisted onboarding state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OnboardingState {
    pub intro_shown: bool,
}

/// File-backed onboarding flag.
#[derive(Debug)]
pub struct OnboardingStore {
    path: PathBuf,
}

impl OnboardingStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the default location.
    pub fn at_default_path() -> Self {
        Self::new(crate::scout_dirs::onboarding_file())
    }

    /// Current state; unreadable or malformed files read as "not shown".
    pub fn state(&self) -> OnboardingState {
        match std::fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %self.path.display(), error = %e, "ignoring malformed onboarding state");
                OnboardingState::default()
            }),
            Err(_) => OnboardingState::default(),
        }
    }

    /// Returns true exactly once: the first call after which the intro
    /// is recorded as shown.
    ///
    /// # Errors
    ///
    /// Returns an error if the flag cannot be persisted.
    pub fn take_intro_pending(&self) -> Result<bool> {
        if self.state().intro_shown {
            return Ok(false);
        }
        write_json_atomic(&self.path, &OnboardingState { intro_shown: true })?;
        tracing::info!("first run; introduction marked as shown");
        Ok(true)
    }
}
