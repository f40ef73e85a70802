//! Core types for discovered assets, grounding evidence and query modes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Display language for bilingual fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Simplified Chinese.
    Zh,
    /// English.
    #[default]
    En,
}

/// A string supplied in both Chinese and English.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalizedText {
    pub zh: String,
    pub en: String,
}

impl LocalizedText {
    /// Create a bilingual text pair.
    pub fn new(zh: impl Into<String>, en: impl Into<String>) -> Self {
        Self {
            zh: zh.into(),
            en: en.into(),
        }
    }

    /// Returns the text in `lang`, falling back to the other language when empty.
    pub fn get(&self, lang: Language) -> &str {
        let (primary, fallback) = match lang {
            Language::Zh => (&self.zh, &self.en),
            Language::En => (&self.en, &self.zh),
        };
        if primary.trim().is_empty() {
            fallback
        } else {
            primary
        }
    }

    /// Returns true when both sides are blank.
    pub fn is_blank(&self) -> bool {
        self.zh.trim().is_empty() && self.en.trim().is_empty()
    }
}

/// Quality mode selecting the oracle's capability tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityMode {
    /// Faster model, no reasoning budget.
    #[default]
    #[serde(alias = "flash")]
    Standard,
    /// Higher-capability model with a reasoning budget.
    #[serde(alias = "pro")]
    Expert,
}

impl QualityMode {
    /// Returns the wire name of this mode.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::Expert => "expert",
        }
    }
}

impl fmt::Display for QualityMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A web page the oracle cites as evidence for one page of results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub title: String,
    pub uri: String,
}

impl GroundingSource {
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// One discovered 3D model that passed admission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetRecord {
    /// Identifier, unique within a session.
    pub id: String,
    pub name: LocalizedText,
    pub description: LocalizedText,
    /// Oracle-generated appearance analysis.
    pub visual_summary: LocalizedText,
    /// Marketplace label, e.g. "Sketchfab".
    pub platform: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub download_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<String>,
    /// Free-form format list, e.g. "FBX/OBJ".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Quality score from 1 to 10.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub quality_score: Option<u8>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub technical_specs: Vec<LocalizedText>,
}
