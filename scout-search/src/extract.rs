//! Defensive extraction of structured payloads from oracle free text.
//!
//! The oracle is asked for JSON but may wrap it in prose or a fenced code
//! block, emit trailing commentary, or produce half-formed entries. Nothing
//! here panics on malformed input.

use serde::Deserialize;
use serde_json::Value;

use crate::error::SearchError;
use crate::types::LocalizedText;

/// One `models[]` entry as the oracle described it, before admission.
///
/// Every field is read leniently: a value of the wrong shape degrades to
/// the field's empty form instead of rejecting the entry, so only the
/// admission check decides whether a candidate is kept.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AssetCandidate {
    #[serde(deserialize_with = "lenient::text")]
    pub id: String,
    #[serde(deserialize_with = "lenient::localized")]
    pub name: LocalizedText,
    #[serde(deserialize_with = "lenient::text")]
    pub platform: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub domain: Option<String>,
    #[serde(deserialize_with = "lenient::localized")]
    pub description: LocalizedText,
    #[serde(deserialize_with = "lenient::localized")]
    pub visual_summary: LocalizedText,
    #[serde(deserialize_with = "lenient::text")]
    pub download_url: String,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub price: Option<String>,
    #[serde(deserialize_with = "lenient::opt_text")]
    pub format: Option<String>,
    pub quality_score: Option<Value>,
    #[serde(deserialize_with = "lenient::localized_list")]
    pub technical_specs: Vec<LocalizedText>,
}

/// Shape-tolerant field readers for [`AssetCandidate`].
mod lenient {
    use serde::{Deserialize, Deserializer};
    use serde_json::Value;

    use crate::types::LocalizedText;

    fn scalar(value: &Value) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    fn localized_of(value: &Value) -> LocalizedText {
        match value {
            Value::Object(map) => LocalizedText {
                zh: map.get("zh").and_then(scalar).unwrap_or_default(),
                en: map.get("en").and_then(scalar).unwrap_or_default(),
            },
            other => scalar(other)
                .map(|s| LocalizedText::new(s.clone(), s))
                .unwrap_or_default(),
        }
    }

    pub fn text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
        Ok(scalar(&Value::deserialize(d)?).unwrap_or_default())
    }

    pub fn opt_text<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        Ok(scalar(&Value::deserialize(d)?))
    }

    pub fn localized<'de, D: Deserializer<'de>>(d: D) -> Result<LocalizedText, D::Error> {
        Ok(localized_of(&Value::deserialize(d)?))
    }

    pub fn localized_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<LocalizedText>, D::Error> {
        let specs = match Value::deserialize(d)? {
            Value::Array(items) => items.iter().map(localized_of).collect(),
            other => vec![localized_of(&other)],
        };
        Ok(specs.into_iter().filter(|s| !s.is_blank()).collect())
    }
}

impl AssetCandidate {
    /// Quality score normalised to an integer in `1..=10`.
    ///
    /// Accepts numbers and numeric strings ("8", "7.5"); anything else,
    /// including out-of-range values, yields `None`.
    pub fn normalized_quality(&self) -> Option<u8> {
        let raw = match self.quality_score.as_ref()? {
            Value::Number(n) => n.as_f64()?,
            Value::String(s) => s.trim().parse::<f64>().ok()?,
            _ => return None,
        };
        if !raw.is_finite() {
            return None;
        }
        let rounded = raw.round();
        if (1.0..=10.0).contains(&rounded) {
            Some(rounded as u8)
        } else {
            None
        }
    }
}

/// Locate the JSON object carrying the reply in `text`.
///
/// Every `{` is tried as a starting point in order. The first complete
/// object with a `models` key wins; failing that, the first complete object
/// of any shape. Trailing text after the object is ignored.
pub fn extract_json_object(text: &str) -> Option<Value> {
    let mut first = None;
    for (start, _) in text.match_indices('{') {
        let mut stream = serde_json::Deserializer::from_str(&text[start..]).into_iter::<Value>();
        if let Some(Ok(value @ Value::Object(_))) = stream.next() {
            if value.get("models").is_some() {
                return Some(value);
            }
            first.get_or_insert(value);
        }
    }
    first
}

/// Parse the candidate list out of an oracle reply.
///
/// Entries that are not objects are skipped; fields of the wrong shape are
/// blanked rather than rejecting their entry.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if no JSON object can be found or the
/// object has no `models` array.
pub fn parse_candidates(text: &str) -> Result<Vec<AssetCandidate>, SearchError> {
    let Some(root) = extract_json_object(text) else {
        return Err(SearchError::Parse("no JSON object in oracle reply".into()));
    };
    let Some(entries) = root.get("models").and_then(Value::as_array) else {
        if text.contains("\"models\"") {
            tracing::warn!(len = text.len(), "oracle reply truncated inside the `models` array");
            return Err(SearchError::Parse(
                "oracle reply truncated before the `models` array closed".into(),
            ));
        }
        return Err(SearchError::Parse(
            "oracle reply has no `models` array".into(),
        ));
    };

    let mut candidates = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        if !entry.is_object() {
            tracing::debug!(index, "skipping non-object model entry");
            continue;
        }
        match AssetCandidate::deserialize(entry) {
            Ok(candidate) => candidates.push(candidate),
            Err(e) => {
                tracing::debug!(index, error = %e, "skipping malformed model entry");
            }
        }
    }
    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ENTRY: &str = r#"{"id":"d1","name":{"zh":"龙","en":"Dragon"},"platform":"Sketchfab","downloadUrl":"https://sketchfab.com/3d-models/d1","qualityScore":8}"#;

    #[test]
    fn bare_json_object() {
        let text = format!(r#"{{"models":[{ENTRY}]}}"#);
        let candidates = parse_candidates(&text).expect("parse");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].name.en, "Dragon");
        assert_eq!(candidates[0].download_url, "https://sketchfab.com/3d-models/d1");
    }

    #[test]
    fn object_inside_prose_and_fence() {
        let text = format!("Here are the results:\n```json\n{{\"models\":[{ENTRY}]}}\n```\nEnjoy!");
        assert_eq!(parse_candidates(&text).expect("parse").len(), 1);
    }

    #[test]
    fn trailing_braces_in_commentary_do_not_break_extraction() {
        let text = format!("{{\"models\":[{ENTRY}]}} note: {{not json}}");
        assert_eq!(parse_candidates(&text).expect("parse").len(), 1);
    }

    #[test]
    fn leading_malformed_brace_is_skipped() {
        let text = format!("I found {{some}} models: {{\"models\":[{ENTRY}]}}");
        assert_eq!(parse_candidates(&text).expect("parse").len(), 1);
    }

    #[test]
    fn no_json_is_parse_error() {
        let err = parse_candidates("Sorry, I could not find anything.").unwrap_err();
        assert!(matches!(err, SearchError::Parse(_)));
    }

    #[test]
    fn missing_models_array_is_parse_error() {
        let err = parse_candidates(r#"{"results": []}"#).unwrap_err();
        assert!(err.to_string().contains("models"));
    }

    #[test]
    fn empty_models_array_is_ok() {
        assert!(parse_candidates(r#"{"models": []}"#).expect("parse").is_empty());
    }

    #[test]
    fn non_object_entries_are_skipped() {
        let text = format!(r#"{{"models":[42, "dragon", null, {ENTRY}]}}"#);
        let candidates = parse_candidates(&text).expect("parse");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].id, "d1");
    }

    #[test]
    fn odd_field_shapes_keep_the_entry() {
        let text = r#"{"models":[
            {"id":"a","downloadUrl":"https://sketchfab.com/3d-models/a","price":12},
            {"id":"b","downloadUrl":"https://sketchfab.com/3d-models/b","technicalSpecs":["12k tris", {"zh":"绑定","en":"Rigged"}, ""]},
            {"id":"c","downloadUrl":"https://sketchfab.com/3d-models/c","name":"Dragon"},
            {"id":"d","downloadUrl":"https://sketchfab.com/3d-models/d","domain":null},
            {"id":7,"downloadUrl":"https://sketchfab.com/3d-models/e","description":[1,2],"format":{"x":1}}
        ]}"#;
        let candidates = parse_candidates(text).expect("parse");
        let ids: Vec<&str> = candidates.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d", "7"]);

        assert_eq!(candidates[0].price.as_deref(), Some("12"));
        assert_eq!(
            candidates[1].technical_specs,
            vec![
                LocalizedText::new("12k tris", "12k tris"),
                LocalizedText::new("绑定", "Rigged"),
            ]
        );
        assert_eq!(candidates[2].name, LocalizedText::new("Dragon", "Dragon"));
        assert!(candidates[3].domain.is_none());
        assert!(candidates[4].description.is_blank());
        assert!(candidates[4].format.is_none());
    }

    #[test]
    fn truncated_reply_reports_truncation() {
        let text = format!(r#"{{"models":[{ENTRY},{{"id":"d2","name":{{"zh":"龙"#);
        let err = parse_candidates(&text).unwrap_err();
        assert!(err.to_string().contains("truncated"), "{err}");
    }

    #[test]
    fn object_with_models_preferred_over_earlier_object() {
        let text = format!(r#"Meta: {{"note":"see below"}} then {{"models":[{ENTRY}]}}"#);
        assert_eq!(parse_candidates(&text).expect("parse").len(), 1);
    }

    #[test]
    fn missing_fields_default() {
        let candidates = parse_candidates(r#"{"models":[{"downloadUrl":"https://fab.com/x"}]}"#)
            .expect("parse");
        assert_eq!(candidates[0].id, "");
        assert!(candidates[0].name.is_blank());
        assert!(candidates[0].technical_specs.is_empty());
    }

    #[test]
    fn quality_score_normalisation() {
        let mut c = AssetCandidate {
            quality_score: Some(serde_json::json!(7.6)),
            ..Default::default()
        };
        assert_eq!(c.normalized_quality(), Some(8));
        c.quality_score = Some(serde_json::json!("9"));
        assert_eq!(c.normalized_quality(), Some(9));
        c.quality_score = Some(serde_json::json!(42));
        assert_eq!(c.normalized_quality(), None);
        c.quality_score = Some(serde_json::json!("high"));
        assert_eq!(c.normalized_quality(), None);
        c.quality_score = None;
        assert_eq!(c.normalized_quality(), None);
    }

    #[test]
    fn extract_ignores_top_level_arrays() {
        assert!(extract_json_object("[1, 2, 3]").is_none());
        let value = extract_json_object(r#"[{"a":1}]"#).expect("object");
        assert_eq!(value["a"], 1);
    }
}
