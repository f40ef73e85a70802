//! File-format facets over a result set.
//!
//! Formats arrive as free text ("FBX/OBJ", "glTF, Blend", "MAX 2019"), so
//! facets are derived by tokenising rather than trusting a fixed list.

use std::collections::BTreeSet;

use crate::types::AssetRecord;

/// Shortest accepted format token.
const MIN_TOKEN_LEN: usize = 2;
/// Longest accepted format token.
const MAX_TOKEN_LEN: usize = 7;

/// Distinct, sorted, uppercased format tokens present in `records`.
pub fn available_formats(records: &[AssetRecord]) -> Vec<String> {
    let mut formats = BTreeSet::new();
    for format in records.iter().filter_map(|r| r.format.as_deref()) {
        for part in format.split([',', '/', ' ']) {
            let clean: String = part
                .chars()
                .filter(char::is_ascii_alphanumeric)
                .collect::<String>()
                .to_ascii_uppercase();
            if (MIN_TOKEN_LEN..=MAX_TOKEN_LEN).contains(&clean.len()) {
                formats.insert(clean);
            }
        }
    }
    formats.into_iter().collect()
}

/// Records whose format mentions `selected`; `None` keeps everything.
pub fn filter_by_format<'a>(records: &'a [AssetRecord], selected: Option<&str>) -> Vec<&'a AssetRecord> {
    let Some(selected) = selected.map(str::to_ascii_uppercase) else {
        return records.iter().collect();
    };
    records
        .iter()
        .filter(|r| {
            r.format
                .as_deref()
                .is_some_and(|f| f.to_ascii_uppercase().contains(&selected))
        })
        .collect()
}
