//! Result reconciliation: admission, truncation, identifier and source dedup.
//!
//! A page of oracle output is reduced to records that can be trusted:
//! every admitted download URL is either cited by the page's grounding
//! sources or hosted on a known marketplace. Rejections are silent (debug
//! log only); they are oracle noise, not errors.

use std::collections::HashSet;

use crate::error::SearchError;
use crate::extract::{parse_candidates, AssetCandidate};
use crate::marketplace::is_known_marketplace;
use crate::normalize::uri_key;
use crate::oracle::OracleReply;
use crate::types::{AssetRecord, GroundingSource};

/// One reconciled page: admitted records plus the page's own sources.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    pub records: Vec<AssetRecord>,
    pub sources: Vec<GroundingSource>,
}

impl Page {
    /// Number of admitted records.
    pub fn admitted(&self) -> usize {
        self.records.len()
    }
}

/// Returns true if `download_url` satisfies the admission invariant.
pub fn is_admissible(download_url: &str, verified: &HashSet<String>) -> bool {
    let url = download_url.trim();
    if url.is_empty() {
        return false;
    }
    verified.contains(&uri_key(url)) || is_known_marketplace(url)
}

/// Filter `candidates` by the admission invariant, then truncate to `count`.
pub fn admit(
    candidates: Vec<AssetCandidate>,
    sources: &[GroundingSource],
    count: usize,
) -> Vec<AssetRecord> {
    let verified: HashSet<String> = sources.iter().map(|s| uri_key(&s.uri)).collect();
    let offered = candidates.len();

    let records: Vec<AssetRecord> = candidates
        .into_iter()
        .filter(|c| {
            let ok = is_admissible(&c.download_url, &verified);
            if !ok {
                tracing::debug!(url = %c.download_url, "discarding unverifiable candidate");
            }
            ok
        })
        .take(count)
        .map(into_record)
        .collect();

    tracing::debug!(offered, admitted = records.len(), count, "admission complete");
    records
}

fn into_record(candidate: AssetCandidate) -> AssetRecord {
    let quality_score = candidate.normalized_quality();
    AssetRecord {
        id: candidate.id.trim().to_string(),
        name: candidate.name,
        description: candidate.description,
        visual_summary: candidate.visual_summary,
        platform: candidate.platform.trim().to_string(),
        domain: non_blank(candidate.domain),
        download_url: candidate.download_url.trim().to_string(),
        price: non_blank(candidate.price),
        format: non_blank(candidate.format),
        quality_score,
        technical_specs: candidate
            .technical_specs
            .into_iter()
            .filter(|s| !s.is_blank())
            .collect(),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Append `incoming` sources whose URI is not already present.
///
/// Duplicates within `incoming` are dropped too; the first occurrence wins.
/// Returns the number of sources added.
pub fn merge_sources(existing: &mut Vec<GroundingSource>, incoming: Vec<GroundingSource>) -> usize {
    let mut seen: HashSet<String> = existing.iter().map(|s| uri_key(&s.uri)).collect();
    let before = existing.len();
    for source in incoming {
        if seen.insert(uri_key(&source.uri)) {
            existing.push(source);
        }
    }
    existing.len() - before
}

/// Give every record an identifier not present in `taken`, recording it.
///
/// Blank ids are derived from the download URL's last path segment;
/// collisions get a `-2`, `-3`, ... suffix.
pub fn assign_unique_ids(records: &mut [AssetRecord], taken: &mut HashSet<String>) {
    for record in records.iter_mut() {
        let base = if record.id.is_empty() {
            slug_from_url(&record.download_url)
        } else {
            record.id.clone()
        };
        let mut candidate = base.clone();
        let mut n = 2;
        while taken.contains(&candidate) {
            candidate = format!("{base}-{n}");
            n += 1;
        }
        taken.insert(candidate.clone());
        record.id = candidate;
    }
}

fn slug_from_url(raw: &str) -> String {
    let segment = url::Url::parse(raw)
        .ok()
        .and_then(|u| {
            u.path_segments()
                .and_then(|mut segs| segs.rfind(|s| !s.is_empty()).map(str::to_string))
        })
        .unwrap_or_default();
    let slug: String = segment
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-");
    if slug.is_empty() {
        "asset".to_string()
    } else {
        slug
    }
}

/// Reconcile one oracle reply into a [`Page`] bounded by `count`.
///
/// Grounding sources are deduplicated within the page.
///
/// # Errors
///
/// Returns [`SearchError::Parse`] if the reply holds no usable payload.
pub fn reconcile_page(reply: OracleReply, count: usize) -> Result<Page, SearchError> {
    let candidates = parse_candidates(&reply.text)?;
    let records = admit(candidates, &reply.sources, count);
    let mut sources = Vec::with_capacity(reply.sources.len());
    merge_sources(&mut sources, reply.sources);
    Ok(Page { records, sources })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str, url: &str) -> AssetCandidate {
        AssetCandidate {
            id: id.into(),
            download_url: url.into(),
            ..Default::default()
        }
    }

    fn record(id: &str, url: &str) -> AssetRecord {
        into_record(candidate(id, url))
    }

    #[test]
    fn marketplace_urls_admitted_without_grounding() {
        let admitted = admit(
            vec![candidate("a", "https://www.cgtrader.com/3d-models/a")],
            &[],
            12,
        );
        assert_eq!(admitted.len(), 1);
    }

    #[test]
    fn grounded_urls_admitted_off_marketplace() {
        let sources = vec![GroundingSource::new("Blog", "https://blog.example.com/dragon/")];
        let admitted = admit(
            vec![candidate("a", "https://blog.example.com/dragon")],
            &sources,
            12,
        );
        assert_eq!(admitted.len(), 1);
    }

    #[test]
    fn unverifiable_and_empty_urls_discarded() {
        let admitted = admit(
            vec![
                candidate("a", "https://random.example.org/model"),
                candidate("b", ""),
                candidate("c", "https://sketchfab.com/3d-models/c"),
            ],
            &[],
            12,
        );
        let ids: Vec<&str> = admitted.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["c"]);
    }

    #[test]
    fn truncates_to_requested_count() {
        let candidates: Vec<AssetCandidate> = (0..20)
            .map(|i| candidate(&format!("m{i}"), &format!("https://fab.com/listings/{i}")))
            .collect();
        let admitted = admit(candidates, &[], 12);
        assert_eq!(admitted.len(), 12);
        assert_eq!(admitted[0].id, "m0");
        assert_eq!(admitted[11].id, "m11");
    }

    #[test]
    fn truncation_counts_only_admitted_records() {
        let mut candidates = vec![candidate("bad", "https://nowhere.test/x")];
        candidates.extend((0..3).map(|i| candidate(&format!("m{i}"), "https://fab.com/x")));
        let admitted = admit(candidates, &[], 3);
        assert_eq!(admitted.len(), 3);
        assert_eq!(admitted[0].id, "m0");
    }

    #[test]
    fn blank_optionals_become_none() {
        let mut c = candidate("a", "https://fab.com/x");
        c.price = Some("  ".into());
        c.format = Some(" FBX ".into());
        let admitted = admit(vec![c], &[], 1);
        assert_eq!(admitted[0].price, None);
        assert_eq!(admitted[0].format.as_deref(), Some("FBX"));
    }

    #[test]
    fn merge_sources_dedups_by_uri() {
        let mut existing = vec![GroundingSource::new("A", "https://sketchfab.com/a")];
        let added = merge_sources(
            &mut existing,
            vec![
                GroundingSource::new("A again", "https://sketchfab.com/a/"),
                GroundingSource::new("B", "https://sketchfab.com/b"),
                GroundingSource::new("B dup", "https://sketchfab.com/b#x"),
            ],
        );
        assert_eq!(added, 1);
        assert_eq!(existing.len(), 2);
        assert_eq!(existing[0].title, "A");
        assert_eq!(existing[1].title, "B");
    }

    #[test]
    fn unique_ids_suffix_collisions() {
        let mut taken = HashSet::new();
        let mut page1 = vec![record("dragon", "https://fab.com/1"), record("dragon", "https://fab.com/2")];
        assign_unique_ids(&mut page1, &mut taken);
        let mut page2 = vec![record("dragon", "https://fab.com/3")];
        assign_unique_ids(&mut page2, &mut taken);
        assert_eq!(page1[0].id, "dragon");
        assert_eq!(page1[1].id, "dragon-2");
        assert_eq!(page2[0].id, "dragon-3");
    }

    #[test]
    fn blank_ids_derive_from_url() {
        let mut taken = HashSet::new();
        let mut records = vec![
            record("", "https://sketchfab.com/3d-models/Red_Dragon-42/"),
            record("", "not a url"),
        ];
        assign_unique_ids(&mut records, &mut taken);
        assert_eq!(records[0].id, "red-dragon-42");
        assert_eq!(records[1].id, "asset");
    }

    #[test]
    fn reconcile_page_parses_and_admits() {
        let reply = OracleReply {
            text: r#"{"models":[
                {"id":"a","downloadUrl":"https://sketchfab.com/a"},
                {"id":"b","downloadUrl":"https://elsewhere.test/b"}
            ]}"#
            .into(),
            sources: vec![
                GroundingSource::new("S", "https://sketchfab.com/a"),
                GroundingSource::new("S dup", "https://sketchfab.com/a"),
            ],
        };
        let page = reconcile_page(reply, 12).expect("page");
        assert_eq!(page.admitted(), 1);
        assert_eq!(page.sources.len(), 1);
    }

    #[test]
    fn reconcile_page_propagates_parse_failure() {
        let reply = OracleReply {
            text: "no json here".into(),
            sources: vec![],
        };
        assert!(matches!(reconcile_page(reply, 12), Err(SearchError::Parse(_))));
    }
}
