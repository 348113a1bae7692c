//! URL extraction from free text
//!
//! Pulls every `http`/`https` URL out of a block of text and collapses
//! duplicates. The returned order is first-occurrence order, but callers
//! must not depend on it matching input position.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;
use std::sync::OnceLock;
use url::Url;

use crate::models::WorkItem;

/// How URLs that differ only cosmetically are treated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// Textually different URLs are separate work items
    #[default]
    Distinct,
    /// URLs differing only in a trailing slash or scheme/host case are merged
    MergeEquivalent,
}

impl FromStr for DuplicatePolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distinct" => Ok(Self::Distinct),
            "merge_equivalent" | "merge" => Ok(Self::MergeEquivalent),
            other => Err(format!("unknown duplicate policy: {other}")),
        }
    }
}

fn url_regex() -> &'static Regex {
    static URL_RE: OnceLock<Regex> = OnceLock::new();
    URL_RE.get_or_init(|| Regex::new(r"https?://[\w./\-]+").expect("Invalid regex pattern"))
}

/// Extract the distinct URLs found in `text`
pub fn extract_urls(text: &str) -> Vec<String> {
    extract_urls_with(text, DuplicatePolicy::Distinct)
}

/// Extract URLs applying the given duplicate policy
pub fn extract_urls_with(text: &str, policy: DuplicatePolicy) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();

    for m in url_regex().find_iter(text) {
        let url = m.as_str();
        let key = match policy {
            DuplicatePolicy::Distinct => url.to_string(),
            DuplicatePolicy::MergeEquivalent => equivalence_key(url),
        };
        if seen.insert(key) {
            urls.push(url.to_string());
        }
    }

    urls
}

/// Extract URLs and wrap them as work items
pub fn extract_work_items(text: &str, policy: DuplicatePolicy) -> Vec<WorkItem> {
    extract_urls_with(text, policy)
        .into_iter()
        .map(WorkItem::new)
        .collect()
}

/// Key under which cosmetically different URLs collide
fn equivalence_key(raw: &str) -> String {
    // Url::parse lowercases scheme and host; the path is kept as written
    let normalized = Url::parse(raw)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| raw.to_ascii_lowercase());

    normalized.trim_end_matches('/').to_string()
}
