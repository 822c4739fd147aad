//! URL correlation
//!
//! Collects the resolved absolute URLs a media/link-bearing element refers
//! to, including every candidate of a srcset list.

use std::collections::BTreeMap;

use url::Url;

/// Tags whose URLs are correlated against node ids
pub const URL_TAGS: &[&str] = &["img", "source", "video", "audio", "link", "a", "iframe"];

/// Whether a tag participates in URL correlation
pub fn is_url_tag(tag: &str) -> bool {
    URL_TAGS.iter().any(|t| tag.eq_ignore_ascii_case(t))
}

/// Resolve one raw URL against an optional base. Relative URLs without a
/// base cannot be made absolute and are skipped.
fn resolve(base: Option<&str>, raw: &str) -> Option<String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match base.and_then(|b| Url::parse(b).ok()) {
        Some(base) => base.join(raw).ok().map(|u| u.to_string()),
        None => Url::parse(raw).ok().map(|u| u.to_string()),
    }
}

/// All resolved absolute URLs this element's attributes refer to
pub fn collect_urls(
    attributes: &BTreeMap<String, String>,
    base: Option<&str>,
) -> Vec<String> {
    let mut out = Vec::new();
    for name in ["src", "href"] {
        if let Some(raw) = attributes.get(name) {
            if let Some(resolved) = resolve(base, raw) {
                out.push(resolved);
            }
        }
    }
    if let Some(srcset) = attributes.get("srcset") {
        for candidate in srcset.split(',') {
            // Each candidate is "url" or "url descriptor"
            if let Some(raw) = candidate.split_whitespace().next() {
                if let Some(resolved) = resolve(base, raw) {
                    out.push(resolved);
                }
            }
        }
    }
    out
}
