//! Selector computation
//!
//! One path segment per node, joined onto the parent selector with '>'.
//! Position disambiguation is a deliberate O(1) approximation: only the
//! single immediately-preceding sibling is consulted, never a full
//! backward scan.

use std::collections::BTreeMap;

/// Tags that always receive a position index
pub const POSITION_TAGS: &[&str] = &[
    "div", "tr", "p", "li", "ul", "ol", "td", "section", "article",
];

/// Whether a node of this tag/attribute shape carries a position index:
/// the fixed tag allow-list, or any tag lacking a class attribute
pub fn position_eligible(tag: &str, attributes: &BTreeMap<String, String>) -> bool {
    POSITION_TAGS.contains(&tag) || !attributes.contains_key("class")
}

/// Build the path segment for one node
pub fn segment(tag: &str, attributes: &BTreeMap<String, String>, position: Option<u32>) -> String {
    let mut out = tag.to_ascii_lowercase();
    if let Some(id) = attributes.get("id") {
        out.push('#');
        out.push_str(id);
    } else if let Some(class) = attributes.get("class") {
        for name in class.split_whitespace() {
            out.push('.');
            out.push_str(name);
        }
    }
    if let Some(n) = position {
        out.push_str(&format!(":nth-of-type({n})"));
    }
    out
}

/// Full selector: parent selector prefix (when present) joined with '>'
pub fn compute(
    parent: Option<&str>,
    tag: &str,
    attributes: &BTreeMap<String, String>,
    position: Option<u32>,
) -> String {
    let seg = segment(tag, attributes, position);
    match parent {
        Some(p) if !p.is_empty() => format!("{p}>{seg}"),
        _ => seg,
    }
}
