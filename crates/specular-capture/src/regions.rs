//! Region patterns
//!
//! Minimal selector patterns for region and box-model configuration:
//! `tag`, `#id`, `.class`, and compounds like `div.cart`. Full CSS
//! matching is out of scope; configured patterns use this subset.

use specular_dom::{DomTree, NodeId};

/// Parsed selector pattern
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Pattern {
    pub tag: Option<String>,
    pub id: Option<String>,
    pub classes: Vec<String>,
}

impl Pattern {
    /// Parse a pattern string. Unsupported syntax degrades to a pattern
    /// that matches nothing rather than erroring.
    pub fn parse(selector: &str) -> Pattern {
        let mut pattern = Pattern::default();
        let mut rest = selector.trim();
        if rest.is_empty() {
            return pattern;
        }

        // Leading tag name
        let tag_end = rest.find(['#', '.']).unwrap_or(rest.len());
        if tag_end > 0 {
            pattern.tag = Some(rest[..tag_end].to_ascii_lowercase());
        }
        rest = &rest[tag_end..];

        while !rest.is_empty() {
            let (kind, tail) = rest.split_at(1);
            let end = tail.find(['#', '.']).unwrap_or(tail.len());
            let name = &tail[..end];
            match kind {
                "#" => pattern.id = Some(name.to_string()),
                "." => pattern.classes.push(name.to_string()),
                _ => {}
            }
            rest = &tail[end..];
        }
        pattern
    }

    /// Whether a live element matches this pattern
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let Some(elem) = tree.as_element(node) else {
            return false;
        };
        if self.tag.is_none() && self.id.is_none() && self.classes.is_empty() {
            return false;
        }
        if let Some(tag) = &self.tag {
            if !elem.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if elem.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = elem.attr("class").unwrap_or("");
            let classes: Vec<&str> = class_attr.split_whitespace().collect();
            if !self.classes.iter().all(|c| classes.contains(&c.as_str())) {
                return false;
            }
        }
        true
    }
}
