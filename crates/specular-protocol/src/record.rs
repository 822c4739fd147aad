//! Per-node wire records and the replay dispatch marker

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{DOCTYPE_TAG, IGNORE_TAG, SVG_PREFIX, TEXT_TAG};

/// One node's state on the wire.
///
/// `parent`/`next` are node ids; null means "no node" (a null `next` means
/// append). Attribute entries are plain strings; absent values are simply
/// not present in the map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Positive node id, stable for the node's lifetime
    pub id: u32,
    /// Parent node id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    /// Next-sibling node id; append when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<u32>,
    /// Tag name, or a reserved marker ("*D", "*T", "*I")
    pub tag: String,
    /// Attribute map
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Text content or raw style text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl NodeRecord {
    /// Minimal record with just an id and tag
    pub fn new(id: u32, tag: &str) -> Self {
        Self {
            id,
            parent: None,
            next: None,
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            value: None,
        }
    }

    /// The dispatch marker for this record's tag
    pub fn marker(&self) -> TagMarker {
        TagMarker::classify(&self.tag)
    }

    /// Local tag name with any namespace prefix stripped
    pub fn local_tag(&self) -> &str {
        match self.tag.split_once(':') {
            Some((_, local)) => local,
            None => &self.tag,
        }
    }

    /// Whether the tag selects the SVG namespace
    pub fn is_svg(&self) -> bool {
        self.tag.starts_with(SVG_PREFIX)
    }
}

/// Closed dispatch marker for the reconstructor.
///
/// Everything that is not a reserved marker or a structurally special tag
/// falls through to `Element`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMarker {
    /// "*D": rebuild the target document around a new doctype
    Doctype,
    /// "*T": text node
    Text,
    /// "*I": nothing to replay
    Ignored,
    /// The root document element
    Root,
    /// Head element (base-href synthesis point)
    Head,
    /// Style element (raw text content)
    Style,
    /// Any other element
    Element,
}

impl TagMarker {
    /// Classify a wire tag
    pub fn classify(tag: &str) -> TagMarker {
        match tag {
            DOCTYPE_TAG => TagMarker::Doctype,
            TEXT_TAG => TagMarker::Text,
            IGNORE_TAG => TagMarker::Ignored,
            _ if tag.eq_ignore_ascii_case("html") => TagMarker::Root,
            _ if tag.eq_ignore_ascii_case("head") => TagMarker::Head,
            _ if tag.eq_ignore_ascii_case("style") => TagMarker::Style,
            _ => TagMarker::Element,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(TagMarker::classify("*D"), TagMarker::Doctype);
        assert_eq!(TagMarker::classify("*T"), TagMarker::Text);
        assert_eq!(TagMarker::classify("*I"), TagMarker::Ignored);
        assert_eq!(TagMarker::classify("HTML"), TagMarker::Root);
        assert_eq!(TagMarker::classify("head"), TagMarker::Head);
        assert_eq!(TagMarker::classify("style"), TagMarker::Style);
        assert_eq!(TagMarker::classify("div"), TagMarker::Element);
        assert_eq!(TagMarker::classify("s:svg"), TagMarker::Element);
    }

    #[test]
    fn test_svg_prefix() {
        let record = NodeRecord::new(7, "s:svg");
        assert!(record.is_svg());
        assert_eq!(record.local_tag(), "svg");

        let plain = NodeRecord::new(8, "div");
        assert!(!plain.is_svg());
        assert_eq!(plain.local_tag(), "div");
    }

    #[test]
    fn test_wire_shape_omits_nulls() {
        let record = NodeRecord::new(3, "*T");
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["id"], 3);
        assert_eq!(json["tag"], "*T");
        assert!(json.get("parent").is_none());
        assert!(json.get("next").is_none());
        assert!(json.get("attributes").is_none());
        assert!(json.get("value").is_none());
    }

    #[test]
    fn test_wire_roundtrip() {
        let mut record = NodeRecord::new(12, "div");
        record.parent = Some(4);
        record.attributes.insert("class".into(), "card".into());
        record.value = Some("x".into());

        let json = serde_json::to_string(&record).unwrap();
        let back: NodeRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }
}
