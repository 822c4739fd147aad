//! Attribute capture
//!
//! Produces an immutable snapshot of one live node: tag, masked attribute
//! map, layout rectangle in document coordinates, sparse style deltas, and
//! the form value. The snapshot carries no tree links; those belong to the
//! registry.

use std::collections::BTreeMap;

use specular_dom::{ComputedStyle, Document, ElementData, NodeData, NodeId, Visibility};
use specular_protocol::{DOCTYPE_NAME, DOCTYPE_PUBLIC_ID, DOCTYPE_SYSTEM_ID, DOCTYPE_TAG, IGNORE_TAG, TEXT_TAG};

use crate::config::CaptureConfig;
use crate::masking;
use crate::session::SessionContext;

/// Tags captured only as an ignore marker
const IGNORED_TAGS: &[&str] = &["script", "meta"];

/// Layout rectangle in document coordinates.
///
/// Width and height are rounded, x and y floored, so both engines land on
/// the same integers. Element scroll offsets are present only when an
/// overflow style makes the element scrollable on that axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutRect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub scroll_x: Option<i32>,
    pub scroll_y: Option<i32>,
}

/// Immutable capture snapshot of one node
#[derive(Debug, Clone, PartialEq)]
pub struct NodeInfo {
    /// Tag name, or a reserved marker ("*D", "*T", "*I")
    pub tag: String,
    /// Attribute map, masked per policy
    pub attributes: BTreeMap<String, String>,
    /// Layout rectangle, when the element has a renderable box
    pub layout: Option<LayoutRect>,
    /// Sparse style deltas from defaults
    pub style: Option<BTreeMap<String, String>>,
    /// Form value or text content
    pub value: Option<String>,
    /// Nearest stable-ancestor selector; filled only at flush time
    pub path: Option<String>,
}

impl NodeInfo {
    fn with_tag(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attributes: BTreeMap::new(),
            layout: None,
            style: None,
            value: None,
            path: None,
        }
    }

    /// Snapshot for an ignored node (script/meta)
    pub fn ignored() -> Self {
        Self::with_tag(IGNORE_TAG)
    }

    /// Snapshot for a text node
    pub fn text(content: &str) -> Self {
        let mut info = Self::with_tag(TEXT_TAG);
        info.value = Some(content.to_string());
        info
    }

    pub fn is_ignored(&self) -> bool {
        self.tag == IGNORE_TAG
    }

    pub fn is_text(&self) -> bool {
        self.tag == TEXT_TAG
    }

    /// Deep key-by-key comparison deciding whether anything materially
    /// changed. A field present on only one side counts as changed.
    /// Layout participates only for box-model-monitored nodes.
    pub fn differs_from(&self, other: &NodeInfo, include_layout: bool) -> bool {
        if self.tag != other.tag || self.value != other.value {
            return true;
        }
        if !maps_equal(&self.attributes, &other.attributes) {
            return true;
        }
        let style_equal = match (&self.style, &other.style) {
            (None, None) => true,
            (Some(a), Some(b)) => maps_equal(a, b),
            _ => false,
        };
        if !style_equal {
            return true;
        }
        include_layout && self.layout != other.layout
    }
}

fn maps_equal(a: &BTreeMap<String, String>, b: &BTreeMap<String, String>) -> bool {
    a.len() == b.len() && a.iter().all(|(k, v)| b.get(k) == Some(v))
}

/// Capture a snapshot of one live node. Returns None for container nodes
/// (document, shadow root), which are never captured themselves.
pub fn capture_node(
    doc: &Document,
    node: NodeId,
    config: &CaptureConfig,
    ctx: &mut SessionContext,
) -> Option<NodeInfo> {
    match &doc.tree.get(node)?.data {
        NodeData::Text(t) => Some(NodeInfo::text(&t.content)),
        NodeData::Doctype {
            name,
            public_id,
            system_id,
        } => {
            let mut info = NodeInfo::with_tag(DOCTYPE_TAG);
            info.attributes.insert(DOCTYPE_NAME.to_string(), name.clone());
            info.attributes
                .insert(DOCTYPE_PUBLIC_ID.to_string(), public_id.clone());
            info.attributes
                .insert(DOCTYPE_SYSTEM_ID.to_string(), system_id.clone());
            Some(info)
        }
        NodeData::Element(elem) => Some(capture_element(doc, elem, config, ctx)),
        NodeData::Document | NodeData::ShadowRoot { .. } => None,
    }
}

fn capture_element(
    doc: &Document,
    elem: &ElementData,
    config: &CaptureConfig,
    ctx: &mut SessionContext,
) -> NodeInfo {
    if IGNORED_TAGS.iter().any(|t| elem.tag.eq_ignore_ascii_case(t)) {
        return NodeInfo::ignored();
    }

    let unmask = elem.has_attr(masking::UNMASK_ATTRIBUTE);

    let mut info = NodeInfo::with_tag(&elem.tag);
    for attr in elem.attrs() {
        let value = if config.is_sensitive_attribute(&attr.name) && !unmask {
            masking::mask_text(&attr.value)
        } else {
            attr.value.clone()
        };
        info.attributes.insert(attr.name.clone(), value);
    }

    // The first body seen fixes the session's baseline text color.
    if elem.tag == "body" {
        ctx.sample_baseline_color(elem.style.color.as_deref().unwrap_or("rgb(0, 0, 0)"));
    }

    info.layout = elem.geometry.as_ref().map(|geom| {
        let scrollable_x = elem.style.overflow_x.is_scrollable();
        let scrollable_y = elem.style.overflow_y.is_scrollable();
        LayoutRect {
            x: (geom.x + doc.scroll_x).floor() as i32,
            y: (geom.y + doc.scroll_y).floor() as i32,
            width: geom.width.max(0.0).round() as u32,
            height: geom.height.max(0.0).round() as u32,
            scroll_x: scrollable_x.then(|| geom.scroll_left.round() as i32),
            scroll_y: scrollable_y.then(|| geom.scroll_top.round() as i32),
        }
    });

    info.style = style_deltas(&elem.style, ctx);

    info.value = elem.value.as_ref().map(|v| {
        if unmask {
            v.clone()
        } else {
            masking::mask_text(v)
        }
    });

    info
}

/// Only meaningful deviations from defaults are captured
fn style_deltas(style: &ComputedStyle, ctx: &SessionContext) -> Option<BTreeMap<String, String>> {
    let mut deltas = BTreeMap::new();

    if style.visibility != Visibility::Visible {
        deltas.insert("visibility".to_string(), style.visibility.as_css().to_string());
    }
    if style.overflow_x.is_clipped() {
        deltas.insert("overflow-x".to_string(), style.overflow_x.as_css().to_string());
    }
    if style.overflow_y.is_clipped() {
        deltas.insert("overflow-y".to_string(), style.overflow_y.as_css().to_string());
    }
    if let Some(image) = &style.background_image {
        deltas.insert("background-image".to_string(), image.clone());
    }
    if let Some(color) = &style.background_color {
        deltas.insert("background-color".to_string(), color.clone());
    }
    if let Some(color) = &style.color {
        if ctx.baseline_color() != Some(color.as_str()) {
            deltas.insert("color".to_string(), color.clone());
        }
    }

    if deltas.is_empty() { None } else { Some(deltas) }
}
