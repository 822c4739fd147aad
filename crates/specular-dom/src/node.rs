//! DOM Node
//!
//! Sibling-linked node records stored in the arena. Links use the NodeId
//! sentinel rather than Option so a Node stays a flat struct.

use crate::geometry::ElementGeometry;
use crate::style::ComputedStyle;
use crate::NodeId;

/// DOM Node - core structure
#[derive(Debug)]
pub struct Node {
    /// Parent node (NONE if detached or root)
    pub parent: NodeId,
    /// First child
    pub first_child: NodeId,
    /// Last child (for O(1) append)
    pub last_child: NodeId,
    /// Previous sibling
    pub prev_sibling: NodeId,
    /// Next sibling
    pub next_sibling: NodeId,
    /// Node-specific data
    pub data: NodeData,
}

impl Node {
    fn detached(data: NodeData) -> Self {
        Self {
            parent: NodeId::NONE,
            first_child: NodeId::NONE,
            last_child: NodeId::NONE,
            prev_sibling: NodeId::NONE,
            next_sibling: NodeId::NONE,
            data,
        }
    }

    /// Create a document container node
    pub fn document() -> Self {
        Self::detached(NodeData::Document)
    }

    /// Create an element node
    pub fn element(tag: &str, namespace: Namespace) -> Self {
        Self::detached(NodeData::Element(ElementData::new(tag, namespace)))
    }

    /// Create a text node
    pub fn text(content: &str) -> Self {
        Self::detached(NodeData::Text(TextData {
            content: content.to_string(),
        }))
    }

    /// Create a doctype node
    pub fn doctype(name: &str, public_id: &str, system_id: &str) -> Self {
        Self::detached(NodeData::Doctype {
            name: name.to_string(),
            public_id: public_id.to_string(),
            system_id: system_id.to_string(),
        })
    }

    /// Create a shadow root container attached to a host element
    pub fn shadow_root(host: NodeId) -> Self {
        Self::detached(NodeData::ShadowRoot { host })
    }

    /// Check if this is an element
    #[inline]
    pub fn is_element(&self) -> bool {
        matches!(self.data, NodeData::Element(_))
    }

    /// Check if this is text
    #[inline]
    pub fn is_text(&self) -> bool {
        matches!(self.data, NodeData::Text(_))
    }

    /// Get element data if this is an element
    #[inline]
    pub fn as_element(&self) -> Option<&ElementData> {
        match &self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get mutable element data
    #[inline]
    pub fn as_element_mut(&mut self) -> Option<&mut ElementData> {
        match &mut self.data {
            NodeData::Element(e) => Some(e),
            _ => None,
        }
    }

    /// Get text content if this is a text node
    #[inline]
    pub fn as_text(&self) -> Option<&str> {
        match &self.data {
            NodeData::Text(t) => Some(&t.content),
            _ => None,
        }
    }
}

/// Node-specific data
#[derive(Debug)]
pub enum NodeData {
    /// Document root container
    Document,
    /// DOCTYPE
    Doctype {
        name: String,
        public_id: String,
        system_id: String,
    },
    /// Element
    Element(ElementData),
    /// Text content
    Text(TextData),
    /// Shadow root container; an independent top-level root, not a child of its host
    ShadowRoot { host: NodeId },
}

/// Element namespace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Namespace {
    #[default]
    Html,
    Svg,
}

/// Element-specific data
#[derive(Debug)]
pub struct ElementData {
    /// Tag name (lowercased for HTML, verbatim for SVG)
    pub tag: String,
    /// Namespace
    pub namespace: Namespace,
    /// Attributes in insertion order
    attrs: Vec<Attribute>,
    /// Form value, when the element carries one (inputs, text areas)
    pub value: Option<String>,
    /// Layout geometry; None when the element has no renderable box
    pub geometry: Option<ElementGeometry>,
    /// Computed-style snapshot
    pub style: ComputedStyle,
    /// Shadow root hosted by this element (NONE if not a host)
    pub shadow_root: NodeId,
}

impl ElementData {
    pub fn new(tag: &str, namespace: Namespace) -> Self {
        let tag = match namespace {
            Namespace::Html => tag.to_ascii_lowercase(),
            Namespace::Svg => tag.to_string(),
        };
        Self {
            tag,
            namespace,
            attrs: Vec::new(),
            value: None,
            geometry: None,
            style: ComputedStyle::default(),
            shadow_root: NodeId::NONE,
        }
    }

    /// Get an attribute value
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Check attribute presence
    pub fn has_attr(&self, name: &str) -> bool {
        self.attrs.iter().any(|a| a.name == name)
    }

    /// Set an attribute, replacing any existing value
    pub fn set_attr(&mut self, name: &str, value: &str) {
        for attr in self.attrs.iter_mut() {
            if attr.name == name {
                attr.value = value.to_string();
                return;
            }
        }
        self.attrs.push(Attribute {
            name: name.to_string(),
            value: value.to_string(),
        });
    }

    /// Remove an attribute
    pub fn remove_attr(&mut self, name: &str) {
        self.attrs.retain(|a| a.name != name);
    }

    /// Remove every attribute
    pub fn clear_attrs(&mut self) {
        self.attrs.clear();
    }

    /// All attributes in insertion order
    pub fn attrs(&self) -> &[Attribute] {
        &self.attrs
    }
}

/// Text node data
#[derive(Debug)]
pub struct TextData {
    pub content: String,
}

/// Attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub value: String,
}
