//! Document - High-level document API

use crate::node::NodeData;
use crate::tree::{DomResult, DomTree};
use crate::NodeId;

/// A document: the tree plus document-level state (base URL, scroll)
#[derive(Debug)]
pub struct Document {
    /// The DOM tree
    pub tree: DomTree,
    /// Base URL used to resolve relative links
    base_url: Option<String>,
    /// Document scroll offsets (used to express layout in document coordinates)
    pub scroll_x: f64,
    pub scroll_y: f64,
}

impl Document {
    /// Create a document with the usual html/head/body skeleton
    pub fn new() -> Self {
        let mut tree = DomTree::new();
        let html = tree.create_element("html");
        let head = tree.create_element("head");
        let body = tree.create_element("body");

        // The skeleton is built from fresh ids; these cannot fail.
        let root = tree.root();
        let _ = tree.append_child(root, html);
        let _ = tree.append_child(html, head);
        let _ = tree.append_child(html, body);

        Self {
            tree,
            base_url: None,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// Create an empty document (no structure)
    pub fn empty() -> Self {
        Self {
            tree: DomTree::new(),
            base_url: None,
            scroll_x: 0.0,
            scroll_y: 0.0,
        }
    }

    /// Base URL, if set
    pub fn base_url(&self) -> Option<&str> {
        self.base_url.as_deref()
    }

    pub fn set_base_url(&mut self, url: &str) {
        self.base_url = Some(url.to_string());
    }

    /// The document's doctype node, if present
    pub fn doctype(&self) -> Option<NodeId> {
        self.tree.children(self.tree.root()).find(|&id| {
            matches!(
                self.tree.get(id).map(|n| &n.data),
                Some(NodeData::Doctype { .. })
            )
        })
    }

    /// The root element (html), if present
    pub fn root_element(&self) -> Option<NodeId> {
        self.tree
            .children(self.tree.root())
            .find(|&id| self.tree.get(id).is_some_and(|n| n.is_element()))
    }

    /// Direct element child of the root element with the given tag
    fn root_child(&self, tag: &str) -> Option<NodeId> {
        let root = self.root_element()?;
        self.tree
            .children(root)
            .find(|&id| self.tree.tag(id).is_some_and(|t| t.eq_ignore_ascii_case(tag)))
    }

    /// The head element, if present
    pub fn head(&self) -> Option<NodeId> {
        self.root_child("head")
    }

    /// The body element, if present
    pub fn body(&self) -> Option<NodeId> {
        self.root_child("body")
    }

    /// Replace the root element with `new_root`, stripping the previous
    /// root (and with it any pre-existing head/body)
    pub fn replace_root(&mut self, new_root: NodeId) -> DomResult<()> {
        if let Some(old) = self.root_element() {
            if old != new_root {
                self.tree.detach(old)?;
            }
        }
        let root = self.tree.root();
        if self.tree.parent(new_root) != Some(root) {
            self.tree.append_child(root, new_root)?;
        }
        Ok(())
    }

    /// Discard the whole tree and start over with only a doctype node.
    /// Every previously issued NodeId becomes stale.
    pub fn rebuild_with_doctype(&mut self, name: &str, public_id: &str, system_id: &str) {
        let mut tree = DomTree::new();
        let doctype = tree.create_doctype(name, public_id, system_id);
        let root = tree.root();
        let _ = tree.append_child(root, doctype);
        self.tree = tree;
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
