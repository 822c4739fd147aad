//! DOM Tree (arena-based allocation)
//!
//! All nodes live in one Vec; ids are indices. Slots are never reused, so
//! ids stay stable for the lifetime of the tree. Structural edits rewrite
//! the sibling links only.

use crate::node::{Attribute, ElementData, Namespace, Node, NodeData};
use crate::NodeId;

/// Result type for DOM operations
pub type DomResult<T> = Result<T, DomError>;

/// DOM operation errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomError {
    #[error("node not found")]
    NotFound,

    #[error("hierarchy request error")]
    HierarchyRequest,

    #[error("node is not an element")]
    NotAnElement,

    #[error("node is not a text node")]
    NotText,

    #[error("reference node is not a child of the parent")]
    NotAChild,

    #[error("unknown attribute namespace prefix: {0}")]
    UnknownNamespace(String),
}

/// Arena-based DOM tree
#[derive(Debug)]
pub struct DomTree {
    nodes: Vec<Node>,
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

impl DomTree {
    /// Create a new tree holding only the document container
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::document()],
        }
    }

    /// The document container node
    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    /// Get a node by id
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        if id.is_valid() {
            self.nodes.get(id.index())
        } else {
            None
        }
    }

    /// Get a mutable node by id
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if id.is_valid() {
            self.nodes.get_mut(id.index())
        } else {
            None
        }
    }

    /// Number of nodes in the arena (including detached ones)
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    // ------------------------------------------------------------------
    // Node creation
    // ------------------------------------------------------------------

    /// Create a detached HTML element
    pub fn create_element(&mut self, tag: &str) -> NodeId {
        self.alloc(Node::element(tag, Namespace::Html))
    }

    /// Create a detached element in an explicit namespace
    pub fn create_element_ns(&mut self, tag: &str, namespace: Namespace) -> NodeId {
        self.alloc(Node::element(tag, namespace))
    }

    /// Create a detached text node
    pub fn create_text(&mut self, content: &str) -> NodeId {
        self.alloc(Node::text(content))
    }

    /// Create a detached doctype node
    pub fn create_doctype(&mut self, name: &str, public_id: &str, system_id: &str) -> NodeId {
        self.alloc(Node::doctype(name, public_id, system_id))
    }

    /// Attach a shadow root to a host element, or return the existing one.
    ///
    /// The shadow root is an independent top-level root: it is linked from
    /// the host element but is not a child of it.
    pub fn attach_shadow(&mut self, host: NodeId) -> DomResult<NodeId> {
        let existing = self
            .get(host)
            .ok_or(DomError::NotFound)?
            .as_element()
            .ok_or(DomError::NotAnElement)?
            .shadow_root;
        if existing.is_valid() {
            return Ok(existing);
        }
        let root = self.alloc(Node::shadow_root(host));
        // Host was checked above; the arena only grew since.
        if let Some(elem) = self.nodes[host.index()].as_element_mut() {
            elem.shadow_root = root;
        }
        Ok(root)
    }

    // ------------------------------------------------------------------
    // Traversal
    // ------------------------------------------------------------------

    /// Parent of a node, if attached
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent.ok())
    }

    /// Next sibling, if any
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling.ok())
    }

    /// Previous sibling, if any
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling.ok())
    }

    /// First child, if any
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.first_child.ok())
    }

    /// Last child, if any
    pub fn last_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.last_child.ok())
    }

    /// Iterate over the children of a node
    pub fn children(&self, id: NodeId) -> Children<'_> {
        Children {
            tree: self,
            next: self.first_child(id),
        }
    }

    /// Iterate over all descendants of a node in document (pre-) order,
    /// excluding the node itself
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        let mut stack: Vec<NodeId> = self.children(id).collect();
        stack.reverse();
        Descendants { tree: self, stack }
    }

    /// Check whether `ancestor` contains `node` (strict containment)
    pub fn contains(&self, ancestor: NodeId, node: NodeId) -> bool {
        let mut current = self.parent(node);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent(p);
        }
        false
    }

    /// Check whether a node is linked under a parent
    pub fn is_attached(&self, id: NodeId) -> bool {
        self.parent(id).is_some()
    }

    // ------------------------------------------------------------------
    // Structural mutation
    // ------------------------------------------------------------------

    /// Append a child as the last child of a parent
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> DomResult<()> {
        self.insert_before(parent, child, None)
    }

    /// Insert `child` under `parent`, before `reference` (append when None).
    ///
    /// Detaches the child from its current position first. Inserting a node
    /// under itself or one of its descendants is a hierarchy error.
    pub fn insert_before(
        &mut self,
        parent: NodeId,
        child: NodeId,
        reference: Option<NodeId>,
    ) -> DomResult<()> {
        if self.get(parent).is_none() || self.get(child).is_none() {
            return Err(DomError::NotFound);
        }
        if child == parent || self.contains(child, parent) {
            return Err(DomError::HierarchyRequest);
        }
        if let Some(r) = reference {
            if self.parent(r) != Some(parent) {
                return Err(DomError::NotAChild);
            }
            if r == child {
                return Ok(());
            }
        }

        self.detach(child)?;

        match reference {
            Some(r) => {
                let prev = self.nodes[r.index()].prev_sibling;
                self.nodes[child.index()].prev_sibling = prev;
                self.nodes[child.index()].next_sibling = r;
                self.nodes[r.index()].prev_sibling = child;
                if prev.is_valid() {
                    self.nodes[prev.index()].next_sibling = child;
                } else {
                    self.nodes[parent.index()].first_child = child;
                }
            }
            None => {
                let last = self.nodes[parent.index()].last_child;
                self.nodes[child.index()].prev_sibling = last;
                if last.is_valid() {
                    self.nodes[last.index()].next_sibling = child;
                } else {
                    self.nodes[parent.index()].first_child = child;
                }
                self.nodes[parent.index()].last_child = child;
            }
        }
        self.nodes[child.index()].parent = parent;
        Ok(())
    }

    /// Unlink a node from its parent. A detached node stays in the arena
    /// and can be reinserted later.
    pub fn detach(&mut self, child: NodeId) -> DomResult<()> {
        let (parent, prev, next) = {
            let node = self.get(child).ok_or(DomError::NotFound)?;
            (node.parent, node.prev_sibling, node.next_sibling)
        };
        if parent.is_valid() {
            if prev.is_valid() {
                self.nodes[prev.index()].next_sibling = next;
            } else {
                self.nodes[parent.index()].first_child = next;
            }
            if next.is_valid() {
                self.nodes[next.index()].prev_sibling = prev;
            } else {
                self.nodes[parent.index()].last_child = prev;
            }
        }
        let node = &mut self.nodes[child.index()];
        node.parent = NodeId::NONE;
        node.prev_sibling = NodeId::NONE;
        node.next_sibling = NodeId::NONE;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Element and text helpers
    // ------------------------------------------------------------------

    /// Tag name of an element node
    pub fn tag(&self, id: NodeId) -> Option<&str> {
        self.as_element(id).map(|e| e.tag.as_str())
    }

    /// Element data of a node
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| n.as_element())
    }

    /// Mutable element data of a node
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| n.as_element_mut())
    }

    /// Attribute value on an element
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.as_element(id).and_then(|e| e.attr(name))
    }

    /// Set an attribute on an element
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let elem = self.as_element_mut(id).ok_or(DomError::NotAnElement)?;
        elem.set_attr(name, value);
        Ok(())
    }

    /// Set a namespace-prefixed attribute. Only the standard prefixes are
    /// accepted; anything else is an error the caller isolates per record.
    pub fn set_attribute_ns(&mut self, id: NodeId, name: &str, value: &str) -> DomResult<()> {
        let prefix = name.split(':').next().unwrap_or("");
        match prefix {
            "xlink" | "xml" | "xmlns" => self.set_attribute(id, name, value),
            other => Err(DomError::UnknownNamespace(other.to_string())),
        }
    }

    /// Remove an attribute from an element
    pub fn remove_attribute(&mut self, id: NodeId, name: &str) -> DomResult<()> {
        let elem = self.as_element_mut(id).ok_or(DomError::NotAnElement)?;
        elem.remove_attr(name);
        Ok(())
    }

    /// Remove every attribute from an element
    pub fn clear_attributes(&mut self, id: NodeId) -> DomResult<()> {
        let elem = self.as_element_mut(id).ok_or(DomError::NotAnElement)?;
        elem.clear_attrs();
        Ok(())
    }

    /// All attributes of an element, in insertion order
    pub fn attributes(&self, id: NodeId) -> &[Attribute] {
        self.as_element(id).map(|e| e.attrs()).unwrap_or(&[])
    }

    /// Content of a text node
    pub fn text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| n.as_text())
    }

    /// Replace the content of a text node
    pub fn set_text(&mut self, id: NodeId, content: &str) -> DomResult<()> {
        match &mut self.get_mut(id).ok_or(DomError::NotFound)?.data {
            NodeData::Text(t) => {
                t.content = content.to_string();
                Ok(())
            }
            _ => Err(DomError::NotText),
        }
    }

    /// Replace an element's children with a single text node holding
    /// `content` (raw text assignment, used for style elements)
    pub fn set_text_content(&mut self, id: NodeId, content: &str) -> DomResult<()> {
        if self.as_element(id).is_none() {
            return Err(DomError::NotAnElement);
        }
        let children: Vec<NodeId> = self.children(id).collect();
        for child in children {
            self.detach(child)?;
        }
        let text = self.create_text(content);
        self.append_child(id, text)
    }

    /// Concatenated text of all descendant text nodes
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        if let Some(t) = self.text(id) {
            out.push_str(t);
        }
        for d in self.descendants(id) {
            if let Some(t) = self.text(d) {
                out.push_str(t);
            }
        }
        out
    }
}

/// Iterator over the children of a node
pub struct Children<'a> {
    tree: &'a DomTree,
    next: Option<NodeId>,
}

impl<'a> Iterator for Children<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.next?;
        self.next = self.tree.next_sibling(current);
        Some(current)
    }
}

/// Pre-order iterator over the descendants of a node
pub struct Descendants<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let current = self.stack.pop()?;
        let children: Vec<NodeId> = self.tree.children(current).collect();
        for child in children.into_iter().rev() {
            self.stack.push(child);
        }
        Some(current)
    }
}
