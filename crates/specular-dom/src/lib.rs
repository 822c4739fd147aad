//! Specular DOM - Document model
//!
//! Arena-based document tree used on both sides of the mirror: the capture
//! side observes one, the replay side mutates one. Node handles are plain
//! indices into the arena; slots are never reused within a document's
//! lifetime, so a handle owns nothing and a stale handle resolves to None.

mod document;
mod geometry;
mod node;
mod style;
mod tree;

pub use document::Document;
pub use geometry::ElementGeometry;
pub use node::{Attribute, ElementData, Namespace, Node, NodeData, TextData};
pub use style::{ComputedStyle, Overflow, Visibility};
pub use tree::{Children, Descendants, DomError, DomResult, DomTree};

/// Node identifier (index into the arena)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub(crate) u32);

impl NodeId {
    /// Sentinel for "no node"
    pub const NONE: NodeId = NodeId(u32::MAX);

    /// Check whether this id refers to a node at all
    #[inline]
    pub fn is_valid(self) -> bool {
        self != Self::NONE
    }

    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// Wrap into Option, mapping the sentinel to None
    #[inline]
    pub fn ok(self) -> Option<NodeId> {
        if self.is_valid() { Some(self) } else { None }
    }
}
