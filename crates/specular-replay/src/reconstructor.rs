//! Reconstructor
//!
//! Applies node records to the target document in arrival order. Dispatch
//! keys on the closed TagMarker enumeration; everything that is not a
//! reserved marker or a structurally special tag takes the default element
//! path.

use std::collections::{BTreeMap, HashMap};

use specular_dom::{
    Document, DomError, ElementGeometry, Namespace, NodeId,
};
use specular_protocol::{
    Axis, BASE_ATTRIBUTE, DOCTYPE_NAME, DOCTYPE_PUBLIC_ID, DOCTYPE_SYSTEM_ID, ID_ATTRIBUTE,
    NodeRecord, ResizeEvent, ScrollEvent, TagMarker,
};

use crate::stage::Stage;

/// Replay-side errors; always record-scoped, never fatal
#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("dom operation failed: {0}")]
    Dom(#[from] DomError),

    #[error("failed to insert node {id} under parent {parent:?}: {source}")]
    Insert {
        id: u32,
        parent: Option<u32>,
        source: DomError,
    },
}

/// Rebuilds a mirror document from the capture record stream
pub struct Reconstructor {
    doc: Document,
    /// Wire id -> target node
    nodes: HashMap<u32, NodeId>,
    stage: Stage,
}

impl Reconstructor {
    /// Create with the mirror container dimensions used for stage fitting
    pub fn new(container_width: f64, container_height: f64) -> Self {
        Self {
            doc: Document::empty(),
            nodes: HashMap::new(),
            stage: Stage::new(container_width, container_height),
        }
    }

    /// The mirror document
    pub fn document(&self) -> &Document {
        &self.doc
    }

    /// Live target node for a wire id
    pub fn node(&self, id: u32) -> Option<NodeId> {
        self.live_node(id)
    }

    /// Current stage state
    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    /// Apply a batch of records in order
    pub fn apply_all(&mut self, records: &[NodeRecord]) {
        for record in records {
            self.apply(record);
        }
    }

    /// Apply one record. A failure is logged with its context and only
    /// this record is abandoned; the caller keeps feeding the stream.
    pub fn apply(&mut self, record: &NodeRecord) {
        let result = match record.marker() {
            TagMarker::Doctype => self.apply_doctype(record),
            TagMarker::Text => self.apply_text(record),
            TagMarker::Ignored => Ok(()),
            TagMarker::Root => self.apply_root(record),
            TagMarker::Head => self.apply_head(record),
            TagMarker::Style => self.apply_style(record),
            TagMarker::Element => self.apply_element(record),
        };
        if let Err(error) = result {
            tracing::warn!(
                id = record.id,
                parent = ?record.parent,
                tag = %record.tag,
                %error,
                "abandoning record"
            );
        }
    }

    /// Scroll a target element on one axis
    pub fn scroll(&mut self, event: &ScrollEvent) {
        let Some(node) = self.live_node(event.target) else {
            tracing::debug!(target = event.target, "scroll target unknown");
            return;
        };
        let Some(elem) = self.doc.tree.as_element_mut(node) else {
            return;
        };
        let geom = elem.geometry.get_or_insert_with(ElementGeometry::default);
        match event.axis {
            Axis::X => geom.scroll_left = event.value,
            Axis::Y => geom.scroll_top = event.value,
        }
    }

    /// Refit the stage to a new live viewport size
    pub fn resize(&mut self, event: &ResizeEvent) {
        self.stage.fit(event.width, event.height);
    }

    // ------------------------------------------------------------------
    // Dispatch arms
    // ------------------------------------------------------------------

    /// Destructively rebuild the whole document around a new doctype.
    /// Every node handle issued so far dangles in the discarded arena, so
    /// the id table is cleared.
    fn apply_doctype(&mut self, record: &NodeRecord) -> Result<(), ReplayError> {
        let attr = |key: &str| record.attributes.get(key).map(String::as_str).unwrap_or("");
        self.doc.rebuild_with_doctype(
            attr(DOCTYPE_NAME),
            attr(DOCTYPE_PUBLIC_ID),
            attr(DOCTYPE_SYSTEM_ID),
        );
        self.nodes.clear();
        if let Some(doctype) = self.doc.doctype() {
            self.nodes.insert(record.id, doctype);
        }
        Ok(())
    }

    fn apply_text(&mut self, record: &NodeRecord) -> Result<(), ReplayError> {
        let node = match self.live_node(record.id) {
            Some(n) => n,
            None => {
                let n = self.doc.tree.create_text("");
                self.nodes.insert(record.id, n);
                n
            }
        };
        self.doc
            .tree
            .set_text(node, record.value.as_deref().unwrap_or(""))?;
        self.insert(record, node)
    }

    /// The root document element replaces any pre-existing root (and with
    /// it any stale head/body) on first creation; attributes are reapplied
    /// regardless.
    fn apply_root(&mut self, record: &NodeRecord) -> Result<(), ReplayError> {
        let (node, created) = self.element_for(record.id, "html", Namespace::Html);
        if created {
            self.doc.replace_root(node)?;
        }
        self.apply_attributes(node, &record.attributes, None)
    }

    /// First creation synthesizes a base element from the reserved "*B"
    /// attribute; the synthetic key never reaches the live attribute set.
    fn apply_head(&mut self, record: &NodeRecord) -> Result<(), ReplayError> {
        let (node, created) = self.element_for(record.id, "head", Namespace::Html);
        let mut attributes = record.attributes.clone();
        let base = attributes.remove(BASE_ATTRIBUTE);
        if created {
            if let Some(href) = base {
                let base_elem = self.doc.tree.create_element("base");
                self.doc.tree.set_attribute(base_elem, "href", &href)?;
                self.doc.tree.append_child(node, base_elem)?;
                self.doc.set_base_url(&href);
            }
        }
        self.apply_attributes(node, &attributes, None)?;
        self.insert(record, node)
    }

    fn apply_style(&mut self, record: &NodeRecord) -> Result<(), ReplayError> {
        let (node, _) = self.element_for(record.id, "style", Namespace::Html);
        self.apply_attributes(node, &record.attributes, None)?;
        self.doc
            .tree
            .set_text_content(node, record.value.as_deref().unwrap_or(""))?;
        self.insert(record, node)
    }

    fn apply_element(&mut self, record: &NodeRecord) -> Result<(), ReplayError> {
        let namespace = if record.is_svg() {
            Namespace::Svg
        } else {
            Namespace::Html
        };
        let (node, _) = self.element_for(record.id, record.local_tag(), namespace);
        self.apply_attributes(node, &record.attributes, Some(record.id))?;
        self.insert(record, node)
    }

    // ------------------------------------------------------------------
    // Shared machinery
    // ------------------------------------------------------------------

    /// Resolve a wire id to a node that is still in the current arena
    fn live_node(&self, id: u32) -> Option<NodeId> {
        let node = *self.nodes.get(&id)?;
        self.doc.tree.get(node).map(|_| node)
    }

    /// Find-or-create the element for a wire id
    fn element_for(&mut self, id: u32, tag: &str, namespace: Namespace) -> (NodeId, bool) {
        if let Some(node) = self.live_node(id) {
            return (node, false);
        }
        let node = self.doc.tree.create_element_ns(tag, namespace);
        self.nodes.insert(id, node);
        (node, true)
    }

    /// Clear all existing attributes, then apply every record attribute.
    /// `stamp` adds the debug data-id mirror first. A single bad attribute
    /// is logged and skipped; the rest still apply.
    fn apply_attributes(
        &mut self,
        node: NodeId,
        attributes: &BTreeMap<String, String>,
        stamp: Option<u32>,
    ) -> Result<(), ReplayError> {
        self.doc.tree.clear_attributes(node)?;
        if let Some(id) = stamp {
            self.doc
                .tree
                .set_attribute(node, ID_ATTRIBUTE, &id.to_string())?;
        }
        for (name, value) in attributes {
            let result = if name.contains(':') {
                self.doc.tree.set_attribute_ns(node, name, value)
            } else {
                self.doc.tree.set_attribute(node, name, value)
            };
            if let Err(error) = result {
                tracing::warn!(attribute = %name, %error, "failed to apply attribute");
            }
        }
        Ok(())
    }

    /// Generic insert: resolve parent/next to live nodes; a null or
    /// missing parent detaches; a next whose actual parent differs from
    /// the target parent is stale and demoted to append-at-end.
    fn insert(&mut self, record: &NodeRecord, node: NodeId) -> Result<(), ReplayError> {
        let parent = record.parent.and_then(|p| self.live_node(p));
        let Some(parent) = parent else {
            if self.doc.tree.is_attached(node) {
                self.doc.tree.detach(node)?;
            }
            return Ok(());
        };

        let mut next = record.next.and_then(|n| self.live_node(n));
        if let Some(n) = next {
            if self.doc.tree.parent(n) != Some(parent) {
                next = None;
            }
        }

        self.doc
            .tree
            .insert_before(parent, node, next)
            .map_err(|source| ReplayError::Insert {
                id: record.id,
                parent: record.parent,
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use specular_dom::NodeData;

    fn record(id: u32, tag: &str, parent: Option<u32>) -> NodeRecord {
        let mut r = NodeRecord::new(id, tag);
        r.parent = parent;
        r
    }

    fn skeleton(recon: &mut Reconstructor) {
        recon.apply(&record(1, "html", None));
        recon.apply(&record(2, "head", Some(1)));
        recon.apply(&record(3, "body", Some(1)));
    }

    #[test]
    fn test_doctype_rebuilds_document() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);
        assert!(recon.document().body().is_some());

        let mut doctype = record(10, "*D", None);
        doctype.attributes.insert("name".into(), "html".into());
        recon.apply(&doctype);

        let doc = recon.document();
        let node = doc.doctype().expect("doctype present");
        match &doc.tree.get(node).unwrap().data {
            NodeData::Doctype { name, .. } => assert_eq!(name, "html"),
            other => panic!("expected doctype, got {other:?}"),
        }
        // Prior root/head/body discarded.
        assert!(doc.root_element().is_none());
        assert!(doc.body().is_none());
    }

    #[test]
    fn test_text_node_roundtrip() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);

        let mut text = record(4, "*T", Some(3));
        text.value = Some("hello mirror".into());
        recon.apply(&text);

        let body = recon.document().body().unwrap();
        assert_eq!(recon.document().tree.text_content(body), "hello mirror");

        // Update in place keeps the same node.
        let node = recon.node(4).unwrap();
        let mut text = record(4, "*T", Some(3));
        text.value = Some("changed".into());
        recon.apply(&text);
        assert_eq!(recon.node(4), Some(node));
        assert_eq!(recon.document().tree.text(node), Some("changed"));
    }

    #[test]
    fn test_root_replaces_existing() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);

        let mut root = record(1, "html", None);
        root.attributes.insert("lang".into(), "en".into());
        recon.apply(&root);

        let doc = recon.document();
        let html = doc.root_element().unwrap();
        assert_eq!(recon.node(1), Some(html));
        assert_eq!(doc.tree.attribute(html, "lang"), Some("en"));
        // Head/body from the earlier skeleton survive under the same root.
        assert!(doc.head().is_some());
    }

    #[test]
    fn test_head_base_synthesis() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        recon.apply(&record(1, "html", None));

        let mut head = record(2, "head", Some(1));
        head.attributes
            .insert(BASE_ATTRIBUTE.into(), "https://shop.example/".into());
        head.attributes.insert("class".into(), "x".into());
        recon.apply(&head);

        let doc = recon.document();
        let head_node = doc.head().unwrap();
        // Synthetic key stripped from the live attribute set.
        assert_eq!(doc.tree.attribute(head_node, BASE_ATTRIBUTE), None);
        assert_eq!(doc.tree.attribute(head_node, "class"), Some("x"));
        assert_eq!(doc.base_url(), Some("https://shop.example/"));

        let base = doc.tree.first_child(head_node).unwrap();
        assert_eq!(doc.tree.tag(base), Some("base"));
        assert_eq!(doc.tree.attribute(base, "href"), Some("https://shop.example/"));
    }

    #[test]
    fn test_style_sets_text_and_inserts() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);

        let mut style = record(5, "style", Some(2));
        style.attributes.insert("media".into(), "screen".into());
        style.value = Some(".a { color: red }".into());
        recon.apply(&style);

        let doc = recon.document();
        let node = recon.node(5).unwrap();
        // The insertion step is not skipped.
        assert_eq!(doc.tree.parent(node), doc.head());
        assert_eq!(doc.tree.attribute(node, "media"), Some("screen"));
        assert_eq!(doc.tree.text_content(node), ".a { color: red }");
    }

    #[test]
    fn test_svg_namespace_election() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);
        recon.apply(&record(6, "s:svg", Some(3)));

        let node = recon.node(6).unwrap();
        let elem = recon.document().tree.as_element(node).unwrap();
        assert_eq!(elem.namespace, Namespace::Svg);
        assert_eq!(elem.tag, "svg");
    }

    #[test]
    fn test_element_stamps_data_id_and_clears_stale_attrs() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);

        let mut div = record(7, "div", Some(3));
        div.attributes.insert("class".into(), "card".into());
        recon.apply(&div);

        let node = recon.node(7).unwrap();
        assert_eq!(recon.document().tree.attribute(node, ID_ATTRIBUTE), Some("7"));
        assert_eq!(recon.document().tree.attribute(node, "class"), Some("card"));

        // Next record drops the class; application clears before applying.
        let div = record(7, "div", Some(3));
        recon.apply(&div);
        let doc = recon.document();
        assert_eq!(doc.tree.attribute(node, "class"), None);
        assert_eq!(doc.tree.attribute(node, ID_ATTRIBUTE), Some("7"));
    }

    #[test]
    fn test_bad_attribute_isolated() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);

        let mut div = record(7, "div", Some(3));
        div.attributes.insert("bogus:x".into(), "1".into());
        div.attributes.insert("class".into(), "ok".into());
        recon.apply(&div);

        let node = recon.node(7).unwrap();
        assert_eq!(recon.document().tree.attribute(node, "class"), Some("ok"));
        assert_eq!(recon.document().tree.attribute(node, "bogus:x"), None);
    }

    #[test]
    fn test_stale_next_appends_at_end() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);

        recon.apply(&record(7, "div", Some(3)));
        recon.apply(&record(8, "div", Some(2))); // under head, not body

        // 9 claims next=8, but 8's actual parent is the head: stale.
        let mut r = record(9, "div", Some(3));
        r.next = Some(8);
        recon.apply(&r);

        let doc = recon.document();
        let body = doc.body().unwrap();
        let children: Vec<NodeId> = doc.tree.children(body).collect();
        assert_eq!(children.last().copied(), recon.node(9));
    }

    #[test]
    fn test_insert_before_known_next() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);

        recon.apply(&record(7, "div", Some(3)));
        let mut r = record(8, "div", Some(3));
        r.next = Some(7);
        recon.apply(&r);

        let doc = recon.document();
        let body = doc.body().unwrap();
        let children: Vec<NodeId> = doc.tree.children(body).collect();
        assert_eq!(children, vec![recon.node(8).unwrap(), recon.node(7).unwrap()]);
    }

    #[test]
    fn test_null_parent_detaches() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);
        recon.apply(&record(7, "div", Some(3)));
        let node = recon.node(7).unwrap();
        assert!(recon.document().tree.is_attached(node));

        recon.apply(&record(7, "div", None));
        assert!(!recon.document().tree.is_attached(node));
        // The node is retained for a later reattach.
        assert_eq!(recon.node(7), Some(node));
    }

    #[test]
    fn test_missing_parent_tolerated() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);
        // Parent id 99 was never registered; record is not an error.
        recon.apply(&record(7, "div", Some(99)));
        let node = recon.node(7).unwrap();
        assert!(!recon.document().tree.is_attached(node));
    }

    #[test]
    fn test_ignored_record_skipped() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);
        recon.apply(&record(7, "*I", Some(3)));
        assert_eq!(recon.node(7), None);
    }

    #[test]
    fn test_scroll_event() {
        let mut recon = Reconstructor::new(800.0, 600.0);
        skeleton(&mut recon);
        recon.apply(&record(7, "div", Some(3)));

        recon.scroll(&ScrollEvent {
            target: 7,
            axis: Axis::Y,
            value: 250.0,
        });
        let node = recon.node(7).unwrap();
        let elem = recon.document().tree.as_element(node).unwrap();
        assert_eq!(elem.geometry.as_ref().unwrap().scroll_top, 250.0);

        // Unknown target is a no-op, not an error.
        recon.scroll(&ScrollEvent {
            target: 99,
            axis: Axis::X,
            value: 10.0,
        });
    }

    #[test]
    fn test_resize_event() {
        let mut recon = Reconstructor::new(832.0, 632.0);
        recon.resize(&ResizeEvent {
            width: 1600,
            height: 600,
        });
        assert_eq!(recon.stage().scale(), 0.5);
    }
}
