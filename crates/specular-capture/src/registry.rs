//! Node registry
//!
//! Indexes every observed live node by a stable integer id, tracks tree
//! shape (parent/next/children), computes selectors, applies the masking
//! policy, correlates URLs, and maintains the ordered pending-update
//! queue drained by flush().
//!
//! Ids are issued lazily, monotonically from 1, and never reused for a
//! different node identity. The live-node table keys on arena NodeIds,
//! which are non-owning handles: holding one keeps nothing alive.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use specular_dom::{Document, DomTree, NodeId};
use specular_protocol::{ID_ATTRIBUTE, NodeRecord, TEXT_TAG};

use crate::capture::NodeInfo;
use crate::config::CaptureConfig;
use crate::discovery::DiscoveryTask;
use crate::history::ChangeObserver;
use crate::masking;
use crate::regions::Pattern;
use crate::selector;
use crate::session::SessionContext;
use crate::urls;

/// Where an observation came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObserveSource {
    /// Discovery sweep over a root
    Discovery,
    /// Structural child-list mutation
    ChildList,
    /// Attribute mutation
    Attributes,
    /// Text content mutation
    CharacterData,
    /// Box-model monitoring tick
    BoxModel,
    /// Subtree deactivation
    Removal,
}

/// Per-node flags
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeMetadata {
    /// False once removed; terminal for that id
    pub active: bool,
    /// Box-model monitoring opt-in
    pub boxmodel: bool,
    /// Resolved masking state
    pub masked: bool,
}

/// Everything the registry knows about one id
#[derive(Debug, Clone)]
pub struct NodeValue {
    pub id: u32,
    pub parent: Option<u32>,
    pub next: Option<u32>,
    /// Ordered child ids
    pub children: Vec<u32>,
    /// nth-of-type disambiguation index
    pub position: Option<u32>,
    /// Latest capture snapshot
    pub info: NodeInfo,
    pub selector: String,
    pub region: Option<String>,
    pub metadata: NodeMetadata,
}

impl NodeValue {
    /// Convert to the wire shape. The reserved data-id attribute mirrors
    /// the numeric id on element records.
    pub fn to_record(&self) -> NodeRecord {
        let mut attributes = self.info.attributes.clone();
        if !self.info.tag.starts_with('*') {
            attributes.insert(ID_ATTRIBUTE.to_string(), self.id.to_string());
        }
        NodeRecord {
            id: self.id,
            parent: self.parent,
            next: self.next,
            tag: self.info.tag.clone(),
            attributes,
            value: self.info.value.clone(),
        }
    }
}

/// The live-side node index
pub struct NodeRegistry {
    /// Live node -> id (non-owning; arena handles)
    ids: HashMap<NodeId, u32>,
    /// Id -> record
    values: HashMap<u32, NodeValue>,
    /// Pending ids in first-observed order
    queue: Vec<u32>,
    /// Queue membership, one entry per id per flush cycle
    queued: HashSet<u32>,
    /// Resolved URL -> ids referring to it
    urls: HashMap<String, Vec<u32>>,
    /// Region labels assigned by extract_regions, keyed by live node
    regions: HashMap<NodeId, String>,
    /// Shadow roots awaiting a discovery pass
    scheduled: Vec<DiscoveryTask>,
    /// Shadow roots already scheduled once
    seen_shadows: HashSet<NodeId>,
    /// Diagnostic observer, if injected
    observer: Option<Rc<RefCell<dyn ChangeObserver>>>,
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            ids: HashMap::new(),
            values: HashMap::new(),
            queue: Vec::new(),
            queued: HashSet::new(),
            urls: HashMap::new(),
            regions: HashMap::new(),
            scheduled: Vec::new(),
            seen_shadows: HashSet::new(),
            observer: None,
        }
    }

    /// Inject a diagnostic observer
    pub fn set_observer(&mut self, observer: Rc<RefCell<dyn ChangeObserver>>) {
        self.observer = Some(observer);
    }

    /// Return the id for a live node, allocating the next counter value
    /// when `autogenerate` is set and none exists yet
    pub fn assign_id(
        &mut self,
        ctx: &mut SessionContext,
        node: NodeId,
        autogenerate: bool,
    ) -> Option<u32> {
        if let Some(&id) = self.ids.get(&node) {
            return Some(id);
        }
        if !autogenerate {
            return None;
        }
        let id = ctx.allocate_id();
        self.ids.insert(node, id);
        Some(id)
    }

    /// Id of a live node, if registered
    pub fn id_of(&self, node: NodeId) -> Option<u32> {
        self.ids.get(&node).copied()
    }

    /// Registry record for an id
    pub fn value(&self, id: u32) -> Option<&NodeValue> {
        self.values.get(&id)
    }

    pub fn is_registered(&self, node: NodeId) -> bool {
        self.ids.contains_key(&node)
    }

    /// Number of ids ever registered
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Ids recorded against a resolved URL
    pub fn ids_for_url(&self, url: &str) -> &[u32] {
        self.urls.get(url).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Take the shadow roots scheduled for discovery since the last call
    pub fn take_scheduled(&mut self) -> Vec<DiscoveryTask> {
        std::mem::take(&mut self.scheduled)
    }

    // ------------------------------------------------------------------
    // Observation
    // ------------------------------------------------------------------

    /// Register a node seen for the first time
    pub fn observe_new(
        &mut self,
        ctx: &mut SessionContext,
        doc: &Document,
        node: NodeId,
        parent: Option<NodeId>,
        mut info: NodeInfo,
        source: ObserveSource,
        config: &CaptureConfig,
    ) -> Option<u32> {
        let id = self.assign_id(ctx, node, true)?;
        let parent_id = parent.and_then(|p| self.ids.get(&p).copied());
        let next_id = self.resolve_next(&doc.tree, node);

        let region = self.regions.get(&node).cloned().or_else(|| {
            parent_id.and_then(|p| self.values.get(&p).and_then(|v| v.region.clone()))
        });

        let inherited = parent_id
            .and_then(|p| self.values.get(&p).map(|v| v.metadata.masked))
            .unwrap_or(false);
        let masked = masking::resolve(&info.tag, &info.attributes, false, Some(inherited));
        if masked {
            mask_text_value(&mut info);
        }

        let boxmodel = config
            .box_model
            .iter()
            .any(|p| Pattern::parse(p).matches(&doc.tree, node));

        let position = self.compute_position(&doc.tree, node, &info);
        let parent_selector =
            parent_id.and_then(|p| self.values.get(&p).map(|v| v.selector.clone()));
        let sel = self.selector_for(parent_selector.as_deref(), &info, position);

        if let Some(pid) = parent_id {
            if let Some(pv) = self.values.get_mut(&pid) {
                pv.children.push(id);
            }
        }

        self.track_urls(id, &info, doc.base_url());

        self.values.insert(
            id,
            NodeValue {
                id,
                parent: parent_id,
                next: next_id,
                children: Vec::new(),
                position,
                info,
                selector: sel,
                region,
                metadata: NodeMetadata {
                    active: true,
                    boxmodel,
                    masked,
                },
            },
        );

        self.enqueue(id, false);
        self.maybe_schedule_shadow(ctx, &doc.tree, node);
        self.notify(ctx, id, source);
        Some(id)
    }

    /// Reconcile an already-registered node against a fresh capture
    pub fn observe_existing(
        &mut self,
        ctx: &mut SessionContext,
        doc: &Document,
        node: NodeId,
        parent: Option<NodeId>,
        mut info: NodeInfo,
        source: ObserveSource,
    ) -> Option<u32> {
        let id = self.ids.get(&node).copied()?;
        let (old_parent, old_next, old_masked, boxmodel) = {
            let v = self.values.get(&id)?;
            (v.parent, v.next, v.metadata.masked, v.metadata.boxmodel)
        };

        let new_parent = parent.and_then(|p| self.ids.get(&p).copied());
        let new_next = self.resolve_next(&doc.tree, node);
        let parent_changed = new_parent != old_parent;
        let order_changed = new_next != old_next;
        let structural = parent_changed || order_changed;

        if structural {
            // Atomic reparent: leave the old child list, join the new one
            // at the slot after the resolved next sibling.
            if let Some(op) = old_parent {
                if let Some(ov) = self.values.get_mut(&op) {
                    ov.children.retain(|&c| c != id);
                }
            }
            if let Some(np) = new_parent {
                let slot = new_next.and_then(|n| {
                    self.values
                        .get(&np)
                        .and_then(|pv| pv.children.iter().position(|&c| c == n))
                });
                if let Some(pv) = self.values.get_mut(&np) {
                    match slot {
                        Some(i) => pv.children.insert(i + 1, id),
                        None => pv.children.push(id),
                    }
                }
            }
        }

        let region = if parent_changed {
            self.regions.get(&node).cloned().or_else(|| {
                new_parent.and_then(|p| self.values.get(&p).and_then(|v| v.region.clone()))
            })
        } else {
            self.values.get(&id).and_then(|v| v.region.clone())
        };

        let masked = masking::resolve(&info.tag, &info.attributes, old_masked, None);
        if masked {
            mask_text_value(&mut info);
        }

        let position = self.compute_position(&doc.tree, node, &info);
        let parent_selector =
            new_parent.and_then(|p| self.values.get(&p).map(|v| v.selector.clone()));
        let sel = self.selector_for(parent_selector.as_deref(), &info, position);

        let data_changed = self
            .values
            .get(&id)
            .is_some_and(|v| v.info.differs_from(&info, boxmodel));
        if data_changed {
            self.track_urls(id, &info, doc.base_url());
        }

        let selector_changed;
        {
            let v = self.values.get_mut(&id)?;
            v.parent = new_parent;
            v.next = new_next;
            v.position = position;
            selector_changed = v.selector != sel;
            v.selector = sel;
            v.region = region;
            v.metadata.masked = masked;
            v.info = info;
        }

        if structural || data_changed || selector_changed {
            self.enqueue(id, source == ObserveSource::ChildList);
        }
        if selector_changed {
            self.refresh_child_selectors(id);
        }
        self.maybe_schedule_shadow(ctx, &doc.tree, node);
        self.notify(ctx, id, source);

        // A parent that resolved away means the node left the live tree.
        if parent_changed && new_parent.is_none() {
            self.remove(ctx, id);
        }
        Some(id)
    }

    /// Drain the pending queue in order. Each record's path is the parent
    /// selector, unless that parent is itself pending in this flush or
    /// carries a stable id attribute.
    pub fn flush(&mut self) -> Vec<NodeValue> {
        let pending: HashSet<u32> = self.queue.iter().copied().collect();
        let drained = std::mem::take(&mut self.queue);
        self.queued.clear();

        let mut out = Vec::with_capacity(drained.len());
        for id in drained {
            let path = self.values.get(&id).and_then(|v| v.parent).and_then(|p| {
                let pv = self.values.get(&p)?;
                if pending.contains(&p) || pv.info.attributes.contains_key("id") {
                    None
                } else {
                    Some(pv.selector.clone())
                }
            });
            if let Some(v) = self.values.get_mut(&id) {
                v.info.path = path;
                out.push(v.clone());
            }
        }
        tracing::debug!(count = out.len(), "flushed pending updates");
        out
    }

    /// Recursively deactivate a subtree. Terminal: the id is never freed
    /// or reused, and history stays queryable.
    pub fn remove(&mut self, ctx: &mut SessionContext, id: u32) {
        let children = match self.values.get_mut(&id) {
            Some(v) if v.metadata.active => {
                v.metadata.active = false;
                std::mem::take(&mut v.children)
            }
            _ => return,
        };
        self.notify(ctx, id, ObserveSource::Removal);
        for child in children {
            if let Some(cv) = self.values.get_mut(&child) {
                cv.parent = None;
            }
            self.remove(ctx, child);
        }
    }

    // ------------------------------------------------------------------
    // Regions
    // ------------------------------------------------------------------

    /// Match configured region selectors under a root and label each hit.
    /// A name matched once ever is labeled bare; otherwise labels carry a
    /// running per-name ordinal that persists across the whole session.
    /// Nodes labeled by an earlier sweep keep their label.
    pub fn extract_regions(
        &mut self,
        ctx: &mut SessionContext,
        tree: &DomTree,
        root: NodeId,
        config: &CaptureConfig,
    ) {
        for (name, selector) in &config.regions {
            let pattern = Pattern::parse(selector);
            let matches: Vec<NodeId> = tree
                .descendants(root)
                .filter(|&n| pattern.matches(tree, n) && !self.regions.contains_key(&n))
                .collect();
            if matches.is_empty() {
                continue;
            }
            if ctx.region_ordinal(name) == 0 && matches.len() == 1 {
                ctx.bump_region_ordinal(name);
                self.regions.insert(matches[0], name.clone());
            } else {
                for node in matches {
                    let ordinal = ctx.bump_region_ordinal(name);
                    self.regions.insert(node, format!("{name}.{ordinal}"));
                }
            }
        }
    }

    /// Region label assigned to a live node, if any
    pub fn region_of(&self, node: NodeId) -> Option<&str> {
        self.regions.get(&node).map(String::as_str)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    /// Walk forward through raw siblings until one is already registered
    fn resolve_next(&self, tree: &DomTree, node: NodeId) -> Option<u32> {
        let mut sibling = tree.next_sibling(node);
        while let Some(s) = sibling {
            if let Some(&id) = self.ids.get(&s) {
                return Some(id);
            }
            sibling = tree.next_sibling(s);
        }
        None
    }

    /// Position index via the single-step lookback: only the immediately
    /// preceding registered sibling of the same tag is consulted.
    fn compute_position(&self, tree: &DomTree, node: NodeId, info: &NodeInfo) -> Option<u32> {
        if info.tag.starts_with('*') {
            return None;
        }
        if !selector::position_eligible(&info.tag, &info.attributes) {
            return None;
        }
        let inherited = tree
            .prev_sibling(node)
            .and_then(|p| self.ids.get(&p))
            .and_then(|pid| self.values.get(pid))
            .filter(|pv| pv.info.tag == info.tag)
            .and_then(|pv| pv.position);
        Some(inherited.map(|p| p + 1).unwrap_or(1))
    }

    fn selector_for(
        &self,
        parent_selector: Option<&str>,
        info: &NodeInfo,
        position: Option<u32>,
    ) -> String {
        if info.tag.starts_with('*') {
            return String::new();
        }
        selector::compute(parent_selector, &info.tag, &info.attributes, position)
    }

    /// Recompute descendants' selectors after a parent selector change;
    /// recursion stops where a child's selector is unaffected
    fn refresh_child_selectors(&mut self, parent_id: u32) {
        let (parent_selector, children) = match self.values.get(&parent_id) {
            Some(v) => (v.selector.clone(), v.children.clone()),
            None => return,
        };
        for child in children {
            let fresh = match self.values.get(&child) {
                Some(cv) if !cv.info.tag.starts_with('*') => selector::compute(
                    Some(parent_selector.as_str()),
                    &cv.info.tag,
                    &cv.info.attributes,
                    cv.position,
                ),
                _ => continue,
            };
            let changed = match self.values.get_mut(&child) {
                Some(cv) if cv.selector != fresh => {
                    cv.selector = fresh;
                    true
                }
                _ => false,
            };
            if changed {
                self.enqueue(child, false);
                self.refresh_child_selectors(child);
            }
        }
    }

    /// Queue discipline: first-observed order, one entry per id per flush
    /// cycle. A structural re-add moves an already-queued id to the tail.
    fn enqueue(&mut self, id: u32, readd: bool) {
        if self.queued.contains(&id) {
            if readd {
                if let Some(pos) = self.queue.iter().position(|&q| q == id) {
                    self.queue.remove(pos);
                    self.queue.push(id);
                }
            }
            return;
        }
        self.queued.insert(id);
        self.queue.push(id);
    }

    fn track_urls(&mut self, id: u32, info: &NodeInfo, base: Option<&str>) {
        if !urls::is_url_tag(&info.tag) {
            return;
        }
        for resolved in urls::collect_urls(&info.attributes, base) {
            let entry = self.urls.entry(resolved).or_default();
            if !entry.contains(&id) {
                entry.push(id);
            }
        }
    }

    /// Schedule an untracked shadow root as an independent top-level
    /// discovery root; deferral bounds call depth during large scans
    fn maybe_schedule_shadow(&mut self, ctx: &SessionContext, tree: &DomTree, node: NodeId) {
        let Some(elem) = tree.as_element(node) else {
            return;
        };
        let shadow = elem.shadow_root;
        if !shadow.is_valid() || self.seen_shadows.contains(&shadow) {
            return;
        }
        self.seen_shadows.insert(shadow);
        tracing::debug!(host = ?node, "scheduling shadow root discovery");
        self.scheduled.push(DiscoveryTask {
            root: shadow,
            epoch: ctx.epoch(),
        });
    }

    fn notify(&self, ctx: &SessionContext, id: u32, source: ObserveSource) {
        if let (Some(observer), Some(value)) = (&self.observer, self.values.get(&id)) {
            observer
                .borrow_mut()
                .on_change(id, source, value, ctx.now_ms());
        }
    }
}

/// Mask the text payload of a snapshot under a masked node
fn mask_text_value(info: &mut NodeInfo) {
    if info.tag == TEXT_TAG {
        if let Some(v) = info.value.take() {
            info.value = Some(masking::mask_text(&v));
        }
    }
}
