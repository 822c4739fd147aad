//! Discovery
//!
//! Sweeps a root in document order, registering unseen nodes and
//! reconciling known ones. Shadow roots found along the way are not
//! recursed into; they are scheduled as independent top-level roots on a
//! queue the host scheduler drains, which bounds call depth and yields
//! between large subtree scans. A task scheduled before a session reset
//! carries the old epoch and must no-op.

use std::collections::VecDeque;

use specular_dom::{Document, NodeId};

use crate::capture::capture_node;
use crate::config::CaptureConfig;
use crate::registry::{NodeRegistry, ObserveSource};
use crate::session::SessionContext;

/// One deferred discovery pass over a root
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryTask {
    pub root: NodeId,
    /// Session epoch at scheduling time
    pub epoch: u64,
}

/// Pending discovery roots; shadow roots go to the front
#[derive(Debug, Default)]
pub struct DiscoveryQueue {
    tasks: VecDeque<DiscoveryTask>,
}

impl DiscoveryQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule a root at normal priority
    pub fn schedule(&mut self, task: DiscoveryTask) {
        self.tasks.push_back(task);
    }

    /// Schedule a root at high priority (shadow roots)
    pub fn schedule_priority(&mut self, task: DiscoveryTask) {
        self.tasks.push_front(task);
    }

    pub fn pop(&mut self) -> Option<DiscoveryTask> {
        self.tasks.pop_front()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// One synchronous sweep over a root. Region patterns are re-applied
/// first so newly matched elements pick up their labels on registration.
pub fn discover(
    registry: &mut NodeRegistry,
    ctx: &mut SessionContext,
    doc: &Document,
    config: &CaptureConfig,
    root: NodeId,
) {
    registry.extract_regions(ctx, &doc.tree, root, config);

    let nodes: Vec<NodeId> = doc.tree.descendants(root).collect();
    tracing::debug!(root = ?root, count = nodes.len(), "discovery sweep");
    for node in nodes {
        let Some(info) = capture_node(doc, node, config, ctx) else {
            continue;
        };
        let parent = doc.tree.parent(node);
        if registry.is_registered(node) {
            registry.observe_existing(ctx, doc, node, parent, info, ObserveSource::Discovery);
        } else {
            registry.observe_new(
                ctx,
                doc,
                node,
                parent,
                info,
                ObserveSource::Discovery,
                config,
            );
        }
    }
}

/// Drain the discovery queue. Tasks from a previous session epoch are
/// dropped without touching the registry; shadow roots surfaced by a pass
/// are promoted to the front of the queue.
pub fn run_discovery(
    queue: &mut DiscoveryQueue,
    registry: &mut NodeRegistry,
    ctx: &mut SessionContext,
    doc: &Document,
    config: &CaptureConfig,
) {
    while let Some(task) = queue.pop() {
        if task.epoch != ctx.epoch() {
            tracing::debug!(root = ?task.root, task_epoch = task.epoch, "dropping stale discovery task");
            continue;
        }
        discover(registry, ctx, doc, config, task.root);
        for scheduled in registry.take_scheduled() {
            queue.schedule_priority(scheduled);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_doc() -> Document {
        let mut doc = Document::empty();
        let root = doc.tree.root();
        let html = doc.tree.create_element("html");
        let body = doc.tree.create_element("body");
        let p = doc.tree.create_element("p");
        let text = doc.tree.create_text("hello");
        doc.tree.append_child(root, html).unwrap();
        doc.tree.append_child(html, body).unwrap();
        doc.tree.append_child(body, p).unwrap();
        doc.tree.append_child(p, text).unwrap();
        doc
    }

    #[test]
    fn test_discover_registers_subtree() {
        let mut registry = NodeRegistry::new();
        let mut ctx = SessionContext::new();
        let doc = sample_doc();
        let config = CaptureConfig::new();

        discover(&mut registry, &mut ctx, &doc, &config, doc.tree.root());
        // html, body, p, text
        assert_eq!(registry.len(), 4);

        // Re-discovery reconciles without growing the registry.
        discover(&mut registry, &mut ctx, &doc, &config, doc.tree.root());
        assert_eq!(registry.len(), 4);
    }

    #[test]
    fn test_shadow_root_discovered_as_independent_root() {
        let mut registry = NodeRegistry::new();
        let mut ctx = SessionContext::new();
        let mut doc = sample_doc();
        let config = CaptureConfig::new();

        let host = doc.body().unwrap();
        let shadow = doc.tree.attach_shadow(host).unwrap();
        let inner = doc.tree.create_element("span");
        doc.tree.append_child(shadow, inner).unwrap();

        let mut queue = DiscoveryQueue::new();
        queue.schedule(DiscoveryTask {
            root: doc.tree.root(),
            epoch: ctx.epoch(),
        });
        run_discovery(&mut queue, &mut registry, &mut ctx, &doc, &config);

        let inner_id = registry.id_of(inner).unwrap();
        // Independent top-level root: not nested under the host.
        assert_eq!(registry.value(inner_id).unwrap().parent, None);
        let host_id = registry.id_of(host).unwrap();
        assert!(!registry
            .value(host_id)
            .unwrap()
            .children
            .contains(&inner_id));
    }

    #[test]
    fn test_stale_epoch_task_noops() {
        let mut registry = NodeRegistry::new();
        let mut ctx = SessionContext::new();
        let doc = sample_doc();
        let config = CaptureConfig::new();

        let mut queue = DiscoveryQueue::new();
        queue.schedule(DiscoveryTask {
            root: doc.tree.root(),
            epoch: ctx.epoch(),
        });
        // Session reset between scheduling and draining.
        ctx.reset();
        run_discovery(&mut queue, &mut registry, &mut ctx, &doc, &config);

        assert!(registry.is_empty());
    }
}
