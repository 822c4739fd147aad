//! Capture -> wire -> replay round trip
//!
//! Builds a live document, discovers it, flushes the registry, ships the
//! records across the wire shape, and checks the reconstructed mirror
//! matches the captured snapshots id for id.

use specular_capture::{
    CaptureConfig, DiscoveryQueue, DiscoveryTask, NodeRegistry, SessionContext, run_discovery,
};
use specular_dom::{Document, NodeId};
use specular_protocol::{ID_ATTRIBUTE, NodeRecord};
use specular_replay::Reconstructor;

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn live_document() -> (Document, NodeId, NodeId) {
    let mut doc = Document::empty();
    doc.set_base_url("https://shop.example/");
    let root = doc.tree.root();
    let html = doc.tree.create_element("html");
    let head = doc.tree.create_element("head");
    let body = doc.tree.create_element("body");
    doc.tree.append_child(root, html).unwrap();
    doc.tree.append_child(html, head).unwrap();
    doc.tree.append_child(html, body).unwrap();

    let title = doc.tree.create_element("title");
    let title_text = doc.tree.create_text("Checkout");
    doc.tree.append_child(head, title).unwrap();
    doc.tree.append_child(title, title_text).unwrap();

    let card = doc.tree.create_element("div");
    doc.tree.set_attribute(card, "class", "card").unwrap();
    doc.tree.append_child(body, card).unwrap();

    let greeting = doc.tree.create_text("welcome back");
    doc.tree.append_child(card, greeting).unwrap();

    let input = doc.tree.create_element("input");
    doc.tree.set_attribute(input, "type", "text").unwrap();
    doc.tree
        .set_attribute(input, "placeholder", "search here")
        .unwrap();
    doc.tree.append_child(card, input).unwrap();

    (doc, card, input)
}

fn capture_and_flush(doc: &Document) -> (NodeRegistry, SessionContext, Vec<NodeRecord>) {
    let mut registry = NodeRegistry::new();
    let mut ctx = SessionContext::new();
    let config = CaptureConfig::new();

    let mut queue = DiscoveryQueue::new();
    queue.schedule(DiscoveryTask {
        root: doc.tree.root(),
        epoch: ctx.epoch(),
    });
    run_discovery(&mut queue, &mut registry, &mut ctx, doc, &config);

    let records: Vec<NodeRecord> = registry.flush().iter().map(|v| v.to_record()).collect();
    (registry, ctx, records)
}

#[test]
fn roundtrip_rebuilds_matching_mirror() {
    init_logging();
    let (doc, live_card, _) = live_document();
    let (registry, _ctx, records) = capture_and_flush(&doc);

    // The wire survives serialization untouched.
    let json = serde_json::to_string(&records).unwrap();
    let shipped: Vec<NodeRecord> = serde_json::from_str(&json).unwrap();
    assert_eq!(shipped, records);

    let mut recon = Reconstructor::new(1280.0, 720.0);
    recon.apply_all(&shipped);

    let mirror = recon.document();
    for record in &shipped {
        let Some(node) = recon.node(record.id) else {
            panic!("id {} missing from mirror", record.id);
        };
        if record.tag == "*T" {
            assert_eq!(
                mirror.tree.text(node).map(str::to_string),
                record.value.clone(),
                "text mismatch for id {}",
                record.id
            );
            continue;
        }
        // Attribute maps match the captured snapshot for every id.
        for (name, value) in &record.attributes {
            assert_eq!(
                mirror.tree.attribute(node, name),
                Some(value.as_str()),
                "attribute {name} mismatch for id {}",
                record.id
            );
        }
        assert_eq!(
            mirror.tree.attribute(node, ID_ATTRIBUTE),
            Some(record.id.to_string().as_str())
        );
    }

    // Structure carried over: the card div sits under the mirror body.
    let card_id = registry.id_of(live_card).unwrap();
    let mirror_card = recon.node(card_id).unwrap();
    assert_eq!(mirror.tree.parent(mirror_card), mirror.body());
    assert_eq!(mirror.tree.attribute(mirror_card, "class"), Some("card"));
}

#[test]
fn roundtrip_masks_sensitive_values() {
    init_logging();
    let (doc, _, live_input) = live_document();
    let (registry, _ctx, records) = capture_and_flush(&doc);

    let mut recon = Reconstructor::new(1280.0, 720.0);
    recon.apply_all(&records);

    let input_id = registry.id_of(live_input).unwrap();
    let node = recon.node(input_id).unwrap();
    // The placeholder crossed the wire masked; the mirror never sees it.
    assert_eq!(
        recon.document().tree.attribute(node, "placeholder"),
        Some("****** ****")
    );
}

#[test]
fn roundtrip_incremental_update() {
    init_logging();
    let (mut doc, live_card, _) = live_document();
    let mut registry = NodeRegistry::new();
    let mut ctx = SessionContext::new();
    let config = CaptureConfig::new();

    let mut queue = DiscoveryQueue::new();
    queue.schedule(DiscoveryTask {
        root: doc.tree.root(),
        epoch: ctx.epoch(),
    });
    run_discovery(&mut queue, &mut registry, &mut ctx, &doc, &config);

    let mut recon = Reconstructor::new(1280.0, 720.0);
    let records: Vec<NodeRecord> = registry.flush().iter().map(|v| v.to_record()).collect();
    recon.apply_all(&records);

    // A second sweep settles next-sibling links resolved against nodes
    // that were unregistered during the first pass.
    queue.schedule(DiscoveryTask {
        root: doc.tree.root(),
        epoch: ctx.epoch(),
    });
    run_discovery(&mut queue, &mut registry, &mut ctx, &doc, &config);
    let settled: Vec<NodeRecord> = registry.flush().iter().map(|v| v.to_record()).collect();
    recon.apply_all(&settled);

    // Mutate the live tree and rediscover.
    doc.tree
        .set_attribute(live_card, "class", "card highlighted")
        .unwrap();
    queue.schedule(DiscoveryTask {
        root: doc.tree.root(),
        epoch: ctx.epoch(),
    });
    run_discovery(&mut queue, &mut registry, &mut ctx, &doc, &config);

    let card_id = registry.id_of(live_card).unwrap();
    let updates: Vec<NodeRecord> = registry.flush().iter().map(|v| v.to_record()).collect();
    // The changed card flushes, plus its element child whose selector
    // prefix changed with it.
    assert_eq!(updates.len(), 2);
    assert_eq!(updates[0].id, card_id);
    recon.apply_all(&updates);

    let mirror_card = recon.node(card_id).unwrap();
    assert_eq!(
        recon.document().tree.attribute(mirror_card, "class"),
        Some("card highlighted")
    );
    // Still attached in place after the update.
    assert_eq!(recon.document().tree.parent(mirror_card), recon.document().body());
}
