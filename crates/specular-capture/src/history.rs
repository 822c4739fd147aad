//! Change history (diagnostic only)
//!
//! An injectable observer rather than a host-environment flag check: the
//! host wires a `HistoryLog` (or its own observer) into the registry when
//! diagnostics are wanted. Never required for correct replay.

use std::collections::HashMap;

use crate::capture::NodeInfo;
use crate::registry::{NodeValue, ObserveSource};

/// Observer notified on every observation and removal
pub trait ChangeObserver {
    fn on_change(&mut self, id: u32, source: ObserveSource, value: &NodeValue, time_ms: u64);
}

/// One history entry for a node
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub time_ms: u64,
    pub source: ObserveSource,
    pub snapshot: NodeInfo,
}

/// Per-id append-only change log
#[derive(Debug, Default)]
pub struct HistoryLog {
    entries: HashMap<u32, Vec<HistoryEntry>>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// History of one id, oldest first
    pub fn history(&self, id: u32) -> &[HistoryEntry] {
        self.entries.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Ids with any recorded history
    pub fn ids(&self) -> impl Iterator<Item = u32> + '_ {
        self.entries.keys().copied()
    }
}

impl ChangeObserver for HistoryLog {
    fn on_change(&mut self, id: u32, source: ObserveSource, value: &NodeValue, time_ms: u64) {
        self.entries.entry(id).or_default().push(HistoryEntry {
            time_ms,
            source,
            snapshot: value.info.clone(),
        });
    }
}
