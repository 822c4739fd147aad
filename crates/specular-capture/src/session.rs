//! Session-scoped context
//!
//! All counters that must survive across individual operations but die
//! with the session live here: the id counter, region ordinals, the
//! sampled baseline text color, and the session epoch. Constructed at
//! session start, threaded explicitly, discarded at session end.

use std::collections::HashMap;
use std::time::Instant;

/// Per-session state threaded through every capture operation
#[derive(Debug)]
pub struct SessionContext {
    /// Next node id to hand out; ids start at 1 and are never reused
    next_id: u32,
    /// Bumped on every reset; in-flight work from an older epoch must no-op
    epoch: u64,
    /// Session start, for history timestamps
    started: Instant,
    /// Running per-name region ordinals (session lifetime, not per call)
    region_ordinals: HashMap<String, u32>,
    /// Baseline text color, sampled once per session
    baseline_color: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        tracing::debug!("capture session started");
        Self {
            next_id: 1,
            epoch: 0,
            started: Instant::now(),
            region_ordinals: HashMap::new(),
            baseline_color: None,
        }
    }

    /// Allocate the next node id
    pub fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    /// Current session epoch
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Milliseconds since session start
    pub fn now_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Discard all session state and invalidate in-flight work from the
    /// previous generation
    pub fn reset(&mut self) {
        tracing::debug!(epoch = self.epoch + 1, "capture session reset");
        self.next_id = 1;
        self.epoch += 1;
        self.region_ordinals.clear();
        self.baseline_color = None;
    }

    /// Current ordinal for a region name (0 when never matched)
    pub fn region_ordinal(&self, name: &str) -> u32 {
        self.region_ordinals.get(name).copied().unwrap_or(0)
    }

    /// Bump and return the ordinal for a region name
    pub fn bump_region_ordinal(&mut self, name: &str) -> u32 {
        let counter = self.region_ordinals.entry(name.to_string()).or_insert(0);
        *counter += 1;
        *counter
    }

    /// Sampled baseline text color, if any
    pub fn baseline_color(&self) -> Option<&str> {
        self.baseline_color.as_deref()
    }

    /// Record the baseline text color; only the first sample sticks
    pub fn sample_baseline_color(&mut self, color: &str) {
        if self.baseline_color.is_none() {
            self.baseline_color = Some(color.to_string());
        }
    }
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_start_at_one() {
        let mut ctx = SessionContext::new();
        assert_eq!(ctx.allocate_id(), 1);
        assert_eq!(ctx.allocate_id(), 2);
    }

    #[test]
    fn test_reset_bumps_epoch_and_restarts_ids() {
        let mut ctx = SessionContext::new();
        ctx.allocate_id();
        ctx.bump_region_ordinal("cart");
        ctx.sample_baseline_color("rgb(0, 0, 0)");

        let epoch = ctx.epoch();
        ctx.reset();

        assert_eq!(ctx.epoch(), epoch + 1);
        assert_eq!(ctx.allocate_id(), 1);
        assert_eq!(ctx.region_ordinal("cart"), 0);
        assert!(ctx.baseline_color().is_none());
    }

    #[test]
    fn test_baseline_sampled_once() {
        let mut ctx = SessionContext::new();
        ctx.sample_baseline_color("rgb(10, 10, 10)");
        ctx.sample_baseline_color("rgb(99, 99, 99)");
        assert_eq!(ctx.baseline_color(), Some("rgb(10, 10, 10)"));
    }
}
