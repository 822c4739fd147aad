//! Capture configuration
//!
//! Supplied by the operator at session start and threaded explicitly; no
//! global state.

use std::collections::BTreeMap;

/// Attribute names always masked unless the element is explicitly unmasked
pub const DEFAULT_SENSITIVE_ATTRIBUTES: &[&str] = &["value", "placeholder", "alt", "title"];

/// Session-level capture configuration
#[derive(Debug, Clone, Default)]
pub struct CaptureConfig {
    /// Operator-supplied sensitive attribute names, appended to the defaults
    pub sensitive_attributes: Vec<String>,
    /// Region name -> selector pattern; missing entries are simply skipped
    pub regions: BTreeMap<String, String>,
    /// Selector patterns opting elements into box-model monitoring
    pub box_model: Vec<String>,
}

impl CaptureConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether an attribute name is in the sensitive set (defaults plus
    /// operator additions)
    pub fn is_sensitive_attribute(&self, name: &str) -> bool {
        DEFAULT_SENSITIVE_ATTRIBUTES.contains(&name)
            || self.sensitive_attributes.iter().any(|s| s == name)
    }
}
