//! Privacy masking
//!
//! The irreversible text transform plus the policy deciding whether a
//! node's content is masked. Policy precedence: explicit mask/unmask
//! override attributes always win (checked last, unconditionally); then
//! sensitive input names; then sensitive input types; inheritance from the
//! parent applies on first observation only.

use std::collections::BTreeMap;

/// Explicit per-element mask override
pub const MASK_ATTRIBUTE: &str = "data-specular-mask";

/// Explicit per-element unmask override
pub const UNMASK_ATTRIBUTE: &str = "data-specular-unmask";

/// Input types whose values are always sensitive
pub const SENSITIVE_INPUT_TYPES: &[&str] = &["password", "hidden", "email"];

/// Substrings of an input's name attribute that mark it sensitive
pub const SENSITIVE_NAME_TERMS: &[&str] = &[
    "address", "phone", "tel", "ssn", "social", "email", "zip", "postal", "card", "cvv",
    "account", "password", "secret", "birth",
];

/// Irreversibly mask a string: every non-whitespace character becomes '*'.
/// Whitespace survives so masked text keeps its word shape.
pub fn mask_text(text: &str) -> String {
    text.chars()
        .map(|c| if c.is_whitespace() { c } else { '*' })
        .collect()
}

/// Whether the element carries the explicit unmask override
pub fn is_unmasked(attributes: &BTreeMap<String, String>) -> bool {
    attributes.contains_key(UNMASK_ATTRIBUTE)
}

/// Resolve the masked flag for a node.
///
/// `current` is the node's previous masked state (false for a new node);
/// `inherited` is the parent's masked state, passed only on first
/// observation.
pub fn resolve(
    tag: &str,
    attributes: &BTreeMap<String, String>,
    current: bool,
    inherited: Option<bool>,
) -> bool {
    let mut masked = inherited.unwrap_or(current);

    if tag.eq_ignore_ascii_case("input") {
        if let Some(name) = attributes.get("name") {
            let name = name.to_ascii_lowercase();
            if SENSITIVE_NAME_TERMS.iter().any(|t| name.contains(t)) {
                masked = true;
            }
        }
        if let Some(input_type) = attributes.get("type") {
            if SENSITIVE_INPUT_TYPES.contains(&input_type.to_ascii_lowercase().as_str()) {
                masked = true;
            }
        }
    }

    // Overrides are checked last and win unconditionally.
    if attributes.contains_key(MASK_ATTRIBUTE) {
        masked = true;
    }
    if is_unmasked(attributes) {
        masked = false;
    }
    masked
}
