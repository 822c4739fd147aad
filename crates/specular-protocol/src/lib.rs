//! Specular protocol - Wire contract
//!
//! The two sides of the mirror share no memory; they correlate purely
//! through the integer node ids carried by these records. This crate owns
//! the record shapes, the reserved tag markers, and the auxiliary replay
//! events.

mod events;
mod record;

pub use events::{Axis, ResizeEvent, ScrollEvent};
pub use record::{NodeRecord, TagMarker};

/// Reserved tag for doctype records
pub const DOCTYPE_TAG: &str = "*D";

/// Reserved tag for text-node records
pub const TEXT_TAG: &str = "*T";

/// Reserved tag for ignored nodes (scripts, meta); carries no other data
pub const IGNORE_TAG: &str = "*I";

/// Tag prefix selecting the SVG namespace on replay
pub const SVG_PREFIX: &str = "s:";

/// Reserved attribute mirroring the numeric node id on replayed elements
pub const ID_ATTRIBUTE: &str = "data-id";

/// Synthetic attribute on head records carrying the document base href.
/// Consumed by the reconstructor and stripped before real attributes apply.
pub const BASE_ATTRIBUTE: &str = "*B";

/// Doctype record attribute keys
pub const DOCTYPE_NAME: &str = "name";
pub const DOCTYPE_PUBLIC_ID: &str = "publicId";
pub const DOCTYPE_SYSTEM_ID: &str = "systemId";
