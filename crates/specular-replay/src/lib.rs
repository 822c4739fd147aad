//! Specular replay - Mirror reconstruction
//!
//! Consumes the ordered record stream produced by the capture side and
//! mutates a target document to match. The reconstructor owns its target
//! exclusively and keeps its own id -> node table; the two sides share
//! nothing but the integer ids on the wire.
//!
//! Failures are record-scoped: a bad record is logged and abandoned,
//! never fatal to the session.

mod reconstructor;
mod stage;

pub use reconstructor::{Reconstructor, ReplayError};
pub use stage::{Stage, STAGE_MARGIN};
