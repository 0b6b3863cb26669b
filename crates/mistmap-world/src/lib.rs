//! Fog-of-war geometry and world state for the Mistmap server.
//!
//! This crate holds the two domain cores:
//!
//! - [`fog`] -- the visibility engine: a pure function folding a region's
//!   ordered subregion toggles into simple, hole-free contours suitable
//!   for direct rendering.
//! - [`state`] -- [`WorldState`]: the active world plus a write-through
//!   cache of its regions and creatures, backed by the document store,
//!   mutated only through explicit operations.
//!
//! Everything here is synchronous and lock-free; the gateway decides how
//! access is serialized.

pub mod error;
pub mod fog;
pub mod state;

pub use error::WorldError;
pub use fog::compute_visible;
pub use state::WorldState;
