//! Shared type definitions for the Mistmap fog-of-war server.
//!
//! This crate is the single source of truth for every type that crosses a
//! crate boundary in the Mistmap workspace. Document types are what the
//! store persists, projection types are what viewers are allowed to see,
//! and protocol types are the WebSocket wire format. All of them flow
//! downstream to `TypeScript` via `ts-rs` for the browser map clients.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for connection identifiers
//! - [`point`] -- The 2-D world-coordinate point
//! - [`model`] -- Persisted document types (worlds, regions, creatures, species)
//! - [`visible`] -- Derived read-only projections exposed to viewers
//! - [`protocol`] -- WebSocket event envelopes for both channel roles

pub mod ids;
pub mod model;
pub mod point;
pub mod protocol;
pub mod visible;

// Re-export all public types at crate root for convenience.
pub use ids::ConnectionId;
pub use model::{
    Creature, Grid, GridType, Region, RegionImage, RegionState, Species, SpeciesState, Subregion,
    World,
};
pub use point::Point2D;
pub use protocol::{ControllerCommand, ControllerEvent, ControllerRequest, ViewerEvent};
pub use visible::{VisibleCreature, VisibleRegion, VisibleWorld};

#[cfg(test)]
mod tests {
    //! Integration tests for type exports and `TypeScript` binding generation.

    #[test]
    fn export_bindings() {
        // ts-rs generates TypeScript bindings when types with
        // #[ts(export)] are used. Importing them here triggers generation.
        // The actual files are written to the `bindings/` directory
        // relative to the crate root.
        use ts_rs::TS;

        let _ = crate::point::Point2D::export_all();

        let _ = crate::model::World::export_all();
        let _ = crate::model::Grid::export_all();
        let _ = crate::model::GridType::export_all();
        let _ = crate::model::RegionImage::export_all();
        let _ = crate::model::RegionState::export_all();
        let _ = crate::model::Subregion::export_all();
        let _ = crate::model::Region::export_all();
        let _ = crate::model::Creature::export_all();
        let _ = crate::model::SpeciesState::export_all();
        let _ = crate::model::Species::export_all();

        let _ = crate::visible::VisibleWorld::export_all();
        let _ = crate::visible::VisibleRegion::export_all();
        let _ = crate::visible::VisibleCreature::export_all();

        let _ = crate::protocol::ControllerRequest::export_all();
        let _ = crate::protocol::ControllerCommand::export_all();
        let _ = crate::protocol::ControllerEvent::export_all();
        let _ = crate::protocol::ViewerEvent::export_all();
    }
}
