//! Derived read-only projections exposed to the viewer channel.
//!
//! Viewers must never learn anything the moderator has not revealed:
//! no document ids, no hidden subregions, no fogged creatures. These
//! types carry exactly the fields a map client needs to render, and are
//! recomputed from the documents on every mutation -- never persisted.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::model::{Grid, RegionImage};
use crate::point::Point2D;

/// The viewer-facing projection of a world: its display name only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VisibleWorld {
    /// Display name of the active world.
    pub name: String,
}

/// The viewer-facing projection of a region.
///
/// `fog_contours` is the output of the visibility engine: one simple,
/// hole-free open ring (last point not repeated) per connected component
/// of the revealed area. A client renders the image, then masks
/// everything outside these rings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VisibleRegion {
    /// Display name of the region.
    pub name: String,
    /// Optional measurement grid.
    pub grid: Option<Grid>,
    /// The base image of the region's current state.
    pub image: RegionImage,
    /// Simple closed rings bounding the revealed area, one per connected
    /// component, each an ordered vertex list with the first point not
    /// repeated at the end.
    pub fog_contours: Vec<Vec<Point2D>>,
}

/// The viewer-facing projection of a creature: name, place, and sprite.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct VisibleCreature {
    /// Display name of the creature.
    pub name: String,
    /// World coordinate of the creature.
    pub position: Point2D,
    /// Sprite path resolved from the creature's species and state.
    pub image: String,
    /// Sprite width in world units.
    pub width: f64,
    /// Sprite height in world units.
    pub height: f64,
}
