//! Persisted document types: worlds, regions, creatures, and species.
//!
//! These structs mirror the YAML documents in the world folder exactly.
//! The document store reads and writes them verbatim; the gateway ships
//! them in full over the controller channel only. Viewers never see these
//! types -- they receive the projections in [`crate::visible`] instead.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::point::Point2D;

// ---------------------------------------------------------------------------
// World
// ---------------------------------------------------------------------------

/// A game world: a named collection of regions with one currently shown.
///
/// One world is active per server session. Document ids double as folder
/// and file names in the store, so they must never contain path separators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct World {
    /// Document id (also the world's folder name).
    pub id: String,
    /// Display name shown to controllers and viewers.
    pub name: String,
    /// Id of the region currently shown to viewers.
    pub current_region: String,
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// Overlay grid style for a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
#[serde(rename_all = "lowercase")]
pub enum GridType {
    /// Hexagonal grid.
    Hex,
    /// Square grid.
    Square,
}

/// An optional measurement grid drawn over the region image.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Grid {
    /// Grid cell shape.
    #[serde(rename = "type")]
    pub grid_type: GridType,
    /// Cell size in world units.
    pub size: f64,
}

/// The base image of a region state, placed in world coordinates.
///
/// The rectangle spanned by `top_left_corner`, `width`, and `height` is the
/// area the fog algebra starts from when the region is visible.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RegionImage {
    /// Path relative to the world's image root, always `/`-separated.
    pub path: String,
    /// World coordinate of the image's top-left corner.
    pub top_left_corner: Point2D,
    /// Image width in world units.
    pub width: f64,
    /// Image height in world units.
    pub height: f64,
}

/// One named state of a region (e.g. "default", "burning").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct RegionState {
    /// The base image shown while this state is current.
    pub image: RegionImage,
}

/// A user-drawn polygon overlay with an independent visibility toggle.
///
/// Subregions are owned by their region and have no id of their own. Their
/// order in [`Region::subregions`] is semantically significant: where two
/// subregions overlap, the later entry wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Subregion {
    /// Optional display label used by the authoring tools.
    pub label: Option<String>,
    /// Polygon vertices in draw order. Fewer than 3 points is a degenerate
    /// subregion: it stays in the list (it may be edited into shape later)
    /// but contributes nothing to the fog algebra.
    pub polygon: Vec<Point2D>,
    /// Whether this subregion reveals (`true`) or fogs (`false`) its area.
    pub visible: bool,
}

impl Subregion {
    /// Whether the polygon has enough vertices to enclose any area.
    pub fn is_fillable(&self) -> bool {
        self.polygon.len() >= 3
    }
}

/// A region document: a base image per state plus ordered subregion overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Region {
    /// Document id (also the YAML file name).
    pub id: String,
    /// Display name shown to controllers and viewers.
    pub name: String,
    /// Optional measurement grid.
    pub grid: Option<Grid>,
    /// Named states, each with its own base image.
    pub states: BTreeMap<String, RegionState>,
    /// Key into `states` selecting the image currently shown.
    pub current_state: String,
    /// Whether the base image rectangle starts out revealed.
    pub visible: bool,
    /// Ordered overlay polygons. Later entries override earlier ones
    /// wherever they overlap.
    pub subregions: Vec<Subregion>,
}

impl Region {
    /// The image of the current state, or `None` if `current_state` does
    /// not name an entry in `states`.
    pub fn current_image(&self) -> Option<&RegionImage> {
        self.states.get(&self.current_state).map(|s| &s.image)
    }
}

// ---------------------------------------------------------------------------
// Creature
// ---------------------------------------------------------------------------

/// A creature placed somewhere in the world.
///
/// Creatures are independent documents, not composited into the fog
/// geometry: their visibility is a plain boolean filtered per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Creature {
    /// Document id (also the YAML file name).
    pub id: String,
    /// Display name shown to controllers and viewers.
    pub name: String,
    /// Id of the species providing this creature's sprites.
    pub species: String,
    /// Key into the species' state map selecting the sprite.
    pub current_state: String,
    /// Whether viewers may see this creature.
    pub visible: bool,
    /// Id of the region the creature currently stands in.
    pub current_region: String,
    /// World coordinate of the creature.
    pub position: Point2D,
}

// ---------------------------------------------------------------------------
// Species
// ---------------------------------------------------------------------------

/// One named sprite of a species (e.g. "idle", "dead").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SpeciesState {
    /// Sprite path relative to the world's image root.
    pub image: String,
    /// Sprite width in world units.
    pub width: f64,
    /// Sprite height in world units.
    pub height: f64,
}

/// Read-only reference data resolving a creature's sprite per state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Species {
    /// Document id (also the YAML file name).
    pub id: String,
    /// Display name (authoring-side only).
    pub name: String,
    /// Named sprites keyed by state name.
    pub states: BTreeMap<String, SpeciesState>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_region() -> Region {
        let mut states = BTreeMap::new();
        states.insert(
            "default".to_owned(),
            RegionState {
                image: RegionImage {
                    path: "regions/keep_default.png".to_owned(),
                    top_left_corner: Point2D(0.0, 0.0),
                    width: 10.0,
                    height: 10.0,
                },
            },
        );
        Region {
            id: "keep".to_owned(),
            name: "The Keep".to_owned(),
            grid: Some(Grid {
                grid_type: GridType::Square,
                size: 1.0,
            }),
            states,
            current_state: "default".to_owned(),
            visible: true,
            subregions: vec![Subregion {
                label: Some("courtyard".to_owned()),
                polygon: vec![Point2D(2.0, 2.0), Point2D(8.0, 2.0), Point2D(8.0, 8.0)],
                visible: false,
            }],
        }
    }

    #[test]
    fn region_yaml_field_names() {
        let region = sample_region();
        let json = serde_json::to_value(&region).ok();
        assert!(json.is_some());
        if let Some(value) = json {
            // The grid shape is stored under "type", not "grid_type".
            assert_eq!(value["grid"]["type"], "square");
            assert_eq!(value["states"]["default"]["image"]["width"], 10.0);
            assert_eq!(value["subregions"][0]["polygon"][1][0], 8.0);
        }
    }

    #[test]
    fn current_image_resolves_state() {
        let region = sample_region();
        assert!(region.current_image().is_some());

        let mut broken = region;
        broken.current_state = "missing".to_owned();
        assert!(broken.current_image().is_none());
    }

    #[test]
    fn degenerate_subregion_is_not_fillable() {
        let sub = Subregion {
            label: None,
            polygon: vec![Point2D(0.0, 0.0), Point2D(1.0, 1.0)],
            visible: true,
        };
        assert!(!sub.is_fillable());
    }
}
