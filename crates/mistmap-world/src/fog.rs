//! The visibility engine: subregion toggles in, renderable contours out.
//!
//! [`compute_visible`] folds a region's ordered subregion list into the
//! revealed area, then flattens any interior holes with slit incisions so
//! every connected component comes out as one simple ring a client can
//! fill directly. The function is pure and deterministic: same region in,
//! same contours out, no side effects, safe to call on every mutation.
//!
//! The polygon algebra is delegated to the `geo` crate's [`BooleanOps`]
//! (robust integer-grid overlay); only the slit construction is ours.

use geo::{BooleanOps, BoundingRect, Centroid, Coord, LineString, MultiPolygon, Polygon};
use mistmap_types::{Point2D, Region, RegionImage, VisibleRegion};

use crate::error::WorldError;

/// Half-width of a hole incision in world units.
///
/// The cut this produces is two ten-thousandths of a unit wide --
/// invisible at any sane zoom, but enough for the overlay to register the
/// channel that merges a hole into the outer boundary.
const SLIT_HALF_WIDTH: f64 = 1e-4;

/// Upper bound on hole-incision passes.
///
/// One pass handles every hole that exists when flattening starts; the
/// loop only repeats if a cut itself exposed a new interior, which takes
/// adversarial input. Anything still holed after this many passes is
/// dropped with its exterior kept, which renders slightly too much rather
/// than looping forever.
const MAX_INCISION_PASSES: usize = 8;

/// Compute the viewer-facing projection of a region.
///
/// 1. Start from the image rectangle when `region.visible`, else empty.
/// 2. Fold subregions in list order: visible polygons are unioned in,
///    hidden polygons subtracted. Later entries override earlier ones
///    wherever they overlap. Polygons with fewer than 3 points contribute
///    nothing.
/// 3. Flatten interior holes via slit incision.
/// 4. Emit each connected component's exterior as an open ring.
///
/// Subregions are deliberately not clipped to the image rectangle: a
/// visible subregion drawn past the image edge extends the revealed area
/// past it, exactly as the authoring tools preview it.
///
/// # Errors
///
/// Returns [`WorldError::UnknownState`] if `region.current_state` does
/// not name an entry in `region.states`.
pub fn compute_visible(region: &Region) -> Result<VisibleRegion, WorldError> {
    let image = region
        .current_image()
        .ok_or_else(|| WorldError::UnknownState {
            id: region.id.clone(),
            state: region.current_state.clone(),
        })?;

    let mut area: MultiPolygon<f64> = if region.visible {
        MultiPolygon::new(vec![image_rect(image)])
    } else {
        MultiPolygon::new(Vec::new())
    };

    for subregion in &region.subregions {
        if !subregion.is_fillable() {
            continue;
        }
        let overlay = MultiPolygon::new(vec![polygon_from_points(&subregion.polygon)]);
        area = if subregion.visible {
            area.union(&overlay)
        } else {
            area.difference(&overlay)
        };
    }

    let area = incise_holes(area);

    Ok(VisibleRegion {
        name: region.name.clone(),
        grid: region.grid,
        image: image.clone(),
        fog_contours: open_rings(&area),
    })
}

/// The rectangle a region image occupies, in world coordinates.
fn image_rect(image: &RegionImage) -> Polygon<f64> {
    let Point2D(x, y) = image.top_left_corner;
    Polygon::new(
        LineString::new(vec![
            Coord { x, y },
            Coord {
                x: x + image.width,
                y,
            },
            Coord {
                x: x + image.width,
                y: y + image.height,
            },
            Coord {
                x,
                y: y + image.height,
            },
        ]),
        Vec::new(),
    )
}

/// Build a (possibly self-intersecting) polygon from raw vertex input.
fn polygon_from_points(points: &[Point2D]) -> Polygon<f64> {
    let coords: Vec<Coord<f64>> = points.iter().map(|p| Coord { x: p.x(), y: p.y() }).collect();
    Polygon::new(LineString::new(coords), Vec::new())
}

/// Merge every interior hole into its polygon's outer boundary.
///
/// For each hole, a hair-thin slit is cut from the hole's centroid
/// straight down (+y, screen orientation) to a line safely outside the
/// area's bounding box, and subtracted. The hole becomes a bay of the
/// exterior and the component collapses to one simple ring.
fn incise_holes(mut area: MultiPolygon<f64>) -> MultiPolygon<f64> {
    for _ in 0..MAX_INCISION_PASSES {
        let Some(bounds) = area.bounding_rect() else {
            return area;
        };
        // Clear of the bounding box by a full box height (at least one
        // unit), so the slit always reaches open air.
        let far_y = bounds.max().y + bounds.height().max(1.0) + 1.0;

        let centroids: Vec<Coord<f64>> = area
            .iter()
            .flat_map(|polygon| polygon.interiors().iter())
            .filter_map(|hole| hole.centroid())
            .map(|c| Coord { x: c.x(), y: c.y() })
            .collect();
        if centroids.is_empty() {
            return area;
        }

        for centroid in centroids {
            let slit = MultiPolygon::new(vec![Polygon::new(
                LineString::new(vec![
                    Coord {
                        x: centroid.x - SLIT_HALF_WIDTH,
                        y: centroid.y,
                    },
                    Coord {
                        x: centroid.x + SLIT_HALF_WIDTH,
                        y: centroid.y,
                    },
                    Coord {
                        x: centroid.x + SLIT_HALF_WIDTH,
                        y: far_y,
                    },
                    Coord {
                        x: centroid.x - SLIT_HALF_WIDTH,
                        y: far_y,
                    },
                ]),
                Vec::new(),
            )]);
            area = area.difference(&slit);
        }
    }
    area
}

/// Emit each component's exterior boundary as an open ring.
///
/// Boolean-op output rings are closed (first point repeated last); the
/// repeat is dropped. Components too degenerate to enclose area are
/// skipped.
fn open_rings(area: &MultiPolygon<f64>) -> Vec<Vec<Point2D>> {
    area.iter()
        .filter_map(|polygon| {
            let mut ring: Vec<Point2D> = polygon
                .exterior()
                .coords()
                .map(|c| Point2D(c.x, c.y))
                .collect();
            if ring.len() > 1 && ring.first() == ring.last() {
                ring.pop();
            }
            (ring.len() >= 3).then_some(ring)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::collections::BTreeMap;

    use mistmap_types::{RegionState, Subregion};

    use super::*;

    fn region_with(visible: bool, subregions: Vec<Subregion>) -> Region {
        let mut states = BTreeMap::new();
        states.insert(
            "default".to_owned(),
            RegionState {
                image: RegionImage {
                    path: "regions/test.png".to_owned(),
                    top_left_corner: Point2D(0.0, 0.0),
                    width: 10.0,
                    height: 10.0,
                },
            },
        );
        Region {
            id: "test".to_owned(),
            name: "Test Region".to_owned(),
            grid: None,
            states,
            current_state: "default".to_owned(),
            visible,
            subregions,
        }
    }

    fn square(x0: f64, y0: f64, x1: f64, y1: f64, visible: bool) -> Subregion {
        Subregion {
            label: None,
            polygon: vec![
                Point2D(x0, y0),
                Point2D(x1, y0),
                Point2D(x1, y1),
                Point2D(x0, y1),
            ],
            visible,
        }
    }

    /// Quantize to a 1e-6 grid so overlay jitter cannot flake a test.
    #[allow(clippy::cast_possible_truncation)]
    fn key(p: Point2D) -> (i64, i64) {
        ((p.x() * 1e6).round() as i64, (p.y() * 1e6).round() as i64)
    }

    fn sorted_keys(ring: &[Point2D]) -> Vec<(i64, i64)> {
        let mut keys: Vec<(i64, i64)> = ring.iter().copied().map(key).collect();
        keys.sort_unstable();
        keys
    }

    /// Unsigned shoelace area of an open ring.
    fn ring_area(ring: &[Point2D]) -> f64 {
        let mut doubled = 0.0;
        for (i, a) in ring.iter().enumerate() {
            let b = ring[(i + 1) % ring.len()];
            doubled += a.x() * b.y() - b.x() * a.y();
        }
        doubled.abs() / 2.0
    }

    #[test]
    fn all_visible_no_subregions_is_image_rect() {
        let region = region_with(true, Vec::new());
        let visible = compute_visible(&region).unwrap();

        assert_eq!(visible.fog_contours.len(), 1);
        let ring = &visible.fog_contours[0];
        assert_eq!(ring.len(), 4);
        assert_eq!(
            sorted_keys(ring),
            sorted_keys(&[
                Point2D(0.0, 0.0),
                Point2D(10.0, 0.0),
                Point2D(10.0, 10.0),
                Point2D(0.0, 10.0),
            ])
        );
    }

    #[test]
    fn fogged_no_subregions_is_empty() {
        let region = region_with(false, Vec::new());
        let visible = compute_visible(&region).unwrap();
        assert!(visible.fog_contours.is_empty());
    }

    #[test]
    fn revealed_window_in_fogged_region() {
        // Fogged 10x10 image, one revealed square: only that square shows.
        let region = region_with(false, vec![square(2.0, 2.0, 8.0, 8.0, true)]);
        let visible = compute_visible(&region).unwrap();

        assert_eq!(visible.fog_contours.len(), 1);
        let ring = &visible.fog_contours[0];
        assert_eq!(ring.len(), 4);
        assert_eq!(
            sorted_keys(ring),
            sorted_keys(&[
                Point2D(2.0, 2.0),
                Point2D(8.0, 2.0),
                Point2D(8.0, 8.0),
                Point2D(2.0, 8.0),
            ])
        );
    }

    #[test]
    fn later_subregion_wins_on_overlap() {
        let reveal = square(2.0, 2.0, 8.0, 8.0, true);
        let hide = square(2.0, 2.0, 8.0, 8.0, false);

        // Reveal then hide: hidden wins, nothing shows.
        let region = region_with(false, vec![reveal.clone(), hide.clone()]);
        let visible = compute_visible(&region).unwrap();
        assert!(visible.fog_contours.is_empty());

        // Hide then reveal: revealed wins, the square shows.
        let region = region_with(false, vec![hide, reveal]);
        let visible = compute_visible(&region).unwrap();
        assert_eq!(visible.fog_contours.len(), 1);
    }

    #[test]
    fn enclosed_hole_collapses_to_single_ring() {
        // Visible image with a fully enclosed hidden square: a donut.
        // The slit incision must merge the hole into the outer boundary
        // so exactly one simple ring comes out, not two nested ones.
        let region = region_with(true, vec![square(3.0, 3.0, 7.0, 7.0, false)]);
        let visible = compute_visible(&region).unwrap();

        assert_eq!(visible.fog_contours.len(), 1);
        let ring = &visible.fog_contours[0];
        // Outer rectangle + inner boundary + slit walls: well past 4 points.
        assert!(ring.len() > 4, "expected a slit ring, got {ring:?}");
        // Area is the 100-unit rectangle minus the 16-unit hole, minus a
        // sliver for the slit itself.
        let area = ring_area(ring);
        assert!((area - 84.0).abs() < 0.01, "area was {area}");
    }

    #[test]
    fn degenerate_subregions_are_skipped() {
        let region = region_with(
            false,
            vec![
                Subregion {
                    label: None,
                    polygon: Vec::new(),
                    visible: true,
                },
                Subregion {
                    label: None,
                    polygon: vec![Point2D(1.0, 1.0), Point2D(4.0, 4.0)],
                    visible: true,
                },
            ],
        );
        let visible = compute_visible(&region).unwrap();
        assert!(visible.fog_contours.is_empty());
    }

    #[test]
    fn out_of_rect_subregion_is_not_clipped() {
        // A revealed polygon entirely outside the image rectangle still
        // participates in the algebra and shows up unclipped.
        let region = region_with(false, vec![square(20.0, 20.0, 25.0, 25.0, true)]);
        let visible = compute_visible(&region).unwrap();

        assert_eq!(visible.fog_contours.len(), 1);
        let area = ring_area(&visible.fog_contours[0]);
        assert!((area - 25.0).abs() < 0.01, "area was {area}");
    }

    #[test]
    fn disjoint_reveals_make_separate_rings() {
        let region = region_with(
            false,
            vec![
                square(1.0, 1.0, 3.0, 3.0, true),
                square(6.0, 6.0, 9.0, 9.0, true),
            ],
        );
        let visible = compute_visible(&region).unwrap();
        assert_eq!(visible.fog_contours.len(), 2);
    }

    #[test]
    fn overlapping_reveals_merge() {
        let region = region_with(
            false,
            vec![
                square(1.0, 1.0, 5.0, 5.0, true),
                square(4.0, 4.0, 8.0, 8.0, true),
            ],
        );
        let visible = compute_visible(&region).unwrap();
        assert_eq!(visible.fog_contours.len(), 1);
        let area = ring_area(&visible.fog_contours[0]);
        // 16 + 16 - 1 overlap.
        assert!((area - 31.0).abs() < 0.01, "area was {area}");
    }

    #[test]
    fn unknown_current_state_errors() {
        let mut region = region_with(true, Vec::new());
        region.current_state = "missing".to_owned();
        let err = compute_visible(&region);
        assert!(matches!(err, Err(WorldError::UnknownState { .. })));
    }

    #[test]
    fn result_is_deterministic() {
        let region = region_with(
            true,
            vec![
                square(3.0, 3.0, 7.0, 7.0, false),
                square(4.0, 4.0, 5.0, 5.0, true),
            ],
        );
        let a = compute_visible(&region).unwrap();
        let b = compute_visible(&region).unwrap();
        assert_eq!(a.fog_contours, b.fog_contours);
    }
}
