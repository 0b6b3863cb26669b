//! The 2-D world-coordinate point.
//!
//! Points serialize as two-element arrays (`[x, y]`), which is how the
//! document YAML stores polygon vertices and how the browser clients
//! consume contour rings.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// A point in world coordinates. Serializes as `[x, y]`.
///
/// World coordinates are screen-oriented: x grows rightward, y grows
/// downward, matching the image placement produced by the authoring tools.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct Point2D(pub f64, pub f64);

impl Point2D {
    /// The x coordinate.
    pub const fn x(self) -> f64 {
        self.0
    }

    /// The y coordinate.
    pub const fn y(self) -> f64 {
        self.1
    }
}

impl From<(f64, f64)> for Point2D {
    fn from((x, y): (f64, f64)) -> Self {
        Self(x, y)
    }
}

impl From<Point2D> for (f64, f64) {
    fn from(p: Point2D) -> Self {
        (p.0, p.1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_array() {
        let p = Point2D(2.5, -8.0);
        let json = serde_json::to_string(&p).ok();
        assert_eq!(json.as_deref(), Some("[2.5,-8.0]"));
    }

    #[test]
    fn deserializes_from_array() {
        let p: Result<Point2D, _> = serde_json::from_str("[1, 2]");
        assert_eq!(p.ok(), Some(Point2D(1.0, 2.0)));
    }
}
