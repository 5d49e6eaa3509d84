//! Shape kinds.

use kurbo::{BezPath, Ellipse as KurboEllipse, Point, Rect, RoundedRect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CanvasError;

/// Corner radius of a square's outline.
const SQUARE_CORNER_RADIUS: f64 = 4.0;

/// The closed set of visual variants a shape can take.
///
/// The kind only selects outline geometry and label padding; handles,
/// resizing and label behavior are shared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeKind {
    #[default]
    Square,
    #[serde(alias = "elipse")]
    Ellipse,
}

impl ShapeKind {
    /// Get all kinds in toolbar order.
    pub fn all() -> &'static [ShapeKind] {
        &[ShapeKind::Square, ShapeKind::Ellipse]
    }

    /// Stable identifier, also used as the drag-and-drop payload.
    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Square => "square",
            ShapeKind::Ellipse => "ellipse",
        }
    }

    /// Padding between the outline and the label box, in canvas units.
    pub fn label_padding(&self) -> f64 {
        match self {
            ShapeKind::Square => 40.0,
            ShapeKind::Ellipse => 32.0,
        }
    }

    /// Outline path for a shape occupying `bounds`.
    pub fn outline(&self, bounds: Rect) -> BezPath {
        match self {
            ShapeKind::Square => RoundedRect::from_rect(bounds, SQUARE_CORNER_RADIUS).to_path(0.1),
            ShapeKind::Ellipse => KurboEllipse::from_rect(bounds).to_path(0.1),
        }
    }

    /// Check if `point` falls inside the outline (shapes are always filled).
    pub fn contains(&self, bounds: Rect, point: Point, tolerance: f64) -> bool {
        match self {
            ShapeKind::Square => bounds.inflate(tolerance, tolerance).contains(point),
            ShapeKind::Ellipse => {
                let center = bounds.center();
                let rx = bounds.width() / 2.0 + tolerance;
                let ry = bounds.height() / 2.0 + tolerance;
                if rx < f64::EPSILON || ry < f64::EPSILON {
                    return false;
                }
                let dx = (point.x - center.x) / rx;
                let dy = (point.y - center.y) / ry;
                dx * dx + dy * dy <= 1.0
            }
        }
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "square" => Ok(ShapeKind::Square),
            "ellipse" | "elipse" => Ok(ShapeKind::Ellipse),
            _ => Err(CanvasError::UnknownShapeKind(s.to_string())),
        }
    }
}
