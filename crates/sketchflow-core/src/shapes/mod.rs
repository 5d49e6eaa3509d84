//! Shape definitions for the diagram canvas.

mod color;
mod kind;
mod label;

pub use color::SerializableColor;
pub use kind::ShapeKind;
pub use label::{ApproximateMeasure, LabelLayout, TextMeasure, normalize_label};

use kurbo::{BezPath, Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::CanvasError;

/// Unique identifier for shapes.
pub type ShapeId = Uuid;

/// Smallest size a shape can be resized to, in canvas units.
pub const MIN_SHAPE_SIZE: Size = Size::new(200.0, 200.0);

/// Clamp a size to the minimum shape size on each axis.
pub fn clamp_size(size: Size) -> Size {
    Size::new(
        size.width.max(MIN_SHAPE_SIZE.width),
        size.height.max(MIN_SHAPE_SIZE.height),
    )
}

fn deserialize_clamped_size<'de, D>(deserializer: D) -> Result<Size, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Size::deserialize(deserializer).map(clamp_size)
}

/// One of the four directional connection points on a shape's border.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Anchor {
    Top,
    Right,
    Bottom,
    Left,
}

impl Anchor {
    /// All anchors, clockwise from the top.
    pub fn all() -> &'static [Anchor] {
        &[Anchor::Top, Anchor::Right, Anchor::Bottom, Anchor::Left]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Anchor::Top => "top",
            Anchor::Right => "right",
            Anchor::Bottom => "bottom",
            Anchor::Left => "left",
        }
    }

    /// Position of this anchor on `bounds`.
    pub fn position_on(&self, bounds: Rect) -> Point {
        let center = bounds.center();
        match self {
            Anchor::Top => Point::new(center.x, bounds.y0),
            Anchor::Right => Point::new(bounds.x1, center.y),
            Anchor::Bottom => Point::new(center.x, bounds.y1),
            Anchor::Left => Point::new(bounds.x0, center.y),
        }
    }
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Anchor {
    type Err = CanvasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Anchor::all()
            .iter()
            .copied()
            .find(|anchor| anchor.name() == s)
            .ok_or_else(|| CanvasError::UnknownAnchor(s.to_string()))
    }
}

/// A placed diagram node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shape {
    pub(crate) id: ShapeId,
    /// Visual variant.
    pub kind: ShapeKind,
    /// Top-left corner in canvas coordinates.
    pub position: Point,
    /// Width and height, never below [`MIN_SHAPE_SIZE`].
    #[serde(deserialize_with = "deserialize_clamped_size")]
    size: Size,
    /// Label text (may be empty).
    #[serde(default)]
    pub label: String,
    /// Fill color, fixed at creation unless explicitly changed.
    pub fill_color: SerializableColor,
}

impl Shape {
    /// Create a new shape with a fresh ID, an empty label and the minimum size.
    pub fn new(kind: ShapeKind, position: Point, fill_color: SerializableColor) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            position,
            size: MIN_SHAPE_SIZE,
            label: String::new(),
            fill_color,
        }
    }

    /// Set the initial size (clamped).
    pub fn with_size(mut self, size: Size) -> Self {
        self.set_size(size);
        self
    }

    /// Set the initial label.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn size(&self) -> Size {
        self.size
    }

    /// Set the size, clamping each axis to the minimum.
    /// Returns true if the requested size had to be clamped.
    pub fn set_size(&mut self, size: Size) -> bool {
        let clamped = clamp_size(size);
        self.size = clamped;
        clamped != size
    }

    /// Bounding box in canvas coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Check if a canvas point hits the shape body.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        self.kind.contains(self.bounds(), point, tolerance)
    }

    /// Outline path for rendering.
    pub fn outline(&self) -> BezPath {
        self.kind.outline(self.bounds())
    }

    /// Position of an anchor in canvas coordinates.
    pub fn anchor_position(&self, anchor: Anchor) -> Point {
        anchor.position_on(self.bounds())
    }

    /// Lay out the label box for the current label.
    pub fn label_layout(&self, measure: &dyn TextMeasure) -> LabelLayout {
        LabelLayout::compute(self.kind, self.bounds(), &self.label, measure)
    }
}
