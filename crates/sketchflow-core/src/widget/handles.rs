//! Handle definitions for widget manipulation.

use kurbo::{Point, Rect};
use serde::{Deserialize, Serialize};

use crate::shapes::{Anchor, MIN_SHAPE_SIZE, Shape};

/// A manipulation handle on a widget.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Handle {
    /// The kind of handle (determines behavior).
    pub kind: HandleKind,
    /// Position in canvas coordinates.
    pub position: Point,
    /// Visual shape of the handle.
    pub shape: HandleShape,
}

/// The kind of handle - determines what manipulation it performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// Connection anchor (origin or target of a connection gesture).
    Anchor(Anchor),
    /// Resize corner.
    Resize(Corner),
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub fn all() -> &'static [Corner] {
        &[
            Corner::TopLeft,
            Corner::TopRight,
            Corner::BottomLeft,
            Corner::BottomRight,
        ]
    }

    /// The diagonally opposite corner.
    pub fn opposite(&self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomLeft => Corner::TopRight,
            Corner::BottomRight => Corner::TopLeft,
        }
    }

    /// Position of this corner on `bounds`.
    pub fn position_on(&self, bounds: Rect) -> Point {
        match self {
            Corner::TopLeft => Point::new(bounds.x0, bounds.y0),
            Corner::TopRight => Point::new(bounds.x1, bounds.y0),
            Corner::BottomLeft => Point::new(bounds.x0, bounds.y1),
            Corner::BottomRight => Point::new(bounds.x1, bounds.y1),
        }
    }
}

/// Visual shape of a handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandleShape {
    /// Square handle (resize corners).
    #[default]
    Square,
    /// Circular handle (connection anchors).
    Circle,
}

impl Handle {
    /// Create a new handle.
    pub fn new(kind: HandleKind, position: Point) -> Self {
        Self {
            kind,
            position,
            shape: HandleShape::default(),
        }
    }

    /// Set the handle shape.
    pub fn with_shape(mut self, shape: HandleShape) -> Self {
        self.shape = shape;
        self
    }

    /// Check if a point (in canvas coordinates) hits this handle.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        let dx = point.x - self.position.x;
        let dy = point.y - self.position.y;
        dx * dx + dy * dy <= tolerance * tolerance
    }
}

/// Connection anchor handles for a shape.
pub fn anchor_handles(shape: &Shape) -> Vec<Handle> {
    Anchor::all()
        .iter()
        .map(|&anchor| {
            Handle::new(HandleKind::Anchor(anchor), shape.anchor_position(anchor))
                .with_shape(HandleShape::Circle)
        })
        .collect()
}

/// Resize handles for a shape.
pub fn resize_handles(shape: &Shape) -> Vec<Handle> {
    let bounds = shape.bounds();
    Corner::all()
        .iter()
        .map(|&corner| Handle::new(HandleKind::Resize(corner), corner.position_on(bounds)))
        .collect()
}

/// Hit test only the connection anchors of a shape.
pub fn hit_test_anchor(shape: &Shape, point: Point, tolerance: f64) -> Option<Anchor> {
    Anchor::all()
        .iter()
        .copied()
        .find(|&anchor| {
            Handle::new(HandleKind::Anchor(anchor), shape.anchor_position(anchor))
                .hit_test(point, tolerance)
        })
}

/// Compute the bounds produced by dragging `corner` of `bounds` to `pointer`.
///
/// The opposite corner stays fixed and each side is clamped to the minimum
/// shape size, so dragging past the floor stops the shape from shrinking
/// instead of flipping it.
pub fn resize_from_corner(bounds: Rect, corner: Corner, pointer: Point) -> Rect {
    let fixed = corner.opposite().position_on(bounds);
    let min_w = MIN_SHAPE_SIZE.width;
    let min_h = MIN_SHAPE_SIZE.height;

    let (x0, x1) = match corner {
        Corner::TopLeft | Corner::BottomLeft => (pointer.x.min(fixed.x - min_w), fixed.x),
        Corner::TopRight | Corner::BottomRight => (fixed.x, pointer.x.max(fixed.x + min_w)),
    };
    let (y0, y1) = match corner {
        Corner::TopLeft | Corner::TopRight => (pointer.y.min(fixed.y - min_h), fixed.y),
        Corner::BottomLeft | Corner::BottomRight => (fixed.y, pointer.y.max(fixed.y + min_h)),
    };
    Rect::new(x0, y0, x1, y1)
}
