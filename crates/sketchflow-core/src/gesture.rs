//! In-progress pointer gestures.

use kurbo::{Point, Rect, Vec2};

use crate::connection::{ConnectionId, Endpoint, EndpointSide};
use crate::shapes::ShapeId;
use crate::widget::Corner;

/// What a drag was released over.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropTarget {
    /// Empty canvas.
    Background,
    /// A shape, optionally at a specific anchor.
    Handle(Endpoint),
    /// Outside the canvas, or over something that does not accept drops.
    Nothing,
}

/// A pointer gesture between its begin and end calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Dragging a new connection out of a shape.
    ConnectionDrag { origin: Endpoint },
    /// Dragging one end of an existing connection.
    EndpointDrag {
        connection: ConnectionId,
        side: EndpointSide,
        /// Set once the end has been re-homed; the connection is removed
        /// at the end of the gesture otherwise.
        reconnected: bool,
    },
    /// Moving a shape. The document is untouched until the gesture ends.
    Move {
        shape: ShapeId,
        start_pointer: Point,
        current_pointer: Point,
        original_position: Point,
    },
    /// Resizing a shape from one corner.
    Resize {
        shape: ShapeId,
        corner: Corner,
        /// Offset from the pointer to the grabbed corner.
        grab_offset: Vec2,
        original_bounds: Rect,
        current_bounds: Rect,
    },
}

impl Gesture {
    pub fn name(&self) -> &'static str {
        match self {
            Gesture::ConnectionDrag { .. } => "connection",
            Gesture::EndpointDrag { .. } => "endpoint",
            Gesture::Move { .. } => "move",
            Gesture::Resize { .. } => "resize",
        }
    }

    /// Shape the gesture operates on, if any.
    pub fn shape(&self) -> Option<ShapeId> {
        match self {
            Gesture::ConnectionDrag { origin } => Some(origin.shape),
            Gesture::EndpointDrag { .. } => None,
            Gesture::Move { shape, .. } | Gesture::Resize { shape, .. } => Some(*shape),
        }
    }

    /// Pointer travel of a move gesture.
    pub fn delta(&self) -> Option<Vec2> {
        match self {
            Gesture::Move {
                start_pointer,
                current_pointer,
                ..
            } => Some(*current_pointer - *start_pointer),
            _ => None,
        }
    }
}

/// Single-writer cell holding at most one in-progress gesture.
#[derive(Debug, Clone, Default)]
pub struct GestureCell {
    current: Option<Gesture>,
}

impl GestureCell {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a gesture, discarding any stale one.
    pub fn begin(&mut self, gesture: Gesture) {
        if let Some(stale) = self.current.replace(gesture) {
            log::warn!("Discarding unfinished {} gesture", stale.name());
        }
    }

    pub fn current(&self) -> Option<&Gesture> {
        self.current.as_ref()
    }

    pub fn current_mut(&mut self) -> Option<&mut Gesture> {
        self.current.as_mut()
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Take the gesture if `matches` accepts it, leaving any other gesture
    /// in place.
    pub fn take_if(&mut self, matches: impl FnOnce(&Gesture) -> bool) -> Option<Gesture> {
        if self.current.as_ref().is_some_and(matches) {
            self.current.take()
        } else {
            None
        }
    }

    /// Clear the cell, returning the abandoned gesture.
    pub fn cancel(&mut self) -> Option<Gesture> {
        self.current.take()
    }
}
