//! Render-ready view of a single shape.

use kurbo::{BezPath, Point};

use super::handles::{Handle, hit_test_anchor};
use super::manager::WidgetManager;
use super::state::WidgetState;
use crate::shapes::{Anchor, LabelLayout, Shape, TextMeasure};

/// Placeholder shown in an empty label while the shape is active.
pub const LABEL_PLACEHOLDER: &str = "Add Text";

/// Everything the renderer needs to draw one shape.
///
/// Squares and ellipses share this view; geometry differences come from
/// [`crate::shapes::ShapeKind`].
#[derive(Debug, Clone)]
pub struct ShapeView<'a> {
    pub shape: &'a Shape,
    pub state: WidgetState,
    /// Whether anchor handles are drawn. Hidden anchors still hit-test.
    pub anchors_visible: bool,
    /// Whether resize corners are drawn and draggable.
    pub resizable: bool,
    pub placeholder_visible: bool,
    pub label: LabelLayout,
    /// Handles to draw, anchors first.
    pub handles: Vec<Handle>,
}

impl<'a> ShapeView<'a> {
    pub fn new(shape: &'a Shape, widgets: &WidgetManager, measure: &dyn TextMeasure) -> Self {
        let id = shape.id();
        Self {
            shape,
            state: widgets.state(id),
            anchors_visible: widgets.anchors_visible(id),
            resizable: widgets.is_selected(id),
            placeholder_visible: widgets.placeholder_visible(id),
            label: shape.label_layout(measure),
            handles: widgets.get_handles(shape),
        }
    }

    pub fn outline(&self) -> BezPath {
        self.shape.outline()
    }

    /// Text to draw in the label box: the label, or the placeholder when the
    /// label is empty and the shape is active.
    pub fn display_text(&self) -> &str {
        if self.shape.label.is_empty() && self.placeholder_visible {
            LABEL_PLACEHOLDER
        } else {
            &self.shape.label
        }
    }

    pub fn is_editing(&self) -> bool {
        self.state.is_editing()
    }

    /// Anchor under `point`, whether or not anchors are currently drawn.
    pub fn anchor_at(&self, point: Point, tolerance: f64) -> Option<Anchor> {
        hit_test_anchor(self.shape, point, tolerance)
    }
}
