//! Toolbar: shape kind and color pickers, click-to-add and drag-and-drop.

use kurbo::Point;

use crate::canvas::Canvas;
use crate::palette::{Swatch, swatch};
use crate::selection::{Selection, SelectionStore};
use crate::shapes::{SerializableColor, ShapeId, ShapeKind};

/// Payload type carried by toolbar drags.
pub const DRAG_PAYLOAD_TYPE: &str = "application/reactflow";

/// Data attached to a toolbar drag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DragPayload {
    pub payload_type: &'static str,
    /// Name of the dragged shape kind.
    pub data: String,
}

/// The toolbar writes the shared selection and triggers shape creation.
#[derive(Debug, Clone)]
pub struct Toolbar {
    selection: SelectionStore,
    options_open: bool,
}

impl Toolbar {
    pub fn new(selection: SelectionStore) -> Self {
        Self {
            selection,
            options_open: false,
        }
    }

    pub fn selection(&self) -> Selection {
        self.selection.get()
    }

    pub fn pick_kind(&mut self, kind: ShapeKind) {
        self.selection.set_kind(kind);
    }

    pub fn pick_color(&mut self, color: SerializableColor) {
        self.selection.set_color(color);
    }

    /// Pick a palette swatch by ID. Returns the swatch, or `None` if no
    /// swatch has that ID.
    pub fn pick_swatch(&mut self, id: u8) -> Option<&'static Swatch> {
        let Some(swatch) = swatch(id) else {
            log::warn!("Unknown palette swatch {}", id);
            return None;
        };
        self.pick_color(swatch.color);
        Some(swatch)
    }

    pub fn options_open(&self) -> bool {
        self.options_open
    }

    pub fn toggle_options(&mut self) {
        self.options_open = !self.options_open;
    }

    pub fn close_options(&mut self) {
        self.options_open = false;
    }

    /// A click landed somewhere. Closes the options panel unless the click
    /// was inside it.
    pub fn click(&mut self, inside_options: bool) {
        if !inside_options {
            self.close_options();
        }
    }

    /// The "add" control: create a shape of the selected kind and color at
    /// the default position.
    pub fn add_clicked(&self, canvas: &mut Canvas) -> ShapeId {
        let selection = self.selection.get();
        canvas.add_shape_at_default_position(selection.kind, Some(selection.color))
    }

    /// Start dragging the selected kind out of the toolbar.
    pub fn begin_drag(&self) -> DragPayload {
        DragPayload {
            payload_type: DRAG_PAYLOAD_TYPE,
            data: self.selection.kind().name().to_string(),
        }
    }

    /// Drop a toolbar drag at a window-relative screen point.
    ///
    /// Missing or foreign payloads, unknown kinds and drops outside the
    /// canvas are ignored.
    pub fn drop_on_canvas(
        &self,
        canvas: &mut Canvas,
        payload_type: &str,
        data: Option<&str>,
        screen_point: Point,
    ) -> Option<ShapeId> {
        if payload_type != DRAG_PAYLOAD_TYPE {
            log::debug!("Ignoring drop with payload type {:?}", payload_type);
            return None;
        }
        let Some(data) = data.filter(|data| !data.is_empty()) else {
            log::debug!("Ignoring drop without payload");
            return None;
        };
        let kind = match data.parse::<ShapeKind>() {
            Ok(kind) => kind,
            Err(err) => {
                log::warn!("Ignoring drop: {}", err);
                return None;
            }
        };
        if !canvas.viewport.contains(screen_point) {
            log::debug!("Ignoring drop outside the canvas");
            return None;
        }
        let position = canvas.to_canvas(screen_point);
        Some(canvas.add_shape(kind, position, None))
    }
}
