//! Shared selection state: the shape kind and fill color new shapes use.

use std::cell::Cell;
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::palette::DEFAULT_COLOR;
use crate::shapes::{SerializableColor, ShapeKind};

/// The kind and color the next shape will be created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub kind: ShapeKind,
    pub color: SerializableColor,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            kind: ShapeKind::Square,
            color: DEFAULT_COLOR,
        }
    }
}

/// Session-lifetime handle to the shared [`Selection`].
///
/// Clones share the same underlying value, so the toolbar and the canvas see
/// every pick immediately. Only explicit user picks should write to it.
#[derive(Debug, Clone, Default)]
pub struct SelectionStore {
    inner: Rc<Cell<Selection>>,
}

impl SelectionStore {
    /// Create a store with the default selection (square, `#8B5CF6`).
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store with an initial selection.
    pub fn with_selection(selection: Selection) -> Self {
        Self {
            inner: Rc::new(Cell::new(selection)),
        }
    }

    /// Current selection.
    pub fn get(&self) -> Selection {
        self.inner.get()
    }

    pub fn kind(&self) -> ShapeKind {
        self.get().kind
    }

    pub fn color(&self) -> SerializableColor {
        self.get().color
    }

    pub fn set_kind(&self, kind: ShapeKind) {
        let mut selection = self.get();
        if selection.kind != kind {
            log::debug!("Selected shape kind: {}", kind);
        }
        selection.kind = kind;
        self.inner.set(selection);
    }

    pub fn set_color(&self, color: SerializableColor) {
        let mut selection = self.get();
        if selection.color != color {
            log::debug!("Selected color: {}", color);
        }
        selection.color = color;
        self.inner.set(selection);
    }
}
