//! Widget manager for tracking UI state of shapes.

use std::collections::{HashMap, HashSet};

use super::handles::{Handle, anchor_handles, resize_handles};
use super::state::WidgetState;
use crate::shapes::{Shape, ShapeId};

/// Manages UI state for all shapes in the document.
///
/// This separates UI concerns (selection, editing, hover, the cosmetic
/// "active" mode) from the pure shape data. Nothing in here touches the
/// authoritative shape collection.
#[derive(Debug, Clone, Default)]
pub struct WidgetManager {
    /// UI state for each shape.
    states: HashMap<ShapeId, WidgetState>,
    /// Currently selected shapes (subset of states with Selected/Editing).
    selected: HashSet<ShapeId>,
    /// Shape whose label is being edited.
    focused: Option<ShapeId>,
    /// Shape currently being hovered.
    hovered: Option<ShapeId>,
    /// Shapes the pointer has touched while not selected.
    touched: HashSet<ShapeId>,
    /// Shapes in the active visual mode (placeholder text shown).
    active: HashSet<ShapeId>,
}

impl WidgetManager {
    /// Create a new widget manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the state of a shape.
    pub fn state(&self, id: ShapeId) -> WidgetState {
        self.states.get(&id).copied().unwrap_or_default()
    }

    /// Set the state of a shape.
    pub fn set_state(&mut self, id: ShapeId, state: WidgetState) {
        if state.is_selected() {
            self.selected.insert(id);
        } else {
            self.selected.remove(&id);
        }

        if state.is_editing() {
            self.focused = Some(id);
        } else if self.focused == Some(id) {
            self.focused = None;
        }

        self.states.insert(id, state);
    }

    /// Check if a shape is selected.
    pub fn is_selected(&self, id: ShapeId) -> bool {
        self.selected.contains(&id)
    }

    /// Get all selected shape IDs.
    pub fn selected(&self) -> &HashSet<ShapeId> {
        &self.selected
    }

    /// Get the focused shape ID (if any).
    pub fn focused(&self) -> Option<ShapeId> {
        self.focused
    }

    /// Get the hovered shape ID (if any).
    pub fn hovered(&self) -> Option<ShapeId> {
        self.hovered
    }

    /// Set the hovered shape.
    pub fn set_hovered(&mut self, id: Option<ShapeId>) {
        if let Some(old_id) = self.hovered {
            if Some(old_id) != id && self.state(old_id) == WidgetState::Hovered {
                self.states.insert(old_id, WidgetState::Normal);
            }
        }

        if let Some(new_id) = id {
            if self.state(new_id) == WidgetState::Normal {
                self.states.insert(new_id, WidgetState::Hovered);
            }
        }

        self.hovered = id;
    }

    /// Select a single shape (clears other selections).
    pub fn select(&mut self, id: ShapeId) {
        self.clear_selection();
        self.add_to_selection(id);
    }

    /// Add a shape to the selection.
    pub fn add_to_selection(&mut self, id: ShapeId) {
        if !self.is_selected(id) {
            self.set_state(id, WidgetState::Selected);
        }
    }

    /// Remove a shape from the selection.
    pub fn deselect(&mut self, id: ShapeId) {
        if self.selected.contains(&id) {
            self.set_state(id, self.resting_state(id));
        }
    }

    /// Clear all selections.
    pub fn clear_selection(&mut self) {
        let selected: Vec<_> = self.selected.iter().copied().collect();
        for id in selected {
            self.set_state(id, self.resting_state(id));
        }
        self.selected.clear();
    }

    /// Enter label editing mode for a shape.
    pub fn enter_editing(&mut self, id: ShapeId) {
        if let Some(old_id) = self.focused {
            if old_id != id {
                self.exit_editing();
            }
        }
        self.set_state(id, WidgetState::Editing);
    }

    /// Exit editing mode, returning the shape that was being edited.
    pub fn exit_editing(&mut self) -> Option<ShapeId> {
        let id = self.focused?;
        self.set_state(id, WidgetState::Selected);
        Some(id)
    }

    /// Check if currently in editing mode.
    pub fn is_editing(&self) -> bool {
        self.focused.is_some()
    }

    /// Check if a specific shape is being edited.
    pub fn is_editing_shape(&self, id: ShapeId) -> bool {
        self.focused == Some(id)
    }

    /// Pointer entered a shape.
    pub fn pointer_enter(&mut self, id: ShapeId) {
        self.set_hovered(Some(id));
        self.touch(id);
    }

    /// Pointer left a shape.
    pub fn pointer_leave(&mut self, id: ShapeId) {
        if self.hovered == Some(id) {
            self.set_hovered(None);
        }
        if !self.is_selected(id) {
            self.touched.remove(&id);
        }
    }

    /// A click landed on a shape.
    pub fn click(&mut self, id: ShapeId) {
        self.touch(id);
    }

    /// A click landed outside every shape: leave the active mode everywhere.
    pub fn click_outside(&mut self) {
        self.touched.clear();
        self.active.clear();
    }

    /// Unselected shapes enter the touched + active mode.
    fn touch(&mut self, id: ShapeId) {
        if !self.is_selected(id) {
            self.touched.insert(id);
            self.active.insert(id);
        }
    }

    pub fn is_touched(&self, id: ShapeId) -> bool {
        self.touched.contains(&id)
    }

    pub fn is_active(&self, id: ShapeId) -> bool {
        self.active.contains(&id)
    }

    /// Connection anchors are shown for selected or hovered shapes.
    /// They stay hit-testable either way.
    pub fn anchors_visible(&self, id: ShapeId) -> bool {
        self.is_selected(id) || self.hovered == Some(id)
    }

    /// Whether the label placeholder text is shown.
    pub fn placeholder_visible(&self, id: ShapeId) -> bool {
        (self.is_touched(id) || self.is_selected(id)) && self.is_active(id)
    }

    /// Remove state for a deleted shape.
    pub fn remove(&mut self, id: ShapeId) {
        self.states.remove(&id);
        self.selected.remove(&id);
        self.touched.remove(&id);
        self.active.remove(&id);
        if self.focused == Some(id) {
            self.focused = None;
        }
        if self.hovered == Some(id) {
            self.hovered = None;
        }
    }

    /// Drop state for every shape `keep` rejects.
    pub fn retain(&mut self, keep: impl Fn(ShapeId) -> bool) {
        let known: HashSet<ShapeId> = self
            .states
            .keys()
            .chain(self.touched.iter())
            .chain(self.active.iter())
            .copied()
            .collect();
        for id in known {
            if !keep(id) {
                self.remove(id);
            }
        }
    }

    /// Get the visible handles for a shape based on its state.
    pub fn get_handles(&self, shape: &Shape) -> Vec<Handle> {
        let id = shape.id();
        let mut handles = Vec::new();
        if self.anchors_visible(id) {
            handles.extend(anchor_handles(shape));
        }
        if self.is_selected(id) {
            handles.extend(resize_handles(shape));
        }
        handles
    }

    /// State a shape falls back to when it stops being selected.
    fn resting_state(&self, id: ShapeId) -> WidgetState {
        if self.hovered == Some(id) {
            WidgetState::Hovered
        } else {
            WidgetState::Normal
        }
    }
}
