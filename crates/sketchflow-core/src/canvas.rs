//! Canvas document and state management.

use std::collections::{HashMap, HashSet};

use kurbo::{Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::{Camera, Viewport};
use crate::config::EditorConfig;
use crate::connection::{Connection, ConnectionId, Endpoint, EndpointSide};
use crate::error::{CanvasError, CanvasResult};
use crate::gesture::{DropTarget, Gesture, GestureCell};
use crate::selection::SelectionStore;
use crate::shapes::{
    Anchor, SerializableColor, Shape, ShapeId, ShapeKind, TextMeasure, normalize_label,
};
use crate::widget::{
    Corner, HandleKind, ShapeView, WidgetManager, hit_test_anchor, resize_from_corner,
    resize_handles,
};

/// Maximum number of undo states to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// A snapshot of document state for undo/redo.
#[derive(Debug, Clone)]
struct DocumentSnapshot {
    shapes: HashMap<ShapeId, Shape>,
    z_order: Vec<ShapeId>,
    connections: Vec<Connection>,
}

/// A canvas document containing all shapes and the connections between them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CanvasDocument {
    /// Unique document identifier.
    pub id: String,
    /// Document name.
    pub name: String,
    /// All shapes in the document, keyed by ID.
    shapes: HashMap<ShapeId, Shape>,
    /// Z-order of shapes (back to front).
    z_order: Vec<ShapeId>,
    /// Connections in creation order. Both ends always resolve to a shape.
    #[serde(default)]
    connections: Vec<Connection>,
    /// Undo history stack.
    #[serde(skip)]
    undo_stack: Vec<DocumentSnapshot>,
    /// Redo history stack.
    #[serde(skip)]
    redo_stack: Vec<DocumentSnapshot>,
}

impl Default for CanvasDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl CanvasDocument {
    /// Create a new empty document.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: "Untitled".to_string(),
            shapes: HashMap::new(),
            z_order: Vec::new(),
            connections: Vec::new(),
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
        }
    }

    fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot {
            shapes: self.shapes.clone(),
            z_order: self.z_order.clone(),
            connections: self.connections.clone(),
        }
    }

    fn restore(&mut self, snapshot: DocumentSnapshot) {
        self.shapes = snapshot.shapes;
        self.z_order = snapshot.z_order;
        self.connections = snapshot.connections;
    }

    /// Push current state to undo stack (call before making changes).
    pub fn push_undo(&mut self) {
        let snapshot = self.snapshot();
        self.undo_stack.push(snapshot);
        self.redo_stack.clear();

        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    /// Undo the last change.
    /// Returns true if undo was performed, false if nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.undo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.redo_stack.push(current);
        self.restore(snapshot);
        true
    }

    /// Redo the last undone change.
    /// Returns true if redo was performed, false if nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.redo_stack.pop() else {
            return false;
        };
        let current = self.snapshot();
        self.undo_stack.push(current);
        self.restore(snapshot);
        true
    }

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Add a shape on top of the z-order.
    pub fn add_shape(&mut self, shape: Shape) -> ShapeId {
        let id = shape.id();
        self.z_order.push(id);
        self.shapes.insert(id, shape);
        id
    }

    /// Remove a shape together with every connection that references it.
    pub fn remove_shape(&mut self, id: ShapeId) -> Option<Shape> {
        let shape = self.shapes.remove(&id)?;
        self.z_order.retain(|&shape_id| shape_id != id);
        self.connections.retain(|connection| !connection.touches(id));
        Some(shape)
    }

    pub fn contains_shape(&self, id: ShapeId) -> bool {
        self.shapes.contains_key(&id)
    }

    pub fn get_shape(&self, id: ShapeId) -> Option<&Shape> {
        self.shapes.get(&id)
    }

    pub fn get_shape_mut(&mut self, id: ShapeId) -> Option<&mut Shape> {
        self.shapes.get_mut(&id)
    }

    /// Shape IDs back to front.
    pub fn z_order(&self) -> &[ShapeId] {
        &self.z_order
    }

    pub fn shape_ids(&self) -> impl Iterator<Item = ShapeId> + '_ {
        self.shapes.keys().copied()
    }

    /// Get shapes in z-order (back to front).
    pub fn shapes_ordered(&self) -> impl Iterator<Item = &Shape> {
        self.z_order.iter().filter_map(|id| self.shapes.get(id))
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    pub fn connection(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.iter().find(|connection| connection.id() == id)
    }

    fn connection_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.iter_mut().find(|connection| connection.id() == id)
    }

    /// Connections with either end on `shape`.
    pub fn connections_for(&self, shape: ShapeId) -> impl Iterator<Item = &Connection> {
        self.connections.iter().filter(move |connection| connection.touches(shape))
    }

    /// Existing connection linking exactly these endpoints.
    pub fn find_link(&self, source: Endpoint, target: Endpoint) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|c| c.links(source, target))
            .map(Connection::id)
    }

    /// Another connection linking the same endpoints as `connection`.
    pub fn duplicate_of(&self, connection: &Connection) -> Option<ConnectionId> {
        self.connections
            .iter()
            .find(|c| c.id() != connection.id() && c.same_link(connection))
            .map(Connection::id)
    }

    /// Add a connection after checking that both ends resolve to shapes.
    pub fn add_connection(&mut self, connection: Connection) -> CanvasResult<ConnectionId> {
        for shape in [connection.source, connection.target] {
            if !self.contains_shape(shape) {
                return Err(CanvasError::ShapeNotFound(shape));
            }
        }
        let id = connection.id();
        self.connections.push(connection);
        Ok(id)
    }

    pub fn remove_connection(&mut self, id: ConnectionId) -> Option<Connection> {
        let index = self.connections.iter().position(|c| c.id() == id)?;
        Some(self.connections.remove(index))
    }

    /// Get the bounding box of all shapes.
    pub fn bounds(&self) -> Option<Rect> {
        self.shapes
            .values()
            .map(Shape::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    /// Find shapes at a point (in canvas coordinates), front to back.
    pub fn shapes_at_point(&self, point: Point, tolerance: f64) -> Vec<ShapeId> {
        self.z_order
            .iter()
            .rev()
            .filter_map(|&id| {
                self.shapes
                    .get(&id)
                    .filter(|s| s.hit_test(point, tolerance))
                    .map(|_| id)
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Number of shapes.
    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Serialize the document to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize a document from JSON, dropping anything that breaks the
    /// document invariants.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut document: Self = serde_json::from_str(json)?;
        document.repair();
        Ok(document)
    }

    /// Re-establish key, z-order and connection invariants.
    fn repair(&mut self) {
        let before = self.shapes.len();
        self.shapes.retain(|id, shape| shape.id() == *id);
        let mismatched = before - self.shapes.len();
        if mismatched > 0 {
            log::warn!("Dropped {} shapes stored under a foreign key", mismatched);
        }

        let shapes = &self.shapes;
        let mut seen = HashSet::new();
        self.z_order.retain(|id| shapes.contains_key(id) && seen.insert(*id));
        let mut missing: Vec<ShapeId> = shapes
            .keys()
            .filter(|id| !seen.contains(*id))
            .copied()
            .collect();
        missing.sort();
        self.z_order.extend(missing);

        let before = self.connections.len();
        self.connections
            .retain(|c| shapes.contains_key(&c.source) && shapes.contains_key(&c.target));
        let dropped = before - self.connections.len();
        if dropped > 0 {
            log::warn!("Dropped {} connections with missing endpoints", dropped);
        }
    }
}

/// Result of releasing a connection drag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionDragOutcome {
    /// A new shape was created under the pointer and linked to the origin.
    Spawned {
        shape: ShapeId,
        connection: ConnectionId,
    },
    /// The origin was linked to an existing shape.
    Connected(ConnectionId),
    /// Nothing changed.
    Cancelled,
}

/// Runtime canvas state (not persisted).
///
/// The canvas is the single writer of the shape and connection collections.
/// Every successful mutation bumps [`Canvas::revision`] and raises a redraw
/// request. Pointer positions passed to gesture methods are window-relative
/// screen points; they are mapped through the [`Viewport`] and [`Camera`].
#[derive(Debug, Clone)]
pub struct Canvas {
    document: CanvasDocument,
    /// Camera for view transform.
    pub camera: Camera,
    /// Placement of the canvas element in the window.
    pub viewport: Viewport,
    widgets: WidgetManager,
    selection: SelectionStore,
    gesture: GestureCell,
    config: EditorConfig,
    /// Whether the current label edit session has pushed its undo entry.
    label_edit_recorded: bool,
    revision: u64,
    needs_redraw: bool,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(SelectionStore::new())
    }
}

impl Canvas {
    /// Create a canvas with the default configuration and its initial shapes.
    pub fn new(selection: SelectionStore) -> Self {
        Self::with_config(EditorConfig::default(), selection)
    }

    /// Create a canvas with a fresh selection store seeded from `config`.
    /// Hand [`Canvas::selection`] to the toolbar to share it.
    pub fn from_config(config: EditorConfig) -> Self {
        let selection = SelectionStore::with_selection(config.initial_selection());
        Self::with_config(config, selection)
    }

    /// Create a canvas seeded with the configured initial shapes.
    pub fn with_config(config: EditorConfig, selection: SelectionStore) -> Self {
        let mut document = CanvasDocument::new();
        for seed in &config.initial_shapes {
            let color = seed.color.unwrap_or(config.default_color);
            let shape = Shape::new(seed.kind, seed.position, color)
                .with_size(config.default_size)
                .with_label(seed.label.clone());
            document.add_shape(shape);
        }
        log::debug!("Canvas created with {} initial shapes", document.len());
        Self::with_document(document, config, selection)
    }

    /// Create a canvas with an existing document.
    pub fn with_document(
        document: CanvasDocument,
        config: EditorConfig,
        selection: SelectionStore,
    ) -> Self {
        Self {
            document,
            camera: Camera::new(),
            viewport: Viewport::default(),
            widgets: WidgetManager::new(),
            selection,
            gesture: GestureCell::new(),
            config,
            label_edit_recorded: false,
            revision: 0,
            needs_redraw: true,
        }
    }

    /// The document being edited. All changes go through the canvas.
    pub fn document(&self) -> &CanvasDocument {
        &self.document
    }

    /// UI state (selection, hover, editing).
    pub fn widgets(&self) -> &WidgetManager {
        &self.widgets
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    /// Handle to the shared selection state.
    pub fn selection(&self) -> &SelectionStore {
        &self.selection
    }

    /// The in-progress gesture, if any.
    pub fn gesture(&self) -> Option<&Gesture> {
        self.gesture.current()
    }

    /// Abandon the in-progress gesture without applying it.
    pub fn cancel_gesture(&mut self) {
        if let Some(gesture) = self.gesture.cancel() {
            log::debug!("Cancelled {} gesture", gesture.name());
            self.needs_redraw = true;
        }
    }

    /// Monotonic counter bumped by every document mutation.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Consume the pending redraw request.
    pub fn take_redraw_request(&mut self) -> bool {
        std::mem::take(&mut self.needs_redraw)
    }

    /// Ask for a redraw without changing the document.
    pub fn request_redraw(&mut self) {
        self.needs_redraw = true;
    }

    fn mark_changed(&mut self) {
        self.revision += 1;
        self.needs_redraw = true;
    }

    /// Place the canvas element within the window.
    pub fn set_viewport(&mut self, origin: Point, size: Size) {
        self.viewport = Viewport { origin, size };
        self.needs_redraw = true;
    }

    /// Convert a window-relative screen point to canvas coordinates.
    pub fn to_canvas(&self, screen_point: Point) -> Point {
        self.viewport.project(screen_point, &self.camera)
    }

    fn require_shape(&self, id: ShapeId) -> CanvasResult<&Shape> {
        self.document
            .get_shape(id)
            .ok_or(CanvasError::ShapeNotFound(id))
    }

    fn require_connection(&self, id: ConnectionId) -> CanvasResult<&Connection> {
        self.document
            .connection(id)
            .ok_or(CanvasError::ConnectionNotFound(id))
    }

    fn require_shape_mut(&mut self, id: ShapeId) -> CanvasResult<&mut Shape> {
        self.document
            .get_shape_mut(id)
            .ok_or(CanvasError::ShapeNotFound(id))
    }

    fn new_shape(&self, kind: ShapeKind, position: Point, color: SerializableColor) -> Shape {
        Shape::new(kind, position, color).with_size(self.config.default_size)
    }

    // --- Shapes ---

    /// Add a shape. `None` takes the current shared selection color; the
    /// color is copied, later picks do not affect the shape.
    pub fn add_shape(
        &mut self,
        kind: ShapeKind,
        position: Point,
        color: Option<SerializableColor>,
    ) -> ShapeId {
        let color = color.unwrap_or_else(|| self.selection.color());
        let shape = self.new_shape(kind, position, color);
        self.document.push_undo();
        let id = self.document.add_shape(shape);
        log::debug!("Added {} {} at ({}, {})", kind, id, position.x, position.y);
        self.mark_changed();
        id
    }

    /// Add a shape at the configured default position.
    pub fn add_shape_at_default_position(
        &mut self,
        kind: ShapeKind,
        color: Option<SerializableColor>,
    ) -> ShapeId {
        self.add_shape(kind, self.config.default_position, color)
    }

    pub fn move_shape(&mut self, id: ShapeId, position: Point) -> CanvasResult<()> {
        self.require_shape(id)?;
        self.document.push_undo();
        self.require_shape_mut(id)?.position = position;
        log::debug!("Moved shape {} to ({}, {})", id, position.x, position.y);
        self.mark_changed();
        Ok(())
    }

    /// Resize a shape, clamping to the minimum size. Returns the applied size.
    pub fn resize_shape(&mut self, id: ShapeId, size: Size) -> CanvasResult<Size> {
        self.require_shape(id)?;
        self.document.push_undo();
        let shape = self.require_shape_mut(id)?;
        if shape.set_size(size) {
            log::debug!("Clamped resize of {} to {:?}", id, shape.size());
        }
        let applied = shape.size();
        self.mark_changed();
        Ok(applied)
    }

    /// Set position and size in one step.
    fn set_shape_bounds(&mut self, id: ShapeId, bounds: Rect) -> CanvasResult<()> {
        self.require_shape(id)?;
        self.document.push_undo();
        let shape = self.require_shape_mut(id)?;
        shape.position = bounds.origin();
        shape.set_size(bounds.size());
        log::debug!("Set bounds of {} to {:?}", id, bounds);
        self.mark_changed();
        Ok(())
    }

    /// Replace a shape's label text.
    ///
    /// While the shape's label is being edited all changes share one undo
    /// entry, pushed on the first change of the session.
    pub fn relabel_shape(&mut self, id: ShapeId, label: impl Into<String>) -> CanvasResult<()> {
        let label = label.into();
        if self.require_shape(id)?.label == label {
            return Ok(());
        }
        self.record_label_change(id);
        self.require_shape_mut(id)?.label = label;
        self.mark_changed();
        Ok(())
    }

    /// Change a shape's fill color.
    pub fn recolor_shape(&mut self, id: ShapeId, color: SerializableColor) -> CanvasResult<()> {
        if self.require_shape(id)?.fill_color == color {
            return Ok(());
        }
        self.document.push_undo();
        self.require_shape_mut(id)?.fill_color = color;
        log::debug!("Recolored shape {} to {}", id, color);
        self.mark_changed();
        Ok(())
    }

    /// Start editing a shape's label.
    pub fn begin_label_edit(&mut self, id: ShapeId) -> CanvasResult<()> {
        self.require_shape(id)?;
        if self.widgets.is_editing_shape(id) {
            return Ok(());
        }
        self.commit_label();
        self.widgets.enter_editing(id);
        self.label_edit_recorded = false;
        self.needs_redraw = true;
        Ok(())
    }

    /// Finish label editing. Whitespace-only labels collapse to empty.
    /// Returns the shape that was being edited.
    pub fn commit_label(&mut self) -> Option<ShapeId> {
        let id = self.widgets.focused()?;
        if let Some(shape) = self.document.get_shape(id) {
            let normalized = normalize_label(&shape.label);
            if normalized != shape.label {
                self.record_label_change(id);
                if let Some(shape) = self.document.get_shape_mut(id) {
                    shape.label = normalized;
                }
                self.mark_changed();
            }
        }
        self.widgets.exit_editing();
        self.label_edit_recorded = false;
        self.needs_redraw = true;
        Some(id)
    }

    /// Push the undo entry for a label change. An edit session pushes one
    /// entry, on its first change.
    fn record_label_change(&mut self, id: ShapeId) {
        if !self.widgets.is_editing_shape(id) {
            self.document.push_undo();
        } else if !self.label_edit_recorded {
            self.document.push_undo();
            self.label_edit_recorded = true;
        }
    }

    /// Remove a shape and every connection referencing it.
    pub fn delete_shape(&mut self, id: ShapeId) -> CanvasResult<()> {
        self.require_shape(id)?;
        let pruned = self.document.connections_for(id).count();
        self.document.push_undo();
        self.document.remove_shape(id);
        self.widgets.remove(id);
        log::debug!("Deleted shape {} and {} connections", id, pruned);
        self.mark_changed();
        Ok(())
    }

    /// Delete every selected shape in one undoable step.
    /// Returns the number of shapes removed.
    pub fn delete_selected(&mut self) -> usize {
        let selected: Vec<ShapeId> = self
            .widgets
            .selected()
            .iter()
            .copied()
            .filter(|&id| self.document.contains_shape(id))
            .collect();
        if selected.is_empty() {
            return 0;
        }
        self.document.push_undo();
        for &id in &selected {
            self.document.remove_shape(id);
            self.widgets.remove(id);
        }
        log::debug!("Deleted {} selected shapes", selected.len());
        self.mark_changed();
        selected.len()
    }

    // --- Connections ---

    /// Connect two shapes. If the same link already exists its ID is
    /// returned and nothing is added.
    pub fn connect(&mut self, source: Endpoint, target: Endpoint) -> CanvasResult<ConnectionId> {
        self.require_shape(source.shape)?;
        self.require_shape(target.shape)?;
        if let Some(existing) = self.document.find_link(source, target) {
            log::debug!("Connection {} already links these endpoints", existing);
            return Ok(existing);
        }
        self.document.push_undo();
        let id = self.document.add_connection(Connection::new(source, target))?;
        log::debug!("Connected {} -> {} ({})", source.shape, target.shape, id);
        self.mark_changed();
        Ok(id)
    }

    pub fn delete_connection(&mut self, id: ConnectionId) -> CanvasResult<()> {
        self.require_connection(id)?;
        self.document.push_undo();
        self.document.remove_connection(id);
        log::debug!("Deleted connection {}", id);
        self.mark_changed();
        Ok(())
    }

    /// Re-home one end of a connection. `None` removes the connection, and
    /// so does re-homing it onto a link that already exists.
    pub fn update_connection_endpoint(
        &mut self,
        id: ConnectionId,
        side: EndpointSide,
        new_endpoint: Option<Endpoint>,
    ) -> CanvasResult<()> {
        let current = self.require_connection(id)?.clone();
        let Some(endpoint) = new_endpoint else {
            return self.delete_connection(id);
        };
        self.require_shape(endpoint.shape)?;

        let mut updated = current.clone();
        updated.set_endpoint(side, endpoint);
        if updated == current {
            return Ok(());
        }
        if let Some(existing) = self.document.duplicate_of(&updated) {
            log::debug!("Connection {} already links these endpoints, dropping {}", existing, id);
            return self.delete_connection(id);
        }

        self.document.push_undo();
        if let Some(connection) = self.document.connection_mut(id) {
            *connection = updated;
        }
        log::debug!("Moved {:?} end of {} to {}", side, id, endpoint.shape);
        self.mark_changed();
        Ok(())
    }

    // --- Connection drag ---

    /// Start dragging a new connection out of `origin_shape`.
    pub fn begin_connection_drag(
        &mut self,
        origin_shape: ShapeId,
        origin_handle: Option<Anchor>,
    ) -> CanvasResult<()> {
        self.require_shape(origin_shape)?;
        self.gesture.begin(Gesture::ConnectionDrag {
            origin: Endpoint::new(origin_shape, origin_handle),
        });
        Ok(())
    }

    /// Release a connection drag.
    ///
    /// Over the background a new shape of the selected kind and color is
    /// created under the pointer and linked to the origin. Over a handle the
    /// origin is linked to it. Anywhere else nothing happens.
    pub fn complete_connection_drag(
        &mut self,
        screen_pointer: Point,
        drop_target: DropTarget,
    ) -> CanvasResult<ConnectionDragOutcome> {
        let Some(Gesture::ConnectionDrag { origin }) = self
            .gesture
            .take_if(|g| matches!(g, Gesture::ConnectionDrag { .. }))
        else {
            return Err(CanvasError::NoGesture("connection"));
        };
        self.needs_redraw = true;

        if !self.document.contains_shape(origin.shape) {
            log::warn!("Connection drag origin {} no longer exists", origin.shape);
            return Ok(ConnectionDragOutcome::Cancelled);
        }

        match drop_target {
            DropTarget::Background => {
                let position = self.to_canvas(screen_pointer) - self.config.drop_offset;
                let selection = self.selection.get();
                let shape = self.new_shape(selection.kind, position, selection.color);
                let connection = Connection::new(origin, Endpoint::shape(shape.id()));

                self.document.push_undo();
                let shape_id = self.document.add_shape(shape);
                let connection_id = self.document.add_connection(connection)?;
                log::debug!(
                    "Spawned {} {} at ({}, {}) linked from {}",
                    selection.kind,
                    shape_id,
                    position.x,
                    position.y,
                    origin.shape
                );
                self.mark_changed();
                Ok(ConnectionDragOutcome::Spawned {
                    shape: shape_id,
                    connection: connection_id,
                })
            }
            DropTarget::Handle(target) if target == origin => {
                log::debug!("Connection drag released on its own origin");
                Ok(ConnectionDragOutcome::Cancelled)
            }
            DropTarget::Handle(target) => match self.connect(origin, target) {
                Ok(id) => Ok(ConnectionDragOutcome::Connected(id)),
                Err(err) => {
                    log::warn!("Ignoring connection drop: {}", err);
                    Ok(ConnectionDragOutcome::Cancelled)
                }
            },
            DropTarget::Nothing => Ok(ConnectionDragOutcome::Cancelled),
        }
    }

    // --- Endpoint drag ---

    /// Start dragging one end of an existing connection.
    pub fn begin_endpoint_drag(
        &mut self,
        connection: ConnectionId,
        side: EndpointSide,
    ) -> CanvasResult<()> {
        self.require_connection(connection)?;
        self.gesture.begin(Gesture::EndpointDrag {
            connection,
            side,
            reconnected: false,
        });
        Ok(())
    }

    /// Re-home the dragged end during an endpoint drag.
    pub fn reconnect(&mut self, endpoint: Endpoint) -> CanvasResult<()> {
        let (connection, side) = match self.gesture.current() {
            Some(Gesture::EndpointDrag { connection, side, .. }) => (*connection, *side),
            _ => return Err(CanvasError::NoGesture("endpoint")),
        };
        self.update_connection_endpoint(connection, side, Some(endpoint))?;
        if let Some(Gesture::EndpointDrag { reconnected, .. }) = self.gesture.current_mut() {
            *reconnected = true;
        }
        Ok(())
    }

    /// End an endpoint drag. The connection is removed unless it was
    /// reconnected. Returns whether the dragged connection still exists.
    pub fn end_endpoint_drag(&mut self) -> CanvasResult<bool> {
        let Some(Gesture::EndpointDrag {
            connection,
            reconnected,
            ..
        }) = self
            .gesture
            .take_if(|g| matches!(g, Gesture::EndpointDrag { .. }))
        else {
            return Err(CanvasError::NoGesture("endpoint"));
        };
        self.needs_redraw = true;
        if reconnected {
            return Ok(self.document.connection(connection).is_some());
        }
        if self.document.connection(connection).is_some() {
            self.delete_connection(connection)?;
        }
        Ok(false)
    }

    /// Release an endpoint drag over `drop_target`: a handle re-homes the
    /// end, anything else removes the connection.
    pub fn complete_endpoint_drag(&mut self, drop_target: DropTarget) -> CanvasResult<bool> {
        if let DropTarget::Handle(endpoint) = drop_target {
            match self.reconnect(endpoint) {
                Ok(()) => {}
                Err(err @ CanvasError::NoGesture(_)) => return Err(err),
                Err(err) => log::warn!("Reconnect failed: {}", err),
            }
        }
        self.end_endpoint_drag()
    }

    // --- Move gesture ---

    pub fn begin_move(&mut self, id: ShapeId, screen_pointer: Point) -> CanvasResult<()> {
        let original_position = self.require_shape(id)?.position;
        let pointer = self.to_canvas(screen_pointer);
        self.gesture.begin(Gesture::Move {
            shape: id,
            start_pointer: pointer,
            current_pointer: pointer,
            original_position,
        });
        Ok(())
    }

    /// Track the pointer during a move. Returns the preview position.
    pub fn update_move(&mut self, screen_pointer: Point) -> CanvasResult<Point> {
        let pointer = self.to_canvas(screen_pointer);
        match self.gesture.current_mut() {
            Some(Gesture::Move {
                start_pointer,
                current_pointer,
                original_position,
                ..
            }) => {
                *current_pointer = pointer;
                self.needs_redraw = true;
                Ok(*original_position + (pointer - *start_pointer))
            }
            _ => Err(CanvasError::NoGesture("move")),
        }
    }

    /// Apply the move, once, with the last tracked pointer position.
    pub fn end_move(&mut self) -> CanvasResult<()> {
        let Some(gesture) = self.gesture.take_if(|g| matches!(g, Gesture::Move { .. })) else {
            return Err(CanvasError::NoGesture("move"));
        };
        self.needs_redraw = true;
        let delta = gesture.delta().unwrap_or(Vec2::ZERO);
        let Gesture::Move {
            shape,
            original_position,
            ..
        } = gesture
        else {
            return Ok(());
        };
        if delta == Vec2::ZERO {
            return Ok(());
        }
        self.move_shape(shape, original_position + delta)
    }

    // --- Resize gesture ---

    /// Start resizing `id` by dragging `corner`.
    pub fn begin_resize(
        &mut self,
        id: ShapeId,
        corner: Corner,
        screen_pointer: Point,
    ) -> CanvasResult<()> {
        let bounds = self.require_shape(id)?.bounds();
        let pointer = self.to_canvas(screen_pointer);
        self.gesture.begin(Gesture::Resize {
            shape: id,
            corner,
            grab_offset: corner.position_on(bounds) - pointer,
            original_bounds: bounds,
            current_bounds: bounds,
        });
        Ok(())
    }

    /// Track the pointer during a resize. Returns the clamped preview bounds.
    pub fn update_resize(&mut self, screen_pointer: Point) -> CanvasResult<Rect> {
        let pointer = self.to_canvas(screen_pointer);
        match self.gesture.current_mut() {
            Some(Gesture::Resize {
                corner,
                grab_offset,
                original_bounds,
                current_bounds,
                ..
            }) => {
                *current_bounds =
                    resize_from_corner(*original_bounds, *corner, pointer + *grab_offset);
                self.needs_redraw = true;
                Ok(*current_bounds)
            }
            _ => Err(CanvasError::NoGesture("resize")),
        }
    }

    pub fn end_resize(&mut self) -> CanvasResult<()> {
        let Some(Gesture::Resize {
            shape,
            original_bounds,
            current_bounds,
            ..
        }) = self.gesture.take_if(|g| matches!(g, Gesture::Resize { .. }))
        else {
            return Err(CanvasError::NoGesture("resize"));
        };
        self.needs_redraw = true;
        if current_bounds == original_bounds {
            return Ok(());
        }
        self.set_shape_bounds(shape, current_bounds)
    }

    /// Bounds to draw for a shape, including any in-progress move or resize.
    pub fn display_bounds(&self, id: ShapeId) -> Option<Rect> {
        let bounds = self.document.get_shape(id)?.bounds();
        let Some(gesture) = self.gesture.current().filter(|g| g.shape() == Some(id)) else {
            return Some(bounds);
        };
        let preview = match gesture {
            Gesture::Move {
                original_position, ..
            } => bounds.with_origin(*original_position + gesture.delta().unwrap_or(Vec2::ZERO)),
            Gesture::Resize { current_bounds, .. } => *current_bounds,
            Gesture::ConnectionDrag { .. } | Gesture::EndpointDrag { .. } => bounds,
        };
        Some(preview)
    }

    // --- Hit testing ---

    /// Topmost shape under a screen point.
    pub fn shape_at(&self, screen_point: Point) -> Option<ShapeId> {
        let point = self.to_canvas(screen_point);
        self.document.shapes_at_point(point, 0.0).first().copied()
    }

    /// Topmost anchor under a screen point. Anchors hit-test whether or not
    /// they are drawn.
    pub fn anchor_at(&self, screen_point: Point) -> Option<Endpoint> {
        let point = self.to_canvas(screen_point);
        let tolerance = self.config.anchor_tolerance;
        self.document.z_order.iter().rev().find_map(|&id| {
            let shape = self.document.get_shape(id)?;
            hit_test_anchor(shape, point, tolerance).map(|anchor| Endpoint::new(id, Some(anchor)))
        })
    }

    /// Resize corner of a selected shape under a screen point.
    pub fn resize_corner_at(&self, screen_point: Point) -> Option<(ShapeId, Corner)> {
        let point = self.to_canvas(screen_point);
        let tolerance = self.config.resize_tolerance;
        self.document.z_order.iter().rev().find_map(|&id| {
            if !self.widgets.is_selected(id) {
                return None;
            }
            let shape = self.document.get_shape(id)?;
            resize_handles(shape)
                .into_iter()
                .find(|handle| handle.hit_test(point, tolerance))
                .and_then(|handle| match handle.kind {
                    HandleKind::Resize(corner) => Some((id, corner)),
                    HandleKind::Anchor(_) => None,
                })
        })
    }

    /// Classify what a drag released at `screen_point` would land on.
    pub fn resolve_drop_target(&self, screen_point: Point) -> DropTarget {
        if !self.viewport.contains(screen_point) {
            return DropTarget::Nothing;
        }
        if let Some(endpoint) = self.anchor_at(screen_point) {
            return DropTarget::Handle(endpoint);
        }
        if self.shape_at(screen_point).is_some() {
            return DropTarget::Nothing;
        }
        DropTarget::Background
    }

    // --- Selection, hover and clicks ---

    pub fn select(&mut self, id: ShapeId) -> CanvasResult<()> {
        self.require_shape(id)?;
        self.widgets.select(id);
        self.needs_redraw = true;
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.widgets.clear_selection();
        self.needs_redraw = true;
    }

    pub fn is_selected(&self, id: ShapeId) -> bool {
        self.widgets.is_selected(id)
    }

    /// Track pointer movement for hover state. Returns the hovered shape.
    pub fn pointer_moved(&mut self, screen_point: Point) -> Option<ShapeId> {
        let hit = self.shape_at(screen_point);
        let previous = self.widgets.hovered();
        if hit != previous {
            if let Some(old) = previous {
                self.widgets.pointer_leave(old);
            }
            if let Some(new) = hit {
                self.widgets.pointer_enter(new);
            }
            self.needs_redraw = true;
        }
        hit
    }

    /// Handle a click: a shape gets selected, empty canvas clears the
    /// selection and any active cosmetic state.
    pub fn click(&mut self, screen_point: Point) -> Option<ShapeId> {
        let hit = self.shape_at(screen_point);
        if self.widgets.focused().is_some() && self.widgets.focused() != hit {
            self.commit_label();
        }
        match hit {
            Some(id) => {
                self.widgets.click(id);
                if !self.widgets.is_selected(id) {
                    self.widgets.select(id);
                }
            }
            None => {
                self.widgets.click_outside();
                self.widgets.clear_selection();
            }
        }
        self.needs_redraw = true;
        hit
    }

    // --- History ---

    pub fn undo(&mut self) -> bool {
        self.cancel_gesture();
        self.commit_label();
        if !self.document.undo() {
            return false;
        }
        self.sync_widgets();
        log::debug!("Undo");
        self.mark_changed();
        true
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gesture();
        self.commit_label();
        if !self.document.redo() {
            return false;
        }
        self.sync_widgets();
        log::debug!("Redo");
        self.mark_changed();
        true
    }

    fn sync_widgets(&mut self) {
        let shapes = &self.document.shapes;
        self.widgets.retain(|id| shapes.contains_key(&id));
    }

    // --- Camera ---

    /// Pan the view by a screen-space delta.
    pub fn pan(&mut self, delta: Vec2) {
        self.camera.pan(delta);
        self.needs_redraw = true;
    }

    /// Zoom around a window-relative screen point.
    pub fn zoom_at(&mut self, screen_point: Point, factor: f64) {
        self.camera
            .zoom_at(screen_point - self.viewport.origin.to_vec2(), factor);
        self.needs_redraw = true;
    }

    /// Fit the view to show all shapes.
    pub fn fit_to_content(&mut self) {
        if let Some(bounds) = self.document.bounds() {
            self.camera.fit_to_bounds(bounds, self.viewport.size, 50.0);
            self.needs_redraw = true;
        }
    }

    // --- Views ---

    /// Render view of one shape, using the configured label metrics.
    pub fn shape_view(&self, id: ShapeId) -> Option<ShapeView<'_>> {
        self.shape_view_with(id, &self.config.measure)
    }

    /// Render view of one shape with host-supplied text measurement.
    pub fn shape_view_with(&self, id: ShapeId, measure: &dyn TextMeasure) -> Option<ShapeView<'_>> {
        let shape = self.document.get_shape(id)?;
        Some(ShapeView::new(shape, &self.widgets, measure))
    }

    /// Views of all shapes, back to front.
    pub fn shape_views(&self) -> Vec<ShapeView<'_>> {
        self.document
            .shapes_ordered()
            .map(|shape| ShapeView::new(shape, &self.widgets, &self.config.measure))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logging() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    fn canvas() -> Canvas {
        init_logging();
        Canvas::with_config(EditorConfig::empty(), SelectionStore::new())
    }

    fn color(hex: &str) -> SerializableColor {
        SerializableColor::from_hex(hex).unwrap()
    }

    #[test]
    fn test_initial_shapes() {
        init_logging();
        let canvas = Canvas::new(SelectionStore::new());
        let shapes: Vec<&Shape> = canvas.document().shapes_ordered().collect();
        assert_eq!(shapes.len(), 2);
        assert_eq!(shapes[0].kind, ShapeKind::Square);
        assert_eq!(shapes[0].position, Point::new(770.0, 300.0));
        assert_eq!(shapes[1].kind, ShapeKind::Ellipse);
        assert_eq!(shapes[1].position, Point::new(370.0, 300.0));
        assert_eq!(canvas.revision(), 0);
        assert!(!canvas.document().can_undo());
    }

    #[test]
    fn test_from_config_seeds_selection() {
        init_logging();
        let mut config = EditorConfig::empty();
        config.default_kind = ShapeKind::Ellipse;
        config.default_color = color("#F7F700");
        let mut canvas = Canvas::from_config(config);

        let id = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        assert_eq!(canvas.selection().kind(), ShapeKind::Ellipse);
        assert_eq!(canvas.document().get_shape(id).unwrap().fill_color.to_hex(), "#F7F700");
    }

    #[test]
    fn test_add_shape_at_default_position() {
        let mut canvas = canvas();
        canvas.add_shape(ShapeKind::Square, Point::new(860.0, 300.0), None);
        let id = canvas.add_shape_at_default_position(ShapeKind::Ellipse, Some(color("#FF0006")));

        assert_eq!(canvas.document().len(), 2);
        let shape = canvas.document().get_shape(id).unwrap();
        assert_eq!(shape.kind, ShapeKind::Ellipse);
        assert_eq!(shape.fill_color.to_hex(), "#FF0006");
        assert_eq!(shape.position, Point::new(750.0, 350.0));
        assert!(shape.label.is_empty());
        assert_eq!(shape.size(), Size::new(200.0, 200.0));
        assert_eq!(canvas.document().z_order().last(), Some(&id));
    }

    #[test]
    fn test_color_is_snapshotted_at_creation() {
        let mut canvas = canvas();
        canvas.selection().set_color(color("#01F707"));
        let id = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        canvas.selection().set_color(color("#0808FE"));
        assert_eq!(canvas.document().get_shape(id).unwrap().fill_color.to_hex(), "#01F707");
    }

    #[test]
    fn test_delete_shape_cascades() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let b = canvas.add_shape(ShapeKind::Square, Point::new(400.0, 0.0), None);
        canvas.connect(Endpoint::shape(a), Endpoint::shape(b)).unwrap();

        canvas.delete_shape(a).unwrap();

        assert_eq!(canvas.document().len(), 1);
        assert!(canvas.document().contains_shape(b));
        assert_eq!(canvas.document().connection_count(), 0);
    }

    #[test]
    fn test_undo_restores_shape_and_connections_together() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let b = canvas.add_shape(ShapeKind::Ellipse, Point::new(400.0, 0.0), None);
        let link = canvas.connect(Endpoint::shape(a), Endpoint::shape(b)).unwrap();
        canvas.delete_shape(a).unwrap();

        assert!(canvas.undo());
        assert_eq!(canvas.document().len(), 2);
        assert!(canvas.document().connection(link).is_some());

        assert!(canvas.redo());
        assert_eq!(canvas.document().len(), 1);
        assert_eq!(canvas.document().connection_count(), 0);
    }

    #[test]
    fn test_connect_rejects_unknown_shapes_and_duplicates() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let b = canvas.add_shape(ShapeKind::Square, Point::new(400.0, 0.0), None);
        let ghost = Uuid::new_v4();

        assert_eq!(
            canvas.connect(Endpoint::shape(a), Endpoint::shape(ghost)),
            Err(CanvasError::ShapeNotFound(ghost))
        );

        let first = canvas
            .connect(Endpoint::new(a, Some(Anchor::Right)), Endpoint::new(b, Some(Anchor::Left)))
            .unwrap();
        let revision = canvas.revision();
        let second = canvas
            .connect(Endpoint::new(a, Some(Anchor::Right)), Endpoint::new(b, Some(Anchor::Left)))
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(canvas.document().connection_count(), 1);
        assert_eq!(canvas.revision(), revision);
    }

    #[test]
    fn test_connection_drag_to_background_spawns_shape() {
        let mut canvas = canvas();
        canvas.set_viewport(Point::new(100.0, 50.0), Size::new(1200.0, 800.0));
        canvas.selection().set_kind(ShapeKind::Ellipse);
        canvas.selection().set_color(color("#F6781D"));
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);

        canvas.begin_connection_drag(a, Some(Anchor::Right)).unwrap();
        let outcome = canvas
            .complete_connection_drag(Point::new(500.0, 400.0), DropTarget::Background)
            .unwrap();

        let ConnectionDragOutcome::Spawned { shape, connection } = outcome else {
            panic!("expected a spawned shape, got {:?}", outcome);
        };
        let spawned = canvas.document().get_shape(shape).unwrap();
        assert_eq!(spawned.kind, ShapeKind::Ellipse);
        assert_eq!(spawned.fill_color.to_hex(), "#F6781D");
        assert!((spawned.position.x - 325.0).abs() < 1e-9);
        assert!((spawned.position.y - 350.0).abs() < 1e-9);

        let link = canvas.document().connection(connection).unwrap();
        assert_eq!(link.source_endpoint(), Endpoint::new(a, Some(Anchor::Right)));
        assert_eq!(link.target_endpoint(), Endpoint::shape(shape));
        assert!(canvas.gesture().is_none());
    }

    #[test]
    fn test_connection_drag_applies_camera_transform() {
        let mut canvas = canvas();
        canvas.camera.zoom = 2.0;
        canvas.camera.offset = Vec2::new(50.0, 0.0);
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);

        canvas.begin_connection_drag(a, None).unwrap();
        let outcome = canvas
            .complete_connection_drag(Point::new(450.0, 200.0), DropTarget::Background)
            .unwrap();
        let ConnectionDragOutcome::Spawned { shape, .. } = outcome else {
            panic!("expected a spawned shape");
        };
        let position = canvas.document().get_shape(shape).unwrap().position;
        assert!((position.x - 125.0).abs() < 1e-9);
        assert!((position.y - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_connection_drag_to_handle_connects() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let b = canvas.add_shape(ShapeKind::Square, Point::new(400.0, 0.0), None);

        canvas.begin_connection_drag(a, Some(Anchor::Right)).unwrap();
        let target = Endpoint::new(b, Some(Anchor::Left));
        let outcome = canvas
            .complete_connection_drag(Point::new(400.0, 100.0), DropTarget::Handle(target))
            .unwrap();

        let ConnectionDragOutcome::Connected(id) = outcome else {
            panic!("expected a connection");
        };
        assert_eq!(canvas.document().connection(id).unwrap().target_endpoint(), target);
        assert_eq!(canvas.document().len(), 2);
    }

    #[test]
    fn test_connection_drag_to_nothing_is_noop() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let revision = canvas.revision();

        canvas.begin_connection_drag(a, None).unwrap();
        let outcome = canvas
            .complete_connection_drag(Point::new(900.0, 900.0), DropTarget::Nothing)
            .unwrap();

        assert_eq!(outcome, ConnectionDragOutcome::Cancelled);
        assert_eq!(canvas.document().len(), 1);
        assert_eq!(canvas.document().connection_count(), 0);
        assert_eq!(canvas.revision(), revision);
        assert!(canvas.gesture().is_none());
    }

    #[test]
    fn test_complete_without_begin_is_an_error() {
        let mut canvas = canvas();
        assert_eq!(
            canvas.complete_connection_drag(Point::ZERO, DropTarget::Background),
            Err(CanvasError::NoGesture("connection"))
        );
        assert!(canvas.document().is_empty());
    }

    #[test]
    fn test_connection_drag_with_deleted_origin() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        canvas.begin_connection_drag(a, None).unwrap();
        canvas.delete_shape(a).unwrap();

        let outcome = canvas
            .complete_connection_drag(Point::new(600.0, 600.0), DropTarget::Background)
            .unwrap();
        assert_eq!(outcome, ConnectionDragOutcome::Cancelled);
        assert!(canvas.document().is_empty());
    }

    #[test]
    fn test_new_gesture_replaces_stale_one() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        canvas.begin_connection_drag(a, None).unwrap();
        canvas.begin_move(a, Point::new(10.0, 10.0)).unwrap();

        assert_eq!(canvas.gesture().map(Gesture::name), Some("move"));
        assert_eq!(
            canvas.complete_connection_drag(Point::ZERO, DropTarget::Background),
            Err(CanvasError::NoGesture("connection"))
        );
        assert_eq!(canvas.gesture().map(Gesture::name), Some("move"));
    }

    #[test]
    fn test_update_connection_endpoint() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let b = canvas.add_shape(ShapeKind::Square, Point::new(400.0, 0.0), None);
        let c = canvas.add_shape(ShapeKind::Ellipse, Point::new(0.0, 400.0), None);
        let link = canvas.connect(Endpoint::shape(a), Endpoint::shape(b)).unwrap();

        let top_of_c = Endpoint::new(c, Some(Anchor::Top));
        canvas
            .update_connection_endpoint(link, EndpointSide::Target, Some(top_of_c))
            .unwrap();
        let connection = canvas.document().connection(link).unwrap();
        assert_eq!(connection.target, c);
        assert_eq!(connection.target_handle, Some(Anchor::Top));

        canvas.update_connection_endpoint(link, EndpointSide::Source, None).unwrap();
        assert!(canvas.document().connection(link).is_none());

        assert_eq!(
            canvas.update_connection_endpoint(link, EndpointSide::Source, None),
            Err(CanvasError::ConnectionNotFound(link))
        );
    }

    #[test]
    fn test_endpoint_drag_without_reconnect_removes_connection() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let b = canvas.add_shape(ShapeKind::Square, Point::new(400.0, 0.0), None);
        let link = canvas.connect(Endpoint::shape(a), Endpoint::shape(b)).unwrap();

        canvas.begin_endpoint_drag(link, EndpointSide::Target).unwrap();
        assert!(!canvas.complete_endpoint_drag(DropTarget::Background).unwrap());
        assert_eq!(canvas.document().connection_count(), 0);
        assert_eq!(canvas.document().len(), 2);
        assert!(canvas.gesture().is_none());
    }

    #[test]
    fn test_endpoint_drag_onto_handle_rehomes() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let b = canvas.add_shape(ShapeKind::Square, Point::new(400.0, 0.0), None);
        let c = canvas.add_shape(ShapeKind::Square, Point::new(800.0, 0.0), None);
        let link = canvas.connect(Endpoint::shape(a), Endpoint::shape(b)).unwrap();

        canvas.begin_endpoint_drag(link, EndpointSide::Target).unwrap();
        let kept = canvas
            .complete_endpoint_drag(DropTarget::Handle(Endpoint::new(c, Some(Anchor::Left))))
            .unwrap();
        assert!(kept);
        assert_eq!(canvas.document().connection(link).unwrap().target, c);
    }

    #[test]
    fn test_endpoint_drag_onto_deleted_shape_removes_connection() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let b = canvas.add_shape(ShapeKind::Square, Point::new(400.0, 0.0), None);
        let link = canvas.connect(Endpoint::shape(a), Endpoint::shape(b)).unwrap();

        canvas.begin_endpoint_drag(link, EndpointSide::Source).unwrap();
        let ghost = Endpoint::shape(Uuid::new_v4());
        assert!(!canvas.complete_endpoint_drag(DropTarget::Handle(ghost)).unwrap());
        assert!(canvas.document().connection(link).is_none());
    }

    #[test]
    fn test_move_gesture_applies_once() {
        let mut canvas = canvas();
        let id = canvas.add_shape(ShapeKind::Square, Point::new(100.0, 100.0), None);
        let revision = canvas.revision();

        canvas.begin_move(id, Point::new(150.0, 150.0)).unwrap();
        canvas.update_move(Point::new(170.0, 160.0)).unwrap();
        let preview = canvas.update_move(Point::new(200.0, 190.0)).unwrap();
        assert_eq!(preview, Point::new(150.0, 140.0));

        // Preview only: the document is untouched until the gesture ends.
        assert_eq!(canvas.document().get_shape(id).unwrap().position, Point::new(100.0, 100.0));
        assert_eq!(canvas.display_bounds(id).unwrap().origin(), Point::new(150.0, 140.0));
        assert_eq!(canvas.revision(), revision);

        canvas.end_move().unwrap();
        assert_eq!(canvas.document().get_shape(id).unwrap().position, Point::new(150.0, 140.0));
        assert_eq!(canvas.revision(), revision + 1);

        assert!(canvas.undo());
        assert_eq!(canvas.document().get_shape(id).unwrap().position, Point::new(100.0, 100.0));
    }

    #[test]
    fn test_resize_gesture_clamps_live() {
        let mut canvas = canvas();
        let id = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);

        canvas.begin_resize(id, Corner::BottomRight, Point::new(198.0, 200.0)).unwrap();
        let preview = canvas.update_resize(Point::new(48.0, 50.0)).unwrap();
        assert_eq!(preview, Rect::new(0.0, 0.0, 200.0, 200.0));

        let preview = canvas.update_resize(Point::new(398.0, 300.0)).unwrap();
        assert_eq!(preview, Rect::new(0.0, 0.0, 400.0, 300.0));

        canvas.end_resize().unwrap();
        let shape = canvas.document().get_shape(id).unwrap();
        assert_eq!(shape.size(), Size::new(400.0, 300.0));
        assert_eq!(shape.position, Point::ZERO);
    }

    #[test]
    fn test_resize_from_top_left_moves_origin() {
        let mut canvas = canvas();
        let id = canvas.add_shape(ShapeKind::Ellipse, Point::new(100.0, 100.0), None);

        canvas.begin_resize(id, Corner::TopLeft, Point::new(100.0, 100.0)).unwrap();
        canvas.update_resize(Point::new(50.0, 20.0)).unwrap();
        canvas.end_resize().unwrap();

        let shape = canvas.document().get_shape(id).unwrap();
        assert_eq!(shape.position, Point::new(50.0, 20.0));
        assert_eq!(shape.size(), Size::new(250.0, 280.0));
    }

    #[test]
    fn test_resize_shape_clamps() {
        let mut canvas = canvas();
        let id = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let applied = canvas.resize_shape(id, Size::new(10.0, 500.0)).unwrap();
        assert_eq!(applied, Size::new(200.0, 500.0));
        assert_eq!(canvas.document().get_shape(id).unwrap().size(), applied);
    }

    #[test]
    fn test_label_editing_normalizes_on_commit() {
        let mut canvas = canvas();
        let id = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);

        canvas.begin_label_edit(id).unwrap();
        canvas.relabel_shape(id, "   ").unwrap();
        assert_eq!(canvas.commit_label(), Some(id));
        assert_eq!(canvas.document().get_shape(id).unwrap().label, "");
        assert!(!canvas.widgets().is_editing());
    }

    #[test]
    fn test_label_edit_is_one_undo_step() {
        let mut canvas = canvas();
        let id = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);

        canvas.begin_label_edit(id).unwrap();
        canvas.relabel_shape(id, "D").unwrap();
        canvas.relabel_shape(id, "Do").unwrap();
        canvas.relabel_shape(id, "Done").unwrap();
        canvas.commit_label();
        assert_eq!(canvas.document().get_shape(id).unwrap().label, "Done");

        assert!(canvas.undo());
        assert_eq!(canvas.document().get_shape(id).unwrap().label, "");
        assert!(canvas.document().contains_shape(id));
    }

    #[test]
    fn test_label_box_follows_text() {
        let mut canvas = canvas();
        let id = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let empty = canvas.shape_view(id).unwrap().label.height();

        canvas
            .relabel_shape(id, "a label long enough to wrap across a few lines of the box")
            .unwrap();
        let long = canvas.shape_view(id).unwrap().label.height();
        assert!(long > empty);

        canvas.relabel_shape(id, "").unwrap();
        let again = canvas.shape_view(id).unwrap().label.height();
        assert!((again - empty).abs() < f64::EPSILON);
    }

    #[test]
    fn test_delete_selected() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let b = canvas.add_shape(ShapeKind::Square, Point::new(400.0, 0.0), None);
        let c = canvas.add_shape(ShapeKind::Square, Point::new(800.0, 0.0), None);
        canvas.connect(Endpoint::shape(a), Endpoint::shape(b)).unwrap();
        canvas.connect(Endpoint::shape(b), Endpoint::shape(c)).unwrap();

        canvas.select(b).unwrap();
        assert_eq!(canvas.delete_selected(), 1);
        assert_eq!(canvas.document().len(), 2);
        assert_eq!(canvas.document().connection_count(), 0);
        assert_eq!(canvas.delete_selected(), 0);
    }

    #[test]
    fn test_unknown_ids_are_errors() {
        let mut canvas = canvas();
        let ghost = Uuid::new_v4();
        assert_eq!(canvas.move_shape(ghost, Point::ZERO), Err(CanvasError::ShapeNotFound(ghost)));
        assert_eq!(canvas.delete_shape(ghost), Err(CanvasError::ShapeNotFound(ghost)));
        assert_eq!(canvas.relabel_shape(ghost, "x"), Err(CanvasError::ShapeNotFound(ghost)));
        assert_eq!(
            canvas.delete_connection(ghost),
            Err(CanvasError::ConnectionNotFound(ghost))
        );
        assert_eq!(
            canvas.begin_connection_drag(ghost, None),
            Err(CanvasError::ShapeNotFound(ghost))
        );
        assert_eq!(canvas.end_move(), Err(CanvasError::NoGesture("move")));
        assert_eq!(canvas.revision(), 0);
    }

    #[test]
    fn test_resolve_drop_target() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);

        assert_eq!(canvas.resolve_drop_target(Point::new(-5.0, 10.0)), DropTarget::Nothing);
        assert_eq!(
            canvas.resolve_drop_target(Point::new(201.0, 100.0)),
            DropTarget::Handle(Endpoint::new(a, Some(Anchor::Right)))
        );
        assert_eq!(canvas.resolve_drop_target(Point::new(100.0, 100.0)), DropTarget::Nothing);
        assert_eq!(canvas.resolve_drop_target(Point::new(600.0, 600.0)), DropTarget::Background);
    }

    #[test]
    fn test_resize_corner_only_for_selected_shapes() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        assert_eq!(canvas.resize_corner_at(Point::new(200.0, 200.0)), None);

        canvas.select(a).unwrap();
        assert_eq!(
            canvas.resize_corner_at(Point::new(199.0, 201.0)),
            Some((a, Corner::BottomRight))
        );
    }

    #[test]
    fn test_hover_and_click() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);

        assert_eq!(canvas.pointer_moved(Point::new(50.0, 50.0)), Some(a));
        assert!(canvas.widgets().anchors_visible(a));
        assert!(canvas.widgets().placeholder_visible(a));

        assert_eq!(canvas.click(Point::new(50.0, 50.0)), Some(a));
        assert!(canvas.is_selected(a));

        assert_eq!(canvas.pointer_moved(Point::new(600.0, 600.0)), None);
        assert!(canvas.widgets().anchors_visible(a));

        assert_eq!(canvas.click(Point::new(600.0, 600.0)), None);
        assert!(!canvas.is_selected(a));
        assert!(!canvas.widgets().anchors_visible(a));
        assert!(!canvas.widgets().placeholder_visible(a));
    }

    #[test]
    fn test_redraw_requests_and_revision() {
        let mut canvas = canvas();
        assert!(canvas.take_redraw_request());
        assert!(!canvas.take_redraw_request());

        canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        assert_eq!(canvas.revision(), 1);
        assert!(canvas.take_redraw_request());

        canvas.pan(Vec2::new(10.0, 0.0));
        assert_eq!(canvas.revision(), 1);
        assert!(canvas.take_redraw_request());
    }

    #[test]
    fn test_undo_history_is_bounded() {
        let mut canvas = canvas();
        for i in 0..60 {
            canvas.add_shape(ShapeKind::Square, Point::new(i as f64, 0.0), None);
        }
        let mut undone = 0;
        while canvas.undo() {
            undone += 1;
        }
        assert_eq!(undone, MAX_UNDO_HISTORY);
        assert_eq!(canvas.document().len(), 10);
    }

    fn connected_document() -> (CanvasDocument, ShapeId, ShapeId) {
        let mut document = CanvasDocument::new();
        let a = document.add_shape(Shape::new(
            ShapeKind::Square,
            Point::ZERO,
            SerializableColor::black(),
        ));
        let b = document.add_shape(Shape::new(
            ShapeKind::Ellipse,
            Point::new(400.0, 0.0),
            SerializableColor::white(),
        ));
        document
            .add_connection(Connection::new(Endpoint::shape(a), Endpoint::shape(b)))
            .unwrap();
        (document, a, b)
    }

    fn document_json(document: &CanvasDocument) -> serde_json::Value {
        serde_json::from_str(&document.to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_from_json_drops_dangling_connections() {
        init_logging();
        let (document, a, b) = connected_document();
        let mut json = document_json(&document);
        json["shapes"].as_object_mut().unwrap().remove(&a.to_string());

        let restored = CanvasDocument::from_json(&json.to_string()).unwrap();
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.z_order(), &[b]);
        assert_eq!(restored.connection_count(), 0);
    }

    #[test]
    fn test_from_json_drops_shapes_under_foreign_key() {
        init_logging();
        let (document, a, b) = connected_document();
        let mut json = document_json(&document);
        let shapes = json["shapes"].as_object_mut().unwrap();
        let moved = shapes.remove(&b.to_string()).unwrap();
        shapes.insert(Uuid::new_v4().to_string(), moved);

        let restored = CanvasDocument::from_json(&json.to_string()).unwrap();
        assert_eq!(restored.shape_ids().collect::<Vec<_>>(), vec![a]);
        assert_eq!(restored.z_order(), &[a]);
        assert_eq!(restored.connection_count(), 0);
        assert!(restored.get_shape(b).is_none());
    }

    #[test]
    fn test_added_shapes_have_unique_ids() {
        let mut canvas = canvas();
        let mut origin = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        for i in 0..24 {
            let kind = if i % 2 == 0 { ShapeKind::Ellipse } else { ShapeKind::Square };
            canvas.add_shape(kind, Point::new(10.0 * i as f64, 0.0), None);
        }
        for _ in 0..3 {
            canvas.begin_connection_drag(origin, None).unwrap();
            let outcome = canvas
                .complete_connection_drag(Point::new(900.0, 600.0), DropTarget::Background)
                .unwrap();
            let ConnectionDragOutcome::Spawned { shape, .. } = outcome else {
                panic!("expected a spawned shape, got {:?}", outcome);
            };
            origin = shape;
        }

        let document = canvas.document();
        let ordered: HashSet<ShapeId> = document.z_order().iter().copied().collect();
        let keys: HashSet<ShapeId> = document.shape_ids().collect();
        assert_eq!(document.len(), 28);
        assert_eq!(ordered.len(), document.z_order().len());
        assert_eq!(ordered, keys);
    }

    #[test]
    fn test_label_edit_without_change_keeps_history() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        canvas.add_shape(ShapeKind::Square, Point::new(400.0, 0.0), None);
        assert!(canvas.undo());
        let revision = canvas.revision();

        canvas.begin_label_edit(a).unwrap();
        assert_eq!(canvas.commit_label(), Some(a));

        assert!(canvas.document().can_redo());
        assert_eq!(canvas.revision(), revision);
        assert!(canvas.undo());
        assert!(canvas.document().is_empty());
        assert!(canvas.redo());
        assert!(canvas.redo());
        assert_eq!(canvas.document().len(), 2);
    }

    #[test]
    fn test_rehoming_onto_existing_link_drops_duplicate() {
        let mut canvas = canvas();
        let a = canvas.add_shape(ShapeKind::Square, Point::ZERO, None);
        let b = canvas.add_shape(ShapeKind::Square, Point::new(400.0, 0.0), None);
        let c = canvas.add_shape(ShapeKind::Square, Point::new(800.0, 0.0), None);
        let a_to_c = canvas.connect(Endpoint::shape(a), Endpoint::shape(c)).unwrap();
        let a_to_b = canvas.connect(Endpoint::shape(a), Endpoint::shape(b)).unwrap();

        canvas
            .update_connection_endpoint(a_to_b, EndpointSide::Target, Some(Endpoint::shape(c)))
            .unwrap();
        assert_eq!(canvas.document().connection_count(), 1);
        assert!(canvas.document().connection(a_to_b).is_none());
        assert!(canvas.document().connection(a_to_c).is_some());

        let again = canvas.connect(Endpoint::shape(a), Endpoint::shape(b)).unwrap();
        canvas.begin_endpoint_drag(again, EndpointSide::Target).unwrap();
        let kept = canvas
            .complete_endpoint_drag(DropTarget::Handle(Endpoint::shape(c)))
            .unwrap();
        assert!(!kept);
        assert_eq!(canvas.document().connection_count(), 1);
        let remaining = canvas.document().find_link(Endpoint::shape(a), Endpoint::shape(c));
        assert_eq!(remaining, Some(a_to_c));
    }
}
