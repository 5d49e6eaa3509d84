//! SketchFlow Core Library
//!
//! Canvas interaction and state model for a whiteboard diagram editor: shapes,
//! connections, gestures and the toolbar that feeds them. Rendering, pan/zoom
//! and minimap drawing belong to the host engine.

pub mod camera;
pub mod canvas;
pub mod config;
pub mod connection;
pub mod error;
pub mod gesture;
pub mod palette;
pub mod selection;
pub mod shapes;
pub mod toolbar;
pub mod widget;

pub use camera::{Camera, ViewTransform, Viewport};
pub use canvas::{Canvas, CanvasDocument, ConnectionDragOutcome};
pub use config::{EditorConfig, InitialShape};
pub use connection::{Connection, ConnectionId, Endpoint, EndpointSide};
pub use error::{CanvasError, CanvasResult, ConfigError};
pub use gesture::{DropTarget, Gesture};
pub use palette::{DEFAULT_COLOR, PALETTE, Swatch};
pub use selection::{Selection, SelectionStore};
pub use shapes::{
    Anchor, ApproximateMeasure, LabelLayout, MIN_SHAPE_SIZE, SerializableColor, Shape, ShapeId,
    ShapeKind, TextMeasure,
};
pub use toolbar::{DRAG_PAYLOAD_TYPE, DragPayload, Toolbar};
pub use widget::{Corner, Handle, HandleKind, ShapeView, WidgetManager, WidgetState};
