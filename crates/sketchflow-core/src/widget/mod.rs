//! Widget system for managing interactive shape states.
//!
//! This module provides a unified way to manage UI state for shapes:
//! - Selection, hover and label editing state
//! - Connection anchors and resize corners
//! - Render-ready shape views
//!
//! Shapes remain pure data. Widgets wrap shapes with UI state.

mod handles;
mod manager;
mod state;
mod view;

pub use handles::{
    Corner, Handle, HandleKind, HandleShape, anchor_handles, hit_test_anchor,
    resize_from_corner, resize_handles,
};
pub use manager::WidgetManager;
pub use state::WidgetState;
pub use view::{LABEL_PLACEHOLDER, ShapeView};
