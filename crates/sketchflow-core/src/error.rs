//! Error types.

use crate::connection::ConnectionId;
use crate::shapes::ShapeId;
use thiserror::Error;

/// Errors returned by canvas operations.
///
/// None of these are fatal. Hosts are expected to log them and carry on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CanvasError {
    #[error("Shape not found: {0}")]
    ShapeNotFound(ShapeId),
    #[error("Connection not found: {0}")]
    ConnectionNotFound(ConnectionId),
    #[error("No {0} gesture in progress")]
    NoGesture(&'static str),
    #[error("Invalid color: {0:?}")]
    InvalidColor(String),
    #[error("Unknown shape kind: {0:?}")]
    UnknownShapeKind(String),
    #[error("Unknown anchor: {0:?}")]
    UnknownAnchor(String),
}

/// Result type for canvas operations.
pub type CanvasResult<T> = Result<T, CanvasError>;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
