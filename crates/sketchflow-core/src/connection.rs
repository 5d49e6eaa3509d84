//! Connections between shapes.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::shapes::{Anchor, ShapeId};

/// Unique identifier for connections.
pub type ConnectionId = Uuid;

/// One end of a connection: a shape and optionally the anchor it attaches to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub shape: ShapeId,
    /// `None` lets the renderer choose the attachment point.
    #[serde(default)]
    pub handle: Option<Anchor>,
}

impl Endpoint {
    pub fn new(shape: ShapeId, handle: Option<Anchor>) -> Self {
        Self { shape, handle }
    }

    /// An endpoint without a specific anchor.
    pub fn shape(shape: ShapeId) -> Self {
        Self::new(shape, None)
    }
}

/// Which end of a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EndpointSide {
    Source,
    Target,
}

/// A directed link between two shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub(crate) id: ConnectionId,
    /// ID of the source shape.
    pub source: ShapeId,
    /// ID of the target shape.
    pub target: ShapeId,
    #[serde(default)]
    pub source_handle: Option<Anchor>,
    #[serde(default)]
    pub target_handle: Option<Anchor>,
}

impl Connection {
    /// Create a new connection between two endpoints.
    pub fn new(source: Endpoint, target: Endpoint) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: source.shape,
            target: target.shape,
            source_handle: source.handle,
            target_handle: target.handle,
        }
    }

    pub fn id(&self) -> ConnectionId {
        self.id
    }

    pub fn source_endpoint(&self) -> Endpoint {
        Endpoint::new(self.source, self.source_handle)
    }

    pub fn target_endpoint(&self) -> Endpoint {
        Endpoint::new(self.target, self.target_handle)
    }

    pub fn endpoint(&self, side: EndpointSide) -> Endpoint {
        match side {
            EndpointSide::Source => self.source_endpoint(),
            EndpointSide::Target => self.target_endpoint(),
        }
    }

    /// Re-home one end of the connection.
    pub fn set_endpoint(&mut self, side: EndpointSide, endpoint: Endpoint) {
        match side {
            EndpointSide::Source => {
                self.source = endpoint.shape;
                self.source_handle = endpoint.handle;
            }
            EndpointSide::Target => {
                self.target = endpoint.shape;
                self.target_handle = endpoint.handle;
            }
        }
    }

    /// Check if either end references `shape`.
    pub fn touches(&self, shape: ShapeId) -> bool {
        self.source == shape || self.target == shape
    }

    /// Check if this connection runs from `source` to `target`.
    pub fn links(&self, source: Endpoint, target: Endpoint) -> bool {
        self.source_endpoint() == source && self.target_endpoint() == target
    }

    /// Check if this connection links the same endpoints as `other`.
    pub fn same_link(&self, other: &Connection) -> bool {
        self.links(other.source_endpoint(), other.target_endpoint())
    }
}
