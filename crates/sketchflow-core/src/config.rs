//! Editor configuration.

use std::fs;
use std::path::Path;

use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::palette::DEFAULT_COLOR;
use crate::selection::Selection;
use crate::shapes::{ApproximateMeasure, MIN_SHAPE_SIZE, SerializableColor, ShapeKind};

/// A shape created when the canvas starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialShape {
    pub kind: ShapeKind,
    pub position: Point,
    #[serde(default)]
    pub label: String,
    /// Falls back to the configured default color.
    #[serde(default)]
    pub color: Option<SerializableColor>,
}

impl InitialShape {
    pub fn new(kind: ShapeKind, position: Point) -> Self {
        Self {
            kind,
            position,
            label: String::new(),
            color: None,
        }
    }
}

/// Editor configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Where the toolbar's "add" control places new shapes.
    pub default_position: Point,
    /// Size of newly created shapes.
    pub default_size: Size,
    /// Subtracted from the pointer when a connection drag drops a new shape
    /// on the background, so the shape lands under the pointer.
    pub drop_offset: Vec2,
    /// Initial shared selection kind.
    pub default_kind: ShapeKind,
    /// Initial shared selection color.
    pub default_color: SerializableColor,
    /// Hit radius of connection anchors, in canvas units.
    pub anchor_tolerance: f64,
    /// Hit radius of resize corners, in canvas units.
    pub resize_tolerance: f64,
    /// Label metrics used when the host supplies no text measurement.
    pub measure: ApproximateMeasure,
    /// Shapes present when the canvas starts.
    pub initial_shapes: Vec<InitialShape>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            default_position: Point::new(750.0, 350.0),
            default_size: MIN_SHAPE_SIZE,
            drop_offset: Vec2::new(75.0, 0.0),
            default_kind: ShapeKind::Square,
            default_color: DEFAULT_COLOR,
            anchor_tolerance: 8.0,
            resize_tolerance: 6.0,
            measure: ApproximateMeasure::default(),
            initial_shapes: vec![
                InitialShape::new(ShapeKind::Square, Point::new(770.0, 300.0)),
                InitialShape::new(ShapeKind::Ellipse, Point::new(370.0, 300.0)),
            ],
        }
    }
}

impl EditorConfig {
    /// Configuration without any initial shapes.
    pub fn empty() -> Self {
        Self {
            initial_shapes: Vec::new(),
            ..Self::default()
        }
    }

    /// Shared selection the session starts with.
    pub fn initial_selection(&self) -> Selection {
        Selection {
            kind: self.default_kind,
            color: self.default_color,
        }
    }

    /// Parse and validate a JSON configuration. Missing fields use defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!(
            "Loaded editor configuration from {} ({} initial shapes)",
            path.display(),
            config.initial_shapes.len()
        );
        Ok(config)
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_size.width < MIN_SHAPE_SIZE.width
            || self.default_size.height < MIN_SHAPE_SIZE.height
        {
            return Err(ConfigError::Invalid(format!(
                "default_size {}x{} is below the {}x{} minimum",
                self.default_size.width,
                self.default_size.height,
                MIN_SHAPE_SIZE.width,
                MIN_SHAPE_SIZE.height
            )));
        }
        for (name, value) in [
            ("anchor_tolerance", self.anchor_tolerance),
            ("resize_tolerance", self.resize_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::Invalid(format!("{name} must be a non-negative number")));
            }
        }
        let measure = &self.measure;
        if measure.font_size <= 0.0
            || measure.char_width_factor <= 0.0
            || measure.line_height_factor <= 0.0
        {
            return Err(ConfigError::Invalid("label metrics must be positive".to_string()));
        }
        Ok(())
    }
}
