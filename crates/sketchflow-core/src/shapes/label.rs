//! Shape labels and label box auto-grow.
//!
//! The label box height always follows the measured content height. There is
//! no character-count threshold and no sticky expanded state: shrinking the
//! text shrinks the box again.

use kurbo::{Rect, Size};
use serde::{Deserialize, Serialize};

use super::ShapeKind;

/// Measures rendered label text.
///
/// The host renderer can supply exact measurements. [`ApproximateMeasure`] is
/// used otherwise.
pub trait TextMeasure {
    /// Size of `text` when wrapped to `max_width`.
    fn measure(&self, text: &str, max_width: f64) -> Size;
}

/// Character-width based text measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApproximateMeasure {
    /// Font size in canvas units.
    pub font_size: f64,
    /// Average glyph width as a fraction of the font size.
    pub char_width_factor: f64,
    /// Line height as a multiple of the font size.
    pub line_height_factor: f64,
}

impl Default for ApproximateMeasure {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            char_width_factor: 0.55,
            line_height_factor: 1.5,
        }
    }
}

impl ApproximateMeasure {
    /// Height of a single line.
    pub fn line_height(&self) -> f64 {
        self.font_size * self.line_height_factor
    }

    /// Width of a single character.
    pub fn char_width(&self) -> f64 {
        self.font_size * self.char_width_factor
    }

    /// Number of visual lines `text` wraps to within `max_width`.
    pub fn line_count(&self, text: &str, max_width: f64) -> usize {
        let per_line = ((max_width / self.char_width()).floor() as usize).max(1);
        text.split('\n')
            .map(|line| wrapped_lines(line, per_line))
            .sum::<usize>()
            .max(1)
    }
}

impl TextMeasure for ApproximateMeasure {
    fn measure(&self, text: &str, max_width: f64) -> Size {
        let widest = text
            .split('\n')
            .map(|line| line.chars().count())
            .max()
            .unwrap_or(0) as f64;
        let width = (widest * self.char_width()).min(max_width.max(0.0));
        let height = self.line_count(text, max_width) as f64 * self.line_height();
        Size::new(width, height)
    }
}

/// Greedy word wrap of one hard line into lines of at most `per_line` chars.
fn wrapped_lines(line: &str, per_line: usize) -> usize {
    let mut lines = 1;
    let mut current = 0;
    for word in line.split(' ') {
        let len = word.chars().count();
        let needed = if current == 0 { len } else { current + 1 + len };
        if needed <= per_line {
            current = needed;
            continue;
        }
        if current > 0 {
            lines += 1;
        }
        // Words longer than a line break mid-word.
        lines += len.saturating_sub(1) / per_line;
        current = match len % per_line {
            0 if len > 0 => per_line,
            rem => rem,
        };
    }
    lines
}

/// Normalize a label when editing ends: whitespace-only collapses to empty.
pub fn normalize_label(label: &str) -> String {
    if label.trim().is_empty() {
        String::new()
    } else {
        label.to_string()
    }
}

/// Computed label box for a shape.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelLayout {
    /// Label box in canvas coordinates, vertically centered in the shape.
    pub rect: Rect,
    /// Padding applied inside the outline.
    pub padding: f64,
    /// Whether the content is taller than the shape can show.
    pub overflows: bool,
}

impl LabelLayout {
    /// Lay out `label` inside `bounds` for a shape of `kind`.
    pub fn compute(kind: ShapeKind, bounds: Rect, label: &str, measure: &dyn TextMeasure) -> Self {
        let padding = kind.label_padding();
        let max_width = (bounds.width() - padding * 2.0).max(1.0);
        // Empty labels still reserve one line for the caret and placeholder.
        let sample = if label.is_empty() { " " } else { label };
        let content = measure.measure(sample, max_width);
        let available = (bounds.height() - padding * 2.0).max(0.0);
        let height = content.height.min(bounds.height());

        let center = bounds.center();
        let rect = Rect::new(
            bounds.x0 + padding,
            center.y - height / 2.0,
            bounds.x1 - padding,
            center.y + height / 2.0,
        );
        Self {
            rect,
            padding,
            overflows: content.height > available,
        }
    }

    /// Height of the label box.
    pub fn height(&self) -> f64 {
        self.rect.height()
    }
}
