//! Fixed fill color palette offered by the toolbar.

use crate::shapes::SerializableColor;

/// Fill color used until the user picks another one.
pub const DEFAULT_COLOR: SerializableColor = SerializableColor::rgb(0x8B, 0x5C, 0xF6);

/// A palette swatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Swatch {
    /// Stable identifier, used by hosts to key swatch controls.
    pub id: u8,
    pub color: SerializableColor,
}

/// The nine swatches, in display order.
pub static PALETTE: [Swatch; 9] = [
    Swatch { id: 1, color: SerializableColor::rgb(0x00, 0x00, 0x00) },
    Swatch { id: 2, color: SerializableColor::rgb(0x55, 0x55, 0x55) },
    Swatch { id: 3, color: SerializableColor::rgb(0xFF, 0x00, 0x06) },
    Swatch { id: 4, color: SerializableColor::rgb(0xF6, 0x78, 0x1D) },
    Swatch { id: 5, color: SerializableColor::rgb(0xF7, 0xF7, 0x00) },
    Swatch { id: 6, color: SerializableColor::rgb(0x01, 0xF7, 0x07) },
    Swatch { id: 7, color: SerializableColor::rgb(0x08, 0x08, 0xFE) },
    Swatch { id: 8, color: DEFAULT_COLOR },
    Swatch { id: 9, color: SerializableColor::rgb(0xFF, 0xFF, 0xFF) },
];

/// Look up a swatch by its id.
pub fn swatch(id: u8) -> Option<&'static Swatch> {
    PALETTE.iter().find(|swatch| swatch.id == id)
}
