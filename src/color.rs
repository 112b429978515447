//! RGBA color value type

use serde::{Deserialize, Serialize};

use crate::error::{PixmapError, Result};

/// Four 8-bit channels, straight (non-premultiplied) alpha
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    #[serde(default = "opaque")]
    pub a: u8,
}

fn opaque() -> u8 {
    255
}

impl Color {
    /// Returned for reads and writes outside the pixmap bounds
    pub const SENTINEL: Color = Color::new(0, 0, 0, 255);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0);
    pub const BLACK: Color = Color::new(0, 0, 0, 255);
    pub const WHITE: Color = Color::new(255, 255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from three channels
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self::new(r, g, b, 255)
    }

    /// Build from raw integers, rejecting anything outside 0..=255
    pub fn from_ints(r: i64, g: i64, b: i64, a: i64) -> Result<Self> {
        let channel = |name: &str, v: i64| {
            u8::try_from(v).map_err(|_| {
                PixmapError::invalid(format!("color channel {} out of range: {}", name, v))
            })
        };
        Ok(Self::new(
            channel("r", r)?,
            channel("g", g)?,
            channel("b", b)?,
            channel("a", a)?,
        ))
    }

    #[inline]
    pub const fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl From<[u8; 4]> for Color {
    fn from([r, g, b, a]: [u8; 4]) -> Self {
        Self::new(r, g, b, a)
    }
}

impl From<Color> for [u8; 4] {
    fn from(c: Color) -> Self {
        c.to_array()
    }
}

impl TryFrom<&[i64]> for Color {
    type Error = PixmapError;

    /// Exactly four channels are required
    fn try_from(channels: &[i64]) -> Result<Self> {
        match *channels {
            [r, g, b, a] => Self::from_ints(r, g, b, a),
            _ => Err(PixmapError::invalid(format!(
                "expecting a color with 4 channels, got {}",
                channels.len()
            ))),
        }
    }
}
