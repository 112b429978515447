//! Surface format descriptors
//!
//! A [`PixelFormat`] says how many bytes one pixel occupies and where each
//! color channel sits inside the packed pixel value. Packed values are read
//! from and written to memory in platform byte order, so the RGBA8888 layout
//! the image codec produces (bytes R, G, B, A) has endian-dependent masks.

use crate::color::Color;
use crate::error::{PixmapError, Result};

/// Bit position and width of one channel inside a packed pixel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Channel {
    pub shift: u8,
    pub bits: u8,
}

impl Channel {
    pub const NONE: Channel = Channel { shift: 0, bits: 0 };

    pub const fn new(shift: u8, bits: u8) -> Self {
        Self { shift, bits }
    }

    #[inline]
    pub const fn mask(self) -> u32 {
        if self.bits == 0 {
            0
        } else {
            (u32::MAX >> (32 - self.bits as u32)) << self.shift
        }
    }

    #[inline]
    const fn max(self) -> u32 {
        (1u32 << self.bits) - 1
    }

    /// Expand the stored value to 8 bits, or `absent` if the channel is missing
    #[inline]
    fn unpack(self, packed: u32, absent: u8) -> u8 {
        match self.bits {
            0 => absent,
            8 => (packed >> self.shift) as u8,
            _ => {
                let v = (packed & self.mask()) >> self.shift;
                let max = self.max();
                ((v * 255 + max / 2) / max) as u8
            },
        }
    }

    /// Quantize an 8-bit value down to this channel's width
    #[inline]
    fn pack(self, value: u8) -> u32 {
        match self.bits {
            0 => 0,
            8 => (value as u32) << self.shift,
            _ => {
                let max = self.max();
                ((value as u32 * max + 127) / 255) << self.shift
            },
        }
    }

    /// Build from a contiguous bit mask
    fn from_mask(mask: u32) -> Option<Self> {
        if mask == 0 {
            return Some(Self::NONE);
        }
        let shift = mask.trailing_zeros();
        let bits = (mask >> shift).trailing_ones();
        if bits > 8 || (mask >> shift) >> bits != 0 {
            return None;
        }
        Some(Self::new(shift as u8, bits as u8))
    }
}

/// Layout of one pixel: byte width plus per-channel placement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PixelFormat {
    bytes_per_pixel: u8,
    r: Channel,
    g: Channel,
    b: Channel,
    a: Channel,
}

impl PixelFormat {
    /// Bytes R, G, B, A in memory order, whatever the platform endianness
    pub const fn rgba8888() -> Self {
        if cfg!(target_endian = "little") {
            Self::packed(4, (0, 8), (8, 8), (16, 8), (24, 8))
        } else {
            Self::packed(4, (24, 8), (16, 8), (8, 8), (0, 8))
        }
    }

    /// Packed 0xAARRGGBB
    pub const fn argb8888() -> Self {
        Self::packed(4, (16, 8), (8, 8), (0, 8), (24, 8))
    }

    /// Packed 0xRRGGBB in three bytes, no alpha
    pub const fn rgb888() -> Self {
        Self::packed(3, (16, 8), (8, 8), (0, 8), (0, 0))
    }

    /// Packed 0xBBGGRR in three bytes, no alpha
    pub const fn bgr888() -> Self {
        Self::packed(3, (0, 8), (8, 8), (16, 8), (0, 0))
    }

    pub const fn rgb565() -> Self {
        Self::packed(2, (11, 5), (5, 6), (0, 5), (0, 0))
    }

    pub const fn argb4444() -> Self {
        Self::packed(2, (8, 4), (4, 4), (0, 4), (12, 4))
    }

    pub const fn rgb332() -> Self {
        Self::packed(1, (5, 3), (2, 3), (0, 2), (0, 0))
    }

    const fn packed(
        bytes_per_pixel: u8,
        r: (u8, u8),
        g: (u8, u8),
        b: (u8, u8),
        a: (u8, u8),
    ) -> Self {
        Self {
            bytes_per_pixel,
            r: Channel::new(r.0, r.1),
            g: Channel::new(g.0, g.1),
            b: Channel::new(b.0, b.1),
            a: Channel::new(a.0, a.1),
        }
    }

    /// Describe a format from its channel masks.
    ///
    /// Masks must be contiguous, at most 8 bits wide, fit in
    /// `bytes_per_pixel` bytes, and not overlap.
    pub fn from_masks(bytes_per_pixel: u8, r: u32, g: u32, b: u32, a: u32) -> Result<Self> {
        if !(1..=4).contains(&bytes_per_pixel) {
            return Err(PixmapError::invalid(format!(
                "unsupported bytes per pixel: {}",
                bytes_per_pixel
            )));
        }
        let limit = if bytes_per_pixel == 4 {
            u32::MAX
        } else {
            (1u32 << (bytes_per_pixel as u32 * 8)) - 1
        };
        let masks = [r, g, b, a];
        let mut seen = 0u32;
        for &mask in &masks {
            if mask & !limit != 0 || mask & seen != 0 {
                return Err(PixmapError::invalid(format!(
                    "channel mask {:#010x} does not fit the pixel",
                    mask
                )));
            }
            seen |= mask;
        }
        let channel = |mask: u32| {
            Channel::from_mask(mask).ok_or_else(|| {
                PixmapError::invalid(format!("channel mask {:#010x} is not contiguous", mask))
            })
        };
        Ok(Self {
            bytes_per_pixel,
            r: channel(r)?,
            g: channel(g)?,
            b: channel(b)?,
            a: channel(a)?,
        })
    }

    #[inline]
    pub fn bytes_per_pixel(&self) -> usize {
        self.bytes_per_pixel as usize
    }

    pub fn channels(&self) -> [Channel; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// (r, g, b, a) masks
    pub fn masks(&self) -> (u32, u32, u32, u32) {
        (self.r.mask(), self.g.mask(), self.b.mask(), self.a.mask())
    }

    pub fn has_alpha(&self) -> bool {
        self.a.bits > 0
    }

    pub fn is_rgba8888(&self) -> bool {
        *self == Self::rgba8888()
    }

    /// Row pitch for `width` pixels, padded to a 4-byte boundary
    pub fn pitch(&self, width: u32) -> Option<usize> {
        let row = (width as usize).checked_mul(self.bytes_per_pixel())?;
        row.checked_add(3).map(|r| r & !3)
    }

    /// Read the packed value of the pixel starting at `bytes[0]`
    #[inline]
    pub fn read_packed(&self, bytes: &[u8]) -> u32 {
        match self.bytes_per_pixel {
            1 => bytes[0] as u32,
            2 => u16::from_ne_bytes([bytes[0], bytes[1]]) as u32,
            3 => {
                if cfg!(target_endian = "little") {
                    bytes[0] as u32 | (bytes[1] as u32) << 8 | (bytes[2] as u32) << 16
                } else {
                    (bytes[0] as u32) << 16 | (bytes[1] as u32) << 8 | bytes[2] as u32
                }
            },
            _ => u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]),
        }
    }

    /// Store a packed value into the pixel starting at `dest[0]`
    #[inline]
    pub fn write_packed(&self, dest: &mut [u8], packed: u32) {
        match self.bytes_per_pixel {
            1 => dest[0] = packed as u8,
            2 => dest[..2].copy_from_slice(&(packed as u16).to_ne_bytes()),
            3 => {
                let [b0, b1, b2] = if cfg!(target_endian = "little") {
                    [packed as u8, (packed >> 8) as u8, (packed >> 16) as u8]
                } else {
                    [(packed >> 16) as u8, (packed >> 8) as u8, packed as u8]
                };
                dest[0] = b0;
                dest[1] = b1;
                dest[2] = b2;
            },
            _ => dest[..4].copy_from_slice(&packed.to_ne_bytes()),
        }
    }

    /// Pack a color into this format. Missing channels are dropped.
    #[inline]
    pub fn encode(&self, color: Color) -> u32 {
        self.r.pack(color.r) | self.g.pack(color.g) | self.b.pack(color.b) | self.a.pack(color.a)
    }

    /// Unpack a packed value. A missing alpha channel reads as opaque.
    #[inline]
    pub fn decode(&self, packed: u32) -> Color {
        Color::new(
            self.r.unpack(packed, 0),
            self.g.unpack(packed, 0),
            self.b.unpack(packed, 0),
            self.a.unpack(packed, 255),
        )
    }

    #[inline]
    pub fn read_color(&self, bytes: &[u8]) -> Color {
        self.decode(self.read_packed(bytes))
    }

    #[inline]
    pub fn write_color(&self, dest: &mut [u8], color: Color) {
        self.write_packed(dest, self.encode(color));
    }
}

impl Default for PixelFormat {
    fn default() -> Self {
        Self::rgba8888()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba8888_memory_order_is_rgba() {
        let fmt = PixelFormat::rgba8888();
        let mut px = [0u8; 4];
        fmt.write_color(&mut px, Color::new(1, 2, 3, 4));
        assert_eq!(px, [1, 2, 3, 4]);
        assert_eq!(fmt.read_color(&px), Color::new(1, 2, 3, 4));
    }

    #[test]
    fn test_rgb565_quantizes_and_reads_opaque() {
        let fmt = PixelFormat::rgb565();
        let mut px = [0u8; 2];
        fmt.write_color(&mut px, Color::new(255, 255, 255, 0));
        assert_eq!(fmt.read_packed(&px), 0xffff);
        assert_eq!(fmt.read_color(&px), Color::WHITE);

        fmt.write_color(&mut px, Color::new(255, 0, 0, 255));
        assert_eq!(fmt.read_packed(&px), 0xf800);
    }

    #[test]
    fn test_three_byte_pixels_use_low_bytes() {
        let fmt = PixelFormat::rgb888();
        let mut px = [0xaa_u8; 4];
        fmt.write_color(&mut px, Color::rgb(0x11, 0x22, 0x33));
        assert_eq!(fmt.read_packed(&px), 0x112233);
        // the fourth byte belongs to the next pixel
        assert_eq!(px[3], 0xaa);
        assert_eq!(fmt.read_color(&px), Color::rgb(0x11, 0x22, 0x33));
    }

    #[test]
    fn test_rgb332_extremes() {
        let fmt = PixelFormat::rgb332();
        let mut px = [0u8; 1];
        fmt.write_color(&mut px, Color::rgb(255, 0, 255));
        assert_eq!(px[0], 0b1110_0011);
        assert_eq!(fmt.read_color(&px), Color::rgb(255, 0, 255));
    }

    #[test]
    fn test_from_masks_matches_builtin() {
        let fmt = PixelFormat::from_masks(2, 0xf800, 0x07e0, 0x001f, 0).unwrap();
        assert_eq!(fmt, PixelFormat::rgb565());
        assert_eq!(fmt.masks(), (0xf800, 0x07e0, 0x001f, 0));
        assert!(!fmt.has_alpha());
    }

    #[test]
    fn test_from_masks_rejects_bad_layouts() {
        // overlapping
        assert!(PixelFormat::from_masks(2, 0xff00, 0x0ff0, 0x000f, 0).is_err());
        // too wide for one byte
        assert!(PixelFormat::from_masks(1, 0x1e0, 0x1c, 0x3, 0).is_err());
        // not contiguous
        assert!(PixelFormat::from_masks(4, 0x00ff00ff, 0, 0, 0).is_err());
        assert!(PixelFormat::from_masks(5, 0, 0, 0, 0).is_err());
    }

    #[test]
    fn test_pitch_pads_to_four_bytes() {
        assert_eq!(PixelFormat::rgb888().pitch(3), Some(12));
        assert_eq!(PixelFormat::rgb888().pitch(4), Some(12));
        assert_eq!(PixelFormat::rgb332().pitch(5), Some(8));
        assert_eq!(PixelFormat::rgba8888().pitch(7), Some(28));
    }
}
