use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use image::{DynamicImage, ImageError, ImageReader, RgbaImage};
use log::{debug, trace};

use crate::color::Color;
use crate::error::{PixmapError, Result};
use crate::format::PixelFormat;
use crate::geometry::{Point, Rect};

// ============================================================================
// Allocation
// ============================================================================

/// Validate requested dimensions. Rect coordinates are i32, so larger
/// surfaces could never be fully addressed.
fn checked_dimensions(width: i64, height: i64) -> Result<(u32, u32)> {
    if width < 1 || height < 1 {
        return Err(PixmapError::invalid("Pixmap size must be at least 1"));
    }
    if width > i32::MAX as i64 || height > i32::MAX as i64 {
        return Err(PixmapError::invalid(format!(
            "Pixmap size {}x{} exceeds the addressable range",
            width, height
        )));
    }
    Ok((width as u32, height as u32))
}

/// Allocate a zeroed buffer, reporting failure instead of aborting
fn alloc_zeroed(len: usize) -> Result<Vec<u8>> {
    let mut pixels = Vec::new();
    pixels
        .try_reserve_exact(len)
        .map_err(|_| PixmapError::OutOfMemory { bytes: len as u128 })?;
    pixels.resize(len, 0);
    Ok(pixels)
}

// ============================================================================
// Copy clipping
// ============================================================================

/// A rectangular copy clipped against both the source and destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct CopySpan {
    src_x: usize,
    src_y: usize,
    dst_x: usize,
    dst_y: usize,
    w: usize,
    h: usize,
}

/// Clip copying `src` (in a `src_size` surface) to `dst` (in a `dst_size`
/// surface). Every step keeps `dst - src` constant so pixels stay paired.
fn clip_copy(
    src: Rect,
    src_size: (u32, u32),
    dst: Point,
    dst_size: (u32, u32),
) -> Option<CopySpan> {
    let (mut sx, mut sy) = (src.x as i64, src.y as i64);
    let (mut w, mut h) = (src.w as i64, src.h as i64);
    let (mut dx, mut dy) = (dst.x as i64, dst.y as i64);

    if sx < 0 {
        dx -= sx;
        w += sx;
        sx = 0;
    }
    if sy < 0 {
        dy -= sy;
        h += sy;
        sy = 0;
    }
    if dx < 0 {
        sx -= dx;
        w += dx;
        dx = 0;
    }
    if dy < 0 {
        sy -= dy;
        h += dy;
        dy = 0;
    }
    w = w.min(src_size.0 as i64 - sx).min(dst_size.0 as i64 - dx);
    h = h.min(src_size.1 as i64 - sy).min(dst_size.1 as i64 - dy);
    if w <= 0 || h <= 0 {
        return None;
    }

    Some(CopySpan {
        src_x: sx as usize,
        src_y: sy as usize,
        dst_x: dx as usize,
        dst_y: dy as usize,
        w: w as usize,
        h: h as usize,
    })
}

/// Nearest source index for destination step `t` of `dst_len`, sampling
/// at pixel centers: floor((t + 0.5) * src_len / dst_len)
#[inline]
fn nearest(t: i64, src_len: i64, dst_len: i64) -> i64 {
    ((2 * t + 1) * src_len) / (2 * dst_len)
}

// ============================================================================
// Pixmap
// ============================================================================

/// An owned raster buffer.
///
/// The buffer lives until [`Pixmap::dispose`] releases it early or the
/// Pixmap is dropped. Every operation except [`Pixmap::is_disposed`] fails
/// with [`PixmapError::Disposed`] once the buffer is gone.
#[derive(Clone)]
pub struct Pixmap {
    width: u32,
    height: u32,
    format: PixelFormat,
    pitch: usize,
    pixels: Option<Vec<u8>>,
}

impl Pixmap {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Create a zero-filled RGBA8888 pixmap
    pub fn blank(width: i64, height: i64) -> Result<Self> {
        Self::blank_with_format(width, height, PixelFormat::rgba8888())
    }

    /// Create a zero-filled pixmap in an arbitrary surface format
    pub fn blank_with_format(width: i64, height: i64, format: PixelFormat) -> Result<Self> {
        let (width, height) = checked_dimensions(width, height)?;
        let overflow = || PixmapError::OutOfMemory {
            bytes: width as u128 * format.bytes_per_pixel() as u128 * height as u128,
        };
        let pitch = format.pitch(width).ok_or_else(overflow)?;
        let len = pitch.checked_mul(height as usize).ok_or_else(overflow)?;
        let pixels = alloc_zeroed(len)?;

        debug!(
            "created blank pixmap {}x{} ({} bytes/pixel, pitch {})",
            width,
            height,
            format.bytes_per_pixel(),
            pitch
        );
        Ok(Self {
            width,
            height,
            format,
            pitch,
            pixels: Some(pixels),
        })
    }

    /// Adopt raw RGBA8888 bytes (R, G, B, A per pixel, rows packed)
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self> {
        let (width, height) = checked_dimensions(width as i64, height as i64)?;
        let expected = width as u128 * height as u128 * 4;
        if data.len() as u128 != expected {
            return Err(PixmapError::invalid(format!(
                "expected {} bytes of RGBA data for {}x{}, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            format: PixelFormat::rgba8888(),
            pitch: width as usize * 4,
            pixels: Some(data),
        })
    }

    /// Decode an image file. The codec always expands to four channels.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let reader = ImageReader::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PixmapError::NotFound(path.to_path_buf()),
            _ => PixmapError::Io(e),
        })?;
        let img = reader
            .with_guessed_format()?
            .decode()
            .map_err(|e| match e {
                ImageError::IoError(io) if io.kind() == ErrorKind::NotFound => {
                    PixmapError::NotFound(path.to_path_buf())
                },
                other => PixmapError::Decode(format!("{}: {}", path.display(), other)),
            })?;

        let pixmap = Self::from_image(img)?;
        debug!(
            "loaded pixmap {}x{} from {}",
            pixmap.width,
            pixmap.height,
            path.display()
        );
        Ok(pixmap)
    }

    /// Decode an encoded image already held in memory
    pub fn from_memory(bytes: &[u8]) -> Result<Self> {
        let img =
            image::load_from_memory(bytes).map_err(|e| PixmapError::Decode(e.to_string()))?;
        Self::from_image(img)
    }

    fn from_image(img: DynamicImage) -> Result<Self> {
        let rgba = img.into_rgba8();
        let (width, height) = rgba.dimensions();
        Self::from_rgba(width, height, rgba.into_raw())
            .map_err(|e| PixmapError::Decode(e.to_string()))
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Release the buffer now. Disposing twice is an error.
    pub fn dispose(&mut self) -> Result<()> {
        match self.pixels.take() {
            Some(_) => {
                debug!("disposed pixmap {}x{}", self.width, self.height);
                Ok(())
            },
            None => Err(PixmapError::AlreadyDisposed),
        }
    }

    #[inline]
    pub fn is_disposed(&self) -> bool {
        self.pixels.is_none()
    }

    #[inline]
    fn buffer(&self) -> Result<&[u8]> {
        self.pixels.as_deref().ok_or(PixmapError::Disposed)
    }

    // ========================================================================
    // Geometry queries
    // ========================================================================

    pub fn width(&self) -> Result<u32> {
        self.buffer()?;
        Ok(self.width)
    }

    pub fn height(&self) -> Result<u32> {
        self.buffer()?;
        Ok(self.height)
    }

    /// (width, height)
    pub fn size(&self) -> Result<(u32, u32)> {
        self.buffer()?;
        Ok((self.width, self.height))
    }

    pub fn format(&self) -> Result<PixelFormat> {
        self.buffer()?;
        Ok(self.format)
    }

    /// Bytes per row, including padding
    pub fn pitch(&self) -> Result<usize> {
        self.buffer()?;
        Ok(self.pitch)
    }

    pub fn bounds(&self) -> Result<Rect> {
        self.buffer()?;
        Ok(Rect::of_size(self.width, self.height))
    }

    /// Check if coordinates are within bounds
    #[inline]
    fn in_bounds(&self, x: i64, y: i64) -> bool {
        x >= 0 && x < self.width as i64 && y >= 0 && y < self.height as i64
    }

    /// Byte offset of pixel (x, y). `x` wraps within its row, so an
    /// unchecked column can never spill into the next row.
    #[inline]
    fn pixel_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.pitch + (x % self.width) as usize * self.format.bytes_per_pixel()
    }

    // ========================================================================
    // Pixel access
    // ========================================================================

    /// Read a pixel. Coordinates outside the pixmap read as opaque black.
    pub fn get_pixel(&self, x: i64, y: i64) -> Result<Color> {
        let pixels = self.buffer()?;
        if !self.in_bounds(x, y) {
            return Ok(Color::SENTINEL);
        }
        let idx = self.pixel_index(x as u32, y as u32);
        let bpp = self.format.bytes_per_pixel();
        Ok(self.format.read_color(&pixels[idx..idx + bpp]))
    }

    /// Write a pixel and return the color as stored.
    ///
    /// Coordinates outside the pixmap write nothing and return opaque black.
    /// Formats narrower than 8 bits per channel return the quantized color.
    pub fn set_pixel(&mut self, x: i64, y: i64, color: Color) -> Result<Color> {
        self.buffer()?;
        if !self.in_bounds(x, y) {
            return Ok(Color::SENTINEL);
        }
        let idx = self.pixel_index(x as u32, y as u32);
        let format = self.format;
        let bpp = format.bytes_per_pixel();
        let pixels = self.pixels.as_deref_mut().ok_or(PixmapError::Disposed)?;

        let packed = format.encode(color);
        format.write_packed(&mut pixels[idx..idx + bpp], packed);
        Ok(format.decode(packed))
    }

    // ========================================================================
    // Region operations
    // ========================================================================

    /// Fill a rectangle, clipped to the pixmap
    pub fn fill_rect(&mut self, rect: Rect, color: Color) -> Result<&mut Self> {
        self.buffer()?;
        let Some(clip) = rect.clip_to(self.width, self.height) else {
            trace!("fill_rect {:?} lies outside {}x{}", rect, self.width, self.height);
            return Ok(self);
        };

        let format = self.format;
        let bpp = format.bytes_per_pixel();
        let pitch = self.pitch;
        let mut pattern = [0u8; 4];
        format.write_color(&mut pattern, color);
        let pattern = &pattern[..bpp];

        let pixels = self.pixels.as_deref_mut().ok_or(PixmapError::Disposed)?;
        let row_bytes = clip.w as usize * bpp;
        // Compute each row start once, then step a pixel at a time
        for row in clip.y as usize..(clip.y + clip.h) as usize {
            let start = row * pitch + clip.x as usize * bpp;
            for px in pixels[start..start + row_bytes].chunks_exact_mut(bpp) {
                px.copy_from_slice(pattern);
            }
        }
        Ok(self)
    }

    /// Fill the whole pixmap
    pub fn clear(&mut self, color: Color) -> Result<&mut Self> {
        let bounds = self.bounds()?;
        self.fill_rect(bounds, color)
    }

    /// Copy `source_rect` of `source` to `origin`, one raw row at a time.
    ///
    /// No conversion or blending happens, so both pixmaps must share a
    /// format. The copy is clipped to both pixmaps.
    pub fn blit(
        &mut self,
        origin: Point,
        source: &Pixmap,
        source_rect: Rect,
    ) -> Result<&mut Self> {
        self.buffer()?;
        let src_pixels = source.buffer()?;
        self.check_same_format(source)?;

        let Some(span) = clip_copy(
            source_rect,
            (source.width, source.height),
            origin,
            (self.width, self.height),
        ) else {
            trace!("blit of {:?} to {:?} clipped away", source_rect, origin);
            return Ok(self);
        };

        let bpp = self.format.bytes_per_pixel();
        let dst_pitch = self.pitch;
        let row_bytes = span.w * bpp;
        let dst_pixels = self.pixels.as_deref_mut().ok_or(PixmapError::Disposed)?;

        for row in 0..span.h {
            let src_start = (span.src_y + row) * source.pitch + span.src_x * bpp;
            let dst_start = (span.dst_y + row) * dst_pitch + span.dst_x * bpp;
            dst_pixels[dst_start..dst_start + row_bytes]
                .copy_from_slice(&src_pixels[src_start..src_start + row_bytes]);
        }
        Ok(self)
    }

    /// Copy `source_rect` of `source` into `dest_rect`, resampling with
    /// nearest-neighbor when the sizes differ. Clipped like [`Pixmap::blit`].
    pub fn scaled_blit(
        &mut self,
        dest_rect: Rect,
        source: &Pixmap,
        source_rect: Rect,
    ) -> Result<&mut Self> {
        self.buffer()?;
        let src_pixels = source.buffer()?;
        self.check_same_format(source)?;

        if dest_rect.is_empty() || source_rect.is_empty() {
            trace!("scaled_blit with empty rect: {:?} <- {:?}", dest_rect, source_rect);
            return Ok(self);
        }
        if dest_rect.w == source_rect.w && dest_rect.h == source_rect.h {
            return self.blit(dest_rect.origin(), source, source_rect);
        }
        let Some(clip) = dest_rect.clip_to(self.width, self.height) else {
            trace!(
                "scaled_blit target {:?} lies outside {}x{}",
                dest_rect,
                self.width,
                self.height
            );
            return Ok(self);
        };

        let bpp = self.format.bytes_per_pixel();
        let (src_w, src_h) = (source.width as i64, source.height as i64);

        // Source byte column for every destination column, None when the
        // sample falls outside the source pixmap
        let columns: Vec<Option<usize>> = (clip.x as i64..clip.right())
            .map(|x| {
                let t = x - dest_rect.x as i64;
                let sx =
                    source_rect.x as i64 + nearest(t, source_rect.w as i64, dest_rect.w as i64);
                (sx >= 0 && sx < src_w).then(|| sx as usize * bpp)
            })
            .collect();

        let dst_pitch = self.pitch;
        let dst_pixels = self.pixels.as_deref_mut().ok_or(PixmapError::Disposed)?;

        for y in clip.y as i64..clip.bottom() {
            let t = y - dest_rect.y as i64;
            let sy =
                source_rect.y as i64 + nearest(t, source_rect.h as i64, dest_rect.h as i64);
            if sy < 0 || sy >= src_h {
                continue;
            }
            let src_row = sy as usize * source.pitch;
            let mut dst = y as usize * dst_pitch + clip.x as usize * bpp;
            for col in &columns {
                if let Some(sx) = col {
                    let src = src_row + sx;
                    dst_pixels[dst..dst + bpp].copy_from_slice(&src_pixels[src..src + bpp]);
                }
                dst += bpp;
            }
        }
        Ok(self)
    }

    fn check_same_format(&self, source: &Pixmap) -> Result<()> {
        if self.format == source.format {
            Ok(())
        } else {
            Err(PixmapError::invalid(format!(
                "cannot copy between pixel formats {:?} and {:?}",
                source.format, self.format
            )))
        }
    }

    // ========================================================================
    // Raw access and export
    // ========================================================================

    /// Raw bytes, `pitch * height` long
    pub fn as_bytes(&self) -> Result<&[u8]> {
        self.buffer()
    }

    /// Mutable access to raw bytes
    pub fn as_bytes_mut(&mut self) -> Result<&mut [u8]> {
        self.pixels.as_deref_mut().ok_or(PixmapError::Disposed)
    }

    /// Tightly packed RGBA8888 copy of the pixels
    pub fn to_rgba8(&self) -> Result<Vec<u8>> {
        let pixels = self.buffer()?;
        if self.format.is_rgba8888() {
            return Ok(pixels.to_vec());
        }

        let bpp = self.format.bytes_per_pixel();
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 4);
        for row in pixels.chunks_exact(self.pitch) {
            for px in row[..self.width as usize * bpp].chunks_exact(bpp) {
                out.extend_from_slice(&self.format.read_color(px).to_array());
            }
        }
        Ok(out)
    }

    pub fn to_image(&self) -> Result<RgbaImage> {
        let rgba = self.to_rgba8()?;
        RgbaImage::from_raw(self.width, self.height, rgba)
            .ok_or_else(|| PixmapError::Encode("pixel buffer does not match its size".into()))
    }

    /// Encode to a file; the format follows the extension
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.to_image()?
            .save(path)
            .map_err(|e| PixmapError::Encode(format!("{}: {}", path.display(), e)))?;
        debug!("saved pixmap {}x{} to {}", self.width, self.height, path.display());
        Ok(())
    }
}

impl fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("format", &self.format)
            .field("pitch", &self.pitch)
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
