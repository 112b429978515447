//! Owned RGBA raster buffers.
//!
//! A [`Pixmap`] is either decoded from an image file or allocated blank, and
//! supports pixel reads and writes, clipped rectangle fills, raw blits and
//! nearest-neighbor scaled blits. Pixels are RGBA8888 by default; other
//! packed layouts are described by a [`PixelFormat`].
//!
//! ```no_run
//! use pixmap::{Color, Pixmap, Point, Rect};
//!
//! let tile = Pixmap::from_file("tile.png")?;
//! let mut canvas = Pixmap::blank(64, 64)?;
//! canvas
//!     .fill_rect(Rect::new(0, 0, 64, 64), Color::BLACK)?
//!     .blit(Point::new(8, 8), &tile, Rect::new(0, 0, 16, 16))?
//!     .scaled_blit(Rect::new(32, 32, 32, 32), &tile, tile.bounds()?)?;
//! assert_eq!(canvas.get_pixel(-1, 0)?, Color::SENTINEL);
//! # Ok::<(), pixmap::PixmapError>(())
//! ```

pub mod args;
pub mod color;
pub mod compose;
#[cfg(feature = "viewer")]
pub mod display;
pub mod error;
pub mod format;
pub mod geometry;
mod pixmap;

pub use args::Arg;
pub use color::Color;
pub use compose::{Composition, Layer};
pub use error::{PixmapError, Result};
pub use format::{Channel, PixelFormat};
pub use geometry::{Point, Rect};
pub use pixmap::Pixmap;
