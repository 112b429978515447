//! Dynamically typed call arguments
//!
//! Hosts that hand over loosely typed values (scripting bridges, command
//! lines, JSON) go through [`Arg`]. Constructor arity picks the mode: one
//! string loads a file, two integers allocate a blank pixmap.

use crate::color::Color;
use crate::error::{PixmapError, Result};
use crate::pixmap::Pixmap;

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Nil,
    Int(i64),
    Str(String),
    /// Raw channel list, validated on use
    List(Vec<i64>),
    Color(Color),
}

impl Arg {
    fn type_name(&self) -> &'static str {
        match self {
            Arg::Nil => "nil",
            Arg::Int(_) => "integer",
            Arg::Str(_) => "string",
            Arg::List(_) => "list",
            Arg::Color(_) => "color",
        }
    }

    pub fn as_int(&self) -> Result<i64> {
        match self {
            Arg::Int(v) => Ok(*v),
            other => Err(PixmapError::invalid(format!(
                "expecting an integer, got {}",
                other.type_name()
            ))),
        }
    }

    /// Accept a color value or a four-element channel list
    pub fn to_color(&self) -> Result<Color> {
        match self {
            Arg::Color(c) => Ok(*c),
            Arg::List(channels) => Color::try_from(channels.as_slice()),
            other => Err(PixmapError::invalid(format!(
                "expecting a color, got {}",
                other.type_name()
            ))),
        }
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Int(v)
    }
}

impl From<&str> for Arg {
    fn from(s: &str) -> Self {
        Arg::Str(s.to_owned())
    }
}

impl From<String> for Arg {
    fn from(s: String) -> Self {
        Arg::Str(s)
    }
}

impl From<Color> for Arg {
    fn from(c: Color) -> Self {
        Arg::Color(c)
    }
}

impl Pixmap {
    /// Construct from loosely typed arguments.
    ///
    /// * `[Str(path)]` decodes a file
    /// * `[Int(width), Int(height)]` allocates a blank pixmap
    pub fn from_args(args: &[Arg]) -> Result<Self> {
        match args {
            [Arg::Str(path)] => Self::from_file(path),
            [other] => Err(PixmapError::invalid(format!(
                "expecting a String, got {}",
                other.type_name()
            ))),
            [width, height] => Self::blank(width.as_int()?, height.as_int()?),
            _ => Err(PixmapError::invalid(format!(
                "wrong number of arguments ({} for 1..2)",
                args.len()
            ))),
        }
    }

    /// `set_pixel` with a loosely typed color argument
    pub fn set_pixel_arg(&mut self, x: i64, y: i64, color: &Arg) -> Result<Color> {
        // Disposal is reported before argument problems
        self.as_bytes()?;
        self.set_pixel(x, y, color.to_color()?)
    }
}
