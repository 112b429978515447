//! Composition documents
//!
//! A composition describes a canvas and an ordered list of layers drawn onto
//! it. Documents are JSON so they can be written by hand or by tools.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::{PixmapError, Result};
use crate::geometry::{Point, Rect};
use crate::pixmap::Pixmap;

/// One drawing step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Layer {
    Fill {
        rect: Rect,
        color: Color,
    },
    Pixel {
        x: i64,
        y: i64,
        color: Color,
    },
    /// Copy `source_rect` of an image file to `origin`; the whole image when unset
    Blit {
        source: PathBuf,
        origin: Point,
        #[serde(default)]
        source_rect: Option<Rect>,
    },
    ScaledBlit {
        source: PathBuf,
        dest: Rect,
        #[serde(default)]
        source_rect: Option<Rect>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Composition {
    pub width: u32,
    pub height: u32,
    /// Left transparent when unset
    #[serde(default)]
    pub background: Option<Color>,
    #[serde(default)]
    pub layers: Vec<Layer>,
}

impl Composition {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            background: None,
            layers: Vec::new(),
        }
    }

    pub fn push(&mut self, layer: Layer) -> &mut Self {
        self.layers.push(layer);
        self
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| PixmapError::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| PixmapError::Config(e.to_string()))
    }

    /// Load a composition from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PixmapError::NotFound(path.to_path_buf()),
            _ => PixmapError::Io(e),
        })?;
        Self::from_json(&json)
    }

    /// Save composition to a JSON file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Draw every layer in order. Relative source paths resolve against
    /// `base_dir`; each source file is decoded once.
    pub fn render(&self, base_dir: &Path) -> Result<Pixmap> {
        let mut canvas = Pixmap::blank(self.width as i64, self.height as i64)?;
        if let Some(bg) = self.background {
            canvas.clear(bg)?;
        }

        let mut sources: HashMap<PathBuf, Pixmap> = HashMap::new();
        for (i, layer) in self.layers.iter().enumerate() {
            debug!("layer {}: {:?}", i, layer);
            match layer {
                Layer::Fill { rect, color } => {
                    canvas.fill_rect(*rect, *color)?;
                },
                Layer::Pixel { x, y, color } => {
                    canvas.set_pixel(*x, *y, *color)?;
                },
                Layer::Blit {
                    source,
                    origin,
                    source_rect,
                } => {
                    let src = load_cached(&mut sources, base_dir, source)?;
                    let rect = source_rect.map_or_else(|| src.bounds(), Ok)?;
                    canvas.blit(*origin, src, rect)?;
                },
                Layer::ScaledBlit {
                    source,
                    dest,
                    source_rect,
                } => {
                    let src = load_cached(&mut sources, base_dir, source)?;
                    let rect = source_rect.map_or_else(|| src.bounds(), Ok)?;
                    canvas.scaled_blit(*dest, src, rect)?;
                },
            }
        }

        info!(
            "rendered {}x{} composition ({} layers, {} sources)",
            self.width,
            self.height,
            self.layers.len(),
            sources.len()
        );
        Ok(canvas)
    }
}

fn load_cached<'a>(
    cache: &'a mut HashMap<PathBuf, Pixmap>,
    base_dir: &Path,
    source: &Path,
) -> Result<&'a Pixmap> {
    let path = base_dir.join(source);
    if !cache.contains_key(&path) {
        let pixmap = Pixmap::from_file(&path)?;
        cache.insert(path.clone(), pixmap);
    }
    cache
        .get(&path)
        .ok_or_else(|| PixmapError::Config(format!("source {} vanished", path.display())))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
        "width": 4,
        "height": 3,
        "background": {"r": 0, "g": 0, "b": 0, "a": 255},
        "layers": [
            {"op": "fill", "rect": {"x": 1, "y": 1, "w": 10, "h": 10}, "color": {"r": 255, "g": 0, "b": 0}},
            {"op": "pixel", "x": 0, "y": 2, "color": {"r": 1, "g": 2, "b": 3, "a": 4}},
            {"op": "scaled_blit", "source": "tile.png", "dest": {"x": 0, "y": 0, "w": 2, "h": 2}}
        ]
    }"#;

    #[test]
    fn test_parse_document() {
        let doc = Composition::from_json(DOC).unwrap();
        assert_eq!(doc.width, 4);
        assert_eq!(doc.layers.len(), 3);
        assert_eq!(
            doc.layers[2],
            Layer::ScaledBlit {
                source: PathBuf::from("tile.png"),
                dest: Rect::new(0, 0, 2, 2),
                source_rect: None,
            }
        );
    }

    #[test]
    fn test_json_round_trip() {
        let mut doc = Composition::new(8, 8);
        doc.push(Layer::Fill {
            rect: Rect::new(0, 0, 2, 2),
            color: Color::WHITE,
        });
        let again = Composition::from_json(&doc.to_json().unwrap()).unwrap();
        assert_eq!(again, doc);
    }

    #[test]
    fn test_unknown_op_is_config_error() {
        let err = Composition::from_json(r#"{"width":1,"height":1,"layers":[{"op":"spin"}]}"#);
        assert!(matches!(err, Err(PixmapError::Config(_))));
    }

    #[test_log::test]
    fn test_render_fill_and_pixel() {
        let mut doc = Composition::new(3, 2);
        doc.background = Some(Color::BLACK);
        doc.push(Layer::Fill {
            rect: Rect::new(2, -1, 5, 5),
            color: Color::rgb(0, 0, 255),
        })
        .push(Layer::Pixel {
            x: 0,
            y: 1,
            color: Color::new(5, 6, 7, 8),
        });

        let p = doc.render(Path::new(".")).unwrap();
        assert_eq!(p.get_pixel(0, 0).unwrap(), Color::BLACK);
        assert_eq!(p.get_pixel(2, 0).unwrap(), Color::rgb(0, 0, 255));
        assert_eq!(p.get_pixel(2, 1).unwrap(), Color::rgb(0, 0, 255));
        assert_eq!(p.get_pixel(0, 1).unwrap(), Color::new(5, 6, 7, 8));
    }

    #[test]
    fn test_render_missing_source_fails() {
        let doc = Composition::from_json(DOC).unwrap();
        let dir = Path::new("no-such-dir");
        assert!(matches!(doc.render(dir), Err(PixmapError::NotFound(_))));
    }
}
