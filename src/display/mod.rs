//! SDL2 window that presents pixmaps
//!
//! The pixmap is uploaded to a streaming texture every frame and stretched to
//! the window.

use log::{debug, info};
use sdl2::event::Event;
use sdl2::keyboard::Keycode;
use sdl2::pixels::PixelFormatEnum;
use sdl2::render::{Canvas, Texture, TextureCreator};
use sdl2::video::{Window, WindowContext};
use sdl2::EventPump;

use crate::error::{PixmapError, Result};
use crate::format::PixelFormat;
use crate::pixmap::Pixmap;

fn sdl_err(e: impl ToString) -> PixmapError {
    PixmapError::Display(e.to_string())
}

impl PixelFormat {
    /// Describe an SDL pixel format by querying its masks
    pub fn from_sdl(format: PixelFormatEnum) -> Result<Self> {
        let masks = format.into_masks().map_err(PixmapError::InvalidArgument)?;
        let bytes = u8::try_from(format.byte_size_per_pixel())
            .map_err(|_| PixmapError::invalid(format!("{:?} is too wide", format)))?;
        PixelFormat::from_masks(bytes, masks.rmask, masks.gmask, masks.bmask, masks.amask)
    }
}

pub struct Display {
    canvas: Canvas<Window>,
    event_pump: EventPump,
    width: u32,
    height: u32,
}

pub struct RenderTarget<'a> {
    texture: Texture<'a>,
    width: u32,
    height: u32,
}

#[derive(Debug, Clone)]
pub enum InputEvent {
    Quit,
    KeyDown(Keycode),
}

impl Display {
    /// Create display with custom resolution and VSync settings
    pub fn with_options(
        title: &str,
        width: u32,
        height: u32,
        vsync: bool,
    ) -> Result<(Self, TextureCreator<WindowContext>)> {
        let sdl_context = sdl2::init().map_err(sdl_err)?;
        let video_subsystem = sdl_context.video().map_err(sdl_err)?;

        let window = video_subsystem
            .window(title, width, height)
            .position_centered()
            .resizable()
            .build()
            .map_err(sdl_err)?;

        let mut canvas_builder = window.into_canvas().accelerated();
        if vsync {
            canvas_builder = canvas_builder.present_vsync();
        }
        let canvas = canvas_builder.build().map_err(sdl_err)?;

        let texture_creator = canvas.texture_creator();
        let event_pump = sdl_context.event_pump().map_err(sdl_err)?;
        debug!("opened {}x{} window '{}'", width, height, title);

        Ok((
            Self {
                canvas,
                event_pump,
                width,
                height,
            },
            texture_creator,
        ))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Upload `pixmap` and show it. Sizes must match the target.
    pub fn present(&mut self, target: &mut RenderTarget, pixmap: &Pixmap) -> Result<()> {
        let (w, h) = pixmap.size()?;
        if (w, h) != (target.width, target.height) {
            return Err(PixmapError::invalid(format!(
                "pixmap {}x{} does not fit render target {}x{}",
                w, h, target.width, target.height
            )));
        }

        let rgba = pixmap.to_rgba8()?;
        target
            .texture
            .update(None, &rgba, w as usize * 4)
            .map_err(sdl_err)?;

        self.canvas.clear();
        self.canvas.copy(&target.texture, None, None).map_err(sdl_err)?;
        self.canvas.present();
        Ok(())
    }

    pub fn poll_events(&mut self) -> Vec<InputEvent> {
        let mut events = Vec::new();

        for event in self.event_pump.poll_iter() {
            match event {
                Event::Quit { .. } => events.push(InputEvent::Quit),
                Event::KeyDown {
                    keycode: Some(k), ..
                } => events.push(InputEvent::KeyDown(k)),
                _ => {},
            }
        }

        events
    }
}

impl<'a> RenderTarget<'a> {
    /// Streaming RGBA texture sized for a `width` x `height` pixmap
    pub fn with_size(
        texture_creator: &'a TextureCreator<WindowContext>,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let texture = texture_creator
            .create_texture_streaming(PixelFormatEnum::RGBA32, width, height)
            .map_err(sdl_err)?;
        Ok(Self {
            texture,
            width,
            height,
        })
    }
}

/// Show a pixmap until the window is closed or Escape is pressed
pub fn view(title: &str, pixmap: &Pixmap) -> Result<()> {
    let (width, height) = pixmap.size()?;
    let (mut display, texture_creator) = Display::with_options(title, width, height, true)?;
    let mut target = RenderTarget::with_size(&texture_creator, width, height)?;
    info!("viewing {}x{} pixmap, press Escape to close", width, height);

    'main: loop {
        for event in display.poll_events() {
            match event {
                InputEvent::Quit | InputEvent::KeyDown(Keycode::Escape) => break 'main,
                InputEvent::KeyDown(_) => {},
            }
        }
        display.present(&mut target, pixmap)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sdl_formats_map_to_descriptors() {
        assert_eq!(
            PixelFormat::from_sdl(PixelFormatEnum::RGB565).unwrap(),
            PixelFormat::rgb565()
        );
        assert_eq!(
            PixelFormat::from_sdl(PixelFormatEnum::RGBA32).unwrap(),
            PixelFormat::rgba8888()
        );
        assert_eq!(
            PixelFormat::from_sdl(PixelFormatEnum::ARGB8888).unwrap(),
            PixelFormat::argb8888()
        );
    }
}
