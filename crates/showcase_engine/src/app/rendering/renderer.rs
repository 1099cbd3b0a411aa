use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use crate::app::GeometrySnapshot;

use super::{letterbox_rect, Viewport};

const LETTERBOX_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Presents the letterboxed stage area. Scene content is drawn elsewhere.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    viewport: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(Arc::clone(&window), size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            viewport: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), width, height)?;
        self.viewport = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        width: u32,
        height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(width, height, window);
        Pixels::new(width, height, surface)
    }

    pub fn render_frame(
        &mut self,
        geometry: &GeometrySnapshot,
        background: [u8; 4],
    ) -> Result<(), Error> {
        if self.viewport.width == 0 || self.viewport.height == 0 {
            return Ok(());
        }

        let stage = letterbox_rect(self.viewport, geometry);
        let width = self.viewport.width as usize;
        let frame = self.pixels.frame_mut();
        for (index, pixel) in frame.chunks_exact_mut(4).enumerate() {
            let x = (index % width) as u32;
            let y = (index / width) as u32;
            let color = if stage.contains(x, y) {
                background
            } else {
                LETTERBOX_COLOR
            };
            pixel.copy_from_slice(&color);
        }

        self.pixels.render()
    }
}
