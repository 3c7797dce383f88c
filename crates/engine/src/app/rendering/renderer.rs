use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::canvas::Canvas;
use super::transform::Viewport;

/// Presents a base-resolution [`Canvas`] on the window. The pixel buffer
/// stays at base resolution and `pixels` scales it to the surface.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    base: Viewport,
    surface: Viewport,
}

impl Renderer {
    pub fn new(window: Arc<Window>, base_width: u32, base_height: u32) -> Result<Self, Error> {
        let size = window.inner_size();
        let base = Viewport {
            width: base_width.max(1),
            height: base_height.max(1),
        };
        let pixels = Self::build_pixels(Arc::clone(&window), base, size.width, size.height)?;
        Ok(Self {
            window,
            pixels,
            base,
            surface: Viewport {
                width: size.width,
                height: size.height,
            },
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(Arc::clone(&self.window), self.base, width, height)?;
        self.surface = Viewport { width, height };
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        base: Viewport,
        surface_width: u32,
        surface_height: u32,
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_width, surface_height, window);
        Pixels::new(base.width, base.height, surface)
    }

    pub fn base_viewport(&self) -> Viewport {
        self.base
    }

    pub fn surface_viewport(&self) -> Viewport {
        self.surface
    }

    /// Maps a physical window position to base-resolution pixels; `None`
    /// outside the scaled image.
    pub fn window_to_base(&self, x: f32, y: f32) -> Option<(f32, f32)> {
        self.pixels
            .window_pos_to_pixel((x, y))
            .ok()
            .map(|(px, py)| (px as f32, py as f32))
    }

    pub fn present(&mut self, canvas: &Canvas) -> Result<(), Error> {
        if self.surface.width == 0 || self.surface.height == 0 {
            return Ok(());
        }
        let frame = self.pixels.frame_mut();
        if frame.len() == canvas.pixels().len() {
            frame.copy_from_slice(canvas.pixels());
        }
        self.pixels.render()
    }
}
