use crate::app::Rgb;
use crate::content::ImageData;

use super::transform::SpriteTransform;

/// Source rectangle inside an image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl SourceRect {
    pub fn whole(image: &ImageData) -> Self {
        Self {
            x: 0,
            y: 0,
            width: image.width(),
            height: image.height(),
        }
    }
}

/// Software RGBA8 target at base resolution. Every write is clipped, so
/// callers pass unclamped coordinates freely.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize * 4],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let offset = self.offset(x as i32, y as i32)?;
        let mut rgba = [0; 4];
        rgba.copy_from_slice(&self.pixels[offset..offset + 4]);
        Some(rgba)
    }

    pub fn clear(&mut self, color: Rgb) {
        for pixel in self.pixels.chunks_exact_mut(4) {
            pixel.copy_from_slice(&[color.r, color.g, color.b, 255]);
        }
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i32 || y >= self.height as i32 {
            return None;
        }
        Some((y as usize * self.width as usize + x as usize) * 4)
    }

    /// Source-over blend; the colour's own alpha is multiplied by `opacity`.
    pub fn blend_pixel(&mut self, x: i32, y: i32, color: [u8; 4], opacity: f32) {
        let Some(offset) = self.offset(x, y) else {
            return;
        };
        let alpha = (f32::from(color[3]) / 255.0) * opacity.clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let target = &mut self.pixels[offset..offset + 4];
        for channel in 0..3 {
            let source = f32::from(color[channel]);
            let dest = f32::from(target[channel]);
            target[channel] = (source * alpha + dest * (1.0 - alpha)).round() as u8;
        }
        target[3] = 255;
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: [u8; 4], opacity: f32) {
        let start_x = x.max(0);
        let start_y = y.max(0);
        let end_x = x.saturating_add(width).min(self.width as i32);
        let end_y = y.saturating_add(height).min(self.height as i32);
        for py in start_y..end_y {
            for px in start_x..end_x {
                self.blend_pixel(px, py, color, opacity);
            }
        }
    }

    pub fn outline_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: [u8; 4]) {
        if width <= 0 || height <= 0 {
            return;
        }
        self.fill_rect(x, y, width, 1, color, 1.0);
        self.fill_rect(x, y + height - 1, width, 1, color, 1.0);
        self.fill_rect(x, y, 1, height, color, 1.0);
        self.fill_rect(x + width - 1, y, 1, height, color, 1.0);
    }

    /// Midpoint circle outline.
    pub fn outline_circle(&mut self, center_x: i32, center_y: i32, radius: i32, color: [u8; 4]) {
        if radius <= 0 {
            self.blend_pixel(center_x, center_y, color, 1.0);
            return;
        }
        let (mut x, mut y, mut error) = (radius, 0, 1 - radius);
        while x >= y {
            for (dx, dy) in [(x, y), (y, x), (-y, x), (-x, y), (-x, -y), (-y, -x), (y, -x), (x, -y)] {
                self.blend_pixel(center_x + dx, center_y + dy, color, 1.0);
            }
            y += 1;
            if error < 0 {
                error += 2 * y + 1;
            } else {
                x -= 1;
                error += 2 * (y - x) + 1;
            }
        }
    }

    pub fn cross(&mut self, x: i32, y: i32, arm: i32, color: [u8; 4]) {
        for delta in -arm..=arm {
            self.blend_pixel(x + delta, y, color, 1.0);
            self.blend_pixel(x, y + delta, color, 1.0);
        }
    }

    /// Draws `source` of `image` through `transform`. Each covered screen
    /// pixel samples its centre back into the source, which handles scale,
    /// flips and rotation in one pass.
    pub fn draw_image(
        &mut self,
        image: &ImageData,
        source: SourceRect,
        transform: &SpriteTransform,
        opacity: f32,
    ) {
        if opacity <= 0.0 || source.width == 0 || source.height == 0 {
            return;
        }
        let (min_x, min_y, max_x, max_y) =
            transform.bounds(source.width as f32, source.height as f32);
        let start_x = (min_x.floor() as i32).max(0);
        let start_y = (min_y.floor() as i32).max(0);
        let end_x = (max_x.ceil() as i32).min(self.width as i32);
        let end_y = (max_y.ceil() as i32).min(self.height as i32);

        for py in start_y..end_y {
            for px in start_x..end_x {
                let Some((local_x, local_y)) = transform.inverse(px as f32 + 0.5, py as f32 + 0.5)
                else {
                    return;
                };
                if local_x < 0.0
                    || local_y < 0.0
                    || local_x >= source.width as f32
                    || local_y >= source.height as f32
                {
                    continue;
                }
                let sample_x = source.x + local_x.floor() as u32;
                let sample_y = source.y + local_y.floor() as u32;
                if let Some(color) = image.pixel(sample_x, sample_y) {
                    self.blend_pixel(px, py, color, opacity);
                }
            }
        }
    }

    /// Fills the destination box with `image`, stretched or repeated.
    pub fn draw_backdrop(
        &mut self,
        image: &ImageData,
        (x, y, width, height): (f32, f32, f32, f32),
        mosaic: bool,
        opacity: f32,
    ) {
        if image.width() == 0 || image.height() == 0 || width <= 0.0 || height <= 0.0 {
            return;
        }
        let start_x = (x.floor() as i32).max(0);
        let start_y = (y.floor() as i32).max(0);
        let end_x = ((x + width).ceil() as i32).min(self.width as i32);
        let end_y = ((y + height).ceil() as i32).min(self.height as i32);
        let (image_w, image_h) = (image.width() as f32, image.height() as f32);

        for py in start_y..end_y {
            let local_y = py as f32 + 0.5 - y;
            if local_y < 0.0 || local_y >= height {
                continue;
            }
            let sample_y = if mosaic {
                local_y.rem_euclid(image_h)
            } else {
                local_y * image_h / height
            };
            for px in start_x..end_x {
                let local_x = px as f32 + 0.5 - x;
                if local_x < 0.0 || local_x >= width {
                    continue;
                }
                let sample_x = if mosaic {
                    local_x.rem_euclid(image_w)
                } else {
                    local_x * image_w / width
                };
                if let Some(color) = image.pixel(sample_x as u32, sample_y as u32) {
                    self.blend_pixel(px, py, color, opacity);
                }
            }
        }
    }
}
