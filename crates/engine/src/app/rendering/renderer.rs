use std::path::PathBuf;
use std::sync::Arc;

use pixels::{Error, Pixels, SurfaceTexture};
use winit::window::Window;

use super::sprites::{LoadedSprite, SpriteCache};
use super::{Drawable, Surface};
use crate::app::registry::EntityRegistry;
use crate::geometry::Point;

const CLEAR_COLOR: [u8; 4] = [0, 0, 0, 255];

/// Presents the registry into a fixed-size framebuffer that `pixels` scales to
/// the window.
pub struct Renderer {
    window: Arc<Window>,
    pixels: Pixels<'static>,
    buffer_width: u32,
    buffer_height: u32,
    sprites: SpriteCache,
}

impl Renderer {
    pub fn new(
        window: Arc<Window>,
        buffer_width: u32,
        buffer_height: u32,
        sprite_dir: PathBuf,
    ) -> Result<Self, Error> {
        let size = window.inner_size();
        let pixels = Self::build_pixels(
            Arc::clone(&window),
            (size.width, size.height),
            (buffer_width, buffer_height),
        )?;
        Ok(Self {
            window,
            pixels,
            buffer_width,
            buffer_height,
            sprites: SpriteCache::new(sprite_dir),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), Error> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels = Self::build_pixels(
            Arc::clone(&self.window),
            (width, height),
            (self.buffer_width, self.buffer_height),
        )?;
        Ok(())
    }

    fn build_pixels(
        window: Arc<Window>,
        surface_size: (u32, u32),
        buffer_size: (u32, u32),
    ) -> Result<Pixels<'static>, Error> {
        let surface = SurfaceTexture::new(surface_size.0, surface_size.1, window);
        Pixels::new(buffer_size.0, buffer_size.1, surface)
    }

    pub(crate) fn render_registry(&mut self, registry: &mut EntityRegistry) -> Result<(), Error> {
        let frame = self.pixels.frame_mut();
        for chunk in frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&CLEAR_COLOR);
        }
        let mut surface = FrameSurface {
            frame,
            width: self.buffer_width,
            height: self.buffer_height,
            sprites: &mut self.sprites,
        };
        registry.render(&mut surface);
        self.pixels.render()
    }
}

pub(crate) struct FrameSurface<'a> {
    pub(crate) frame: &'a mut [u8],
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) sprites: &'a mut SpriteCache,
}

impl Surface for FrameSurface<'_> {
    fn blit(&mut self, drawable: &Drawable, position: Point, size: i32) {
        match *drawable {
            Drawable::Sprite { key, fallback } => {
                if let Some(sprite) = self.sprites.resolve(key) {
                    draw_sprite(self.frame, self.width, self.height, sprite, position);
                } else {
                    fill_square(self.frame, self.width, self.height, position, size, fallback);
                }
            }
            Drawable::Solid(color) => {
                fill_square(self.frame, self.width, self.height, position, size, color);
            }
        }
    }
}

fn draw_sprite(frame: &mut [u8], width: u32, height: u32, sprite: &LoadedSprite, origin: Point) {
    for sy in 0..sprite.height {
        for sx in 0..sprite.width {
            let src = ((sy * sprite.width + sx) * 4) as usize;
            let pixel = &sprite.rgba[src..src + 4];
            if pixel[3] == 0 {
                continue;
            }
            write_pixel_rgba_clipped(
                frame,
                width,
                height,
                origin.x + sx as i32,
                origin.y + sy as i32,
                [pixel[0], pixel[1], pixel[2], 255],
            );
        }
    }
}

/// Fills `[x, x + size] × [y, y + size]`, matching the inclusive body bounds.
fn fill_square(frame: &mut [u8], width: u32, height: u32, origin: Point, size: i32, color: [u8; 4]) {
    for y in origin.y..=origin.y + size.max(0) {
        for x in origin.x..=origin.x + size.max(0) {
            write_pixel_rgba_clipped(frame, width, height, x, y, color);
        }
    }
}

fn write_pixel_rgba_clipped(
    frame: &mut [u8],
    width: u32,
    height: u32,
    x: i32,
    y: i32,
    color: [u8; 4],
) {
    if x < 0 || y < 0 || x >= width as i32 || y >= height as i32 {
        return;
    }
    let idx = (y as usize * width as usize + x as usize) * 4;
    if let Some(dst) = frame.get_mut(idx..idx + 4) {
        dst.copy_from_slice(&color);
    }
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;
    use crate::app::rendering::SpriteKey;

    fn pixel(frame: &[u8], width: u32, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * width + x) * 4) as usize;
        [frame[idx], frame[idx + 1], frame[idx + 2], frame[idx + 3]]
    }

    #[test]
    fn solid_fill_is_clipped_to_frame() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut sprites = SpriteCache::new(PathBuf::from("does-not-exist"));
        let mut surface = FrameSurface {
            frame: &mut frame,
            width: 4,
            height: 4,
            sprites: &mut sprites,
        };
        surface.blit(&Drawable::Solid([9, 9, 9, 255]), Point::new(-2, 2), 3);

        assert_eq!(pixel(&frame, 4, 0, 2), [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 4, 1, 3), [9, 9, 9, 255]);
        assert_eq!(pixel(&frame, 4, 2, 2), [0, 0, 0, 0]);
        assert_eq!(pixel(&frame, 4, 0, 1), [0, 0, 0, 0]);
    }

    #[test]
    fn missing_sprite_uses_fallback_color() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut sprites = SpriteCache::new(PathBuf::from("does-not-exist"));
        let mut surface = FrameSurface {
            frame: &mut frame,
            width: 4,
            height: 4,
            sprites: &mut sprites,
        };
        surface.blit(
            &Drawable::Sprite {
                key: SpriteKey::new("missing", 0, 0, 2),
                fallback: [1, 2, 3, 255],
            },
            Point::new(0, 0),
            1,
        );
        assert_eq!(pixel(&frame, 4, 1, 1), [1, 2, 3, 255]);
        assert_eq!(pixel(&frame, 4, 2, 2), [0, 0, 0, 0]);
    }

    #[test]
    fn sprite_blit_skips_keyed_pixels() {
        let mut frame = vec![0u8; 4 * 4 * 4];
        let mut sprites = SpriteCache::new(PathBuf::from("does-not-exist"));
        let mut sheet = RgbaImage::from_pixel(2, 2, Rgba([255, 255, 255, 255]));
        sheet.put_pixel(0, 0, Rgba([50, 60, 70, 255]));
        sprites.insert_sheet("tiles", sheet);
        let mut surface = FrameSurface {
            frame: &mut frame,
            width: 4,
            height: 4,
            sprites: &mut sprites,
        };
        surface.blit(
            &Drawable::Sprite {
                key: SpriteKey::new("tiles", 0, 0, 2),
                fallback: [1, 2, 3, 255],
            },
            Point::new(1, 1),
            1,
        );
        assert_eq!(pixel(&frame, 4, 1, 1), [50, 60, 70, 255]);
        assert_eq!(pixel(&frame, 4, 2, 1), [0, 0, 0, 0]);
    }
}
