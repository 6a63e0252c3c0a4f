mod renderer;
mod sprites;

pub use renderer::Renderer;
pub use sprites::{SpriteCache, SpriteKey};

use crate::geometry::Point;

/// Something an entity can ask a surface to draw. Sprites carry a flat color
/// used when the sheet is unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Drawable {
    Sprite { key: SpriteKey, fallback: [u8; 4] },
    Solid([u8; 4]),
}

pub trait Surface {
    /// Draws `drawable` with its top-left corner at `position`. `size` is the
    /// entity's body size and sizes flat-color fallbacks.
    fn blit(&mut self, drawable: &Drawable, position: Point, size: i32);
}
