use std::any::Any;

use crate::app::{
    Capabilities, Drawable, Entity, EntityKind, SimError, SpriteKey, Surface, UpdateContext,
};
use crate::geometry::{Body, Point};

pub const TILE_SHEET: &str = "tiles";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TileKind {
    Wall,
    Water,
    Empty,
}

impl TileKind {
    pub fn capabilities(self) -> Capabilities {
        match self {
            TileKind::Wall => Capabilities::WALL,
            TileKind::Water => Capabilities::WATER,
            TileKind::Empty => Capabilities::NONE,
        }
    }

    fn sheet_cell(self) -> (u32, u32) {
        match self {
            TileKind::Wall => (1, 0),
            TileKind::Empty => (0, 1),
            TileKind::Water => (1, 1),
        }
    }

    fn fallback_color(self) -> [u8; 4] {
        match self {
            TileKind::Wall => [96, 96, 104, 255],
            TileKind::Empty => [24, 24, 32, 255],
            TileKind::Water => [32, 72, 200, 255],
        }
    }
}

/// Maps one map sample to a tile kind. Alpha is ignored.
pub fn classify_pixel(pixel: [u8; 4]) -> Option<TileKind> {
    match [pixel[0], pixel[1], pixel[2]] {
        [0, 0, 0] => Some(TileKind::Wall),
        [255, 255, 255] => Some(TileKind::Empty),
        [0, 0, 255] => Some(TileKind::Water),
        _ => None,
    }
}

/// Immutable square of the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tile {
    kind: TileKind,
    body: Body,
}

impl Tile {
    pub fn new(kind: TileKind, position: Point, edge: i32) -> Self {
        Self {
            kind,
            body: Body::new(position, edge),
        }
    }

    pub fn tile_kind(&self) -> TileKind {
        self.kind
    }

    pub fn position(&self) -> Point {
        self.body.position
    }
}

impl Entity for Tile {
    fn kind(&self) -> EntityKind {
        EntityKind::Tile(self.kind)
    }

    fn capabilities(&self) -> Capabilities {
        self.kind.capabilities()
    }

    fn body(&self) -> Option<Body> {
        Some(self.body)
    }

    fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<(), SimError> {
        Ok(())
    }

    fn render(&self, surface: &mut dyn Surface) {
        let (cell_x, cell_y) = self.kind.sheet_cell();
        let edge = u32::try_from(self.body.size).unwrap_or(0);
        surface.blit(
            &Drawable::Sprite {
                key: SpriteKey::new(TILE_SHEET, cell_x, cell_y, edge),
                fallback: self.kind.fallback_color(),
            },
            self.body.position,
            self.body.size,
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_table() {
        assert_eq!(classify_pixel([0, 0, 0, 255]), Some(TileKind::Wall));
        assert_eq!(classify_pixel([0, 0, 0, 0]), Some(TileKind::Wall));
        assert_eq!(classify_pixel([255, 255, 255, 255]), Some(TileKind::Empty));
        assert_eq!(classify_pixel([0, 0, 255, 255]), Some(TileKind::Water));
        assert_eq!(classify_pixel([255, 0, 0, 255]), None);
        assert_eq!(classify_pixel([1, 0, 0, 255]), None);
    }

    #[test]
    fn tile_capabilities_follow_kind() {
        let wall = Tile::new(TileKind::Wall, Point::new(0, 0), 20);
        let water = Tile::new(TileKind::Water, Point::new(20, 0), 20);
        let empty = Tile::new(TileKind::Empty, Point::new(40, 0), 20);

        assert!(wall.capabilities().contains(Capabilities::WALL));
        assert!(water.capabilities().contains(Capabilities::WATER));
        assert!(!water.capabilities().contains(Capabilities::WALL));
        assert!(empty.capabilities().is_empty());
        assert_eq!(wall.depth(), None);
        assert_eq!(water.body().map(|body| body.size), Some(20));
    }
}
