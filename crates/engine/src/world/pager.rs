use std::any::Any;
use std::rc::Rc;

use thiserror::Error;
use tracing::info;

use super::decode::decode_page;
use super::source::{MapError, PixelSource};
use super::tile::TileKind;
use crate::app::{Entity, EntityKind, EntityRegistry, SimError, Surface, UpdateContext};
use crate::geometry::Body;

#[derive(Debug, Error)]
pub enum PagerError {
    #[error("relative page shift ({x}, {y}) must move along exactly one axis of a loaded page")]
    InvalidShift { x: i32, y: i32 },
    #[error(transparent)]
    Map(#[from] MapError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PageCoord {
    pub x: i32,
    pub y: i32,
}

/// Number of whole pages `local` lies away from the current page along one
/// axis. Zero while `local` stays inside `[0, page_px)`.
pub fn page_delta(local: i32, page_px: i32) -> i32 {
    if page_px <= 0 {
        return 0;
    }
    local.div_euclid(page_px)
}

/// Keeps exactly one page of tiles registered and swaps pages on request.
pub struct WorldPager {
    source: Rc<dyn PixelSource>,
    tile_edge: i32,
    extent: u32,
    page: Option<PageCoord>,
    // Wall bodies of pages next to the current one, in their own coordinates.
    neighbours: Vec<(PageCoord, Vec<Body>)>,
}

impl WorldPager {
    pub fn new(source: Rc<dyn PixelSource>, tile_edge: i32, extent: u32) -> Self {
        Self {
            source,
            tile_edge,
            extent,
            page: None,
            neighbours: Vec::new(),
        }
    }

    pub fn page(&self) -> Option<PageCoord> {
        self.page
    }

    pub fn tile_edge(&self) -> i32 {
        self.tile_edge
    }

    pub fn extent(&self) -> u32 {
        self.extent
    }

    pub fn page_extent_px(&self) -> i32 {
        self.tile_edge * self.extent as i32
    }

    /// Loads page `(x, y)`, or shifts the current page by `(x, y)` when
    /// `relative`. The new page is decoded before any tile is removed, so an
    /// error leaves the registry and the current page untouched.
    pub fn load(
        &mut self,
        registry: &mut EntityRegistry,
        x: i32,
        y: i32,
        relative: bool,
    ) -> Result<PageCoord, PagerError> {
        let target = if relative {
            let current = match self.page {
                Some(current) if (x != 0) != (y != 0) => current,
                _ => return Err(PagerError::InvalidShift { x, y }),
            };
            PageCoord {
                x: current.x + x,
                y: current.y + y,
            }
        } else {
            PageCoord { x, y }
        };

        let tiles = decode_page(
            self.source.as_ref(),
            target.x,
            target.y,
            self.extent,
            self.tile_edge,
        )?;

        let removed = registry.delete_all(|entity| entity.kind().is_tile());
        let added = tiles.len();
        for tile in tiles {
            registry.add(tile);
        }
        self.page = Some(target);
        self.neighbours.clear();
        info!(
            pagex = target.x,
            pagey = target.y,
            removed,
            added,
            "page_loaded"
        );
        Ok(target)
    }

    /// Walls of the page `(dx, dy)` away from the current one, shifted into
    /// current-page coordinates and limited to those overlapping `near`.
    /// Pages outside the map contribute nothing.
    pub fn neighbour_walls(
        &mut self,
        dx: i32,
        dy: i32,
        near: &Body,
    ) -> Result<Vec<Body>, PagerError> {
        let Some(current) = self.page else {
            return Ok(Vec::new());
        };
        let coord = PageCoord {
            x: current.x + dx,
            y: current.y + dy,
        };
        let page_px = self.page_extent_px();
        let (off_x, off_y) = (dx * page_px, dy * page_px);
        let walls = self.walls_of(coord)?;
        Ok(walls
            .iter()
            .map(|wall| Body::new(wall.position.offset(off_x, off_y), wall.size))
            .filter(|wall| overlaps(wall, near))
            .collect())
    }

    fn walls_of(&mut self, coord: PageCoord) -> Result<&[Body], PagerError> {
        let index = match self.neighbours.iter().position(|(at, _)| *at == coord) {
            Some(index) => index,
            None => {
                let walls = match decode_page(
                    self.source.as_ref(),
                    coord.x,
                    coord.y,
                    self.extent,
                    self.tile_edge,
                ) {
                    Ok(tiles) => tiles
                        .iter()
                        .filter(|tile| tile.tile_kind() == TileKind::Wall)
                        .filter_map(|tile| tile.body())
                        .collect(),
                    Err(MapError::PageOutOfRange { .. }) => Vec::new(),
                    Err(err) => return Err(err.into()),
                };
                self.neighbours.push((coord, walls));
                self.neighbours.len() - 1
            }
        };
        Ok(&self.neighbours[index].1)
    }
}

/// Inclusive interval overlap on both axes.
fn overlaps(a: &Body, b: &Body) -> bool {
    a.position.x <= b.position.x + b.size
        && b.position.x <= a.position.x + a.size
        && a.position.y <= b.position.y + b.size
        && b.position.y <= a.position.y + a.size
}

impl Entity for WorldPager {
    fn kind(&self) -> EntityKind {
        EntityKind::Pager
    }

    fn update(&mut self, _ctx: &mut UpdateContext<'_>) -> Result<(), SimError> {
        Ok(())
    }

    fn render(&self, _surface: &mut dyn Surface) {}

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
    use crate::geometry::Point;
    use crate::world::{InMemoryMapSource, PixelGrid, Tile, TileKind};

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn marked_page(x: u32, y: u32) -> PixelGrid {
        let mut grid = PixelGrid::filled(2, 2, WHITE);
        grid.set_pixel(x, y, BLACK);
        grid
    }

    fn pager() -> WorldPager {
        let source = InMemoryMapSource::new()
            .with_page(0, 0, marked_page(0, 0))
            .with_page(1, 0, marked_page(1, 0))
            .with_page(1, 1, marked_page(1, 1))
            .with_page(2, 0, PixelGrid::filled(2, 2, [255, 0, 0, 255]));
        WorldPager::new(Rc::new(source), 10, 2)
    }

    fn wall_positions(registry: &EntityRegistry) -> Vec<Point> {
        registry
            .iter()
            .filter(|(_, entity)| entity.kind() == EntityKind::Tile(TileKind::Wall))
            .filter_map(|(_, entity)| entity.as_any().downcast_ref::<Tile>())
            .map(Tile::position)
            .collect()
    }

    fn tile_count(registry: &EntityRegistry) -> usize {
        registry.get_all(|entity| entity.kind().is_tile()).len()
    }

    #[test]
    fn absolute_load_registers_one_page_of_tiles() {
        let mut registry = EntityRegistry::new();
        let mut pager = pager();
        assert_eq!(pager.page(), None);

        let page = pager.load(&mut registry, 0, 0, false).expect("load");
        assert_eq!(page, PageCoord { x: 0, y: 0 });
        assert_eq!(pager.page(), Some(page));
        assert_eq!(tile_count(&registry), 4);
        assert_eq!(wall_positions(&registry), vec![Point::new(0, 0)]);
        assert_eq!(pager.page_extent_px(), 20);
    }

    #[test]
    fn relative_load_replaces_every_tile() {
        let mut registry = EntityRegistry::new();
        let mut pager = pager();
        pager.load(&mut registry, 0, 0, false).expect("load");

        let page = pager.load(&mut registry, 1, 0, true).expect("shift x");
        assert_eq!(page, PageCoord { x: 1, y: 0 });
        assert_eq!(tile_count(&registry), 4);
        assert_eq!(wall_positions(&registry), vec![Point::new(10, 0)]);

        let page = pager.load(&mut registry, 0, 1, true).expect("shift y");
        assert_eq!(page, PageCoord { x: 1, y: 1 });
        assert_eq!(wall_positions(&registry), vec![Point::new(10, 10)]);
    }

    #[test]
    fn relative_load_requires_exactly_one_axis() {
        let mut registry = EntityRegistry::new();
        let mut pager = pager();
        pager.load(&mut registry, 0, 0, false).expect("load");

        for (x, y) in [(1, 1), (0, 0), (-1, 2)] {
            let err = pager.load(&mut registry, x, y, true).expect_err("invalid");
            assert!(matches!(err, PagerError::InvalidShift { .. }), "shift=({x}, {y})");
        }
        assert_eq!(pager.page(), Some(PageCoord { x: 0, y: 0 }));
    }

    #[test]
    fn relative_load_before_first_page_is_rejected() {
        let mut registry = EntityRegistry::new();
        let mut pager = pager();
        let err = pager.load(&mut registry, 1, 0, true).expect_err("unloaded");
        assert!(matches!(err, PagerError::InvalidShift { x: 1, y: 0 }));
        assert!(registry.is_empty());
    }

    #[test]
    fn failed_decode_leaves_current_page_intact() {
        let mut registry = EntityRegistry::new();
        let mut pager = pager();
        pager.load(&mut registry, 1, 0, false).expect("load");

        let err = pager.load(&mut registry, 1, 0, true).expect_err("bad pixels");
        assert!(matches!(
            err,
            PagerError::Map(MapError::UnrecognizedTileKind { .. })
        ));
        let err = pager.load(&mut registry, 0, -1, true).expect_err("no page");
        assert!(matches!(
            err,
            PagerError::Map(MapError::PageOutOfRange { pagex: 1, pagey: -1 })
        ));

        assert_eq!(pager.page(), Some(PageCoord { x: 1, y: 0 }));
        assert_eq!(tile_count(&registry), 4);
        assert_eq!(wall_positions(&registry), vec![Point::new(10, 0)]);
    }

    #[test]
    fn page_delta_floors_toward_negative_infinity() {
        assert_eq!(page_delta(0, 400), 0);
        assert_eq!(page_delta(399, 400), 0);
        assert_eq!(page_delta(400, 400), 1);
        assert_eq!(page_delta(-1, 400), -1);
        assert_eq!(page_delta(-400, 400), -1);
        assert_eq!(page_delta(-401, 400), -2);
        assert_eq!(page_delta(850, 400), 2);
        assert_eq!(page_delta(5, 0), 0);
    }

    #[test]
    fn neighbour_walls_are_shifted_into_current_page_coordinates() {
        let mut registry = EntityRegistry::new();
        let mut pager = pager();
        pager.load(&mut registry, 0, 0, false).expect("load");

        // Page (1, 0) has its wall at local (10, 0); it sits at (30, 0) here.
        let near = Body::new(Point::new(15, 0), 18);
        let walls = pager.neighbour_walls(1, 0, &near).expect("neighbour");
        assert_eq!(walls, vec![Body::new(Point::new(30, 0), 10)]);

        let far = Body::new(Point::new(0, 0), 5);
        assert!(pager.neighbour_walls(1, 0, &far).expect("neighbour").is_empty());
        assert_eq!(tile_count(&registry), 4);
    }

    #[test]
    fn neighbour_outside_the_map_has_no_walls() {
        let mut registry = EntityRegistry::new();
        let mut pager = pager();
        pager.load(&mut registry, 0, 0, false).expect("load");

        let near = Body::new(Point::new(0, 0), 5);
        assert!(pager.neighbour_walls(-1, 0, &near).expect("off map").is_empty());
    }

    #[test]
    fn unreadable_neighbour_is_an_error() {
        let mut registry = EntityRegistry::new();
        let mut pager = pager();
        pager.load(&mut registry, 1, 0, false).expect("load");

        let near = Body::new(Point::new(15, 0), 10);
        let err = pager.neighbour_walls(1, 0, &near).expect_err("bad pixels");
        assert!(matches!(
            err,
            PagerError::Map(MapError::UnrecognizedTileKind { .. })
        ));
    }

    #[test]
    fn unloaded_pager_has_no_neighbours() {
        let mut pager = pager();
        let near = Body::new(Point::new(0, 0), 5);
        assert!(pager.neighbour_walls(1, 0, &near).expect("unloaded").is_empty());
    }
}
