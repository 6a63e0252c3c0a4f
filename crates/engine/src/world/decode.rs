use super::source::{MapError, PixelGrid, PixelSource};
use super::tile::{classify_pixel, Tile};
use crate::geometry::Point;

/// Fetches page `(pagex, pagey)` and turns each sample into a tile positioned
/// at `(i, j) * tile_edge`. Tiles are emitted column by column.
pub fn decode_page(
    source: &dyn PixelSource,
    pagex: i32,
    pagey: i32,
    extent: u32,
    tile_edge: i32,
) -> Result<Vec<Tile>, MapError> {
    let grid = source.page(pagex, pagey, extent)?;
    decode_grid(&grid, tile_edge)
}

pub(crate) fn decode_grid(grid: &PixelGrid, tile_edge: i32) -> Result<Vec<Tile>, MapError> {
    let mut tiles = Vec::with_capacity(grid.width() as usize * grid.height() as usize);
    for i in 0..grid.width() {
        for j in 0..grid.height() {
            let Some(pixel) = grid.pixel_at(i, j) else {
                continue;
            };
            let kind = classify_pixel(pixel).ok_or(MapError::UnrecognizedTileKind {
                pixel,
                cell_x: i,
                cell_y: j,
            })?;
            let position = Point::new(i as i32 * tile_edge, j as i32 * tile_edge);
            tiles.push(Tile::new(kind, position, tile_edge));
        }
    }
    Ok(tiles)
}
