mod decode;
mod pager;
mod source;
mod tile;

pub use decode::decode_page;
pub use pager::{page_delta, PageCoord, PagerError, WorldPager};
pub use source::{ImageMapSource, InMemoryMapSource, MapError, PixelGrid, PixelSource};
pub use tile::{classify_pixel, Tile, TileKind, TILE_SHEET};
