use std::collections::HashMap;
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbaImage};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MapError {
    #[error("failed to open map image at {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode map image at {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("page ({pagex}, {pagey}) lies outside the map source")]
    PageOutOfRange { pagex: i32, pagey: i32 },
    #[error("pixel count mismatch: expected {expected}, got {actual}")]
    PixelCountMismatch { expected: usize, actual: usize },
    #[error("unrecognized tile pixel {pixel:?} at cell ({cell_x}, {cell_y})")]
    UnrecognizedTileKind {
        pixel: [u8; 4],
        cell_x: u32,
        cell_y: u32,
    },
}

/// Row-major RGBA samples for one page, one sample per tile cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelGrid {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl PixelGrid {
    pub fn new(width: u32, height: u32, pixels: Vec<[u8; 4]>) -> Result<Self, MapError> {
        let expected = width as usize * height as usize;
        let actual = pixels.len();
        if expected != actual {
            return Err(MapError::PixelCountMismatch { expected, actual });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn filled(width: u32, height: u32, pixel: [u8; 4]) -> Self {
        Self {
            width,
            height,
            pixels: vec![pixel; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn index_of(&self, x: u32, y: u32) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    pub fn pixel_at(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        self.index_of(x, y)
            .and_then(|index| self.pixels.get(index).copied())
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, pixel: [u8; 4]) -> bool {
        match self.index_of(x, y) {
            Some(index) => {
                self.pixels[index] = pixel;
                true
            }
            None => false,
        }
    }
}

/// Supplies the pixel samples of one page. Must be a pure function of its
/// arguments.
pub trait PixelSource {
    fn page(&self, pagex: i32, pagey: i32, extent: u32) -> Result<PixelGrid, MapError>;
}

/// A single map image cut into `extent × extent` cells; page `(x, y)` is the
/// cell whose top-left pixel is `(x * extent, y * extent)`.
#[derive(Debug, Clone)]
pub struct ImageMapSource {
    image: RgbaImage,
}

impl ImageMapSource {
    pub fn open(path: &Path) -> Result<Self, MapError> {
        let reader = ImageReader::open(path).map_err(|source| MapError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let decoded = reader.decode().map_err(|source| MapError::Decode {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_image(decoded.to_rgba8()))
    }

    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    /// Pages across and down.
    pub fn page_counts(&self, extent: u32) -> (u32, u32) {
        if extent == 0 {
            return (0, 0);
        }
        (self.image.width() / extent, self.image.height() / extent)
    }
}

impl PixelSource for ImageMapSource {
    fn page(&self, pagex: i32, pagey: i32, extent: u32) -> Result<PixelGrid, MapError> {
        let out_of_range = MapError::PageOutOfRange { pagex, pagey };
        let (pages_x, pages_y) = self.page_counts(extent);
        let (Ok(px), Ok(py)) = (u32::try_from(pagex), u32::try_from(pagey)) else {
            return Err(out_of_range);
        };
        if px >= pages_x || py >= pages_y {
            return Err(out_of_range);
        }

        let (x0, y0) = (px * extent, py * extent);
        let mut pixels = Vec::with_capacity(extent as usize * extent as usize);
        for y in y0..y0 + extent {
            for x in x0..x0 + extent {
                pixels.push(self.image.get_pixel(x, y).0);
            }
        }
        PixelGrid::new(extent, extent, pixels)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryMapSource {
    pages: HashMap<(i32, i32), PixelGrid>,
}

impl InMemoryMapSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pagex: i32, pagey: i32, grid: PixelGrid) {
        self.pages.insert((pagex, pagey), grid);
    }

    pub fn with_page(mut self, pagex: i32, pagey: i32, grid: PixelGrid) -> Self {
        self.insert(pagex, pagey, grid);
        self
    }
}

impl PixelSource for InMemoryMapSource {
    fn page(&self, pagex: i32, pagey: i32, extent: u32) -> Result<PixelGrid, MapError> {
        let grid = self
            .pages
            .get(&(pagex, pagey))
            .ok_or(MapError::PageOutOfRange { pagex, pagey })?;
        if grid.width() != extent || grid.height() != extent {
            return Err(MapError::PixelCountMismatch {
                expected: extent as usize * extent as usize,
                actual: grid.width() as usize * grid.height() as usize,
            });
        }
        Ok(grid.clone())
    }
}

#[cfg(test)]
mod tests {
    use image::Rgba;

    use super::*;

    const WHITE: [u8; 4] = [255, 255, 255, 255];
    const BLACK: [u8; 4] = [0, 0, 0, 255];

    fn two_by_one_pages() -> RgbaImage {
        // Two 3x3 pages side by side; the right page has a black top-left cell.
        let mut image = RgbaImage::from_pixel(6, 3, Rgba(WHITE));
        image.put_pixel(3, 0, Rgba(BLACK));
        image
    }

    #[test]
    fn pixel_grid_rejects_wrong_pixel_count() {
        let err = PixelGrid::new(2, 2, vec![WHITE; 3]).expect_err("err");
        assert!(matches!(
            err,
            MapError::PixelCountMismatch {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn pixel_grid_indexing_and_bounds() {
        let mut grid = PixelGrid::filled(2, 2, WHITE);
        assert!(grid.set_pixel(1, 0, BLACK));
        assert!(!grid.set_pixel(2, 0, BLACK));
        assert_eq!(grid.index_of(1, 1), Some(3));
        assert_eq!(grid.pixel_at(1, 0), Some(BLACK));
        assert_eq!(grid.pixel_at(0, 1), Some(WHITE));
        assert_eq!(grid.pixel_at(0, 2), None);
    }

    #[test]
    fn image_source_cuts_pages_by_extent() {
        let source = ImageMapSource::from_image(two_by_one_pages());
        assert_eq!(source.page_counts(3), (2, 1));

        let left = source.page(0, 0, 3).expect("left page");
        let right = source.page(1, 0, 3).expect("right page");
        assert_eq!(left.pixel_at(0, 0), Some(WHITE));
        assert_eq!(right.pixel_at(0, 0), Some(BLACK));
        assert_eq!(right.pixel_at(1, 0), Some(WHITE));
    }

    #[test]
    fn image_source_rejects_pages_outside_the_image() {
        let source = ImageMapSource::from_image(two_by_one_pages());
        for (x, y) in [(2, 0), (0, 1), (-1, 0), (0, -1)] {
            let err = source.page(x, y, 3).expect_err("out of range");
            assert!(
                matches!(err, MapError::PageOutOfRange { pagex, pagey } if pagex == x && pagey == y),
                "page=({x}, {y})"
            );
        }
    }

    #[test]
    fn image_source_reads_png_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("map.png");
        two_by_one_pages().save(&path).expect("save png");

        let source = ImageMapSource::open(&path).expect("open");
        let right = source.page(1, 0, 3).expect("right page");
        assert_eq!(right.pixel_at(0, 0), Some(BLACK));
    }

    #[test]
    fn image_source_open_reports_missing_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = ImageMapSource::open(&dir.path().join("missing.png")).expect_err("missing");
        assert!(matches!(err, MapError::Open { .. }));
    }

    #[test]
    fn in_memory_source_checks_extent() {
        let source = InMemoryMapSource::new().with_page(0, 0, PixelGrid::filled(2, 2, WHITE));
        assert!(source.page(0, 0, 2).is_ok());
        assert!(matches!(
            source.page(0, 0, 3),
            Err(MapError::PixelCountMismatch { .. })
        ));
        assert!(matches!(
            source.page(1, 0, 2),
            Err(MapError::PageOutOfRange { pagex: 1, pagey: 0 })
        ));
    }
}
