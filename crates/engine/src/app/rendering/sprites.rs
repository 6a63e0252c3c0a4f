use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use image::{ImageReader, RgbaImage};
use tracing::warn;

/// Composite cache key: one square cell of one sprite sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpriteKey {
    pub sheet: &'static str,
    pub cell_x: u32,
    pub cell_y: u32,
    pub cell_size: u32,
}

impl SpriteKey {
    pub const fn new(sheet: &'static str, cell_x: u32, cell_y: u32, cell_size: u32) -> Self {
        Self {
            sheet,
            cell_x,
            cell_y,
            cell_size,
        }
    }
}

pub(crate) struct LoadedSprite {
    pub(crate) width: u32,
    pub(crate) height: u32,
    pub(crate) rgba: Vec<u8>,
}

/// Sheets are read from `<sprite_dir>/<sheet>.png` on first use.
/// Pure white is the color key and becomes transparent.
pub struct SpriteCache {
    sprite_dir: PathBuf,
    sheets: HashMap<&'static str, Option<RgbaImage>>,
    cells: HashMap<SpriteKey, Option<LoadedSprite>>,
    warned_missing_sheets: HashSet<&'static str>,
}

const COLOR_KEY: [u8; 3] = [255, 255, 255];

impl SpriteCache {
    pub fn new(sprite_dir: PathBuf) -> Self {
        Self {
            sprite_dir,
            sheets: HashMap::new(),
            cells: HashMap::new(),
            warned_missing_sheets: HashSet::new(),
        }
    }

    pub(crate) fn resolve(&mut self, key: SpriteKey) -> Option<&LoadedSprite> {
        if !self.cells.contains_key(&key) {
            let sprite = self.cut_cell(key);
            self.cells.insert(key, sprite);
        }
        self.cells.get(&key).and_then(Option::as_ref)
    }

    pub fn cached_cell_count(&self) -> usize {
        self.cells.len()
    }

    fn cut_cell(&mut self, key: SpriteKey) -> Option<LoadedSprite> {
        if !self.sheets.contains_key(key.sheet) {
            let path = sheet_path(&self.sprite_dir, key.sheet);
            let sheet = match load_sheet(&path) {
                Ok(sheet) => Some(sheet),
                Err(reason) => {
                    if self.warned_missing_sheets.insert(key.sheet) {
                        warn!(
                            sheet = key.sheet,
                            path = %path.display(),
                            reason = reason.as_str(),
                            "sprite_sheet_unavailable_using_fallback"
                        );
                    }
                    None
                }
            };
            self.sheets.insert(key.sheet, sheet);
        }
        let sheet = self.sheets.get(key.sheet)?.as_ref()?;
        cut_cell_from_sheet(sheet, key)
    }

    #[cfg(test)]
    pub(crate) fn insert_sheet(&mut self, name: &'static str, sheet: RgbaImage) {
        self.sheets.insert(name, Some(sheet));
    }
}

fn sheet_path(sprite_dir: &Path, sheet: &str) -> PathBuf {
    sprite_dir.join(format!("{sheet}.png"))
}

fn load_sheet(path: &Path) -> Result<RgbaImage, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    Ok(decoded.to_rgba8())
}

fn cut_cell_from_sheet(sheet: &RgbaImage, key: SpriteKey) -> Option<LoadedSprite> {
    let size = key.cell_size;
    let x0 = key.cell_x.checked_mul(size)?;
    let y0 = key.cell_y.checked_mul(size)?;
    if size == 0 || x0 + size > sheet.width() || y0 + size > sheet.height() {
        return None;
    }
    let mut rgba = Vec::with_capacity(size as usize * size as usize * 4);
    for y in y0..y0 + size {
        for x in x0..x0 + size {
            let mut pixel = sheet.get_pixel(x, y).0;
            if pixel[..3] == COLOR_KEY {
                pixel[3] = 0;
            }
            rgba.extend_from_slice(&pixel);
        }
    }
    Some(LoadedSprite {
        width: size,
        height: size,
        rgba,
    })
}
