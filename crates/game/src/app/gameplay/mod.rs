use std::any::Any;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use engine::{
    bound, page_delta, resolve_collision_among, sign, touching_ground_among, touching_wall,
    touching_water, Body, Capabilities, Drawable, Entity, EntityId, EntityKind, EntityRegistry,
    InputAction, InputSnapshot, KeyReleaseTracker, PageCoord, PagerError, PixelSource, Point,
    RegistryError, Scene, SceneCommand, SimError, SpriteKey, Surface, UpdateContext, Vec2,
    WorldPager,
};
use engine::world::TILE_SHEET;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

const CHARACTER_DEPTH: i32 = 0;
const PROJECTILE_DEPTH: i32 = 1;
pub(crate) const GAME_CONFIG_FILE: &str = "game.json";

include!("config.rs");
include!("character.rs");
include!("projectile.rs");
include!("scene.rs");

#[cfg(test)]
mod tests {
    include!("tests.rs");
}
