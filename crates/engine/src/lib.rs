pub mod app;
pub mod geometry;
mod paths;
pub mod physics;
pub mod world;

pub use app::{
    run_app, AppError, Capabilities, Drawable, Entity, EntityId, EntityKind, EntityRegistry,
    InputAction, InputSnapshot, KeyReleaseTracker, LoopConfig, RegistryError, Renderer, Scene,
    SceneCommand, SimError, SpriteCache, SpriteKey, Surface, UpdateContext,
};
pub use geometry::{bound, sign, Body, Point, Vec2};
pub use paths::{resolve_app_paths, AppPaths, StartupError, ROOT_ENV_VAR};
pub use physics::{
    resolve_collision, resolve_collision_among, touching_ground, touching_ground_among,
    touching_wall, touching_wall_among, touching_water, CollisionError,
};
pub use world::{
    classify_pixel, decode_page, page_delta, ImageMapSource, InMemoryMapSource, MapError,
    PageCoord, PagerError, PixelGrid, PixelSource, Tile, TileKind, WorldPager,
};
