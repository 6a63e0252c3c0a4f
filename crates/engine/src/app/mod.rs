mod clock;
mod entity;
mod input;
mod loop_runner;
mod metrics;
mod registry;
mod rendering;
mod scene;

pub use entity::{Capabilities, Entity, EntityId, EntityKind, SimError, UpdateContext};
pub use input::{InputAction, InputSnapshot, KeyReleaseTracker};
pub use loop_runner::{run_app, AppError, LoopConfig};
pub use registry::{EntityRegistry, RegistryError};
pub use rendering::{Drawable, Renderer, SpriteCache, SpriteKey, Surface};
pub use scene::{Scene, SceneCommand};
