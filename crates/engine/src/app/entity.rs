use std::any::Any;
use std::ops::BitOr;

use thiserror::Error;

use super::input::{InputSnapshot, KeyReleaseTracker};
use super::registry::{EntityRegistry, RegistryError};
use super::rendering::Surface;
use crate::geometry::Body;
use crate::physics::CollisionError;
use crate::world::{PagerError, TileKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(pub u64);

#[derive(Debug, Default)]
pub struct EntityIdAllocator {
    next: u64,
}

impl EntityIdAllocator {
    pub fn allocate(&mut self) -> EntityId {
        let id = EntityId(self.next);
        self.next = self.next.saturating_add(1);
        id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Tile(TileKind),
    Pager,
    Character,
    Projectile,
    Other,
}

impl EntityKind {
    pub fn is_tile(self) -> bool {
        matches!(self, EntityKind::Tile(_))
    }
}

/// Per-instance capability bits, fixed when the entity is constructed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Self = Self(0);
    pub const WALL: Self = Self(1 << 0);
    pub const WATER: Self = Self(1 << 1);
    pub const FALLABLE: Self = Self(1 << 2);
    pub const HEALTHABLE: Self = Self(1 << 3);
    pub const PROJECTILE: Self = Self(1 << 4);

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn contains(self, other: Self) -> bool {
        other.0 != 0 && self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Capabilities {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Pager(#[from] PagerError),
    #[error(transparent)]
    Collision(#[from] CollisionError),
}

/// Everything an entity may touch while it is being updated. The entity itself
/// is detached from `registry` for the duration of the call.
pub struct UpdateContext<'a> {
    pub id: EntityId,
    pub registry: &'a mut EntityRegistry,
    pub input: &'a InputSnapshot,
    pub releases: &'a mut KeyReleaseTracker,
}

pub trait Entity: Any {
    fn kind(&self) -> EntityKind;

    fn capabilities(&self) -> Capabilities {
        Capabilities::NONE
    }

    fn body(&self) -> Option<Body> {
        None
    }

    /// Render order key. `None` draws before every explicit depth.
    fn depth(&self) -> Option<i32> {
        None
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<(), SimError>;

    fn render(&self, surface: &mut dyn Surface);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}
