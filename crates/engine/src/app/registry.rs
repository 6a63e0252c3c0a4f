use thiserror::Error;
use tracing::debug;

use super::entity::{Entity, EntityId, EntityIdAllocator, SimError, UpdateContext};
use super::input::{InputSnapshot, KeyReleaseTracker};
use super::rendering::Surface;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("expected exactly one matching entity, found {matched}")]
    ExpectedExactlyOne { matched: usize },
    #[error("entity {id:?} is not registered or has a different type")]
    Unavailable { id: EntityId },
}

struct Slot {
    id: EntityId,
    // `None` while the entity is detached for its own update.
    entity: Option<Box<dyn Entity>>,
}

/// Owns every live entity. Additions and deletions are visible to queries
/// immediately; `update` walks the ids that were live when it started.
#[derive(Default)]
pub struct EntityRegistry {
    allocator: EntityIdAllocator,
    slots: Vec<Slot>,
}

impl EntityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<E: Entity>(&mut self, entity: E) -> EntityId {
        self.add_boxed(Box::new(entity))
    }

    pub fn add_boxed(&mut self, entity: Box<dyn Entity>) -> EntityId {
        let id = self.allocator.allocate();
        self.slots.push(Slot {
            id,
            entity: Some(entity),
        });
        id
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.slots.iter().map(|slot| slot.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &dyn Entity)> + '_ {
        self.slots
            .iter()
            .filter_map(|slot| slot.entity.as_deref().map(|entity| (slot.id, entity)))
    }

    pub fn get(&self, id: EntityId) -> Option<&dyn Entity> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .and_then(|slot| slot.entity.as_deref())
    }

    pub fn get_as<T: Entity>(&self, id: EntityId) -> Option<&T> {
        self.get(id)
            .and_then(|entity| entity.as_any().downcast_ref::<T>())
    }

    pub fn get_one(
        &self,
        predicate: impl Fn(&dyn Entity) -> bool,
    ) -> Result<EntityId, RegistryError> {
        let mut found = None;
        let mut matched = 0usize;
        for (id, entity) in self.iter() {
            if predicate(entity) {
                matched += 1;
                found = Some(id);
            }
        }
        match (matched, found) {
            (1, Some(id)) => Ok(id),
            _ => Err(RegistryError::ExpectedExactlyOne { matched }),
        }
    }

    pub fn get_all(&self, predicate: impl Fn(&dyn Entity) -> bool) -> Vec<EntityId> {
        self.iter()
            .filter(|(_, entity)| predicate(*entity))
            .map(|(id, _)| id)
            .collect()
    }

    pub fn any(&self, predicate: impl Fn(&dyn Entity) -> bool) -> bool {
        self.iter().any(|(_, entity)| predicate(entity))
    }

    pub fn delete(&mut self, id: EntityId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|slot| slot.id != id);
        before != self.slots.len()
    }

    /// Removes every attached entity matching `predicate`. Returns the count.
    pub fn delete_all(&mut self, predicate: impl Fn(&dyn Entity) -> bool) -> usize {
        let before = self.slots.len();
        self.slots.retain(|slot| match slot.entity.as_deref() {
            Some(entity) => !predicate(entity),
            None => true,
        });
        let removed = before - self.slots.len();
        debug!(removed, remaining = self.slots.len(), "entities_deleted");
        removed
    }

    /// Detaches entity `id`, lends it as `T` alongside the registry, then
    /// re-attaches it in its original slot (unless `f` deleted it).
    pub fn with_entity_as<T: Entity, R>(
        &mut self,
        id: EntityId,
        f: impl FnOnce(&mut T, &mut Self) -> R,
    ) -> Result<R, RegistryError> {
        let mut entity = self.detach(id).ok_or(RegistryError::Unavailable { id })?;
        let Some(typed) = entity.as_any_mut().downcast_mut::<T>() else {
            self.reattach(id, entity);
            return Err(RegistryError::Unavailable { id });
        };
        let result = f(typed, self);
        self.reattach(id, entity);
        Ok(result)
    }

    pub fn update(
        &mut self,
        input: &InputSnapshot,
        releases: &mut KeyReleaseTracker,
    ) -> Result<(), SimError> {
        let snapshot = self.ids();
        for id in snapshot {
            let Some(mut entity) = self.detach(id) else {
                continue;
            };
            let result = {
                let mut ctx = UpdateContext {
                    id,
                    registry: &mut *self,
                    input,
                    releases: &mut *releases,
                };
                entity.update(&mut ctx)
            };
            self.reattach(id, entity);
            result?;
        }
        Ok(())
    }

    /// Stable-sorts by depth (missing depth first) and renders in that order.
    /// The sorted order is kept for subsequent passes.
    pub fn render(&mut self, surface: &mut dyn Surface) {
        self.slots.sort_by_key(|slot| {
            slot.entity
                .as_deref()
                .and_then(|entity| entity.depth())
                .map_or(i64::MIN, i64::from)
        });
        for entity in self.slots.iter().filter_map(|slot| slot.entity.as_deref()) {
            entity.render(surface);
        }
    }

    fn detach(&mut self, id: EntityId) -> Option<Box<dyn Entity>> {
        self.slots
            .iter_mut()
            .find(|slot| slot.id == id)
            .and_then(|slot| slot.entity.take())
    }

    fn reattach(&mut self, id: EntityId, entity: Box<dyn Entity>) {
        if let Some(slot) = self.slots.iter_mut().find(|slot| slot.id == id) {
            slot.entity = Some(entity);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::any::Any;

    use super::*;
    use crate::app::entity::EntityKind;
    use crate::app::rendering::Drawable;
    use crate::geometry::Point;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Behavior {
        Idle,
        SpawnSibling,
        DeleteNext,
        DeleteSelf,
    }

    struct Marker {
        tag: u32,
        depth: Option<i32>,
        behavior: Behavior,
        updates: u32,
    }

    impl Marker {
        fn new(tag: u32) -> Self {
            Self {
                tag,
                depth: None,
                behavior: Behavior::Idle,
                updates: 0,
            }
        }

        fn with_depth(mut self, depth: i32) -> Self {
            self.depth = Some(depth);
            self
        }

        fn with_behavior(mut self, behavior: Behavior) -> Self {
            self.behavior = behavior;
            self
        }
    }

    impl Entity for Marker {
        fn kind(&self) -> EntityKind {
            EntityKind::Other
        }

        fn depth(&self) -> Option<i32> {
            self.depth
        }

        fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<(), SimError> {
            self.updates += 1;
            match self.behavior {
                Behavior::Idle => {}
                Behavior::SpawnSibling => {
                    ctx.registry.add(Marker::new(self.tag + 100));
                }
                Behavior::DeleteNext => {
                    ctx.registry.delete(EntityId(ctx.id.0 + 1));
                }
                Behavior::DeleteSelf => {
                    ctx.registry.delete(ctx.id);
                }
            }
            Ok(())
        }

        fn render(&self, surface: &mut dyn Surface) {
            surface.blit(
                &Drawable::Solid([self.tag as u8, 0, 0, 255]),
                Point::new(self.tag as i32, 0),
                1,
            );
        }

        fn as_any(&self) -> &dyn Any {
            self
        }

        fn as_any_mut(&mut self) -> &mut dyn Any {
            self
        }
    }

    #[derive(Default)]
    struct RecordingSurface {
        xs: Vec<i32>,
    }

    impl Surface for RecordingSurface {
        fn blit(&mut self, _drawable: &Drawable, position: Point, _size: i32) {
            self.xs.push(position.x);
        }
    }

    fn tag_of(registry: &EntityRegistry, id: EntityId) -> u32 {
        registry.get_as::<Marker>(id).expect("marker").tag
    }

    fn updates_of(registry: &EntityRegistry, id: EntityId) -> u32 {
        registry.get_as::<Marker>(id).expect("marker").updates
    }

    fn run_update(registry: &mut EntityRegistry) {
        let mut releases = KeyReleaseTracker::default();
        registry
            .update(&InputSnapshot::empty(), &mut releases)
            .expect("update");
    }

    #[test]
    fn get_one_requires_exactly_one_match() {
        let mut registry = EntityRegistry::new();
        assert_eq!(
            registry.get_one(|_| true),
            Err(RegistryError::ExpectedExactlyOne { matched: 0 })
        );

        let only = registry.add(Marker::new(1));
        assert_eq!(registry.get_one(|_| true), Ok(only));

        registry.add(Marker::new(2));
        assert_eq!(
            registry.get_one(|_| true),
            Err(RegistryError::ExpectedExactlyOne { matched: 2 })
        );
    }

    #[test]
    fn get_all_and_delete_all_preserve_relative_order() {
        let mut registry = EntityRegistry::new();
        let ids: Vec<EntityId> = (0..6).map(|tag| registry.add(Marker::new(tag))).collect();

        let odd = |entity: &dyn Entity| {
            entity
                .as_any()
                .downcast_ref::<Marker>()
                .is_some_and(|marker| marker.tag % 2 == 1)
        };
        assert_eq!(registry.get_all(odd), vec![ids[1], ids[3], ids[5]]);

        assert_eq!(registry.delete_all(odd), 3);
        assert_eq!(registry.ids(), vec![ids[0], ids[2], ids[4]]);
    }

    #[test]
    fn delete_reports_whether_entity_existed() {
        let mut registry = EntityRegistry::new();
        let id = registry.add(Marker::new(1));
        assert!(registry.delete(id));
        assert!(!registry.delete(id));
        assert!(registry.is_empty());
    }

    #[test]
    fn update_visits_every_entity_once() {
        let mut registry = EntityRegistry::new();
        let a = registry.add(Marker::new(1));
        let b = registry.add(Marker::new(2));

        run_update(&mut registry);
        run_update(&mut registry);

        assert_eq!(updates_of(&registry, a), 2);
        assert_eq!(updates_of(&registry, b), 2);
    }

    #[test]
    fn entities_added_mid_update_wait_for_next_pass() {
        let mut registry = EntityRegistry::new();
        registry.add(Marker::new(1).with_behavior(Behavior::SpawnSibling));

        run_update(&mut registry);
        assert_eq!(registry.len(), 2);
        let spawned = registry.ids()[1];
        assert_eq!(tag_of(&registry, spawned), 101);
        assert_eq!(updates_of(&registry, spawned), 0);

        run_update(&mut registry);
        assert_eq!(updates_of(&registry, spawned), 1);
    }

    #[test]
    fn entity_deleted_mid_update_is_skipped() {
        let mut registry = EntityRegistry::new();
        registry.add(Marker::new(1).with_behavior(Behavior::DeleteNext));
        let victim = registry.add(Marker::new(2));
        let survivor = registry.add(Marker::new(3));

        run_update(&mut registry);

        assert!(registry.get(victim).is_none());
        assert_eq!(updates_of(&registry, survivor), 1);
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn entity_can_delete_itself_during_update() {
        let mut registry = EntityRegistry::new();
        let doomed = registry.add(Marker::new(1).with_behavior(Behavior::DeleteSelf));
        let other = registry.add(Marker::new(2));

        run_update(&mut registry);

        assert!(registry.get(doomed).is_none());
        assert_eq!(registry.ids(), vec![other]);
    }

    #[test]
    fn render_sorts_by_depth_with_missing_depth_first_and_stable_ties() {
        let mut registry = EntityRegistry::new();
        registry.add(Marker::new(10).with_depth(1));
        registry.add(Marker::new(20));
        registry.add(Marker::new(30).with_depth(0));
        registry.add(Marker::new(40));
        registry.add(Marker::new(50).with_depth(0));

        let mut surface = RecordingSurface::default();
        registry.render(&mut surface);
        assert_eq!(surface.xs, vec![20, 40, 30, 50, 10]);

        let mut again = RecordingSurface::default();
        registry.render(&mut again);
        assert_eq!(again.xs, surface.xs);
    }

    #[test]
    fn with_entity_as_lends_entity_and_reattaches_in_place() {
        let mut registry = EntityRegistry::new();
        let first = registry.add(Marker::new(1));
        let second = registry.add(Marker::new(2));

        let seen_self = registry
            .with_entity_as::<Marker, _>(first, |marker, registry| {
                marker.tag = 7;
                registry.get(first).is_some()
            })
            .expect("lend");

        assert!(!seen_self);
        assert_eq!(registry.ids(), vec![first, second]);
        assert_eq!(tag_of(&registry, first), 7);
    }

    #[test]
    fn with_entity_as_rejects_missing_ids() {
        let mut registry = EntityRegistry::new();
        let result = registry.with_entity_as::<Marker, _>(EntityId(42), |_, _| ());
        assert_eq!(result, Err(RegistryError::Unavailable { id: EntityId(42) }));
    }
}
