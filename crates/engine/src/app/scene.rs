use tracing::info;

use super::entity::SimError;
use super::input::{InputSnapshot, KeyReleaseTracker};
use super::registry::EntityRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneCommand {
    None,
    Quit,
}

/// A game session built on top of an entity registry.
pub trait Scene {
    fn load(&mut self, registry: &mut EntityRegistry) -> Result<(), SimError>;
    fn update(
        &mut self,
        input: &InputSnapshot,
        releases: &mut KeyReleaseTracker,
        registry: &mut EntityRegistry,
    ) -> Result<SceneCommand, SimError>;
    fn unload(&mut self, registry: &mut EntityRegistry);
    fn debug_title(&self, _registry: &EntityRegistry) -> Option<String> {
        None
    }
}

/// Owns the scene, its registry and the release tracker shared by every tick.
pub(crate) struct SceneRuntime {
    scene: Box<dyn Scene>,
    registry: EntityRegistry,
    releases: KeyReleaseTracker,
    is_loaded: bool,
}

impl SceneRuntime {
    pub(crate) fn new(scene: Box<dyn Scene>) -> Self {
        Self {
            scene,
            registry: EntityRegistry::new(),
            releases: KeyReleaseTracker::default(),
            is_loaded: false,
        }
    }

    pub(crate) fn load(&mut self) -> Result<(), SimError> {
        if self.is_loaded {
            return Ok(());
        }
        self.scene.load(&mut self.registry)?;
        self.is_loaded = true;
        info!(entity_count = self.registry.len(), "scene_loaded");
        Ok(())
    }

    pub(crate) fn releases_mut(&mut self) -> &mut KeyReleaseTracker {
        &mut self.releases
    }

    /// Runs one tick. Releases nobody consumed during the tick are dropped.
    pub(crate) fn tick(&mut self, input: &InputSnapshot) -> Result<SceneCommand, SimError> {
        let result = self
            .scene
            .update(input, &mut self.releases, &mut self.registry);
        self.releases.flush();
        result
    }

    pub(crate) fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub(crate) fn registry_mut(&mut self) -> &mut EntityRegistry {
        &mut self.registry
    }

    pub(crate) fn debug_title(&self) -> Option<String> {
        self.scene.debug_title(&self.registry)
    }

    pub(crate) fn shutdown(&mut self) {
        if !self.is_loaded {
            return;
        }
        self.scene.unload(&mut self.registry);
        self.registry.clear();
        self.is_loaded = false;
    }
}
