/// One play session: a character and the pager that streams the map around it.
pub(crate) struct PlatformerScene {
    config: GameConfig,
    source: Rc<dyn PixelSource>,
    character_id: Option<EntityId>,
}

impl PlatformerScene {
    pub(crate) fn new(config: GameConfig, source: Rc<dyn PixelSource>) -> Self {
        Self {
            config,
            source,
            character_id: None,
        }
    }

    fn character<'a>(&self, registry: &'a EntityRegistry) -> Option<&'a Character> {
        self.character_id
            .and_then(|id| registry.get_as::<Character>(id))
    }

    fn current_page(registry: &EntityRegistry) -> Option<PageCoord> {
        registry
            .iter()
            .find(|(_, entity)| entity.kind() == EntityKind::Pager)
            .and_then(|(_, entity)| entity.as_any().downcast_ref::<WorldPager>())
            .and_then(WorldPager::page)
    }
}

impl Scene for PlatformerScene {
    fn load(&mut self, registry: &mut EntityRegistry) -> Result<(), SimError> {
        let config = &self.config;
        let character = Character::new(
            config.spawn_point(),
            config.character,
            config.channels,
            config.tile_size,
        );
        self.character_id = Some(registry.add(character));

        let mut pager = WorldPager::new(
            Rc::clone(&self.source),
            config.tile_size,
            config.page_extent,
        );
        let [pagex, pagey] = config.start_page;
        pager.load(registry, pagex, pagey, false)?;
        registry.add(pager);

        info!(
            spawn_x = config.spawn[0],
            spawn_y = config.spawn[1],
            pagex,
            pagey,
            entity_count = registry.len(),
            "session_started"
        );
        Ok(())
    }

    fn update(
        &mut self,
        input: &InputSnapshot,
        releases: &mut KeyReleaseTracker,
        registry: &mut EntityRegistry,
    ) -> Result<SceneCommand, SimError> {
        if input.quit_requested() {
            return Ok(SceneCommand::Quit);
        }
        registry.update(input, releases)?;
        Ok(SceneCommand::None)
    }

    fn unload(&mut self, registry: &mut EntityRegistry) {
        info!(entity_count = registry.len(), "session_ended");
        self.character_id = None;
    }

    fn debug_title(&self, registry: &EntityRegistry) -> Option<String> {
        let character = self.character(registry)?;
        let page = Self::current_page(registry)?;
        Some(format!(
            "{} | page ({}, {}) | {}",
            self.config.window_title,
            page.x,
            page.y,
            character.channels().label()
        ))
    }
}

pub(crate) fn build_scene(config: GameConfig, source: Rc<dyn PixelSource>) -> Box<dyn Scene> {
    Box::new(PlatformerScene::new(config, source))
}
