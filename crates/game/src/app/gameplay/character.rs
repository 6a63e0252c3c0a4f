#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum Facing {
    #[default]
    Right,
    Left,
    Up,
    Down,
}

impl Facing {
    /// First held direction wins, in the order right, left, up, down.
    fn from_input(input: &InputSnapshot) -> Option<Self> {
        [
            (InputAction::MoveRight, Facing::Right),
            (InputAction::MoveLeft, Facing::Left),
            (InputAction::MoveUp, Facing::Up),
            (InputAction::MoveDown, Facing::Down),
        ]
        .into_iter()
        .find(|(action, _)| input.is_down(*action))
        .map(|(_, facing)| facing)
    }

    fn unit(self) -> (i32, i32) {
        match self {
            Facing::Right => (1, 0),
            Facing::Left => (-1, 0),
            Facing::Up => (0, -1),
            Facing::Down => (0, 1),
        }
    }
}

const CHARACTER_SPRITE_CELL: (u32, u32) = (0, 0);
const CHARACTER_FALLBACK_COLOR: [u8; 4] = [232, 200, 64, 255];

/// The player body. Moves one axis at a time so each push-out only has to
/// undo motion along that axis.
pub(crate) struct Character {
    body: Body,
    velocity: Vec2,
    on_ground: bool,
    facing: Facing,
    channels: Channels,
    tuning: CharacterTuning,
    capabilities: Capabilities,
    sprite_cell_size: u32,
}

impl Character {
    pub(crate) fn new(
        spawn: Point,
        tuning: CharacterTuning,
        channels: Channels,
        tile_size: i32,
    ) -> Self {
        Self {
            body: Body::new(spawn, tuning.size),
            velocity: Vec2::ZERO,
            on_ground: false,
            facing: Facing::default(),
            channels,
            tuning,
            capabilities: Capabilities::FALLABLE | Capabilities::HEALTHABLE,
            sprite_cell_size: u32::try_from(tile_size).unwrap_or(0),
        }
    }

    #[cfg(test)]
    pub(crate) fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub(crate) fn position(&self) -> Point {
        self.body.position
    }

    pub(crate) fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub(crate) fn on_ground(&self) -> bool {
        self.on_ground
    }

    pub(crate) fn facing(&self) -> Facing {
        self.facing
    }

    pub(crate) fn channels(&self) -> Channels {
        self.channels
    }

    fn cast(&self, registry: &mut EntityRegistry, page_px: i32) {
        let size = self.tuning.projectile_size;
        let half_gap = (self.body.size - size) / 2;
        let origin = self.body.position.offset(half_gap, half_gap);
        let (ux, uy) = self.facing.unit();
        let speed = self.tuning.projectile_speed;
        let id = registry.add(Projectile::new(
            origin,
            size,
            (ux * speed, uy * speed),
            page_px,
        ));
        debug!(
            projectile = id.0,
            x = origin.x,
            y = origin.y,
            facing = ?self.facing,
            "projectile_spawned"
        );
    }

    fn steer_horizontal(&mut self, input: &InputSnapshot) {
        let direction =
            input.axis_value(InputAction::MoveRight) - input.axis_value(InputAction::MoveLeft);
        let opposes = direction != 0 && sign(self.velocity.x) == -direction;
        if direction == 0 || opposes {
            self.velocity.x *= self.tuning.side_decay;
        } else {
            let accel = direction as f32 * self.tuning.side_accel;
            self.velocity.x = bound(self.velocity.x + accel, self.tuning.side_max);
        }
    }

    fn steer_vertical(&mut self, input: &InputSnapshot, registry: &EntityRegistry) {
        let tuning = self.tuning;
        if self.on_ground && input.is_down(InputAction::Jump) {
            // Launch tick: gravity does not eat into the impulse.
            self.velocity.y -= tuning.jump_impulse;
        } else if self.channels.blue && touching_water(registry, &self.body) {
            let stroke =
                input.axis_value(InputAction::MoveDown) - input.axis_value(InputAction::MoveUp);
            self.velocity.y += stroke as f32 * tuning.swim_accel;
            self.velocity.y *= tuning.water_decay;
        } else if self.capabilities.contains(Capabilities::FALLABLE) {
            self.velocity.y += tuning.gravity;
        }
        self.velocity.y = bound(self.velocity.y, tuning.terminal_speed);
    }

    fn toggle_channels(&mut self, releases: &mut KeyReleaseTracker) {
        let toggles = [
            (InputAction::ToggleRed, &mut self.channels.red, "red"),
            (InputAction::ToggleGreen, &mut self.channels.green, "green"),
            (InputAction::ToggleBlue, &mut self.channels.blue, "blue"),
        ];
        for (action, channel, name) in toggles {
            if releases.was_released(action) {
                *channel = !*channel;
                info!(channel = name, enabled = *channel, "channel_toggled");
            }
        }
    }
}

/// Finds the single registered pager and the pixel extent of its pages.
fn locate_pager(registry: &EntityRegistry) -> Result<(EntityId, i32), SimError> {
    let id = registry.get_one(|entity| entity.kind() == EntityKind::Pager)?;
    let page_px = registry
        .get_as::<WorldPager>(id)
        .map(WorldPager::page_extent_px)
        .ok_or(RegistryError::Unavailable { id })?;
    Ok((id, page_px))
}

/// Pages `body` reaches into besides the current one, as offsets. Bounds are
/// inclusive, so a body flush with an edge already reaches across it.
fn neighbour_offsets(body: &Body, page_px: i32) -> Vec<(i32, i32)> {
    let reach = |start: i32| {
        let mut steps = vec![0];
        if start <= 0 {
            steps.push(-1);
        }
        if start + body.size >= page_px {
            steps.push(1);
        }
        steps
    };
    let rows = reach(body.position.y);
    reach(body.position.x)
        .into_iter()
        .flat_map(|dx| rows.iter().map(move |&dy| (dx, dy)))
        .filter(|&offset| offset != (0, 0))
        .collect()
}

/// Walls of neighbouring pages that `body` overlaps, in current-page
/// coordinates.
fn edge_walls(
    registry: &mut EntityRegistry,
    pager_id: EntityId,
    body: &Body,
    page_px: i32,
) -> Result<Vec<Body>, SimError> {
    let offsets = neighbour_offsets(body, page_px);
    if offsets.is_empty() {
        return Ok(Vec::new());
    }
    let walls = registry.with_entity_as::<WorldPager, _>(pager_id, |pager, _| {
        let mut walls = Vec::new();
        for (dx, dy) in offsets {
            walls.extend(pager.neighbour_walls(dx, dy, body)?);
        }
        Ok::<_, PagerError>(walls)
    })??;
    Ok(walls)
}

/// Shifts the pager by one axis when `local` left the page along it and
/// returns the re-based coordinate.
fn cross_page(
    registry: &mut EntityRegistry,
    pager_id: EntityId,
    local: i32,
    page_px: i32,
    horizontal: bool,
) -> Result<i32, SimError> {
    let delta = page_delta(local, page_px);
    if delta == 0 {
        return Ok(local);
    }
    let (dx, dy) = if horizontal { (delta, 0) } else { (0, delta) };
    registry
        .with_entity_as::<WorldPager, _>(pager_id, |pager, registry| {
            pager.load(registry, dx, dy, true)
        })??;
    // Projectiles live in the coordinates of the page they were cast in.
    registry.delete_all(|entity| entity.kind() == EntityKind::Projectile);
    Ok(local - delta * page_px)
}

impl Entity for Character {
    fn kind(&self) -> EntityKind {
        EntityKind::Character
    }

    fn capabilities(&self) -> Capabilities {
        self.capabilities
    }

    fn body(&self) -> Option<Body> {
        Some(self.body)
    }

    fn depth(&self) -> Option<i32> {
        Some(CHARACTER_DEPTH)
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<(), SimError> {
        let (pager_id, page_px) = locate_pager(ctx.registry)?;
        let input = ctx.input;

        if let Some(facing) = Facing::from_input(input) {
            self.facing = facing;
        }
        if input.was_pressed(InputAction::Cast) && self.channels.red {
            self.cast(ctx.registry, page_px);
        }

        self.steer_horizontal(input);
        self.steer_vertical(input, ctx.registry);

        // Each axis resolves against this page and any neighbour the body
        // reaches into, then crosses only if the settled body left the page.
        let moved_x = self.velocity.x.trunc();
        self.body.position.x += moved_x as i32;
        let edge = edge_walls(ctx.registry, pager_id, &self.body, page_px)?;
        if resolve_collision_among(ctx.registry, &edge, &mut self.body, moved_x, 0.0)? {
            self.velocity.x = 0.0;
        }
        self.velocity = self.velocity.trunc();
        let x = self.body.position.x;
        self.body.position.x = cross_page(ctx.registry, pager_id, x, page_px, true)?;

        let moved_y = self.velocity.y;
        self.body.position.y += moved_y as i32;
        let edge = edge_walls(ctx.registry, pager_id, &self.body, page_px)?;
        self.on_ground = touching_ground_among(ctx.registry, &edge, &self.body);
        if resolve_collision_among(ctx.registry, &edge, &mut self.body, 0.0, moved_y)? {
            self.velocity.y = 0.0;
        }
        let y = self.body.position.y;
        self.body.position.y = cross_page(ctx.registry, pager_id, y, page_px, false)?;

        self.toggle_channels(ctx.releases);
        Ok(())
    }

    fn render(&self, surface: &mut dyn Surface) {
        let (cell_x, cell_y) = CHARACTER_SPRITE_CELL;
        surface.blit(
            &Drawable::Sprite {
                key: SpriteKey::new(TILE_SHEET, cell_x, cell_y, self.sprite_cell_size),
                fallback: CHARACTER_FALLBACK_COLOR,
            },
            self.body.position,
            self.body.size,
        );
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
