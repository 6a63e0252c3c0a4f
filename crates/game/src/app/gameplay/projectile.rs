const FIREBALL_COLOR: [u8; 4] = [255, 96, 32, 255];

/// A fireball. Flies in a straight line until it hits a wall or leaves the
/// page.
pub(crate) struct Projectile {
    body: Body,
    velocity: (i32, i32),
    page_px: i32,
}

impl Projectile {
    pub(crate) fn new(position: Point, size: i32, velocity: (i32, i32), page_px: i32) -> Self {
        Self {
            body: Body::new(position, size),
            velocity,
            page_px,
        }
    }

    pub(crate) fn position(&self) -> Point {
        self.body.position
    }

    pub(crate) fn velocity(&self) -> (i32, i32) {
        self.velocity
    }

    fn left_page(&self) -> bool {
        let Point { x, y } = self.body.position;
        let page = 0..self.page_px;
        !page.contains(&x) || !page.contains(&y)
    }
}

impl Entity for Projectile {
    fn kind(&self) -> EntityKind {
        EntityKind::Projectile
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::PROJECTILE
    }

    fn body(&self) -> Option<Body> {
        Some(self.body)
    }

    fn depth(&self) -> Option<i32> {
        Some(PROJECTILE_DEPTH)
    }

    fn update(&mut self, ctx: &mut UpdateContext<'_>) -> Result<(), SimError> {
        let (vx, vy) = self.velocity;
        self.body.position = self.body.position.offset(vx, vy);

        let reason = if touching_wall(ctx.registry, &self.body) {
            "hit_wall"
        } else if self.left_page() {
            "left_page"
        } else {
            return Ok(());
        };
        ctx.registry.delete(ctx.id);
        debug!(projectile = ctx.id.0, reason, "projectile_despawned");
        Ok(())
    }

    fn render(&self, surface: &mut dyn Surface) {
        surface.blit(
            &Drawable::Solid(FIREBALL_COLOR),
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
