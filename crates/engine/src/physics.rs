//! Tile collision queries and unit-step push-out.

use thiserror::Error;

use crate::app::{Capabilities, EntityRegistry};
use crate::geometry::{sign, Body, Point};

/// Horizontal inset of the two foot points from the body's edges.
pub const FOOT_INSET: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum CollisionError {
    #[error("collision can only be resolved along one axis at a time, got ({dx}, {dy})")]
    BothAxes { dx: f32, dy: f32 },
}

fn bodies_with(
    registry: &EntityRegistry,
    capability: Capabilities,
) -> impl Iterator<Item = Body> + '_ {
    registry
        .iter()
        .filter(move |(_, entity)| entity.capabilities().contains(capability))
        .filter_map(|(_, entity)| entity.body())
}

fn walls<'a>(registry: &'a EntityRegistry, extra: &'a [Body]) -> impl Iterator<Item = Body> + 'a {
    bodies_with(registry, Capabilities::WALL).chain(extra.iter().copied())
}

pub fn touching_wall(registry: &EntityRegistry, body: &Body) -> bool {
    touching_wall_among(registry, &[], body)
}

/// Like [`touching_wall`], also counting `extra` walls that are not
/// registered, such as the edge of a neighbouring page.
pub fn touching_wall_among(registry: &EntityRegistry, extra: &[Body], body: &Body) -> bool {
    walls(registry, extra).any(|wall| body.touches(&wall))
}

pub fn touching_water(registry: &EntityRegistry, body: &Body) -> bool {
    bodies_with(registry, Capabilities::WATER).any(|water| body.touches(&water))
}

pub fn foot_points(body: &Body) -> [Point; 2] {
    let y = body.position.y + body.size;
    [
        Point::new(body.position.x + FOOT_INSET, y),
        Point::new(body.position.x + body.size - FOOT_INSET, y),
    ]
}

/// Whether either foot point rests inside a wall.
pub fn touching_ground(registry: &EntityRegistry, body: &Body) -> bool {
    touching_ground_among(registry, &[], body)
}

pub fn touching_ground_among(registry: &EntityRegistry, extra: &[Body], body: &Body) -> bool {
    let feet = foot_points(body);
    walls(registry, extra).any(|wall| feet.iter().any(|foot| wall.contains_point(*foot)))
}

/// Steps `body` back one pixel at a time against the sign of the moving axis
/// while it overlaps a wall, for at most `|dx|` or `|dy|` steps. Returns
/// whether the body moved.
pub fn resolve_collision(
    registry: &EntityRegistry,
    body: &mut Body,
    dx: f32,
    dy: f32,
) -> Result<bool, CollisionError> {
    resolve_collision_among(registry, &[], body, dx, dy)
}

pub fn resolve_collision_among(
    registry: &EntityRegistry,
    extra: &[Body],
    body: &mut Body,
    dx: f32,
    dy: f32,
) -> Result<bool, CollisionError> {
    if dx != 0.0 && dy != 0.0 {
        return Err(CollisionError::BothAxes { dx, dy });
    }

    let (step_x, step_y, mut remaining) = if dx != 0.0 {
        (-sign(dx), 0, dx.abs())
    } else {
        (0, -sign(dy), dy.abs())
    };

    let mut collided = false;
    while remaining > 0.0 && touching_wall_among(registry, extra, body) {
        collided = true;
        body.position = body.position.offset(step_x, step_y);
        remaining -= 1.0;
    }
    Ok(collided)
}
