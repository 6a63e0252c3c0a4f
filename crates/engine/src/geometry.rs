/// Integer pixel coordinate. Tile and body positions live on this grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Drops the fractional part of both components, toward zero.
    pub fn trunc(self) -> Self {
        Self {
            x: self.x.trunc(),
            y: self.y.trunc(),
        }
    }
}

/// Square collision proxy: covers `[x, x + size] × [y, y + size]`, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Body {
    pub position: Point,
    pub size: i32,
}

impl Body {
    pub const fn new(position: Point, size: i32) -> Self {
        Self { position, size }
    }

    pub fn contains_point(&self, point: Point) -> bool {
        self.position.x <= point.x
            && point.x <= self.position.x + self.size
            && self.position.y <= point.y
            && point.y <= self.position.y + self.size
    }

    pub fn corners(&self) -> [Point; 4] {
        let Point { x, y } = self.position;
        let s = self.size;
        [
            Point::new(x, y),
            Point::new(x + s, y),
            Point::new(x, y + s),
            Point::new(x + s, y + s),
        ]
    }

    /// True when any corner of `self` lies inside `other`. Not symmetric: a body
    /// larger than `other` can contain it without touching.
    pub fn touches(&self, other: &Body) -> bool {
        self.corners()
            .into_iter()
            .any(|corner| other.contains_point(corner))
    }
}

pub fn sign(value: f32) -> i32 {
    if value > 0.0 {
        1
    } else if value < 0.0 {
        -1
    } else {
        0
    }
}

/// Clamps `value` into `[-|asymptote|, |asymptote|]`.
pub fn bound(value: f32, asymptote: f32) -> f32 {
    let limit = asymptote.abs();
    value.clamp(-limit, limit)
}
