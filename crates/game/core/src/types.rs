use std::fmt;

/// Unique identifier for any actor known to the world (players and hostiles).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EntityId(pub u32);

impl EntityId {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// World location in game units. Only the planar components take part in
/// range checks; `z` is carried so move commands keep the original height.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Position {
    pub const ORIGIN: Self = Self { x: 0, y: 0, z: 0 };

    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Planar (x/y) euclidean distance.
    pub fn distance_2d(&self, other: &Position) -> f64 {
        (self.squared_distance_2d(other) as f64).sqrt()
    }

    /// Returns true when `other` lies strictly inside the planar circle of
    /// `radius` around `self`. A point exactly on the circle is outside.
    pub fn is_in_2d_radius(&self, other: &Position, radius: u32) -> bool {
        let radius = i128::from(radius);
        self.squared_distance_2d(other) < radius * radius
    }

    fn squared_distance_2d(&self, other: &Position) -> i128 {
        let dx = i128::from(self.x) - i128::from(other.x);
        let dy = i128::from(self.y) - i128::from(other.y);
        dx * dx + dy * dy
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Team colouring broadcast to other players while a hunter is running.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr,
)]
#[strum(serialize_all = "snake_case")]
pub enum Team {
    #[default]
    None,
    Blue,
    Red,
}
