//! Integer floor geometry: spots, displacement vectors, headings and hands.
//!
//! All coordinates are in half-position units with the center of the set at
//! the origin, so two dancers standing next to each other are 2 apart.
//! Headings are stored in eighths of a turn, clockwise from north.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A spot on the floor, or a displacement between two spots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub const ORIGIN: Position = Position::new(0, 0);

    /// Returns `self + v * scale`.
    pub fn offset(self, v: Position, scale: i32) -> Position {
        Position::new(self.x + v.x * scale, self.y + v.y * scale)
    }

    /// Vector pointing from `self` to `other`.
    pub fn to(self, other: Position) -> Position {
        Position::new(other.x - self.x, other.y - self.y)
    }

    pub fn dot(self, other: Position) -> i32 {
        self.x * other.x + self.y * other.y
    }

    pub fn length_squared(self) -> i32 {
        self.dot(self)
    }

    /// Rotates about the origin by the given number of clockwise quarter turns.
    pub fn rotated(self, quarters: i32) -> Position {
        match quarters.rem_euclid(4) {
            0 => self,
            1 => Position::new(self.y, -self.x),
            2 => Position::new(-self.x, -self.y),
            _ => Position::new(-self.y, self.x),
        }
    }

    /// Reflects across the given axis line through the origin.
    pub fn mirrored(self, axis: Axis) -> Position {
        match axis {
            Axis::X => Position::new(self.x, -self.y),
            Axis::Y => Position::new(-self.x, self.y),
        }
    }

    /// Clockwise angle from north in degrees, used for ring ordering.
    pub fn bearing(self) -> f64 {
        let deg = (self.x as f64).atan2(self.y as f64).to_degrees();
        if deg < 0.0 {
            deg + 360.0
        } else {
            deg
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// An axis line used for reflections: `X` is the horizontal line `y = 0`,
/// `Y` the vertical line `x = 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

/// A heading in eighths of a turn, clockwise from north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Facing(u8);

impl Facing {
    pub const NORTH: Facing = Facing(0);
    pub const EAST: Facing = Facing(2);
    pub const SOUTH: Facing = Facing(4);
    pub const WEST: Facing = Facing(6);

    pub fn from_eighths(eighths: i32) -> Self {
        Facing(eighths.rem_euclid(8) as u8)
    }

    pub fn eighths(self) -> u8 {
        self.0
    }

    /// True for the four compass headings that lie along a grid axis.
    pub fn is_axial(self) -> bool {
        self.0 % 2 == 0
    }

    /// Turns by a number of quarter turns (positive is to the right).
    pub fn turned(self, quarters: i32) -> Facing {
        Facing::from_eighths(self.0 as i32 + quarters * 2)
    }

    pub fn opposite(self) -> Facing {
        self.turned(2)
    }

    /// Unit vector straight ahead, if the heading is axial.
    pub fn forward(self) -> Option<Position> {
        match self.0 {
            0 => Some(Position::new(0, 1)),
            2 => Some(Position::new(1, 0)),
            4 => Some(Position::new(0, -1)),
            6 => Some(Position::new(-1, 0)),
            _ => None,
        }
    }

    /// Unit vector to the dancer's right, if the heading is axial.
    pub fn right(self) -> Option<Position> {
        self.turned(1).forward()
    }

    /// True if this heading points along the x axis (east or west).
    pub fn is_horizontal(self) -> bool {
        self.0 == 2 || self.0 == 6
    }

    /// Heading that points along a non-zero axial vector.
    pub fn along(v: Position) -> Option<Facing> {
        match (v.x.signum(), v.y.signum()) {
            (0, 1) => Some(Facing::NORTH),
            (1, 0) => Some(Facing::EAST),
            (0, -1) => Some(Facing::SOUTH),
            (-1, 0) => Some(Facing::WEST),
            _ => None,
        }
    }

    pub fn rotated(self, quarters: i32) -> Facing {
        self.turned(quarters)
    }

    pub fn mirrored(self, axis: Axis) -> Facing {
        match axis {
            Axis::X => Facing::from_eighths(4 - self.0 as i32),
            Axis::Y => Facing::from_eighths(8 - self.0 as i32),
        }
    }

    /// Arrow glyph used in text diagrams.
    pub fn glyph(self) -> char {
        match self.0 {
            0 => '^',
            2 => '>',
            4 => 'v',
            6 => '<',
            _ => '*',
        }
    }
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self.0 {
            0 => "north",
            1 => "northeast",
            2 => "east",
            3 => "southeast",
            4 => "south",
            5 => "southwest",
            6 => "west",
            _ => "northwest",
        };
        f.write_str(name)
    }
}

/// Which hand (or side) a movement refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hand {
    Right,
    Left,
}

impl Hand {
    pub fn opposite(self) -> Hand {
        match self {
            Hand::Right => Hand::Left,
            Hand::Left => Hand::Right,
        }
    }

    /// Sign of lateral offsets on this side: +1 for right, -1 for left.
    pub fn sign(self) -> i32 {
        match self {
            Hand::Right => 1,
            Hand::Left => -1,
        }
    }
}

impl fmt::Display for Hand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hand::Right => f.write_str("right"),
            Hand::Left => f.write_str("left"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_turning_wraps_around() {
        assert_eq!(Facing::NORTH.turned(1), Facing::EAST);
        assert_eq!(Facing::NORTH.turned(-1), Facing::WEST);
        assert_eq!(Facing::WEST.turned(3), Facing::SOUTH);
        assert_eq!(Facing::SOUTH.opposite(), Facing::NORTH);
    }

    #[test]
    fn test_forward_and_right_vectors() {
        assert_eq!(Facing::NORTH.forward(), Some(Position::new(0, 1)));
        assert_eq!(Facing::NORTH.right(), Some(Position::new(1, 0)));
        assert_eq!(Facing::WEST.right(), Some(Position::new(0, 1)));
        assert_eq!(Facing::from_eighths(1).forward(), None);
    }

    #[test]
    fn test_rotation_matches_turning() {
        let p = Position::new(0, 3);
        let rotated = p.rotated(1);
        assert_eq!(rotated, Position::new(3, 0));
        assert_eq!(Facing::along(rotated), Some(Facing::NORTH.rotated(1)));
        assert_eq!(p.rotated(4), p);
    }

    #[test]
    fn test_mirror_swaps_east_and_west() {
        assert_eq!(Facing::EAST.mirrored(Axis::Y), Facing::WEST);
        assert_eq!(Facing::NORTH.mirrored(Axis::Y), Facing::NORTH);
        assert_eq!(Facing::NORTH.mirrored(Axis::X), Facing::SOUTH);
        assert_eq!(Position::new(3, 1).mirrored(Axis::Y), Position::new(-3, 1));
    }

    #[test]
    fn test_bearing_is_clockwise_from_north() {
        assert_eq!(Position::new(0, 1).bearing(), 0.0);
        assert_eq!(Position::new(1, 0).bearing(), 90.0);
        assert_eq!(Position::new(-1, 0).bearing(), 270.0);
    }
}
