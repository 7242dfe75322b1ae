//! Dancer identity and per-dancer state.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::{Facing, Position};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Boy,
    Girl,
}

/// A real dancer: couple number 1-4 and gender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DancerId {
    pub couple: u8,
    pub gender: Gender,
}

impl DancerId {
    pub const fn boy(couple: u8) -> Self {
        Self {
            couple,
            gender: Gender::Boy,
        }
    }

    pub const fn girl(couple: u8) -> Self {
        Self {
            couple,
            gender: Gender::Girl,
        }
    }

    /// Head couples are 1 and 3.
    pub fn is_head(self) -> bool {
        self.couple % 2 == 1
    }

    /// All eight dancers of a square in couple order.
    pub fn all() -> [DancerId; 8] {
        [
            DancerId::boy(1),
            DancerId::girl(1),
            DancerId::boy(2),
            DancerId::girl(2),
            DancerId::boy(3),
            DancerId::girl(3),
            DancerId::boy(4),
            DancerId::girl(4),
        ]
    }
}

impl fmt::Display for DancerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let g = match self.gender {
            Gender::Boy => 'B',
            Gender::Girl => 'G',
        };
        write!(f, "{}{}", self.couple, g)
    }
}

/// Who occupies a spot. Phantoms are numbered only to keep them distinct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Person {
    Real(DancerId),
    Phantom(u8),
}

impl Person {
    pub fn id(self) -> Option<DancerId> {
        match self {
            Person::Real(id) => Some(id),
            Person::Phantom(_) => None,
        }
    }

    pub fn is_phantom(self) -> bool {
        matches!(self, Person::Phantom(_))
    }
}

/// Direction of the last turning motion, consumed by "and roll".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RollDirection {
    Right,
    Left,
}

impl RollDirection {
    pub fn from_turn(quarters: i32) -> Option<Self> {
        match quarters.signum() {
            1 => Some(RollDirection::Right),
            -1 => Some(RollDirection::Left),
            _ => None,
        }
    }

    pub fn quarters(self) -> i32 {
        match self {
            RollDirection::Right => 1,
            RollDirection::Left => -1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dancer {
    pub person: Person,
    pub position: Position,
    pub facing: Facing,
    #[serde(default)]
    pub roll: Option<RollDirection>,
}

impl Dancer {
    pub fn new(person: Person, position: Position, facing: Facing) -> Self {
        Self {
            person,
            position,
            facing,
            roll: None,
        }
    }

    pub fn real(id: DancerId, x: i32, y: i32, facing: Facing) -> Self {
        Self::new(Person::Real(id), Position::new(x, y), facing)
    }

    pub fn phantom(n: u8, x: i32, y: i32, facing: Facing) -> Self {
        Self::new(Person::Phantom(n), Position::new(x, y), facing)
    }

    pub fn id(&self) -> Option<DancerId> {
        self.person.id()
    }

    pub fn is_phantom(&self) -> bool {
        self.person.is_phantom()
    }

    /// Three-character label for diagrams, e.g. `1B^`.
    pub fn label(&self) -> String {
        match self.person {
            Person::Real(id) => format!("{}{}", id, self.facing.glyph()),
            Person::Phantom(_) => format!(" .{}", self.facing.glyph()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heads_are_odd_couples() {
        assert!(DancerId::boy(1).is_head());
        assert!(DancerId::girl(3).is_head());
        assert!(!DancerId::boy(2).is_head());
    }

    #[test]
    fn test_label_includes_facing_glyph() {
        let d = Dancer::real(DancerId::girl(2), 3, 1, Facing::WEST);
        assert_eq!(d.label(), "2G<");
        assert_eq!(Dancer::phantom(0, 0, 0, Facing::NORTH).label(), " .^");
    }

    #[test]
    fn test_roll_direction_from_turn() {
        assert_eq!(RollDirection::from_turn(2), Some(RollDirection::Right));
        assert_eq!(RollDirection::from_turn(-1), Some(RollDirection::Left));
        assert_eq!(RollDirection::from_turn(0), None);
    }
}
