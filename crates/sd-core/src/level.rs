//! Dance program levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A program level. Ordering follows difficulty, so `level <= session_level`
/// is the legality test.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Basic,
    Mainstream,
    #[default]
    Plus,
    A1,
    A2,
    C1,
    C2,
    C3a,
}

impl Level {
    pub const ALL: [Level; 8] = [
        Level::Basic,
        Level::Mainstream,
        Level::Plus,
        Level::A1,
        Level::A2,
        Level::C1,
        Level::C2,
        Level::C3a,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Level::Basic => "basic",
            Level::Mainstream => "mainstream",
            Level::Plus => "plus",
            Level::A1 => "a1",
            Level::A2 => "a2",
            Level::C1 => "c1",
            Level::C2 => "c2",
            Level::C3a => "c3a",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Level {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        match wanted.as_str() {
            "ms" => return Ok(Level::Mainstream),
            "c3" => return Ok(Level::C3a),
            _ => {}
        }
        Level::ALL
            .iter()
            .copied()
            .find(|l| l.name() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown level '{}' (expected one of: {})",
                    s,
                    Level::ALL.map(Level::name).join(", ")
                )
            })
    }
}
