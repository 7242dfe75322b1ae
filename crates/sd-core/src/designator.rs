//! Designators: words that pick out a subset of the dancers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::dancer::{Dancer, Gender, Person};
use crate::formation::Formation;
use crate::setup::SetupKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Designator {
    Heads,
    Sides,
    Boys,
    Girls,
    Centers,
    Ends,
    Leaders,
    Trailers,
    Everyone,
}

impl Designator {
    pub const ALL: [Designator; 9] = [
        Designator::Heads,
        Designator::Sides,
        Designator::Boys,
        Designator::Girls,
        Designator::Centers,
        Designator::Ends,
        Designator::Leaders,
        Designator::Trailers,
        Designator::Everyone,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Designator::Heads => "heads",
            Designator::Sides => "sides",
            Designator::Boys => "boys",
            Designator::Girls => "girls",
            Designator::Centers => "centers",
            Designator::Ends => "ends",
            Designator::Leaders => "leaders",
            Designator::Trailers => "trailers",
            Designator::Everyone => "everyone",
        }
    }

    /// Recognizes a single designator word, including common synonyms.
    pub fn from_word(word: &str) -> Option<Designator> {
        match word {
            "heads" | "head" => Some(Designator::Heads),
            "sides" | "side" => Some(Designator::Sides),
            "boys" | "men" => Some(Designator::Boys),
            "girls" | "ladies" => Some(Designator::Girls),
            "centers" | "centres" => Some(Designator::Centers),
            "ends" => Some(Designator::Ends),
            "leaders" | "leads" => Some(Designator::Leaders),
            "trailers" => Some(Designator::Trailers),
            "everyone" | "everybody" | "all" => Some(Designator::Everyone),
            _ => None,
        }
    }

    /// Whether one dancer of `formation` is designated.
    pub fn matches(self, formation: &Formation, dancer: &Dancer) -> bool {
        let id = match dancer.person {
            Person::Real(id) => Some(id),
            Person::Phantom(_) => None,
        };
        match self {
            Designator::Heads => id.is_some_and(|id| id.is_head()),
            Designator::Sides => id.is_some_and(|id| !id.is_head()),
            Designator::Boys => id.is_some_and(|id| id.gender == Gender::Boy),
            Designator::Girls => id.is_some_and(|id| id.gender == Gender::Girl),
            Designator::Centers => id.is_some() && is_center(formation, dancer),
            Designator::Ends => id.is_some() && is_end(formation, dancer),
            Designator::Leaders => id.is_some() && is_leader(formation, dancer),
            Designator::Trailers => id.is_some() && is_trailer(formation, dancer),
            Designator::Everyone => id.is_some(),
        }
    }

    /// Everybody in `formation` this designator picks out.
    pub fn select(self, formation: &Formation) -> BTreeSet<Person> {
        formation
            .dancers()
            .iter()
            .filter(|d| self.matches(formation, d))
            .map(|d| d.person)
            .collect()
    }
}

impl fmt::Display for Designator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Designator {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Designator::from_word(&s.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown designator '{}'", s))
    }
}

/// Center of a line-like setup: the middle half along the long axis. In a
/// quarter tag the centers are the center line.
pub(crate) fn is_center(formation: &Formation, dancer: &Dancer) -> bool {
    match formation.kind() {
        SetupKind::QuarterTag => formation.short(dancer.position) == 0,
        SetupKind::OneByTwo | SetupKind::TwoByTwo | SetupKind::SquaredSet => false,
        _ => {
            let max = formation
                .dancers()
                .iter()
                .map(|d| formation.long(d.position).abs())
                .max()
                .unwrap_or(0);
            2 * formation.long(dancer.position).abs() <= max
        }
    }
}

pub(crate) fn is_end(formation: &Formation, dancer: &Dancer) -> bool {
    match formation.kind() {
        SetupKind::OneByTwo | SetupKind::TwoByTwo | SetupKind::SquaredSet => false,
        _ => !is_center(formation, dancer),
    }
}

fn occupied_ahead(formation: &Formation, dancer: &Dancer, steps: i32) -> Option<bool> {
    let forward = dancer.facing.forward()?;
    Some(formation.at(dancer.position.offset(forward, 2 * steps)).is_some())
}

/// Nobody directly ahead, somebody directly behind.
pub(crate) fn is_leader(formation: &Formation, dancer: &Dancer) -> bool {
    occupied_ahead(formation, dancer, 1) == Some(false)
        && occupied_ahead(formation, dancer, -1) == Some(true)
}

/// Somebody directly ahead.
pub(crate) fn is_trailer(formation: &Formation, dancer: &Dancer) -> bool {
    occupied_ahead(formation, dancer, 1) == Some(true)
}
