//! Setup kinds and classification of raw dancer geometry.
//!
//! Each kind is described by canonical coordinate tables for its long and
//! short axis plus the set of occupied spots, all in the horizontal
//! orientation (long axis along x). Classification rank-compresses the
//! distinct x and y values of an arrangement and looks for a kind whose
//! occupancy pattern matches in either orientation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::CallError;
use crate::geometry::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SetupKind {
    #[serde(rename = "1x2")]
    OneByTwo,
    #[serde(rename = "1x4")]
    OneByFour,
    #[serde(rename = "1x8")]
    OneByEight,
    #[serde(rename = "2x2")]
    TwoByTwo,
    #[serde(rename = "2x4")]
    TwoByFour,
    #[serde(rename = "diamond")]
    Diamond,
    #[serde(rename = "qtag")]
    QuarterTag,
    #[serde(rename = "squared set")]
    SquaredSet,
}

/// Which grid axis the long side of a setup lies along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Horizontal,
    Vertical,
}

impl Orientation {
    pub fn rotated(self, quarters: i32) -> Orientation {
        if quarters.rem_euclid(2) == 0 {
            self
        } else {
            match self {
                Orientation::Horizontal => Orientation::Vertical,
                Orientation::Vertical => Orientation::Horizontal,
            }
        }
    }
}

const LONG_2: &[i32] = &[-1, 1];
const LONG_4: &[i32] = &[-3, -1, 1, 3];
const LONG_8: &[i32] = &[-7, -5, -3, -1, 1, 3, 5, 7];
const LINE: &[i32] = &[0];
const DIAMOND_LONG: &[i32] = &[-3, 0, 3];
const DIAMOND_SHORT: &[i32] = &[-1, 0, 1];
const QTAG_SHORT: &[i32] = &[-2, 0, 2];

impl SetupKind {
    pub const ALL: [SetupKind; 8] = [
        SetupKind::OneByTwo,
        SetupKind::OneByFour,
        SetupKind::OneByEight,
        SetupKind::TwoByTwo,
        SetupKind::TwoByFour,
        SetupKind::Diamond,
        SetupKind::QuarterTag,
        SetupKind::SquaredSet,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SetupKind::OneByTwo => "1x2",
            SetupKind::OneByFour => "1x4",
            SetupKind::OneByEight => "1x8",
            SetupKind::TwoByTwo => "2x2",
            SetupKind::TwoByFour => "2x4",
            SetupKind::Diamond => "diamond",
            SetupKind::QuarterTag => "qtag",
            SetupKind::SquaredSet => "squared set",
        }
    }

    /// Canonical coordinates along the long axis, by rank.
    pub fn long_values(self) -> &'static [i32] {
        match self {
            SetupKind::OneByTwo | SetupKind::TwoByTwo => LONG_2,
            SetupKind::OneByFour
            | SetupKind::TwoByFour
            | SetupKind::QuarterTag
            | SetupKind::SquaredSet => LONG_4,
            SetupKind::OneByEight => LONG_8,
            SetupKind::Diamond => DIAMOND_LONG,
        }
    }

    /// Canonical coordinates along the short axis, by rank.
    pub fn short_values(self) -> &'static [i32] {
        match self {
            SetupKind::OneByTwo | SetupKind::OneByFour | SetupKind::OneByEight => LINE,
            SetupKind::TwoByTwo | SetupKind::TwoByFour => LONG_2,
            SetupKind::Diamond => DIAMOND_SHORT,
            SetupKind::QuarterTag => QTAG_SHORT,
            SetupKind::SquaredSet => LONG_4,
        }
    }

    /// Occupied spots in the horizontal orientation.
    pub fn spots(self) -> Vec<Position> {
        let grid = |long: &[i32], short: &[i32]| {
            short
                .iter()
                .flat_map(|&y| long.iter().map(move |&x| Position::new(x, y)))
                .collect::<Vec<_>>()
        };
        match self {
            SetupKind::Diamond => vec![
                Position::new(-3, 0),
                Position::new(3, 0),
                Position::new(0, -1),
                Position::new(0, 1),
            ],
            SetupKind::QuarterTag => vec![
                Position::new(-1, 2),
                Position::new(1, 2),
                Position::new(-3, 0),
                Position::new(-1, 0),
                Position::new(1, 0),
                Position::new(3, 0),
                Position::new(-1, -2),
                Position::new(1, -2),
            ],
            SetupKind::SquaredSet => vec![
                Position::new(-1, 3),
                Position::new(1, 3),
                Position::new(-3, 1),
                Position::new(3, 1),
                Position::new(-3, -1),
                Position::new(3, -1),
                Position::new(-1, -3),
                Position::new(1, -3),
            ],
            _ => grid(self.long_values(), self.short_values()),
        }
    }

    pub fn size(self) -> usize {
        self.spots().len()
    }

    /// True when the long and short axes have the same coordinates, so a
    /// quarter turn maps the kind onto itself.
    pub fn is_square(self) -> bool {
        self.long_values() == self.short_values()
    }

    /// True for the 1xN kinds, whose dancers all stand on one line.
    pub fn is_line(self) -> bool {
        matches!(
            self,
            SetupKind::OneByTwo | SetupKind::OneByFour | SetupKind::OneByEight
        )
    }

    /// Kinds this one can be split into when no scheme fits it directly.
    pub fn divides_into(self) -> &'static [SetupKind] {
        match self {
            SetupKind::OneByFour | SetupKind::TwoByTwo => &[SetupKind::OneByTwo],
            SetupKind::OneByEight => &[SetupKind::OneByFour],
            SetupKind::TwoByFour => &[SetupKind::TwoByTwo, SetupKind::OneByFour],
            _ => &[],
        }
    }

    /// Every kind from which a call defined for `self` can be reached by
    /// repeated division, including `self`.
    pub fn reachable_from(self) -> BTreeSet<SetupKind> {
        let mut out = BTreeSet::new();
        out.insert(self);
        loop {
            let before = out.len();
            for kind in SetupKind::ALL {
                if kind.divides_into().iter().any(|k| out.contains(k)) {
                    out.insert(kind);
                }
            }
            if out.len() == before {
                return out;
            }
        }
    }
}

impl fmt::Display for SetupKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SetupKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        SetupKind::ALL
            .iter()
            .copied()
            .find(|k| k.name() == wanted)
            .ok_or_else(|| format!("unknown setup kind '{}'", s))
    }
}

/// Result of classifying a set of spots: the kind, its orientation, and the
/// canonical position of every input spot (same order as the input).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub kind: SetupKind,
    pub orientation: Orientation,
    pub canonical: Vec<Position>,
}

fn distinct(values: impl Iterator<Item = i32>) -> Vec<i32> {
    let set: BTreeSet<i32> = values.collect();
    set.into_iter().collect()
}

fn rank(values: &[i32], v: i32) -> usize {
    values.iter().position(|&x| x == v).unwrap_or(0)
}

/// Determines the setup kind of a set of distinct spots.
pub fn classify_positions(positions: &[Position]) -> Result<Classification, CallError> {
    let unique: BTreeSet<Position> = positions.iter().copied().collect();
    if unique.len() != positions.len() {
        return Err(CallError::UnrecognizedSetup(
            "two dancers on the same spot".to_string(),
        ));
    }
    let xs = distinct(positions.iter().map(|p| p.x));
    let ys = distinct(positions.iter().map(|p| p.y));

    for kind in SetupKind::ALL {
        if kind.size() != positions.len() {
            continue;
        }
        let spots: BTreeSet<Position> = kind.spots().into_iter().collect();
        let long = kind.long_values();
        let short = kind.short_values();
        for orientation in [Orientation::Horizontal, Orientation::Vertical] {
            let (along, across) = match orientation {
                Orientation::Horizontal => (&xs, &ys),
                Orientation::Vertical => (&ys, &xs),
            };
            if along.len() != long.len() || across.len() != short.len() {
                continue;
            }
            let canonical: Vec<Position> = positions
                .iter()
                .map(|p| {
                    let (l, s) = match orientation {
                        Orientation::Horizontal => (p.x, p.y),
                        Orientation::Vertical => (p.y, p.x),
                    };
                    let cl = long[rank(along, l)];
                    let cs = short[rank(across, s)];
                    match orientation {
                        Orientation::Horizontal => Position::new(cl, cs),
                        Orientation::Vertical => Position::new(cs, cl),
                    }
                })
                .collect();
            let horizontal: BTreeSet<Position> = canonical
                .iter()
                .map(|p| match orientation {
                    Orientation::Horizontal => *p,
                    Orientation::Vertical => Position::new(p.y, p.x),
                })
                .collect();
            if horizontal == spots {
                return Ok(Classification {
                    kind,
                    orientation,
                    canonical,
                });
            }
        }
    }

    Err(CallError::UnrecognizedSetup(format!(
        "{} dancers in a {}x{} arrangement",
        positions.len(),
        xs.len(),
        ys.len()
    )))
}
