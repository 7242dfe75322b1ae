//! Formations: a classified set of dancers in canonical coordinates.
//!
//! A [`Formation`] is always stored in the canonical coordinates of its
//! [`SetupKind`], in either orientation. Building one from raw positions
//! rank-compresses them; any arrangement that fits no known kind is rejected
//! with [`CallError::UnrecognizedSetup`]. Square kinds (2x2 and the squared
//! set) are always tagged horizontal, so equal arrangements compare equal
//! however they were built.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::dancer::{Dancer, DancerId, Person, RollDirection};
use crate::error::CallError;
use crate::geometry::{Axis, Facing, Position};
use crate::setup::{classify_positions, Orientation, SetupKind};

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Formation {
    kind: SetupKind,
    orientation: Orientation,
    dancers: Vec<Dancer>,
}

/// Maps canonical coordinates of a compressed formation back onto the
/// coordinates the dancers had before compression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxisMap {
    xs: Vec<(i32, i32)>,
    ys: Vec<(i32, i32)>,
}

impl AxisMap {
    fn affine(pairs: &[(i32, i32)]) -> Option<(i32, i32)> {
        let &(c0, o0) = pairs.first()?;
        if pairs.len() == 1 {
            return Some((1, o0 - c0));
        }
        let &(c1, o1) = pairs.get(1)?;
        if c1 == c0 || (o1 - o0) % (c1 - c0) != 0 {
            return None;
        }
        let scale = (o1 - o0) / (c1 - c0);
        let shift = o0 - scale * c0;
        if scale <= 0 || pairs.iter().any(|&(c, o)| scale * c + shift != o) {
            return None;
        }
        Some((scale, shift))
    }

    fn map_value(pairs: &[(i32, i32)], v: i32) -> Option<i32> {
        if let Some(&(_, o)) = pairs.iter().find(|&&(c, _)| c == v) {
            return Some(o);
        }
        let (scale, shift) = Self::affine(pairs)?;
        Some(scale * v + shift)
    }

    /// Maps a canonical position back, or `None` if it falls between spots
    /// of a spread arrangement.
    pub fn map(&self, p: Position) -> Option<Position> {
        Some(Position::new(
            Self::map_value(&self.xs, p.x)?,
            Self::map_value(&self.ys, p.y)?,
        ))
    }

    /// The map that leaves every coordinate of `formation` where it is.
    pub fn identity(formation: &Formation) -> AxisMap {
        let values = |f: &dyn Fn(&Dancer) -> i32| {
            let mut v: Vec<i32> = formation.dancers.iter().map(f).collect();
            v.sort_unstable();
            v.dedup();
            v.into_iter().map(|c| (c, c)).collect()
        };
        AxisMap {
            xs: values(&|d| d.position.x),
            ys: values(&|d| d.position.y),
        }
    }

    /// This map followed by `outer`.
    pub fn then(&self, outer: &AxisMap) -> Option<AxisMap> {
        let compose = |pairs: &[(i32, i32)], outer: &[(i32, i32)]| {
            pairs
                .iter()
                .map(|&(c, o)| Self::map_value(outer, o).map(|v| (c, v)))
                .collect::<Option<Vec<_>>>()
        };
        Some(AxisMap {
            xs: compose(&self.xs, &outer.xs)?,
            ys: compose(&self.ys, &outer.ys)?,
        })
    }

    /// The same map seen through a reflection across the y axis.
    pub fn mirrored_x(&self) -> AxisMap {
        let mut xs: Vec<(i32, i32)> = self.xs.iter().map(|&(c, o)| (-c, -o)).collect();
        xs.sort_unstable();
        AxisMap {
            xs,
            ys: self.ys.clone(),
        }
    }
}

fn sort_dancers(dancers: &mut [Dancer]) {
    dancers.sort_by(|a, b| {
        b.position
            .y
            .cmp(&a.position.y)
            .then(a.position.x.cmp(&b.position.x))
    });
}

impl Formation {
    /// Classifies and compresses a set of dancers.
    ///
    /// Two real dancers on one spot is an error; a phantom that collides with
    /// anybody is dropped.
    pub fn new(dancers: Vec<Dancer>) -> Result<Formation, CallError> {
        Self::compress(dancers).map(|(f, _)| f)
    }

    /// Like [`Formation::new`], also returning the map from the new canonical
    /// coordinates back to the input coordinates.
    pub fn compress(dancers: Vec<Dancer>) -> Result<(Formation, AxisMap), CallError> {
        let mut kept: Vec<Dancer> = Vec::with_capacity(dancers.len());
        let mut by_spot: BTreeMap<Position, usize> = BTreeMap::new();
        for d in dancers {
            match by_spot.get(&d.position).copied() {
                None => {
                    by_spot.insert(d.position, kept.len());
                    kept.push(d);
                }
                Some(i) => {
                    if d.is_phantom() {
                        continue;
                    }
                    if kept[i].is_phantom() {
                        kept[i] = d;
                        continue;
                    }
                    return Err(CallError::UnrecognizedSetup(format!(
                        "{} and {} on the same spot",
                        describe(&kept[i]),
                        describe(&d)
                    )));
                }
            }
        }
        if kept.is_empty() {
            return Err(CallError::UnrecognizedSetup("no dancers".to_string()));
        }

        let raw: Vec<Position> = kept.iter().map(|d| d.position).collect();
        let class = classify_positions(&raw)?;

        let mut xs = BTreeMap::new();
        let mut ys = BTreeMap::new();
        for (d, c) in kept.iter_mut().zip(&class.canonical) {
            xs.insert(c.x, d.position.x);
            ys.insert(c.y, d.position.y);
            d.position = *c;
        }
        sort_dancers(&mut kept);

        let map = AxisMap {
            xs: xs.into_iter().collect(),
            ys: ys.into_iter().collect(),
        };
        Ok((
            Formation {
                kind: class.kind,
                orientation: class.orientation,
                dancers: kept,
            },
            map,
        ))
    }

    /// The home squared set: couple 1 at the bottom facing north, numbered
    /// counterclockwise, boys on the left of their partners.
    pub fn home() -> Formation {
        let dancers = vec![
            Dancer::real(DancerId::boy(1), -1, -3, Facing::NORTH),
            Dancer::real(DancerId::girl(1), 1, -3, Facing::NORTH),
            Dancer::real(DancerId::boy(2), 3, -1, Facing::WEST),
            Dancer::real(DancerId::girl(2), 3, 1, Facing::WEST),
            Dancer::real(DancerId::boy(3), 1, 3, Facing::SOUTH),
            Dancer::real(DancerId::girl(3), -1, 3, Facing::SOUTH),
            Dancer::real(DancerId::boy(4), -3, 1, Facing::EAST),
            Dancer::real(DancerId::girl(4), -3, -1, Facing::EAST),
        ];
        let mut dancers = dancers;
        sort_dancers(&mut dancers);
        Formation {
            kind: SetupKind::SquaredSet,
            orientation: Orientation::Horizontal,
            dancers,
        }
    }

    /// Determines the setup kind of a raw arrangement without building a
    /// formation from it.
    pub fn classify(dancers: &[Dancer]) -> Result<SetupKind, CallError> {
        let positions: Vec<Position> = dancers.iter().map(|d| d.position).collect();
        classify_positions(&positions).map(|c| c.kind)
    }

    pub fn kind(&self) -> SetupKind {
        self.kind
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    /// Dancers sorted top row first, left to right.
    pub fn dancers(&self) -> &[Dancer] {
        &self.dancers
    }

    pub fn len(&self) -> usize {
        self.dancers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dancers.is_empty()
    }

    pub fn has_phantoms(&self) -> bool {
        self.dancers.iter().any(Dancer::is_phantom)
    }

    pub fn dancer(&self, id: DancerId) -> Option<&Dancer> {
        self.dancers.iter().find(|d| d.id() == Some(id))
    }

    pub fn person(&self, person: Person) -> Option<&Dancer> {
        self.dancers.iter().find(|d| d.person == person)
    }

    pub fn at(&self, p: Position) -> Option<&Dancer> {
        self.dancers.iter().find(|d| d.position == p)
    }

    /// Unit vector along the long axis.
    pub fn long_axis(&self) -> Position {
        match self.orientation {
            Orientation::Horizontal => Position::new(1, 0),
            Orientation::Vertical => Position::new(0, 1),
        }
    }

    /// Coordinate of `p` along the long axis.
    pub fn long(&self, p: Position) -> i32 {
        match self.orientation {
            Orientation::Horizontal => p.x,
            Orientation::Vertical => p.y,
        }
    }

    /// Coordinate of `p` along the short axis.
    pub fn short(&self, p: Position) -> i32 {
        match self.orientation {
            Orientation::Horizontal => p.y,
            Orientation::Vertical => p.x,
        }
    }

    /// Rotates the whole formation clockwise about the center.
    pub fn rotate(&self, quarters: i32) -> Formation {
        let mut dancers: Vec<Dancer> = self
            .dancers
            .iter()
            .map(|d| Dancer {
                position: d.position.rotated(quarters),
                facing: d.facing.rotated(quarters),
                ..*d
            })
            .collect();
        sort_dancers(&mut dancers);
        let orientation = if self.kind.is_square() {
            Orientation::Horizontal
        } else {
            self.orientation.rotated(quarters)
        };
        Formation {
            kind: self.kind,
            orientation,
            dancers,
        }
    }

    /// Reflects the formation across an axis line. Roll directions swap.
    pub fn mirror(&self, axis: Axis) -> Formation {
        let mut dancers: Vec<Dancer> = self
            .dancers
            .iter()
            .map(|d| Dancer {
                position: d.position.mirrored(axis),
                facing: d.facing.mirrored(axis),
                roll: d.roll.map(|r| match r {
                    RollDirection::Right => RollDirection::Left,
                    RollDirection::Left => RollDirection::Right,
                }),
                ..*d
            })
            .collect();
        sort_dancers(&mut dancers);
        Formation {
            kind: self.kind,
            orientation: self.orientation,
            dancers,
        }
    }

    /// Copy of the formation with every roll direction cleared.
    pub fn without_roll(&self) -> Formation {
        let mut f = self.clone();
        for d in &mut f.dancers {
            d.roll = None;
        }
        f
    }

    /// The minimal representative over the rotations that leave the long
    /// axis horizontal (all four for square kinds), with roll cleared.
    /// Formations that differ only by a rotation canonicalize to the same
    /// value.
    pub fn canonicalize(&self) -> Formation {
        let mut best = self.without_roll();
        for q in 1..4 {
            let candidate = self.rotate(q).without_roll();
            if candidate.orientation == Orientation::Horizontal
                && (best.orientation == Orientation::Vertical || candidate.key() < best.key())
            {
                best = candidate;
            }
        }
        best
    }

    fn key(&self) -> Vec<(Person, u8)> {
        self.dancers
            .iter()
            .map(|d| (d.person, d.facing.eighths()))
            .collect()
    }

    /// Descriptive name of the arrangement, e.g. "eight chain thru".
    pub fn name(&self) -> String {
        naming::name(self)
    }

    /// Plain text diagram, one line per row.
    pub fn diagram(&self) -> String {
        let mut xs: Vec<i32> = self.dancers.iter().map(|d| d.position.x).collect();
        xs.sort_unstable();
        xs.dedup();
        let mut out = String::new();
        let mut rows: Vec<i32> = self.dancers.iter().map(|d| d.position.y).collect();
        rows.sort_unstable_by(|a, b| b.cmp(a));
        rows.dedup();
        for y in rows {
            let mut line = String::new();
            for &x in &xs {
                match self.at(Position::new(x, y)) {
                    Some(d) => line.push_str(&d.label()),
                    None => line.push_str("   "),
                }
                line.push_str("  ");
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
        out
    }
}

impl fmt::Display for Formation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.diagram())
    }
}

fn describe(d: &Dancer) -> String {
    match d.person {
        Person::Real(id) => id.to_string(),
        Person::Phantom(n) => format!("phantom {}", n),
    }
}

/// Straight-line distance between two dancers in half-position units.
pub fn distance_between(a: &Dancer, b: &Dancer) -> f64 {
    (a.position.to(b.position).length_squared() as f64).sqrt()
}

/// True when two dancers stand on neighbouring spots of the grid.
pub fn is_adjacent(a: &Dancer, b: &Dancer) -> bool {
    let v = a.position.to(b.position);
    v.length_squared() == 4 && (v.x == 0 || v.y == 0)
}

mod naming {
    use super::Formation;
    use crate::geometry::Facing;
    use crate::setup::SetupKind;

    /// Facing letter relative to a horizontal long axis.
    fn letter(f: Facing) -> char {
        match f.eighths() {
            0 => 'N',
            2 => 'E',
            4 => 'S',
            6 => 'W',
            _ => '?',
        }
    }

    fn rows(f: &Formation) -> Vec<String> {
        let h = if f.long_axis().x == 0 {
            f.rotate(1)
        } else {
            f.clone()
        };
        let mut ys: Vec<i32> = h.dancers().iter().map(|d| d.position.y).collect();
        ys.sort_unstable_by(|a, b| b.cmp(a));
        ys.dedup();
        ys.into_iter()
            .map(|y| {
                h.dancers()
                    .iter()
                    .filter(|d| d.position.y == y)
                    .map(|d| letter(d.facing))
                    .collect()
            })
            .collect()
    }

    fn lateral(row: &str) -> bool {
        row.chars().all(|c| c == 'N' || c == 'S')
    }

    fn alternating(row: &str) -> bool {
        lateral(row) && row.chars().zip(row.chars().skip(1)).all(|(a, b)| a != b)
    }

    fn paired(row: &str) -> bool {
        row == "NNSS" || row == "SSNN"
    }

    pub(super) fn name(f: &Formation) -> String {
        let rows = rows(f);
        let one = rows.first().map(String::as_str).unwrap_or("");
        let two = rows.get(1).map(String::as_str).unwrap_or("");
        let named = match f.kind() {
            SetupKind::SquaredSet => Some("squared set"),
            SetupKind::Diamond => Some("diamond"),
            SetupKind::QuarterTag => Some("quarter tag"),
            SetupKind::OneByTwo => match one {
                "EW" => Some("facing dancers"),
                "WE" => Some("back-to-back dancers"),
                "NN" | "SS" => Some("couple"),
                "NS" | "SN" => Some("mini-wave"),
                _ => None,
            },
            SetupKind::OneByFour => {
                if alternating(one) {
                    Some("ocean wave")
                } else if paired(one) {
                    Some("two-faced line")
                } else if lateral(one) {
                    Some("line")
                } else if one.chars().all(|c| c == 'E' || c == 'W') {
                    Some("single file")
                } else {
                    None
                }
            }
            SetupKind::OneByEight => {
                if alternating(one) {
                    Some("grand wave")
                } else if lateral(one) {
                    Some("grand line")
                } else {
                    None
                }
            }
            SetupKind::TwoByTwo => match (one, two) {
                ("SS", "NN") | ("EW", "EW") => Some("facing couples"),
                ("NN", "SS") | ("WE", "WE") => Some("back-to-back couples"),
                _ => Some("box"),
            },
            SetupKind::TwoByFour => match (one, two) {
                ("EEWW", "EEWW") => Some("double pass thru"),
                ("WWEE", "WWEE") => Some("completed double pass thru"),
                ("EWEW", "EWEW") => Some("eight chain thru"),
                ("WEWE", "WEWE") => Some("trade by"),
                ("EEEE", "WWWW") | ("WWWW", "EEEE") => Some("columns"),
                ("SSSS", "NNNN") => Some("facing lines"),
                ("NNNN", "SSSS") => Some("lines facing out"),
                _ if alternating(one) && alternating(two) => Some("parallel waves"),
                _ if paired(one) && paired(two) => Some("two-faced lines"),
                _ if lateral(one) && lateral(two) => Some("parallel lines"),
                _ if (one.chars().chain(two.chars())).any(|c| c == 'E' || c == 'W')
                    && (one.chars().chain(two.chars())).any(|c| c == 'N' || c == 'S') =>
                {
                    Some("t-bone")
                }
                _ => None,
            },
        };
        named
            .map(str::to_string)
            .unwrap_or_else(|| f.kind().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn heads_in_middle() -> Formation {
        Formation::new(vec![
            Dancer::real(DancerId::boy(1), -1, -1, Facing::NORTH),
            Dancer::real(DancerId::girl(1), 1, -1, Facing::NORTH),
            Dancer::real(DancerId::boy(3), 1, 1, Facing::SOUTH),
            Dancer::real(DancerId::girl(3), -1, 1, Facing::SOUTH),
            Dancer::real(DancerId::boy(2), 3, -1, Facing::WEST),
            Dancer::real(DancerId::girl(2), 3, 1, Facing::WEST),
            Dancer::real(DancerId::boy(4), -3, 1, Facing::EAST),
            Dancer::real(DancerId::girl(4), -3, -1, Facing::EAST),
        ])
        .unwrap()
    }

    #[test]
    fn test_home_is_a_classified_squared_set() {
        let home = Formation::home();
        let rebuilt = Formation::new(home.dancers().to_vec()).unwrap();
        assert_eq!(rebuilt, home);
        assert_eq!(home.name(), "squared set");
    }

    #[test]
    fn test_new_compresses_and_sorts() {
        let f = Formation::new(vec![
            Dancer::real(DancerId::boy(1), -4, 0, Facing::NORTH),
            Dancer::real(DancerId::girl(1), 4, 0, Facing::SOUTH),
        ])
        .unwrap();
        assert_eq!(f.kind(), SetupKind::OneByTwo);
        assert_eq!(f.dancers()[0].position, Position::new(-1, 0));
        assert_eq!(f.dancers()[1].position, Position::new(1, 0));
        assert_eq!(f.name(), "mini-wave");
    }

    #[test]
    fn test_compress_map_restores_original_spots() {
        let (f, map) = Formation::compress(vec![
            Dancer::real(DancerId::boy(1), -1, -3, Facing::NORTH),
            Dancer::real(DancerId::girl(1), 1, -3, Facing::NORTH),
            Dancer::real(DancerId::boy(3), 1, 3, Facing::SOUTH),
            Dancer::real(DancerId::girl(3), -1, 3, Facing::SOUTH),
        ])
        .unwrap();
        assert_eq!(f.kind(), SetupKind::TwoByTwo);
        assert_eq!(map.map(Position::new(-1, -1)), Some(Position::new(-1, -3)));
        assert_eq!(map.map(Position::new(0, 0)), Some(Position::new(0, 0)));
        assert_eq!(map.map(Position::new(3, 1)), Some(Position::new(3, 3)));

        let identity = AxisMap::identity(&f);
        assert_eq!(identity.then(&map), Some(map.clone()));
        let flipped = map.mirrored_x();
        assert_eq!(flipped.map(Position::new(1, -1)), Some(Position::new(1, -3)));
    }

    #[test]
    fn test_real_collision_is_rejected_phantom_collision_dropped() {
        let err = Formation::new(vec![
            Dancer::real(DancerId::boy(1), 0, 0, Facing::NORTH),
            Dancer::real(DancerId::girl(1), 0, 0, Facing::SOUTH),
        ])
        .unwrap_err();
        assert!(matches!(err, CallError::UnrecognizedSetup(_)));

        let f = Formation::new(vec![
            Dancer::real(DancerId::boy(1), -1, 0, Facing::NORTH),
            Dancer::phantom(0, -1, 0, Facing::SOUTH),
            Dancer::real(DancerId::girl(1), 1, 0, Facing::NORTH),
        ])
        .unwrap();
        assert_eq!(f.len(), 2);
        assert!(!f.has_phantoms());
    }

    #[test]
    fn test_canonicalize_is_rotation_invariant() {
        let f = heads_in_middle();
        assert_eq!(f.rotate(1).canonicalize(), f.canonicalize());
        assert_eq!(f.rotate(2).canonicalize(), f.canonicalize());
        assert_eq!(
            Formation::home().rotate(3).canonicalize(),
            Formation::home().canonicalize()
        );
        assert_ne!(f.mirror(Axis::Y).canonicalize(), f.canonicalize());
    }

    #[test]
    fn test_rebuilt_rotation_matches_rotate() {
        let home = Formation::home();
        for q in 1..4 {
            let turned = home.rotate(q);
            let rebuilt = Formation::new(turned.dancers().to_vec()).unwrap();
            assert_eq!(rebuilt, turned);
            assert_eq!(rebuilt.canonicalize(), home.canonicalize());
        }
        let lines = heads_in_middle().rotate(1);
        let rebuilt = Formation::new(lines.dancers().to_vec()).unwrap();
        assert_eq!(rebuilt.canonicalize(), heads_in_middle().canonicalize());
        assert_eq!(Formation::classify(home.dancers()), Ok(SetupKind::SquaredSet));
    }

    #[test]
    fn test_geometry_helpers() {
        let f = heads_in_middle();
        let b1 = f.dancer(DancerId::boy(1)).unwrap();
        let g1 = f.dancer(DancerId::girl(1)).unwrap();
        let g3 = f.dancer(DancerId::girl(3)).unwrap();
        assert!(is_adjacent(b1, g1));
        assert!(is_adjacent(b1, g3));
        assert_eq!(distance_between(b1, g1), 2.0);
        assert!(!is_adjacent(g1, g3));
    }

    #[test]
    fn test_mirror_swaps_sides() {
        let f = heads_in_middle().mirror(Axis::Y);
        let b1 = f.dancer(DancerId::boy(1)).unwrap();
        assert_eq!(b1.position, Position::new(1, -1));
        let g2 = f.dancer(DancerId::girl(2)).unwrap();
        assert_eq!(g2.facing, Facing::EAST);
    }

    #[test]
    fn test_names() {
        let lines = heads_in_middle();
        assert_eq!(lines.name(), "t-bone");
        let dpt = Formation::new(vec![
            Dancer::real(DancerId::boy(3), -3, 1, Facing::EAST),
            Dancer::real(DancerId::boy(4), -1, 1, Facing::EAST),
            Dancer::real(DancerId::girl(2), 1, 1, Facing::WEST),
            Dancer::real(DancerId::girl(3), 3, 1, Facing::WEST),
            Dancer::real(DancerId::girl(1), -3, -1, Facing::EAST),
            Dancer::real(DancerId::girl(4), -1, -1, Facing::EAST),
            Dancer::real(DancerId::boy(2), 1, -1, Facing::WEST),
            Dancer::real(DancerId::boy(1), 3, -1, Facing::WEST),
        ])
        .unwrap();
        assert_eq!(dpt.name(), "double pass thru");
        assert_eq!(dpt.rotate(1).name(), "double pass thru");
    }

    #[test]
    fn test_diagram_rows() {
        let text = Formation::home().diagram();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("3Gv"));
        assert!(lines[3].contains("1B^"));
    }
}
