//! The evaluator: runs a [`CallBody`] on a [`Formation`].
//!
//! Schemes written for the unit's own setup are tried first. If none of them
//! applies the unit is divided into smaller units and the body is tried on
//! every piece. Every way of doing the call that works is collected; zero
//! means the call does not apply, more than one distinct result means it is
//! ambiguous.

use std::collections::BTreeSet;

use tracing::trace;

use crate::body::{ArrayCall, CallBody, Pairing};
use crate::calls::model::{FaceDirection, Movement, Restriction, Role, Scheme, SchemeSetup};
use crate::dancer::{Dancer, Gender, Person, RollDirection};
use crate::designator::{self, Designator};
use crate::formation::{is_adjacent, AxisMap, Formation};
use crate::geometry::{Axis, Hand, Position};
use crate::setup::SetupKind;

/// Why a body could not be run. Ordered by how informative it is.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rejection {
    NotApplicable(String),
    Ambiguous(Vec<String>),
    Unrecognized(String),
}

impl Rejection {
    fn not_applicable(msg: impl Into<String>) -> Self {
        Rejection::NotApplicable(msg.into())
    }
}

/// A result together with the map from its canonical coordinates back into
/// the frame of the formation the body was run on.
type Placed = (Formation, AxisMap);
type Outcome = Result<Placed, Rejection>;

fn between_spots() -> Rejection {
    Rejection::not_applicable("dancers would end between spots")
}

/// Runs a body on a formation.
pub fn execute(body: &CallBody, formation: &Formation) -> Result<Formation, Rejection> {
    run(body, formation).map(|(f, _)| f)
}

fn run(body: &CallBody, formation: &Formation) -> Outcome {
    match body {
        CallBody::Array(call) => run_array(call, formation),
        CallBody::Sequence(items) => {
            let mut current = formation.clone();
            let mut map = AxisMap::identity(formation);
            for item in items {
                let (next, step) = run(item, &current)?;
                map = step.then(&map).ok_or_else(between_spots)?;
                current = next;
            }
            Ok((current, map))
        }
        CallBody::Selective { who, body } => run_selective(*who, body, formation),
        CallBody::Paired { pairing, body } => run_paired(*pairing, body, formation),
        CallBody::Mirrored(body) => {
            let (f, map) = run(body, &formation.mirror(Axis::Y))?;
            Ok((f.mirror(Axis::Y), map.mirrored_x()))
        }
        CallBody::Roll => {
            let rolled = roll(formation)?;
            let map = AxisMap::identity(&rolled);
            Ok((rolled, map))
        }
        CallBody::StepToWave { touch, body } => match run(body, formation) {
            Ok(placed) => Ok(placed),
            Err(first) => {
                trace!("retrying after step to a wave");
                let (touched, touch_map) = run(touch, formation).map_err(|_| first.clone())?;
                let (f, map) = run(body, &touched).map_err(|_| first.clone())?;
                let map = map.then(&touch_map).ok_or(first)?;
                Ok((f, map))
            }
        },
    }
}

fn roll(formation: &Formation) -> Result<Formation, Rejection> {
    let dancers = formation
        .dancers()
        .iter()
        .map(|d| match d.roll {
            Some(r) => Dancer {
                facing: d.facing.turned(r.quarters()),
                ..*d
            },
            None => *d,
        })
        .collect();
    Formation::new(dancers).map_err(|e| Rejection::not_applicable(e.to_string()))
}

/// Picks the answer out of a set of successful results.
fn settle(results: Vec<Placed>, failures: Vec<Rejection>, context: &str) -> Outcome {
    let mut distinct: Vec<Placed> = Vec::new();
    for r in results {
        if !distinct.contains(&r) {
            distinct.push(r);
        }
    }
    match distinct.len() {
        0 => Err(failures
            .into_iter()
            .max()
            .unwrap_or_else(|| Rejection::not_applicable(format!("cannot do it from {}", context)))),
        1 => Ok(distinct.remove(0)),
        _ => Err(Rejection::Ambiguous(
            distinct.iter().map(|(f, _)| f.name()).collect(),
        )),
    }
}

fn run_array(call: &ArrayCall, formation: &Formation) -> Outcome {
    if call.real_only && formation.has_phantoms() {
        return Err(Rejection::not_applicable("phantoms cannot do this call"));
    }
    let selected = call.designator.map(|d| d.select(formation));
    run_array_unit(call, selected.as_ref(), formation)
}

fn scheme_fits(setup: SchemeSetup, kind: SetupKind, grand: bool) -> bool {
    match setup {
        SchemeSetup::Any => true,
        SchemeSetup::Kind(k) => {
            k == kind || (grand && k == SetupKind::OneByFour && kind == SetupKind::OneByEight)
        }
    }
}

fn run_array_unit(
    call: &ArrayCall,
    selected: Option<&BTreeSet<Person>>,
    unit: &Formation,
) -> Outcome {
    let mut results = Vec::new();
    let mut failures = Vec::new();
    for scheme in &call.schemes {
        if !scheme_fits(scheme.setup, unit.kind(), call.grand) {
            continue;
        }
        let mut variants = vec![scheme.clone()];
        if scheme.mirror {
            variants.push(scheme.mirrored());
        }
        for variant in &variants {
            match apply_scheme(variant, unit, selected) {
                Ok(f) => results.push(f),
                Err(e) => failures.push(e),
            }
        }
    }
    if !results.is_empty() {
        return settle(results, failures, unit.kind().name());
    }

    for pieces in divisions(unit) {
        match run_division(unit, &pieces, &|sub| run_array_unit(call, selected, sub)) {
            Ok(f) => results.push(f),
            Err(e) => failures.push(e),
        }
    }
    settle(results, failures, unit.kind().name())
}

/// Ways of splitting a unit into smaller units, each a list of pieces of
/// dancer indices.
fn divisions(unit: &Formation) -> Vec<Vec<Vec<usize>>> {
    let by_long_rank = |groups: &[&[usize]]| -> Vec<Vec<usize>> {
        let mut longs: Vec<i32> = unit
            .dancers()
            .iter()
            .map(|d| unit.long(d.position))
            .collect();
        longs.sort_unstable();
        longs.dedup();
        groups
            .iter()
            .map(|ranks| {
                unit.dancers()
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| {
                        let r = longs
                            .iter()
                            .position(|&l| l == unit.long(d.position))
                            .unwrap_or(usize::MAX);
                        ranks.contains(&r)
                    })
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect()
    };
    let by_coordinate = |coord: &dyn Fn(Position) -> i32| -> Vec<Vec<usize>> {
        let mut values: Vec<i32> = unit.dancers().iter().map(|d| coord(d.position)).collect();
        values.sort_unstable();
        values.dedup();
        values
            .into_iter()
            .map(|v| {
                unit.dancers()
                    .iter()
                    .enumerate()
                    .filter(|(_, d)| coord(d.position) == v)
                    .map(|(i, _)| i)
                    .collect()
            })
            .collect()
    };

    match unit.kind() {
        SetupKind::OneByFour => vec![by_long_rank(&[&[0, 1], &[2, 3]])],
        SetupKind::OneByEight => vec![by_long_rank(&[&[0, 1, 2, 3], &[4, 5, 6, 7]])],
        SetupKind::TwoByTwo => vec![
            by_coordinate(&|p| unit.short(p)),
            by_coordinate(&|p| unit.long(p)),
        ],
        SetupKind::TwoByFour => vec![
            by_long_rank(&[&[0, 1], &[2, 3]]),
            by_coordinate(&|p| unit.short(p)),
        ],
        _ => Vec::new(),
    }
}

/// Runs `run` on every piece and puts the results back together.
fn run_division(
    unit: &Formation,
    pieces: &[Vec<usize>],
    run_piece: &dyn Fn(&Formation) -> Outcome,
) -> Outcome {
    let mut out = Vec::with_capacity(unit.len());
    for piece in pieces {
        let dancers: Vec<Dancer> = piece.iter().map(|&i| unit.dancers()[i]).collect();
        let (sub, map) =
            Formation::compress(dancers).map_err(|e| Rejection::not_applicable(e.to_string()))?;
        let (result, inner) = run_piece(&sub)?;
        let to_unit = inner.then(&map).ok_or_else(between_spots)?;
        for d in result.dancers() {
            let position = to_unit.map(d.position).ok_or_else(between_spots)?;
            out.push(Dancer { position, ..*d });
        }
    }
    let (merged, map) = Formation::compress(out)
        .map_err(|_| Rejection::not_applicable("the pieces would collide"))?;
    if merged.len() != unit.len() {
        return Err(Rejection::not_applicable("the pieces would collide"));
    }
    Ok((merged, map))
}

// ============================================================================
// Schemes
// ============================================================================

fn apply_scheme(
    scheme: &Scheme,
    unit: &Formation,
    selected: Option<&BTreeSet<Person>>,
) -> Outcome {
    for restriction in scheme.restrictions.to_vec() {
        if !restriction_holds(restriction, scheme.hand, unit, selected) {
            return Err(Rejection::NotApplicable(format!(
                "{} is not {}",
                unit.name(),
                describe_restriction(restriction, scheme.hand)
            )));
        }
    }

    let mut moved = Vec::with_capacity(unit.len());
    for dancer in unit.dancers() {
        let rule = scheme
            .moves
            .iter()
            .find(|rule| {
                rule.who
                    .iter()
                    .all(|role| has_role(*role, unit, dancer, selected))
            })
            .ok_or_else(|| Rejection::not_applicable("somebody has nothing to do"))?;
        let next = apply_movement(rule.movement, unit, dancer)
            .ok_or_else(|| Rejection::not_applicable("a dancer cannot make that move"))?;
        moved.push(next);
    }

    let (result, map) = Formation::compress(moved)
        .map_err(|e| Rejection::not_applicable(format!("dancers would collide ({})", e)))?;
    if result.len() != unit.len() {
        return Err(Rejection::not_applicable("dancers would collide"));
    }
    Ok((result, map))
}

fn describe_restriction(r: Restriction, hand: Option<Hand>) -> String {
    let name = format!("{:?}", r)
        .chars()
        .fold(String::new(), |mut acc, c| {
            if c.is_uppercase() && !acc.is_empty() {
                acc.push(' ');
            }
            acc.push(c.to_ascii_lowercase());
            acc
        });
    match hand {
        Some(h) => format!("a {}-hand {}", h, name),
        None => format!("a {}", name),
    }
}

fn neighbour<'a>(unit: &'a Formation, d: &Dancer, toward: Position) -> Option<&'a Dancer> {
    unit.at(d.position.offset(toward, 2))
}

/// The dancer's partner and the side it is on: the unique lateral neighbour
/// facing the same way, otherwise the unique lateral neighbour.
fn partner<'a>(unit: &'a Formation, d: &Dancer) -> Option<(&'a Dancer, Hand)> {
    let right = d.facing.right()?;
    let sides: Vec<(&Dancer, Hand)> = [(right, Hand::Right), (Position::new(-right.x, -right.y), Hand::Left)]
        .into_iter()
        .filter_map(|(v, hand)| neighbour(unit, d, v).map(|n| (n, hand)))
        .collect();
    let same: Vec<&(&Dancer, Hand)> = sides.iter().filter(|(n, _)| n.facing == d.facing).collect();
    match (same.as_slice(), sides.as_slice()) {
        ([only], _) => Some(**only),
        ([], [only]) => Some(*only),
        _ => None,
    }
}

fn has_role(
    role: Role,
    unit: &Formation,
    d: &Dancer,
    selected: Option<&BTreeSet<Person>>,
) -> bool {
    let id = d.id();
    match role {
        Role::Any => true,
        Role::Beau => matches!(partner(unit, d), Some((_, Hand::Right))),
        Role::Belle => matches!(partner(unit, d), Some((_, Hand::Left))),
        Role::Leader => designator::is_leader(unit, d),
        Role::Trailer => designator::is_trailer(unit, d),
        Role::Center => designator::is_center(unit, d),
        Role::End => designator::is_end(unit, d),
        Role::Selected => selected.is_some_and(|s| s.contains(&d.person)),
        Role::Unselected => selected.is_some_and(|s| !s.contains(&d.person)),
        Role::Boy => id.is_some_and(|i| i.gender == Gender::Boy),
        Role::Girl => id.is_some_and(|i| i.gender == Gender::Girl),
        Role::LeftHalf => center_side(unit, d) > 0,
        Role::RightHalf => center_side(unit, d) < 0,
    }
}

/// Vector from the dancer to the centroid of the unit, scaled by its size.
fn toward_center(unit: &Formation, d: &Dancer) -> Position {
    let n = unit.len() as i32;
    let sum = unit
        .dancers()
        .iter()
        .fold(Position::ORIGIN, |acc, o| acc.offset(o.position, 1));
    Position::new(sum.x - n * d.position.x, sum.y - n * d.position.y)
}

/// +1 when the center of the unit is on the dancer's right, -1 on the left.
fn center_side(unit: &Formation, d: &Dancer) -> i32 {
    d.facing
        .right()
        .map(|r| toward_center(unit, d).dot(r).signum())
        .unwrap_or(0)
}

// ============================================================================
// Restrictions
// ============================================================================

/// Facing perpendicular to the long axis.
fn is_lateral(unit: &Formation, d: &Dancer) -> bool {
    d.facing
        .forward()
        .is_some_and(|f| f.dot(unit.long_axis()) == 0)
}

/// Facing along the long axis: +1 toward increasing long coordinate, -1 the
/// other way, 0 otherwise.
fn along(unit: &Formation, d: &Dancer) -> i32 {
    d.facing
        .forward()
        .map(|f| f.dot(unit.long_axis()))
        .unwrap_or(0)
}

/// Dancers ordered along the long axis, grouped by short coordinate.
fn rows(unit: &Formation) -> Vec<Vec<Dancer>> {
    let mut shorts: Vec<i32> = unit.dancers().iter().map(|d| unit.short(d.position)).collect();
    shorts.sort_unstable();
    shorts.dedup();
    shorts
        .into_iter()
        .map(|s| {
            let mut row: Vec<Dancer> = unit
                .dancers()
                .iter()
                .filter(|d| unit.short(d.position) == s)
                .copied()
                .collect();
            row.sort_by_key(|d| unit.long(d.position));
            row
        })
        .collect()
}

/// Hand of a lateral mini-wave formed by two neighbours, if it is one.
fn miniwave_hand(a: &Dancer, b: &Dancer) -> Option<Hand> {
    if a.facing != b.facing.opposite() {
        return None;
    }
    let right = a.facing.right()?;
    match a.position.to(b.position).dot(right).signum() {
        1 => Some(Hand::Right),
        -1 => Some(Hand::Left),
        _ => None,
    }
}

fn hand_ok(actual: Option<Hand>, wanted: Option<Hand>) -> bool {
    match wanted {
        None => actual.is_some(),
        Some(h) => actual == Some(h),
    }
}

fn line_is_wave(unit: &Formation, row: &[Dancer], hand: Option<Hand>) -> bool {
    row.iter().all(|d| is_lateral(unit, d))
        && row.windows(2).all(|w| w[0].facing == w[1].facing.opposite())
        && row.len() >= 2
        && hand_ok(miniwave_hand(&row[0], &row[1]), hand)
}

fn line_is_two_faced(unit: &Formation, row: &[Dancer], hand: Option<Hand>) -> bool {
    row.len() == 4
        && row.iter().all(|d| is_lateral(unit, d))
        && row[0].facing == row[1].facing
        && row[2].facing == row[3].facing
        && hand_ok(miniwave_hand(&row[1], &row[2]), hand)
}

fn line_of_couples(unit: &Formation, row: &[Dancer]) -> bool {
    row.len() == 4
        && row.iter().all(|d| is_lateral(unit, d))
        && row[0].facing == row[1].facing
        && row[2].facing == row[3].facing
}

fn restriction_holds(
    r: Restriction,
    hand: Option<Hand>,
    unit: &Formation,
    selected: Option<&BTreeSet<Person>>,
) -> bool {
    let ds = unit.dancers();
    let kind = unit.kind();
    match r {
        Restriction::None => true,
        Restriction::Lateral => kind.is_line() && ds.iter().all(|d| is_lateral(unit, d)),
        Restriction::Couple => {
            kind == SetupKind::OneByTwo
                && ds.iter().all(|d| is_lateral(unit, d))
                && ds[0].facing == ds[1].facing
        }
        Restriction::MiniWave => {
            kind == SetupKind::OneByTwo
                && ds.iter().all(|d| is_lateral(unit, d))
                && hand_ok(miniwave_hand(&ds[0], &ds[1]), hand)
        }
        Restriction::FacingPair | Restriction::BackToBack => {
            let sign = if r == Restriction::FacingPair { 1 } else { -1 };
            kind == SetupKind::OneByTwo
                && ds.iter().all(|d| {
                    let other = if d == &ds[0] { &ds[1] } else { &ds[0] };
                    d.facing
                        .forward()
                        .is_some_and(|f| f.dot(d.position.to(other.position)).signum() == sign)
                })
        }
        Restriction::Wave => {
            kind.is_line()
                && kind != SetupKind::OneByTwo
                && rows(unit).iter().all(|row| line_is_wave(unit, row, hand))
        }
        Restriction::TwoFacedLine => {
            kind == SetupKind::OneByFour && line_is_two_faced(unit, &rows(unit)[0], hand)
        }
        Restriction::LineOfCouples => {
            kind == SetupKind::OneByFour && line_of_couples(unit, &rows(unit)[0])
        }
        Restriction::FacingCouples => kind == SetupKind::TwoByTwo && two_by_two_holds(r, unit),
        Restriction::Box => {
            kind == SetupKind::TwoByTwo
                && two_by_two_holds(r, unit)
                && hand.map_or(true, |h| box_hand(unit, h))
        }
        Restriction::Columns => {
            kind == SetupKind::TwoByFour
                && rows(unit).iter().all(|row| {
                    let dir = along(unit, &row[0]);
                    dir != 0 && row.iter().all(|d| along(unit, d) == dir)
                })
        }
        Restriction::TwoFacedLines => {
            kind == SetupKind::TwoByFour
                && rows(unit).iter().all(|row| line_is_two_faced(unit, row, hand))
        }
        Restriction::LinesFacingOut => {
            kind == SetupKind::TwoByFour
                && ds.iter().all(|d| {
                    let out = unit.short(d.position).signum();
                    let short_axis = Position::new(unit.long_axis().y, unit.long_axis().x);
                    d.facing
                        .forward()
                        .is_some_and(|f| f.dot(short_axis) == out)
                })
        }
        Restriction::DoublePassThru => {
            kind == SetupKind::TwoByFour
                && rows(unit).iter().all(|row| {
                    row.len() == 4
                        && along(unit, &row[0]) == 1
                        && along(unit, &row[1]) == 1
                        && along(unit, &row[2]) == -1
                        && along(unit, &row[3]) == -1
                })
        }
        Restriction::OneSelected => selected
            .map(|s| ds.iter().filter(|d| s.contains(&d.person)).count() == 1)
            .unwrap_or(false),
    }
}

/// Facing couples: along some axis, everybody on the negative side faces
/// the positive way and vice versa. Box: along some axis, everybody faces
/// that axis and each line along it is a tandem.
fn two_by_two_holds(r: Restriction, unit: &Formation) -> bool {
    let axes = [Position::new(1, 0), Position::new(0, 1)];
    axes.iter().any(|&axis| {
        let coord = |p: Position| p.dot(axis);
        let dir = |d: &Dancer| d.facing.forward().map(|f| f.dot(axis)).unwrap_or(0);
        let ds = unit.dancers();
        match r {
            Restriction::FacingCouples => ds.iter().all(|d| dir(d) == -coord(d.position).signum()),
            _ => {
                ds.iter().all(|d| dir(d) != 0)
                    && ds.iter().all(|a| {
                        ds.iter()
                            .filter(|b| b.position != a.position)
                            .filter(|b| b.position.to(a.position).dot(axis) != 0)
                            .filter(|b| b.position.to(a.position).length_squared() == 4)
                            .all(|b| b.facing == a.facing)
                    })
            }
        }
    })
}

/// A box is right-handed when every leader has a dancer facing the other
/// way on its right.
fn box_hand(unit: &Formation, hand: Hand) -> bool {
    unit.dancers()
        .iter()
        .filter(|d| designator::is_leader(unit, d))
        .all(|d| {
            d.facing.right().is_some_and(|r| {
                let side = Position::new(r.x * hand.sign(), r.y * hand.sign());
                neighbour(unit, d, side).is_some_and(|n| n.facing == d.facing.opposite())
            })
        })
}

// ============================================================================
// Movements
// ============================================================================

fn turned(d: &Dancer, position: Position, quarters: i32, roll: Option<RollDirection>) -> Dancer {
    Dancer {
        position,
        facing: d.facing.turned(quarters),
        roll,
        ..*d
    }
}

fn apply_movement(movement: Movement, unit: &Formation, d: &Dancer) -> Option<Dancer> {
    let forward = d.facing.forward()?;
    let right = d.facing.right()?;
    match movement {
        Movement::Stand => Some(Dancer { roll: None, ..*d }),
        Movement::Step {
            forward: f,
            right: r,
            turn,
        } => {
            let position = d.position.offset(forward, f).offset(right, r);
            Some(turned(d, position, turn, RollDirection::from_turn(turn)))
        }
        Movement::ToPartner { turn } => {
            let (p, side) = partner(unit, d)?;
            let roll = match side {
                Hand::Right => RollDirection::Right,
                Hand::Left => RollDirection::Left,
            };
            Some(turned(d, p.position, turn, Some(roll)))
        }
        Movement::TradeHands(hand) => {
            let side = Position::new(right.x * hand.sign(), right.y * hand.sign());
            match neighbour(unit, d, side) {
                Some(n) if n.facing == d.facing.opposite() => {
                    let roll = match hand {
                        Hand::Right => RollDirection::Right,
                        Hand::Left => RollDirection::Left,
                    };
                    Some(turned(d, n.position, 2, Some(roll)))
                }
                _ => Some(Dancer { roll: None, ..*d }),
            }
        }
        Movement::Face(direction) => {
            let mut side = toward_center(unit, d).dot(right).signum();
            if direction == FaceDirection::Out {
                side = -side;
            }
            let roll = RollDirection::from_turn(side)?;
            Some(turned(d, d.position, side, Some(roll)))
        }
        Movement::Circulate | Movement::ReverseCirculate => {
            let dir = if movement == Movement::Circulate { 1 } else { -1 };
            if let Some(n) = unit.at(d.position.offset(forward, 2 * dir)) {
                return Some(Dancer {
                    position: n.position,
                    roll: None,
                    ..*d
                });
            }
            let flips: Vec<(&Dancer, RollDirection)> = [
                (right, RollDirection::Right),
                (Position::new(-right.x, -right.y), RollDirection::Left),
            ]
            .into_iter()
            .filter_map(|(v, r)| neighbour(unit, d, v).map(|n| (n, r)))
            .filter(|(n, _)| n.facing == d.facing.opposite())
            .collect();
            match flips.as_slice() {
                [(n, r)] => Some(turned(d, n.position, 2, Some(*r))),
                _ => None,
            }
        }
        Movement::DiamondCirculate | Movement::ReverseDiamondCirculate => {
            let dir = if movement == Movement::DiamondCirculate { 1 } else { -1 };
            let mut candidates: Vec<(i32, Position)> = unit
                .dancers()
                .iter()
                .map(|o| d.position.to(o.position))
                .filter(|v| v.dot(forward) * dir > 0)
                .map(|v| (v.length_squared(), v))
                .collect();
            candidates.sort_unstable();
            let (best, v) = *candidates.first()?;
            if candidates.get(1).is_some_and(|(len, _)| *len == best) {
                return None;
            }
            let side = v.dot(right).signum() * dir;
            let facing = match side {
                0 => d.facing,
                s => d.facing.turned(s),
            };
            Some(Dancer {
                position: d.position.offset(v, 1),
                facing,
                roll: RollDirection::from_turn(side),
                ..*d
            })
        }
    }
}

// ============================================================================
// Selective and paired execution
// ============================================================================

/// Splits the designated dancers into groups that work together: neighbours,
/// or dancers facing each other along a line with nobody else in between.
fn components(formation: &Formation, chosen: &[usize]) -> Vec<Vec<usize>> {
    let ds = formation.dancers();
    let linked = |a: &Dancer, b: &Dancer| -> bool {
        if is_adjacent(a, b) {
            return true;
        }
        let v = a.position.to(b.position);
        if v.x != 0 && v.y != 0 {
            return false;
        }
        let facing_each_other = a.facing.forward().is_some_and(|f| f.dot(v) > 0)
            && b.facing
                .forward()
                .is_some_and(|f| f.dot(Position::new(-v.x, -v.y)) > 0);
        let between = ds.iter().any(|o| {
            let w = a.position.to(o.position);
            o.position != a.position
                && o.position != b.position
                && w.x * v.y == w.y * v.x
                && w.dot(v) > 0
                && w.length_squared() < v.length_squared()
        });
        facing_each_other && !between
    };

    let mut group: Vec<usize> = (0..chosen.len()).collect();
    fn find(group: &mut [usize], i: usize) -> usize {
        let mut root = i;
        while group[root] != root {
            root = group[root];
        }
        group[i] = root;
        root
    }
    for i in 0..chosen.len() {
        for j in (i + 1)..chosen.len() {
            if linked(&ds[chosen[i]], &ds[chosen[j]]) {
                let (a, b) = (find(&mut group, i), find(&mut group, j));
                group[a] = b;
            }
        }
    }
    let mut out: Vec<Vec<usize>> = Vec::new();
    let mut roots: Vec<usize> = Vec::new();
    for i in 0..chosen.len() {
        let root = find(&mut group, i);
        match roots.iter().position(|&r| r == root) {
            Some(k) => out[k].push(chosen[i]),
            None => {
                roots.push(root);
                out.push(vec![chosen[i]]);
            }
        }
    }
    out
}

fn run_selective(who: Designator, body: &CallBody, formation: &Formation) -> Outcome {
    let chosen: Vec<usize> = formation
        .dancers()
        .iter()
        .enumerate()
        .filter(|(_, d)| who.matches(formation, d))
        .map(|(i, _)| i)
        .collect();
    if chosen.is_empty() {
        return Err(Rejection::NotApplicable(format!("there are no {}", who)));
    }
    if chosen.len() == formation.len() {
        return run(body, formation);
    }

    let mut out: Vec<Dancer> = formation
        .dancers()
        .iter()
        .enumerate()
        .filter(|(i, _)| !chosen.contains(i))
        .map(|(_, d)| Dancer { roll: None, ..*d })
        .collect();
    for component in components(formation, &chosen) {
        let dancers: Vec<Dancer> = component.iter().map(|&i| formation.dancers()[i]).collect();
        let (sub, map) = Formation::compress(dancers).map_err(|e| {
            Rejection::Unrecognized(format!("the {} are not in a known setup ({})", who, e))
        })?;
        let (result, inner) = run(body, &sub)?;
        let to_outer = inner.then(&map).ok_or_else(between_spots)?;
        for d in result.dancers() {
            let position = to_outer.map(d.position).ok_or_else(|| {
                Rejection::NotApplicable(format!("the {} would end between spots", who))
            })?;
            out.push(Dancer { position, ..*d });
        }
    }
    let collide = || Rejection::NotApplicable(format!("the {} would run into the others", who));
    let (merged, map) = Formation::compress(out).map_err(|_| collide())?;
    if merged.len() != formation.len() {
        return Err(collide());
    }
    Ok((merged, map))
}

/// Pairs dancers up as couples (side by side, beau first) or tandems
/// (leader first).
fn pair_up(formation: &Formation, pairing: Pairing) -> Option<Vec<(Dancer, Dancer)>> {
    let ds = formation.dancers();
    let mut used = vec![false; ds.len()];
    let mut pairs = Vec::new();
    for i in 0..ds.len() {
        if used[i] {
            continue;
        }
        let d = ds[i];
        let forward = d.facing.forward()?;
        let right = d.facing.right()?;
        let find = |v: Position| {
            (0..ds.len()).find(|&k| {
                !used[k] && ds[k].position == d.position.offset(v, 2) && ds[k].facing == d.facing
            })
        };
        let (j, first_is_i) = match pairing {
            Pairing::Couples => match find(right) {
                Some(j) => (j, true),
                None => (find(Position::new(-right.x, -right.y))?, false),
            },
            Pairing::Tandem => match find(Position::new(-forward.x, -forward.y)) {
                Some(j) => (j, true),
                None => (find(forward)?, false),
            },
        };
        used[i] = true;
        used[j] = true;
        pairs.push(if first_is_i { (d, ds[j]) } else { (ds[j], d) });
    }
    Some(pairs)
}

fn run_paired(pairing: Pairing, body: &CallBody, formation: &Formation) -> Outcome {
    let noun = match pairing {
        Pairing::Couples => "couples",
        Pairing::Tandem => "tandems",
    };
    let pairs = pair_up(formation, pairing)
        .ok_or_else(|| Rejection::NotApplicable(format!("not everybody is in {}", noun)))?;
    let virtuals: Vec<Dancer> = pairs
        .iter()
        .enumerate()
        .map(|(k, (a, b))| {
            let mid = Position::new(
                (a.position.x + b.position.x) / 2,
                (a.position.y + b.position.y) / 2,
            );
            Dancer::new(Person::Phantom(k as u8), mid, a.facing)
        })
        .collect();
    let (unit, to_mids) = Formation::compress(virtuals).map_err(|e| {
        Rejection::NotApplicable(format!("{} are not in a known setup ({})", noun, e))
    })?;
    let (result, inner) = run(body, &unit)?;
    let to_frame = inner.then(&to_mids).ok_or_else(between_spots)?;

    let mut out = Vec::with_capacity(formation.len());
    for v in result.dancers() {
        let k = match v.person {
            Person::Phantom(k) => k as usize,
            Person::Real(_) => return Err(Rejection::not_applicable("lost track of a pair")),
        };
        let (a, b) = pairs[k];
        let forward = v
            .facing
            .forward()
            .ok_or_else(|| Rejection::not_applicable("pairs end on a diagonal"))?;
        let right = v.facing.right().unwrap_or(Position::ORIGIN);
        let center = to_frame.map(v.position).ok_or_else(between_spots)?;
        let (pa, pb) = match pairing {
            Pairing::Couples => (center.offset(right, -1), center.offset(right, 1)),
            Pairing::Tandem => (center.offset(forward, 1), center.offset(forward, -1)),
        };
        out.push(Dancer {
            position: pa,
            facing: v.facing,
            roll: v.roll,
            ..a
        });
        out.push(Dancer {
            position: pb,
            facing: v.facing,
            roll: v.roll,
            ..b
        });
    }
    let (merged, map) = Formation::compress(out).map_err(|e| Rejection::Unrecognized(e.to_string()))?;
    if merged.len() != formation.len() {
        return Err(Rejection::not_applicable("pairs would collide"));
    }
    Ok((merged, map))
}
