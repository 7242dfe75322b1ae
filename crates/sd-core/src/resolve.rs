//! Resolve detection: is the square back where it started, or one standard
//! getout away from it?

use std::fmt;

use serde::Serialize;

use crate::dancer::{Dancer, DancerId, Gender};
use crate::formation::Formation;
use crate::geometry::Position;
use crate::setup::SetupKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum Resolve {
    AtHome,
    /// Home arrangement rotated; circling left this many quarters fixes it.
    Circle { left_quarters: u8 },
    /// Boys face their corners; the promenade that follows is this many
    /// eighths of the way around.
    LeftAllemande { promenade: u8 },
    /// Boys face their partners.
    RightAndLeftGrand { promenade: u8 },
}

fn quarters(n: u8) -> &'static str {
    match n {
        1 => "1/4",
        2 => "1/2",
        _ => "3/4",
    }
}

fn promenade(eighths: u8) -> String {
    match eighths {
        0 => "at home".to_string(),
        2 => "1/4 promenade".to_string(),
        4 => "1/2 promenade".to_string(),
        6 => "3/4 promenade".to_string(),
        n => format!("{}/8 promenade", n),
    }
}

impl fmt::Display for Resolve {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Resolve::AtHome => f.write_str("at home"),
            Resolve::Circle { left_quarters } => write!(
                f,
                "circle left {} or right {}",
                quarters(left_quarters),
                quarters(4 - left_quarters)
            ),
            Resolve::LeftAllemande { promenade: p } => {
                write!(f, "left allemande ({})", promenade(p))
            }
            Resolve::RightAndLeftGrand { promenade: p } => {
                write!(f, "right and left grand ({})", promenade(p))
            }
        }
    }
}

/// Couple numbers of the boys, clockwise around the center, starting at
/// couple 1.
fn ring_order(formation: &Formation) -> Vec<u8> {
    let mut around: Vec<(f64, &Dancer)> = formation
        .dancers()
        .iter()
        .map(|d| (d.position.bearing(), d))
        .collect();
    around.sort_by(|a, b| a.0.total_cmp(&b.0));
    let mut boys: Vec<u8> = around
        .iter()
        .filter_map(|(_, d)| d.id())
        .filter(|id| id.gender == Gender::Boy)
        .map(|id| id.couple)
        .collect();
    if let Some(start) = boys.iter().position(|c| *c == 1) {
        boys.rotate_left(start);
    }
    boys
}

fn corner(boy: DancerId) -> DancerId {
    DancerId::girl((boy.couple + 2) % 4 + 1)
}

/// Checks the formation against the home arrangement and the standard
/// getouts. Formations with phantoms are never reported.
pub fn check_resolve(formation: &Formation) -> Option<Resolve> {
    if formation.has_phantoms() || formation.len() != 8 {
        return None;
    }
    match formation.kind() {
        SetupKind::SquaredSet => {
            let home = Formation::home();
            if formation.canonicalize() != home.canonicalize() {
                return None;
            }
            (0..4u8)
                .find(|q| formation.rotate(i32::from(*q)).without_roll() == home)
                .map(|q| match q {
                    0 => Resolve::AtHome,
                    q => Resolve::Circle { left_quarters: q },
                })
        }
        SetupKind::TwoByFour if formation.name() == "eight chain thru" => {
            if ring_order(formation) != [1, 4, 3, 2] {
                return None;
            }
            let faced = |d: &Dancer| -> Option<DancerId> {
                let ahead = d.facing.forward()?;
                formation.at(d.position.offset(ahead, 2))?.id()
            };
            let boys: Vec<(&Dancer, DancerId)> = formation
                .dancers()
                .iter()
                .filter(|d| d.id().map(|id| id.gender) == Some(Gender::Boy))
                .map(|d| faced(d).map(|other| (d, other)))
                .collect::<Option<_>>()?;
            let b1 = boys
                .iter()
                .find(|(d, _)| d.id() == Some(DancerId::boy(1)))?;
            let partner_of_b1 = formation.dancer(b1.1)?;
            let meeting = Position::new(
                b1.0.position.x + partner_of_b1.position.x,
                b1.0.position.y + partner_of_b1.position.y,
            );
            // Eighths clockwise from couple 1's meeting place in the home
            // eight chain; the promenade runs counterclockwise that far.
            let reference = Position::new(-2, -1).bearing();
            let eighths = ((meeting.bearing() - reference) / 45.0).round() as i32;
            let distance = eighths.rem_euclid(8) as u8;

            let all = |pick: fn(DancerId) -> DancerId| {
                boys.iter()
                    .all(|(d, other)| d.id().map(pick) == Some(*other))
            };
            if all(corner) {
                Some(Resolve::LeftAllemande {
                    promenade: distance,
                })
            } else if all(|b| DancerId::girl(b.couple)) {
                Some(Resolve::RightAndLeftGrand {
                    promenade: distance,
                })
            } else {
                None
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Facing;
    use pretty_assertions::assert_eq;

    /// Every boy facing his corner, couple 1 at the home meeting place.
    fn allemande() -> Formation {
        Formation::new(vec![
            Dancer::real(DancerId::girl(4), -3, -1, Facing::EAST),
            Dancer::real(DancerId::boy(1), -1, -1, Facing::WEST),
            Dancer::real(DancerId::girl(1), 1, -1, Facing::EAST),
            Dancer::real(DancerId::boy(2), 3, -1, Facing::WEST),
            Dancer::real(DancerId::boy(4), -3, 1, Facing::EAST),
            Dancer::real(DancerId::girl(3), -1, 1, Facing::WEST),
            Dancer::real(DancerId::boy(3), 1, 1, Facing::EAST),
            Dancer::real(DancerId::girl(2), 3, 1, Facing::WEST),
        ])
        .unwrap()
    }

    #[test]
    fn test_home_and_rotated_home() {
        assert_eq!(check_resolve(&Formation::home()), Some(Resolve::AtHome));
        let turned = Formation::home().rotate(-1);
        assert_eq!(
            check_resolve(&turned),
            Some(Resolve::Circle { left_quarters: 1 })
        );
        assert_eq!(
            Resolve::Circle { left_quarters: 1 }.to_string(),
            "circle left 1/4 or right 3/4"
        );
    }

    #[test]
    fn test_rebuilt_rotated_home_resolves_like_rotated_home() {
        let turned = Formation::home().rotate(1);
        let rebuilt = Formation::new(turned.dancers().to_vec()).unwrap();
        assert_eq!(check_resolve(&rebuilt), check_resolve(&turned));
        assert_eq!(
            check_resolve(&rebuilt),
            Some(Resolve::Circle { left_quarters: 3 })
        );
    }

    #[test]
    fn test_mirror_image_is_not_a_resolve() {
        let mirrored = Formation::home().mirror(crate::geometry::Axis::Y);
        assert_eq!(check_resolve(&mirrored), None);
    }

    #[test]
    fn test_left_allemande_from_eight_chain() {
        let f = allemande();
        assert_eq!(f.name(), "eight chain thru");
        assert_eq!(
            check_resolve(&f),
            Some(Resolve::LeftAllemande { promenade: 0 })
        );
        assert_eq!(
            check_resolve(&f.rotate(2)),
            Some(Resolve::LeftAllemande { promenade: 4 })
        );
        assert_eq!(
            Resolve::LeftAllemande { promenade: 4 }.to_string(),
            "left allemande (1/2 promenade)"
        );
    }

    #[test]
    fn test_two_couples_never_resolve() {
        let f = Formation::new(
            Formation::home()
                .dancers()
                .iter()
                .filter(|d| d.id().is_some_and(|id| id.is_head()))
                .copied()
                .collect(),
        )
        .unwrap();
        assert_eq!(check_resolve(&f), None);
    }
}
