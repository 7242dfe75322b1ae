//! Building blocks of call definitions as they appear in a call table.
//!
//! Everything here deserializes straight from the JSON table and is also
//! what the executor interprets, so a scheme in memory is exactly the
//! scheme that was written down.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::geometry::Hand;
use crate::setup::SetupKind;

/// Which way a dancer turns for [`Movement::Face`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FaceDirection {
    In,
    Out,
}

impl FaceDirection {
    pub fn opposite(self) -> FaceDirection {
        match self {
            FaceDirection::In => FaceDirection::Out,
            FaceDirection::Out => FaceDirection::In,
        }
    }
}

/// A primitive dancer movement. Distances are in half positions relative to
/// the dancer's own heading; turns are in quarters, positive to the right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Movement {
    Stand,
    Step {
        #[serde(default)]
        forward: i32,
        #[serde(default)]
        right: i32,
        #[serde(default)]
        turn: i32,
    },
    /// Move onto the partner's spot.
    ToPartner {
        #[serde(default)]
        turn: i32,
    },
    /// Swap places with the opposite-facing neighbour on that hand.
    TradeHands(Hand),
    /// Quarter toward or away from the center of the unit.
    Face(FaceDirection),
    Circulate,
    ReverseCirculate,
    DiamondCirculate,
    ReverseDiamondCirculate,
}

impl Movement {
    pub fn mirrored(self) -> Movement {
        match self {
            Movement::Step {
                forward,
                right,
                turn,
            } => Movement::Step {
                forward,
                right: -right,
                turn: -turn,
            },
            Movement::ToPartner { turn } => Movement::ToPartner { turn: -turn },
            Movement::TradeHands(hand) => Movement::TradeHands(hand.opposite()),
            other => other,
        }
    }

    /// The movement that undoes this one.
    pub fn reversed(self) -> Movement {
        match self {
            Movement::Step {
                forward,
                right,
                turn,
            } => {
                // Undo the displacement, expressed in the frame of the
                // heading the dancer ends with.
                let (f, r) = match turn.rem_euclid(4) {
                    0 => (-forward, -right),
                    1 => (-right, forward),
                    2 => (forward, right),
                    _ => (right, -forward),
                };
                Movement::Step {
                    forward: f,
                    right: r,
                    turn: -turn,
                }
            }
            Movement::ToPartner { turn } => Movement::ToPartner { turn: -turn },
            Movement::Face(dir) => Movement::Face(dir.opposite()),
            Movement::Circulate => Movement::ReverseCirculate,
            Movement::ReverseCirculate => Movement::Circulate,
            Movement::DiamondCirculate => Movement::ReverseDiamondCirculate,
            Movement::ReverseDiamondCirculate => Movement::DiamondCirculate,
            other => other,
        }
    }
}

/// A role a dancer can hold within one unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Any,
    Beau,
    Belle,
    Leader,
    Trailer,
    Center,
    End,
    Selected,
    Unselected,
    Boy,
    Girl,
    /// The center of the unit is on the dancer's right.
    LeftHalf,
    /// The center of the unit is on the dancer's left.
    RightHalf,
}

impl Role {
    pub fn mirrored(self) -> Role {
        match self {
            Role::Beau => Role::Belle,
            Role::Belle => Role::Beau,
            Role::LeftHalf => Role::RightHalf,
            Role::RightHalf => Role::LeftHalf,
            other => other,
        }
    }

    pub fn reversed(self) -> Role {
        match self {
            Role::Leader => Role::Trailer,
            Role::Trailer => Role::Leader,
            other => other,
        }
    }
}

/// A requirement on the whole unit before a scheme may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Restriction {
    None,
    Lateral,
    Couple,
    MiniWave,
    FacingPair,
    BackToBack,
    Wave,
    TwoFacedLine,
    LineOfCouples,
    FacingCouples,
    Box,
    Columns,
    TwoFacedLines,
    LinesFacingOut,
    DoublePassThru,
    OneSelected,
}

impl Restriction {
    pub fn reversed(self) -> Restriction {
        match self {
            Restriction::FacingPair => Restriction::BackToBack,
            Restriction::BackToBack => Restriction::FacingPair,
            other => other,
        }
    }
}

/// Either a single restriction or a list of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Restrictions {
    One(Restriction),
    Many(Vec<Restriction>),
}

impl Default for Restrictions {
    fn default() -> Self {
        Restrictions::Many(Vec::new())
    }
}

impl Restrictions {
    pub fn to_vec(&self) -> Vec<Restriction> {
        match self {
            Restrictions::One(r) => vec![*r],
            Restrictions::Many(v) => v.clone(),
        }
    }
}

/// Setup a scheme is written for; `any` runs on whatever unit it is given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum SchemeSetup {
    Any,
    Kind(SetupKind),
}

impl TryFrom<String> for SchemeSetup {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        if s.trim().eq_ignore_ascii_case("any") {
            Ok(SchemeSetup::Any)
        } else {
            s.parse().map(SchemeSetup::Kind)
        }
    }
}

impl From<SchemeSetup> for String {
    fn from(s: SchemeSetup) -> String {
        s.to_string()
    }
}

impl fmt::Display for SchemeSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemeSetup::Any => f.write_str("any"),
            SchemeSetup::Kind(k) => write!(f, "{}", k),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MoveRule {
    pub who: Vec<Role>,
    #[serde(rename = "move")]
    pub movement: Movement,
}

/// One way of doing a call from one setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Scheme {
    pub setup: SchemeSetup,
    #[serde(default, rename = "restriction")]
    pub restrictions: Restrictions,
    /// Handedness demanded by hand-sensitive restrictions.
    #[serde(default)]
    pub hand: Option<Hand>,
    /// Also try the mirror image of this scheme.
    #[serde(default)]
    pub mirror: bool,
    pub moves: Vec<MoveRule>,
}

impl Scheme {
    pub fn mirrored(&self) -> Scheme {
        Scheme {
            setup: self.setup,
            restrictions: self.restrictions.clone(),
            hand: self.hand.map(Hand::opposite),
            mirror: self.mirror,
            moves: self
                .moves
                .iter()
                .map(|m| MoveRule {
                    who: m.who.iter().map(|r| r.mirrored()).collect(),
                    movement: m.movement.mirrored(),
                })
                .collect(),
        }
    }

    pub fn reversed(&self) -> Scheme {
        Scheme {
            setup: self.setup,
            restrictions: Restrictions::Many(
                self.restrictions
                    .to_vec()
                    .into_iter()
                    .map(Restriction::reversed)
                    .collect(),
            ),
            hand: self.hand,
            mirror: self.mirror,
            moves: self
                .moves
                .iter()
                .map(|m| MoveRule {
                    who: m.who.iter().map(|r| r.reversed()).collect(),
                    movement: m.movement.reversed(),
                })
                .collect(),
        }
    }
}

/// Concepts a call declares it can be modified by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Modifier {
    Left,
    Reverse,
    Grand,
}

impl fmt::Display for Modifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Modifier::Left => f.write_str("left"),
            Modifier::Reverse => f.write_str("reverse"),
            Modifier::Grand => f.write_str("grand"),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CallFlags {
    /// Retry after an automatic "step to a wave" when the call fails.
    #[serde(default)]
    pub step_to_wave: bool,
    /// Phantoms may not take part.
    #[serde(default)]
    pub real_only: bool,
}

/// Valid range for a `<N>` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArgumentRange {
    pub min: i64,
    pub max: i64,
    #[serde(default)]
    pub default: Option<i64>,
}

impl ArgumentRange {
    pub fn contains(&self, n: i64) -> bool {
        (self.min..=self.max).contains(&n)
    }
}

/// How many times a part is done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Repeat {
    #[default]
    #[serde(rename = "1")]
    Once,
    #[serde(rename = "n")]
    N,
    #[serde(rename = "n-1")]
    NMinusOne,
}

impl Repeat {
    pub fn count(self, n: Option<i64>) -> Option<i64> {
        match self {
            Repeat::Once => Some(1),
            Repeat::N => n,
            Repeat::NMinusOne => n.map(|n| n - 1),
        }
    }
}

/// One part of a compound call, exactly as written in the table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartEntry {
    #[serde(default)]
    pub call: Option<String>,
    #[serde(default)]
    pub schemes: Option<Vec<Scheme>>,
    #[serde(default)]
    pub parts: Option<Vec<PartEntry>>,
    #[serde(default)]
    pub times: Repeat,
    #[serde(default)]
    pub concept: Option<String>,
    #[serde(default)]
    pub who: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_movement_json_forms() {
        let m: Movement = serde_json::from_str(r#""stand""#).unwrap();
        assert_eq!(m, Movement::Stand);
        let m: Movement = serde_json::from_str(r#"{"step":{"forward":2}}"#).unwrap();
        assert_eq!(
            m,
            Movement::Step {
                forward: 2,
                right: 0,
                turn: 0
            }
        );
        let m: Movement = serde_json::from_str(r#"{"trade_hands":"left"}"#).unwrap();
        assert_eq!(m, Movement::TradeHands(Hand::Left));
    }

    #[test]
    fn test_scheme_setup_accepts_any_or_kind() {
        let s: SchemeSetup = serde_json::from_str(r#""any""#).unwrap();
        assert_eq!(s, SchemeSetup::Any);
        let s: SchemeSetup = serde_json::from_str(r#""2x4""#).unwrap();
        assert_eq!(s, SchemeSetup::Kind(SetupKind::TwoByFour));
        assert!(serde_json::from_str::<SchemeSetup>(r#""3x3""#).is_err());
    }

    #[test]
    fn test_reversed_step_undoes_displacement() {
        let hinge = Movement::Step {
            forward: 1,
            right: 1,
            turn: 1,
        };
        assert_eq!(
            hinge.reversed(),
            Movement::Step {
                forward: -1,
                right: 1,
                turn: -1
            }
        );
        let pass = Movement::Step {
            forward: 2,
            right: 0,
            turn: 0,
        };
        assert_eq!(
            pass.reversed(),
            Movement::Step {
                forward: -2,
                right: 0,
                turn: 0
            }
        );
        assert_eq!(pass.reversed().reversed(), pass);
    }

    #[test]
    fn test_restrictions_one_or_many() {
        let r: Restrictions = serde_json::from_str(r#""wave""#).unwrap();
        assert_eq!(r.to_vec(), vec![Restriction::Wave]);
        let r: Restrictions = serde_json::from_str(r#"["lateral","one_selected"]"#).unwrap();
        assert_eq!(r.to_vec().len(), 2);
    }
}
