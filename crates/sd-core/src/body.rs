//! Executable call bodies and the pure transforms concepts apply to them.

use serde::Serialize;

use crate::calls::model::Scheme;
use crate::designator::Designator;

/// A set of schemes for one call (or one part of a call).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArrayCall {
    pub schemes: Vec<Scheme>,
    /// 1x4 schemes also apply across a whole 1x8.
    pub grand: bool,
    /// Who is "selected" for this call, e.g. the boys in "boys run".
    pub designator: Option<Designator>,
    pub real_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Pairing {
    Couples,
    Tandem,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CallBody {
    Array(ArrayCall),
    Sequence(Vec<CallBody>),
    /// The designated dancers do the body, everybody else stands.
    Selective {
        who: Designator,
        body: Box<CallBody>,
    },
    /// Pairs of dancers act as single dancers.
    Paired {
        pairing: Pairing,
        body: Box<CallBody>,
    },
    /// Run on the mirror image of the formation.
    Mirrored(Box<CallBody>),
    /// Everyone who turned on their last movement turns another quarter.
    Roll,
    /// Try `body`; if it cannot be done, step to a wave first.
    StepToWave {
        touch: Box<CallBody>,
        body: Box<CallBody>,
    },
}

impl CallBody {
    /// Builds a sequence, collapsing a single part to itself.
    pub fn sequence(mut items: Vec<CallBody>) -> CallBody {
        if items.len() == 1 {
            items.remove(0)
        } else {
            CallBody::Sequence(items)
        }
    }

    /// Top-level parts, as counted by fractions and "reverse order".
    pub fn parts(&self) -> &[CallBody] {
        match self {
            CallBody::Sequence(items) => items,
            _ => std::slice::from_ref(self),
        }
    }

    /// Left-handed version: every scheme replaced by its mirror image.
    pub fn mirrored(&self) -> CallBody {
        self.map_arrays(&|a| ArrayCall {
            schemes: a.schemes.iter().map(Scheme::mirrored).collect(),
            ..a.clone()
        })
    }

    /// Exact time inverse.
    pub fn reversed(&self) -> CallBody {
        match self {
            CallBody::Array(a) => CallBody::Array(ArrayCall {
                schemes: a.schemes.iter().map(Scheme::reversed).collect(),
                ..a.clone()
            }),
            CallBody::Sequence(items) => {
                CallBody::Sequence(items.iter().rev().map(CallBody::reversed).collect())
            }
            CallBody::Selective { who, body } => CallBody::Selective {
                who: *who,
                body: Box::new(body.reversed()),
            },
            CallBody::Paired { pairing, body } => CallBody::Paired {
                pairing: *pairing,
                body: Box::new(body.reversed()),
            },
            CallBody::Mirrored(body) => CallBody::Mirrored(Box::new(body.reversed())),
            CallBody::Roll => CallBody::Roll,
            CallBody::StepToWave { body, .. } => body.reversed(),
        }
    }

    pub fn grand(&self) -> CallBody {
        self.map_arrays(&|a| ArrayCall {
            grand: true,
            ..a.clone()
        })
    }

    fn map_arrays(&self, f: &dyn Fn(&ArrayCall) -> ArrayCall) -> CallBody {
        match self {
            CallBody::Array(a) => CallBody::Array(f(a)),
            CallBody::Sequence(items) => {
                CallBody::Sequence(items.iter().map(|b| b.map_arrays(f)).collect())
            }
            CallBody::Selective { who, body } => CallBody::Selective {
                who: *who,
                body: Box::new(body.map_arrays(f)),
            },
            CallBody::Paired { pairing, body } => CallBody::Paired {
                pairing: *pairing,
                body: Box::new(body.map_arrays(f)),
            },
            CallBody::Mirrored(body) => CallBody::Mirrored(Box::new(body.map_arrays(f))),
            CallBody::Roll => CallBody::Roll,
            CallBody::StepToWave { touch, body } => CallBody::StepToWave {
                touch: Box::new(touch.map_arrays(f)),
                body: Box::new(body.map_arrays(f)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calls::model::{MoveRule, Movement, Restrictions, Role, SchemeSetup};
    use crate::setup::SetupKind;

    fn step(forward: i32, right: i32, turn: i32) -> CallBody {
        CallBody::Array(ArrayCall {
            schemes: vec![Scheme {
                setup: SchemeSetup::Kind(SetupKind::OneByTwo),
                restrictions: Restrictions::default(),
                hand: None,
                mirror: false,
                moves: vec![MoveRule {
                    who: vec![Role::Any],
                    movement: Movement::Step {
                        forward,
                        right,
                        turn,
                    },
                }],
            }],
            grand: false,
            designator: None,
            real_only: false,
        })
    }

    #[test]
    fn test_sequence_of_one_collapses() {
        assert_eq!(CallBody::sequence(vec![step(2, 0, 0)]), step(2, 0, 0));
        assert_eq!(CallBody::Roll.parts().len(), 1);
    }

    #[test]
    fn test_reverse_inverts_order_and_steps() {
        let body = CallBody::sequence(vec![step(2, 0, 0), step(0, 0, 1)]);
        assert_eq!(
            body.reversed(),
            CallBody::Sequence(vec![step(0, 0, -1), step(-2, 0, 0)])
        );
    }

    #[test]
    fn test_mirror_negates_lateral_motion() {
        assert_eq!(step(1, 1, 1).mirrored(), step(1, -1, -1));
        assert_eq!(step(1, 1, 1).mirrored().mirrored(), step(1, 1, 1));
    }
}
