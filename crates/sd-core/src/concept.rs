//! Concepts: pure transforms from one prepared call to another.
//!
//! Concepts never touch a formation. Each one rewrites the [`CallBody`] of a
//! [`PreparedCall`] (and its display name) and hands back a new value, so
//! the matcher can try many interpretations side by side without any of
//! them seeing another's changes.

use std::fmt;

use serde::Serialize;

use crate::body::{CallBody, Pairing};
use crate::calls::model::Modifier;
use crate::designator::Designator;
use crate::error::CallError;
use crate::formation::Formation;
use crate::level::Level;

/// A call ready to run: its body plus what it was built from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PreparedCall {
    /// How the interpretation reads back, e.g. "left square thru 4".
    pub name: String,
    /// Concepts the underlying call declares support for.
    pub modifiers: Vec<Modifier>,
    pub body: CallBody,
    /// The body before any repetition or fraction, used by "once more".
    pub base: CallBody,
}

impl PreparedCall {
    pub fn new(name: impl Into<String>, modifiers: Vec<Modifier>, body: CallBody) -> Self {
        Self {
            name: name.into(),
            modifiers,
            base: body.clone(),
            body,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Concept {
    Left,
    Mirror,
    Reverse,
    ReverseOrder,
    Grand,
    Twice,
    Times(i64),
    OnceMore,
    Fraction { numerator: u32, denominator: u32 },
    Designated(Designator),
    Couples,
    Tandem,
    Roll,
}

/// Largest count accepted by "<N> times".
pub const MAX_TIMES: i64 = 8;

/// Largest number of repetitions a stack of repeating concepts may add up to.
pub const MAX_REPETITIONS: u64 = 64;

const FRACTIONS: [(&str, u32, u32); 6] = [
    ("1/4", 1, 4),
    ("1/3", 1, 3),
    ("1/2", 1, 2),
    ("half", 1, 2),
    ("2/3", 2, 3),
    ("3/4", 3, 4),
];

impl Concept {
    /// Level at which the concept becomes legal.
    pub fn level(&self) -> Level {
        match self {
            Concept::Left | Concept::Reverse | Concept::Designated(_) => Level::Basic,
            Concept::Twice | Concept::Times(_) | Concept::OnceMore => Level::Mainstream,
            Concept::Fraction { .. } | Concept::Grand | Concept::Roll => Level::Plus,
            Concept::Couples | Concept::Tandem => Level::A1,
            Concept::Mirror => Level::C1,
            Concept::ReverseOrder => Level::C2,
        }
    }

    /// How many times the concept repeats the body it wraps.
    pub fn repetitions(&self) -> u64 {
        match self {
            Concept::Twice | Concept::OnceMore => 2,
            Concept::Times(n) => u64::try_from(*n).unwrap_or(0),
            _ => 1,
        }
    }

    /// Rejects a "<N> times" count outside `1..=MAX_TIMES`.
    pub fn check_argument(&self, call: &str) -> Result<(), CallError> {
        match *self {
            Concept::Times(n) if !(1..=MAX_TIMES).contains(&n) => Err(CallError::InvalidArgument {
                call: format!("{} <N> times", call),
                value: n,
                min: 1,
                max: MAX_TIMES,
            }),
            _ => Ok(()),
        }
    }

    /// Parses a concept written as a prefix, one or two words long.
    /// Returns the concept and how many words it used.
    pub fn parse_prefix(words: &[String]) -> Vec<(Concept, usize)> {
        let first = match words.first() {
            Some(w) => w.as_str(),
            None => return Vec::new(),
        };
        let second = words.get(1).map(String::as_str);
        let mut out = Vec::new();
        match (first, second) {
            ("reverse", Some("order")) => out.push((Concept::ReverseOrder, 2)),
            ("as", Some("couples")) => out.push((Concept::Couples, 2)),
            _ => {}
        }
        match first {
            "left" => out.push((Concept::Left, 1)),
            "mirror" => out.push((Concept::Mirror, 1)),
            "reverse" => out.push((Concept::Reverse, 1)),
            "grand" => out.push((Concept::Grand, 1)),
            "twice" => out.push((Concept::Twice, 1)),
            "couples" => out.push((Concept::Couples, 1)),
            "tandem" => out.push((Concept::Tandem, 1)),
            _ => {}
        }
        if let Some(&(_, numerator, denominator)) = FRACTIONS.iter().find(|(w, _, _)| *w == first) {
            out.push((
                Concept::Fraction {
                    numerator,
                    denominator,
                },
                1,
            ));
        }
        if let Some(d) = Designator::from_word(first) {
            out.push((Concept::Designated(d), 1));
        }
        out
    }

    /// Parses a concept given by name, as used inside call tables.
    pub fn from_name(name: &str) -> Option<Concept> {
        let words: Vec<String> = name.split_whitespace().map(str::to_ascii_lowercase).collect();
        Concept::parse_prefix(&words)
            .into_iter()
            .find(|(_, used)| *used == words.len())
            .map(|(c, _)| c)
    }

    fn requires(&self, call: &PreparedCall, modifier: Modifier) -> Result<(), CallError> {
        if call.modifiers.contains(&modifier) {
            Ok(())
        } else {
            Err(self.not_applicable(call))
        }
    }

    fn not_applicable(&self, call: &PreparedCall) -> CallError {
        CallError::ConceptNotApplicable {
            concept: self.to_string(),
            call: call.name.clone(),
        }
    }

    /// Rewrites a bare body. Concepts that need a declaration on the call are
    /// not checked here.
    pub fn transform(&self, body: &CallBody, base: &CallBody) -> Option<CallBody> {
        Some(match self {
            Concept::Left => body.mirrored(),
            Concept::Mirror => CallBody::Mirrored(Box::new(body.clone())),
            Concept::Reverse => body.reversed(),
            Concept::ReverseOrder => {
                let parts = body.parts();
                if parts.len() < 2 {
                    return None;
                }
                CallBody::Sequence(parts.iter().rev().cloned().collect())
            }
            Concept::Grand => body.grand(),
            Concept::Twice => CallBody::Sequence(vec![body.clone(), body.clone()]),
            Concept::Times(n) => {
                let n = usize::try_from(*n).ok().filter(|n| (1..=MAX_TIMES as usize).contains(n))?;
                CallBody::sequence(vec![body.clone(); n])
            }
            Concept::OnceMore => CallBody::Sequence(vec![body.clone(), base.clone()]),
            Concept::Fraction {
                numerator,
                denominator,
            } => {
                let parts = body.parts();
                let scaled = parts.len() as u32 * numerator;
                if scaled % denominator != 0 || scaled == 0 {
                    return None;
                }
                let keep = (scaled / denominator) as usize;
                CallBody::sequence(parts[..keep].to_vec())
            }
            Concept::Designated(who) => CallBody::Selective {
                who: *who,
                body: Box::new(body.clone()),
            },
            Concept::Couples => CallBody::Paired {
                pairing: Pairing::Couples,
                body: Box::new(body.clone()),
            },
            Concept::Tandem => CallBody::Paired {
                pairing: Pairing::Tandem,
                body: Box::new(body.clone()),
            },
            Concept::Roll => CallBody::Sequence(vec![body.clone(), CallBody::Roll]),
        })
    }

    /// Applies the concept to a prepared call.
    pub fn apply(&self, call: &PreparedCall) -> Result<PreparedCall, CallError> {
        match self {
            Concept::Left => self.requires(call, Modifier::Left)?,
            Concept::Reverse => self.requires(call, Modifier::Reverse)?,
            Concept::Grand => self.requires(call, Modifier::Grand)?,
            _ => {}
        }
        let body = self
            .transform(&call.body, &call.base)
            .ok_or_else(|| self.not_applicable(call))?;
        // Direction changes carry over to what "once more" repeats.
        let base = match self {
            Concept::Left | Concept::Mirror | Concept::Reverse | Concept::Grand => self
                .transform(&call.base, &call.base)
                .ok_or_else(|| self.not_applicable(call))?,
            Concept::Designated(_) | Concept::Couples | Concept::Tandem => body.clone(),
            _ => call.base.clone(),
        };
        let name = match self {
            Concept::Twice | Concept::Times(_) | Concept::OnceMore | Concept::Roll => {
                format!("{} {}", call.name, self)
            }
            _ => format!("{} {}", self, call.name),
        };
        Ok(PreparedCall {
            name,
            modifiers: call.modifiers.clone(),
            body,
            base,
        })
    }
}

impl fmt::Display for Concept {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Concept::Left => f.write_str("left"),
            Concept::Mirror => f.write_str("mirror"),
            Concept::Reverse => f.write_str("reverse"),
            Concept::ReverseOrder => f.write_str("reverse order"),
            Concept::Grand => f.write_str("grand"),
            Concept::Twice => f.write_str("twice"),
            Concept::Times(n) => write!(f, "{} times", n),
            Concept::OnceMore => f.write_str("once more"),
            Concept::Fraction {
                numerator,
                denominator,
            } => write!(f, "{}/{}", numerator, denominator),
            Concept::Designated(d) => write!(f, "{}", d),
            Concept::Couples => f.write_str("as couples"),
            Concept::Tandem => f.write_str("tandem"),
            Concept::Roll => f.write_str("and roll"),
        }
    }
}

/// Applies a concept, given by name, to a prepared call.
///
/// Fails with [`CallError::UnknownConcept`] for a name that is not a concept,
/// and with [`CallError::ConceptNotApplicable`] when the concept cannot
/// transform this call (or designates nobody in `formation`).
pub fn apply_concept(
    name: &str,
    call: &PreparedCall,
    formation: &Formation,
) -> Result<PreparedCall, CallError> {
    let concept =
        Concept::from_name(name).ok_or_else(|| CallError::UnknownConcept(name.to_string()))?;
    if let Concept::Designated(who) = concept {
        if who.select(formation).is_empty() {
            return Err(concept.not_applicable(call));
        }
    }
    concept.apply(call)
}
