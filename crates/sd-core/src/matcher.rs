//! The matcher: from a line of call text to the one formation it produces.
//!
//! Text is read every way it can be: concept prefixes, suffixes such as
//! "twice" or "and roll", bracketed sub-calls and call names (exact, else by
//! word prefix). Each reading is an interpretation. Interpretations above
//! the session level are dropped, the rest are executed, and the successes
//! are ranked: fewest concepts first, then the call that starts from the
//! fewest setups. Whatever is still tied is ambiguous.

use serde::Serialize;
use tracing::debug;

use crate::body::CallBody;
use crate::calls::pattern::parse_number;
use crate::calls::{Arguments, CallDatabase, CallId};
use crate::concept::{Concept, PreparedCall, MAX_REPETITIONS};
use crate::designator::Designator;
use crate::error::CallError;
use crate::exec::{execute, Rejection};
use crate::formation::Formation;
use crate::level::Level;

/// One way of reading the text, before it is tried on a formation.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Reading {
    call: CallId,
    args: Arguments,
    /// In the order they are applied: suffixes as written, then prefixes
    /// from the innermost outwards.
    concepts: Vec<Concept>,
}

/// An interpretation that worked, with the formation it leads to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchCandidate {
    /// How the interpretation reads back, e.g. "heads square thru 4".
    pub interpretation: String,
    pub call: CallId,
    pub concepts: Vec<Concept>,
    pub formation: Formation,
    /// Number of setups the call can start from; lower is more specific.
    pub specificity: usize,
}

/// Resolves call text against one database at one level.
#[derive(Debug, Clone, Copy)]
pub struct Matcher<'a> {
    db: &'a CallDatabase,
    level: Level,
    implicit: Option<Designator>,
}

/// Splits text into lowercase words. Commas are dropped and brackets are
/// words of their own.
pub fn tokenize(text: &str) -> Vec<String> {
    text.replace(',', " ")
        .replace('[', " [ ")
        .replace(']', " ] ")
        .split_whitespace()
        .map(|w| w.to_ascii_lowercase())
        .collect()
}

/// Failures collected while trying interpretations. The most telling one is
/// reported when nothing works.
#[derive(Default)]
struct Failures {
    invalid_argument: Option<CallError>,
    illegal: Option<CallError>,
    unrecognized: Option<CallError>,
    ambiguous: Option<CallError>,
    reasons: Vec<String>,
}

impl Failures {
    fn record(&mut self, interpretation: &str, err: CallError) {
        debug!(interpretation, error = %err, "interpretation eliminated");
        match err {
            CallError::InvalidArgument { .. } => {
                self.invalid_argument.get_or_insert(err);
            }
            CallError::IllegalAtLevel { .. } => {
                self.illegal.get_or_insert(err);
            }
            CallError::UnrecognizedSetup(_) => {
                self.unrecognized.get_or_insert(err);
            }
            CallError::AmbiguousMatch { .. } => {
                self.ambiguous.get_or_insert(err);
            }
            other => self.reasons.push(format!("{}: {}", interpretation, other)),
        }
    }

    fn into_error(self, text: &str) -> CallError {
        self.invalid_argument
            .or(self.illegal)
            .or(self.unrecognized)
            .or(self.ambiguous)
            .unwrap_or_else(|| CallError::NoMatch {
                text: text.to_string(),
                reasons: self.reasons,
            })
    }
}

impl<'a> Matcher<'a> {
    pub fn new(db: &'a CallDatabase, level: Level) -> Self {
        Self {
            db,
            level,
            implicit: None,
        }
    }

    /// Has every interpretation done only by these dancers unless the text
    /// names its own designator. Used for the first call after "heads start".
    pub fn with_implicit(mut self, who: Option<Designator>) -> Self {
        self.implicit = who;
        self
    }

    pub fn level(&self) -> Level {
        self.level
    }

    pub fn database(&self) -> &'a CallDatabase {
        self.db
    }

    /// Every interpretation that can be done from `formation`, best first.
    ///
    /// Fails with the most informative error when there is none.
    pub fn candidates(&self, text: &str, formation: &Formation) -> Result<Vec<MatchCandidate>, CallError> {
        let tokens = tokenize(text);
        let readings = self.readings(&tokens);
        if readings.is_empty() {
            return Err(CallError::NoMatch {
                text: text.trim().to_string(),
                reasons: vec![format!("no call named \"{}\"", tokens.join(" "))],
            });
        }

        let mut failures = Failures::default();
        let mut found: Vec<MatchCandidate> = Vec::new();
        for reading in &readings {
            let name = self.describe(reading);
            match self.attempt(reading, formation) {
                Ok(candidate) => {
                    let duplicate = found.iter().any(|c| {
                        c.call == candidate.call && c.interpretation == candidate.interpretation
                    });
                    if !duplicate {
                        found.push(candidate);
                    }
                }
                Err(err) => failures.record(&name, err),
            }
        }
        debug!(
            text,
            readings = readings.len(),
            succeeded = found.len(),
            "interpretations tried"
        );
        if found.is_empty() {
            return Err(failures.into_error(text.trim()));
        }
        found.sort_by_key(|c| (c.concepts.len(), c.specificity));
        Ok(found)
    }

    /// The single best interpretation of `text`.
    pub fn resolve(&self, text: &str, formation: &Formation) -> Result<MatchCandidate, CallError> {
        let mut found = self.candidates(text, formation)?;
        let best = (found[0].concepts.len(), found[0].specificity);
        found.retain(|c| (c.concepts.len(), c.specificity) == best);
        if found.len() > 1 {
            return Err(CallError::AmbiguousMatch {
                text: text.trim().to_string(),
                interpretations: found.into_iter().map(|c| c.interpretation).collect(),
            });
        }
        found.pop().ok_or_else(|| CallError::NoMatch {
            text: text.trim().to_string(),
            reasons: Vec::new(),
        })
    }

    fn describe(&self, reading: &Reading) -> String {
        let base = self
            .db
            .get(reading.call)
            .map(|c| c.display_name(&reading.args))
            .unwrap_or_default();
        reading.concepts.iter().fold(base, |name, c| match c {
            Concept::Twice | Concept::Times(_) | Concept::OnceMore | Concept::Roll => {
                format!("{} {}", name, c)
            }
            _ => format!("{} {}", c, name),
        })
    }

    /// Level check, concept application and execution of one reading.
    fn attempt(&self, reading: &Reading, formation: &Formation) -> Result<MatchCandidate, CallError> {
        let call = self.db.get(reading.call).ok_or_else(|| CallError::NoMatch {
            text: reading.call.to_string(),
            reasons: Vec::new(),
        })?;
        let name = call.display_name(&reading.args);
        if call.level > self.level {
            return Err(CallError::IllegalAtLevel {
                name,
                required: call.level,
                current: self.level,
            });
        }
        if let Some(c) = reading.concepts.iter().find(|c| c.level() > self.level) {
            return Err(CallError::IllegalAtLevel {
                name: c.to_string(),
                required: c.level(),
                current: self.level,
            });
        }

        for concept in &reading.concepts {
            concept.check_argument(&name)?;
        }
        let repetitions = reading
            .concepts
            .iter()
            .fold(1u64, |total, c| total.saturating_mul(c.repetitions()));
        if repetitions > MAX_REPETITIONS {
            return Err(CallError::InvalidArgument {
                call: self.describe(reading),
                value: i64::try_from(repetitions).unwrap_or(i64::MAX),
                min: 1,
                max: MAX_REPETITIONS as i64,
            });
        }

        let implicit = match reading.concepts.last() {
            Some(Concept::Designated(_)) => None,
            _ => self.implicit,
        };
        if reading.concepts.is_empty()
            && implicit.is_none()
            && !call.setups.contains(&formation.kind())
        {
            return Err(CallError::NoMatch {
                text: name,
                reasons: vec![format!("cannot be done from a {}", formation.kind())],
            });
        }

        let body = self.db.instantiate(reading.call, reading.args)?;
        let mut prepared = PreparedCall::new(name, call.modifiers.clone(), body);
        for concept in &reading.concepts {
            if let Concept::Designated(who) = concept {
                if who.select(formation).is_empty() {
                    return Err(CallError::ConceptNotApplicable {
                        concept: concept.to_string(),
                        call: prepared.name,
                    });
                }
            }
            prepared = concept.apply(&prepared)?;
        }
        let body = match implicit {
            Some(who) => CallBody::Selective {
                who,
                body: Box::new(prepared.body),
            },
            None => prepared.body,
        };

        let result = execute(&body, formation).map_err(|r| rejection_error(&prepared.name, r))?;
        Ok(MatchCandidate {
            interpretation: prepared.name,
            call: reading.call,
            concepts: reading.concepts.clone(),
            formation: result,
            specificity: call.setups.len(),
        })
    }

    /// All readings of a token list.
    fn readings(&self, tokens: &[String]) -> Vec<Reading> {
        let mut out: Vec<Reading> = Vec::new();
        for (core, suffixes) in peel_suffixes(tokens) {
            for (prefixes, phrase) in prefix_splits(core) {
                for base in self.phrase_readings(phrase) {
                    let mut concepts = base.concepts;
                    concepts.extend(suffixes.iter().copied());
                    concepts.extend(prefixes.iter().rev().copied());
                    let reading = Reading {
                        call: base.call,
                        args: base.args,
                        concepts,
                    };
                    if !out.contains(&reading) {
                        out.push(reading);
                    }
                }
            }
        }
        out
    }

    fn phrase_readings(&self, phrase: &[String]) -> Vec<Reading> {
        if let Some(inner) = bracketed(phrase) {
            return self.readings(inner);
        }
        if phrase.iter().any(|t| t == "[" || t == "]") {
            return Vec::new();
        }
        self.db
            .lookup_tokens(phrase)
            .into_iter()
            .map(|m| Reading {
                call: m.id,
                args: m.args,
                concepts: Vec::new(),
            })
            .collect()
    }
}

fn rejection_error(name: &str, rejection: Rejection) -> CallError {
    match rejection {
        Rejection::NotApplicable(reason) => CallError::NoMatch {
            text: name.to_string(),
            reasons: vec![reason],
        },
        Rejection::Ambiguous(interpretations) => CallError::AmbiguousMatch {
            text: name.to_string(),
            interpretations,
        },
        Rejection::Unrecognized(reason) => CallError::UnrecognizedSetup(reason),
    }
}

/// `[ ... ]` spanning the whole phrase, with balanced brackets inside.
fn bracketed(phrase: &[String]) -> Option<&[String]> {
    let (first, rest) = phrase.split_first()?;
    let (last, inner) = rest.split_last()?;
    if first != "[" || last != "]" {
        return None;
    }
    let mut depth = 0i32;
    for t in inner {
        match t.as_str() {
            "[" => depth += 1,
            "]" => {
                depth -= 1;
                if depth < 0 {
                    return None;
                }
            }
            _ => {}
        }
    }
    (depth == 0 && !inner.is_empty()).then_some(inner)
}

/// Every way of peeling suffix concepts off the end. The unpeeled reading is
/// always included.
fn peel_suffixes(tokens: &[String]) -> Vec<(&[String], Vec<Concept>)> {
    let mut out = vec![(tokens, Vec::new())];
    let n = tokens.len();
    let word = |i: usize| tokens.get(i).map(String::as_str);
    let mut peeled: Vec<(usize, Concept)> = Vec::new();
    if n >= 2 && word(n - 1) == Some("twice") {
        peeled.push((1, Concept::Twice));
    }
    if n >= 3 && word(n - 1) == Some("times") {
        if let Some(k) = word(n - 2).and_then(parse_number) {
            peeled.push((2, Concept::Times(k)));
        }
    }
    if n >= 3 && word(n - 2) == Some("once") && word(n - 1) == Some("more") {
        peeled.push((2, Concept::OnceMore));
    }
    if n >= 3 && word(n - 2) == Some("and") && word(n - 1) == Some("roll") {
        peeled.push((2, Concept::Roll));
    }
    if n >= 2 && word(n - 1) == Some("roll") {
        peeled.push((1, Concept::Roll));
    }
    for (used, concept) in peeled {
        for (core, mut suffixes) in peel_suffixes(&tokens[..n - used]) {
            suffixes.push(concept);
            out.push((core, suffixes));
        }
    }
    out
}

/// Every way of reading leading words as concept prefixes. The phrase left
/// over is never empty.
fn prefix_splits(tokens: &[String]) -> Vec<(Vec<Concept>, &[String])> {
    let mut out = vec![(Vec::new(), tokens)];
    for (concept, used) in Concept::parse_prefix(tokens) {
        if used >= tokens.len() {
            continue;
        }
        for (mut rest, phrase) in prefix_splits(&tokens[used..]) {
            rest.insert(0, concept);
            out.push((rest, phrase));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dancer::{Dancer, DancerId};
    use crate::geometry::Facing;
    use pretty_assertions::assert_eq;

    fn db() -> CallDatabase {
        CallDatabase::builtin().unwrap()
    }

    fn facing_couples() -> Formation {
        Formation::new(vec![
            Dancer::real(DancerId::boy(1), -1, -1, Facing::NORTH),
            Dancer::real(DancerId::girl(1), 1, -1, Facing::NORTH),
            Dancer::real(DancerId::boy(3), 1, 1, Facing::SOUTH),
            Dancer::real(DancerId::girl(3), -1, 1, Facing::SOUTH),
        ])
        .unwrap()
    }

    fn words(s: &str) -> Vec<String> {
        tokenize(s)
    }

    #[test]
    fn test_tokenize() {
        assert_eq!(
            tokenize("Left [Square Thru 3], twice"),
            vec!["left", "[", "square", "thru", "3", "]", "twice"]
        );
    }

    #[test]
    fn test_suffixes_are_peeled_in_order() {
        let t = words("swing thru twice and roll");
        let peeled = peel_suffixes(&t);
        assert!(peeled
            .iter()
            .any(|(core, s)| core.len() == 2 && s == &vec![Concept::Twice, Concept::Roll]));
        let t = words("circulate 3 times");
        assert!(peel_suffixes(&t)
            .iter()
            .any(|(core, s)| core.len() == 1 && s == &vec![Concept::Times(3)]));
    }

    #[test]
    fn test_bracket_group() {
        let t = words("[ pass thru ]");
        assert_eq!(bracketed(&t).map(|i| i.len()), Some(2));
        let t = words("[ pass ] [ thru ]");
        assert_eq!(bracketed(&t), None);
    }

    #[test]
    fn test_resolve_plain_call() {
        let db = db();
        let m = Matcher::new(&db, Level::Plus);
        let c = m.resolve("pass thru", &facing_couples()).unwrap();
        assert_eq!(c.interpretation, "pass thru");
        assert!(c.concepts.is_empty());
        assert_eq!(c.formation.name(), "back-to-back couples");
    }

    #[test]
    fn test_prefix_completion_and_concepts() {
        let db = db();
        let m = Matcher::new(&db, Level::Plus);
        let plain = m.resolve("square thru", &facing_couples()).unwrap();
        assert_eq!(plain.interpretation, "square thru 4");
        let left = m.resolve("left square thru 2", &facing_couples()).unwrap();
        assert_eq!(left.interpretation, "left square thru 2");
        assert_eq!(left.concepts, vec![Concept::Left]);
        let half = m.resolve("1/2 [square thru 4]", &facing_couples()).unwrap();
        assert_eq!(half.formation, m.resolve("square thru 2", &facing_couples()).unwrap().formation);
    }

    #[test]
    fn test_unknown_text_is_no_match() {
        let db = db();
        let m = Matcher::new(&db, Level::Plus);
        let err = m.resolve("purple nurple", &facing_couples()).unwrap_err();
        assert!(matches!(err, CallError::NoMatch { .. }));
    }

    #[test]
    fn test_level_gates_calls_and_concepts() {
        let db = db();
        let m = Matcher::new(&db, Level::Basic);
        let err = m.resolve("swing thru", &facing_couples()).unwrap_err();
        assert!(matches!(err, CallError::IllegalAtLevel { .. }));
        let err = m.resolve("mirror pass thru", &facing_couples()).unwrap_err();
        assert!(matches!(err, CallError::IllegalAtLevel { .. }));
    }

    #[test]
    fn test_out_of_range_argument() {
        let db = db();
        let m = Matcher::new(&db, Level::Plus);
        let err = m.resolve("square thru 9", &facing_couples()).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidArgument);
    }

    #[test]
    fn test_repetition_counts_are_bounded() {
        let db = db();
        let m = Matcher::new(&db, Level::Plus);
        let err = m
            .resolve("u turn back 3000000000 times", &facing_couples())
            .unwrap_err();
        assert!(matches!(
            err,
            CallError::InvalidArgument { value: 3_000_000_000, min: 1, max: 8, .. }
        ));
        let err = m.resolve("u turn back -1 times", &facing_couples()).unwrap_err();
        assert_eq!(err.code(), crate::error::ErrorCode::InvalidArgument);

        let err = m
            .resolve("[[u turn back 8 times] 8 times] 8 times", &facing_couples())
            .unwrap_err();
        assert!(matches!(err, CallError::InvalidArgument { value: 512, max: 64, .. }));

        let ok = m.resolve("u turn back 3 times", &facing_couples()).unwrap();
        assert_eq!(ok.concepts, vec![Concept::Times(3)]);
    }

    #[test]
    fn test_resolution_is_pure() {
        let db = db();
        let m = Matcher::new(&db, Level::Plus);
        let f = facing_couples();
        let first = m.candidates("right and left thru", &f).unwrap();
        let second = m.candidates("right and left thru", &f).unwrap();
        assert_eq!(first, second);
        assert_eq!(f, facing_couples());
    }
}
