//! Getout search: a short list of plain calls that takes the current
//! formation to a resolve.
//!
//! The search is breadth first over every visible call of the session
//! level (each `<anyone>` and `<N>` slot filled in a few ways), so shorter
//! getouts come first and the same formation always gives the same answers.
//! Formations already seen are not expanded again, and both the number of
//! calls and the number of formations expanded are capped.

use std::collections::{HashSet, VecDeque};

use serde::Serialize;
use tracing::debug;

use crate::calls::{Arguments, CallDatabase};
use crate::designator::Designator;
use crate::formation::Formation;
use crate::level::Level;
use crate::matcher::Matcher;
use crate::resolve::{check_resolve, Resolve};

/// Designators tried in `<anyone>` slots.
const SEARCH_DESIGNATORS: [Designator; 4] = [
    Designator::Boys,
    Designator::Girls,
    Designator::Centers,
    Designator::Ends,
];

/// Largest `<N>` tried.
const SEARCH_MAX_NUMBER: i64 = 4;

/// Bounds on one search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Most calls in one getout.
    pub max_calls: usize,
    /// Most formations expanded before giving up.
    pub max_states: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self {
            max_calls: 3,
            max_states: 2_000,
        }
    }
}

/// Calls that reach a resolve, in the order they are to be done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Getout {
    pub calls: Vec<String>,
    pub resolve: Resolve,
    #[serde(skip)]
    pub formation: Formation,
}

/// Call texts the search tries, in table order.
pub fn vocabulary(db: &CallDatabase, level: Level) -> Vec<String> {
    let mut out = Vec::new();
    for (_, call) in db.calls() {
        if call.is_hidden() || call.level > level {
            continue;
        }
        let designators: Vec<Option<Designator>> = if call.pattern.has_anyone() {
            SEARCH_DESIGNATORS.iter().copied().map(Some).collect()
        } else {
            vec![None]
        };
        let numbers: Vec<Option<i64>> = match call.argument {
            Some(range) if call.pattern.has_number() => {
                (range.min..=range.max.min(SEARCH_MAX_NUMBER)).map(Some).collect()
            }
            _ => vec![None],
        };
        for &designator in &designators {
            for &number in &numbers {
                let text = call.display_name(&Arguments { number, designator });
                if !out.contains(&text) {
                    out.push(text);
                }
            }
        }
    }
    out
}

/// Searches for getouts from one formation.
#[derive(Debug, Clone)]
pub struct GetoutSearch<'a> {
    first: Matcher<'a>,
    rest: Matcher<'a>,
    vocabulary: Vec<String>,
    limits: SearchLimits,
}

impl<'a> GetoutSearch<'a> {
    /// `first` resolves the first call of a getout; later calls never have
    /// an implicit designator.
    pub fn new(first: Matcher<'a>, limits: SearchLimits) -> Self {
        Self {
            first,
            rest: first.with_implicit(None),
            vocabulary: vocabulary(first.database(), first.level()),
            limits,
        }
    }

    /// Up to `count` getouts, shortest first. A formation that is already a
    /// resolve gives one empty getout.
    pub fn find(&self, formation: &Formation, count: usize) -> Vec<Getout> {
        let mut found = Vec::new();
        if count == 0 {
            return found;
        }
        if let Some(resolve) = check_resolve(formation) {
            found.push(Getout {
                calls: Vec::new(),
                resolve,
                formation: formation.clone(),
            });
            return found;
        }

        let mut seen: HashSet<Formation> = HashSet::new();
        seen.insert(formation.without_roll());
        let mut queue: VecDeque<(Formation, Vec<String>)> = VecDeque::new();
        queue.push_back((formation.clone(), Vec::new()));
        let mut expanded = 0usize;

        while let Some((current, path)) = queue.pop_front() {
            if path.len() >= self.limits.max_calls || expanded >= self.limits.max_states {
                continue;
            }
            expanded += 1;
            let matcher = if path.is_empty() { self.first } else { self.rest };
            for text in &self.vocabulary {
                let Ok(candidate) = matcher.resolve(text, &current) else {
                    continue;
                };
                let mut calls = path.clone();
                calls.push(text.clone());
                if let Some(resolve) = check_resolve(&candidate.formation) {
                    found.push(Getout {
                        calls,
                        resolve,
                        formation: candidate.formation,
                    });
                    if found.len() >= count {
                        debug!(expanded, found = found.len(), "getout search finished");
                        return found;
                    }
                    continue;
                }
                if seen.insert(candidate.formation.without_roll()) {
                    queue.push_back((candidate.formation, calls));
                }
            }
        }
        debug!(expanded, found = found.len(), "getout search exhausted");
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::StartPosition;
    use pretty_assertions::assert_eq;

    fn db() -> CallDatabase {
        CallDatabase::builtin().unwrap()
    }

    /// Eight chain thru one call away from the left allemande.
    fn faced_out() -> Formation {
        let db = db();
        let m = Matcher::new(&db, Level::Plus);
        let start = StartPosition::Heads.formation().unwrap();
        let resolved = m
            .with_implicit(Some(Designator::Centers))
            .resolve("square thru 4", &start)
            .unwrap()
            .formation;
        assert!(check_resolve(&resolved).is_some());
        m.resolve("u turn back", &resolved).unwrap().formation
    }

    #[test]
    fn test_vocabulary_fills_slots_and_respects_level() {
        let db = db();
        let words = vocabulary(&db, Level::Plus);
        assert!(words.contains(&"pass thru".to_string()));
        assert!(words.contains(&"boys run".to_string()));
        assert!(words.contains(&"square thru 2".to_string()));
        assert!(!words.iter().any(|w| w.starts_with('_') || w.contains('<')));
        let basic = vocabulary(&db, Level::Basic);
        assert!(basic.len() < words.len());
        assert!(!basic.contains(&"swing thru".to_string()));
    }

    #[test]
    fn test_one_call_getout() {
        let db = db();
        let search = GetoutSearch::new(Matcher::new(&db, Level::Plus), SearchLimits::default());
        let f = faced_out();
        assert_eq!(check_resolve(&f), None);
        let found = search.find(&f, 1);
        assert_eq!(found.len(), 1);
        let getout = &found[0];
        assert_eq!(getout.calls.len(), 1);
        assert_eq!(check_resolve(&getout.formation), Some(getout.resolve));

        let again = search.find(&f, 1);
        assert_eq!(again, found);
    }

    #[test]
    fn test_resolved_formation_needs_no_calls() {
        let db = db();
        let search = GetoutSearch::new(Matcher::new(&db, Level::Plus), SearchLimits::default());
        let found = search.find(&Formation::home(), 3);
        assert_eq!(found.len(), 1);
        assert!(found[0].calls.is_empty());
        assert_eq!(found[0].resolve, Resolve::AtHome);
    }

    #[test]
    fn test_search_respects_its_limits() {
        let db = db();
        let limits = SearchLimits {
            max_calls: 0,
            max_states: 10,
        };
        let search = GetoutSearch::new(Matcher::new(&db, Level::Plus), limits);
        assert!(search.find(&faced_out(), 1).is_empty());
        assert!(search.find(&faced_out(), 0).is_empty());
    }
}
