//! The loaded, immutable call database.

use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use super::loader;
use super::model::{ArgumentRange, CallFlags, Modifier, Repeat, Scheme};
use super::pattern::{normalize, Arguments, NamePattern};
use crate::body::{ArrayCall, CallBody};
use crate::concept::Concept;
use crate::designator::Designator;
use crate::error::{CallError, TableError};
use crate::level::Level;
use crate::setup::SetupKind;

/// Call table shipped with the crate.
pub const DEFAULT_TABLE: &str = include_str!("default.json");

/// Index of a call in its database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct CallId(pub(crate) usize);

impl CallId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// How a part of a compound call is done.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum PartAction {
    Call { id: CallId, args: Arguments },
    Schemes(Vec<Scheme>),
    Parts(Vec<PartTemplate>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PartTemplate {
    pub action: PartAction,
    pub times: Repeat,
    pub concept: Option<Concept>,
    pub who: Option<Designator>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum BodyTemplate {
    Schemes(Vec<Scheme>),
    Parts(Vec<PartTemplate>),
}

/// One call as loaded from the table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallDefinition {
    pub name: String,
    pub pattern: NamePattern,
    pub aliases: Vec<NamePattern>,
    pub level: Level,
    pub modifiers: Vec<Modifier>,
    pub flags: CallFlags,
    pub argument: Option<ArgumentRange>,
    /// Setup kinds the call can start from.
    pub setups: BTreeSet<SetupKind>,
    /// Line of the entry in the table source.
    pub line: Option<usize>,
    pub(crate) body: BodyTemplate,
}

impl CallDefinition {
    /// Helpers whose names start with `_` are only used by other calls.
    pub fn is_hidden(&self) -> bool {
        self.name.starts_with('_')
    }

    /// The name as the user would say it with these arguments.
    pub fn display_name(&self, args: &Arguments) -> String {
        let mut args = *args;
        if args.number.is_none() {
            args.number = self.argument.and_then(|a| a.default);
        }
        self.pattern.render(&args)
    }

    fn patterns(&self) -> impl Iterator<Item = &NamePattern> {
        std::iter::once(&self.pattern).chain(self.aliases.iter())
    }

    fn default_number(&self) -> Option<i64> {
        self.argument.and_then(|a| a.default)
    }

    /// Exact match of the tokens against the name or an alias.
    pub(crate) fn match_exact(&self, tokens: &[String]) -> Option<Arguments> {
        self.patterns()
            .find_map(|p| p.matches(tokens, self.default_number()))
    }

    fn match_prefix(&self, tokens: &[String]) -> Option<Arguments> {
        self.patterns()
            .find_map(|p| p.completes(tokens, self.default_number()))
    }
}

/// A call found by name, with the arguments bound by the name.
#[derive(Debug, Clone, Copy)]
pub struct NameMatch<'a> {
    pub id: CallId,
    pub call: &'a CallDefinition,
    pub args: Arguments,
    /// False when the text only completed a longer name.
    pub exact: bool,
}

/// Every call definition, loaded once and never changed afterwards.
#[derive(Debug, Clone)]
pub struct CallDatabase {
    version: u32,
    calls: Vec<CallDefinition>,
    touch: Option<CallId>,
}

impl CallDatabase {
    /// Parses a call table.
    pub fn load_call_table(source: &str) -> Result<CallDatabase, TableError> {
        let loaded = loader::load(source)?;
        debug!(calls = loaded.calls.len(), "call table loaded");
        Ok(CallDatabase {
            version: loaded.version,
            calls: loaded.calls,
            touch: loaded.touch,
        })
    }

    /// Reads and parses a call table file.
    pub fn load_file(path: &Path) -> Result<CallDatabase, TableError> {
        let source = std::fs::read_to_string(path)?;
        Self::load_call_table(&source)
    }

    /// The table shipped with the crate.
    pub fn builtin() -> Result<CallDatabase, TableError> {
        Self::load_call_table(DEFAULT_TABLE)
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn get(&self, id: CallId) -> Option<&CallDefinition> {
        self.calls.get(id.0)
    }

    /// All calls, in table order, with their ids.
    pub fn calls(&self) -> impl Iterator<Item = (CallId, &CallDefinition)> {
        self.calls.iter().enumerate().map(|(i, c)| (CallId(i), c))
    }

    /// Case-insensitive lookup: exact matches if there are any, otherwise
    /// every name the text is a word prefix of. Hidden helpers never match.
    pub fn lookup_by_name(&self, text: &str) -> Vec<NameMatch<'_>> {
        self.lookup_tokens(&normalize(text))
    }

    pub(crate) fn lookup_tokens(&self, tokens: &[String]) -> Vec<NameMatch<'_>> {
        if tokens.is_empty() {
            return Vec::new();
        }
        let visible = || self.calls().filter(|(_, c)| !c.is_hidden());
        let exact: Vec<NameMatch<'_>> = visible()
            .filter_map(|(id, call)| {
                call.match_exact(tokens).map(|args| NameMatch {
                    id,
                    call,
                    args,
                    exact: true,
                })
            })
            .collect();
        if !exact.is_empty() {
            return exact;
        }
        visible()
            .filter_map(|(id, call)| {
                call.match_prefix(tokens).map(|args| NameMatch {
                    id,
                    call,
                    args,
                    exact: false,
                })
            })
            .collect()
    }

    /// Builds the executable body of a call.
    ///
    /// Fails with [`CallError::InvalidArgument`] when the number is outside
    /// the call's declared range.
    pub fn instantiate(&self, id: CallId, args: Arguments) -> Result<CallBody, CallError> {
        let call = self.get(id).ok_or_else(|| CallError::NoMatch {
            text: id.to_string(),
            reasons: vec!["no such call".to_string()],
        })?;
        let number = match call.argument {
            Some(range) => {
                let n = args.number.or(range.default).ok_or_else(|| CallError::NoMatch {
                    text: call.name.clone(),
                    reasons: vec!["a number is needed".to_string()],
                })?;
                if !range.contains(n) {
                    return Err(CallError::InvalidArgument {
                        call: call.pattern.to_string(),
                        value: n,
                        min: range.min,
                        max: range.max,
                    });
                }
                Some(n)
            }
            None => None,
        };

        let body = match &call.body {
            BodyTemplate::Schemes(schemes) => array(schemes, args.designator, call.flags),
            BodyTemplate::Parts(parts) => {
                CallBody::sequence(self.build_parts(parts, number, args.designator, call.flags)?)
            }
        };

        match self.touch {
            Some(touch) if call.flags.step_to_wave && touch != id => Ok(CallBody::StepToWave {
                touch: Box::new(self.instantiate(touch, Arguments::default())?),
                body: Box::new(body),
            }),
            _ => Ok(body),
        }
    }

    fn build_parts(
        &self,
        parts: &[PartTemplate],
        number: Option<i64>,
        designator: Option<Designator>,
        flags: CallFlags,
    ) -> Result<Vec<CallBody>, CallError> {
        let mut items = Vec::new();
        for part in parts {
            let mut body = match &part.action {
                PartAction::Call { id, args } => self.instantiate(*id, *args)?,
                PartAction::Schemes(schemes) => array(schemes, designator, flags),
                PartAction::Parts(inner) => {
                    CallBody::sequence(self.build_parts(inner, number, designator, flags)?)
                }
            };
            if let Some(concept) = part.concept {
                body = concept
                    .transform(&body, &body)
                    .ok_or_else(|| CallError::ConceptNotApplicable {
                        concept: concept.to_string(),
                        call: "a part".to_string(),
                    })?;
            }
            if let Some(who) = part.who {
                body = CallBody::Selective {
                    who,
                    body: Box::new(body),
                };
            }
            let count = part.times.count(number).unwrap_or(1).max(0);
            for _ in 0..count {
                items.push(body.clone());
            }
        }
        Ok(items)
    }
}

fn array(schemes: &[Scheme], designator: Option<Designator>, flags: CallFlags) -> CallBody {
    CallBody::Array(ArrayCall {
        schemes: schemes.to_vec(),
        grand: false,
        designator,
        real_only: flags.real_only,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn db() -> CallDatabase {
        CallDatabase::builtin().unwrap()
    }

    #[test]
    fn test_builtin_table_loads() {
        let db = db();
        assert_eq!(db.version(), 1);
        assert!(db.len() >= 30);
        assert!(db.calls().any(|(_, c)| c.is_hidden()));
    }

    #[test]
    fn test_lookup_exact_alias_and_prefix() {
        let db = db();
        let found = db.lookup_by_name("Square  Thru 3");
        assert_eq!(found.len(), 1);
        assert!(found[0].exact);
        assert_eq!(found[0].args.number, Some(3));
        assert_eq!(found[0].call.display_name(&found[0].args), "square thru 3");

        let touch = db.lookup_by_name("touch");
        assert_eq!(touch.len(), 1);
        assert_eq!(touch[0].call.name, "step to a wave");

        let prefix = db.lookup_by_name("ferris");
        assert_eq!(prefix.len(), 1);
        assert!(!prefix[0].exact);

        assert!(db.lookup_by_name("purple nurple").is_empty());
        assert!(db.lookup_by_name("face partner").is_empty());
    }

    #[test]
    fn test_square_thru_has_one_part_per_hand() {
        let db = db();
        let id = db.lookup_by_name("square thru 4")[0].id;
        let body = db
            .instantiate(
                id,
                Arguments {
                    number: Some(4),
                    designator: None,
                },
            )
            .unwrap();
        assert_eq!(body.parts().len(), 4);

        let one = db
            .instantiate(
                id,
                Arguments {
                    number: Some(1),
                    designator: None,
                },
            )
            .unwrap();
        assert_eq!(one.parts().len(), 1);
    }

    #[test]
    fn test_argument_out_of_range() {
        let db = db();
        let id = db.lookup_by_name("circulate")[0].id;
        let err = db
            .instantiate(
                id,
                Arguments {
                    number: Some(-1),
                    designator: None,
                },
            )
            .unwrap_err();
        assert_eq!(
            err,
            CallError::InvalidArgument {
                call: "circulate <N>".into(),
                value: -1,
                min: 1,
                max: 7
            }
        );
    }

    #[test]
    fn test_step_to_wave_wraps_the_body() {
        let db = db();
        let id = db.lookup_by_name("swing thru")[0].id;
        let body = db.instantiate(id, Arguments::default()).unwrap();
        assert!(matches!(body, CallBody::StepToWave { .. }));
    }

    #[test]
    fn test_setups_follow_division() {
        let db = db();
        let pass_thru = db.lookup_by_name("pass thru")[0].call;
        assert!(pass_thru.setups.contains(&SetupKind::TwoByFour));
        assert!(!pass_thru.setups.contains(&SetupKind::Diamond));
        let ferris = db.lookup_by_name("ferris wheel")[0].call;
        assert_eq!(ferris.setups.len(), 1);
    }
}
