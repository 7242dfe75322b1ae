//! Sequence and history: one dance session at a time.
//!
//! A [`Session`] is either idle or holds an active sequence. Every
//! successful call appends an entry that owns its resulting formation, so
//! undo is just dropping the last entry. Failed commands never change
//! anything. Besides calls a sequence holds comments, and the getouts found
//! by the last "resolve" until the next change.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::calls::{CallDatabase, CallId};
use crate::concept::Concept;
use crate::dancer::{Dancer, DancerId};
use crate::designator::Designator;
use crate::error::CallError;
use crate::formation::Formation;
use crate::geometry::Facing;
use crate::getout::{Getout, GetoutSearch, SearchLimits};
use crate::level::Level;
use crate::matcher::{tokenize, MatchCandidate, Matcher};
use crate::resolve::{check_resolve, Resolve};
use crate::transcript::{Transcript, TranscriptItem};

/// Getouts kept from one "resolve" for "find another".
const GETOUTS_PER_SEARCH: usize = 4;

/// How a sequence begins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StartPosition {
    /// Heads step into the middle; the first call is done by the centers.
    Heads,
    /// Sides step into the middle; the first call is done by the centers.
    Sides,
    /// "Just as they are": the squared set.
    SquaredSet,
    /// Couples 1 and 3 facing each other, nobody else.
    TwoCouples,
}

impl StartPosition {
    pub const ALL: [StartPosition; 4] = [
        StartPosition::Heads,
        StartPosition::Sides,
        StartPosition::SquaredSet,
        StartPosition::TwoCouples,
    ];

    /// The command that starts a sequence this way.
    pub fn command(self) -> &'static str {
        match self {
            StartPosition::Heads => "heads start",
            StartPosition::Sides => "sides start",
            StartPosition::SquaredSet => "just as they are",
            StartPosition::TwoCouples => "two couples only",
        }
    }

    /// Recognizes a start command, ignoring case and spacing.
    pub fn from_command(text: &str) -> Option<StartPosition> {
        let words = tokenize(text).join(" ");
        StartPosition::ALL.into_iter().find(|s| s.command() == words)
    }

    pub fn formation(self) -> Result<Formation, CallError> {
        let d = |id: DancerId, x: i32, y: i32, facing: Facing| Dancer::real(id, x, y, facing);
        let (b, g) = (DancerId::boy, DancerId::girl);
        match self {
            StartPosition::SquaredSet => Ok(Formation::home()),
            StartPosition::Heads => Formation::new(vec![
                d(b(1), -1, -1, Facing::NORTH),
                d(g(1), 1, -1, Facing::NORTH),
                d(b(3), 1, 1, Facing::SOUTH),
                d(g(3), -1, 1, Facing::SOUTH),
                d(b(2), 3, -1, Facing::WEST),
                d(g(2), 3, 1, Facing::WEST),
                d(b(4), -3, 1, Facing::EAST),
                d(g(4), -3, -1, Facing::EAST),
            ]),
            StartPosition::Sides => Formation::new(vec![
                d(b(2), 1, -1, Facing::WEST),
                d(g(2), 1, 1, Facing::WEST),
                d(b(4), -1, 1, Facing::EAST),
                d(g(4), -1, -1, Facing::EAST),
                d(b(1), -1, -3, Facing::NORTH),
                d(g(1), 1, -3, Facing::NORTH),
                d(b(3), 1, 3, Facing::SOUTH),
                d(g(3), -1, 3, Facing::SOUTH),
            ]),
            StartPosition::TwoCouples => Formation::new(vec![
                d(b(1), -1, -1, Facing::NORTH),
                d(g(1), 1, -1, Facing::NORTH),
                d(b(3), 1, 1, Facing::SOUTH),
                d(g(3), -1, 1, Facing::SOUTH),
            ]),
        }
    }

    fn implicit_designator(self) -> Option<Designator> {
        match self {
            StartPosition::Heads | StartPosition::Sides => Some(Designator::Centers),
            StartPosition::SquaredSet | StartPosition::TwoCouples => None,
        }
    }
}

impl fmt::Display for StartPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.command())
    }
}

impl FromStr for StartPosition {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "heads" => Ok(StartPosition::Heads),
            "sides" => Ok(StartPosition::Sides),
            "squared" | "squared_set" | "home" => Ok(StartPosition::SquaredSet),
            "two_couples" | "two-couples" => Ok(StartPosition::TwoCouples),
            other => StartPosition::from_command(other)
                .ok_or_else(|| format!("unknown start position '{}'", s)),
        }
    }
}

/// Per-session settings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub level: Level,
}

/// One committed call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SequenceEntry {
    /// The text as it was typed.
    pub text: String,
    /// How the matcher read it.
    pub interpretation: String,
    pub call: CallId,
    pub concepts: Vec<Concept>,
    pub formation: Formation,
    pub resolve: Option<Resolve>,
}

/// A comment typed before call number `before + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Comment {
    before: usize,
    text: String,
}

#[derive(Debug, Clone)]
struct Sequence {
    start: StartPosition,
    initial: Formation,
    entries: Vec<SequenceEntry>,
    comments: Vec<Comment>,
    getouts: Vec<Getout>,
    shown: usize,
}

impl Sequence {
    fn new(start: StartPosition, initial: Formation) -> Self {
        Self {
            start,
            initial,
            entries: Vec::new(),
            comments: Vec::new(),
            getouts: Vec::new(),
            shown: 0,
        }
    }

    fn current(&self) -> &Formation {
        self.entries
            .last()
            .map(|e| &e.formation)
            .unwrap_or(&self.initial)
    }
}

#[derive(Debug, Clone)]
enum State {
    Idle,
    Active(Sequence),
}

/// What a line of input did, for the text adapter to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    Started {
        start: StartPosition,
        formation: Formation,
    },
    Called(SequenceEntry),
    Undone {
        formation: Formation,
        remaining: usize,
    },
    /// "abort this sequence" needs a "y" to go through.
    ConfirmAbort,
    Aborted,
    ResolveStatus(Option<Resolve>),
    /// One of the getouts found by "resolve", `number` of `found`.
    Getout {
        getout: Getout,
        number: usize,
        found: usize,
    },
    /// The calls of an accepted getout, now part of the sequence.
    Accepted(Vec<SequenceEntry>),
    Commented(String),
    Written(Transcript),
    Nothing,
}

/// A dance session: the current sequence over a shared call database.
#[derive(Debug, Clone)]
pub struct Session {
    db: Arc<CallDatabase>,
    config: SessionConfig,
    state: State,
    abort_pending: bool,
}

impl Session {
    pub fn new(db: Arc<CallDatabase>, config: SessionConfig) -> Self {
        Self {
            db,
            config,
            state: State::Idle,
            abort_pending: false,
        }
    }

    pub fn database(&self) -> &CallDatabase {
        &self.db
    }

    pub fn level(&self) -> Level {
        self.config.level
    }

    pub fn set_level(&mut self, level: Level) {
        self.config.level = level;
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, State::Active(_))
    }

    /// The current formation, if a sequence is active.
    pub fn formation(&self) -> Option<&Formation> {
        match &self.state {
            State::Active(seq) => Some(seq.current()),
            State::Idle => None,
        }
    }

    pub fn start(&self) -> Option<StartPosition> {
        match &self.state {
            State::Active(seq) => Some(seq.start),
            State::Idle => None,
        }
    }

    pub fn entries(&self) -> &[SequenceEntry] {
        match &self.state {
            State::Active(seq) => &seq.entries,
            State::Idle => &[],
        }
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn sequence(&self) -> Result<&Sequence, CallError> {
        match &self.state {
            State::Active(seq) => Ok(seq),
            State::Idle => Err(CallError::NoActiveSession),
        }
    }

    fn sequence_mut(&mut self) -> Result<&mut Sequence, CallError> {
        match &mut self.state {
            State::Active(seq) => Ok(seq),
            State::Idle => Err(CallError::NoActiveSession),
        }
    }

    /// Idle to active. Fails with [`CallError::SequenceInProgress`] while a
    /// sequence is running.
    pub fn start_session(&mut self, start: StartPosition) -> Result<&Formation, CallError> {
        if self.is_active() {
            return Err(CallError::SequenceInProgress);
        }
        let initial = start.formation()?;
        info!(start = %start, "sequence started");
        self.state = State::Active(Sequence::new(start, initial));
        self.abort_pending = false;
        self.sequence().map(Sequence::current)
    }

    fn matcher(&self, seq: &Sequence) -> Matcher<'_> {
        let implicit = if seq.entries.is_empty() {
            seq.start.implicit_designator()
        } else {
            None
        };
        Matcher::new(&self.db, self.config.level).with_implicit(implicit)
    }

    /// Resolves `text` against the current formation without committing it.
    pub fn preview(&self, text: &str) -> Result<MatchCandidate, CallError> {
        let seq = self.sequence()?;
        self.matcher(seq).resolve(text, seq.current())
    }

    /// Resolves and commits one call.
    pub fn apply_call(&mut self, text: &str) -> Result<&SequenceEntry, CallError> {
        let candidate = self.preview(text)?;
        let resolve = check_resolve(&candidate.formation);
        let entry = SequenceEntry {
            text: text.trim().to_string(),
            interpretation: candidate.interpretation,
            call: candidate.call,
            concepts: candidate.concepts,
            formation: candidate.formation,
            resolve,
        };
        info!(call = %entry.interpretation, setup = %entry.formation.name(), "call committed");
        if let Some(r) = resolve {
            info!(resolve = %r, "resolve reached");
        }
        let seq = self.sequence_mut()?;
        seq.getouts.clear();
        let index = seq.entries.len();
        seq.entries.push(entry);
        Ok(&seq.entries[index])
    }

    /// Drops the last entry, and any comment typed after it, and returns
    /// the formation before it.
    pub fn undo_last_call(&mut self) -> Result<&Formation, CallError> {
        let seq = self.sequence_mut()?;
        let undone = seq.entries.pop().ok_or(CallError::NothingToUndo)?;
        let remaining = seq.entries.len();
        seq.comments.retain(|c| c.before <= remaining);
        seq.getouts.clear();
        info!(call = %undone.interpretation, "call undone");
        Ok(seq.current())
    }

    /// Records a comment before the next call.
    pub fn insert_comment(&mut self, text: &str) -> Result<(), CallError> {
        let seq = self.sequence_mut()?;
        let before = seq.entries.len();
        seq.comments.push(Comment {
            before,
            text: text.trim().to_string(),
        });
        Ok(())
    }

    /// Searches for getouts from the current formation with the default
    /// limits. The results are kept for [`Session::next_getout`] and
    /// [`Session::accept_getout`].
    pub fn find_getouts(&mut self) -> Result<&[Getout], CallError> {
        self.find_getouts_within(SearchLimits::default())
    }

    pub fn find_getouts_within(&mut self, limits: SearchLimits) -> Result<&[Getout], CallError> {
        let seq = self.sequence()?;
        let search = GetoutSearch::new(self.matcher(seq), limits);
        let found = search.find(seq.current(), GETOUTS_PER_SEARCH);
        info!(found = found.len(), "getout search");
        let seq = self.sequence_mut()?;
        seq.getouts = found;
        seq.shown = 0;
        Ok(&seq.getouts)
    }

    /// Moves to the next getout of the last search, wrapping around.
    pub fn next_getout(&mut self) -> Result<(usize, &Getout), CallError> {
        let seq = self.sequence_mut()?;
        if seq.getouts.is_empty() {
            return Err(CallError::NoGetout);
        }
        seq.shown = (seq.shown + 1) % seq.getouts.len();
        Ok((seq.shown, &seq.getouts[seq.shown]))
    }

    /// Commits the calls of the getout being shown. If one of them fails,
    /// the ones already done are taken back.
    pub fn accept_getout(&mut self) -> Result<Vec<SequenceEntry>, CallError> {
        let seq = self.sequence()?;
        let getout = seq.getouts.get(seq.shown).cloned().ok_or(CallError::NoGetout)?;
        let mut done = Vec::with_capacity(getout.calls.len());
        for text in &getout.calls {
            match self.apply_call(text) {
                Ok(entry) => done.push(entry.clone()),
                Err(e) => {
                    for _ in 0..done.len() {
                        self.undo_last_call()?;
                    }
                    return Err(e);
                }
            }
        }
        info!(calls = done.len(), resolve = %getout.resolve, "getout accepted");
        Ok(done)
    }

    /// The sequence so far, in written form.
    pub fn transcript(&self) -> Result<Transcript, CallError> {
        let seq = self.sequence()?;
        let mut items = Vec::new();
        let comments_before = |n: usize| {
            seq.comments
                .iter()
                .filter(move |c| c.before == n)
                .map(|c| TranscriptItem::Comment {
                    text: c.text.clone(),
                })
        };
        for (i, entry) in seq.entries.iter().enumerate() {
            items.extend(comments_before(i));
            items.push(TranscriptItem::Call {
                number: i + 1,
                interpretation: entry.interpretation.clone(),
                setup: entry.formation.name(),
            });
        }
        items.extend(comments_before(seq.entries.len()));
        Ok(Transcript {
            start: seq.start,
            level: self.config.level,
            items,
            resolve: check_resolve(seq.current()),
        })
    }

    /// Resolve status of the current formation.
    pub fn check_resolve(&self) -> Result<Option<Resolve>, CallError> {
        Ok(check_resolve(self.sequence()?.current()))
    }

    /// Active to idle, discarding the history.
    pub fn abort_sequence(&mut self) -> Result<(), CallError> {
        let seq = self.sequence()?;
        info!(calls = seq.entries.len(), "sequence aborted");
        self.state = State::Idle;
        self.abort_pending = false;
        Ok(())
    }

    /// Handles one line of typed input: a meta-command or a call.
    pub fn handle_line(&mut self, line: &str) -> Result<Response, CallError> {
        let words = tokenize(line).join(" ");
        let confirming = std::mem::take(&mut self.abort_pending);
        debug!(line = %words, "input");
        if words.is_empty() {
            return Ok(Response::Nothing);
        }
        if let Some(text) = comment_text(line) {
            self.insert_comment(text)?;
            return Ok(Response::Commented(text.trim().to_string()));
        }
        if let Some(start) = StartPosition::from_command(&words) {
            let formation = self.start_session(start)?.clone();
            return Ok(Response::Started { start, formation });
        }
        match words.as_str() {
            "undo" | "undo last call" => {
                let formation = self.undo_last_call()?.clone();
                Ok(Response::Undone {
                    formation,
                    remaining: self.len(),
                })
            }
            "abort" | "abort this sequence" => {
                self.sequence()?;
                self.abort_pending = true;
                Ok(Response::ConfirmAbort)
            }
            "y" | "yes" if confirming => {
                self.abort_sequence()?;
                Ok(Response::Aborted)
            }
            "resolve" => {
                if let Some(r) = self.check_resolve()? {
                    return Ok(Response::ResolveStatus(Some(r)));
                }
                let found = self.find_getouts()?.len();
                let seq = self.sequence()?;
                Ok(match seq.getouts.first() {
                    Some(getout) => Response::Getout {
                        getout: getout.clone(),
                        number: 1,
                        found,
                    },
                    None => Response::ResolveStatus(None),
                })
            }
            "find another" | "next" => {
                let found = self.sequence()?.getouts.len();
                let (index, getout) = self.next_getout()?;
                Ok(Response::Getout {
                    getout: getout.clone(),
                    number: index + 1,
                    found,
                })
            }
            "accept" | "accept current choice" => self.accept_getout().map(Response::Accepted),
            "write" | "write this sequence" => self.transcript().map(Response::Written),
            _ => self.apply_call(line).cloned().map(Response::Called),
        }
    }
}

/// The text of "comment ..." or "insert a comment ...", case kept.
fn comment_text(line: &str) -> Option<&str> {
    let line = line.trim();
    ["insert a comment", "comment"].into_iter().find_map(|prefix| {
        let head = line.get(..prefix.len())?;
        let rest = &line[prefix.len()..];
        (head.eq_ignore_ascii_case(prefix) && rest.starts_with(char::is_whitespace))
            .then_some(rest.trim())
            .filter(|t| !t.is_empty())
    })
}
