//! sd Call Interpreter Core
//!
//! This crate turns typed square dance calls into dancer formations. It owns
//! the formation model, the data-driven call database, the concept engine,
//! the matcher that reads call text, and the session that keeps a sequence
//! with undo and resolve detection.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use sd_core::{CallDatabase, Session, SessionConfig, StartPosition};
//!
//! let db = Arc::new(CallDatabase::builtin().unwrap());
//! let mut session = Session::new(db, SessionConfig::default());
//! session.start_session(StartPosition::Heads).unwrap();
//!
//! let entry = session.apply_call("square thru 4").unwrap();
//! assert_eq!(entry.formation.name(), "eight chain thru");
//!
//! session.undo_last_call().unwrap();
//! assert!(session.is_empty());
//! ```
//!
//! # Modules
//!
//! - [`formation`]: dancers, setups and geometry helpers
//! - [`calls`]: call table format, loader and [`CallDatabase`]
//! - [`concept`]: concepts as pure transforms of call bodies
//! - [`exec`]: the evaluator that runs a call body on a formation
//! - [`matcher`]: reading call text and picking the interpretation
//! - [`session`]: the sequence state machine
//! - [`resolve`]: resolve detection
//! - [`getout`]: searching for calls that reach a resolve
//! - [`transcript`]: the written form of a sequence
//! - [`error`]: error taxonomy and codes

pub mod body;
pub mod calls;
pub mod concept;
pub mod dancer;
pub mod designator;
pub mod error;
pub mod exec;
pub mod formation;
pub mod geometry;
pub mod getout;
pub mod level;
pub mod matcher;
pub mod resolve;
pub mod session;
pub mod setup;
pub mod transcript;

// Re-export commonly used types at the crate root
pub use body::CallBody;
pub use calls::{CallDatabase, CallDefinition, CallId, NameMatch};
pub use concept::{apply_concept, Concept, PreparedCall};
pub use dancer::{Dancer, DancerId, Gender, Person};
pub use designator::Designator;
pub use error::{CallError, ErrorCode, TableDiagnostic, TableError};
pub use formation::{distance_between, is_adjacent, Formation};
pub use geometry::{Axis, Facing, Hand, Position};
pub use getout::{Getout, GetoutSearch, SearchLimits};
pub use level::Level;
pub use matcher::{MatchCandidate, Matcher};
pub use resolve::{check_resolve, Resolve};
pub use session::{Response, SequenceEntry, Session, SessionConfig, StartPosition};
pub use setup::{classify_positions, SetupKind};
pub use transcript::{Transcript, TranscriptItem};
