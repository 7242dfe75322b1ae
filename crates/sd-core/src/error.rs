//! Error types for call resolution, sessions and call-table loading.

use std::fmt;

use thiserror::Error;

use crate::level::Level;

/// Stable error codes shown next to every user-visible failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Per-call errors (SD001-SD009)
    /// SD001: Dancer geometry matches no known setup
    UnrecognizedSetup,
    /// SD002: No legal interpretation of the call
    NoMatch,
    /// SD003: Several legal interpretations and no tie-break
    AmbiguousMatch,
    /// SD004: Concept cannot transform the call
    ConceptNotApplicable,
    /// SD005: Concept name is not known
    UnknownConcept,
    /// SD006: Numeric argument outside the declared range
    InvalidArgument,
    /// SD007: Undo requested with an empty sequence
    NothingToUndo,
    /// SD008: Call or concept is above the session level
    IllegalAtLevel,
    /// SD009: "find another" or "accept" without a resolve search
    NoGetout,

    // Session errors (SD010-SD011)
    /// SD010: No sequence has been started
    NoActiveSession,
    /// SD011: A start command was given in the middle of a sequence
    SequenceInProgress,

    // Startup errors (SD100)
    /// SD100: The call table could not be loaded
    MalformedCallTable,
}

impl ErrorCode {
    /// Returns the error code string (e.g., "SD001").
    pub fn code(&self) -> &'static str {
        match self {
            ErrorCode::UnrecognizedSetup => "SD001",
            ErrorCode::NoMatch => "SD002",
            ErrorCode::AmbiguousMatch => "SD003",
            ErrorCode::ConceptNotApplicable => "SD004",
            ErrorCode::UnknownConcept => "SD005",
            ErrorCode::InvalidArgument => "SD006",
            ErrorCode::NothingToUndo => "SD007",
            ErrorCode::IllegalAtLevel => "SD008",
            ErrorCode::NoGetout => "SD009",
            ErrorCode::NoActiveSession => "SD010",
            ErrorCode::SequenceInProgress => "SD011",
            ErrorCode::MalformedCallTable => "SD100",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// A recoverable failure of one call or command. The session state is left
/// untouched whenever one of these is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CallError {
    #[error("unrecognized setup: {0}")]
    UnrecognizedSetup(String),

    #[error("no matches for \"{text}\"{}", format_reasons(.reasons))]
    NoMatch { text: String, reasons: Vec<String> },

    #[error("\"{text}\" is ambiguous: {}", .interpretations.join(" / "))]
    AmbiguousMatch {
        text: String,
        interpretations: Vec<String>,
    },

    #[error("concept \"{concept}\" cannot be applied to \"{call}\"")]
    ConceptNotApplicable { concept: String, call: String },

    #[error("unknown concept \"{0}\"")]
    UnknownConcept(String),

    #[error("argument {value} to \"{call}\" is outside {min}..={max}")]
    InvalidArgument {
        call: String,
        value: i64,
        min: i64,
        max: i64,
    },

    #[error("nothing to undo")]
    NothingToUndo,

    #[error("\"{name}\" is {required}, above the current level ({current})")]
    IllegalAtLevel {
        name: String,
        required: Level,
        current: Level,
    },

    #[error("no resolve has been found; type \"resolve\" first")]
    NoGetout,

    #[error("no sequence is active; start one with \"heads start\", \"sides start\" or \"just as they are\"")]
    NoActiveSession,

    #[error("a sequence is already in progress; abort it first")]
    SequenceInProgress,
}

fn format_reasons(reasons: &[String]) -> String {
    match reasons.first() {
        Some(first) => format!(" ({first})"),
        None => String::new(),
    }
}

impl CallError {
    pub fn code(&self) -> ErrorCode {
        match self {
            CallError::UnrecognizedSetup(_) => ErrorCode::UnrecognizedSetup,
            CallError::NoMatch { .. } => ErrorCode::NoMatch,
            CallError::AmbiguousMatch { .. } => ErrorCode::AmbiguousMatch,
            CallError::ConceptNotApplicable { .. } => ErrorCode::ConceptNotApplicable,
            CallError::UnknownConcept(_) => ErrorCode::UnknownConcept,
            CallError::InvalidArgument { .. } => ErrorCode::InvalidArgument,
            CallError::NothingToUndo => ErrorCode::NothingToUndo,
            CallError::IllegalAtLevel { .. } => ErrorCode::IllegalAtLevel,
            CallError::NoGetout => ErrorCode::NoGetout,
            CallError::NoActiveSession => ErrorCode::NoActiveSession,
            CallError::SequenceInProgress => ErrorCode::SequenceInProgress,
        }
    }
}

/// Where in a call table a problem was found.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableDiagnostic {
    /// Name of the offending call entry, when it could be read.
    pub entry: Option<String>,
    /// Field path inside the entry (e.g., "parts\[1\].call").
    pub field: Option<String>,
    /// 1-based line in the table source.
    pub line: Option<usize>,
    pub message: String,
}

impl TableDiagnostic {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            ..Self::default()
        }
    }

    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

impl fmt::Display for TableDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(ref entry) = self.entry {
            write!(f, "call \"{}\": ", entry)?;
        }
        write!(f, "{}", self.message)?;
        match (&self.field, self.line) {
            (Some(field), Some(line)) => write!(f, " (field {}, line {})", field, line),
            (Some(field), None) => write!(f, " (field {})", field),
            (None, Some(line)) => write!(f, " (line {})", line),
            (None, None) => Ok(()),
        }
    }
}

/// Startup failure while loading a call table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("malformed call table: {0}")]
    Malformed(TableDiagnostic),

    #[error("failed to read call table: {0}")]
    Io(#[from] std::io::Error),
}

impl TableError {
    pub fn code(&self) -> ErrorCode {
        ErrorCode::MalformedCallTable
    }

    /// The diagnostic for a malformed table, if that is what this is.
    pub fn diagnostic(&self) -> Option<&TableDiagnostic> {
        match self {
            TableError::Malformed(d) => Some(d),
            TableError::Io(_) => None,
        }
    }
}

impl From<TableDiagnostic> for TableError {
    fn from(d: TableDiagnostic) -> Self {
        TableError::Malformed(d)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes_are_stable() {
        assert_eq!(CallError::NothingToUndo.code().code(), "SD007");
        assert_eq!(
            CallError::UnknownConcept("wibble".into()).code(),
            ErrorCode::UnknownConcept
        );
        assert_eq!(ErrorCode::MalformedCallTable.to_string(), "SD100");
    }

    #[test]
    fn test_no_match_message_includes_first_reason() {
        let err = CallError::NoMatch {
            text: "purple nurple".into(),
            reasons: vec!["no call named \"purple nurple\"".into()],
        };
        assert_eq!(
            err.to_string(),
            "no matches for \"purple nurple\" (no call named \"purple nurple\")"
        );
    }

    #[test]
    fn test_diagnostic_display() {
        let d = TableDiagnostic::new("unknown call \"spin\"")
            .with_entry("swing thru")
            .with_field("parts[0].call")
            .at_line(12);
        assert_eq!(
            d.to_string(),
            "call \"swing thru\": unknown call \"spin\" (field parts[0].call, line 12)"
        );
    }
}
