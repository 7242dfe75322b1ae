//! Written form of a sequence: the start, every call with the comments
//! typed between them, and where it ends up.

use std::fmt;

use serde::Serialize;

use crate::level::Level;
use crate::resolve::Resolve;
use crate::session::StartPosition;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum TranscriptItem {
    Comment {
        text: String,
    },
    Call {
        number: usize,
        /// How the matcher read the call.
        interpretation: String,
        /// Name of the formation it ended in.
        setup: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transcript {
    pub start: StartPosition,
    pub level: Level,
    pub items: Vec<TranscriptItem>,
    pub resolve: Option<Resolve>,
}

impl Transcript {
    pub fn calls(&self) -> usize {
        self.items
            .iter()
            .filter(|i| matches!(i, TranscriptItem::Call { .. }))
            .count()
    }
}

impl fmt::Display for Transcript {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} ({})", self.start, self.level)?;
        for item in &self.items {
            match item {
                TranscriptItem::Comment { text } => writeln!(f, "   {{ {} }}", text)?,
                TranscriptItem::Call {
                    number,
                    interpretation,
                    setup,
                } => writeln!(f, "{:>3}: {:<32} {}", number, interpretation, setup)?,
            }
        }
        match self.resolve {
            Some(r) => writeln!(f, "resolve is: {}", r),
            None => writeln!(f, "not resolved"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_lists_calls_and_comments() {
        let t = Transcript {
            start: StartPosition::Heads,
            level: Level::Plus,
            items: vec![
                TranscriptItem::Comment {
                    text: "opener".into(),
                },
                TranscriptItem::Call {
                    number: 1,
                    interpretation: "square thru 4".into(),
                    setup: "eight chain thru".into(),
                },
            ],
            resolve: Some(Resolve::LeftAllemande { promenade: 0 }),
        };
        let text = t.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "heads start (plus)");
        assert_eq!(lines[1], "   { opener }");
        assert!(lines[2].starts_with("  1: square thru 4"));
        assert!(lines[2].ends_with("eight chain thru"));
        assert_eq!(lines[3], "resolve is: left allemande (at home)");
        assert_eq!(t.calls(), 1);
    }
}
