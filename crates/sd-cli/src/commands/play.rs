//! Play command implementation
//!
//! The interactive line loop: one call or meta-command per line, with the
//! formation drawn after every change.

use std::io::{self, BufRead, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use sd_core::{Response, Session};
use tracing::warn;

use crate::config::SdConfig;
use crate::render;

/// How [`drive`] treats its input.
#[derive(Debug, Clone, Copy, Default)]
pub struct DriveOptions {
    /// Print a prompt before each line.
    pub prompt: bool,
    /// Repeat each line before its result.
    pub echo: bool,
    /// Stop at the first rejected line.
    pub stop_on_error: bool,
}

/// Counts gathered while driving a session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Outcome {
    pub lines: usize,
    pub errors: usize,
    pub resolves: usize,
}

fn prompt(session: &Session) -> String {
    if session.is_active() {
        format!("{}> ", session.len() + 1)
    } else {
        "sd> ".to_string()
    }
}

/// Feeds lines to the session and writes what each one did.
///
/// Text after `#` is a comment. `quit` or `exit` ends the loop early.
pub fn drive<R: BufRead, W: Write>(
    session: &mut Session,
    input: R,
    out: &mut W,
    options: DriveOptions,
) -> Result<Outcome> {
    let mut outcome = Outcome::default();
    let mut lines = input.lines();
    loop {
        if options.prompt {
            write!(out, "{}", prompt(session).bold())?;
            out.flush()?;
        }
        let Some(line) = lines.next() else { break };
        let line = line.context("Failed to read input")?;
        let text = line.split('#').next().unwrap_or_default().trim();
        if text.is_empty() {
            continue;
        }
        if options.echo {
            writeln!(out, "{} {}", ">".dimmed(), text)?;
        }
        match text.to_ascii_lowercase().as_str() {
            "quit" | "exit" => break,
            "help" => {
                write!(out, "{}", render::help())?;
                continue;
            }
            _ => {}
        }

        outcome.lines += 1;
        match session.handle_line(text) {
            Ok(response) => {
                let resolved = match &response {
                    Response::Called(e) => e.resolve.is_some(),
                    Response::Accepted(entries) => {
                        entries.last().is_some_and(|e| e.resolve.is_some())
                    }
                    _ => false,
                };
                if resolved {
                    outcome.resolves += 1;
                }
                write!(out, "{}", render::response(&response, session.len()))?;
            }
            Err(e) => {
                outcome.errors += 1;
                warn!(code = %e.code(), line = text, "line rejected");
                writeln!(out, "{}", render::call_error(&e))?;
                if options.stop_on_error {
                    break;
                }
            }
        }
    }
    Ok(outcome)
}

/// Run the play command
///
/// # Arguments
/// * `config` - Resolved configuration (level, call table, start position)
///
/// # Returns
/// Exit code: 0 when the input ends, 1 if the call table cannot be loaded
pub fn run(config: &SdConfig) -> Result<ExitCode> {
    let db = config.load_database()?;
    println!(
        "{} {} calls at level {} (type {} for commands)",
        "sd".cyan().bold(),
        db.len(),
        config.level,
        "help".bold()
    );

    let mut session = Session::new(db, config.session_config());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(start) = config.start {
        let formation = session.start_session(start)?.clone();
        let started = Response::Started { start, formation };
        write!(out, "{}", render::response(&started, 0))?;
    }

    let stdin = io::stdin();
    drive(
        &mut session,
        stdin.lock(),
        &mut out,
        DriveOptions {
            prompt: true,
            ..DriveOptions::default()
        },
    )?;
    writeln!(out)?;
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_core::CallDatabase;
    use std::sync::Arc;

    fn session() -> Session {
        let db = Arc::new(CallDatabase::builtin().unwrap());
        Session::new(db, SdConfig::default().session_config())
    }

    fn drive_text(session: &mut Session, text: &str, options: DriveOptions) -> (Outcome, String) {
        colored::control::set_override(false);
        let mut out = Vec::new();
        let outcome = drive(session, text.as_bytes(), &mut out, options).unwrap();
        (outcome, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_drive_runs_calls_and_skips_comments() {
        let mut s = session();
        let (outcome, text) = drive_text(
            &mut s,
            "# warm up\nheads start\n\nsquare thru 4   # all the way\n",
            DriveOptions::default(),
        );
        assert_eq!(outcome.lines, 2);
        assert_eq!(outcome.errors, 0);
        assert_eq!(s.len(), 1);
        assert!(text.contains("1: "));
        assert!(text.contains("eight chain thru"));
    }

    #[test]
    fn test_errors_are_reported_and_counted() {
        let mut s = session();
        let (outcome, text) = drive_text(
            &mut s,
            "heads start\npurple nurple\nsquare thru 4\n",
            DriveOptions::default(),
        );
        assert_eq!(outcome.errors, 1);
        assert_eq!(s.len(), 1);
        assert!(text.contains("[SD002]"));
    }

    #[test]
    fn test_stop_on_error_and_quit() {
        let mut s = session();
        let options = DriveOptions {
            stop_on_error: true,
            ..DriveOptions::default()
        };
        let (outcome, _) = drive_text(&mut s, "undo last call\nheads start\n", options);
        assert_eq!(outcome.lines, 1);
        assert!(!s.is_active());

        let mut s = session();
        let (outcome, _) = drive_text(&mut s, "quit\nheads start\n", DriveOptions::default());
        assert_eq!(outcome.lines, 0);
        assert!(!s.is_active());
    }

    #[test]
    fn test_prompt_shows_next_call_number() {
        let mut s = session();
        assert_eq!(prompt(&s), "sd> ");
        s.start_session(sd_core::StartPosition::Heads).unwrap();
        assert_eq!(prompt(&s), "1> ");
    }

    #[test]
    fn test_comments_show_up_in_the_written_sequence() {
        let mut s = session();
        let (outcome, text) = drive_text(
            &mut s,
            "heads start\ncomment Opener\nsquare thru 4\nwrite this sequence\n",
            DriveOptions::default(),
        );
        assert_eq!(outcome.errors, 0);
        assert_eq!(s.len(), 1);
        assert!(text.contains("   { Opener }\n"));
        assert!(text.contains("heads start ("));
        assert!(text.contains("  1: square thru 4"));
    }
}
