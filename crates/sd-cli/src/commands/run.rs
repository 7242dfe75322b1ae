//! Run command implementation
//!
//! Plays a script of calls, one per line, as if typed at the prompt.

use std::fs;
use std::io::{self, Write};
use std::process::ExitCode;

use anyhow::{Context, Result};
use colored::Colorize;
use sd_core::{Response, Session};

use super::play::{drive, DriveOptions, Outcome};
use crate::config::SdConfig;
use crate::render;

/// Run the run command
///
/// # Arguments
/// * `script_path` - File with one call or command per line
/// * `config` - Resolved configuration (level, call table, start position)
/// * `keep_going` - Continue after a rejected line instead of stopping
/// * `json` - Print the final sequence as JSON instead of diagrams
///
/// # Returns
/// Exit code: 0 if every line was accepted, 1 otherwise
pub fn run(script_path: &str, config: &SdConfig, keep_going: bool, json: bool) -> Result<ExitCode> {
    let script = fs::read_to_string(script_path)
        .with_context(|| format!("Failed to read script: {}", script_path))?;
    let db = config.load_database()?;
    let mut session = Session::new(db, config.session_config());

    let options = DriveOptions {
        prompt: false,
        echo: true,
        stop_on_error: !keep_going,
    };
    let outcome = if json {
        let outcome = drive_script(&mut session, config, &script, &mut io::sink(), options)?;
        println!("{}", serde_json::to_string_pretty(&report(&session, &outcome))?);
        outcome
    } else {
        println!("{} {}", "Running:".cyan().bold(), script_path);
        let stdout = io::stdout();
        let outcome = drive_script(&mut session, config, &script, &mut stdout.lock(), options)?;
        print_summary(&outcome);
        outcome
    };

    if outcome.errors == 0 {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

/// Starts the configured sequence, if any, then drives the script.
pub fn drive_script<W: Write>(
    session: &mut Session,
    config: &SdConfig,
    script: &str,
    out: &mut W,
    options: DriveOptions,
) -> Result<Outcome> {
    if let Some(start) = config.start {
        let formation = session.start_session(start)?.clone();
        write!(
            out,
            "{}",
            render::response(&Response::Started { start, formation }, 0)
        )?;
    }
    drive(session, script.as_bytes(), out, options)
}

/// JSON form of the finished sequence: the calls with their formations,
/// plus the written transcript with comments. `transcript` is null when no
/// sequence was started.
pub fn report(session: &Session, outcome: &Outcome) -> serde_json::Value {
    serde_json::json!({
        "start": session.start(),
        "calls": session.entries(),
        "transcript": session.transcript().ok(),
        "errors": outcome.errors,
    })
}

fn print_summary(outcome: &Outcome) {
    if outcome.errors == 0 {
        println!(
            "{} {} lines, {} resolves",
            "SUCCESS".green().bold(),
            outcome.lines,
            outcome.resolves
        );
    } else {
        println!(
            "{} {} of {} lines rejected",
            "FAILED".red().bold(),
            outcome.errors,
            outcome.lines
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sd_core::StartPosition;
    use std::sync::Arc;

    #[test]
    fn test_configured_start_begins_the_sequence() {
        colored::control::set_override(false);
        let config = SdConfig {
            start: Some(StartPosition::Heads),
            ..SdConfig::default()
        };
        let db = config.load_database().unwrap();
        let mut session = Session::new(Arc::clone(&db), config.session_config());
        let mut out = Vec::new();
        let outcome = drive_script(
            &mut session,
            &config,
            "square thru 4\nswing thru\n",
            &mut out,
            DriveOptions::default(),
        )
        .unwrap();
        assert_eq!(outcome.errors, 0);
        assert_eq!(session.len(), 2);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("heads start"));
    }

    #[test]
    fn test_report_carries_the_transcript() {
        let config = SdConfig {
            start: Some(StartPosition::Sides),
            ..SdConfig::default()
        };
        let db = config.load_database().unwrap();
        let mut session = Session::new(db, config.session_config());
        let outcome = drive_script(
            &mut session,
            &config,
            "comment from the sides\nsquare thru 4\n",
            &mut io::sink(),
            DriveOptions::default(),
        )
        .unwrap();
        let value = report(&session, &outcome);
        assert_eq!(value["start"], "sides");
        assert_eq!(value["errors"], 0);
        let items = value["transcript"]["items"].as_array().unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["kind"], "comment");
        assert_eq!(items[0]["text"], "from the sides");
        assert_eq!(items[1]["kind"], "call");
        assert_eq!(items[1]["number"], 1);

        let idle = Session::new(config.load_database().unwrap(), config.session_config());
        assert!(report(&idle, &Outcome::default())["transcript"].is_null());
    }

    #[test]
    fn test_missing_script_is_an_error() {
        let err = run("/nonexistent/script.sd", &SdConfig::default(), false, false).unwrap_err();
        assert!(err.to_string().contains("Failed to read script"));
    }
}
