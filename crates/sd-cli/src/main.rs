//! sd - square dance call interpreter
//!
//! This binary reads calls typed as text, draws the resulting formation
//! after each one and reports when the square has resolved.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sd_core::{Level, StartPosition};

// Use modules from the library crate
use sd_cli::commands;
use sd_cli::config::{Overrides, SdConfig};
use sd_cli::logging;

/// sd - Square Dance Call Interpreter
#[derive(Parser)]
#[command(name = "sd")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Program level for legality checks (basic, mainstream, plus, a1, ...)
    #[arg(long, global = true)]
    level: Option<Level>,

    /// Call table to load instead of the built-in one (JSON)
    #[arg(long, global = true)]
    calls: Option<PathBuf>,

    /// Configuration file (JSON)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log interpreter decisions to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive session: type calls, see formations
    Play {
        /// Start a sequence right away (heads, sides, squared, two_couples)
        #[arg(short, long)]
        start: Option<StartPosition>,
    },

    /// Play a script of calls, one per line
    Run {
        /// Path to the script file
        script: String,

        /// Start a sequence before the first line (heads, sides, squared, two_couples)
        #[arg(short, long)]
        start: Option<StartPosition>,

        /// Keep going after a rejected line
        #[arg(long)]
        keep_going: bool,

        /// Print the final sequence as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the calls available at the current level
    Calls {
        /// List calls of every level
        #[arg(long)]
        all: bool,

        /// Output machine-readable JSON
        #[arg(long)]
        json: bool,
    },

    /// Check a call table file for errors
    Check {
        /// Path to the call table (JSON)
        table: String,

        /// Output machine-readable JSON diagnostics (no colored output)
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let start = match cli.command {
        Commands::Play { start } | Commands::Run { start, .. } => start,
        _ => None,
    };
    let overrides = Overrides {
        level: cli.level,
        calls: cli.calls,
        no_color: cli.no_color,
        start,
    };
    let config = SdConfig::resolve(cli.config.as_deref(), &overrides);

    let result = config.and_then(|config| {
        if !config.color {
            colored::control::set_override(false);
        }
        match cli.command {
            Commands::Play { .. } => commands::play::run(&config),
            Commands::Run {
                script,
                keep_going,
                json,
                ..
            } => commands::run::run(&script, &config, keep_going, json),
            Commands::Calls { all, json } => commands::calls::run(&config, all, json),
            Commands::Check { table, json } => commands::check::run(&table, json),
        }
    });

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_play_with_start() {
        let cli = Cli::try_parse_from(["sd", "play", "--start", "heads"]).unwrap();
        match cli.command {
            Commands::Play { start } => assert_eq!(start, Some(StartPosition::Heads)),
            _ => panic!("expected play command"),
        }
        assert_eq!(cli.level, None);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "sd",
            "calls",
            "--level",
            "mainstream",
            "--no-color",
            "--json",
        ])
        .unwrap();
        assert_eq!(cli.level, Some(Level::Mainstream));
        assert!(cli.no_color);
        match cli.command {
            Commands::Calls { all, json } => {
                assert!(!all);
                assert!(json);
            }
            _ => panic!("expected calls command"),
        }
    }

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "sd",
            "run",
            "tips.sd",
            "--start",
            "sides",
            "--keep-going",
            "--calls",
            "table.json",
        ])
        .unwrap();
        assert_eq!(cli.calls, Some(PathBuf::from("table.json")));
        match cli.command {
            Commands::Run {
                script,
                start,
                keep_going,
                json,
            } => {
                assert_eq!(script, "tips.sd");
                assert_eq!(start, Some(StartPosition::Sides));
                assert!(keep_going);
                assert!(!json);
            }
            _ => panic!("expected run command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_level() {
        assert!(Cli::try_parse_from(["sd", "calls", "--level", "expert"]).is_err());
    }

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::try_parse_from(["sd", "check", "calls.json"]).unwrap();
        match cli.command {
            Commands::Check { table, json } => {
                assert_eq!(table, "calls.json");
                assert!(!json);
            }
            _ => panic!("expected check command"),
        }
    }
}
