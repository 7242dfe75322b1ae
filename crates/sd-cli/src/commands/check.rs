//! Check command implementation
//!
//! Loads a call table file and reports the first problem found in it.

use std::path::Path;
use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use sd_core::{CallDatabase, TableError};
use serde_json::json;

use crate::render;

/// Machine-readable form of a load result.
pub fn report(result: &Result<CallDatabase, TableError>) -> serde_json::Value {
    match result {
        Ok(db) => json!({
            "ok": true,
            "version": db.version(),
            "calls": db.len(),
        }),
        Err(e) => {
            let d = e.diagnostic();
            json!({
                "ok": false,
                "code": e.code().code(),
                "entry": d.and_then(|d| d.entry.clone()),
                "field": d.and_then(|d| d.field.clone()),
                "line": d.and_then(|d| d.line),
                "message": d.map(|d| d.message.clone()).unwrap_or_else(|| e.to_string()),
            })
        }
    }
}

/// Run the check command
///
/// # Arguments
/// * `table_path` - Path to the call table (JSON)
/// * `json` - Output a JSON report instead of colored text
///
/// # Returns
/// Exit code: 0 if the table loads, 1 if it is malformed or unreadable
pub fn run(table_path: &str, json: bool) -> Result<ExitCode> {
    let result = CallDatabase::load_file(Path::new(table_path));

    if json {
        println!("{}", serde_json::to_string_pretty(&report(&result))?);
    } else {
        println!("{} {}", "Checking:".cyan().bold(), table_path);
        match result {
            Ok(ref db) => println!(
                "{} version {}, {} calls",
                "SUCCESS".green().bold(),
                db.version(),
                db.len()
            ),
            Err(ref e) => println!("{} {}", "FAILED".red().bold(), render::table_error(e)),
        }
    }

    Ok(if result.is_ok() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(1)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_report_for_builtin_table() {
        let value = report(&CallDatabase::builtin());
        assert_eq!(value["ok"], true);
        assert_eq!(value["version"], 1);
        assert!(value["calls"].as_u64().unwrap() > 20);
    }

    #[test]
    fn test_report_for_malformed_table() {
        let value = report(&CallDatabase::load_call_table("{ \"version\": 1,\n  \"calls\": [ }"));
        assert_eq!(value["ok"], false);
        assert_eq!(value["code"], "SD100");
        assert_eq!(value["line"], 2);
    }
}
