//! Calls command implementation
//!
//! Lists the calls in the loaded table, grouped by level.

use std::process::ExitCode;

use anyhow::Result;
use colored::Colorize;
use sd_core::{CallDatabase, CallDefinition, Level};
use serde_json::json;

use crate::config::SdConfig;

/// Visible calls at or below `level` (all levels when `None`), ordered by
/// level and then name.
pub fn listing(db: &CallDatabase, level: Option<Level>) -> Vec<&CallDefinition> {
    let mut calls: Vec<&CallDefinition> = db
        .calls()
        .map(|(_, c)| c)
        .filter(|c| !c.is_hidden())
        .filter(|c| level.map_or(true, |l| c.level <= l))
        .collect();
    calls.sort_by(|a, b| a.level.cmp(&b.level).then_with(|| a.name.cmp(&b.name)));
    calls
}

fn to_json(call: &CallDefinition) -> serde_json::Value {
    json!({
        "name": call.pattern.to_string(),
        "level": call.level,
        "setups": call.setups.iter().map(|s| s.to_string()).collect::<Vec<_>>(),
        "argument": call.argument.map(|a| json!({ "min": a.min, "max": a.max, "default": a.default })),
    })
}

/// Run the calls command
///
/// # Arguments
/// * `config` - Resolved configuration; its level limits the listing
/// * `all` - List every level, ignoring the configured one
/// * `json` - Output JSON instead of colored text
///
/// # Returns
/// Exit code: 0 success, 1 if the call table cannot be loaded
pub fn run(config: &SdConfig, all: bool, json: bool) -> Result<ExitCode> {
    let db = config.load_database()?;
    let level = if all { None } else { Some(config.level) };
    let calls = listing(&db, level);

    if json {
        let values: Vec<_> = calls.iter().map(|c| to_json(c)).collect();
        println!("{}", serde_json::to_string_pretty(&values)?);
        return Ok(ExitCode::SUCCESS);
    }

    let mut current = None;
    for call in &calls {
        if current != Some(call.level) {
            current = Some(call.level);
            println!("{}", call.level.to_string().cyan().bold());
        }
        let setups: Vec<String> = call.setups.iter().map(|s| s.to_string()).collect();
        println!(
            "  {:<28} {}",
            call.pattern.to_string(),
            setups.join(", ").dimmed()
        );
    }
    println!("{} calls", calls.len());
    Ok(ExitCode::SUCCESS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_listing_respects_level_and_hides_helpers() {
        let db = CallDatabase::builtin().unwrap();
        let basic = listing(&db, Some(Level::Basic));
        let everything = listing(&db, None);
        assert!(basic.len() < everything.len());
        assert!(basic.iter().all(|c| c.level == Level::Basic));
        assert!(everything.iter().all(|c| !c.name.starts_with('_')));
        assert!(everything.iter().any(|c| c.name == "square thru <N>"));
        assert!(everything.windows(2).all(|w| w[0].level <= w[1].level));
    }

    #[test]
    fn test_json_entry_shape() {
        let db = CallDatabase::builtin().unwrap();
        let calls = listing(&db, None);
        let circulate = calls.iter().find(|c| c.name == "circulate <N>").unwrap();
        let value = to_json(circulate);
        assert_eq!(value["name"], "circulate <N>");
        assert_eq!(value["argument"]["min"], 1);
        assert_eq!(value["argument"]["max"], 7);
    }
}
