//! Call table loading from disk: malformed tables, duplicates and custom
//! tables driving a session.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sd-tests --test call_table
//! ```

use std::sync::Arc;

use pretty_assertions::assert_eq;

use sd_cli::commands::check;
use sd_cli::config::SdConfig;
use sd_core::{CallDatabase, CallError, ErrorCode, StartPosition, TableError};
use sd_tests::fixtures::{self, PASS_THRU, U_TURN_BACK};
use sd_tests::harness::{session_with, TestHarness};

fn load(harness: &TestHarness, calls: &[&str]) -> Result<CallDatabase, TableError> {
    let path = harness.write_table("calls.json", calls);
    CallDatabase::load_file(&path)
}

// ============================================================================
// Malformed tables
// ============================================================================

#[test]
fn unknown_setup_reports_entry_field_and_line() {
    let harness = TestHarness::new();
    let bad = PASS_THRU.replace("\"1x2\"", "\"3x3\"");
    let err = load(&harness, &[U_TURN_BACK, &bad]).unwrap_err();

    assert_eq!(err.code(), ErrorCode::MalformedCallTable);
    let d = err.diagnostic().expect("malformed table has a diagnostic");
    assert_eq!(d.entry.as_deref(), Some("pass thru"));
    assert_eq!(d.field.as_deref(), Some("schemes"));
    let name_line = 4 + U_TURN_BACK.lines().count() + 1;
    assert_eq!(d.line, Some(name_line + 2));
}

#[test]
fn syntax_error_reports_the_parser_line() {
    let harness = TestHarness::new();
    let path = harness.write_file("broken.json", "{\n  \"version\": 1,\n  \"calls\": [\n    {,\n  ]\n}\n");
    let err = CallDatabase::load_file(&path).unwrap_err();
    assert_eq!(err.diagnostic().and_then(|d| d.line), Some(4));
}

#[test]
fn unsupported_version_is_rejected() {
    let harness = TestHarness::new();
    let path = harness.write_file(
        "future.json",
        &fixtures::table(&[PASS_THRU]).replace("\"version\": 1", "\"version\": 99"),
    );
    let err = CallDatabase::load_file(&path).unwrap_err();
    assert!(matches!(err, TableError::Malformed(_)));
    assert!(err.to_string().contains("version"));
}

#[test]
fn missing_file_is_an_io_error_with_the_table_code() {
    let harness = TestHarness::new();
    let err = CallDatabase::load_file(&harness.path().join("absent.json")).unwrap_err();
    assert!(matches!(err, TableError::Io(_)));
    assert_eq!(err.code().code(), "SD100");
    assert!(err.diagnostic().is_none());
}

#[test]
fn check_report_for_a_bad_table() {
    let harness = TestHarness::new();
    let bad = PASS_THRU.replace("\"level\"", "\"lvl\"");
    let report = check::report(&load(&harness, &[&bad]));
    assert_eq!(report["ok"], false);
    assert_eq!(report["code"], "SD100");
    assert_eq!(report["field"], "lvl");
    assert_eq!(report["line"], 6);
}

// ============================================================================
// Duplicates and custom tables
// ============================================================================

#[test]
fn duplicate_registration_loads_with_distinct_lines() {
    let harness = TestHarness::new();
    let db = load(&harness, &[PASS_THRU, PASS_THRU]).unwrap();
    assert_eq!(db.len(), 2);
    let lines: Vec<Option<usize>> = db.calls().map(|(_, c)| c.line).collect();
    assert_eq!(
        lines,
        vec![Some(fixtures::entry_line(0)), Some(fixtures::entry_line(1))]
    );
    assert_eq!(db.lookup_by_name("pass thru").len(), 2);
}

#[test]
fn duplicate_registration_makes_the_call_ambiguous() {
    let harness = TestHarness::new();
    let db = Arc::new(load(&harness, &[PASS_THRU, PASS_THRU]).unwrap());
    let mut s = session_with(db, StartPosition::TwoCouples);
    let before = s.formation().unwrap().clone();

    match s.apply_call("pass thru").unwrap_err() {
        CallError::AmbiguousMatch {
            text,
            interpretations,
        } => {
            assert_eq!(text, "pass thru");
            assert_eq!(interpretations.len(), 2);
        }
        other => panic!("expected an ambiguous match, got {:?}", other),
    }
    assert!(s.is_empty());
    assert_eq!(s.formation().unwrap(), &before);
}

#[test]
fn custom_table_only_knows_its_own_calls() {
    let harness = TestHarness::new();
    let path = harness.write_table("small.json", &[PASS_THRU, U_TURN_BACK]);
    let config = SdConfig {
        calls: Some(path),
        ..SdConfig::default()
    };
    let db = config.load_database().unwrap();
    assert_eq!(db.len(), 2);

    let mut s = session_with(db, StartPosition::TwoCouples);
    s.apply_call("pass thru").unwrap();
    s.apply_call("u turn back").unwrap();
    let err = s.apply_call("swing thru").unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoMatch);
}
