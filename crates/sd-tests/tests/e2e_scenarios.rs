//! End-to-end scenarios typed through a session.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sd-tests --test e2e_scenarios
//! ```

use pretty_assertions::assert_eq;

use sd_core::{CallError, ErrorCode, StartPosition};
use sd_tests::harness::{apply_all, play, session};

// ============================================================================
// Full sequences
// ============================================================================

#[test]
fn heads_start_through_ferris_wheel_ends_in_double_pass_thru() {
    let mut s = session(StartPosition::Heads);
    let calls = [
        "square thru 4",
        "swing thru",
        "boys run",
        "couples circulate",
        "ferris wheel",
    ];
    let names = [
        "eight chain thru",
        "parallel waves",
        "two-faced lines",
        "two-faced lines",
        "double pass thru",
    ];
    for (call, name) in calls.iter().zip(names) {
        let entry = s.apply_call(call).unwrap();
        assert_eq!(entry.formation.name(), name, "after \"{}\"", call);
    }
    assert_eq!(s.len(), 5);
    assert_eq!(s.formation().unwrap().name(), "double pass thru");
}

#[test]
fn swing_thru_from_eight_chain_steps_to_a_wave_first() {
    let mut s = session(StartPosition::Heads);
    apply_all(&mut s, &["square thru 4"]);
    let entry = s.apply_call("swing thru").unwrap();
    assert_eq!(entry.interpretation, "swing thru");
    assert!(entry.concepts.is_empty());
}

#[test]
fn undo_after_heads_start_returns_to_the_start() {
    let mut s = session(StartPosition::Heads);
    let start = s.formation().unwrap().clone();
    s.apply_call("square thru 4").unwrap();
    assert_ne!(s.formation().unwrap(), &start);

    let restored = s.undo_last_call().unwrap().clone();
    assert_eq!(restored, start);
    assert!(s.is_empty());
    assert_eq!(s.undo_last_call().unwrap_err(), CallError::NothingToUndo);
}

#[test]
fn unknown_call_is_no_match_and_changes_nothing() {
    let mut s = session(StartPosition::Heads);
    apply_all(&mut s, &["square thru 4"]);
    let before = s.formation().unwrap().clone();

    let err = s.apply_call("purple nurple").unwrap_err();
    assert_eq!(err.code(), ErrorCode::NoMatch);
    assert_eq!(err.code().code(), "SD002");
    assert_eq!(s.len(), 1);
    assert_eq!(s.formation().unwrap(), &before);
}

// ============================================================================
// Line-level commands
// ============================================================================

#[test]
fn typed_session_with_undo_and_abort() {
    let mut s = sd_core::Session::new(sd_tests::harness::builtin(), Default::default());
    let (outcome, text) = play(
        &mut s,
        "heads start\nsquare thru 4\npurple nurple\nundo last call\nabort this sequence\ny\n",
    );
    assert_eq!(outcome.lines, 6);
    assert_eq!(outcome.errors, 1);
    assert!(!s.is_active());
    assert!(text.contains("[SD002]"));
    assert!(text.contains("sequence aborted"));
}

#[test]
fn start_command_during_a_sequence_is_refused() {
    let mut s = session(StartPosition::Sides);
    assert_eq!(
        s.handle_line("heads start").unwrap_err(),
        CallError::SequenceInProgress
    );
    assert_eq!(s.start(), Some(StartPosition::Sides));
    assert_eq!(s.check_resolve(), Ok(None));
}
