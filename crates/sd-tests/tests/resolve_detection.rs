//! Resolve detection reached through real calls.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p sd-tests --test resolve_detection
//! ```

use pretty_assertions::assert_eq;

use sd_core::{check_resolve, Resolve, StartPosition};
use sd_tests::harness::{apply_all, builtin, play, session};

#[test]
fn heads_square_thru_and_its_reverse_resolve_at_home() {
    let mut s = session(StartPosition::SquaredSet);
    assert_eq!(s.check_resolve().unwrap(), Some(Resolve::AtHome));

    let first = s.apply_call("heads square thru 4").unwrap();
    assert_eq!(first.resolve, None);
    let back = s.apply_call("heads reverse square thru 4").unwrap();
    assert_eq!(back.resolve, Some(Resolve::AtHome));
    assert_eq!(s.check_resolve().unwrap(), Some(Resolve::AtHome));
}

#[test]
fn half_of_the_getout_is_not_a_resolve() {
    let mut s = session(StartPosition::SquaredSet);
    apply_all(&mut s, &["heads square thru 4"]);
    assert_eq!(s.check_resolve().unwrap(), None);
    assert!(s.entries().iter().all(|e| e.resolve.is_none()));
}

#[test]
fn heads_square_thru_from_heads_start_is_a_zero_box() {
    let mut s = session(StartPosition::Heads);
    let entry = s.apply_call("square thru 4").unwrap();
    assert_eq!(entry.formation.name(), "eight chain thru");
    assert_eq!(entry.resolve, Some(Resolve::LeftAllemande { promenade: 0 }));
    assert_eq!(
        entry.resolve.unwrap().to_string(),
        "left allemande (at home)"
    );
}

#[test]
fn resolve_is_recorded_per_entry_and_survives_undo() {
    let mut s = session(StartPosition::Heads);
    apply_all(&mut s, &["square thru 4", "swing thru"]);
    let marks: Vec<bool> = s.entries().iter().map(|e| e.resolve.is_some()).collect();
    assert_eq!(marks, vec![true, false]);

    s.undo_last_call().unwrap();
    assert_eq!(
        s.check_resolve().unwrap(),
        Some(Resolve::LeftAllemande { promenade: 0 })
    );
}

#[test]
fn detection_is_idempotent() {
    let mut s = session(StartPosition::Heads);
    let f = apply_all(&mut s, &["square thru 4"]);
    assert_eq!(check_resolve(&f), check_resolve(&f));
    assert_eq!(check_resolve(&f.rotate(4)), check_resolve(&f));
}

#[test]
fn typed_resolve_line_is_shown() {
    let mut s = sd_core::Session::new(builtin(), Default::default());
    let (outcome, text) = play(&mut s, "heads start\nsquare thru 4\nresolve\n");
    assert_eq!(outcome.resolves, 1);
    assert!(text.contains("resolve is: left allemande (at home)"));
}

#[test]
fn resolve_searches_for_a_getout_and_accept_adds_it() {
    let mut s = session(StartPosition::Heads);
    apply_all(&mut s, &["square thru 4", "u turn back"]);
    assert_eq!(s.check_resolve().unwrap(), None);

    let calls = match s.handle_line("resolve").unwrap() {
        sd_core::Response::Getout { getout, number, found } => {
            assert_eq!(number, 1);
            assert!(found >= 1);
            assert!(!getout.calls.is_empty());
            getout.calls
        }
        other => panic!("expected a getout, got {:?}", other),
    };

    let accepted = match s.handle_line("accept").unwrap() {
        sd_core::Response::Accepted(entries) => entries,
        other => panic!("expected accepted calls, got {:?}", other),
    };
    assert_eq!(accepted.len(), calls.len());
    assert_eq!(s.len(), 2 + calls.len());
    assert!(s.check_resolve().unwrap().is_some());
    assert!(s.handle_line("accept").is_err());
}
