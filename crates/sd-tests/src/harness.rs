//! Test harness utilities: temp call tables and ready-made sessions.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use sd_cli::commands::play::{drive, DriveOptions, Outcome};
use sd_core::{CallDatabase, Formation, Session, SessionConfig, StartPosition};
use tempfile::TempDir;

use crate::fixtures;

/// The built-in call table, loaded once per test binary.
pub fn builtin() -> Arc<CallDatabase> {
    static DB: OnceLock<Arc<CallDatabase>> = OnceLock::new();
    DB.get_or_init(|| Arc::new(CallDatabase::builtin().expect("built-in call table loads")))
        .clone()
}

/// A session over the built-in table, already started.
pub fn session(start: StartPosition) -> Session {
    session_with(builtin(), start)
}

/// A session over `db`, already started.
pub fn session_with(db: Arc<CallDatabase>, start: StartPosition) -> Session {
    let mut s = Session::new(db, SessionConfig::default());
    s.start_session(start).expect("start position is valid");
    s
}

/// Applies each call in turn, panicking with the call text on failure.
pub fn apply_all(session: &mut Session, calls: &[&str]) -> Formation {
    for call in calls {
        if let Err(e) = session.apply_call(call) {
            panic!("\"{}\" failed: {} ({})", call, e, e.code());
        }
    }
    session.formation().cloned().expect("session is active")
}

/// Feeds a script through the same line loop the CLI uses; output is plain.
pub fn play(session: &mut Session, script: &str) -> (Outcome, String) {
    colored::control::set_override(false);
    let mut out = Vec::new();
    let outcome = drive(session, script.as_bytes(), &mut out, DriveOptions::default())
        .expect("in-memory input never fails");
    (outcome, String::from_utf8(out).expect("output is UTF-8"))
}

/// A test harness with a private working directory.
pub struct TestHarness {
    /// Working directory for test files.
    pub work_dir: TempDir,
}

impl TestHarness {
    /// Create a new test harness.
    pub fn new() -> Self {
        Self {
            work_dir: TempDir::new().expect("Failed to create work dir"),
        }
    }

    /// Get the working directory path.
    pub fn path(&self) -> &Path {
        self.work_dir.path()
    }

    /// Write a file into the working directory.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path().join(name);
        fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    /// Write a version 1 call table made of `calls`.
    pub fn write_table(&self, name: &str, calls: &[&str]) -> PathBuf {
        self.write_file(name, &fixtures::table(calls))
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
