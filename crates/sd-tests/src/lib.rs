//! sd End-to-End Test Infrastructure
//!
//! Integration tests for the call interpreter:
//!
//! - **Scenarios**: whole sequences typed through a session
//! - **Call tables**: malformed and duplicate tables written to disk
//! - **Resolve detection**: getouts reached through real calls
//! - **Properties**: undo, idempotence and argument checks under proptest
//!
//! ## Running Tests
//!
//! ```bash
//! # Run everything
//! cargo test -p sd-tests
//!
//! # Run one suite
//! cargo test -p sd-tests --test e2e_scenarios
//! ```

pub mod fixtures;
pub mod harness;
