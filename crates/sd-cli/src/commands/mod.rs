//! CLI command implementations

pub mod calls;
pub mod check;
pub mod play;
pub mod run;
