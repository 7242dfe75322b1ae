//! sd CLI library.
//!
//! The text front end of the call interpreter: configuration loading,
//! logging setup, formation rendering and the command implementations used
//! by the `sd` binary.

pub mod commands;
pub mod config;
pub mod logging;
pub mod render;
