//! Call definitions: the table format, name patterns and the database.

mod database;
mod loader;
pub mod model;
pub mod pattern;

pub use database::{CallDatabase, CallDefinition, CallId, NameMatch, DEFAULT_TABLE};
pub use loader::TABLE_VERSION;
pub use model::{ArgumentRange, CallFlags, Modifier, Movement, Role, Scheme};
pub use pattern::{Arguments, NamePattern};
