//! Configuration file and command-line overrides.
//!
//! The config file is optional JSON:
//!
//! ```json
//! { "level": "mainstream", "calls": "my-calls.json", "color": false, "start": "heads" }
//! ```
//!
//! A relative `calls` path is taken relative to the config file. Flags given
//! on the command line win over the file.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use sd_core::{CallDatabase, Level, SessionConfig, StartPosition};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SdConfig {
    /// Program level for legality checks.
    pub level: Level,
    /// Call table to load; the built-in table when absent.
    pub calls: Option<PathBuf>,
    pub color: bool,
    /// Start a sequence automatically.
    pub start: Option<StartPosition>,
}

impl Default for SdConfig {
    fn default() -> Self {
        Self {
            level: Level::default(),
            calls: None,
            color: true,
            start: None,
        }
    }
}

/// Values given on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub level: Option<Level>,
    pub calls: Option<PathBuf>,
    pub no_color: bool,
    pub start: Option<StartPosition>,
}

impl SdConfig {
    /// Reads a config file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config: SdConfig = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        if let (Some(calls), Some(dir)) = (&config.calls, path.parent()) {
            if calls.is_relative() {
                config.calls = Some(dir.join(calls));
            }
        }
        Ok(config)
    }

    /// The file (or defaults) with the command-line overrides applied.
    pub fn resolve(path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let base = match path {
            Some(p) => Self::load(p)?,
            None => Self::default(),
        };
        Ok(base.with_overrides(overrides))
    }

    pub fn with_overrides(mut self, overrides: &Overrides) -> Self {
        if let Some(level) = overrides.level {
            self.level = level;
        }
        if let Some(ref calls) = overrides.calls {
            self.calls = Some(calls.clone());
        }
        if overrides.no_color {
            self.color = false;
        }
        if overrides.start.is_some() {
            self.start = overrides.start;
        }
        self
    }

    pub fn session_config(&self) -> SessionConfig {
        SessionConfig { level: self.level }
    }

    /// Loads the configured call table, or the built-in one.
    pub fn load_database(&self) -> Result<Arc<CallDatabase>> {
        let db = match self.calls {
            Some(ref path) => CallDatabase::load_file(path)
                .with_context(|| format!("Failed to load call table: {}", path.display()))?,
            None => CallDatabase::builtin().context("Failed to load the built-in call table")?,
        };
        Ok(Arc::new(db))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = SdConfig::resolve(None, &Overrides::default()).unwrap();
        assert_eq!(config.level, Level::Plus);
        assert!(config.color);
        assert_eq!(config.calls, None);
        assert_eq!(config.start, None);
    }

    #[test]
    fn test_file_values_and_relative_calls_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sd.json");
        fs::write(
            &path,
            r#"{ "level": "mainstream", "calls": "table.json", "start": "heads" }"#,
        )
        .unwrap();

        let config = SdConfig::load(&path).unwrap();
        assert_eq!(config.level, Level::Mainstream);
        assert_eq!(config.calls, Some(dir.path().join("table.json")));
        assert_eq!(config.start, Some(StartPosition::Heads));
        assert!(config.color);
    }

    #[test]
    fn test_flags_override_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sd.json");
        fs::write(&path, r#"{ "level": "basic", "color": true }"#).unwrap();

        let overrides = Overrides {
            level: Some(Level::A1),
            no_color: true,
            ..Overrides::default()
        };
        let config = SdConfig::resolve(Some(&path), &overrides).unwrap();
        assert_eq!(config.level, Level::A1);
        assert!(!config.color);
        assert_eq!(config.session_config().level, Level::A1);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sd.json");
        fs::write(&path, r#"{ "levle": "basic" }"#).unwrap();
        let err = SdConfig::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("levle"));
    }

    #[test]
    fn test_missing_call_table_is_an_error() {
        let config = SdConfig {
            calls: Some(PathBuf::from("/nonexistent/calls.json")),
            ..SdConfig::default()
        };
        let err = config.load_database().unwrap_err();
        assert!(err.to_string().contains("Failed to load call table"));
    }
}
