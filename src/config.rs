//! Environment-driven settings for the server binary.

use std::env;

/// Server settings, read from the environment with local-run defaults.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Listen address, `host:port`.
    pub bind: String,
    /// SQLite database path.
    pub database_path: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "0.0.0.0:8000".to_string(),
            database_path: "orgdir.db".to_string(),
        }
    }
}

impl Settings {
    /// Load settings from `ORGDIR_BIND` and `ORGDIR_DB`, falling back to
    /// defaults when unset or empty.
    pub fn from_env() -> Self {
        let mut settings = Self::default();
        if let Ok(bind) = env::var("ORGDIR_BIND") {
            if !bind.is_empty() {
                settings.bind = bind;
            }
        }
        if let Ok(path) = env::var("ORGDIR_DB") {
            if !path.is_empty() {
                settings.database_path = path;
            }
        }
        settings
    }
}
