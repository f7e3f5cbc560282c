//! Process configuration read from the environment.

use std::path::PathBuf;

use crate::engine::ENGINE_CONFIG_ENV;

pub const DB_PATH_ENV: &str = "CARDIOFUZZY_DB";
pub const LOG_MODE_ENV: &str = "CARDIOFUZZY_LOG_MODE";
pub const LOG_FILE_ENV: &str = "CARDIOFUZZY_LOG_FILE";

const DEFAULT_DB_PATH: &str = "data/cardiofuzzy.db";
const DEFAULT_LOG_FILE: &str = "data/cardiofuzzy.log";

/// Where log output goes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogMode {
    /// Append to `log_file`
    File,
    /// Write to stderr, keeping stdout clean for JSON output
    Stderr,
}

impl LogMode {
    /// Parse a mode token; anything unrecognized selects stderr.
    #[must_use]
    pub fn from_token(token: &str) -> Self {
        match token.trim().to_lowercase().as_str() {
            "file" => Self::File,
            _ => Self::Stderr,
        }
    }
}

/// Runtime settings for the command-line front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub db_path: PathBuf,
    /// Optional JSON file overriding engine parameters
    pub engine_config: Option<PathBuf>,
    pub log_mode: LogMode,
    pub log_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            engine_config: None,
            log_mode: LogMode::Stderr,
            log_file: PathBuf::from(DEFAULT_LOG_FILE),
        }
    }
}

impl AppConfig {
    /// Read settings from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any key lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            db_path: get(DB_PATH_ENV).map_or(defaults.db_path, PathBuf::from),
            engine_config: get(ENGINE_CONFIG_ENV).map(PathBuf::from),
            log_mode: get(LOG_MODE_ENV).map_or(defaults.log_mode, |v| LogMode::from_token(&v)),
            log_file: get(LOG_FILE_ENV).map_or(defaults.log_file, PathBuf::from),
        }
    }
}
