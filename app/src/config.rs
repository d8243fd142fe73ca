//! FILENAME: app/src/config.rs
//! PURPOSE: Application settings, read from an optional JSON file.
//! CONTEXT: Every field has a default, so a missing file or a partial
//! file is fine. Relative paths resolve against the working directory.

use std::fs;
use std::path::{Path, PathBuf};

use log::LevelFilter;
use persistence::SetupScripts;
use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// File looked for when no config path is given.
pub const CONFIG_FILE: &str = "accounting.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// SQLite file; created from the scripts below when missing.
    pub database: PathBuf,
    pub create_script: PathBuf,
    pub populate_script: PathBuf,
    /// `None` logs to nowhere but stdout (if echo is on).
    pub log_file: Option<PathBuf>,
    /// One of off, error, warn, info, debug, trace.
    pub log_level: String,
    pub echo_log: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            database: PathBuf::from("accounting.db"),
            create_script: PathBuf::from("sql/database.sql"),
            populate_script: PathBuf::from("sql/populate.sql"),
            log_file: Some(PathBuf::from("accounting.log")),
            log_level: "info".to_string(),
            echo_log: false,
        }
    }
}

impl AppConfig {
    /// Read `path`, falling back to defaults when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref();
        if !path.is_file() {
            return Ok(AppConfig::default());
        }
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn scripts(&self) -> SetupScripts {
        SetupScripts::new(self.create_script.clone(), self.populate_script.clone())
    }

    /// Unrecognised names fall back to `info`.
    pub fn level_filter(&self) -> LevelFilter {
        self.log_level.parse().unwrap_or(LevelFilter::Info)
    }
}
