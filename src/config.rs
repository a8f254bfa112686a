use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::db::StorageScope;
use crate::error::ConfigError;
use crate::filter::SearchField;
use crate::suggest::{CourseCatalog, UserProfile};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct Config {
    /// Database file; defaults to the XDG data dir.
    pub database: Option<PathBuf>,
    pub applied_scope: StorageScope,
    pub search_fields: Vec<SearchField>,
    pub fallback_location: String,
    pub debounce_ms: u64,
    pub profile: UserProfile,
    pub course_catalog: CourseCatalog,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: None,
            applied_scope: StorageScope::Device,
            search_fields: SearchField::ALL.to_vec(),
            fallback_location: "Windhoek".to_string(),
            debounce_ms: 220,
            profile: UserProfile::default(),
            course_catalog: CourseCatalog::default(),
        }
    }
}

impl Config {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("", "", "jobboard")
            .map(|dirs| dirs.config_dir().join("config.json"))
    }

    /// Loads `explicit` if given, else the default path if it exists, else defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return load_config(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => load_config(&path),
            _ => Ok(Self::default()),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;
    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;
    validate_config(&config)?;
    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.search_fields.is_empty() {
        return Err(ConfigError::Validation {
            message: "search_fields must name at least one field".to_string(),
        });
    }
    if config.fallback_location.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "fallback_location must not be blank".to_string(),
        });
    }
    Ok(())
}
