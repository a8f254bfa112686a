use std::path::PathBuf;
use thiserror::Error;

use crate::models::JobId;

#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Job #{0} not found")]
    JobNotFound(JobId),

    #[error("Missing required fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Unknown level '{0}' (expected Internship, Junior or Mid)")]
    UnknownLevel(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}
