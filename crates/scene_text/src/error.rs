//! Error types for scene text operations

use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneTextError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("API returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Missing field in response: {0}")]
    MissingField(&'static str),

    #[error("No description template for position: {0}")]
    UnknownPosition(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Task timed out after {0:?}")]
    Timeout(Duration),
}

pub type Result<T> = std::result::Result<T, SceneTextError>;
