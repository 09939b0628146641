//! Error types for SpendWise

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// The caller's request is malformed. Never reaches the model.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The model service answered with a failure status or could not be reached
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl Error {
    /// Whether this error came from talking to the model service
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::ModelUnavailable(_) | Self::Http(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
