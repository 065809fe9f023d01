//! Error types for Sentinel

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Network or auth failure talking to Plaid/SimpleFIN. Never retried.
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    /// A provider record is missing or has an unparseable required field
    #[error("Malformed record: {0}")]
    MalformedRecord(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid frequency: {0} (expected \"monthly\" or \"yearly\")")]
    InvalidFrequency(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// No bank link has been completed for this session
    #[error("No bank connected")]
    NotConnected,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Error::ProviderUnavailable(format!("request timed out: {}", err))
        } else {
            Error::ProviderUnavailable(err.to_string())
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
