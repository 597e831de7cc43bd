//! Error types for Fiscal

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed input data
    #[error("Data load error: {0}")]
    DataLoad(String),

    /// Query for a year or ministry that is not in the loaded tables
    #[error("Not found: {0}")]
    NotFound(String),

    /// The external model service failed, timed out, or is not configured
    #[error("Assistant unavailable: {0}")]
    AssistantUnavailable(String),

    /// Non-success HTTP status from a model API
    #[error("API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Whether a failed model call is worth retrying
    ///
    /// Transport failures, rate limiting and server-side errors are transient;
    /// anything else (bad request, auth, unparseable body) will fail again.
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            Error::Api { status, .. } => *status == 429 || *status >= 500,
            Error::AssistantUnavailable(_) => true,
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
