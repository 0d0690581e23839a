//! Error types for the StatusCake API client.

use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Base error type for StatusCake operations.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Http(#[from] HttpError),

    /// The request could not be built (bad path, query or header value).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("failed to decode response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Numeric status code when the error came from a non-2xx response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Http(e) => Some(e.status_code),
            _ => None,
        }
    }
}

/// The request never produced a response: DNS, TLS, connect or timeout failure.
#[derive(Error, Debug)]
#[error("transport error: {message}")]
pub struct TransportError {
    pub message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            format!("request timed out: {}", e)
        } else if e.is_connect() {
            format!("connection failed: {}", e)
        } else {
            e.to_string()
        };
        Self::with_source(message, e)
    }
}

/// The API answered with a status outside 200..=299.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("HTTP error: {status}")]
pub struct HttpError {
    /// Status line, e.g. `404 Not Found`.
    pub status: String,
    pub status_code: u16,
    /// Response body, when it could be read.
    pub body: Option<String>,
}

/// The API accepted the request but reported `Success: false`.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
    pub issues: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(message: impl Into<String>, issues: Option<serde_json::Value>) -> Self {
        Self {
            message: message.into(),
            issues,
        }
    }
}

/// Field-level problems found before a test is sent, keyed by wire field name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationError(pub BTreeMap<String, String>);

impl ValidationError {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn insert(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.0.insert(field.into(), message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.0.get(field).map(String::as_str)
    }
}

impl std::error::Error for ValidationError {}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("validation failed:")?;
        for (field, message) in &self.0 {
            write!(f, " {} {};", field, message)?;
        }
        Ok(())
    }
}
