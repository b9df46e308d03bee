//! Errors raised by connector code.

use serde_json::Value;
use thiserror::Error;

/// An error returned by a connector's entry point, method or resolver.
///
/// The message and debug payload are passed through to the caller
/// unmodified.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ConnectorError {
    /// Error message.
    pub message: String,
    /// Structured details (upstream status, response body, ...).
    pub debug: Option<Value>,
}

impl ConnectorError {
    /// Create an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            debug: None,
        }
    }

    /// Attach a debug payload.
    pub fn with_debug(mut self, debug: impl Into<Value>) -> Self {
        self.debug = Some(debug.into());
        self
    }
}

impl From<String> for ConnectorError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ConnectorError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<serde_json::Error> for ConnectorError {
    fn from(e: serde_json::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// Result type for connector code.
pub type ConnectorResult<T> = std::result::Result<T, ConnectorError>;
