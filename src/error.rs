//! Error types for the persona runtime.

use std::time::Duration;

/// Errors from the durable persona state file.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    /// The state file could not be written or moved into place.
    #[error("State file I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The in-memory state could not be encoded.
    #[error("State serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Errors from the text-generation service.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// Transport-level failure (connect, timeout, body read).
    #[error("Request to {provider} failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    /// The service answered with a non-success status.
    #[error("{provider} returned HTTP {status}: {body}")]
    HttpStatus {
        provider: String,
        status: u16,
        body: String,
    },

    /// The body could not be decoded or lacked the text field.
    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    /// The service answered successfully but produced no usable text.
    #[error("{provider} returned an empty completion")]
    EmptyResponse { provider: String },
}

/// Errors from the browser automation driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// A new browser session could not be created.
    #[error("Browser launch failed: {reason}")]
    LaunchFailed { reason: String },

    /// The session is gone (browser crashed, session id invalidated).
    #[error("Browser session lost: {reason}")]
    SessionLost { reason: String },

    /// No element matched the selector.
    #[error("No element matches {selector}")]
    ElementNotFound { selector: String },

    /// An element wait or navigation exceeded its deadline.
    #[error("Timed out after {timeout:?} waiting for {what}")]
    Timeout { what: String, timeout: Duration },

    /// The driver endpoint answered with an error payload.
    #[error("Driver protocol error ({code}): {message}")]
    Protocol { code: String, message: String },

    /// HTTP transport failure talking to the driver endpoint.
    #[error("Driver request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// I/O error (writing screenshots).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// Returns true if the session itself is unusable and must be torn down.
    pub fn is_session_fatal(&self) -> bool {
        match self {
            DriverError::SessionLost { .. } | DriverError::LaunchFailed { .. } => true,
            DriverError::Request(e) => e.is_connect(),
            _ => false,
        }
    }
}

/// Errors while building the configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A value was present but could not be used.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}
