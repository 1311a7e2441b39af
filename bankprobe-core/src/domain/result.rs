//! Result and error types for the core library

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Core library error type
///
/// The flow runner treats every variant the same way: the step failed and the
/// dependent steps are skipped. The variants only carry better diagnostics.
#[derive(Error, Debug)]
pub enum Error {
    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Request failed: {0}")]
    Transport(String),

    /// The server answered with a success status but the body did not decode
    #[error("Unexpected response body (HTTP {status}): {message}")]
    Decode {
        status: u16,
        body: String,
        message: String,
    },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// HTTP status carried by the error, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } | Self::Decode { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Text shown to the operator: the raw body whenever the server answered,
    /// the error message otherwise
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Http { body, .. } => body.clone(),
            Self::Decode { body, message, .. } if body.trim().is_empty() => message.clone(),
            Self::Decode { body, .. } => body.clone(),
            other => other.to_string(),
        }
    }
}

/// Core library result type
pub type Result<T> = std::result::Result<T, Error>;

/// Parse an error body as JSON.
///
/// Returns `None` when the body is not JSON; callers decide whether that
/// matters.
pub fn parse_error_body(body: &str) -> Option<JsonValue> {
    serde_json::from_str(body).ok()
}

/// Structured outcome of one API call
///
/// Replaces printing as a side effect: the caller decides how (and whether)
/// to display the status, payload and diagnostic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallOutcome<T> {
    pub success: bool,
    /// HTTP status, absent when no response was received
    pub status: Option<u16>,
    pub data: Option<T>,
    /// Raw response body or error message on failure
    pub diagnostic: Option<String>,
    /// Failure body parsed as JSON, when it was JSON
    pub error_details: Option<JsonValue>,
    /// Human-readable description of the request that was sent
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<String>,
}

impl<T> CallOutcome<T> {
    /// Create a successful outcome
    pub fn ok(status: u16, data: T) -> Self {
        Self {
            success: true,
            status: Some(status),
            data: Some(data),
            diagnostic: None,
            error_details: None,
            request: None,
        }
    }

    /// Create a failed outcome from an error
    pub fn fail(error: &Error) -> Self {
        Self {
            success: false,
            status: error.status(),
            data: None,
            diagnostic: Some(error.diagnostic()),
            error_details: None,
            request: None,
        }
    }

    /// Attach the description of the request that produced this outcome
    pub fn with_request(mut self, request: impl Into<String>) -> Self {
        self.request = Some(request.into());
        self
    }

    /// Attach the failure body parsed as JSON
    pub fn with_error_details(mut self, details: Option<JsonValue>) -> Self {
        self.error_details = details;
        self
    }

    pub fn is_success(&self) -> bool {
        self.success
    }
}

impl<T> From<Result<(u16, T)>> for CallOutcome<T> {
    fn from(result: Result<(u16, T)>) -> Self {
        match result {
            Ok((status, data)) => Self::ok(status, data),
            Err(e) => Self::fail(&e),
        }
    }
}

impl<T> CallOutcome<Vec<T>> {
    /// Items returned by a list call; empty when the call failed
    pub fn items(&self) -> &[T] {
        self.data.as_deref().unwrap_or(&[])
    }
}
