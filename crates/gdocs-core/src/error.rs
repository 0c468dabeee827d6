//! Error types for gdocs-mcp.

use serde::Deserialize;
use thiserror::Error;

/// Main error type for gdocs operations.
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed before a response was received
    #[error("HTTP error: {0}")]
    Http(String),

    /// Access token could not be obtained
    #[error("Authentication error: {0}")]
    Auth(String),

    /// API returned a non-success status
    #[error("API error: {status} - {message}")]
    Api {
        status: u16,
        message: String,
        details: Option<String>,
    },

    /// Response body could not be interpreted
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Serialization/deserialization failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error (fatal at startup)
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Google JSON error envelope: `{"error": {"code", "message", "status"}}`.
#[derive(Debug, Deserialize)]
struct GoogleErrorEnvelope {
    error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
struct GoogleErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    status: Option<String>,
}

impl Error {
    /// Build an error from a non-success HTTP status and its response body.
    ///
    /// Google APIs wrap failures in a JSON envelope; when the body matches it,
    /// the inner message and status name are extracted. Otherwise the raw body
    /// is used as the message.
    pub fn from_status(status: u16, body: String) -> Self {
        match serde_json::from_str::<GoogleErrorEnvelope>(&body) {
            Ok(envelope) => Error::Api {
                status,
                message: envelope.error.message.unwrap_or(body),
                details: envelope.error.status,
            },
            Err(_) => Error::Api {
                status,
                message: if body.is_empty() {
                    format!("request failed with status {}", status)
                } else {
                    body
                },
                details: None,
            },
        }
    }

    /// Remote HTTP status code, if this error came from an API response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Error::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Message without the variant prefix, suitable for result payloads.
    pub fn message(&self) -> String {
        match self {
            Error::Api { message, .. } => message.clone(),
            Error::Http(msg)
            | Error::Auth(msg)
            | Error::InvalidData(msg)
            | Error::Config(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Extra detail attached to an API error (e.g. `PERMISSION_DENIED`).
    pub fn details(&self) -> Option<String> {
        match self {
            Error::Api { details, .. } => details.clone(),
            _ => None,
        }
    }

    /// Whether this is a fatal configuration error.
    pub fn is_config(&self) -> bool {
        matches!(self, Error::Config(_))
    }
}

/// Result type alias for gdocs operations.
pub type Result<T> = std::result::Result<T, Error>;
