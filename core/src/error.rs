//! Error types for the Pocket API client.
//!
//! # Design
//! The remote service reports domain failures through a non-2xx status plus
//! two headers, `x-error-code` and `x-error`. Both are captured together in
//! `HttpError` so callers can branch on the numeric code while still logging
//! the human-readable message. Decode failures carry the dotted path of the
//! value that could not be normalized.

use std::fmt;

/// Errors returned by `PocketClient` operations and their request builders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// The transport could not complete the round-trip.
    TransportError(String),

    /// The server returned a non-2xx status.
    HttpError {
        status: u16,
        /// Value of the `x-error-code` header.
        code: Option<String>,
        /// Value of the `x-error` header.
        message: Option<String>,
    },

    /// The response body could not be normalized into the expected type.
    /// `path` is `$` for the document root, otherwise a dotted field path.
    DeserializationError { path: String, message: String },

    /// The request payload could not be serialized to JSON.
    SerializationError(String),

    /// A required configuration value is missing or invalid.
    ConfigError(String),
}

impl ApiError {
    pub(crate) fn decode(path: &str, message: impl fmt::Display) -> Self {
        ApiError::DeserializationError {
            path: path.to_string(),
            message: message.to_string(),
        }
    }

    /// The remote error code, when this is an `HttpError` that carried one.
    pub fn error_code(&self) -> Option<&str> {
        match self {
            ApiError::HttpError { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::TransportError(msg) => write!(f, "request failed: {msg}"),
            ApiError::HttpError {
                status,
                code,
                message,
            } => {
                write!(
                    f,
                    "HTTP {status}: error={}, code={}",
                    message.as_deref().unwrap_or(""),
                    code.as_deref().unwrap_or("")
                )
            }
            ApiError::DeserializationError { path, message } => {
                write!(f, "deserialization failed at {path}: {message}")
            }
            ApiError::SerializationError(msg) => {
                write!(f, "serialization failed: {msg}")
            }
            ApiError::ConfigError(msg) => write!(f, "invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}
