//! Unified error handling for puerta-sdam
//!
//! Classification and snapshot construction never fail. Errors only show up
//! at the edges: decoding a raw handshake reply, loading configuration, and
//! checking a server against the supported wire-version range.

use std::io;
use thiserror::Error;

/// Main error type for puerta-sdam operations
#[derive(Debug, Error)]
pub enum SdamError {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The handshake reply could not be read as a document
    #[error("Reply parse error: {message}")]
    ReplyParse { message: String },

    /// Malformed JSON input
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server wire versions do not overlap the supported range
    #[error("Incompatible server {address}: {message}")]
    IncompatibleServer { address: String, message: String },

    /// IO errors from the tooling layer
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Serialize error: {0}")]
    SerializeError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

/// Failure descriptor carried by a snapshot built from a failed handshake.
///
/// Kept separate from [`SdamError`] because snapshots are cloned freely and
/// `io::Error` is not `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize)]
#[error("{message}")]
pub struct HandshakeError {
    pub message: String,
}

impl HandshakeError {
    pub fn new<S: Into<String>>(message: S) -> Self {
        HandshakeError {
            message: message.into(),
        }
    }
}

/// Result type alias for puerta-sdam operations
pub type SdamResult<T> = Result<T, SdamError>;

/// Convenience methods for creating specific error types
impl SdamError {
    /// Create a reply parse error
    pub fn reply_parse<S: Into<String>>(message: S) -> Self {
        SdamError::ReplyParse {
            message: message.into(),
        }
    }

    /// Create an incompatible server error
    pub fn incompatible<A: Into<String>, S: Into<String>>(address: A, message: S) -> Self {
        SdamError::IncompatibleServer {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Check if this error is about the server rather than local input
    pub fn is_server_side(&self) -> bool {
        matches!(self, SdamError::IncompatibleServer { .. })
    }
}
