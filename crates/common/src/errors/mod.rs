//! Error types for Evidence Nexus
//!
//! Provides:
//! - Distinct error types for the few operations that can fail
//! - Stable, machine-readable error codes
//! - Conversions from the crates we sit on top of
//!
//! The query path itself degrades to empty results instead of erroring;
//! only strict parsing, node validation, snapshot loading and configuration
//! produce these.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using NexusError
pub type Result<T> = std::result::Result<T, NexusError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    ParseError,
    InvalidDirection,

    // Resource errors (4xxx)
    NodeNotFound,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
    IoError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            // Validation (1xxx)
            ErrorCode::ValidationError => 1001,
            ErrorCode::ParseError => 1002,
            ErrorCode::InvalidDirection => 1003,

            // Resources (4xxx)
            ErrorCode::NodeNotFound => 4001,

            // Internal (9xxx)
            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
            ErrorCode::IoError => 9004,
        }
    }
}

/// Evidence Nexus error types
#[derive(Error, Debug)]
pub enum NexusError {
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Query parse error: {message} (at `{fragment}`)")]
    Parse { message: String, fragment: String },

    #[error("Invalid traversal direction: {value} (expected downstream, upstream or both)")]
    InvalidDirection { value: String },

    #[error("Evidence node not found: {id}")]
    NodeNotFound { id: String },

    #[error("Configuration error: {0}")]
    Configuration(#[from] config::ConfigError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {message}")]
    Io { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl NexusError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            NexusError::Validation { .. } => ErrorCode::ValidationError,
            NexusError::Parse { .. } => ErrorCode::ParseError,
            NexusError::InvalidDirection { .. } => ErrorCode::InvalidDirection,
            NexusError::NodeNotFound { .. } => ErrorCode::NodeNotFound,
            NexusError::Configuration(_) => ErrorCode::ConfigurationError,
            NexusError::Serialization(_) => ErrorCode::SerializationError,
            NexusError::Io { .. } => ErrorCode::IoError,
            NexusError::Internal { .. } => ErrorCode::InternalError,
        }
    }

    /// Shorthand for a parse error over a query fragment
    pub fn parse(message: impl Into<String>, fragment: impl Into<String>) -> Self {
        NexusError::Parse {
            message: message.into(),
            fragment: fragment.into(),
        }
    }

    /// Check if the caller supplied bad input (as opposed to an environment failure)
    pub fn is_client_error(&self) -> bool {
        self.code().as_code() < 9000
    }
}

impl From<std::io::Error> for NexusError {
    fn from(err: std::io::Error) -> Self {
        NexusError::Io {
            message: err.to_string(),
        }
    }
}

impl From<validator::ValidationErrors> for NexusError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let field = errors.field_errors().keys().next().map(|f| f.to_string());
        NexusError::Validation {
            message: errors.to_string(),
            field,
        }
    }
}
