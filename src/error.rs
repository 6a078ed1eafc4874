//! Error types for vidgrab
//!
//! This module provides the error handling used across the library:
//! - Domain error types (task lifecycle, extraction, configuration)
//! - HTTP status code mapping for API integration
//! - Structured error responses with machine-readable error codes

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for vidgrab operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for vidgrab
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error with context about which setting is invalid
    #[error("configuration error: {message}")]
    Config {
        /// Human-readable error message describing the configuration issue
        message: String,
        /// The configuration key that caused the error (e.g., "max_concurrent_downloads")
        key: Option<String>,
    },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Generic resource not found (stored files, paths)
    #[error("{0} not found")]
    NotFound(String),

    /// No task is registered under this identifier
    #[error("task {0} not found")]
    TaskNotFound(String),

    /// The task exists but its file cannot be served
    #[error("file for task {id} is not ready: {reason}")]
    FileNotReady {
        /// Task identifier
        id: String,
        /// Why the file is unavailable ("status is downloading", "file deleted", ...)
        reason: String,
    },

    /// Invalid client input (missing URL, unsafe filename, ...)
    #[error("{0}")]
    InvalidInput(String),

    /// Illegal task lifecycle transition
    #[error("task {id} cannot move from {from} to {to}")]
    InvalidState {
        /// Task identifier
        id: String,
        /// Current status
        from: String,
        /// Requested status
        to: String,
    },

    /// Failure reported by the extraction collaborator
    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    /// External tool could not be executed
    #[error("external tool error: {0}")]
    ExternalTool(String),

    /// Operation not supported (missing binary)
    #[error("not supported: {0}")]
    NotSupported(String),

    /// Shutdown in progress - not accepting new downloads
    #[error("shutdown in progress: not accepting new downloads")]
    ShuttingDown,

    /// API server error
    #[error("API server error: {0}")]
    ApiServerError(String),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors produced while resolving or fetching media
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The extractor ran and reported failure
    #[error("{reason}")]
    Failed {
        /// Extractor-provided description (usually the stderr tail)
        reason: String,
    },

    /// The extractor produced output that could not be understood
    #[error("unexpected extractor output: {reason}")]
    InvalidOutput {
        /// What was wrong with the output
        reason: String,
    },

    /// The extractor reported success but the file is not on disk
    #[error("file not found: {}", path.display())]
    FileMissing {
        /// Path the extractor reported
        path: PathBuf,
    },

    /// A quality label that does not name a height (e.g. "best" instead of "720p")
    #[error("invalid quality label '{label}'")]
    InvalidQuality {
        /// The rejected label
        label: String,
    },
}

/// API error response format
///
/// `error` is the human-readable message, so clients that only read
/// `data.error` get a plain string. The machine-readable code and optional
/// context sit beside it.
///
/// # Example JSON Response
///
/// ```json
/// {
///   "error": "task 1a2b3c4d not found",
///   "code": "task_not_found",
///   "details": { "task_id": "1a2b3c4d" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Human-readable error message (never empty)
    pub error: String,

    /// Machine-readable error code (e.g., "not_found", "invalid_input")
    pub code: String,

    /// Optional additional context about the error
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    /// Create a new API error with code and message
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
            code: code.into(),
            details: None,
        }
    }

    /// Create a "not found" error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::new("not_found", format!("{} not found", resource.into()))
    }

    /// Create an "invalid input" error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new("invalid_input", message)
    }

    /// Create an "internal server error"
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new("internal_error", message)
    }
}

/// Convert errors to HTTP status codes for API responses
pub trait ToHttpStatus {
    /// Get the HTTP status code for this error
    fn status_code(&self) -> u16;

    /// Get the machine-readable error code
    fn error_code(&self) -> &str;
}

impl ToHttpStatus for Error {
    fn status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - Client error (invalid input)
            Error::Config { .. } => 400,
            Error::InvalidInput(_) => 400,
            Error::Extraction(ExtractionError::InvalidQuality { .. }) => 400,

            // 404 Not Found
            Error::NotFound(_) => 404,
            Error::TaskNotFound(_) => 404,
            Error::FileNotReady { .. } => 404,
            Error::Extraction(ExtractionError::FileMissing { .. }) => 404,

            // 409 Conflict
            Error::InvalidState { .. } => 409,

            // 500 Internal Server Error
            Error::Io(_) => 500,
            Error::Serialization(_) => 500,
            Error::ApiServerError(_) => 500,
            Error::Other(_) => 500,

            // 502 Bad Gateway - the extractor or the remote site failed
            Error::Extraction(_) => 502,

            // 503 Service Unavailable
            Error::ShuttingDown => 503,
            Error::ExternalTool(_) => 503,

            // 501 Not Implemented
            Error::NotSupported(_) => 501,
        }
    }

    fn error_code(&self) -> &str {
        match self {
            Error::Config { .. } => "config_error",
            Error::Io(_) => "io_error",
            Error::Serialization(_) => "serialization_error",
            Error::NotFound(_) => "not_found",
            Error::TaskNotFound(_) => "task_not_found",
            Error::FileNotReady { .. } => "file_not_ready",
            Error::InvalidInput(_) => "invalid_input",
            Error::InvalidState { .. } => "invalid_state",
            Error::Extraction(e) => match e {
                ExtractionError::Failed { .. } => "extraction_failed",
                ExtractionError::InvalidOutput { .. } => "invalid_extractor_output",
                ExtractionError::FileMissing { .. } => "file_missing",
                ExtractionError::InvalidQuality { .. } => "invalid_quality",
            },
            Error::ExternalTool(_) => "external_tool_error",
            Error::NotSupported(_) => "not_supported",
            Error::ShuttingDown => "shutting_down",
            Error::ApiServerError(_) => "api_server_error",
            Error::Other(_) => "internal_error",
        }
    }
}

impl From<Error> for ApiError {
    fn from(error: Error) -> Self {
        let code = error.error_code().to_string();
        let message = error.to_string();

        let details = match &error {
            Error::TaskNotFound(id) => Some(serde_json::json!({
                "task_id": id,
            })),
            Error::FileNotReady { id, reason } => Some(serde_json::json!({
                "task_id": id,
                "reason": reason,
            })),
            Error::InvalidState { id, from, to } => Some(serde_json::json!({
                "task_id": id,
                "from": from,
                "to": to,
            })),
            Error::Extraction(ExtractionError::InvalidQuality { label }) => {
                Some(serde_json::json!({
                    "quality": label,
                }))
            }
            Error::Config { key: Some(key), .. } => Some(serde_json::json!({
                "key": key,
            })),
            _ => None,
        };

        ApiError {
            error: message,
            code,
            details,
        }
    }
}
