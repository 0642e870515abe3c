//! Error types for hearth
//!
//! Exit codes:
//! - 0: Success
//! - 2: User error (bad args, malformed date, unknown template)
//! - 4: Operation failed (storage error, lock contention)

use std::path::PathBuf;
use thiserror::Error;

/// Exit codes for the hearth CLI
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const USER_ERROR: i32 = 2;
    pub const OPERATION_FAILED: i32 = 4;
}

/// Main error type for hearth operations
#[derive(Error, Debug)]
pub enum Error {
    // User errors (exit code 2)
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Invalid date '{0}': expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("Template not found: {0}")]
    TemplateNotFound(String),

    // Operation failures (exit code 4)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("Lock acquisition failed: {0}")]
    LockFailed(PathBuf),

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl Error {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidConfig(_)
            | Error::InvalidArgument(_)
            | Error::InvalidDate(_)
            | Error::TemplateNotFound(_) => exit_codes::USER_ERROR,

            Error::Io(_)
            | Error::Json(_)
            | Error::TomlParse(_)
            | Error::TomlSerialize(_)
            | Error::LockFailed(_)
            | Error::OperationFailed(_) => exit_codes::OPERATION_FAILED,
        }
    }

    /// True for errors whose message is safe to surface verbatim to callers.
    ///
    /// Persistence and IO failures are logged in full but reported
    /// generically; validation errors carry user-facing messages.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::InvalidConfig(_)
                | Error::InvalidArgument(_)
                | Error::InvalidDate(_)
                | Error::TemplateNotFound(_)
        )
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        None
    }
}

/// Result type alias for hearth operations
pub type Result<T> = std::result::Result<T, Error>;

/// Wrapper for displaying errors in JSON format
#[derive(serde::Serialize)]
pub struct JsonError {
    pub error: String,
    pub code: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl From<&Error> for JsonError {
    fn from(err: &Error) -> Self {
        JsonError {
            error: err.to_string(),
            code: err.exit_code(),
            details: None,
        }
    }
}
