//! Error types for Campus.
//!
//! Domain failures (validation, duplicates, unknown records, bad
//! credentials) are reported to the caller without any mutation having
//! taken place. Storage write failures always propagate. Reads of a table
//! are fail-soft and never surface here; see [`crate::storage`].

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for Campus operations.
#[derive(Error, Debug)]
pub enum CampusError {
    /// Malformed input: bad score, bad level code, empty name, short password.
    #[error("invalid input: {message}")]
    Validation { message: String },

    /// A uniqueness rule was violated (rating, course name, user handle).
    #[error("already exists: {message}")]
    Duplicate { message: String },

    /// The referenced user or course does not exist.
    #[error("not found: {what}")]
    NotFound { what: String },

    /// Credentials were rejected or the admin account is not configured.
    #[error("authentication failed: {message}")]
    Authentication { message: String },

    /// I/O errors from table, backup or audit file operations.
    #[error("storage error at {path}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// JSON serialization errors.
    #[error("serialization error: {message}")]
    Serde { message: String },

    /// Configuration loading errors.
    #[error("config error: {message}")]
    Config { message: String },
}

/// A specialized Result type for Campus operations.
pub type Result<T> = std::result::Result<T, CampusError>;

impl CampusError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a duplicate error.
    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::Authentication {
            message: message.into(),
        }
    }

    /// Create a storage error from an I/O error.
    pub fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }

    /// Create a serialization error.
    pub fn serde(message: impl Into<String>) -> Self {
        Self::Serde {
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<io::Error> for CampusError {
    fn from(err: io::Error) -> Self {
        Self::Storage {
            path: PathBuf::new(),
            source: err,
        }
    }
}

impl From<serde_json::Error> for CampusError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde {
            message: err.to_string(),
        }
    }
}

/// Fail-open handling for side channels such as the audit log.
///
/// A failed audit write must not undo or block the operation it
/// describes, so the error is logged and a fallback is returned.
pub trait FailOpen<T> {
    /// On error, log a warning and return `T::default()`.
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default;
}

impl<T> FailOpen<T> for Result<T> {
    fn fail_open_default(self, context: &str) -> T
    where
        T: Default,
    {
        match self {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "{} failed, continuing", context);
                T::default()
            }
        }
    }
}

/// Exit codes for the Campus CLI.
pub mod exit_codes {
    /// The command completed.
    pub const SUCCESS: i32 = 0;

    /// The command was rejected or failed.
    pub const FAILURE: i32 = 1;

    /// The process panicked.
    pub const CRASH: i32 = 3;
}
