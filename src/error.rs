//! Custom error types for MyBrain backups
//!
//! This module defines the error hierarchy for the backup subsystem using
//! thiserror for ergonomic error definitions. Every failure the engines can
//! report maps onto a closed set of [`ErrorKind`]s, which is what the
//! scheduler uses to decide whether an attempt may be retried.

use thiserror::Error;

/// The main error type for backup and restore operations
#[derive(Error, Debug)]
pub enum BackupError {
    /// Caller or configuration mistake (missing password, blank destination)
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// Destination unreadable or unwritable
    #[error("I/O error: {0}")]
    Io(String),

    /// An identifier field was neither a JSON string nor a JSON integer
    #[error("Malformed identifier in {record}.{field}: found {found}")]
    MalformedIdentifier {
        record: &'static str,
        field: &'static str,
        found: &'static str,
    },

    /// Structural problem in a backup document
    #[error("Schema error in {record}: {detail}")]
    Schema {
        record: &'static str,
        detail: String,
    },

    /// Decryption or integrity failure. Deliberately carries no detail.
    #[error("Wrong password or corrupted file")]
    AuthFailure,

    /// Document decoded fine but is not internally consistent
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another export or import already holds the resource
    #[error("Busy: {0}")]
    Busy(String),

    /// Domain repository failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Settings could not be read or written
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Coarse classification of a [`BackupError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Precondition,
    Io,
    MalformedIdentifier,
    Schema,
    AuthFailure,
    Validation,
    Busy,
    Storage,
    Config,
}

impl BackupError {
    /// Create a schema error for a record type
    pub fn schema(record: &'static str, detail: impl Into<String>) -> Self {
        Self::Schema {
            record,
            detail: detail.into(),
        }
    }

    /// Get the kind of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::Io(_) => ErrorKind::Io,
            Self::MalformedIdentifier { .. } => ErrorKind::MalformedIdentifier,
            Self::Schema { .. } => ErrorKind::Schema,
            Self::AuthFailure => ErrorKind::AuthFailure,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Busy(_) => ErrorKind::Busy,
            Self::Storage(_) => ErrorKind::Storage,
            Self::Config(_) => ErrorKind::Config,
        }
    }

    /// Only destination I/O failures are worth another attempt
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Io
    }
}

impl From<std::io::Error> for BackupError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<tokio::task::JoinError> for BackupError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Storage(format!("Background task failed: {}", err))
    }
}

/// Result type alias for backup operations
pub type BackupResult<T> = Result<T, BackupError>;
