//! Kernel error type.
//!
//! Every variant maps onto one stable [`ErrorKind`] tag. Commands turn a
//! `ShellError` into an `ExecResult` with [`ShellError::into_exec`] so the tag
//! survives all the way to the caller of `run_line`.

use thiserror::Error;
use vsh_types::{ErrorKind, ExecResult};

/// Result type for kernel operations.
pub type ShellResult<T> = Result<T, ShellError>;

/// Errors produced by the node store, parser, validator and job controller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ShellError {
    #[error("{0}")]
    Parse(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0}: permission denied")]
    Permission(String),
    #[error("{0}: no such file or directory")]
    NotFound(String),
    #[error("{0}: parent directory does not exist")]
    ParentMissing(String),
    #[error("{0}: already exists")]
    AlreadyExists(String),
    #[error("{0}: not a directory")]
    NotADirectory(String),
    #[error("{0}: is a directory")]
    IsADirectory(String),
    #[error("{0}")]
    InvalidOperation(String),
    #[error("{0}: directory not empty, confirmation required")]
    ConfirmationRequired(String),
    #[error("%{0}: no such job")]
    NoSuchJob(u64),
    #[error("cancelled")]
    Cancelled,
    #[error("persistence error: {0}")]
    Persistence(String),
}

impl ShellError {
    /// The stable tag for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            ShellError::Parse(_) => ErrorKind::ParseError,
            ShellError::Validation(_) => ErrorKind::ValidationError,
            ShellError::Permission(_) => ErrorKind::PermissionError,
            ShellError::NotFound(_) | ShellError::ParentMissing(_) | ShellError::NoSuchJob(_) => {
                ErrorKind::NotFound
            }
            ShellError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            ShellError::NotADirectory(_) => ErrorKind::NotADirectory,
            ShellError::IsADirectory(_) | ShellError::InvalidOperation(_) => {
                ErrorKind::InvalidOperation
            }
            ShellError::ConfirmationRequired(_) => ErrorKind::ConfirmationRequired,
            ShellError::Cancelled => ErrorKind::Cancelled,
            ShellError::Persistence(_) => ErrorKind::PersistenceError,
        }
    }

    /// Convert into a failed command result, prefixing the message with the
    /// command name.
    pub fn into_exec(self, command: &str) -> ExecResult {
        ExecResult::error(self.kind(), format!("{}: {}", command, self))
    }
}

impl From<serde_json::Error> for ShellError {
    fn from(err: serde_json::Error) -> Self {
        ShellError::Persistence(err.to_string())
    }
}

impl From<std::io::Error> for ShellError {
    fn from(err: std::io::Error) -> Self {
        ShellError::Persistence(err.to_string())
    }
}
