//! Stable error-kind tags.
//!
//! Every failure carries one of these tags next to its human-readable message.
//! Callers branch on the tag; the message is for display only.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Classification of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed line: quoting, pipe or redirect syntax.
    ParseError,
    /// Argument arity, unknown flag, wrong node type, missing path.
    ValidationError,
    /// Owner/group/mode check failed.
    PermissionError,
    /// A path does not resolve.
    NotFound,
    /// A node already occupies the name.
    AlreadyExists,
    /// A path component that must be a directory is a file.
    NotADirectory,
    /// Structurally forbidden operation (root deletion, `.`/`..` names, ...).
    InvalidOperation,
    /// A destructive recursive operation needs explicit confirmation.
    ConfirmationRequired,
    /// Job cancellation observed at a suspension point or checkpoint.
    Cancelled,
    /// The persistence store failed to save or load.
    PersistenceError,
    /// The command ran and reported failure on its own terms.
    CommandFailed,
}

impl ErrorKind {
    /// The stable tag string.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ParseError => "ParseError",
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::PermissionError => "PermissionError",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::AlreadyExists => "AlreadyExists",
            ErrorKind::NotADirectory => "NotADirectory",
            ErrorKind::InvalidOperation => "InvalidOperation",
            ErrorKind::ConfirmationRequired => "ConfirmationRequired",
            ErrorKind::Cancelled => "Cancelled",
            ErrorKind::PersistenceError => "PersistenceError",
            ErrorKind::CommandFailed => "CommandFailed",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
