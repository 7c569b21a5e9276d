//! ExecResult and PipelineResult — the outcomes of running commands.
//!
//! A single stage produces an `ExecResult`. A whole submitted line produces a
//! `PipelineResult`, which is what front ends see.

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

/// The result of executing one command (one pipeline stage).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Exit code. 0 means success.
    pub code: i64,
    /// Standard output; canonical for pipes.
    pub out: String,
    /// Error message if failed.
    pub err: String,
    /// Error classification, set on every failure.
    pub kind: Option<ErrorKind>,
}

impl ExecResult {
    /// Create a successful result with output.
    pub fn success(out: impl Into<String>) -> Self {
        Self {
            code: 0,
            out: out.into(),
            err: String::new(),
            kind: None,
        }
    }

    /// Create a failed result with an exit code and message.
    ///
    /// The kind defaults to `CommandFailed`; use [`ExecResult::error`] when a
    /// more specific tag applies.
    pub fn failure(code: i64, err: impl Into<String>) -> Self {
        Self {
            code,
            out: String::new(),
            err: err.into(),
            kind: Some(ErrorKind::CommandFailed),
        }
    }

    /// Create a failed result carrying a specific error kind.
    pub fn error(kind: ErrorKind, err: impl Into<String>) -> Self {
        Self {
            code: 1,
            out: String::new(),
            err: err.into(),
            kind: Some(kind),
        }
    }

    /// True if the command succeeded (exit code 0).
    pub fn ok(&self) -> bool {
        self.code == 0
    }
}

impl Default for ExecResult {
    fn default() -> Self {
        Self::success("")
    }
}

/// The aggregate result of a submitted command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineResult {
    /// Logical AND of every stage that ran.
    pub success: bool,
    /// Final stdout that was not redirected into a file.
    pub stdout: String,
    /// First failing stage's message.
    pub error: Option<String>,
    /// First failing stage's error kind.
    pub kind: Option<ErrorKind>,
    /// Working directory after the line ran (`cd` may change it).
    pub cwd: String,
}

impl PipelineResult {
    /// A successful result.
    pub fn ok(stdout: impl Into<String>, cwd: impl Into<String>) -> Self {
        Self {
            success: true,
            stdout: stdout.into(),
            error: None,
            kind: None,
            cwd: cwd.into(),
        }
    }

    /// A failed result with no output.
    pub fn failed(kind: ErrorKind, error: impl Into<String>, cwd: impl Into<String>) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            error: Some(error.into()),
            kind: Some(kind),
            cwd: cwd.into(),
        }
    }

    /// Build from the last stage's result.
    pub fn from_exec(result: ExecResult, cwd: impl Into<String>) -> Self {
        if result.ok() {
            Self::ok(result.out, cwd)
        } else {
            Self {
                success: false,
                stdout: result.out,
                error: Some(result.err),
                kind: Some(result.kind.unwrap_or(ErrorKind::CommandFailed)),
                cwd: cwd.into(),
            }
        }
    }

    /// True when the line failed because of a cancellation.
    pub fn was_cancelled(&self) -> bool {
        self.kind == Some(ErrorKind::Cancelled)
    }
}
