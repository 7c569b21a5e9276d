//! Core tool trait.

use async_trait::async_trait;
use vsh_types::{ExecResult, ToolArgs, ToolSchema};

use super::context::ExecContext;

/// A command that can be executed.
///
/// The schema is the declarative half: the validator checks arity, flags,
/// paths and permissions against it before `execute` is ever called. The
/// effect lives entirely in `execute`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The tool's name (used for lookup).
    fn name(&self) -> &str;

    /// Get the tool's schema.
    fn schema(&self) -> ToolSchema;

    /// Execute the tool with validated arguments.
    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult;
}
