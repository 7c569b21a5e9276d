//! cat — Concatenate files to stdout.

use async_trait::async_trait;
use vsh_types::{
    Access, ArgSelector, ExecResult, NodeKind, PathRequirement, PermissionRequirement,
    PermissionTarget, ToolArgs, ToolSchema,
};

use super::read_inputs;
use crate::tools::{ExecContext, Tool};

/// Cat tool: print file contents, or pass stdin through.
pub struct Cat;

#[async_trait]
impl Tool for Cat {
    fn name(&self) -> &str {
        "cat"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("cat", "Print file contents")
            .path(PathRequirement::exists(ArgSelector::From(0)).of_kind(NodeKind::File))
            .permission(PermissionRequirement::new(
                ArgSelector::From(0),
                Access::Read,
                PermissionTarget::Node,
            ))
            .example("Print a file", "cat notes.txt")
            .example("Pass stdin through", "echo hi | cat")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        match read_inputs("cat", &args.positional, ctx) {
            Ok(inputs) => ExecResult::success(inputs.into_iter().map(|i| i.text).collect::<String>()),
            Err(result) => result,
        }
    }
}
