//! pwd — Print working directory.

use async_trait::async_trait;
use vsh_types::{ArgConstraint, ExecResult, ToolArgs, ToolSchema};

use crate::tools::{ExecContext, Tool};

/// Pwd tool: print current working directory.
pub struct Pwd;

#[async_trait]
impl Tool for Pwd {
    fn name(&self) -> &str {
        "pwd"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("pwd", "Print current working directory").args(ArgConstraint::exact(0))
    }

    async fn execute(&self, _args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        ExecResult::success(format!("{}\n", ctx.cwd))
    }
}
