//! env — Print session variables.

use async_trait::async_trait;
use vsh_types::{ArgConstraint, ExecResult, ToolArgs, ToolSchema};

use crate::env::Env as Vars;
use crate::tools::{ExecContext, Tool};

/// Env tool: print every session variable as `NAME=value`.
pub struct Env;

#[async_trait]
impl Tool for Env {
    fn name(&self) -> &str {
        "env"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("env", "Print session variables").args(ArgConstraint::exact(0))
    }

    async fn execute(&self, _args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        ExecResult::success(render(&ctx.env.snapshot()))
    }
}

/// One `NAME=value` line per variable, sorted by name.
pub(super) fn render(vars: &Vars) -> String {
    vars.iter().map(|(k, v)| format!("{}={}\n", k, v)).collect()
}
