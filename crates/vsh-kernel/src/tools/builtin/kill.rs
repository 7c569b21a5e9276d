//! kill — Cancel background jobs.

use async_trait::async_trait;
use vsh_types::{ArgConstraint, ExecResult, ToolArgs, ToolSchema};

use super::parse_job_id;
use crate::error::ShellError;
use crate::tools::{ExecContext, Tool};

/// Kill tool: request cancellation of jobs by id.
pub struct Kill;

#[async_trait]
impl Tool for Kill {
    fn name(&self) -> &str {
        "kill"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("kill", "Cancel background jobs")
            .args(ArgConstraint::at_least(1))
            .example("Cancel job 1", "kill %1")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        for spec in &args.positional {
            let Some(id) = parse_job_id(spec) else {
                return ShellError::Validation(format!("invalid job reference: '{}'", spec)).into_exec("kill");
            };
            if let Err(e) = ctx.jobs.cancel(id).await {
                return e.into_exec("kill");
            }
        }
        ExecResult::success("")
    }
}
