//! wait — Wait for background jobs to finish.

use async_trait::async_trait;
use vsh_types::{ExecResult, JobState, ToolArgs, ToolSchema};

use super::parse_job_id;
use crate::error::ShellError;
use crate::tools::{ExecContext, Tool};

/// Wait tool: block until the named jobs (or all running jobs) finish.
pub struct Wait;

#[async_trait]
impl Tool for Wait {
    fn name(&self) -> &str {
        "wait"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("wait", "Wait for background jobs to finish")
            .example("Wait for everything", "wait")
            .example("Wait for one job", "wait %2")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let ids = if args.positional.is_empty() {
            ctx.jobs
                .list()
                .await
                .into_iter()
                .filter(|job| job.state == JobState::Running)
                .map(|job| job.id)
                .collect()
        } else {
            let mut ids = Vec::new();
            for spec in &args.positional {
                match parse_job_id(spec) {
                    Some(id) => ids.push(id),
                    None => {
                        return ShellError::Validation(format!("invalid job reference: '{}'", spec))
                            .into_exec("wait")
                    }
                }
            }
            ids
        };

        let mut out = String::new();
        let mut failed = false;
        for id in ids {
            let result = tokio::select! {
                _ = ctx.cancel.cancelled() => return ShellError::Cancelled.into_exec("wait"),
                result = ctx.jobs.wait(id) => result,
            };
            match result {
                Ok(result) => {
                    failed |= !result.success;
                    let state = ctx.jobs.get(id).await.map(|job| job.state.to_string());
                    out.push_str(&format!("[{}] {}\n", id, state.unwrap_or_default()));
                }
                Err(e) => return e.into_exec("wait"),
            }
        }

        if failed {
            let mut result = ExecResult::failure(1, "wait: a job failed");
            result.out = out;
            result
        } else {
            ExecResult::success(out)
        }
    }
}
