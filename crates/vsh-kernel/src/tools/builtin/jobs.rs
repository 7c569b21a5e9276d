//! jobs — List background jobs.

use async_trait::async_trait;
use vsh_types::{ArgConstraint, ExecResult, FlagDef, ToolArgs, ToolSchema};

use crate::tools::{ExecContext, Tool};

/// Jobs tool: list background jobs and their states.
pub struct Jobs;

#[async_trait]
impl Tool for Jobs {
    fn name(&self) -> &str {
        "jobs"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("jobs", "List background jobs")
            .args(ArgConstraint::exact(0))
            .flag(FlagDef::switch("cleanup", "Remove finished jobs from the table").with_aliases(["c"]))
            .example("List jobs", "jobs")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.has_flag("cleanup") {
            let removed = ctx.jobs.reap_finished().await;
            return ExecResult::success(format!("Cleaned up {} finished job(s)\n", removed.len()));
        }

        let out: String = ctx
            .jobs
            .list()
            .await
            .into_iter()
            .map(|job| format!("[{}] {:<10} {}\n", job.id, job.state.to_string(), job.command))
            .collect();
        ExecResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::tools::builtin::testing::{args, make_ctx, with_flags};
    use tokio_util::sync::CancellationToken;
    use vsh_types::PipelineResult;

    #[tokio::test]
    async fn test_jobs_lists_and_cleans_up() {
        let mut ctx = make_ctx(Identity::root());
        assert_eq!(Jobs.execute(args(&[]), &mut ctx).await.out, "");

        let id = ctx
            .jobs
            .spawn("echo hi".into(), CancellationToken::new(), async {
                PipelineResult::ok("hi\n", "/")
            })
            .await;
        ctx.jobs.wait(id).await.unwrap();

        let listing = Jobs.execute(args(&[]), &mut ctx).await;
        assert_eq!(listing.out, "[1] Done       echo hi\n");

        let cleaned = Jobs.execute(with_flags(&[], &["cleanup"]), &mut ctx).await;
        assert_eq!(cleaned.out, "Cleaned up 1 finished job(s)\n");
        assert!(ctx.jobs.list().await.is_empty());
    }
}
