//! true/false — Fixed exit status builtins.

use async_trait::async_trait;
use vsh_types::{ExecResult, ToolArgs, ToolSchema};

use crate::tools::{ExecContext, Tool};

/// True builtin: always succeeds (exit code 0).
pub struct True;

#[async_trait]
impl Tool for True {
    fn name(&self) -> &str {
        "true"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("true", "Exit with success (code 0)").example("Always succeeds", "true")
    }

    async fn execute(&self, _args: ToolArgs, _ctx: &mut ExecContext) -> ExecResult {
        ExecResult::success("")
    }
}

/// False builtin: always fails (exit code 1).
pub struct False;

#[async_trait]
impl Tool for False {
    fn name(&self) -> &str {
        "false"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("false", "Exit with failure (code 1)").example("Always fails", "false")
    }

    async fn execute(&self, _args: ToolArgs, _ctx: &mut ExecContext) -> ExecResult {
        ExecResult::failure(1, "false: exited with status 1")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::Identity;
    use crate::tools::builtin::testing::{args, make_ctx};

    #[tokio::test]
    async fn true_ignores_arguments() {
        let mut ctx = make_ctx(Identity::root());
        let result = True.execute(args(&["ignored"]), &mut ctx).await;
        assert!(result.ok());
        assert_eq!(result.code, 0);
    }

    #[tokio::test]
    async fn false_fails() {
        let mut ctx = make_ctx(Identity::root());
        let result = False.execute(args(&[]), &mut ctx).await;
        assert!(!result.ok());
        assert_eq!(result.code, 1);
    }
}
