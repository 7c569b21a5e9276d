//! cd — Change working directory.

use async_trait::async_trait;
use vsh_types::{
    Access, ArgConstraint, ArgSelector, ExecResult, NodeKind, PathRequirement,
    PermissionRequirement, PermissionTarget, ToolArgs, ToolSchema,
};

use crate::error::ShellError;
use crate::tools::{ExecContext, Tool};

/// Cd tool: change the working directory for the rest of the line.
pub struct Cd;

#[async_trait]
impl Tool for Cd {
    fn name(&self) -> &str {
        "cd"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("cd", "Change the working directory")
            .args(ArgConstraint::at_most(1))
            .path(PathRequirement::exists(ArgSelector::Index(0)).of_kind(NodeKind::Directory))
            .permission(PermissionRequirement::new(
                ArgSelector::Index(0),
                Access::Execute,
                PermissionTarget::Node,
            ))
            .example("Go home", "cd")
            .example("Go up one level", "cd ..")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let target = match args.get_positional(0) {
            Some(dir) => ctx.resolve_path(dir),
            None => ctx.identity.home_dir(),
        };

        match ctx.fs.stat(&target) {
            Ok(stat) if stat.is_dir() => {
                ctx.cwd = target;
                ExecResult::success("")
            }
            Ok(_) => ShellError::NotADirectory(target).into_exec("cd"),
            Err(e) => e.into_exec("cd"),
        }
    }
}
