//! touch — Create empty files or update timestamps.

use async_trait::async_trait;
use vsh_types::{
    Access, ArgConstraint, ArgSelector, ExecResult, PathRequirement, PermissionRequirement,
    PermissionTarget, ToolArgs, ToolSchema,
};

use crate::tools::{ExecContext, Tool};
use crate::vfs::WriteMode;

/// Touch tool: create a file if missing, otherwise bump its mtime.
pub struct Touch;

#[async_trait]
impl Tool for Touch {
    fn name(&self) -> &str {
        "touch"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("touch", "Create empty files or update modification times")
            .args(ArgConstraint::at_least(1))
            .path(PathRequirement::parent_exists(ArgSelector::From(0)))
            .permission(PermissionRequirement::new(
                ArgSelector::From(0),
                Access::Write,
                PermissionTarget::NodeOrParent,
            ))
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        for file in &args.positional {
            let path = ctx.entry_path(file);
            // Directories keep their mtime; only files are touched.
            if ctx.fs.stat(&path).is_ok_and(|s| s.is_dir()) {
                continue;
            }
            if let Err(e) = ctx.fs.write_file(&path, &[], WriteMode::Append, &ctx.identity) {
                return e.into_exec("touch");
            }
        }
        ExecResult::success("")
    }
}
