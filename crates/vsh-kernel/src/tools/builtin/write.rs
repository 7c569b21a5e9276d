//! write — Write text to a file.

use async_trait::async_trait;
use vsh_types::{
    Access, ArgConstraint, ArgSelector, ExecResult, FlagDef, NodeKind, PathRequirement,
    PermissionRequirement, PermissionTarget, ToolArgs, ToolSchema,
};

use crate::tools::{ExecContext, Tool};
use crate::vfs::WriteMode;

/// Write tool: write arguments (or stdin) to a file.
pub struct Write;

#[async_trait]
impl Tool for Write {
    fn name(&self) -> &str {
        "write"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("write", "Write text to a file")
            .args(ArgConstraint::at_least(1))
            .flag(FlagDef::switch("append", "Append instead of overwriting").with_aliases(["a"]))
            .path(PathRequirement::parent_exists(ArgSelector::Index(0)).of_kind(NodeKind::File))
            .permission(PermissionRequirement::new(
                ArgSelector::Index(0),
                Access::Write,
                PermissionTarget::NodeOrParent,
            ))
            .example("Write a line", "write notes.txt remember the milk")
            .example("Save piped output", "ls | write listing.txt")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some(file) = args.get_positional(0) else {
            return ExecResult::failure(1, "write: missing path argument");
        };

        let content = if args.positional.len() > 1 {
            format!("{}\n", args.positional[1..].join(" "))
        } else {
            ctx.take_stdin().unwrap_or_default()
        };
        let mode = if args.has_flag("append") {
            WriteMode::Append
        } else {
            WriteMode::Truncate
        };

        let path = ctx.entry_path(file);
        match ctx.fs.write_file(&path, content.as_bytes(), mode, &ctx.identity) {
            Ok(()) => ExecResult::success(""),
            Err(e) => e.into_exec("write"),
        }
    }
}
