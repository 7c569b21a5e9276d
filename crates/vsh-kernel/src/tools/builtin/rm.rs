//! rm — Remove files and directories.

use async_trait::async_trait;
use vsh_types::{
    Access, ArgConstraint, ArgSelector, ExecResult, FlagDef, PathRequirement,
    PermissionRequirement, PermissionTarget, ToolArgs, ToolSchema,
};

use crate::error::ShellError;
use crate::tools::{ExecContext, Tool};

/// Rm tool: remove files and directory trees.
pub struct Rm;

#[async_trait]
impl Tool for Rm {
    fn name(&self) -> &str {
        "rm"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("rm", "Remove files or directories")
            .args(ArgConstraint::at_least(1))
            .flag(FlagDef::switch("recursive", "Remove directories and their contents").with_aliases(["r", "R"]))
            .flag(FlagDef::switch("force", "Ignore missing files, never ask").with_aliases(["f"]))
            .path(PathRequirement::exists(ArgSelector::From(0)).unless("force"))
            .permission(PermissionRequirement::new(
                ArgSelector::From(0),
                Access::Write,
                PermissionTarget::Parent,
            ))
            .example("Remove a file", "rm notes.txt")
            .example("Remove a directory tree", "rm -rf build")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let recursive = args.has_flag("recursive");
        let force = args.has_flag("force");
        let mut deleted = 0;
        let mut errors = Vec::new();

        for target in &args.positional {
            let path = ctx.entry_path(target);
            let stat = match ctx.fs.stat(&path) {
                Ok(stat) => stat,
                Err(_) if force => continue,
                Err(e) => return e.into_exec("rm"),
            };
            if stat.is_dir() && !recursive {
                return ShellError::IsADirectory(stat.path).into_exec("rm");
            }

            let report = match ctx.fs.delete_recursive(&path, &ctx.identity, force || ctx.assume_yes()) {
                Ok(report) => report,
                Err(e) => return e.into_exec("rm"),
            };
            deleted += report.deleted_count;
            errors.extend(report.errors);
        }

        tracing::debug!(deleted, failed = errors.len(), "rm");
        match errors.first() {
            None => ExecResult::success(""),
            Some(first) => {
                let message = errors
                    .iter()
                    .map(|e| format!("rm: {}", e))
                    .collect::<Vec<_>>()
                    .join("\n");
                let kind = first.kind();
                ExecResult::error(kind, message)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::testing::{alice, args, make_ctx, with_flags};
    use crate::tools::ConfirmPolicy;
    use vsh_types::ErrorKind;
    use crate::vfs::Mode;

    fn needs_confirmation(result: &ExecResult) -> bool {
        result.kind == Some(ErrorKind::ConfirmationRequired)
    }

    fn tree(ctx: &ExecContext) {
        let me = alice();
        ctx.fs.create_directory("/home/alice/d/e", &me, true).unwrap();
        ctx.fs.create_file("/home/alice/d/e/f", b"x".to_vec(), &me, false).unwrap();
        ctx.fs.create_file("/home/alice/g", Vec::new(), &me, false).unwrap();
    }

    #[tokio::test]
    async fn test_rm_file() {
        let mut ctx = make_ctx(alice());
        tree(&ctx);
        assert!(Rm.execute(args(&["g"]), &mut ctx).await.ok());
        assert!(!ctx.fs.exists("/home/alice/g"));
    }

    #[tokio::test]
    async fn test_rm_directory_needs_recursive() {
        let mut ctx = make_ctx(alice());
        tree(&ctx);
        let result = Rm.execute(args(&["d"]), &mut ctx).await;
        assert_eq!(result.kind, Some(ErrorKind::InvalidOperation));
        assert_eq!(result.err, "rm: /home/alice/d: is a directory");
    }

    #[tokio::test]
    async fn test_rm_recursive_asks_for_confirmation() {
        let mut ctx = make_ctx(alice());
        tree(&ctx);
        let result = Rm.execute(with_flags(&["d"], &["recursive"]), &mut ctx).await;
        assert!(needs_confirmation(&result));
        assert!(ctx.fs.exists("/home/alice/d/e/f"));

        ctx.confirm = ConfirmPolicy::AssumeYes;
        assert!(Rm.execute(with_flags(&["d"], &["recursive"]), &mut ctx).await.ok());
        assert!(!ctx.fs.exists("/home/alice/d"));
    }

    #[tokio::test]
    async fn test_rm_background_never_assumes_yes() {
        let mut ctx = make_ctx(alice());
        tree(&ctx);
        ctx.confirm = ConfirmPolicy::AssumeYes;
        ctx.background = true;
        let result = Rm.execute(with_flags(&["d"], &["recursive"]), &mut ctx).await;
        assert!(needs_confirmation(&result));
    }

    #[tokio::test]
    async fn test_rm_force_ignores_missing() {
        let mut ctx = make_ctx(alice());
        tree(&ctx);
        let result = Rm.execute(with_flags(&["nope", "d"], &["recursive", "force"]), &mut ctx).await;
        assert!(result.ok());
        assert!(!ctx.fs.exists("/home/alice/d"));
    }

    #[tokio::test]
    async fn test_rm_reports_protected_entries() {
        let mut ctx = make_ctx(alice());
        tree(&ctx);
        ctx.fs.set_mode("/home/alice/d/e", Mode::new(0o555), &alice()).unwrap();
        let result = Rm.execute(with_flags(&["d"], &["recursive", "force"]), &mut ctx).await;
        assert_eq!(result.kind, Some(ErrorKind::PermissionError));
        assert_eq!(result.err, "rm: /home/alice/d/e/f: permission denied");
        assert!(ctx.fs.exists("/home/alice/d/e/f"));
    }
}
