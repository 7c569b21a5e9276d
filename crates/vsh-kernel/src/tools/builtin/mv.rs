//! mv — Move or rename files and directories.

use async_trait::async_trait;
use vsh_types::{
    Access, ArgConstraint, ArgSelector, ExecResult, PathRequirement, PermissionRequirement,
    PermissionTarget, ToolArgs, ToolSchema,
};

use crate::error::ShellError;
use crate::tools::{ExecContext, Tool};
use crate::vfs::path::{self, split_parent};

/// Mv tool: rename, or move entries into a directory.
pub struct Mv;

#[async_trait]
impl Tool for Mv {
    fn name(&self) -> &str {
        "mv"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("mv", "Move or rename files")
            .args(ArgConstraint::at_least(2))
            .path(PathRequirement::exists(ArgSelector::AllButLast))
            .path(PathRequirement::parent_exists(ArgSelector::Last))
            .permission(PermissionRequirement::new(
                ArgSelector::AllButLast,
                Access::Write,
                PermissionTarget::Parent,
            ))
            .example("Rename a file", "mv old.txt new.txt")
            .example("Move files into a directory", "mv a.txt b.txt archive/")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some((dest, sources)) = args.positional.split_last() else {
            return ExecResult::failure(1, "mv: missing destination");
        };

        let dest_path = ctx.entry_path(dest);
        let into_dir = ctx.fs.stat(&dest_path).is_ok_and(|s| s.is_dir());
        if sources.len() > 1 && !into_dir {
            return ShellError::NotADirectory(ctx.resolve_path(dest)).into_exec("mv");
        }

        let dest_dir = ctx.resolve_path(dest);
        for source in sources {
            let from = ctx.entry_path(source);
            let to = if into_dir {
                let resolved = ctx.resolve_path(source);
                let Some((_, name)) = split_parent(&resolved) else {
                    return ShellError::InvalidOperation("cannot move the root directory".into())
                        .into_exec("mv");
                };
                path::join(&dest_dir, name)
            } else {
                dest_path.clone()
            };
            if let Err(e) = ctx.fs.rename(&from, &to, &ctx.identity) {
                return e.into_exec("mv");
            }
        }
        ExecResult::success("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::testing::{alice, args, make_ctx};
    use vsh_types::ErrorKind;

    #[tokio::test]
    async fn test_mv_rename() {
        let mut ctx = make_ctx(alice());
        ctx.fs.create_file("/home/alice/a", b"1".to_vec(), &alice(), false).unwrap();
        assert!(Mv.execute(args(&["a", "b"]), &mut ctx).await.ok());
        assert!(!ctx.fs.exists("/home/alice/a"));
        assert_eq!(ctx.fs.read_file("/home/alice/b", &alice()).unwrap(), b"1");
    }

    #[tokio::test]
    async fn test_mv_into_directory() {
        let mut ctx = make_ctx(alice());
        ctx.fs.create_file("/home/alice/a", Vec::new(), &alice(), false).unwrap();
        ctx.fs.create_file("/home/alice/b", Vec::new(), &alice(), false).unwrap();
        ctx.fs.create_directory("/home/alice/dir", &alice(), false).unwrap();

        assert!(Mv.execute(args(&["a", "b", "dir/"]), &mut ctx).await.ok());
        assert!(ctx.fs.exists("/home/alice/dir/a"));
        assert!(ctx.fs.exists("/home/alice/dir/b"));
    }

    #[tokio::test]
    async fn test_mv_many_into_file_fails() {
        let mut ctx = make_ctx(alice());
        ctx.fs.create_file("/home/alice/a", Vec::new(), &alice(), false).unwrap();
        ctx.fs.create_file("/home/alice/b", Vec::new(), &alice(), false).unwrap();
        let result = Mv.execute(args(&["a", "b", "c"]), &mut ctx).await;
        assert_eq!(result.kind, Some(ErrorKind::NotADirectory));
    }

    #[tokio::test]
    async fn test_mv_directory_into_itself() {
        let mut ctx = make_ctx(alice());
        ctx.fs.create_directory("/home/alice/d/sub", &alice(), true).unwrap();
        let result = Mv.execute(args(&["d", "d/sub"]), &mut ctx).await;
        assert_eq!(result.kind, Some(ErrorKind::InvalidOperation));
        assert!(ctx.fs.exists("/home/alice/d/sub"));
    }
}
