//! mkdir — Create directories.

use async_trait::async_trait;
use vsh_types::{
    Access, ArgConstraint, ArgSelector, ExecResult, FlagDef, PathRequirement,
    PermissionRequirement, PermissionTarget, ToolArgs, ToolSchema,
};

use crate::tools::{ExecContext, Tool};

/// Mkdir tool: create directories.
pub struct Mkdir;

#[async_trait]
impl Tool for Mkdir {
    fn name(&self) -> &str {
        "mkdir"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("mkdir", "Create directories")
            .args(ArgConstraint::at_least(1))
            .flag(FlagDef::switch("parents", "Create missing parents; no error if existing").with_aliases(["p"]))
            .path(PathRequirement::absent(ArgSelector::From(0)).unless("parents"))
            .path(PathRequirement::parent_exists(ArgSelector::From(0)).unless("parents"))
            .permission(PermissionRequirement::new(
                ArgSelector::From(0),
                Access::Write,
                PermissionTarget::Parent,
            ))
            .example("Create a directory", "mkdir projects")
            .example("Create nested directories", "mkdir -p a/b/c")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let parents = args.has_flag("parents");
        for dir in &args.positional {
            let path = ctx.entry_path(dir);
            if let Err(e) = ctx.fs.create_directory(&path, &ctx.identity, parents) {
                return e.into_exec("mkdir");
            }
        }
        ExecResult::success("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::testing::{alice, args, make_ctx, with_flags};
    use vsh_types::ErrorKind;

    #[tokio::test]
    async fn test_mkdir_simple() {
        let mut ctx = make_ctx(alice());
        let result = Mkdir.execute(args(&["newdir"]), &mut ctx).await;
        assert!(result.ok());
        let stat = ctx.fs.stat("/home/alice/newdir").unwrap();
        assert!(stat.is_dir());
        assert_eq!(stat.owner, "alice");
    }

    #[tokio::test]
    async fn test_mkdir_nested_needs_parents() {
        let mut ctx = make_ctx(alice());
        let result = Mkdir.execute(args(&["a/b/c"]), &mut ctx).await;
        assert_eq!(result.kind, Some(ErrorKind::NotFound));

        let result = Mkdir.execute(with_flags(&["a/b/c"], &["parents"]), &mut ctx).await;
        assert!(result.ok());
        assert!(ctx.fs.stat("/home/alice/a/b/c").unwrap().is_dir());

        let again = Mkdir.execute(with_flags(&["a/b/c"], &["parents"]), &mut ctx).await;
        assert!(again.ok());
    }

    #[tokio::test]
    async fn test_mkdir_rejects_dot_names() {
        let mut ctx = make_ctx(alice());
        let result = Mkdir.execute(args(&[".."]), &mut ctx).await;
        assert_eq!(result.kind, Some(ErrorKind::InvalidOperation));
    }

    #[tokio::test]
    async fn test_mkdir_existing() {
        let mut ctx = make_ctx(alice());
        let result = Mkdir.execute(args(&["/home/alice"]), &mut ctx).await;
        assert_eq!(result.kind, Some(ErrorKind::AlreadyExists));
    }
}
