//! stat — Display node metadata.

use async_trait::async_trait;
use vsh_types::{ArgConstraint, ArgSelector, ExecResult, PathRequirement, ToolArgs, ToolSchema};

use crate::tools::{ExecContext, Tool};
use crate::vfs::Stat as NodeStat;

/// Stat tool: show type, size, ownership, mode and mtime.
pub struct Stat;

#[async_trait]
impl Tool for Stat {
    fn name(&self) -> &str {
        "stat"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("stat", "Display file or directory metadata")
            .args(ArgConstraint::at_least(1))
            .path(PathRequirement::exists(ArgSelector::From(0)))
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let mut out = String::new();
        for file in &args.positional {
            match ctx.fs.stat(&ctx.resolve_path(file)) {
                Ok(stat) => out.push_str(&format_stat(&stat)),
                Err(e) => return e.into_exec("stat"),
            }
        }
        ExecResult::success(out)
    }
}

fn format_stat(stat: &NodeStat) -> String {
    format!(
        "  File: {}\n  Type: {}\n  Size: {}\n  Mode: ({}/{})\n Owner: {}\n Group: {}\nModify: {}\n",
        stat.path,
        stat.kind,
        stat.size,
        stat.mode.format_octal(),
        stat.format_mode(),
        stat.owner,
        stat.group,
        stat.mtime.format("%Y-%m-%d %H:%M:%S UTC"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::testing::{alice, args, make_ctx};

    #[tokio::test]
    async fn test_stat_file() {
        let mut ctx = make_ctx(alice());
        ctx.fs.create_file("/home/alice/f", b"abc".to_vec(), &alice(), false).unwrap();
        let result = Stat.execute(args(&["f"]), &mut ctx).await;
        assert!(result.ok());
        assert!(result.out.contains("  File: /home/alice/f\n"));
        assert!(result.out.contains("  Size: 3\n"));
        assert!(result.out.contains("  Mode: (0644/-rw-r--r--)\n"));
        assert!(result.out.contains(" Owner: alice\n"));
    }
}
