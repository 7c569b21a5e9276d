//! du — Report directory sizes.
//!
//! Sizes follow the store's per-level rule: a directory's figure is the sum
//! of its own files' payloads. Subdirectories get their own lines instead of
//! adding into their parent.

use async_trait::async_trait;
use vsh_types::{Access, ArgSelector, ErrorKind, ExecResult, FlagDef, PathRequirement, ToolArgs, ToolSchema};

use crate::identity::Identity;
use crate::tools::{ExecContext, Tool};
use crate::vfs::{path, Node};

/// Du tool: per-level size of each directory.
pub struct Du;

#[async_trait]
impl Tool for Du {
    fn name(&self) -> &str {
        "du"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("du", "Report per-directory sizes")
            .flag(FlagDef::switch("summarize", "Only report each argument").with_aliases(["s"]))
            .path(PathRequirement::exists(ArgSelector::From(0)))
            .example("Sizes below the current directory", "du")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let summarize = args.has_flag("summarize");
        let targets = if args.positional.is_empty() {
            vec![".".to_string()]
        } else {
            args.positional.clone()
        };

        let mut out = String::new();
        let mut denied = Vec::new();
        for target in &targets {
            let node = match ctx.fs.get_node(&ctx.resolve_path(target)) {
                Ok(node) => node,
                Err(e) => return e.into_exec("du"),
            };
            if summarize {
                out.push_str(&format!("{}\t{}\n", node.size(), target));
            } else {
                walk(&node, target, &ctx.identity, &mut out, &mut denied);
            }
        }

        if denied.is_empty() {
            ExecResult::success(out)
        } else {
            let mut result = ExecResult::error(
                ErrorKind::PermissionError,
                denied
                    .iter()
                    .map(|p| format!("du: {}: permission denied", p))
                    .collect::<Vec<_>>()
                    .join("\n"),
            );
            result.out = out;
            result
        }
    }
}

/// Post-order: subdirectories are reported before their parent.
fn walk(node: &Node, display: &str, identity: &Identity, out: &mut String, denied: &mut Vec<String>) {
    if node.is_dir() {
        if node.has_permission(identity, Access::Read) {
            for (name, child) in node.children.iter().filter(|(_, c)| c.is_dir()) {
                walk(child, &path::join(display, name), identity, out, denied);
            }
        } else {
            denied.push(display.to_string());
        }
    }
    out.push_str(&format!("{}\t{}\n", node.size(), display));
}
