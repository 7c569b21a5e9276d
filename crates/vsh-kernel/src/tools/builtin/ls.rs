//! ls — List directory contents.

use async_trait::async_trait;
use vsh_types::{ArgSelector, ExecResult, FlagDef, PathRequirement, ToolArgs, ToolSchema};

use crate::tools::{ExecContext, Tool};
use crate::vfs::Stat;

/// Ls tool: list directory contents.
pub struct Ls;

#[async_trait]
impl Tool for Ls {
    fn name(&self) -> &str {
        "ls"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("ls", "List directory contents")
            .flag(FlagDef::switch("long", "Use long listing format").with_aliases(["l"]))
            .flag(FlagDef::switch("all", "Show entries starting with '.'").with_aliases(["a"]))
            .path(PathRequirement::exists(ArgSelector::From(0)))
            .example("List the current directory", "ls")
            .example("Long listing", "ls -l /home")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let long = args.has_flag("long");
        let all = args.has_flag("all");
        let targets = if args.positional.is_empty() {
            vec![".".to_string()]
        } else {
            args.positional.clone()
        };

        let mut sections = Vec::new();
        for target in &targets {
            let path = ctx.resolve_path(target);
            let stat = match ctx.fs.stat(&path) {
                Ok(stat) => stat,
                Err(e) => return e.into_exec("ls"),
            };

            let entries = if stat.is_dir() {
                match ctx.fs.list_dir(&path, &ctx.identity) {
                    Ok(entries) => entries
                        .into_iter()
                        .filter(|e| all || !e.name.starts_with('.'))
                        .collect(),
                    Err(e) => return e.into_exec("ls"),
                }
            } else {
                vec![Stat {
                    name: target.clone(),
                    ..stat.clone()
                }]
            };

            let mut text = String::new();
            if targets.len() > 1 && stat.is_dir() {
                text.push_str(&format!("{}:\n", target));
            }
            for entry in &entries {
                if long {
                    text.push_str(&format_long(entry));
                } else {
                    text.push_str(&entry.name);
                }
                text.push('\n');
            }
            sections.push(text);
        }

        ExecResult::success(sections.join("\n"))
    }
}

fn format_long(entry: &Stat) -> String {
    format!(
        "{} {:<8} {:<8} {:>8} {} {}",
        entry.format_mode(),
        entry.owner,
        entry.group,
        entry.size,
        entry.mtime.format("%Y-%m-%d %H:%M"),
        entry.name
    )
}
