//! head — Output the first lines of input.

use async_trait::async_trait;
use vsh_types::{
    Access, ArgSelector, ExecResult, FlagDef, NodeKind, PathRequirement, PermissionRequirement,
    PermissionTarget, ToolArgs, ToolSchema,
};

use super::read_inputs;
use crate::tools::{ExecContext, Tool};

const DEFAULT_LINES: usize = 10;

/// Head tool: print the first N lines of files or stdin.
pub struct Head;

#[async_trait]
impl Tool for Head {
    fn name(&self) -> &str {
        "head"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("head", "Output the first part of files")
            .flag(FlagDef::value("lines", "Number of lines (default 10)").with_aliases(["n"]))
            .path(PathRequirement::exists(ArgSelector::From(0)).of_kind(NodeKind::File))
            .permission(PermissionRequirement::new(
                ArgSelector::From(0),
                Access::Read,
                PermissionTarget::Node,
            ))
            .example("First three lines", "head -n 3 notes.txt")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let count = match args.get_named("lines").map(str::parse::<usize>) {
            None => DEFAULT_LINES,
            Some(Ok(n)) => n,
            Some(Err(_)) => {
                return ExecResult::failure(
                    1,
                    format!("head: invalid number of lines: '{}'", args.get_named("lines").unwrap_or_default()),
                )
            }
        };

        let inputs = match read_inputs("head", &args.positional, ctx) {
            Ok(inputs) => inputs,
            Err(result) => return result,
        };
        let headers = inputs.len() > 1;

        let mut sections = Vec::new();
        for input in inputs {
            let mut text = String::new();
            if let (true, Some(name)) = (headers, &input.name) {
                text.push_str(&format!("==> {} <==\n", name));
            }
            for line in input.text.lines().take(count) {
                text.push_str(line);
                text.push('\n');
            }
            sections.push(text);
        }
        ExecResult::success(sections.join("\n"))
    }
}
