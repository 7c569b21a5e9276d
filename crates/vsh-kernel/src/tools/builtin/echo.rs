//! echo — Print arguments to stdout.

use async_trait::async_trait;
use vsh_types::{ExecResult, FlagDef, ToolArgs, ToolSchema};

use crate::tools::{ExecContext, Tool};

/// Echo tool: prints arguments to stdout.
pub struct Echo;

#[async_trait]
impl Tool for Echo {
    fn name(&self) -> &str {
        "echo"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("echo", "Print arguments to standard output")
            .flag(FlagDef::switch("no-newline", "Do not output the trailing newline").with_aliases(["n"]))
            .example("Print a greeting", "echo hello $USER")
    }

    async fn execute(&self, args: ToolArgs, _ctx: &mut ExecContext) -> ExecResult {
        let mut output = args.positional.join(" ");
        if !args.has_flag("no-newline") {
            output.push('\n');
        }
        ExecResult::success(output)
    }
}
