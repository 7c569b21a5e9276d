//! export — Set session variables.
//!
//! ```text
//! export NAME=value     # set
//! export A=1 B=2        # several at once
//! export NAME           # define as empty if unset
//! ```

use async_trait::async_trait;
use vsh_types::{ExecResult, ToolArgs, ToolSchema};

use crate::env::is_valid_name;
use crate::error::ShellError;
use crate::tools::{ExecContext, Tool};

/// Export tool: set variables visible to later commands in the session.
pub struct Export;

#[async_trait]
impl Tool for Export {
    fn name(&self) -> &str {
        "export"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("export", "Set session variables")
            .example("Set a variable", "export EDITOR=vi")
            .example("Use it later on the same line", "export N=3; echo $N")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        if args.positional.is_empty() {
            return ExecResult::success(super::env::render(&ctx.env.snapshot()));
        }

        // Check everything before setting anything.
        let mut assignments = Vec::new();
        for arg in &args.positional {
            let (name, value) = match arg.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (arg.as_str(), None),
            };
            if !is_valid_name(name) {
                return ShellError::Validation(format!("'{}': not a valid identifier", name)).into_exec("export");
            }
            assignments.push((name, value));
        }

        for (name, value) in assignments {
            match value {
                Some(value) => ctx.env.set(name, value),
                None if ctx.env.get(name).is_none() => ctx.env.set(name, ""),
                None => {}
            }
        }
        ExecResult::success("")
    }
}
