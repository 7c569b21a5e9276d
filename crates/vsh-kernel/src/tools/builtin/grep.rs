//! grep — Search for patterns in text.

use async_trait::async_trait;
use regex::RegexBuilder;
use vsh_types::{
    Access, ArgConstraint, ArgSelector, ExecResult, FlagDef, NodeKind, PathRequirement,
    PermissionRequirement, PermissionTarget, ToolArgs, ToolSchema,
};

use super::read_inputs;
use crate::tools::{ExecContext, Tool};

/// Grep tool: print lines matching a regular expression.
pub struct Grep;

#[async_trait]
impl Tool for Grep {
    fn name(&self) -> &str {
        "grep"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("grep", "Print lines matching a pattern")
            .args(ArgConstraint::at_least(1))
            .flag(FlagDef::switch("ignore-case", "Case-insensitive matching").with_aliases(["i"]))
            .flag(FlagDef::switch("invert-match", "Select non-matching lines").with_aliases(["v"]))
            .flag(FlagDef::switch("line-number", "Prefix lines with their number").with_aliases(["n"]))
            .flag(FlagDef::switch("count", "Print only a count of matching lines").with_aliases(["c"]))
            .path(PathRequirement::exists(ArgSelector::From(1)).of_kind(NodeKind::File))
            .permission(PermissionRequirement::new(
                ArgSelector::From(1),
                Access::Read,
                PermissionTarget::Node,
            ))
            .example("Find errors in a log", "grep -i error app.log")
            .example("Filter piped output", "ls | grep txt")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some(pattern) = args.get_positional(0) else {
            return ExecResult::failure(2, "grep: missing pattern argument");
        };
        let regex = match RegexBuilder::new(pattern)
            .case_insensitive(args.has_flag("ignore-case"))
            .build()
        {
            Ok(r) => r,
            Err(e) => return ExecResult::failure(2, format!("grep: invalid pattern: {}", e)),
        };

        let inputs = match read_inputs("grep", &args.positional[1..], ctx) {
            Ok(inputs) => inputs,
            Err(result) => return result,
        };
        let invert = args.has_flag("invert-match");
        let numbered = args.has_flag("line-number");
        let prefix_names = inputs.len() > 1;

        let mut out = String::new();
        let mut matches = 0;
        for input in &inputs {
            let mut count = 0;
            for (i, line) in input.text.lines().enumerate() {
                if regex.is_match(line) == invert {
                    continue;
                }
                count += 1;
                if args.has_flag("count") {
                    continue;
                }
                if let (true, Some(name)) = (prefix_names, &input.name) {
                    out.push_str(&format!("{}:", name));
                }
                if numbered {
                    out.push_str(&format!("{}:", i + 1));
                }
                out.push_str(line);
                out.push('\n');
            }
            if args.has_flag("count") {
                match (&input.name, prefix_names) {
                    (Some(name), true) => out.push_str(&format!("{}:{}\n", name, count)),
                    _ => out.push_str(&format!("{}\n", count)),
                }
            }
            matches += count;
        }

        // Exit status 1 means nothing matched.
        if matches == 0 {
            let mut result = ExecResult::failure(1, "");
            result.out = out;
            return result;
        }
        ExecResult::success(out)
    }
}
