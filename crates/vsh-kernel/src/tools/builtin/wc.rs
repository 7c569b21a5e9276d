//! wc — Count lines, words and bytes.

use async_trait::async_trait;
use vsh_types::{
    Access, ArgSelector, ExecResult, FlagDef, NodeKind, PathRequirement, PermissionRequirement,
    PermissionTarget, ToolArgs, ToolSchema,
};

use super::read_inputs;
use crate::tools::{ExecContext, Tool};

/// Wc tool: count lines, words and bytes of files or stdin.
pub struct Wc;

#[async_trait]
impl Tool for Wc {
    fn name(&self) -> &str {
        "wc"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("wc", "Count lines, words and bytes")
            .flag(FlagDef::switch("lines", "Print the line count").with_aliases(["l"]))
            .flag(FlagDef::switch("words", "Print the word count").with_aliases(["w"]))
            .flag(FlagDef::switch("bytes", "Print the byte count").with_aliases(["c"]))
            .path(PathRequirement::exists(ArgSelector::From(0)).of_kind(NodeKind::File))
            .permission(PermissionRequirement::new(
                ArgSelector::From(0),
                Access::Read,
                PermissionTarget::Node,
            ))
            .example("Count lines of output", "ls | wc -l")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let inputs = match read_inputs("wc", &args.positional, ctx) {
            Ok(inputs) => inputs,
            Err(result) => return result,
        };

        let any = ["lines", "words", "bytes"].iter().any(|f| args.has_flag(f));
        let show = |flag: &str| !any || args.has_flag(flag);

        let mut out = String::new();
        for input in inputs {
            let counts = [
                ("lines", input.text.lines().count()),
                ("words", input.text.split_whitespace().count()),
                ("bytes", input.text.len()),
            ];
            let mut fields: Vec<String> = counts
                .iter()
                .filter(|(flag, _)| show(flag))
                .map(|(_, n)| n.to_string())
                .collect();
            if let Some(name) = input.name {
                fields.push(name);
            }
            out.push_str(&fields.join(" "));
            out.push('\n');
        }
        ExecResult::success(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::builtin::testing::{alice, args, make_ctx, with_flags};

    #[tokio::test]
    async fn test_wc_stdin_all_counts() {
        let mut ctx = make_ctx(alice());
        ctx.set_stdin("one two\nthree\n".into());
        let result = Wc.execute(args(&[]), &mut ctx).await;
        assert_eq!(result.out, "2 3 14\n");
    }

    #[tokio::test]
    async fn test_wc_lines_of_file() {
        let mut ctx = make_ctx(alice());
        ctx.fs.create_file("/home/alice/f", b"a\nb\nc\n".to_vec(), &alice(), false).unwrap();
        let result = Wc.execute(with_flags(&["f"], &["lines"]), &mut ctx).await;
        assert_eq!(result.out, "3 f\n");
    }
}
