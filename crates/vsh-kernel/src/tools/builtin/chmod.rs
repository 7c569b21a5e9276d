//! chmod, chown, chgrp — Change permission bits and ownership.

use async_trait::async_trait;
use vsh_types::{ArgConstraint, ArgSelector, ExecResult, PathRequirement, ToolArgs, ToolSchema};

use crate::error::ShellResult;
use crate::tools::{ExecContext, Tool};
use crate::vfs::{Mode, Stat};

/// Parse a mode argument for one node.
///
/// Octal (`755`), a full rendering (`rwxr-x---`) or chmod clauses
/// (`u+x,go-w`), which are applied to the node's current mode.
fn parse_mode(spec: &str, current: &Stat) -> ShellResult<Mode> {
    if spec.bytes().all(|b| b.is_ascii_digit()) {
        return Mode::parse_octal(spec);
    }
    Mode::from_symbolic(spec).or_else(|_| current.mode.apply_symbolic(spec, current.kind))
}

/// Chmod tool: change permission bits.
pub struct Chmod;

#[async_trait]
impl Tool for Chmod {
    fn name(&self) -> &str {
        "chmod"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("chmod", "Change permission bits")
            .args(ArgConstraint::at_least(2))
            .path(PathRequirement::exists(ArgSelector::From(1)))
            .example("Owner-only file", "chmod 600 secrets.txt")
            .example("Make executable", "chmod u+x run.sh")
            .example("Shared scratch directory", "chmod 1777 /tmp")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some((spec, files)) = args.positional.split_first() else {
            return ExecResult::failure(1, "chmod: missing mode");
        };

        for file in files {
            let path = ctx.resolve_path(file);
            let result = ctx
                .fs
                .stat(&path)
                .and_then(|stat| parse_mode(spec, &stat))
                .and_then(|mode| ctx.fs.set_mode(&path, mode, &ctx.identity));
            if let Err(e) = result {
                return e.into_exec("chmod");
            }
        }
        ExecResult::success("")
    }
}

/// Chown tool: change owner, and optionally group with `owner:group`.
pub struct Chown;

#[async_trait]
impl Tool for Chown {
    fn name(&self) -> &str {
        "chown"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("chown", "Change file owner and group")
            .args(ArgConstraint::at_least(2))
            .path(PathRequirement::exists(ArgSelector::From(1)))
            .example("Give a home directory away", "chown bob:bob /home/bob")
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some((spec, files)) = args.positional.split_first() else {
            return ExecResult::failure(1, "chown: missing owner");
        };
        let (owner, group) = match spec.split_once(':') {
            Some((owner, group)) => (owner, Some(group)),
            None => (spec.as_str(), None),
        };

        for file in files {
            let path = ctx.resolve_path(file);
            let mut result = ctx.fs.set_owner(&path, owner, &ctx.identity);
            if let (Ok(()), Some(group)) = (&result, group) {
                result = ctx.fs.set_group(&path, group, &ctx.identity);
            }
            if let Err(e) = result {
                return e.into_exec("chown");
            }
        }
        ExecResult::success("")
    }
}

/// Chgrp tool: change group.
pub struct Chgrp;

#[async_trait]
impl Tool for Chgrp {
    fn name(&self) -> &str {
        "chgrp"
    }

    fn schema(&self) -> ToolSchema {
        ToolSchema::new("chgrp", "Change file group")
            .args(ArgConstraint::at_least(2))
            .path(PathRequirement::exists(ArgSelector::From(1)))
    }

    async fn execute(&self, args: ToolArgs, ctx: &mut ExecContext) -> ExecResult {
        let Some((group, files)) = args.positional.split_first() else {
            return ExecResult::failure(1, "chgrp: missing group");
        };
        for file in files {
            let path = ctx.resolve_path(file);
            if let Err(e) = ctx.fs.set_group(&path, group, &ctx.identity) {
                return e.into_exec("chgrp");
            }
        }
        ExecResult::success("")
    }
}
