//! Built-in tools for vsh.
//!
//! These tools are always available. Each one declares its preconditions in
//! its schema and leaves checking them to the validator.

mod cat;
mod cd;
mod chmod;
mod du;
mod echo;
mod env;
mod export;
mod grep;
mod head;
mod id;
mod jobs;
mod kill;
mod ls;
mod mkdir;
mod mv;
mod pwd;
mod rm;
mod sleep;
mod stat;
mod touch;
mod true_false;
mod wait;
mod wc;
mod write;

use vsh_types::ExecResult;

use super::{ExecContext, ToolRegistry};

/// Register all built-in tools with the registry.
pub fn register_builtins(registry: &mut ToolRegistry) {
    registry.register(cat::Cat);
    registry.register(cd::Cd);
    registry.register(chmod::Chmod);
    registry.register(chmod::Chown);
    registry.register(chmod::Chgrp);
    registry.register(du::Du);
    registry.register(echo::Echo);
    registry.register(env::Env);
    registry.register(export::Export);
    registry.register(grep::Grep);
    registry.register(head::Head);
    registry.register(id::Whoami);
    registry.register(id::Id);
    registry.register(jobs::Jobs);
    registry.register(kill::Kill);
    registry.register(ls::Ls);
    registry.register(mkdir::Mkdir);
    registry.register(mv::Mv);
    registry.register(pwd::Pwd);
    registry.register(rm::Rm);
    registry.register(sleep::Sleep);
    registry.register(stat::Stat);
    registry.register(touch::Touch);
    registry.register(true_false::True);
    registry.register(true_false::False);
    registry.register(wait::Wait);
    registry.register(wc::Wc);
    registry.register(write::Write);
}

/// One input to a filter command: a file's text, or stdin.
pub(crate) struct Input {
    /// File argument, `None` for stdin.
    pub name: Option<String>,
    pub text: String,
}

/// Read each named file, or stdin when no files are named.
///
/// Fails on the first unreadable file with the command's error result.
pub(crate) fn read_inputs(
    command: &str,
    files: &[String],
    ctx: &mut ExecContext,
) -> Result<Vec<Input>, ExecResult> {
    if files.is_empty() {
        return Ok(vec![Input {
            name: None,
            text: ctx.take_stdin().unwrap_or_default(),
        }]);
    }

    files
        .iter()
        .map(|file| {
            let path = ctx.resolve_path(file);
            ctx.fs
                .read_file(&path, &ctx.identity)
                .map(|bytes| Input {
                    name: Some(file.clone()),
                    text: String::from_utf8_lossy(&bytes).into_owned(),
                })
                .map_err(|e| e.into_exec(command))
        })
        .collect()
}

/// Parse a job reference: `%3` or `3`.
pub(crate) fn parse_job_id(spec: &str) -> Option<vsh_types::JobId> {
    spec.strip_prefix('%')
        .unwrap_or(spec)
        .parse()
        .ok()
        .map(vsh_types::JobId)
}
