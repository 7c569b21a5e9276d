//! Pipeline execution for vsh.
//!
//! Stages run strictly one after another: stage *i + 1* starts only after
//! stage *i* has returned, and receives exactly its stdout. Every stage and
//! both redirections are validated before the first stage runs. Once
//! stages start running, a failure stops the pipeline but does not undo
//! what earlier stages already did.

use std::sync::Arc;

use vsh_types::{Access, ErrorKind, ExecResult, PipelineResult, ToolArgs};

use crate::ast::{Pipeline, RedirectKind};
use crate::error::ShellError;
use crate::tools::{ExecContext, Tool, ToolRegistry};
use crate::validator::validate;
use crate::vfs::path::split_parent;
use crate::vfs::WriteMode;

/// A validated stage, ready to run.
struct Stage {
    name: String,
    tool: Arc<dyn Tool>,
    args: ToolArgs,
}

/// Runs expanded pipelines against a tool registry.
pub struct PipelineRunner {
    tools: Arc<ToolRegistry>,
}

impl PipelineRunner {
    /// Create a new pipeline runner with the given tool registry.
    pub fn new(tools: Arc<ToolRegistry>) -> Self {
        Self { tools }
    }

    /// Check a pipeline without running it.
    ///
    /// Returns the first failing stage's error result.
    pub fn check(&self, pipeline: &Pipeline<String>, ctx: &ExecContext) -> Result<(), ExecResult> {
        self.prepare(pipeline, ctx).map(|_| ())
    }

    /// Execute a pipeline.
    ///
    /// Each command's stdout becomes the next command's stdin. The result
    /// carries the final stdout unless it was redirected into a file.
    #[tracing::instrument(level = "debug", skip(self, pipeline, ctx), fields(commands = pipeline.commands.len(), text = %pipeline.text))]
    pub async fn run(&self, pipeline: &Pipeline<String>, ctx: &mut ExecContext) -> PipelineResult {
        let stages = match self.prepare(pipeline, ctx) {
            Ok(stages) => stages,
            Err(result) => return PipelineResult::from_exec(result, &ctx.cwd),
        };
        let first = stages.first().map(|s| s.name.clone()).unwrap_or_default();
        let last = stages.last().map(|s| s.name.clone()).unwrap_or_default();

        let mut stdin = match pipeline.input() {
            Some(source) => {
                let path = ctx.resolve_path(source);
                match ctx.fs.read_file(&path, &ctx.identity) {
                    Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                    Err(e) => return PipelineResult::from_exec(e.into_exec(&first), &ctx.cwd),
                }
            }
            None => None,
        };

        for stage in stages {
            if ctx.is_cancelled() {
                tracing::debug!(command = %stage.name, "pipeline cancelled before stage");
                return PipelineResult::failed(ErrorKind::Cancelled, "cancelled", &ctx.cwd);
            }
            ctx.stdin = stdin.take();
            let result = stage.tool.execute(stage.args, ctx).await;
            if !result.ok() {
                tracing::debug!(command = %stage.name, code = result.code, "stage failed");
                return PipelineResult::from_exec(result, &ctx.cwd);
            }
            stdin = Some(result.out);
        }
        ctx.stdin = None;

        let out = stdin.unwrap_or_default();
        match pipeline.output() {
            Some(redirect) => {
                let mode = match redirect.kind {
                    RedirectKind::Append => WriteMode::Append,
                    _ => WriteMode::Truncate,
                };
                let path = ctx.entry_path(&redirect.target);
                match ctx.fs.write_file(&path, out.as_bytes(), mode, &ctx.identity) {
                    Ok(()) => PipelineResult::ok("", &ctx.cwd),
                    Err(e) => PipelineResult::from_exec(e.into_exec(&last), &ctx.cwd),
                }
            }
            None => PipelineResult::ok(out, &ctx.cwd),
        }
    }

    /// Look up and validate every stage, then the redirections.
    fn prepare(&self, pipeline: &Pipeline<String>, ctx: &ExecContext) -> Result<Vec<Stage>, ExecResult> {
        let mut stages = Vec::with_capacity(pipeline.commands.len());
        for command in &pipeline.commands {
            let name = command.name.clone();
            let Some(tool) = self.tools.lookup(&name) else {
                return Err(ShellError::Validation("command not found".into()).into_exec(&name));
            };
            let args = validate(&tool.schema(), &command.args, ctx).map_err(|e| e.into_exec(&name))?;
            stages.push(Stage { name, tool, args });
        }

        if let (Some(source), Some(stage)) = (pipeline.input(), stages.first()) {
            check_input(source, ctx).map_err(|e| e.into_exec(&stage.name))?;
        }
        if let (Some(redirect), Some(stage)) = (pipeline.output(), stages.last()) {
            check_output(&redirect.target, ctx).map_err(|e| e.into_exec(&stage.name))?;
        }
        Ok(stages)
    }
}

/// A `<` source must be a readable file.
fn check_input(source: &str, ctx: &ExecContext) -> Result<(), ShellError> {
    let path = ctx.resolve_path(source);
    let stat = ctx.fs.stat(&path).map_err(|_| ShellError::NotFound(path.clone()))?;
    if stat.is_dir() {
        return Err(ShellError::IsADirectory(path));
    }
    if !stat.has_permission(&ctx.identity, Access::Read) {
        return Err(ShellError::Permission(path));
    }
    Ok(())
}

/// A `>`/`>>` target must be a writable file, or creatable in an existing
/// directory.
fn check_output(target: &str, ctx: &ExecContext) -> Result<(), ShellError> {
    let path = ctx.resolve_path(target);
    if let Ok(stat) = ctx.fs.stat(&path) {
        if stat.is_dir() {
            return Err(ShellError::IsADirectory(path));
        }
        if !stat.has_permission(&ctx.identity, Access::Write) {
            return Err(ShellError::Permission(path));
        }
        return Ok(());
    }

    let Some((parent, _)) = split_parent(&path) else {
        return Err(ShellError::IsADirectory(path));
    };
    match ctx.fs.stat(&parent) {
        Ok(dir) if !dir.is_dir() => Err(ShellError::NotADirectory(parent)),
        Ok(dir) if !dir.has_permission(&ctx.identity, Access::Write) => Err(ShellError::Permission(path)),
        Ok(_) => Ok(()),
        Err(_) => Err(ShellError::ParentMissing(path)),
    }
}
