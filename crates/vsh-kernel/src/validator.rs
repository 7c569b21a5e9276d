//! Pre-execution validation of command invocations.
//!
//! The validator interprets a command's [`ToolSchema`] against its expanded
//! argument words: it splits flags from positionals, checks the argument
//! count, and then checks every declared path and permission requirement
//! against the current filesystem and identity. It only reads the store.
//!
//! A pipeline validates every stage before the first one runs, so any
//! error here means nothing in the pipeline has happened yet.

use vsh_types::{NodeKind, PathCheck, PermissionTarget, ToolArgs, ToolSchema};

use crate::error::{ShellError, ShellResult};
use crate::tools::ExecContext;
use crate::vfs::path::split_parent;

/// Validate `words` (the arguments after the command name) against `schema`.
pub fn validate(schema: &ToolSchema, words: &[String], ctx: &ExecContext) -> ShellResult<ToolArgs> {
    let args = parse_args(schema, words)?;
    check_arity(schema, &args)?;
    check_paths(schema, &args, ctx)?;
    check_permissions(schema, &args, ctx)?;
    Ok(args)
}

/// Split flags from positionals.
///
/// Accepts `--name`, `--name=value`, `--name value`, bundled short flags
/// (`-la`), `-n VALUE` and `-nVALUE`. A lone `-` and words like `-5` are
/// positionals. Everything after `--` is positional.
pub fn parse_args(schema: &ToolSchema, words: &[String]) -> ShellResult<ToolArgs> {
    let mut args = ToolArgs::new();
    let mut iter = words.iter();

    while let Some(word) = iter.next() {
        if word == "--" {
            args.positional.extend(iter.by_ref().cloned());
            break;
        }

        if let Some(long) = word.strip_prefix("--") {
            let (name, inline) = match long.split_once('=') {
                Some((name, value)) => (name, Some(value)),
                None => (long, None),
            };
            let flag = schema
                .find_flag(name)
                .ok_or_else(|| ShellError::Validation(format!("unknown option '--{}'", name)))?;
            match (flag.takes_value, inline) {
                (true, Some(value)) => {
                    args.named.insert(flag.name.clone(), value.to_string());
                }
                (true, None) => {
                    let value = iter.next().ok_or_else(|| {
                        ShellError::Validation(format!("option '--{}' requires a value", name))
                    })?;
                    args.named.insert(flag.name.clone(), value.clone());
                }
                (false, Some(_)) => {
                    return Err(ShellError::Validation(format!(
                        "option '--{}' does not take a value",
                        name
                    )));
                }
                (false, None) => {
                    args.flags.insert(flag.name.clone());
                }
            }
            continue;
        }

        let short = match word.strip_prefix('-') {
            Some(rest) if !rest.is_empty() && !rest.starts_with(|c: char| c.is_ascii_digit()) => rest,
            _ => {
                args.positional.push(word.clone());
                continue;
            }
        };

        for (i, c) in short.char_indices() {
            let spelling = c.to_string();
            let flag = schema
                .find_flag(&spelling)
                .ok_or_else(|| ShellError::Validation(format!("unknown option '-{}'", c)))?;
            if !flag.takes_value {
                args.flags.insert(flag.name.clone());
                continue;
            }
            let rest = &short[i + c.len_utf8()..];
            let value = if rest.is_empty() {
                iter.next().cloned().ok_or_else(|| {
                    ShellError::Validation(format!("option '-{}' requires a value", c))
                })?
            } else {
                rest.to_string()
            };
            args.named.insert(flag.name.clone(), value);
            break;
        }
    }

    Ok(args)
}

fn check_arity(schema: &ToolSchema, args: &ToolArgs) -> ShellResult<()> {
    let count = args.positional.len();
    let bounds = schema.args;

    if count < bounds.min {
        return Err(ShellError::Validation(if count == 0 {
            "missing operand".to_string()
        } else {
            format!(
                "expected at least {} {}, got {}",
                bounds.min,
                plural(bounds.min),
                count
            )
        }));
    }
    if let Some(max) = bounds.max {
        if count > max {
            return Err(ShellError::Validation(if max == 0 {
                "takes no arguments".to_string()
            } else {
                format!("too many arguments: expected at most {}, got {}", max, count)
            }));
        }
    }
    Ok(())
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        "argument"
    } else {
        "arguments"
    }
}

fn skipped(unless: Option<&String>, args: &ToolArgs) -> bool {
    unless.is_some_and(|flag| args.has_flag(flag))
}

fn check_paths(schema: &ToolSchema, args: &ToolArgs, ctx: &ExecContext) -> ShellResult<()> {
    for requirement in &schema.paths {
        if skipped(requirement.unless_flag.as_ref(), args) {
            continue;
        }
        for index in requirement.args.indices(args.positional.len()) {
            let path = ctx.resolve_path(&args.positional[index]);
            let stat = ctx.fs.stat(&path);

            match requirement.check {
                PathCheck::MustExist => {
                    let stat = stat.map_err(|_| ShellError::NotFound(path.clone()))?;
                    check_kind(requirement.kind, stat.kind, &path)?;
                }
                PathCheck::MustNotExist => {
                    if stat.is_ok() {
                        return Err(ShellError::AlreadyExists(path));
                    }
                }
                PathCheck::ParentMustExist => {
                    if let Ok(stat) = &stat {
                        check_kind(requirement.kind, stat.kind, &path)?;
                        continue;
                    }
                    let Some((parent, _)) = split_parent(&path) else {
                        continue;
                    };
                    match ctx.fs.stat(&parent) {
                        Ok(parent_stat) if parent_stat.is_dir() => {}
                        Ok(_) => return Err(ShellError::NotADirectory(parent)),
                        Err(_) => return Err(ShellError::ParentMissing(path)),
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_kind(expected: Option<NodeKind>, actual: NodeKind, path: &str) -> ShellResult<()> {
    match (expected, actual) {
        (Some(NodeKind::Directory), NodeKind::File) => Err(ShellError::NotADirectory(path.to_string())),
        (Some(NodeKind::File), NodeKind::Directory) => Err(ShellError::IsADirectory(path.to_string())),
        _ => Ok(()),
    }
}

fn check_permissions(schema: &ToolSchema, args: &ToolArgs, ctx: &ExecContext) -> ShellResult<()> {
    for requirement in &schema.permissions {
        for index in requirement.args.indices(args.positional.len()) {
            let path = ctx.resolve_path(&args.positional[index]);
            let node = ctx.fs.stat(&path).ok();
            let parent = || split_parent(&path).and_then(|(parent, _)| ctx.fs.stat(&parent).ok());

            let subject = match requirement.target {
                PermissionTarget::Node => node,
                PermissionTarget::Parent => parent(),
                PermissionTarget::NodeOrParent => node.or_else(parent),
            };
            // Missing nodes are the path checks' concern.
            if let Some(stat) = subject {
                if !stat.has_permission(&ctx.identity, requirement.access) {
                    return Err(ShellError::Permission(path));
                }
            }
        }
    }
    Ok(())
}
