//! vsh CLI entry point.
//!
//! Usage:
//!   vsh                        # Interactive REPL
//!   vsh -c <command>           # Execute command and exit
//!   vsh --user alice -c 'id'   # Run as another user
//!   vsh --state <file>         # Keep the filesystem in <file>

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use vsh_repl::ReplOptions;

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

/// What to do once options are parsed.
enum Mode {
    Repl,
    Command(String),
    Help,
    Version,
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().skip(1).collect();
    let mut options = ReplOptions::from_env();
    let mode = parse_args(&args, &mut options)?;

    match mode {
        Mode::Help => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }
        Mode::Version => {
            println!(
                "vsh {} ({} {})",
                env!("CARGO_PKG_VERSION"),
                env!("VSH_GIT_HASH"),
                env!("VSH_BUILD_DATE")
            );
            Ok(ExitCode::SUCCESS)
        }
        Mode::Command(line) => {
            let ok = vsh_repl::run_command(&options, &line)?;
            Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Mode::Repl => {
            vsh_repl::run(&options)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn parse_args(args: &[String], options: &mut ReplOptions) -> Result<Mode> {
    let mut mode = Mode::Repl;
    let mut iter = args.iter();

    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Mode::Help),
            "--version" | "-V" => return Ok(Mode::Version),
            "-y" | "--yes" => options.assume_yes = true,
            "--no-state" => options.state = None,
            "-c" => {
                let line = iter.next().context("-c requires a command argument")?;
                mode = Mode::Command(line.clone());
            }
            "--user" => {
                options.user = iter.next().context("--user requires a name")?.clone();
            }
            "--groups" => {
                let list = iter.next().context("--groups requires a list")?;
                options.groups = vsh_repl::parse_groups(list);
            }
            "--state" => {
                let path = iter.next().context("--state requires a path")?;
                options.state = Some(PathBuf::from(path));
            }
            other => {
                if let Some(user) = other.strip_prefix("--user=") {
                    options.user = user.to_string();
                } else if let Some(path) = other.strip_prefix("--state=") {
                    options.state = Some(PathBuf::from(path));
                } else {
                    bail!("Unknown option: {other}\nRun 'vsh --help' for usage.");
                }
            }
        }
    }

    Ok(mode)
}

fn print_help() {
    println!(
        r#"vsh v{}

Usage:
  vsh                          Interactive REPL
  vsh -c <command>             Execute command and exit

Options:
  -c <command>                 Execute command string and exit
  --user <name>                Run as <name> (default: $VSH_USER or "user")
  --groups <a,b>               Group list (default: $VSH_GROUPS or the user's own group)
  --state <file>               Snapshot file (default: $VSH_STATE or the data directory)
  --no-state                   Keep the filesystem in memory only
  -y, --yes                    Answer yes to confirmation requests
  -h, --help                   Show this help
  -V, --version                Show version

Examples:
  vsh                          # Start interactive REPL
  vsh -c 'echo hello'          # Run a command
  vsh --user root -c 'ls -l /' # Look around as the superuser
"#,
        env!("CARGO_PKG_VERSION")
    );
}
