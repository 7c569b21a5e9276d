//! vsh REPL: interactive front end for the vsh kernel.
//!
//! It handles:
//! - Meta-commands: `/help`, `/quit`, `/jobs`, `/vars`, `/cwd`, `/tools`, `/save`
//! - Command execution via the Kernel, with Ctrl-C cancelling the running line
//! - Loading and saving the filesystem snapshot in a state file
//! - Command history via rustyline

pub mod format;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;
use tokio::runtime::Runtime;
use tokio_util::sync::CancellationToken;

use vsh_kernel::{
    ConfirmPolicy, FileStore, Identity, IdentityProvider, Kernel, KernelConfig, OutputSink,
    PipelineResult,
};

use crate::format::{format_jobs, TerminalSink};

/// What the caller should do after a line.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Keep reading, showing the text if any.
    Continue(Option<String>),
    /// Leave the REPL.
    Exit,
}

/// Settings collected from argv and the environment.
#[derive(Debug, Clone)]
pub struct ReplOptions {
    pub user: String,
    pub groups: Vec<String>,
    /// Snapshot file. `None` keeps the session in memory only.
    pub state: Option<PathBuf>,
    pub assume_yes: bool,
}

impl ReplOptions {
    /// Defaults from `VSH_USER`, `VSH_GROUPS` and `VSH_STATE`.
    ///
    /// Without `VSH_STATE` the snapshot lives in the platform data
    /// directory.
    pub fn from_env() -> Self {
        let user = std::env::var("VSH_USER").unwrap_or_else(|_| "user".to_string());
        let groups = std::env::var("VSH_GROUPS")
            .map(|g| parse_groups(&g))
            .unwrap_or_default();
        let state = std::env::var_os("VSH_STATE")
            .map(PathBuf::from)
            .or_else(|| data_dir().map(|d| d.join("state.json")));
        Self {
            user,
            groups,
            state,
            assume_yes: false,
        }
    }
}

/// Commands run as the configured user. With no groups listed, the user's
/// own group is the only one.
impl IdentityProvider for ReplOptions {
    fn current_user(&self) -> Identity {
        if self.groups.is_empty() {
            Identity::new(&self.user, [&self.user])
        } else {
            Identity::new(&self.user, &self.groups)
        }
    }
}

/// Split a comma-separated group list, dropping blanks.
pub fn parse_groups(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|g| !g.is_empty())
        .map(str::to_string)
        .collect()
}

fn data_dir() -> Option<PathBuf> {
    directories::BaseDirs::new().map(|b| b.data_dir().join("vsh"))
}

/// REPL state: one kernel plus the caller's identity and cwd.
pub struct Repl {
    kernel: Kernel,
    runtime: Runtime,
    identity: Identity,
    cwd: String,
    persistent: bool,
}

impl Repl {
    /// Create a REPL writing to the terminal.
    pub fn new(options: &ReplOptions) -> Result<Self> {
        Self::with_sink(options, Arc::new(TerminalSink::new()))
    }

    /// Create a REPL writing command output to `sink`.
    ///
    /// When a state file is configured and exists, the filesystem is
    /// restored from it.
    pub fn with_sink(options: &ReplOptions, sink: Arc<dyn OutputSink>) -> Result<Self> {
        let identity = options.current_user();
        let confirm = if options.assume_yes {
            ConfirmPolicy::AssumeYes
        } else {
            ConfirmPolicy::Require
        };
        let config = KernelConfig::repl()
            .with_identity(identity.clone())
            .with_confirm(confirm);

        let mut kernel = Kernel::new(config).context("Failed to create kernel")?.with_sink(sink);
        if let Some(path) = &options.state {
            kernel = kernel.with_persistence(Arc::new(FileStore::new(path)));
        }

        // Create tokio runtime for async kernel execution
        let runtime = Runtime::new().context("Failed to create tokio runtime")?;

        if options.state.is_some() {
            match runtime.block_on(kernel.load()) {
                Ok(true) => tracing::debug!("restored filesystem from state file"),
                Ok(false) => {}
                Err(e) => tracing::warn!("Failed to load state, starting fresh: {}", e),
            }
        }

        let mut cwd = kernel.cwd().to_string();
        if !kernel.fs().exists(&cwd) {
            cwd = "/".to_string();
        }

        Ok(Self {
            kernel,
            runtime,
            identity,
            cwd,
            persistent: options.state.is_some(),
        })
    }

    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    pub fn prompt(&self) -> String {
        let sigil = if self.identity.is_superuser() { '#' } else { '$' };
        format!("{}@vsh:{}{} ", self.identity.user, self.cwd, sigil)
    }

    /// Process a single line of input.
    ///
    /// Command output goes to the sink; only meta-commands return text.
    pub fn process_line(&mut self, line: &str) -> Outcome {
        let trimmed = line.trim();

        if trimmed.starts_with('/') {
            return self.handle_meta_command(trimmed);
        }
        if matches!(trimmed, "quit" | "exit") {
            return Outcome::Exit;
        }
        if trimmed == "help" {
            return Outcome::Continue(Some(HELP_TEXT.to_string()));
        }
        if trimmed.is_empty() {
            return Outcome::Continue(None);
        }

        self.execute(trimmed);
        Outcome::Continue(None)
    }

    /// Run a line, cancelling it on Ctrl-C.
    pub fn execute(&mut self, line: &str) -> PipelineResult {
        let cancel = CancellationToken::new();
        let interrupt = cancel.clone();
        let listener = self.runtime.spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                interrupt.cancel();
            }
        });

        let result = self.runtime.block_on(self.kernel.run_line_cancellable(
            line,
            &self.cwd,
            &self.identity,
            cancel,
        ));
        listener.abort();

        self.cwd = result.cwd.clone();
        result
    }

    /// Handle a meta-command (starts with /).
    fn handle_meta_command(&mut self, cmd: &str) -> Outcome {
        let command = cmd.split_whitespace().next().unwrap_or("");

        match command {
            "/quit" | "/q" | "/exit" => Outcome::Exit,
            "/help" | "/h" | "/?" => Outcome::Continue(Some(HELP_TEXT.to_string())),
            "/vars" => {
                let vars = self.kernel.vars();
                let mut lines: Vec<String> = vars.iter().map(|(k, v)| format!("  {} = {}", k, v)).collect();
                if lines.is_empty() {
                    Outcome::Continue(Some("(no variables set)".to_string()))
                } else {
                    lines.insert(0, "Variables:".to_string());
                    Outcome::Continue(Some(lines.join("\n")))
                }
            }
            "/cwd" => Outcome::Continue(Some(self.cwd.clone())),
            "/whoami" => Outcome::Continue(Some(format!(
                "{} ({})",
                self.identity.user,
                self.identity.groups.join(",")
            ))),
            "/tools" => {
                let tools = self.kernel.tools();
                let names = tools.names();
                Outcome::Continue(Some(format!("Available tools: {}", names.join(", "))))
            }
            "/jobs" => {
                let jobs = self.runtime.block_on(self.kernel.list_jobs());
                Outcome::Continue(Some(format_jobs(&jobs)))
            }
            "/save" => match self.runtime.block_on(self.kernel.save()) {
                Ok(()) => Outcome::Continue(Some("Saved.".to_string())),
                Err(e) => Outcome::Continue(Some(format!("Save failed: {}", e))),
            },
            _ => Outcome::Continue(Some(format!(
                "Unknown command: {}\nType /help or help for available commands.",
                command
            ))),
        }
    }

    /// Cancel background jobs and save the snapshot, if a state file is
    /// configured.
    pub fn shutdown(&mut self) {
        self.runtime.block_on(self.kernel.shutdown());
        if !self.persistent {
            return;
        }
        if let Err(e) = self.runtime.block_on(self.kernel.save()) {
            tracing::warn!("Failed to save state: {}", e);
        }
    }
}

const HELP_TEXT: &str = r#"vsh REPL

Meta Commands:
  help, /help, /?   Show this help
  quit, /quit, /q   Exit the REPL (saves the state file)

Slash-only commands:
  /vars             Show session variables
  /cwd              Show current working directory
  /whoami           Show user and groups
  /tools            List available commands
  /jobs             List background jobs
  /save             Save the filesystem now

Commands:
  echo, cat, ls, pwd, cd, mkdir, touch, write, rm, mv, chmod, chown,
  chgrp, du, stat, wc, grep, head, sleep, jobs, kill, wait, whoami, id,
  export, env, true, false

Language:
  a | b | c         Pipeline (stdout of a is stdin of b)
  cmd > f, cmd >> f Write or append the output to a file
  cmd < f           Read stdin from a file
  cmd &             Run in background
  a; b              Run one after the other
  $VAR, ${VAR}      Variable reference ('single quotes' are literal)
  # comment

Examples:
  mkdir -p docs/notes
  echo hello | write docs/notes/hi.txt
  cat docs/notes/hi.txt | wc -c
  sleep 30 &
  kill %1
"#;

/// Save REPL history to disk.
fn save_history(rl: &mut Editor<(), DefaultHistory>, history_path: &Option<PathBuf>) {
    if let Some(path) = history_path {
        if let Some(parent) = path.parent() {
            if let Err(e) = std::fs::create_dir_all(parent) {
                tracing::warn!("Failed to create history directory: {}", e);
            }
        }
        if let Err(e) = rl.save_history(path) {
            tracing::warn!("Failed to save history: {}", e);
        }
    }
}

/// Run the REPL.
pub fn run(options: &ReplOptions) -> Result<()> {
    println!("vsh v{}", env!("CARGO_PKG_VERSION"));
    println!("Type /help for commands, /quit to exit.");

    let mut rl: Editor<(), DefaultHistory> = Editor::new().context("Failed to create editor")?;

    // Load history if it exists
    let history_path = data_dir().map(|d| d.join("history.txt"));
    if let Some(ref path) = history_path {
        if let Err(e) = rl.load_history(path) {
            // Only log if it's not a "file not found" error (expected on first run)
            let is_not_found = matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound);
            if !is_not_found {
                tracing::warn!("Failed to load history: {}", e);
            }
        }
    }

    let mut repl = Repl::new(options)?;
    println!();

    loop {
        match rl.readline(&repl.prompt()) {
            Ok(line) => {
                if let Err(e) = rl.add_history_entry(line.as_str()) {
                    tracing::warn!("Failed to add history entry: {}", e);
                }

                match repl.process_line(&line) {
                    Outcome::Continue(Some(output)) => println!("{}", output),
                    Outcome::Continue(None) => {}
                    Outcome::Exit => break,
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("^D");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    save_history(&mut rl, &history_path);
    repl.shutdown();

    Ok(())
}

/// Run one line and exit. Returns whether it succeeded.
pub fn run_command(options: &ReplOptions, line: &str) -> Result<bool> {
    let mut repl = Repl::new(options)?;
    let result = repl.execute(line);
    repl.shutdown();
    Ok(result.success)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn groups_are_split_and_trimmed() {
        assert_eq!(parse_groups("staff, wheel,,dev "), vec!["staff", "wheel", "dev"]);
        assert!(parse_groups("").is_empty());
    }

    #[test]
    fn identity_defaults_to_own_group() {
        let mut options = ReplOptions {
            user: "alice".into(),
            groups: vec![],
            state: None,
            assume_yes: false,
        };
        assert_eq!(options.current_user(), Identity::new("alice", ["alice"]));

        options.groups = parse_groups("staff,wheel");
        let identity = options.current_user();
        assert_eq!(identity.primary_group(), "staff");
        assert!(!identity.in_group("alice"));
    }
}
