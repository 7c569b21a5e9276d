//! Execution context for tools.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use crate::env::SharedEnv;
use crate::identity::Identity;
use crate::scheduler::JobManager;
use crate::vfs::{path, NodeStore};

use super::registry::ToolRegistry;

/// How commands treat a request that needs the user's confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmPolicy {
    /// Fail with `ConfirmationRequired`; the caller asks and retries.
    #[default]
    Require,
    /// The answer is yes. Never honoured in background jobs.
    AssumeYes,
}

/// Execution context passed to tools.
///
/// Everything a command may touch arrives through here: the filesystem, the
/// caller's identity and working directory, the previous stage's output.
pub struct ExecContext {
    /// The virtual filesystem.
    pub fs: Arc<NodeStore>,
    /// Who is running the command.
    pub identity: Identity,
    /// Current working directory, normalized and absolute.
    pub cwd: String,
    /// Standard input for the tool (from pipeline or `<`).
    pub stdin: Option<String>,
    /// Session variables.
    pub env: SharedEnv,
    /// Background jobs.
    pub jobs: Arc<JobManager>,
    /// Tool registry, for commands that inspect what exists.
    pub tools: Arc<ToolRegistry>,
    /// Cancellation for the pipeline this command belongs to.
    pub cancel: CancellationToken,
    pub confirm: ConfirmPolicy,
    /// True when running as a background job.
    pub background: bool,
}

impl ExecContext {
    /// Create a context over `fs` with the builtin registry, rooted at `/`.
    pub fn new(fs: Arc<NodeStore>, identity: Identity) -> Self {
        Self {
            fs,
            identity,
            cwd: "/".to_string(),
            stdin: None,
            env: SharedEnv::default(),
            jobs: Arc::new(JobManager::new()),
            tools: Arc::new(ToolRegistry::with_builtins()),
            cancel: CancellationToken::new(),
            confirm: ConfirmPolicy::default(),
            background: false,
        }
    }

    /// Resolve a path argument to a normalized absolute path.
    pub fn resolve_path(&self, path: &str) -> String {
        path::resolve(path, &self.cwd)
    }

    /// Join a path argument onto the cwd without normalizing.
    ///
    /// Commands that create or remove entries hand the store this form so
    /// it can refuse a final `.` or `..`.
    pub fn entry_path(&self, path: &str) -> String {
        path::join(&self.cwd, path)
    }

    /// Set stdin for this command.
    pub fn set_stdin(&mut self, stdin: String) {
        self.stdin = Some(stdin);
    }

    /// Take stdin, leaving none behind.
    pub fn take_stdin(&mut self) -> Option<String> {
        self.stdin.take()
    }

    /// True if a confirmation prompt may be answered with yes.
    pub fn assume_yes(&self) -> bool {
        self.confirm == ConfirmPolicy::AssumeYes && !self.background
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}

impl std::fmt::Debug for ExecContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExecContext")
            .field("identity", &self.identity)
            .field("cwd", &self.cwd)
            .field("confirm", &self.confirm)
            .field("background", &self.background)
            .finish_non_exhaustive()
    }
}
