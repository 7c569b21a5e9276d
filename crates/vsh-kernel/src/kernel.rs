//! The Kernel: one session of vsh.
//!
//! The Kernel owns and coordinates all core components:
//! - Node store (the virtual filesystem)
//! - Tool registry (builtin commands)
//! - Job manager (background pipelines)
//! - Session variables
//! - Optional persistence store and output sink
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                          Kernel                            │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐  │
//! │  │  SharedEnv   │  │ ToolRegistry │  │    NodeStore     │  │
//! │  │  (variables) │  │  (builtins)  │  │  (one tree, one  │  │
//! │  │              │  │              │  │   lock)          │  │
//! │  └──────────────┘  └──────────────┘  └──────────────────┘  │
//! │  ┌──────────────────────────────┐  ┌──────────────────┐    │
//! │  │  JobManager (background)     │  │ PersistenceStore │    │
//! │  └──────────────────────────────┘  └──────────────────┘    │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers pass the working directory and identity into every
//! [`Kernel::run_line`]; the kernel keeps neither between lines. The cwd a
//! line ends in comes back in its [`PipelineResult`].

use std::sync::Arc;

use tokio::sync::oneshot;
use tokio_util::sync::CancellationToken;
use vsh_types::{ErrorKind, JobId, JobInfo, PipelineResult};

use crate::ast::Pipeline;
use crate::env::{expand_pipeline, Env, Overlay, SharedEnv};
use crate::error::{ShellError, ShellResult};
use crate::identity::Identity;
use crate::output::{OutputSink, StyleHint};
use crate::parser::parse_line;
use crate::persist::PersistenceStore;
use crate::scheduler::{JobManager, PipelineRunner};
use crate::tools::{ConfirmPolicy, ExecContext, ToolRegistry};
use crate::vfs::{path, Mode, NodeStore, Snapshot};

/// Mode of the shared scratch directory: world-writable with the sticky bit.
const TMP_MODE: u16 = 0o1777;

/// Configuration for a kernel instance.
#[derive(Debug, Clone)]
pub struct KernelConfig {
    /// Name of this kernel (for logs).
    pub name: String,

    /// Working directory reported by [`Kernel::cwd`]. Defaults to the
    /// identity's home when bootstrapping, `/` otherwise.
    pub cwd: Option<String>,

    /// Create `/home/<user>`, `/tmp` and `/etc` at startup.
    pub bootstrap: bool,

    /// Identity for callers that have no identity provider of their own.
    pub identity: Identity,

    /// How commands treat requests for confirmation.
    pub confirm: ConfirmPolicy,
}

impl Default for KernelConfig {
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            cwd: None,
            bootstrap: true,
            identity: Identity::new("user", ["user"]),
            confirm: ConfirmPolicy::Require,
        }
    }
}

impl KernelConfig {
    /// An empty root owned by the superuser and nothing else.
    ///
    /// Tests build exactly the tree they need on top of this.
    pub fn isolated() -> Self {
        Self {
            name: "isolated".to_string(),
            cwd: Some("/".to_string()),
            bootstrap: false,
            identity: Identity::root(),
            confirm: ConfirmPolicy::Require,
        }
    }

    /// Configuration for an interactive session.
    pub fn repl() -> Self {
        Self {
            name: "repl".to_string(),
            ..Self::default()
        }
    }

    /// Create a named config with defaults.
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn with_cwd(mut self, cwd: impl Into<String>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn with_bootstrap(mut self, bootstrap: bool) -> Self {
        self.bootstrap = bootstrap;
        self
    }

    pub fn with_identity(mut self, identity: Identity) -> Self {
        self.identity = identity;
        self
    }

    pub fn with_confirm(mut self, confirm: ConfirmPolicy) -> Self {
        self.confirm = confirm;
        self
    }
}

/// The vsh kernel.
pub struct Kernel {
    name: String,
    fs: Arc<NodeStore>,
    tools: Arc<ToolRegistry>,
    jobs: Arc<JobManager>,
    env: SharedEnv,
    runner: PipelineRunner,
    identity: Identity,
    cwd: String,
    confirm: ConfirmPolicy,
    persistence: Option<Arc<dyn PersistenceStore>>,
    sink: Option<Arc<dyn OutputSink>>,
}

impl Kernel {
    /// Create a new kernel with the given configuration.
    pub fn new(config: KernelConfig) -> ShellResult<Self> {
        let fs = Arc::new(NodeStore::new());
        if config.bootstrap {
            bootstrap(&fs, &config.identity)?;
        }

        let cwd = match &config.cwd {
            Some(cwd) => path::resolve(cwd, "/"),
            None if config.bootstrap => config.identity.home_dir(),
            None => "/".to_string(),
        };

        let tools = Arc::new(ToolRegistry::with_builtins());
        tracing::debug!(kernel = %config.name, tools = tools.names().len(), cwd = %cwd, "kernel created");

        Ok(Self {
            name: config.name,
            fs,
            runner: PipelineRunner::new(tools.clone()),
            tools,
            jobs: Arc::new(JobManager::new()),
            env: SharedEnv::default(),
            identity: config.identity,
            cwd,
            confirm: config.confirm,
            persistence: None,
            sink: None,
        })
    }

    /// Create a kernel over an empty root.
    pub fn isolated() -> ShellResult<Self> {
        Self::new(KernelConfig::isolated())
    }

    /// Attach a persistence store for [`save`](Self::save) and
    /// [`load`](Self::load).
    pub fn with_persistence(mut self, store: Arc<dyn PersistenceStore>) -> Self {
        self.persistence = Some(store);
        self
    }

    /// Attach an output sink. Foreground output is written to it as well as
    /// returned; background output goes only there.
    pub fn with_sink(mut self, sink: Arc<dyn OutputSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configured identity.
    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    /// The configured starting directory.
    pub fn cwd(&self) -> &str {
        &self.cwd
    }

    pub fn fs(&self) -> Arc<NodeStore> {
        self.fs.clone()
    }

    pub fn tools(&self) -> Arc<ToolRegistry> {
        self.tools.clone()
    }

    pub fn jobs(&self) -> Arc<JobManager> {
        self.jobs.clone()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Running lines
    // ═══════════════════════════════════════════════════════════════════

    /// Parse and run one command line.
    pub async fn run_line(&self, raw: &str, cwd: &str, identity: &Identity) -> PipelineResult {
        self.run_line_cancellable(raw, cwd, identity, CancellationToken::new())
            .await
    }

    /// Like [`run_line`](Self::run_line), with a token that cancels the
    /// foreground pipelines of this line.
    ///
    /// Pipelines separated by `;` run in order, each expanded and validated
    /// just before it runs. A failure does not stop later pipelines: the
    /// result concatenates stdout, succeeds only if every pipeline did, and
    /// reports the first error. Background pipelines are validated here and
    /// then handed to the job manager; their slot in stdout is `[id]`.
    #[tracing::instrument(level = "info", skip(self, raw, identity, cancel), fields(user = %identity.user, len = raw.len()))]
    pub async fn run_line_cancellable(
        &self,
        raw: &str,
        cwd: &str,
        identity: &Identity,
        cancel: CancellationToken,
    ) -> PipelineResult {
        let mut cwd = path::resolve(cwd, "/");

        let script = match parse_line(raw) {
            Ok(script) => script,
            Err(e) => {
                let result = PipelineResult::failed(e.kind(), e.to_string(), cwd);
                self.emit(&result);
                return result;
            }
        };

        let mut line = PipelineResult::ok("", cwd.clone());
        for pipeline in &script.pipelines {
            if cancel.is_cancelled() {
                merge(&mut line, PipelineResult::failed(ErrorKind::Cancelled, "cancelled", &cwd));
                break;
            }

            let overrides = [
                ("USER", identity.user.clone()),
                ("HOME", identity.home_dir()),
                ("PWD", cwd.clone()),
            ];
            let expanded = expand_pipeline(
                pipeline,
                &Overlay {
                    base: &self.env,
                    overrides: &overrides,
                },
            );

            let result = if expanded.background {
                self.spawn_background(expanded, &cwd, identity).await
            } else {
                let mut ctx = self.context(identity, &cwd, self.env.clone(), cancel.clone());
                self.runner.run(&expanded, &mut ctx).await
            };

            self.emit(&result);
            cwd = result.cwd.clone();
            merge(&mut line, result);
        }

        line.cwd = cwd;
        line
    }

    /// Validate a background pipeline and start it as a job.
    #[tracing::instrument(level = "debug", skip(self, pipeline, identity), fields(commands = pipeline.commands.len(), text = %pipeline.text))]
    async fn spawn_background(
        &self,
        pipeline: Pipeline<String>,
        cwd: &str,
        identity: &Identity,
    ) -> PipelineResult {
        let cancel = CancellationToken::new();
        let mut ctx = self.context(identity, cwd, self.env.detached(), cancel.clone());
        ctx.background = true;

        if let Err(result) = self.runner.check(&pipeline, &ctx) {
            return PipelineResult::from_exec(result, cwd);
        }

        let runner = PipelineRunner::new(self.tools.clone());
        let sink = self.sink.clone();
        let (id_tx, id_rx) = oneshot::channel::<JobId>();
        let command = pipeline.text.clone();

        let id = self
            .jobs
            .spawn(command.clone(), cancel, async move {
                let result = runner.run(&pipeline, &mut ctx).await;
                if let Some(sink) = sink {
                    let id = id_rx.await.map(|id| id.to_string()).unwrap_or_default();
                    report_job(sink.as_ref(), &id, &command, &result);
                }
                result
            })
            .await;
        // The task only reads the id once it finishes.
        let _ = id_tx.send(id);

        PipelineResult::ok(format!("[{}]\n", id), cwd)
    }

    fn context(
        &self,
        identity: &Identity,
        cwd: &str,
        env: SharedEnv,
        cancel: CancellationToken,
    ) -> ExecContext {
        ExecContext {
            fs: self.fs.clone(),
            identity: identity.clone(),
            cwd: cwd.to_string(),
            stdin: None,
            env,
            jobs: self.jobs.clone(),
            tools: self.tools.clone(),
            cancel,
            confirm: self.confirm,
            background: false,
        }
    }

    /// Write a foreground result to the sink, if any.
    fn emit(&self, result: &PipelineResult) {
        let Some(sink) = &self.sink else {
            return;
        };
        if !result.stdout.is_empty() {
            sink.write(&result.stdout, StyleHint::Output);
        }
        if let Some(error) = &result.error {
            sink.write(&format!("{}\n", error), StyleHint::Error);
        }
    }

    // ═══════════════════════════════════════════════════════════════════
    // Jobs
    // ═══════════════════════════════════════════════════════════════════

    /// All jobs that have not been reaped.
    pub async fn list_jobs(&self) -> Vec<JobInfo> {
        self.jobs.list().await
    }

    pub async fn cancel_job(&self, id: JobId) -> ShellResult<()> {
        self.jobs.cancel(id).await
    }

    /// Wait for a job to finish.
    pub async fn wait_job(&self, id: JobId) -> ShellResult<PipelineResult> {
        self.jobs.wait(id).await
    }

    /// Remove a finished job. `None` while it is still running.
    pub async fn reap_job(&self, id: JobId) -> ShellResult<Option<PipelineResult>> {
        self.jobs.reap(id).await
    }

    /// Cancel every running job.
    pub async fn shutdown(&self) {
        let running = self.jobs.running_count().await;
        if running > 0 {
            tracing::debug!(kernel = %self.name, running, "cancelling jobs at shutdown");
        }
        self.jobs.cancel_all().await;
    }

    // ═══════════════════════════════════════════════════════════════════
    // Variables
    // ═══════════════════════════════════════════════════════════════════

    pub fn get_var(&self, name: &str) -> Option<String> {
        self.env.get(name)
    }

    pub fn set_var(&self, name: &str, value: impl Into<String>) {
        self.env.set(name, value);
    }

    /// A copy of every session variable.
    pub fn vars(&self) -> Env {
        self.env.snapshot()
    }

    // ═══════════════════════════════════════════════════════════════════
    // Persistence
    // ═══════════════════════════════════════════════════════════════════

    /// Serialize the filesystem and hand it to the persistence store.
    ///
    /// A failed save leaves the in-memory tree untouched.
    pub async fn save(&self) -> ShellResult<()> {
        let store = self.store()?;
        let bytes = self.fs.snapshot()?.to_bytes()?;
        store.save(&bytes).await?;
        tracing::debug!(kernel = %self.name, bytes = bytes.len(), "snapshot saved");
        Ok(())
    }

    /// Replace the filesystem with the stored snapshot.
    ///
    /// Returns `false` when the store holds nothing yet; the current tree
    /// is kept then, and on any error.
    pub async fn load(&self) -> ShellResult<bool> {
        let store = self.store()?;
        let Some(bytes) = store.load().await? else {
            tracing::debug!(kernel = %self.name, "no snapshot stored");
            return Ok(false);
        };
        let snapshot = Snapshot::from_bytes(&bytes)?;
        self.fs.restore(snapshot)?;
        tracing::debug!(kernel = %self.name, bytes = bytes.len(), "snapshot loaded");
        Ok(true)
    }

    fn store(&self) -> ShellResult<&Arc<dyn PersistenceStore>> {
        self.persistence
            .as_ref()
            .ok_or_else(|| ShellError::Persistence("no persistence store attached".into()))
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Kernel")
            .field("name", &self.name)
            .field("identity", &self.identity)
            .field("cwd", &self.cwd)
            .field("persistent", &self.persistence.is_some())
            .finish_non_exhaustive()
    }
}

/// Create the standard layout: the user's home, `/tmp` and `/etc`.
fn bootstrap(fs: &NodeStore, identity: &Identity) -> ShellResult<()> {
    let root = Identity::root();

    fs.create_directory("/etc", &root, false)?;
    fs.create_directory("/tmp", &root, false)?;
    fs.set_mode("/tmp", Mode::new(TMP_MODE), &root)?;

    let home = identity.home_dir();
    fs.create_directory(&home, &root, true)?;
    fs.set_owner(&home, &identity.user, &root)?;
    fs.set_group(&home, identity.primary_group(), &root)?;
    Ok(())
}

/// Fold one pipeline's result into the line's.
fn merge(line: &mut PipelineResult, result: PipelineResult) {
    line.stdout.push_str(&result.stdout);
    if !result.success {
        line.success = false;
        if line.error.is_none() {
            line.error = result.error;
            line.kind = result.kind;
        }
    }
}

fn report_job(sink: &dyn OutputSink, id: &str, command: &str, result: &PipelineResult) {
    if !result.stdout.is_empty() {
        sink.write(&result.stdout, StyleHint::Output);
    }
    match &result.error {
        None => sink.write(&format!("[{}] Done {}\n", id, command), StyleHint::Notice),
        Some(error) => {
            sink.write(&format!("{}\n", error), StyleHint::Error);
            let state = if result.was_cancelled() { "Cancelled" } else { "Failed" };
            sink.write(&format!("[{}] {} {}\n", id, state, command), StyleHint::Notice);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::BufferSink;
    use crate::persist::MemoryStore;

    fn alice() -> Identity {
        Identity::new("alice", ["alice"])
    }

    fn kernel() -> Kernel {
        Kernel::new(KernelConfig::default().with_identity(alice())).unwrap()
    }

    #[test]
    fn bootstrap_layout() {
        let kernel = kernel();
        let fs = kernel.fs();
        let home = fs.stat("/home/alice").unwrap();
        assert_eq!(home.owner, "alice");
        assert_eq!(home.group, "alice");
        assert_eq!(fs.stat("/tmp").unwrap().mode.bits(), 0o1777);
        assert_eq!(fs.stat("/etc").unwrap().owner, "root");
        assert_eq!(kernel.cwd(), "/home/alice");
    }

    #[test]
    fn isolated_has_empty_root() {
        let kernel = Kernel::isolated().unwrap();
        assert!(kernel.fs().list_dir("/", &Identity::root()).unwrap().is_empty());
        assert_eq!(kernel.cwd(), "/");
    }

    #[tokio::test]
    async fn parse_error_runs_nothing() {
        let kernel = kernel();
        let result = kernel
            .run_line("write a.txt hi; echo 'open", "/home/alice", &alice())
            .await;
        assert!(!result.success);
        assert_eq!(result.kind, Some(ErrorKind::ParseError));
        assert!(!kernel.fs().exists("/home/alice/a.txt"));
    }

    #[tokio::test]
    async fn later_pipelines_run_after_failure() {
        let kernel = kernel();
        let result = kernel
            .run_line("echo one; cat nope.txt; echo two", "/home/alice", &alice())
            .await;
        assert!(!result.success);
        assert_eq!(result.stdout, "one\ntwo\n");
        assert_eq!(result.kind, Some(ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn export_visible_to_later_pipelines() {
        let kernel = kernel();
        let result = kernel
            .run_line("export GREETING=hi; echo $GREETING $USER $PWD", "/home/alice", &alice())
            .await;
        assert_eq!(result.stdout, "hi alice /home/alice\n");
        assert_eq!(kernel.get_var("GREETING").as_deref(), Some("hi"));
    }

    #[tokio::test]
    async fn cd_threads_through_line() {
        let kernel = kernel();
        let result = kernel.run_line("cd /tmp; pwd; echo $PWD", "/home/alice", &alice()).await;
        assert_eq!(result.stdout, "/tmp\n/tmp\n");
        assert_eq!(result.cwd, "/tmp");
    }

    #[tokio::test]
    async fn sink_receives_output_and_errors() {
        let sink = Arc::new(BufferSink::new());
        let kernel = kernel().with_sink(sink.clone());
        kernel.run_line("echo hi; cat nope", "/home/alice", &alice()).await;
        assert_eq!(sink.text(StyleHint::Output), "hi\n");
        assert_eq!(
            sink.text(StyleHint::Error),
            "cat: /home/alice/nope: no such file or directory\n"
        );
    }

    #[tokio::test]
    async fn background_job_reports_to_sink() {
        let sink = Arc::new(BufferSink::new());
        let kernel = kernel().with_sink(sink.clone());
        let result = kernel.run_line("echo bg &", "/home/alice", &alice()).await;
        assert_eq!(result.stdout, "[1]\n");

        let done = kernel.wait_job(JobId(1)).await.unwrap();
        assert_eq!(done.stdout, "bg\n");
        // The notice is written before the job result is published.
        assert!(sink.text(StyleHint::Output).contains("bg\n"));
        assert!(sink.text(StyleHint::Notice).starts_with("[1] Done"));
    }

    #[tokio::test]
    async fn background_validation_fails_synchronously() {
        let kernel = kernel();
        let result = kernel.run_line("cat nope.txt &", "/home/alice", &alice()).await;
        assert!(!result.success);
        assert_eq!(result.kind, Some(ErrorKind::NotFound));
        assert!(kernel.list_jobs().await.is_empty());
    }

    #[tokio::test]
    async fn cancelled_line_stops() {
        let kernel = kernel();
        let token = CancellationToken::new();
        token.cancel();
        let result = kernel
            .run_line_cancellable("write a.txt hi; write b.txt hi", "/home/alice", &alice(), token)
            .await;
        assert!(result.was_cancelled());
        assert!(!kernel.fs().exists("/home/alice/a.txt"));
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let store = Arc::new(MemoryStore::new());
        let kernel = kernel().with_persistence(store.clone());
        kernel.run_line("write notes.txt remember", "/home/alice", &alice()).await;
        kernel.save().await.unwrap();

        let fresh = Kernel::isolated().unwrap().with_persistence(store);
        assert!(fresh.load().await.unwrap());
        assert_eq!(
            fresh.fs().read_file("/home/alice/notes.txt", &alice()).unwrap(),
            b"remember\n"
        );
    }

    #[tokio::test]
    async fn load_from_empty_store_keeps_tree() {
        let kernel = kernel().with_persistence(Arc::new(MemoryStore::new()));
        assert!(!kernel.load().await.unwrap());
        assert!(kernel.fs().exists("/home/alice"));
    }

    #[tokio::test]
    async fn save_without_store_is_persistence_error() {
        let err = kernel().save().await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PersistenceError);
    }
}
