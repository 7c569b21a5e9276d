//! vsh-kernel: the core of vsh.
//!
//! This crate provides:
//!
//! - **VFS**: In-memory tree with Unix-style owners, groups and mode bits
//! - **Lexer**: Tokenizes command lines using logos
//! - **Parser**: Builds pipelines from tokens using chumsky
//! - **Env**: Session variables and word expansion
//! - **Validator**: Checks declared arguments, paths and permissions before anything runs
//! - **Tools**: Tool trait, registry, and builtin commands
//! - **Scheduler**: Pipeline execution and background job management
//! - **Persist**: Snapshot load/save behind an opaque byte store
//! - **Kernel**: The facade that ties one session together

pub mod ast;
pub mod env;
pub mod error;
pub mod identity;
pub mod kernel;
pub mod lexer;
pub mod output;
pub mod parser;
pub mod persist;
pub mod scheduler;
pub mod tools;
pub mod validator;
pub mod vfs;

pub use error::{ShellError, ShellResult};
pub use identity::{Identity, IdentityProvider, StaticIdentity};
pub use kernel::{Kernel, KernelConfig};
pub use output::{BufferSink, OutputSink, StyleHint};
pub use persist::{FileStore, MemoryStore, PersistenceStore};
pub use tools::ConfirmPolicy;

// Shared data types, for embedders that only depend on this crate.
pub use vsh_types::{ErrorKind, ExecResult, JobId, JobInfo, JobState, PipelineResult};
