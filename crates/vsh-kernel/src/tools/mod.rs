//! Tool system for vsh.
//!
//! Every command is a tool: a declarative [`ToolSchema`](vsh_types::ToolSchema)
//! the validator checks, plus one `execute` method holding the effect.
//!
//! ```text
//! ToolRegistry
//! └── Builtins (echo, ls, cat, mkdir, rm, ...)
//! ```

mod builtin;
mod context;
mod registry;
mod traits;

pub use builtin::register_builtins;
pub use context::{ConfirmPolicy, ExecContext};
pub use registry::ToolRegistry;
pub use traits::Tool;
