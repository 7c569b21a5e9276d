//! Virtual filesystem for vsh.
//!
//! A single in-memory tree of directories and files with Unix-style
//! ownership and permission bits:
//!
//! - [`mode`]: the 12-bit permission mask and access decisions
//! - [`node`]: file and directory nodes
//! - [`path`]: lexical path resolution
//! - [`store`]: the locked tree and every operation on it
//! - [`snapshot`]: serializable copies of the tree

pub mod mode;
pub mod node;
pub mod path;
pub mod snapshot;
pub mod store;

pub use mode::{has_permission, Mode, DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, SETGID, SETUID, STICKY};
pub use node::Node;
pub use path::resolve;
pub use snapshot::{Snapshot, SnapshotNode, SNAPSHOT_VERSION};
pub use store::{DeleteReport, NodeStore, Stat, WriteMode};
