//! Pure data types for vsh — results, error kinds, job states, command definitions.
//!
//! This crate is a leaf dependency with no async runtime, no parser, no I/O.
//! Front ends and embedders can work with vsh's result and definition types
//! without pulling in the kernel.

pub mod error;
pub mod fs;
pub mod job;
pub mod result;
pub mod tool;

// Flat re-exports for convenience
pub use error::*;
pub use fs::*;
pub use job::*;
pub use result::*;
pub use tool::*;
