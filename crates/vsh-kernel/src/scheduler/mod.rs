//! Scheduler module for vsh: pipelines and background jobs.
//!
//! ```text
//! PipelineRunner
//!   validate stage 0..n, `<` source, `>` target
//!   run stage 0 ──stdout──▶ stage 1 ──stdout──▶ ... ──▶ redirect or caller
//!
//! JobManager
//!   spawn(pipeline) → JobId     cancel(JobId)     wait(JobId)
//!   list() → Vec<JobInfo>       reap(JobId)       reap_finished()
//! ```

mod job;
mod pipeline;

pub use job::JobManager;
pub use pipeline::PipelineRunner;
