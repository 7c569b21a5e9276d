//! Background job management.
//!
//! A job is a pipeline started with `&`. It gets an id, a cancellation
//! token and an entry in the table before its task is spawned, so it is
//! listed and cancellable from the moment `spawn` returns. Entries stay in
//! the table after they finish until someone reaps them.

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use vsh_types::{ErrorKind, JobId, JobInfo, JobState, PipelineResult};

use crate::error::{ShellError, ShellResult};

/// One entry in the job table.
struct Job {
    command: String,
    state: JobState,
    cancel: CancellationToken,
    result: Option<PipelineResult>,
    /// Carries the result once the task finishes.
    done: watch::Receiver<Option<PipelineResult>>,
}

/// Manager for background jobs.
#[derive(Default)]
pub struct JobManager {
    /// Counter for generating unique job IDs. Ids start at 1.
    next_id: AtomicU64,
    jobs: Arc<Mutex<BTreeMap<JobId, Job>>>,
}

impl JobManager {
    /// Create a new job manager.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start `future` as a background job.
    ///
    /// `cancel` must be the token the future watches; [`cancel`](Self::cancel)
    /// triggers it.
    pub async fn spawn<F>(&self, command: String, cancel: CancellationToken, future: F) -> JobId
    where
        F: Future<Output = PipelineResult> + Send + 'static,
    {
        let id = JobId(self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        let (tx, rx) = watch::channel(None);

        self.jobs.lock().await.insert(
            id,
            Job {
                command: command.clone(),
                state: JobState::Running,
                cancel,
                result: None,
                done: rx,
            },
        );
        tracing::debug!(job = %id, command = %command, "job started");

        let jobs = self.jobs.clone();
        tokio::spawn(async move {
            let result = future.await;
            let state = terminal_state(&result);
            if let Some(job) = jobs.lock().await.get_mut(&id) {
                job.state = state;
                job.result = Some(result.clone());
            }
            tracing::debug!(job = %id, state = %state, "job finished");
            // Nobody waiting is fine.
            let _ = tx.send(Some(result));
        });

        id
    }

    /// All jobs that have not been reaped, ordered by id.
    pub async fn list(&self) -> Vec<JobInfo> {
        self.jobs
            .lock()
            .await
            .iter()
            .map(|(id, job)| JobInfo {
                id: *id,
                command: job.command.clone(),
                state: job.state,
            })
            .collect()
    }

    /// Information about one job.
    pub async fn get(&self, id: JobId) -> Option<JobInfo> {
        self.jobs.lock().await.get(&id).map(|job| JobInfo {
            id,
            command: job.command.clone(),
            state: job.state,
        })
    }

    /// Request cancellation. A job that already finished is left alone.
    pub async fn cancel(&self, id: JobId) -> ShellResult<()> {
        let jobs = self.jobs.lock().await;
        let job = jobs.get(&id).ok_or(ShellError::NoSuchJob(id.0))?;
        if !job.state.is_terminal() {
            tracing::debug!(job = %id, "job cancel requested");
            job.cancel.cancel();
        }
        Ok(())
    }

    /// Wait for a job to finish and return its result.
    pub async fn wait(&self, id: JobId) -> ShellResult<PipelineResult> {
        let mut done = {
            let jobs = self.jobs.lock().await;
            let job = jobs.get(&id).ok_or(ShellError::NoSuchJob(id.0))?;
            if let Some(result) = &job.result {
                return Ok(result.clone());
            }
            job.done.clone()
        };

        let finished = done.wait_for(Option::is_some).await;
        match finished {
            Ok(result) => Ok((*result).clone().unwrap_or_else(lost_result)),
            // The task dropped its sender without reporting.
            Err(_) => Ok(lost_result()),
        }
    }

    /// Remove a finished job from the table, returning its result.
    ///
    /// A running job is not removed.
    pub async fn reap(&self, id: JobId) -> ShellResult<Option<PipelineResult>> {
        let mut jobs = self.jobs.lock().await;
        let job = jobs.get(&id).ok_or(ShellError::NoSuchJob(id.0))?;
        if !job.state.is_terminal() {
            return Ok(None);
        }
        Ok(jobs.remove(&id).and_then(|job| job.result))
    }

    /// Remove every finished job, returning what was removed.
    pub async fn reap_finished(&self) -> Vec<JobInfo> {
        let mut jobs = self.jobs.lock().await;
        let finished: Vec<JobId> = jobs
            .iter()
            .filter(|(_, job)| job.state.is_terminal())
            .map(|(id, _)| *id)
            .collect();
        finished
            .into_iter()
            .filter_map(|id| {
                jobs.remove(&id).map(|job| JobInfo {
                    id,
                    command: job.command,
                    state: job.state,
                })
            })
            .collect()
    }

    /// Number of jobs still running.
    pub async fn running_count(&self) -> usize {
        self.jobs
            .lock()
            .await
            .values()
            .filter(|job| job.state == JobState::Running)
            .count()
    }

    /// Cancel every running job.
    pub async fn cancel_all(&self) {
        for job in self.jobs.lock().await.values() {
            if !job.state.is_terminal() {
                job.cancel.cancel();
            }
        }
    }
}

impl std::fmt::Debug for JobManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobManager")
            .field("next_id", &self.next_id)
            .finish_non_exhaustive()
    }
}

fn terminal_state(result: &PipelineResult) -> JobState {
    if result.was_cancelled() {
        JobState::Cancelled
    } else if result.success {
        JobState::Completed
    } else {
        JobState::Failed
    }
}

fn lost_result() -> PipelineResult {
    PipelineResult::failed(ErrorKind::CommandFailed, "job ended without a result", "/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn ok(out: &str) -> PipelineResult {
        PipelineResult::ok(out, "/")
    }

    #[tokio::test]
    async fn ids_are_monotonic_from_one() {
        let manager = JobManager::new();
        let a = manager
            .spawn("a".into(), CancellationToken::new(), async { ok("a") })
            .await;
        let b = manager
            .spawn("b".into(), CancellationToken::new(), async { ok("b") })
            .await;
        assert_eq!(a, JobId(1));
        assert_eq!(b, JobId(2));
    }

    #[tokio::test]
    async fn wait_returns_result_and_marks_completed() {
        let manager = JobManager::new();
        let id = manager
            .spawn("echo hi".into(), CancellationToken::new(), async { ok("hi\n") })
            .await;

        let result = manager.wait(id).await.unwrap();
        assert_eq!(result.stdout, "hi\n");

        let info = manager.get(id).await.unwrap();
        assert_eq!(info.state, JobState::Completed);
        assert_eq!(info.command, "echo hi");
    }

    #[tokio::test]
    async fn failed_result_marks_failed() {
        let manager = JobManager::new();
        let id = manager
            .spawn("false".into(), CancellationToken::new(), async {
                PipelineResult::failed(ErrorKind::CommandFailed, "false", "/")
            })
            .await;
        manager.wait(id).await.unwrap();
        assert_eq!(manager.get(id).await.unwrap().state, JobState::Failed);
    }

    #[tokio::test]
    async fn cancel_reaches_the_future() {
        let manager = JobManager::new();
        let token = CancellationToken::new();
        let watched = token.clone();
        let id = manager
            .spawn("sleep 60".into(), token, async move {
                tokio::select! {
                    _ = watched.cancelled() => {
                        PipelineResult::failed(ErrorKind::Cancelled, "sleep: cancelled", "/")
                    }
                    _ = tokio::time::sleep(Duration::from_secs(60)) => ok(""),
                }
            })
            .await;

        assert_eq!(manager.running_count().await, 1);
        manager.cancel(id).await.unwrap();
        let result = manager.wait(id).await.unwrap();
        assert!(result.was_cancelled());
        assert_eq!(manager.get(id).await.unwrap().state, JobState::Cancelled);
        assert_eq!(manager.running_count().await, 0);
    }

    #[tokio::test]
    async fn cancel_unknown_job_is_not_found() {
        let manager = JobManager::new();
        let err = manager.cancel(JobId(42)).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(err.to_string(), "%42: no such job");
    }

    #[tokio::test]
    async fn cancel_finished_job_changes_nothing() {
        let manager = JobManager::new();
        let id = manager
            .spawn("true".into(), CancellationToken::new(), async { ok("") })
            .await;
        manager.wait(id).await.unwrap();
        manager.cancel(id).await.unwrap();
        assert_eq!(manager.get(id).await.unwrap().state, JobState::Completed);
    }

    #[tokio::test]
    async fn reap_removes_only_finished_jobs() {
        let manager = JobManager::new();
        let token = CancellationToken::new();
        let watched = token.clone();
        let running = manager
            .spawn("wait".into(), token, async move {
                watched.cancelled().await;
                PipelineResult::failed(ErrorKind::Cancelled, "cancelled", "/")
            })
            .await;
        let done = manager
            .spawn("true".into(), CancellationToken::new(), async { ok("x") })
            .await;
        manager.wait(done).await.unwrap();

        assert_eq!(manager.reap(running).await.unwrap(), None);
        assert_eq!(manager.reap(done).await.unwrap().map(|r| r.stdout), Some("x".into()));
        assert!(manager.get(done).await.is_none());
        assert_eq!(manager.list().await.len(), 1);

        manager.cancel_all().await;
        manager.wait(running).await.unwrap();
        let reaped = manager.reap_finished().await;
        assert_eq!(reaped.len(), 1);
        assert_eq!(reaped[0].state, JobState::Cancelled);
        assert!(manager.list().await.is_empty());
    }
}
