//! In-memory bookkeeping for generation jobs.
//!
//! Jobs are per-session and ephemeral; nothing here is persisted. The
//! poller and the watchdog both write through [`JobHandle`], whose terminal
//! transitions are first-write-wins, so whichever timer fires first decides
//! the outcome and the loser's write is a no-op.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use crate::models::job::{Job, JobState, JobView};

/// Shared, mutable handle to one job. Cloning shares the same job.
#[derive(Clone)]
pub struct JobHandle {
    id: Uuid,
    inner: Arc<Mutex<Job>>,
}

impl JobHandle {
    pub fn new(job: Job) -> Self {
        Self {
            id: job.id,
            inner: Arc::new(Mutex::new(job)),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub async fn snapshot(&self) -> JobView {
        self.inner.lock().await.view()
    }

    pub async fn state(&self) -> JobState {
        self.inner.lock().await.state
    }

    pub async fn prediction_id(&self) -> Option<String> {
        self.inner.lock().await.prediction_id.clone()
    }

    pub async fn begin_submission(&self) -> bool {
        self.inner.lock().await.begin_submission()
    }

    pub async fn assign_prediction(&self, prediction_id: String) -> bool {
        self.inner.lock().await.assign_prediction(prediction_id)
    }

    pub async fn record_attempt(&self) -> u32 {
        self.inner.lock().await.record_attempt()
    }

    /// Terminal success. Metrics fire only on the first terminal write.
    pub async fn succeed(&self, output: String) -> bool {
        let mut job = self.inner.lock().await;
        if !job.succeed(output) {
            return false;
        }

        metrics::counter!("generation_jobs_succeeded").increment(1);
        if let Some(finished) = job.finished_at {
            let took = (finished - job.created_at).num_milliseconds().max(0) as f64 / 1000.0;
            metrics::histogram!("generation_duration_seconds").record(took);
        }
        tracing::info!(job_id = %job.id, attempts = job.attempts, "job succeeded");
        true
    }

    /// Terminal failure. Metrics fire only on the first terminal write.
    pub async fn fail(&self, message: impl Into<String>) -> bool {
        let mut job = self.inner.lock().await;
        let message = message.into();
        if !job.fail(message.clone()) {
            return false;
        }

        metrics::counter!("generation_jobs_failed").increment(1);
        tracing::warn!(job_id = %job.id, attempts = job.attempts, error = %message, "job failed");
        true
    }

    /// Terminal timeout, forced by the watchdog.
    pub async fn time_out(&self, message: impl Into<String>) -> bool {
        let mut job = self.inner.lock().await;
        let message = message.into();
        if !job.time_out(message.clone()) {
            return false;
        }

        metrics::counter!("generation_jobs_timed_out").increment(1);
        tracing::warn!(job_id = %job.id, attempts = job.attempts, "job timed out");
        true
    }
}

/// Registry of all jobs created during this process lifetime.
#[derive(Clone, Default)]
pub struct JobRegistry {
    jobs: Arc<RwLock<HashMap<Uuid, JobHandle>>>,
}

impl JobRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, handle: JobHandle) {
        self.jobs.write().await.insert(handle.id(), handle);
    }

    pub async fn get(&self, id: Uuid) -> Option<JobHandle> {
        self.jobs.read().await.get(&id).cloned()
    }

    /// Number of jobs not yet in a terminal state (for health reporting).
    pub async fn active_count(&self) -> usize {
        let handles: Vec<JobHandle> = self.jobs.read().await.values().cloned().collect();
        let mut active = 0;
        for handle in handles {
            if !handle.state().await.is_terminal() {
                active += 1;
            }
        }
        active
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn pending_handle() -> JobHandle {
        let handle = JobHandle::new(Job::new());
        assert!(handle.begin_submission().await);
        assert!(handle.assign_prediction("abc123".to_string()).await);
        handle
    }

    #[tokio::test]
    async fn registry_round_trip() {
        let registry = JobRegistry::new();
        let handle = pending_handle().await;
        let id = handle.id();

        registry.insert(handle).await;
        let found = registry.get(id).await.expect("job should be registered");
        assert_eq!(found.state().await, JobState::Pending);
        assert!(registry.get(Uuid::new_v4()).await.is_none());
    }

    #[tokio::test]
    async fn first_terminal_write_wins_through_handle() {
        let handle = pending_handle().await;

        assert!(handle.time_out("deadline elapsed").await);
        assert!(!handle.succeed("https://x/img.jpg".to_string()).await);

        let view = handle.snapshot().await;
        assert_eq!(view.status, JobState::TimedOut);
        assert!(view.result.is_none());
    }

    #[tokio::test]
    async fn active_count_ignores_terminal_jobs() {
        let registry = JobRegistry::new();

        let live = pending_handle().await;
        let done = pending_handle().await;
        done.succeed("https://x/img.jpg".to_string()).await;

        registry.insert(live).await;
        registry.insert(done).await;

        assert_eq!(registry.active_count().await, 1);
    }
}
