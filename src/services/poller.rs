//! Adaptive polling loop that tracks a prediction to a terminal state.
//!
//! One poller task and one watchdog task run per job, as independent
//! timers against the shared [`JobHandle`]. They share a
//! [`CancellationToken`]: whichever writes the terminal state first
//! cancels the other, and the terminal transition itself is
//! first-write-wins, so the race is safe in both directions.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::jobs::JobHandle;
use crate::models::prediction::PredictionStatus;
use crate::services::generation::PredictionSource;

/// Tunable parameters for the polling loop and its watchdog.
#[derive(Debug, Clone)]
pub struct PollPolicy {
    /// Cadence for the first attempts; most jobs finish here.
    pub fast_interval: Duration,
    pub mid_interval: Duration,
    /// Steady-state cadence for long-running jobs.
    pub slow_interval: Duration,

    /// Last attempt polled at the fast cadence.
    pub fast_until: u32,
    /// Last attempt polled at the mid cadence.
    pub mid_until: u32,

    /// Hard backstop against pathological infinite polling, independent
    /// of the watchdog deadline.
    pub max_attempts: u32,

    /// Consecutive failed status checks tolerated before the job is
    /// marked failed. A successful check resets the streak.
    pub max_transport_failures: u32,

    /// Watchdog deadline for the whole generation.
    pub deadline: Duration,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            fast_interval: Duration::from_secs(1),
            mid_interval: Duration::from_secs(2),
            slow_interval: Duration::from_secs(3),
            fast_until: 10,
            mid_until: 30,
            max_attempts: 250,
            max_transport_failures: 10,
            deadline: Duration::from_secs(90),
        }
    }
}

/// Delay scheduled before attempt `n` (1-indexed).
pub fn interval_for_attempt(attempt: u32, policy: &PollPolicy) -> Duration {
    if attempt <= policy.fast_until {
        policy.fast_interval
    } else if attempt <= policy.mid_until {
        policy.mid_interval
    } else {
        policy.slow_interval
    }
}

/// Poll the prediction behind `job` until a terminal state is reached,
/// the attempt budget runs out, or `cancel` fires.
///
/// Status checks are strictly sequential: a new check is never issued
/// while a previous one is outstanding. Cancellation is observed before
/// every scheduled check, and an in-flight check that resolves after
/// cancellation is discarded without touching the job.
pub async fn drive<S: PredictionSource + Sync>(
    source: &S,
    job: &JobHandle,
    policy: &PollPolicy,
    cancel: &CancellationToken,
) {
    let Some(prediction_id) = job.prediction_id().await else {
        job.fail("job has no prediction id to poll").await;
        cancel.cancel();
        return;
    };

    let mut attempt: u32 = 0;
    let mut failed_checks: u32 = 0;

    loop {
        let delay = interval_for_attempt(attempt + 1, policy);
        tokio::select! {
            _ = cancel.cancelled() => return,
            _ = tokio::time::sleep(delay) => {}
        }

        attempt += 1;

        let checked = tokio::select! {
            _ = cancel.cancelled() => return,
            result = source.get_prediction(&prediction_id) => result,
        };
        if cancel.is_cancelled() {
            // Late response after cancellation: discard.
            return;
        }

        job.record_attempt().await;

        match checked {
            Ok(prediction) => {
                failed_checks = 0;

                match prediction.status {
                    PredictionStatus::Succeeded => {
                        match prediction.output_url() {
                            Some(url) => {
                                job.succeed(url.to_string()).await;
                            }
                            // Success claimed without usable output must
                            // surface as an error, not a silent pass.
                            None => {
                                job.fail("the model reported success but returned no usable output")
                                    .await;
                            }
                        }
                        cancel.cancel();
                        return;
                    }
                    PredictionStatus::Failed | PredictionStatus::Canceled => {
                        let message = prediction
                            .error
                            .unwrap_or_else(|| format!("generation {}", prediction.status));
                        job.fail(message).await;
                        cancel.cancel();
                        return;
                    }
                    PredictionStatus::Starting | PredictionStatus::Processing => {
                        tracing::debug!(
                            job_id = %job.id(),
                            attempt,
                            status = %prediction.status,
                            "prediction still pending"
                        );
                    }
                }
            }
            Err(error) => {
                failed_checks += 1;
                tracing::warn!(
                    job_id = %job.id(),
                    attempt,
                    streak = failed_checks,
                    error = %error,
                    "status check failed"
                );

                if failed_checks >= policy.max_transport_failures {
                    job.fail("communication failure: repeated status checks did not reach the generation API")
                        .await;
                    cancel.cancel();
                    return;
                }
            }
        }

        if attempt >= policy.max_attempts {
            job.fail("generation did not finish within the polling budget")
                .await;
            cancel.cancel();
            return;
        }
    }
}

/// Deadline watchdog: forces `TimedOut` and cancels the poller if the job
/// has not reached a terminal state in time. One watchdog per job.
pub fn spawn_watchdog(
    job: JobHandle,
    deadline: Duration,
    cancel: CancellationToken,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(deadline) => {
                job.time_out("the server is taking too long to generate a preview; please try again")
                    .await;
                cancel.cancel();
            }
        }
    })
}
