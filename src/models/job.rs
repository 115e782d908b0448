use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::Display;
use uuid::Uuid;

/// Lifecycle state of a generation job.
///
/// States only move forward: `Idle → Submitting → Pending` and then into
/// exactly one terminal state. Terminal states never transition again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum JobState {
    Idle,
    Submitting,
    Pending,
    Succeeded,
    Failed,
    TimedOut,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            JobState::Succeeded | JobState::Failed | JobState::TimedOut
        )
    }

    /// Check if transition from this state to target is valid.
    pub fn can_transition_to(&self, target: JobState) -> bool {
        match (self, target) {
            (JobState::Idle, JobState::Submitting) => true,

            // Submission either yields a prediction id or is rejected outright.
            (JobState::Submitting, JobState::Pending) => true,
            (JobState::Submitting, JobState::Failed) => true,

            (JobState::Pending, JobState::Succeeded) => true,
            (JobState::Pending, JobState::Failed) => true,
            (JobState::Pending, JobState::TimedOut) => true,

            // Terminal states cannot transition.
            _ => false,
        }
    }
}

/// One outstanding request to the hosted image-generation service.
///
/// `result` is set only when `Succeeded`; `error` only when `Failed` or
/// `TimedOut`. Both stay unset while the job is live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    /// Opaque id assigned by the external service; immutable once set.
    pub prediction_id: Option<String>,
    pub state: JobState,
    /// Number of status checks performed so far.
    pub attempts: u32,
    pub result: Option<String>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            prediction_id: None,
            state: JobState::Idle,
            attempts: 0,
            result: None,
            error: None,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// `Idle → Submitting`, on request dispatch.
    pub fn begin_submission(&mut self) -> bool {
        self.transition(JobState::Submitting)
    }

    /// `Submitting → Pending` once the external service handed back an id.
    pub fn assign_prediction(&mut self, prediction_id: String) -> bool {
        if self.prediction_id.is_some() || !self.transition(JobState::Pending) {
            return false;
        }
        self.prediction_id = Some(prediction_id);
        true
    }

    /// Count one status check. Monotonically increasing.
    pub fn record_attempt(&mut self) -> u32 {
        self.attempts += 1;
        self.attempts
    }

    /// Terminal transition to `Succeeded`. First write wins; a repeated
    /// delivery of the same outcome is a no-op and returns `false`.
    pub fn succeed(&mut self, output: String) -> bool {
        if !self.transition(JobState::Succeeded) {
            return false;
        }
        self.result = Some(output);
        self.finished_at = Some(Utc::now());
        true
    }

    /// Terminal transition to `Failed`. First write wins.
    pub fn fail(&mut self, message: impl Into<String>) -> bool {
        if !self.transition(JobState::Failed) {
            return false;
        }
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
        true
    }

    /// Terminal transition to `TimedOut`. First write wins.
    pub fn time_out(&mut self, message: impl Into<String>) -> bool {
        if !self.transition(JobState::TimedOut) {
            return false;
        }
        self.error = Some(message.into());
        self.finished_at = Some(Utc::now());
        true
    }

    fn transition(&mut self, target: JobState) -> bool {
        if !self.state.can_transition_to(target) {
            return false;
        }
        self.state = target;
        true
    }

    /// Serializable snapshot handed to API clients.
    pub fn view(&self) -> JobView {
        JobView {
            job_id: self.id,
            status: self.state,
            attempts: self.attempts,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

impl Default for Job {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time view of a job, returned by the status endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobView {
    pub job_id: Uuid,
    pub status: JobState,
    pub attempts: u32,
    pub result: Option<String>,
    pub error: Option<String>,
}
