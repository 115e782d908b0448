//! Funnel session state.
//!
//! The multi-step form data lives in one explicit container,
//! [`FunnelState`], owned by the session store and updated only through
//! typed partial updates ([`FunnelUpdate`]) and the single terminal-outcome
//! fold ([`FunnelState::apply_outcome`]). No ambient globals.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use strum::Display;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::job::{JobState, JobView};

/// UI-facing status of a funnel session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum FunnelStatus {
    Idle,
    Generating,
    Success,
    Error,
}

/// Everything the funnel collects across its steps.
#[derive(Debug, Clone, Serialize)]
pub struct FunnelState {
    /// Room photo as a data URL.
    pub image: Option<String>,
    pub style: String,
    pub zone: String,
    pub remodel_date: Option<String>,
    pub objective: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub output_image: Option<String>,
    pub status: FunnelStatus,
    pub error_message: Option<String>,
}

impl Default for FunnelState {
    fn default() -> Self {
        Self {
            image: None,
            style: "Moderno".to_string(),
            zone: "Sala".to_string(),
            remodel_date: None,
            objective: None,
            name: None,
            email: None,
            output_image: None,
            status: FunnelStatus::Idle,
            error_message: None,
        }
    }
}

/// Typed partial update; `None` fields leave the state untouched.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct FunnelUpdate {
    #[garde(inner(length(min = 1)))]
    pub image: Option<String>,

    #[garde(inner(length(min = 1, max = 80)))]
    pub style: Option<String>,

    #[garde(inner(length(min = 1, max = 80)))]
    pub zone: Option<String>,

    #[garde(inner(length(min = 1, max = 120)))]
    pub remodel_date: Option<String>,

    #[garde(inner(length(min = 1, max = 120)))]
    pub objective: Option<String>,

    #[garde(inner(length(min = 1, max = 120)))]
    pub name: Option<String>,

    #[garde(inner(email, length(max = 254)))]
    pub email: Option<String>,
}

impl FunnelState {
    pub fn apply(&mut self, update: FunnelUpdate) {
        if let Some(image) = update.image {
            self.image = Some(image);
        }
        if let Some(style) = update.style {
            self.style = style;
        }
        if let Some(zone) = update.zone {
            self.zone = zone;
        }
        if let Some(remodel_date) = update.remodel_date {
            self.remodel_date = Some(remodel_date);
        }
        if let Some(objective) = update.objective {
            self.objective = Some(objective);
        }
        if let Some(name) = update.name {
            self.name = Some(name);
        }
        if let Some(email) = update.email {
            self.email = Some(email);
        }
    }

    /// Reset result fields when a new generation starts.
    pub fn begin_generation(&mut self) {
        self.status = FunnelStatus::Generating;
        self.output_image = None;
        self.error_message = None;
    }

    /// Fold a terminal job outcome into the funnel.
    ///
    /// Fires at most once per generation: repeated deliveries of the same
    /// terminal snapshot return `false` and change nothing, so downstream
    /// side effects never run twice.
    pub fn apply_outcome(&mut self, job: &JobView) -> bool {
        if self.status != FunnelStatus::Generating {
            return false;
        }

        match job.status {
            JobState::Succeeded => {
                self.output_image = job.result.clone();
                self.status = FunnelStatus::Success;
                true
            }
            JobState::Failed | JobState::TimedOut => {
                self.error_message = Some(
                    job.error
                        .clone()
                        .unwrap_or_else(|| "generation failed".to_string()),
                );
                self.status = FunnelStatus::Error;
                true
            }
            _ => false,
        }
    }
}

/// One visitor's pass through the funnel.
#[derive(Debug)]
pub struct FunnelSession {
    pub id: Uuid,
    pub state: FunnelState,
    pub active_job: Option<Uuid>,
    cancel: Option<CancellationToken>,
    pub created_at: DateTime<Utc>,
}

impl FunnelSession {
    fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: FunnelState::default(),
            active_job: None,
            cancel: None,
            created_at: Utc::now(),
        }
    }

    /// Make `job_id` the session's active job and hand back its
    /// cancellation token.
    ///
    /// At most one job polls per session: any poller still running for a
    /// previous job is cancelled here before the new one starts.
    pub fn start_job(&mut self, job_id: Uuid) -> CancellationToken {
        if let Some(previous) = self.cancel.take() {
            previous.cancel();
        }

        let token = CancellationToken::new();
        self.cancel = Some(token.clone());
        self.active_job = Some(job_id);
        self.state.begin_generation();
        token
    }

    /// Stop the active poller, if any. Safe to call repeatedly.
    pub fn cancel_active_job(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel.cancel();
        }
    }

    /// Visitor navigated away from the result view: stop polling and
    /// return the funnel to idle. A finished generation keeps its result.
    pub fn abandon_generation(&mut self) {
        self.cancel_active_job();
        if self.state.status == FunnelStatus::Generating {
            self.state.status = FunnelStatus::Idle;
        }
    }
}

/// Snapshot returned to the funnel page.
#[derive(Debug, Serialize)]
pub struct FunnelSnapshot {
    pub id: Uuid,
    pub state: FunnelState,
    pub job: Option<JobView>,
}

/// All live funnel sessions, keyed by session id.
#[derive(Clone, Default)]
pub struct SessionStore {
    sessions: Arc<RwLock<HashMap<Uuid, Arc<Mutex<FunnelSession>>>>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> Uuid {
        let session = FunnelSession::new();
        let id = session.id;
        self.sessions
            .write()
            .await
            .insert(id, Arc::new(Mutex::new(session)));
        id
    }

    pub async fn get(&self, id: Uuid) -> Option<Arc<Mutex<FunnelSession>>> {
        self.sessions.read().await.get(&id).cloned()
    }
}
