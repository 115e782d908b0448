use std::sync::Arc;

use crate::funnel::SessionStore;
use crate::jobs::JobRegistry;
use crate::services::{
    generation::GenerationClient,
    leads::LeadStoreClient,
    poller::PollPolicy,
};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub generation: Arc<GenerationClient>,
    pub leads: Arc<LeadStoreClient>,
    pub jobs: JobRegistry,
    pub sessions: SessionStore,
    pub poll_policy: Arc<PollPolicy>,
}

impl AppState {
    pub fn new(
        generation: GenerationClient,
        leads: LeadStoreClient,
        poll_policy: PollPolicy,
    ) -> Self {
        Self {
            generation: Arc::new(generation),
            leads: Arc::new(leads),
            jobs: JobRegistry::new(),
            sessions: SessionStore::new(),
            poll_policy: Arc::new(poll_policy),
        }
    }
}
