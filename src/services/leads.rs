use std::time::Duration;

use reqwest::Client;

use crate::models::lead::{LeadRecord, StoredLead};

/// Client for the external record store that keeps captured leads.
pub struct LeadStoreClient {
    http: Client,
    base_url: String,
    collection: String,
    timeout: Duration,
}

impl LeadStoreClient {
    pub fn new(base_url: &str, collection: &str, timeout: Duration) -> Self {
        Self {
            http: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            collection: collection.to_string(),
            timeout,
        }
    }

    /// Forward one lead to the record store.
    ///
    /// The call is bounded by the configured timeout so an unreachable
    /// store never hangs the form. Rejections carry the store's original
    /// response body in `details`.
    pub async fn submit(&self, record: &LeadRecord) -> Result<StoredLead, LeadError> {
        let url = format!(
            "{}/api/collections/{}/records",
            self.base_url, self.collection
        );

        let response = self
            .http
            .post(&url)
            .timeout(self.timeout)
            .json(record)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LeadError::Timeout
                } else {
                    LeadError::Transport(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let details = response.text().await.unwrap_or_else(|_| String::new());
            return Err(LeadError::Rejected {
                status: status.as_u16(),
                details,
            });
        }

        let stored = response.json::<StoredLead>().await?;
        Ok(stored)
    }

    /// Check record-store reachability (for health checks).
    pub async fn health_check(&self) -> Result<(), LeadError> {
        let url = format!("{}/api/health", self.base_url);

        self.http
            .get(&url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LeadError::Timeout
                } else {
                    LeadError::Transport(e)
                }
            })?
            .error_for_status()
            .map_err(LeadError::Transport)?;

        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LeadError {
    #[error("request to record store failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("record store did not respond within the timeout")]
    Timeout,

    #[error("record store rejected the lead ({status})")]
    Rejected { status: u16, details: String },
}
