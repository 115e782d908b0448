use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;

use crate::app_state::AppState;
use crate::models::lead::{LeadRecord, LeadRequest, LeadResponse};
use crate::routes::{error, error_with_details, ApiError};
use crate::services::leads::LeadError;

/// POST /api/leads — validate and forward a lead to the record store.
pub async fn submit_lead(
    State(state): State<AppState>,
    Json(request): Json<LeadRequest>,
) -> Result<Json<LeadResponse>, ApiError> {
    request.validate().map_err(|e| {
        error_with_details(StatusCode::BAD_REQUEST, "email is required", e.to_string())
    })?;

    let record = LeadRecord::from(&request);
    let result = state.leads.submit(&record).await;

    if result.is_err() {
        metrics::counter!("lead_submissions_failed_total").increment(1);
    }

    match result {
        Ok(stored) => {
            metrics::counter!("leads_captured_total").increment(1);
            tracing::info!(record_id = %stored.id, "lead captured");
            Ok(Json(LeadResponse {
                success: true,
                id: stored.id,
            }))
        }
        Err(LeadError::Timeout) => {
            tracing::error!("record store timed out, lead not captured");
            Err(error(
                StatusCode::GATEWAY_TIMEOUT,
                "record store connection timeout",
            ))
        }
        Err(LeadError::Rejected { status, details }) => {
            tracing::error!(status, "record store rejected lead");
            Err(error_with_details(
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                "record store rejection",
                details,
            ))
        }
        Err(e @ LeadError::Transport(_)) => {
            tracing::error!(error = %e, "record store unreachable");
            Err(error_with_details(
                StatusCode::BAD_GATEWAY,
                "record store unreachable",
                e.to_string(),
            ))
        }
    }
}
