pub mod funnel;
pub mod health;
pub mod leads;
pub mod metrics;

use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::app_state::AppState;

/// JSON error body shared by all handlers: `{"error": ..., "details": ...}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

pub type ApiError = (StatusCode, Json<ErrorBody>);

pub fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
            details: None,
        }),
    )
}

pub fn error_with_details(
    status: StatusCode,
    message: impl Into<String>,
    details: impl Into<String>,
) -> ApiError {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
            details: Some(details.into()),
        }),
    )
}

/// Build the application router (everything except the metrics endpoint,
/// which carries its own state).
pub fn router(state: AppState) -> Router {
    Router::new()
        // Static funnel page (embedded at compile time)
        .route("/", get(|| async { Html(include_str!("../../static/index.html")) }))
        .route("/health", get(health::health_check))
        .route("/api/funnel", post(funnel::create_session))
        .route(
            "/api/funnel/{id}",
            get(funnel::get_session).patch(funnel::update_session),
        )
        .route("/api/funnel/{id}/generate", post(funnel::start_generation))
        .route("/api/funnel/{id}/cancel", post(funnel::cancel_generation))
        .route("/api/jobs/{id}", get(funnel::get_job))
        .route("/api/leads", post(leads::submit_lead))
        .with_state(state)
}
