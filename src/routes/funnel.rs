use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use garde::Validate;
use serde::Serialize;
use uuid::Uuid;

use crate::app_state::AppState;
use crate::funnel::{FunnelSnapshot, FunnelState, FunnelUpdate};
use crate::jobs::JobHandle;
use crate::models::generation::{
    decode_image_data_url, GenerateRequest, GenerateResponse, ImageRefError,
};
use crate::models::job::{Job, JobView};
use crate::routes::{error, error_with_details, ApiError};
use crate::services::generation::GenerationError;
use crate::services::poller;

#[derive(Debug, Serialize)]
pub struct SessionCreated {
    pub id: Uuid,
}

/// POST /api/funnel — open a new funnel session.
pub async fn create_session(State(state): State<AppState>) -> (StatusCode, Json<SessionCreated>) {
    let id = state.sessions.create().await;
    tracing::info!(session_id = %id, "funnel session created");
    (StatusCode::CREATED, Json(SessionCreated { id }))
}

/// GET /api/funnel/{id} — session snapshot, including the active job.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FunnelSnapshot>, ApiError> {
    let session = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "funnel session not found"))?;
    let mut session = session.lock().await;

    let job = match session.active_job {
        Some(job_id) => state.jobs.get(job_id).await,
        None => None,
    };
    let job_view = match &job {
        Some(handle) => Some(handle.snapshot().await),
        None => None,
    };

    // Fold a freshly terminal job into the funnel; no-op on repeat reads.
    if let Some(view) = &job_view {
        session.state.apply_outcome(view);
    }

    Ok(Json(FunnelSnapshot {
        id: session.id,
        state: session.state.clone(),
        job: job_view,
    }))
}

/// PATCH /api/funnel/{id} — typed partial update of the funnel state.
pub async fn update_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(update): Json<FunnelUpdate>,
) -> Result<Json<FunnelState>, ApiError> {
    update.validate().map_err(|e| {
        error_with_details(StatusCode::BAD_REQUEST, "invalid funnel update", e.to_string())
    })?;

    let session = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "funnel session not found"))?;
    let mut session = session.lock().await;

    session.state.apply(update);
    Ok(Json(session.state.clone()))
}

/// POST /api/funnel/{id}/generate — submit a prediction and start polling.
///
/// Validation happens before any network call; a session with a poller
/// still running gets it cancelled before the new job starts.
pub async fn start_generation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<GenerateRequest>,
) -> Result<(StatusCode, Json<GenerateResponse>), ApiError> {
    request.validate().map_err(|e| {
        error_with_details(
            StatusCode::BAD_REQUEST,
            "invalid generation request",
            e.to_string(),
        )
    })?;

    decode_image_data_url(&request.image).map_err(|e| match &e {
        ImageRefError::UnknownFormat => error(StatusCode::UNSUPPORTED_MEDIA_TYPE, e.to_string()),
        _ => error_with_details(StatusCode::BAD_REQUEST, "invalid image", e.to_string()),
    })?;

    let session_handle = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "funnel session not found"))?;

    let handle = JobHandle::new(Job::new());
    state.jobs.insert(handle.clone()).await;
    metrics::counter!("generation_jobs_total").increment(1);

    let cancel = {
        let mut session = session_handle.lock().await;
        session.state.apply(FunnelUpdate {
            image: Some(request.image.clone()),
            style: Some(request.style.clone()),
            zone: Some(request.zone.clone()),
            ..Default::default()
        });
        session.start_job(handle.id())
    };

    handle.begin_submission().await;
    tracing::info!(
        session_id = %id,
        job_id = %handle.id(),
        style = %request.style,
        zone = %request.zone,
        "starting generation"
    );

    match state
        .generation
        .create_prediction(&request.image, &request.style, &request.zone)
        .await
    {
        Ok(prediction) => {
            handle.assign_prediction(prediction.id).await;

            // Independent timers against the shared job: the watchdog
            // enforces the deadline, the poller drives status checks.
            let policy = state.poll_policy.clone();
            poller::spawn_watchdog(handle.clone(), policy.deadline, cancel.clone());

            let client = state.generation.clone();
            let poll_job = handle.clone();
            tokio::spawn(async move {
                poller::drive(client.as_ref(), &poll_job, &policy, &cancel).await;
            });

            Ok((
                StatusCode::ACCEPTED,
                Json(GenerateResponse {
                    job_id: handle.id(),
                    status: handle.state().await,
                    message: "generation started".to_string(),
                }),
            ))
        }
        Err(e) => {
            // Surface the upstream message verbatim on the job; no polling
            // starts and no retry happens at this layer.
            let message = match &e {
                GenerationError::Rejected { message, .. } => message.clone(),
                other => other.to_string(),
            };
            handle.fail(message).await;
            cancel.cancel();

            let view = handle.snapshot().await;
            session_handle.lock().await.state.apply_outcome(&view);

            Err(error_with_details(
                StatusCode::BAD_GATEWAY,
                "could not start generation",
                e.to_string(),
            ))
        }
    }
}

/// POST /api/funnel/{id}/cancel — stop polling for this session.
///
/// Idempotent: cancelling a session with no active poller, or one whose
/// job already finished, changes nothing.
pub async fn cancel_generation(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<FunnelState>, ApiError> {
    let session = state
        .sessions
        .get(id)
        .await
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "funnel session not found"))?;
    let mut session = session.lock().await;

    session.abandon_generation();
    tracing::info!(session_id = %id, "generation abandoned");

    Ok(Json(session.state.clone()))
}

/// GET /api/jobs/{id} — job snapshot.
pub async fn get_job(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<JobView>, ApiError> {
    let handle = state
        .jobs
        .get(id)
        .await
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "job not found"))?;

    Ok(Json(handle.snapshot().await))
}
