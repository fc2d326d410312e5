use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use bytes::Bytes;
use serde::Deserialize;
use serde_json::Value;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::learning::scheduler::Rating;
use crate::learning::service::{
    self, EndSessionResponse, LearningSessionList, NextFlashcardResponse, StartSessionResponse,
    SubmitReviewResponse, DEFAULT_SESSION_LIMIT, MAX_SESSION_LIMIT,
};
use crate::models::PageParams;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ReviewRequest {
    pub flashcard_id: Uuid,
    pub rating: i64,
}

/// Reads `limit` from an optional JSON body. Anything missing, malformed or out
/// of range means the default.
fn session_limit(body: &[u8]) -> u32 {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("limit").and_then(Value::as_u64))
        .filter(|limit| (1..=MAX_SESSION_LIMIT as u64).contains(limit))
        .map_or(DEFAULT_SESSION_LIMIT, |limit| limit as u32)
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /learning-sessions
pub async fn handle_start_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    body: Bytes,
) -> Result<(StatusCode, Json<StartSessionResponse>), AppError> {
    let limit = session_limit(&body);
    let response = service::start_session(&state, user_id, limit).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /learning-sessions
pub async fn handle_list_sessions(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<LearningSessionList>, AppError> {
    let Query(params) = params?;
    let (page, limit) = params.validate()?;
    Ok(Json(
        service::list_sessions(&state, user_id, page, limit).await?,
    ))
}

/// GET /learning-sessions/:id/next
pub async fn handle_next_flashcard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    session_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<NextFlashcardResponse>, AppError> {
    let Path(session_id) = session_id?;
    Ok(Json(
        service::next_flashcard(&state, user_id, session_id).await?,
    ))
}

/// POST /learning-sessions/:id/review
pub async fn handle_submit_review(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    session_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<ReviewRequest>, JsonRejection>,
) -> Result<Json<SubmitReviewResponse>, AppError> {
    let Path(session_id) = session_id?;
    let Json(req) = payload?;
    let rating = Rating::try_from(req.rating)?;

    Ok(Json(
        service::submit_review(&state, user_id, session_id, req.flashcard_id, rating).await?,
    ))
}

/// PATCH /learning-sessions/:id/end
pub async fn handle_end_session(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    session_id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<EndSessionResponse>, AppError> {
    let Path(session_id) = session_id?;
    Ok(Json(service::end_session(&state, user_id, session_id).await?))
}
