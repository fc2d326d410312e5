//! Axum route handlers for the Generation API.

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::generation::service::{
    self, AcceptRequest, AcceptResponse, GenerateRequest, GenerationList, GenerationResponse,
};
use crate::models::PageParams;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /generations
///
/// Generates flashcard suggestions from 1000–10000 characters of source text.
/// Suggestions are not saved as flashcards until accepted.
pub async fn handle_generate(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<GenerateRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<GenerationResponse>), AppError> {
    let Json(request) = payload?;
    let response = service::create_generation_session(&state, user_id, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /generations/:session_id/accept
pub async fn handle_accept(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    session_id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<AcceptRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<AcceptResponse>), AppError> {
    let Path(session_id) = session_id?;
    let Json(request) = payload?;
    let response = service::accept_flashcards(&state, user_id, session_id, &request).await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// GET /generations
pub async fn handle_list_generations(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    params: Result<Query<PageParams>, QueryRejection>,
) -> Result<Json<GenerationList>, AppError> {
    let Query(params) = params?;
    let (page, limit) = params.validate()?;
    Ok(Json(
        service::list_generations(&state, user_id, page, limit).await?,
    ))
}
