use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::flashcards::service::{self, FlashcardContent, FlashcardList, FlashcardListParams};
use crate::models::flashcard::FlashcardRow;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /flashcards
pub async fn handle_list_flashcards(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    params: Result<Query<FlashcardListParams>, QueryRejection>,
) -> Result<Json<FlashcardList>, AppError> {
    let Query(params) = params?;
    let query = params.validate()?;
    Ok(Json(service::list_flashcards(&state, user_id, query).await?))
}

/// GET /flashcards/:id
pub async fn handle_get_flashcard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<FlashcardRow>, AppError> {
    let Path(id) = id?;
    Ok(Json(service::get_flashcard(&state, user_id, id).await?))
}

/// POST /flashcards
pub async fn handle_create_flashcard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<FlashcardContent>, JsonRejection>,
) -> Result<(StatusCode, Json<FlashcardRow>), AppError> {
    let Json(content) = payload?;
    let card = service::create_flashcard(&state, user_id, &content).await?;
    Ok((StatusCode::CREATED, Json(card)))
}

/// PUT /flashcards/:id
pub async fn handle_update_flashcard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<FlashcardContent>, JsonRejection>,
) -> Result<Json<FlashcardRow>, AppError> {
    let Path(id) = id?;
    let Json(content) = payload?;
    Ok(Json(
        service::update_flashcard(&state, user_id, id, &content).await?,
    ))
}

/// DELETE /flashcards/:id
pub async fn handle_delete_flashcard(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<Value>, AppError> {
    let Path(id) = id?;
    service::delete_flashcard(&state, user_id, id).await?;
    Ok(Json(json!({ "message": "Flashcard deleted successfully" })))
}
