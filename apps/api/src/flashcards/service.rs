use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::flashcards::validation::{required_text, MANUAL_BACK_MAX, MANUAL_FRONT_MAX};
use crate::models::flashcard::{
    FlashcardListQuery, FlashcardRow, FlashcardSource, NewFlashcard, SortField, SortOrder,
};
use crate::models::{PageParams, Pagination};
use crate::state::AppState;

/// Raw `GET /flashcards` query string; every field is checked by `validate`.
#[derive(Debug, Default, Deserialize)]
pub struct FlashcardListParams {
    pub page: Option<String>,
    pub limit: Option<String>,
    pub source: Option<String>,
    pub sort: Option<String>,
    pub order: Option<String>,
}

impl FlashcardListParams {
    pub fn validate(self) -> Result<FlashcardListQuery, AppError> {
        let page = parse_number("page", self.page.as_deref())?;
        let limit = parse_number("limit", self.limit.as_deref())?;
        let (page, limit) = PageParams { page, limit }.validate()?;

        let source = match self.source.as_deref() {
            None => None,
            Some("ai") => Some(FlashcardSource::Ai),
            Some("manual") => Some(FlashcardSource::Manual),
            Some(_) => return Err(AppError::invalid_field("source", "must be 'ai' or 'manual'")),
        };
        let sort = match self.sort.as_deref() {
            None | Some("created_at") => SortField::CreatedAt,
            Some("updated_at") => SortField::UpdatedAt,
            Some("next_review_date") => SortField::NextReviewDate,
            Some(_) => {
                return Err(AppError::invalid_field(
                    "sort",
                    "must be one of created_at, updated_at, next_review_date",
                ))
            }
        };
        let order = match self.order.as_deref() {
            None | Some("desc") => SortOrder::Desc,
            Some("asc") => SortOrder::Asc,
            Some(_) => return Err(AppError::invalid_field("order", "must be 'asc' or 'desc'")),
        };

        Ok(FlashcardListQuery {
            page,
            limit,
            source,
            sort,
            order,
        })
    }
}

fn parse_number(field: &str, raw: Option<&str>) -> Result<Option<u32>, AppError> {
    raw.map(|v| {
        v.trim()
            .parse::<u32>()
            .map_err(|_| AppError::invalid_field(field, "must be a positive integer"))
    })
    .transpose()
}

#[derive(Debug, Deserialize)]
pub struct FlashcardContent {
    pub front: String,
    pub back: String,
}

impl FlashcardContent {
    /// Trimmed `(front, back)`, front 1–500 and back 1–1000 characters.
    fn validate(&self) -> Result<(&str, &str), AppError> {
        Ok((
            required_text("front", &self.front, MANUAL_FRONT_MAX)?,
            required_text("back", &self.back, MANUAL_BACK_MAX)?,
        ))
    }
}

#[derive(Debug, Serialize)]
pub struct FlashcardList {
    pub data: Vec<FlashcardRow>,
    pub pagination: Pagination,
}

pub async fn list_flashcards(
    state: &AppState,
    user_id: Uuid,
    query: FlashcardListQuery,
) -> Result<FlashcardList, AppError> {
    let (data, total) = state.flashcards.list_flashcards(user_id, &query).await?;
    Ok(FlashcardList {
        data,
        pagination: Pagination::new(query.page, query.limit, total),
    })
}

pub async fn get_flashcard(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
) -> Result<FlashcardRow, AppError> {
    state
        .flashcards
        .get_flashcard(id, user_id)
        .await?
        .ok_or_else(|| flashcard_not_found(id))
}

/// Creates a manual flashcard, due today.
pub async fn create_flashcard(
    state: &AppState,
    user_id: Uuid,
    content: &FlashcardContent,
) -> Result<FlashcardRow, AppError> {
    let (front, back) = content.validate()?;
    let created = state
        .flashcards
        .create_flashcards(user_id, &[NewFlashcard::manual(front, back)])
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Insert returned no flashcard")))?;

    info!("Created manual flashcard {} for user {}", created.id, user_id);
    Ok(created)
}

/// Replaces front/back. Scheduling state is kept as is.
pub async fn update_flashcard(
    state: &AppState,
    user_id: Uuid,
    id: Uuid,
    content: &FlashcardContent,
) -> Result<FlashcardRow, AppError> {
    let (front, back) = content.validate()?;
    state
        .flashcards
        .update_flashcard_content(id, user_id, front, back)
        .await?
        .ok_or_else(|| flashcard_not_found(id))
}

pub async fn delete_flashcard(state: &AppState, user_id: Uuid, id: Uuid) -> Result<(), AppError> {
    if !state.flashcards.delete_flashcard(id, user_id).await? {
        return Err(flashcard_not_found(id));
    }
    info!("Deleted flashcard {id}");
    Ok(())
}

fn flashcard_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Flashcard {id} not found"))
}
