use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Interval assigned to a card that has never been reviewed.
pub const INITIAL_INTERVAL: i32 = 0;
/// Ease factor assigned to a new card.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "flashcard_source", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FlashcardSource {
    Ai,
    Manual,
}

/// A flashcard row. Serializes without `user_id`, so it doubles as the API DTO.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FlashcardRow {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
    pub generation_session_id: Option<Uuid>,
    pub interval: i32,
    pub ease_factor: f64,
    pub repetition_count: i32,
    pub next_review_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Content for a flashcard about to be inserted. Review state is always the
/// initial one: interval 0, ease 2.5, no repetitions, due on creation day.
#[derive(Debug, Clone)]
pub struct NewFlashcard {
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
    pub generation_session_id: Option<Uuid>,
}

impl NewFlashcard {
    pub fn manual(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            source: FlashcardSource::Manual,
            generation_session_id: None,
        }
    }

    pub fn from_generation(
        generation_session_id: Uuid,
        front: impl Into<String>,
        back: impl Into<String>,
    ) -> Self {
        Self {
            front: front.into(),
            back: back.into(),
            source: FlashcardSource::Ai,
            generation_session_id: Some(generation_session_id),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortField {
    #[default]
    CreatedAt,
    UpdatedAt,
    NextReviewDate,
}

impl SortField {
    pub fn column(self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::NextReviewDate => "next_review_date",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Validated listing parameters for a user's collection.
#[derive(Debug, Clone)]
pub struct FlashcardListQuery {
    pub page: u32,
    pub limit: u32,
    pub source: Option<FlashcardSource>,
    pub sort: SortField,
    pub order: SortOrder,
}

/// Number of flashcards per provenance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceCounts {
    pub ai: u64,
    pub manual: u64,
}
