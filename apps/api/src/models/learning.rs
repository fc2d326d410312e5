use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A persisted learning session. `ended_at` is set once and then kept.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LearningSessionRow {
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub user_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub flashcards_reviewed: i32,
}

/// Immutable audit record of one rating submission.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FlashcardReviewRow {
    pub id: Uuid,
    pub flashcard_id: Uuid,
    pub learning_session_id: Uuid,
    pub rating: i16,
    pub previous_interval: i32,
    pub new_interval: i32,
    pub reviewed_at: DateTime<Utc>,
}

/// Everything one rating submission writes: the flashcard's new review state,
/// the review record, and the session counter bump.
#[derive(Debug, Clone)]
pub struct ReviewCommit {
    pub session_id: Uuid,
    pub flashcard_id: Uuid,
    pub rating: i16,
    pub previous_interval: i32,
    pub new_interval: i32,
    pub new_ease_factor: f64,
    pub next_review_date: NaiveDate,
    pub repetition_count: i32,
    pub reviewed_at: DateTime<Utc>,
}
