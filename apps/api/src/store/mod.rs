//! Persistence seams. Services only see these traits; `PgStore` backs them in
//! production and `MemoryStore` in tests.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

use crate::models::flashcard::{FlashcardListQuery, FlashcardRow, NewFlashcard, SourceCounts};
use crate::models::generation::{GenerationSessionRow, GenerationTotals};
use crate::models::learning::{LearningSessionRow, ReviewCommit};

#[cfg(test)]
pub mod memory;
pub mod postgres;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Database(#[from] sqlx::Error),

    #[error("{field} = {value} does not fit an INTEGER column")]
    CountOutOfRange { field: &'static str, value: u32 },
}

/// Narrows a count to the `INTEGER` columns it is stored in.
pub fn db_count(field: &'static str, value: u32) -> Result<i32, StoreError> {
    i32::try_from(value).map_err(|_| StoreError::CountOutOfRange { field, value })
}

#[async_trait]
pub trait FlashcardStore: Send + Sync {
    /// Ids of the user's cards due on `as_of` (or never scheduled), never-scheduled
    /// and earliest-due first, at most `limit`.
    async fn find_due_flashcards(
        &self,
        user_id: Uuid,
        as_of: NaiveDate,
        limit: u32,
    ) -> Result<Vec<Uuid>, StoreError>;

    async fn get_flashcard(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<FlashcardRow>, StoreError>;

    /// One page of the user's collection plus the total row count.
    async fn list_flashcards(
        &self,
        user_id: Uuid,
        query: &FlashcardListQuery,
    ) -> Result<(Vec<FlashcardRow>, u64), StoreError>;

    async fn create_flashcards(
        &self,
        user_id: Uuid,
        cards: &[NewFlashcard],
    ) -> Result<Vec<FlashcardRow>, StoreError>;

    /// Replaces front/back only. Review state is left as is.
    async fn update_flashcard_content(
        &self,
        id: Uuid,
        user_id: Uuid,
        front: &str,
        back: &str,
    ) -> Result<Option<FlashcardRow>, StoreError>;

    /// Returns false when no such card belongs to the user.
    async fn delete_flashcard(&self, id: Uuid, user_id: Uuid) -> Result<bool, StoreError>;

    async fn count_by_source(&self, user_id: Uuid) -> Result<SourceCounts, StoreError>;

    /// Writes the flashcard's new review state, appends the review record and
    /// increments the session's `flashcards_reviewed`, all or nothing.
    async fn commit_review(&self, commit: &ReviewCommit) -> Result<(), StoreError>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn create_session(&self, user_id: Uuid) -> Result<LearningSessionRow, StoreError>;

    async fn get_session(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<LearningSessionRow>, StoreError>;

    /// Stamps `ended_at` if it is still null and returns the resulting row.
    async fn end_session(
        &self,
        id: Uuid,
        user_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<LearningSessionRow>, StoreError>;

    /// Newest first.
    async fn list_sessions(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<LearningSessionRow>, u64), StoreError>;
}

#[async_trait]
pub trait GenerationStore: Send + Sync {
    async fn create_generation(
        &self,
        user_id: Uuid,
        source_text: &str,
    ) -> Result<GenerationSessionRow, StoreError>;

    async fn complete_generation(
        &self,
        id: Uuid,
        model_name: &str,
        llm_response: &Value,
        generated_count: u32,
    ) -> Result<(), StoreError>;

    async fn get_generation(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GenerationSessionRow>, StoreError>;

    async fn record_acceptance(
        &self,
        id: Uuid,
        accepted_count: u32,
        rejected_count: u32,
    ) -> Result<(), StoreError>;

    /// Newest first.
    async fn list_generations(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<GenerationSessionRow>, u64), StoreError>;

    async fn generation_totals(&self, user_id: Uuid) -> Result<GenerationTotals, StoreError>;
}
