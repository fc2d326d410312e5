use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde_json::Value;
use sqlx::PgPool;
use tracing::debug;
use uuid::Uuid;

use crate::models::flashcard::{
    FlashcardListQuery, FlashcardRow, FlashcardSource, NewFlashcard, SortOrder, SourceCounts,
    INITIAL_EASE_FACTOR, INITIAL_INTERVAL,
};
use crate::models::generation::{GenerationSessionRow, GenerationTotals, PENDING_MODEL_NAME};
use crate::models::learning::{LearningSessionRow, ReviewCommit};
use crate::models::Pagination;
use crate::store::{db_count, FlashcardStore, GenerationStore, SessionStore, StoreError};

/// PostgreSQL-backed implementation of every store trait.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FlashcardStore for PgStore {
    async fn find_due_flashcards(
        &self,
        user_id: Uuid,
        as_of: NaiveDate,
        limit: u32,
    ) -> Result<Vec<Uuid>, StoreError> {
        Ok(sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM flashcards
            WHERE user_id = $1
              AND (next_review_date IS NULL OR next_review_date <= $2)
            ORDER BY next_review_date ASC NULLS FIRST, created_at ASC, id ASC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(as_of)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn get_flashcard(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<FlashcardRow>, StoreError> {
        Ok(sqlx::query_as::<_, FlashcardRow>(
            "SELECT * FROM flashcards WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_flashcards(
        &self,
        user_id: Uuid,
        query: &FlashcardListQuery,
    ) -> Result<(Vec<FlashcardRow>, u64), StoreError> {
        let direction = match query.order {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        };
        // Sort column comes from a closed enum, never from raw input.
        let sql = format!(
            r#"
            SELECT *
            FROM flashcards
            WHERE user_id = $1 AND ($2::flashcard_source IS NULL OR source = $2)
            ORDER BY {} {direction}, id ASC
            LIMIT $3 OFFSET $4
            "#,
            query.sort.column()
        );

        let rows = sqlx::query_as::<_, FlashcardRow>(&sql)
            .bind(user_id)
            .bind(query.source)
            .bind(query.limit as i64)
            .bind(Pagination::offset(query.page, query.limit))
            .fetch_all(&self.pool)
            .await?;

        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM flashcards WHERE user_id = $1 AND ($2::flashcard_source IS NULL OR source = $2)",
        )
        .bind(user_id)
        .bind(query.source)
        .fetch_one(&self.pool)
        .await?;

        Ok((rows, total.max(0) as u64))
    }

    async fn create_flashcards(
        &self,
        user_id: Uuid,
        cards: &[NewFlashcard],
    ) -> Result<Vec<FlashcardRow>, StoreError> {
        let today = Utc::now().date_naive();
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(cards.len());

        for card in cards {
            let row = sqlx::query_as::<_, FlashcardRow>(
                r#"
                INSERT INTO flashcards
                    (id, user_id, front, back, source, generation_session_id,
                     "interval", ease_factor, repetition_count, next_review_date)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, 0, $9)
                RETURNING *
                "#,
            )
            .bind(Uuid::new_v4())
            .bind(user_id)
            .bind(&card.front)
            .bind(&card.back)
            .bind(card.source)
            .bind(card.generation_session_id)
            .bind(INITIAL_INTERVAL)
            .bind(INITIAL_EASE_FACTOR)
            .bind(today)
            .fetch_one(&mut *tx)
            .await?;
            created.push(row);
        }

        tx.commit().await?;
        Ok(created)
    }

    async fn update_flashcard_content(
        &self,
        id: Uuid,
        user_id: Uuid,
        front: &str,
        back: &str,
    ) -> Result<Option<FlashcardRow>, StoreError> {
        Ok(sqlx::query_as::<_, FlashcardRow>(
            r#"
            UPDATE flashcards
            SET front = $1, back = $2, updated_at = now()
            WHERE id = $3 AND user_id = $4
            RETURNING *
            "#,
        )
        .bind(front)
        .bind(back)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_flashcard(&self, id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM flashcards WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_source(&self, user_id: Uuid) -> Result<SourceCounts, StoreError> {
        let rows: Vec<(FlashcardSource, i64)> = sqlx::query_as(
            "SELECT source, COUNT(*) FROM flashcards WHERE user_id = $1 GROUP BY source",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        let mut counts = SourceCounts::default();
        for (source, count) in rows {
            match source {
                FlashcardSource::Ai => counts.ai = count.max(0) as u64,
                FlashcardSource::Manual => counts.manual = count.max(0) as u64,
            }
        }
        Ok(counts)
    }

    async fn commit_review(&self, commit: &ReviewCommit) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            UPDATE flashcards
            SET "interval" = $1, ease_factor = $2, next_review_date = $3,
                repetition_count = $4, updated_at = $5
            WHERE id = $6
            "#,
        )
        .bind(commit.new_interval)
        .bind(commit.new_ease_factor)
        .bind(commit.next_review_date)
        .bind(commit.repetition_count)
        .bind(commit.reviewed_at)
        .bind(commit.flashcard_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO flashcard_reviews
                (id, flashcard_id, learning_session_id, rating,
                 previous_interval, new_interval, reviewed_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(commit.flashcard_id)
        .bind(commit.session_id)
        .bind(commit.rating)
        .bind(commit.previous_interval)
        .bind(commit.new_interval)
        .bind(commit.reviewed_at)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE learning_sessions SET flashcards_reviewed = flashcards_reviewed + 1 WHERE id = $1",
        )
        .bind(commit.session_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(
            "Committed review of flashcard {} in session {}",
            commit.flashcard_id, commit.session_id
        );
        Ok(())
    }
}

#[async_trait]
impl SessionStore for PgStore {
    async fn create_session(&self, user_id: Uuid) -> Result<LearningSessionRow, StoreError> {
        Ok(sqlx::query_as::<_, LearningSessionRow>(
            r#"
            INSERT INTO learning_sessions (id, user_id, flashcards_reviewed)
            VALUES ($1, $2, 0)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn get_session(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<LearningSessionRow>, StoreError> {
        Ok(sqlx::query_as::<_, LearningSessionRow>(
            "SELECT * FROM learning_sessions WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn end_session(
        &self,
        id: Uuid,
        user_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<LearningSessionRow>, StoreError> {
        Ok(sqlx::query_as::<_, LearningSessionRow>(
            r#"
            UPDATE learning_sessions
            SET ended_at = COALESCE(ended_at, $1)
            WHERE id = $2 AND user_id = $3
            RETURNING *
            "#,
        )
        .bind(ended_at)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn list_sessions(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<LearningSessionRow>, u64), StoreError> {
        let rows = sqlx::query_as::<_, LearningSessionRow>(
            r#"
            SELECT *
            FROM learning_sessions
            WHERE user_id = $1
            ORDER BY started_at DESC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .bind(Pagination::offset(page, limit))
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM learning_sessions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((rows, total.max(0) as u64))
    }
}

#[async_trait]
impl GenerationStore for PgStore {
    async fn create_generation(
        &self,
        user_id: Uuid,
        source_text: &str,
    ) -> Result<GenerationSessionRow, StoreError> {
        Ok(sqlx::query_as::<_, GenerationSessionRow>(
            r#"
            INSERT INTO generation_sessions
                (id, user_id, source_text, llm_response, model_name,
                 generated_count, accepted_count, rejected_count)
            VALUES ($1, $2, $3, '{}'::jsonb, $4, 0, 0, 0)
            RETURNING *
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(source_text)
        .bind(PENDING_MODEL_NAME)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn complete_generation(
        &self,
        id: Uuid,
        model_name: &str,
        llm_response: &Value,
        generated_count: u32,
    ) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE generation_sessions
            SET model_name = $1, llm_response = $2, generated_count = $3
            WHERE id = $4
            "#,
        )
        .bind(model_name)
        .bind(llm_response)
        .bind(db_count("generated_count", generated_count)?)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_generation(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GenerationSessionRow>, StoreError> {
        Ok(sqlx::query_as::<_, GenerationSessionRow>(
            "SELECT * FROM generation_sessions WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn record_acceptance(
        &self,
        id: Uuid,
        accepted_count: u32,
        rejected_count: u32,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE generation_sessions SET accepted_count = $1, rejected_count = $2 WHERE id = $3",
        )
        .bind(db_count("accepted_count", accepted_count)?)
        .bind(db_count("rejected_count", rejected_count)?)
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_generations(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<GenerationSessionRow>, u64), StoreError> {
        let rows = sqlx::query_as::<_, GenerationSessionRow>(
            r#"
            SELECT *
            FROM generation_sessions
            WHERE user_id = $1
            ORDER BY created_at DESC, id ASC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(user_id)
        .bind(limit as i64)
        .bind(Pagination::offset(page, limit))
        .fetch_all(&self.pool)
        .await?;

        let total: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM generation_sessions WHERE user_id = $1")
                .bind(user_id)
                .fetch_one(&self.pool)
                .await?;

        Ok((rows, total.max(0) as u64))
    }

    async fn generation_totals(&self, user_id: Uuid) -> Result<GenerationTotals, StoreError> {
        let (sessions, generated, accepted, rejected): (i64, i64, i64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(SUM(generated_count), 0)::BIGINT,
                   COALESCE(SUM(accepted_count), 0)::BIGINT,
                   COALESCE(SUM(rejected_count), 0)::BIGINT
            FROM generation_sessions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(GenerationTotals {
            sessions: sessions.max(0) as u64,
            generated: generated.max(0) as u64,
            accepted: accepted.max(0) as u64,
            rejected: rejected.max(0) as u64,
        })
    }
}
