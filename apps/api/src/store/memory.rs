use std::cmp::Ordering;
use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use parking_lot::RwLock;
use serde_json::Value;
use uuid::Uuid;

use crate::models::flashcard::{
    FlashcardListQuery, FlashcardRow, FlashcardSource, NewFlashcard, SortField, SortOrder,
    SourceCounts, INITIAL_EASE_FACTOR, INITIAL_INTERVAL,
};
use crate::models::generation::{GenerationSessionRow, GenerationTotals, PENDING_MODEL_NAME};
use crate::models::learning::{FlashcardReviewRow, LearningSessionRow, ReviewCommit};
use crate::models::Pagination;
use crate::store::{db_count, FlashcardStore, GenerationStore, SessionStore, StoreError};

/// In-process store with the same observable behaviour as `PgStore`.
#[derive(Default)]
pub struct MemoryStore {
    flashcards: RwLock<HashMap<Uuid, FlashcardRow>>,
    sessions: RwLock<HashMap<Uuid, LearningSessionRow>>,
    reviews: RwLock<Vec<FlashcardReviewRow>>,
    generations: RwLock<HashMap<Uuid, GenerationSessionRow>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reviews(&self) -> Vec<FlashcardReviewRow> {
        self.reviews.read().clone()
    }

    pub fn session_count(&self) -> usize {
        self.sessions.read().len()
    }

    /// Overwrites a card's due date, e.g. to push it into the future.
    pub fn set_next_review_date(&self, id: Uuid, date: Option<NaiveDate>) {
        if let Some(card) = self.flashcards.write().get_mut(&id) {
            card.next_review_date = date;
        }
    }
}

fn paginate<T: Clone>(items: &[T], page: u32, limit: u32) -> Vec<T> {
    let offset = Pagination::offset(page, limit).max(0) as usize;
    items.iter().skip(offset).take(limit as usize).cloned().collect()
}

fn compare_by(a: &FlashcardRow, b: &FlashcardRow, sort: SortField) -> Ordering {
    match sort {
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        // Unscheduled cards sort after scheduled ones ascending, like Postgres NULLs.
        SortField::NextReviewDate => match (a.next_review_date, b.next_review_date) {
            (Some(x), Some(y)) => x.cmp(&y),
            (None, None) => Ordering::Equal,
            (None, Some(_)) => Ordering::Greater,
            (Some(_), None) => Ordering::Less,
        },
    }
}

#[async_trait]
impl FlashcardStore for MemoryStore {
    async fn find_due_flashcards(
        &self,
        user_id: Uuid,
        as_of: NaiveDate,
        limit: u32,
    ) -> Result<Vec<Uuid>, StoreError> {
        let cards = self.flashcards.read();
        let mut due: Vec<&FlashcardRow> = cards
            .values()
            .filter(|c| c.user_id == user_id)
            .filter(|c| c.next_review_date.map_or(true, |d| d <= as_of))
            .collect();
        // None sorts before Some, matching NULLS FIRST.
        due.sort_by_key(|c| (c.next_review_date, c.created_at, c.id));
        Ok(due.into_iter().take(limit as usize).map(|c| c.id).collect())
    }

    async fn get_flashcard(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<FlashcardRow>, StoreError> {
        Ok(self
            .flashcards
            .read()
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .cloned())
    }

    async fn list_flashcards(
        &self,
        user_id: Uuid,
        query: &FlashcardListQuery,
    ) -> Result<(Vec<FlashcardRow>, u64), StoreError> {
        let mut cards: Vec<FlashcardRow> = self
            .flashcards
            .read()
            .values()
            .filter(|c| c.user_id == user_id)
            .filter(|c| query.source.map_or(true, |s| c.source == s))
            .cloned()
            .collect();
        cards.sort_by(|a, b| {
            let ord = compare_by(a, b, query.sort);
            let ord = match query.order {
                SortOrder::Asc => ord,
                SortOrder::Desc => ord.reverse(),
            };
            ord.then(a.id.cmp(&b.id))
        });
        let total = cards.len() as u64;
        Ok((paginate(&cards, query.page, query.limit), total))
    }

    async fn create_flashcards(
        &self,
        user_id: Uuid,
        cards: &[NewFlashcard],
    ) -> Result<Vec<FlashcardRow>, StoreError> {
        let now = Utc::now();
        let mut store = self.flashcards.write();
        let created: Vec<FlashcardRow> = cards
            .iter()
            .map(|card| FlashcardRow {
                id: Uuid::new_v4(),
                user_id,
                front: card.front.clone(),
                back: card.back.clone(),
                source: card.source,
                generation_session_id: card.generation_session_id,
                interval: INITIAL_INTERVAL,
                ease_factor: INITIAL_EASE_FACTOR,
                repetition_count: 0,
                next_review_date: Some(now.date_naive()),
                created_at: now,
                updated_at: now,
            })
            .collect();
        for row in &created {
            store.insert(row.id, row.clone());
        }
        Ok(created)
    }

    async fn update_flashcard_content(
        &self,
        id: Uuid,
        user_id: Uuid,
        front: &str,
        back: &str,
    ) -> Result<Option<FlashcardRow>, StoreError> {
        let mut cards = self.flashcards.write();
        let Some(card) = cards.get_mut(&id).filter(|c| c.user_id == user_id) else {
            return Ok(None);
        };
        card.front = front.to_string();
        card.back = back.to_string();
        card.updated_at = Utc::now();
        Ok(Some(card.clone()))
    }

    async fn delete_flashcard(&self, id: Uuid, user_id: Uuid) -> Result<bool, StoreError> {
        let mut cards = self.flashcards.write();
        if !cards.get(&id).is_some_and(|c| c.user_id == user_id) {
            return Ok(false);
        }
        cards.remove(&id);
        self.reviews.write().retain(|r| r.flashcard_id != id);
        Ok(true)
    }

    async fn count_by_source(&self, user_id: Uuid) -> Result<SourceCounts, StoreError> {
        let mut counts = SourceCounts::default();
        for card in self.flashcards.read().values().filter(|c| c.user_id == user_id) {
            match card.source {
                FlashcardSource::Ai => counts.ai += 1,
                FlashcardSource::Manual => counts.manual += 1,
            }
        }
        Ok(counts)
    }

    async fn commit_review(&self, commit: &ReviewCommit) -> Result<(), StoreError> {
        if let Some(card) = self.flashcards.write().get_mut(&commit.flashcard_id) {
            card.interval = commit.new_interval;
            card.ease_factor = commit.new_ease_factor;
            card.next_review_date = Some(commit.next_review_date);
            card.repetition_count = commit.repetition_count;
            card.updated_at = commit.reviewed_at;
        }
        self.reviews.write().push(FlashcardReviewRow {
            id: Uuid::new_v4(),
            flashcard_id: commit.flashcard_id,
            learning_session_id: commit.session_id,
            rating: commit.rating,
            previous_interval: commit.previous_interval,
            new_interval: commit.new_interval,
            reviewed_at: commit.reviewed_at,
        });
        if let Some(session) = self.sessions.write().get_mut(&commit.session_id) {
            session.flashcards_reviewed += 1;
        }
        Ok(())
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn create_session(&self, user_id: Uuid) -> Result<LearningSessionRow, StoreError> {
        let row = LearningSessionRow {
            id: Uuid::new_v4(),
            user_id,
            started_at: Utc::now(),
            ended_at: None,
            flashcards_reviewed: 0,
        };
        self.sessions.write().insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_session(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<LearningSessionRow>, StoreError> {
        Ok(self
            .sessions
            .read()
            .get(&id)
            .filter(|s| s.user_id == user_id)
            .cloned())
    }

    async fn end_session(
        &self,
        id: Uuid,
        user_id: Uuid,
        ended_at: DateTime<Utc>,
    ) -> Result<Option<LearningSessionRow>, StoreError> {
        let mut sessions = self.sessions.write();
        let Some(session) = sessions.get_mut(&id).filter(|s| s.user_id == user_id) else {
            return Ok(None);
        };
        session.ended_at.get_or_insert(ended_at);
        Ok(Some(session.clone()))
    }

    async fn list_sessions(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<LearningSessionRow>, u64), StoreError> {
        let mut sessions: Vec<LearningSessionRow> = self
            .sessions
            .read()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.started_at.cmp(&a.started_at).then(a.id.cmp(&b.id)));
        let total = sessions.len() as u64;
        Ok((paginate(&sessions, page, limit), total))
    }
}

#[async_trait]
impl GenerationStore for MemoryStore {
    async fn create_generation(
        &self,
        user_id: Uuid,
        source_text: &str,
    ) -> Result<GenerationSessionRow, StoreError> {
        let row = GenerationSessionRow {
            id: Uuid::new_v4(),
            user_id,
            source_text: source_text.to_string(),
            llm_response: Value::Object(Default::default()),
            model_name: PENDING_MODEL_NAME.to_string(),
            generated_count: 0,
            accepted_count: 0,
            rejected_count: 0,
            created_at: Utc::now(),
        };
        self.generations.write().insert(row.id, row.clone());
        Ok(row)
    }

    async fn complete_generation(
        &self,
        id: Uuid,
        model_name: &str,
        llm_response: &Value,
        generated_count: u32,
    ) -> Result<(), StoreError> {
        let generated_count = db_count("generated_count", generated_count)?;
        if let Some(row) = self.generations.write().get_mut(&id) {
            row.model_name = model_name.to_string();
            row.llm_response = llm_response.clone();
            row.generated_count = generated_count;
        }
        Ok(())
    }

    async fn get_generation(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<GenerationSessionRow>, StoreError> {
        Ok(self
            .generations
            .read()
            .get(&id)
            .filter(|g| g.user_id == user_id)
            .cloned())
    }

    async fn record_acceptance(
        &self,
        id: Uuid,
        accepted_count: u32,
        rejected_count: u32,
    ) -> Result<(), StoreError> {
        let accepted_count = db_count("accepted_count", accepted_count)?;
        let rejected_count = db_count("rejected_count", rejected_count)?;
        if let Some(row) = self.generations.write().get_mut(&id) {
            row.accepted_count = accepted_count;
            row.rejected_count = rejected_count;
        }
        Ok(())
    }

    async fn list_generations(
        &self,
        user_id: Uuid,
        page: u32,
        limit: u32,
    ) -> Result<(Vec<GenerationSessionRow>, u64), StoreError> {
        let mut rows: Vec<GenerationSessionRow> = self
            .generations
            .read()
            .values()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(a.id.cmp(&b.id)));
        let total = rows.len() as u64;
        Ok((paginate(&rows, page, limit), total))
    }

    async fn generation_totals(&self, user_id: Uuid) -> Result<GenerationTotals, StoreError> {
        let generations = self.generations.read();
        let mut totals = GenerationTotals::default();
        for row in generations.values().filter(|g| g.user_id == user_id) {
            totals.sessions += 1;
            totals.generated += row.generated_count.max(0) as u64;
            totals.accepted += row.accepted_count.max(0) as u64;
            totals.rejected += row.rejected_count.max(0) as u64;
        }
        Ok(totals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Days;

    fn query(sort: SortField, order: SortOrder) -> FlashcardListQuery {
        FlashcardListQuery {
            page: 1,
            limit: 10,
            source: None,
            sort,
            order,
        }
    }

    #[tokio::test]
    async fn test_due_cards_from_one_batch_are_ordered_by_id() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let drafts: Vec<NewFlashcard> = (0..5)
            .map(|i| NewFlashcard::manual(format!("Q{i}"), "A"))
            .collect();
        let created = store.create_flashcards(user, &drafts).await.unwrap();

        let mut expected: Vec<Uuid> = created.iter().map(|c| c.id).collect();
        expected.sort();

        let today = Utc::now().date_naive();
        for _ in 0..3 {
            let due = store.find_due_flashcards(user, today, 10).await.unwrap();
            assert_eq!(due, expected);
        }
    }

    #[tokio::test]
    async fn test_next_review_date_sort_puts_unscheduled_last_ascending() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let created = store
            .create_flashcards(
                user,
                &[
                    NewFlashcard::manual("never", "A"),
                    NewFlashcard::manual("later", "A"),
                    NewFlashcard::manual("sooner", "A"),
                ],
            )
            .await
            .unwrap();
        let today = Utc::now().date_naive();
        store.set_next_review_date(created[0].id, None);
        store.set_next_review_date(created[1].id, today.checked_add_days(Days::new(5)));
        store.set_next_review_date(created[2].id, today.checked_add_days(Days::new(1)));

        let fronts = |rows: Vec<FlashcardRow>| -> Vec<String> {
            rows.into_iter().map(|c| c.front).collect()
        };

        let (asc, _) = store
            .list_flashcards(user, &query(SortField::NextReviewDate, SortOrder::Asc))
            .await
            .unwrap();
        assert_eq!(fronts(asc), ["sooner", "later", "never"]);

        let (desc, _) = store
            .list_flashcards(user, &query(SortField::NextReviewDate, SortOrder::Desc))
            .await
            .unwrap();
        assert_eq!(fronts(desc), ["never", "later", "sooner"]);
    }

    #[tokio::test]
    async fn test_acceptance_counts_beyond_integer_range_are_refused() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let generation = store.create_generation(user, "text").await.unwrap();

        let err = store
            .record_acceptance(generation.id, 1, i32::MAX as u32 + 1)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::CountOutOfRange { field: "rejected_count", .. }));

        let row = store.get_generation(generation.id, user).await.unwrap().unwrap();
        assert_eq!((row.accepted_count, row.rejected_count), (0, 0));
    }
}
