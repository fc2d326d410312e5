//! Session queues: for each active learning session, the ordered ids of the
//! cards still to review plus a count of cards reviewed so far.
//!
//! Queue state lives behind `SessionQueueStore` so deployments pick its
//! lifetime: `MemoryQueueStore` dies with the process, `RedisQueueStore`
//! survives restarts and is shared between instances.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use thiserror::Error;
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::flashcard::FlashcardRow;
use crate::store::FlashcardStore;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("A queue already exists for session {0}")]
    DuplicateSession(Uuid),

    #[error("Flashcard {card_id} is not the next card in session {session_id}")]
    NotQueueHead { session_id: Uuid, card_id: Uuid },

    #[error("Session queue backend error: {0}")]
    Backend(String),
}

/// How a card leaves the head of its queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Rated by the user; bumps the reviewed counter.
    Reviewed,
    /// Dropped because the card no longer exists.
    Skipped,
}

#[async_trait]
pub trait SessionQueueStore: Send + Sync {
    async fn seed(&self, session_id: Uuid, card_ids: &[Uuid]) -> Result<(), QueueError>;

    async fn head(&self, session_id: Uuid) -> Result<Option<Uuid>, QueueError>;

    async fn remaining(&self, session_id: Uuid) -> Result<u32, QueueError>;

    async fn reviewed(&self, session_id: Uuid) -> Result<u32, QueueError>;

    /// Removes `card_id` from the front of the queue. Fails with `NotQueueHead`
    /// and leaves the queue untouched if it is not the current head.
    async fn pop_head(
        &self,
        session_id: Uuid,
        card_id: Uuid,
        advance: Advance,
    ) -> Result<(), QueueError>;

    async fn dispose(&self, session_id: Uuid) -> Result<(), QueueError>;
}

/// Result of asking for the next card.
#[derive(Debug, Clone)]
pub enum PeekOutcome {
    Card(FlashcardRow),
    Complete,
}

/// Front door to the queue backend used by the learning service.
#[derive(Clone)]
pub struct SessionQueueManager {
    store: Arc<dyn SessionQueueStore>,
}

impl SessionQueueManager {
    pub fn new(store: Arc<dyn SessionQueueStore>) -> Self {
        Self { store }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryQueueStore::default()))
    }

    pub async fn seed(&self, session_id: Uuid, card_ids: &[Uuid]) -> Result<(), QueueError> {
        self.store.seed(session_id, card_ids).await
    }

    /// Returns the head card without removing it.
    ///
    /// Heads that no longer resolve to one of the user's cards are dropped
    /// and the next head is tried. The loop is bounded by the queue length seen
    /// on entry, since every iteration either returns or shrinks the queue.
    pub async fn peek_next(
        &self,
        session_id: Uuid,
        user_id: Uuid,
        flashcards: &dyn FlashcardStore,
    ) -> Result<PeekOutcome, AppError> {
        let bound = self.store.remaining(session_id).await?;

        for _ in 0..=bound {
            let Some(head) = self.store.head(session_id).await? else {
                return Ok(PeekOutcome::Complete);
            };

            if let Some(card) = flashcards.get_flashcard(head, user_id).await? {
                return Ok(PeekOutcome::Card(card));
            }

            warn!("Flashcard {head} in session {session_id} no longer exists, skipping");
            match self.store.pop_head(session_id, head, Advance::Skipped).await {
                // Someone else already moved the queue on; just look again.
                Ok(()) | Err(QueueError::NotQueueHead { .. }) => {}
                Err(e) => return Err(e.into()),
            }
        }

        Err(AppError::Internal(anyhow::anyhow!(
            "Queue for session {session_id} did not shrink while skipping missing flashcards"
        )))
    }

    pub async fn record_reviewed(&self, session_id: Uuid, card_id: Uuid) -> Result<(), QueueError> {
        self.store
            .pop_head(session_id, card_id, Advance::Reviewed)
            .await
    }

    pub async fn remaining(&self, session_id: Uuid) -> Result<u32, QueueError> {
        self.store.remaining(session_id).await
    }

    pub async fn reviewed(&self, session_id: Uuid) -> Result<u32, QueueError> {
        self.store.reviewed(session_id).await
    }

    pub async fn dispose(&self, session_id: Uuid) -> Result<(), QueueError> {
        self.store.dispose(session_id).await
    }
}

#[derive(Debug, Default)]
struct SessionQueue {
    cards: VecDeque<Uuid>,
    reviewed: u32,
}

/// Process-local queue storage. Everything is lost on restart.
#[derive(Default)]
pub struct MemoryQueueStore {
    queues: Mutex<HashMap<Uuid, SessionQueue>>,
}

#[async_trait]
impl SessionQueueStore for MemoryQueueStore {
    async fn seed(&self, session_id: Uuid, card_ids: &[Uuid]) -> Result<(), QueueError> {
        let mut queues = self.queues.lock();
        if queues.contains_key(&session_id) {
            return Err(QueueError::DuplicateSession(session_id));
        }
        queues.insert(
            session_id,
            SessionQueue {
                cards: card_ids.iter().copied().collect(),
                reviewed: 0,
            },
        );
        Ok(())
    }

    async fn head(&self, session_id: Uuid) -> Result<Option<Uuid>, QueueError> {
        Ok(self
            .queues
            .lock()
            .get(&session_id)
            .and_then(|q| q.cards.front().copied()))
    }

    async fn remaining(&self, session_id: Uuid) -> Result<u32, QueueError> {
        Ok(self
            .queues
            .lock()
            .get(&session_id)
            .map_or(0, |q| q.cards.len() as u32))
    }

    async fn reviewed(&self, session_id: Uuid) -> Result<u32, QueueError> {
        Ok(self
            .queues
            .lock()
            .get(&session_id)
            .map_or(0, |q| q.reviewed))
    }

    async fn pop_head(
        &self,
        session_id: Uuid,
        card_id: Uuid,
        advance: Advance,
    ) -> Result<(), QueueError> {
        let mut queues = self.queues.lock();
        let queue = queues
            .get_mut(&session_id)
            .filter(|q| q.cards.front() == Some(&card_id))
            .ok_or(QueueError::NotQueueHead {
                session_id,
                card_id,
            })?;
        queue.cards.pop_front();
        if advance == Advance::Reviewed {
            queue.reviewed += 1;
        }
        Ok(())
    }

    async fn dispose(&self, session_id: Uuid) -> Result<(), QueueError> {
        self.queues.lock().remove(&session_id);
        Ok(())
    }
}
