use std::sync::Arc;

use crate::generation::generator::FlashcardGenerator;
use crate::learning::queue::SessionQueueManager;
use crate::store::{FlashcardStore, GenerationStore, SessionStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub flashcards: Arc<dyn FlashcardStore>,
    pub sessions: Arc<dyn SessionStore>,
    pub generations: Arc<dyn GenerationStore>,
    /// Review queues of active learning sessions. Memory or Redis, per SESSION_QUEUE_BACKEND.
    pub queue: SessionQueueManager,
    /// Turns source text into flashcard suggestions. OpenRouter in production.
    pub generator: Arc<dyn FlashcardGenerator>,
}
