//! Test wiring: `AppState` over `MemoryStore`, an in-memory queue and a stub generator.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::json;

use crate::generation::generator::{FlashcardGenerator, FlashcardSuggestion, GeneratedFlashcards};
use crate::learning::queue::SessionQueueManager;
use crate::llm_client::LlmError;
use crate::state::AppState;
use crate::store::memory::MemoryStore;

/// Returns two fixed suggestions, or fails with the given provider status.
pub struct StubGenerator {
    fail_with: Option<u16>,
}

impl StubGenerator {
    pub fn ok() -> Self {
        Self { fail_with: None }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            fail_with: Some(status),
        }
    }
}

#[async_trait]
impl FlashcardGenerator for StubGenerator {
    async fn generate(&self, _source_text: &str) -> Result<GeneratedFlashcards, LlmError> {
        if let Some(status) = self.fail_with {
            return Err(LlmError::Api {
                status,
                message: "stubbed failure".to_string(),
            });
        }
        let suggestions = vec![
            FlashcardSuggestion {
                temp_id: "temp_1".to_string(),
                front: "What does photosynthesis produce?".to_string(),
                back: "Glucose and oxygen".to_string(),
            },
            FlashcardSuggestion {
                temp_id: "temp_2".to_string(),
                front: "Where does photosynthesis happen?".to_string(),
                back: "In the chloroplasts".to_string(),
            },
        ];
        Ok(GeneratedFlashcards {
            llm_response: json!({ "model": "stub/model", "choices": [] }),
            model_name: "stub/model".to_string(),
            suggestions,
        })
    }
}

pub struct TestApp {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_generator(StubGenerator::ok())
    }

    pub fn with_generator(generator: StubGenerator) -> Self {
        let store = Arc::new(MemoryStore::new());
        let state = AppState {
            flashcards: store.clone(),
            sessions: store.clone(),
            generations: store.clone(),
            queue: SessionQueueManager::in_memory(),
            generator: Arc::new(generator),
        };
        Self { state, store }
    }
}
