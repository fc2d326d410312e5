//! Flashcard generator: pluggable, trait-based source of AI suggestions.
//!
//! Production uses `OpenRouterGenerator`; tests swap in a stub.
//! `AppState` holds an `Arc<dyn FlashcardGenerator>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::info;

use crate::generation::prompts::{flashcard_prompt, flashcard_response_format, FLASHCARD_SYSTEM};
use crate::llm_client::{strip_json_fences, LlmClient, LlmError};

// ────────────────────────────────────────────────────────────────────────────
// Data models
// ────────────────────────────────────────────────────────────────────────────

/// A suggested flashcard awaiting the user's accept/reject decision.
/// `temp_id` is only meaningful within one generation response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashcardSuggestion {
    pub temp_id: String,
    pub front: String,
    pub back: String,
}

/// Output of one generation call.
#[derive(Debug, Clone)]
pub struct GeneratedFlashcards {
    pub suggestions: Vec<FlashcardSuggestion>,
    pub model_name: String,
    /// Raw provider response, stored on the generation session.
    pub llm_response: Value,
}

#[derive(Debug, Deserialize)]
struct LlmFlashcards {
    flashcards: Vec<LlmFlashcard>,
}

#[derive(Debug, Deserialize)]
struct LlmFlashcard {
    front: String,
    back: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

#[async_trait]
pub trait FlashcardGenerator: Send + Sync {
    async fn generate(&self, source_text: &str) -> Result<GeneratedFlashcards, LlmError>;
}

// ────────────────────────────────────────────────────────────────────────────
// OpenRouterGenerator
// ────────────────────────────────────────────────────────────────────────────

pub struct OpenRouterGenerator {
    llm: LlmClient,
}

impl OpenRouterGenerator {
    pub fn new(llm: LlmClient) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl FlashcardGenerator for OpenRouterGenerator {
    async fn generate(&self, source_text: &str) -> Result<GeneratedFlashcards, LlmError> {
        let response_format = flashcard_response_format();
        let completion = self
            .llm
            .chat(
                FLASHCARD_SYSTEM,
                &flashcard_prompt(source_text),
                Some(&response_format),
            )
            .await?;

        let suggestions = to_suggestions(parse_flashcards(&completion.content)?);
        let model_name = completion
            .model
            .unwrap_or_else(|| self.llm.model().to_string());

        info!(
            "Generated {} flashcard suggestions with {}",
            suggestions.len(),
            model_name
        );

        Ok(GeneratedFlashcards {
            suggestions,
            model_name,
            llm_response: completion.raw,
        })
    }
}

/// Parses the model's reply, tolerating markdown code fences around the JSON.
/// A missing `flashcards` array or a card without string `front`/`back` is an
/// invalid response.
fn parse_flashcards(content: &str) -> Result<Vec<LlmFlashcard>, LlmError> {
    let parsed: LlmFlashcards = serde_json::from_str(strip_json_fences(content))
        .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;
    Ok(parsed.flashcards)
}

/// Numbers suggestions `temp_1`, `temp_2`, ... in model order.
fn to_suggestions(cards: Vec<LlmFlashcard>) -> Vec<FlashcardSuggestion> {
    cards
        .into_iter()
        .enumerate()
        .map(|(i, card)| FlashcardSuggestion {
            temp_id: format!("temp_{}", i + 1),
            front: card.front,
            back: card.back,
        })
        .collect()
}
