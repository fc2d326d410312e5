//! AI generation flow: source text → suggestions → user picks → flashcards.
//!
//! Every generation is recorded as a generation session so acceptance rates
//! can be reported later. Bookkeeping updates after the main write are
//! best-effort: their failure is logged and the request still succeeds.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::flashcards::validation::{
    required_text, source_text, ACCEPTED_BACK_MAX, ACCEPTED_FRONT_MAX,
};
use crate::generation::generator::FlashcardSuggestion;
use crate::models::flashcard::{FlashcardSource, NewFlashcard};
use crate::models::generation::GenerationSessionRow;
use crate::models::Pagination;
use crate::state::AppState;

const SOURCE_PREVIEW_CHARS: usize = 100;

#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub source_text: String,
}

#[derive(Debug, Serialize)]
pub struct GenerationResponse {
    pub session_id: Uuid,
    pub suggestions: Vec<FlashcardSuggestion>,
    pub generated_count: usize,
    pub model_name: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptedFlashcard {
    pub temp_id: String,
    pub front: String,
    pub back: String,
}

#[derive(Debug, Deserialize)]
pub struct AcceptRequest {
    #[serde(default)]
    pub accepted: Vec<AcceptedFlashcard>,
    pub rejected_count: i64,
}

#[derive(Debug, Serialize)]
pub struct AcceptedFlashcardResponse {
    pub id: Uuid,
    pub front: String,
    pub back: String,
    pub source: FlashcardSource,
    pub generation_session_id: Uuid,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct AcceptResponse {
    pub flashcards: Vec<AcceptedFlashcardResponse>,
    pub accepted_count: u32,
    pub rejected_count: u32,
}

/// One row of generation history; the source text is cut to a preview.
#[derive(Debug, Serialize)]
pub struct GenerationSummary {
    pub id: Uuid,
    pub source_text_preview: String,
    pub model_name: String,
    pub generated_count: i32,
    pub accepted_count: i32,
    pub rejected_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<GenerationSessionRow> for GenerationSummary {
    fn from(row: GenerationSessionRow) -> Self {
        Self {
            id: row.id,
            source_text_preview: row.source_text.chars().take(SOURCE_PREVIEW_CHARS).collect(),
            model_name: row.model_name,
            generated_count: row.generated_count,
            accepted_count: row.accepted_count,
            rejected_count: row.rejected_count,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct GenerationList {
    pub data: Vec<GenerationSummary>,
    pub pagination: Pagination,
}

/// Records a generation session, asks the generator for suggestions and
/// returns them. Nothing becomes a flashcard until it is accepted.
pub async fn create_generation_session(
    state: &AppState,
    user_id: Uuid,
    request: &GenerateRequest,
) -> Result<GenerationResponse, AppError> {
    let text = source_text(&request.source_text)?;

    let session = state.generations.create_generation(user_id, text).await?;
    info!(
        "Generation session {} started for user {} ({} chars)",
        session.id,
        user_id,
        text.chars().count()
    );

    let generated = state.generator.generate(text).await?;
    let generated_count = generated.suggestions.len();

    if let Err(e) = state
        .generations
        .complete_generation(
            session.id,
            &generated.model_name,
            &generated.llm_response,
            generated_count as u32,
        )
        .await
    {
        warn!("Failed to record generation result for session {}: {e}", session.id);
    }

    Ok(GenerationResponse {
        session_id: session.id,
        suggestions: generated.suggestions,
        generated_count,
        model_name: generated.model_name,
    })
}

/// Saves the accepted suggestions as AI flashcards linked to the generation.
pub async fn accept_flashcards(
    state: &AppState,
    user_id: Uuid,
    generation_id: Uuid,
    request: &AcceptRequest,
) -> Result<AcceptResponse, AppError> {
    // Stored in an INTEGER column, so the upper bound is i32::MAX.
    let rejected_count = i32::try_from(request.rejected_count)
        .ok()
        .and_then(|n| u32::try_from(n).ok())
        .ok_or_else(|| {
            AppError::invalid_field("rejected_count", "must be between 0 and 2147483647")
        })?;

    let mut drafts = Vec::with_capacity(request.accepted.len());
    for (i, card) in request.accepted.iter().enumerate() {
        if card.temp_id.trim().is_empty() {
            return Err(AppError::invalid_field(
                format!("accepted.{i}.temp_id"),
                "must not be empty",
            ));
        }
        let front = required_text(&format!("accepted.{i}.front"), &card.front, ACCEPTED_FRONT_MAX)?;
        let back = required_text(&format!("accepted.{i}.back"), &card.back, ACCEPTED_BACK_MAX)?;
        drafts.push(NewFlashcard::from_generation(generation_id, front, back));
    }

    state
        .generations
        .get_generation(generation_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Generation session {generation_id} not found")))?;

    let created = if drafts.is_empty() {
        Vec::new()
    } else {
        state.flashcards.create_flashcards(user_id, &drafts).await?
    };
    let accepted_count = created.len() as u32;

    if let Err(e) = state
        .generations
        .record_acceptance(generation_id, accepted_count, rejected_count)
        .await
    {
        warn!("Failed to record acceptance for generation {generation_id}: {e}");
    }

    info!(
        "Generation {}: accepted {}, rejected {}",
        generation_id, accepted_count, rejected_count
    );

    Ok(AcceptResponse {
        flashcards: created
            .into_iter()
            .map(|card| AcceptedFlashcardResponse {
                id: card.id,
                front: card.front,
                back: card.back,
                source: card.source,
                generation_session_id: card.generation_session_id.unwrap_or(generation_id),
                created_at: card.created_at,
            })
            .collect(),
        accepted_count,
        rejected_count,
    })
}

pub async fn list_generations(
    state: &AppState,
    user_id: Uuid,
    page: u32,
    limit: u32,
) -> Result<GenerationList, AppError> {
    let (rows, total) = state
        .generations
        .list_generations(user_id, page, limit)
        .await?;
    Ok(GenerationList {
        data: rows.into_iter().map(GenerationSummary::from).collect(),
        pagination: Pagination::new(page, limit, total),
    })
}
