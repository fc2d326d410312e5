//! Per-user generation statistics.

use axum::{extract::State, Json};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::flashcard::SourceCounts;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct GenerationStatistics {
    pub total_sessions: u64,
    pub total_generated: u64,
    pub total_accepted: u64,
    pub total_rejected: u64,
    /// Percent of generated suggestions accepted, one decimal.
    pub acceptance_rate: f64,
    pub flashcards_by_source: SourceCounts,
    /// Percent of the collection that came from AI, one decimal.
    pub ai_usage_percentage: f64,
}

/// `part / whole` as a percentage rounded to one decimal; 0 when `whole` is 0.
fn percentage(part: u64, whole: u64) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    (part as f64 / whole as f64 * 1000.0).round() / 10.0
}

pub async fn generation_statistics(
    state: &AppState,
    user_id: Uuid,
) -> Result<GenerationStatistics, AppError> {
    let totals = state.generations.generation_totals(user_id).await?;
    let by_source = state.flashcards.count_by_source(user_id).await?;

    Ok(GenerationStatistics {
        total_sessions: totals.sessions,
        total_generated: totals.generated,
        total_accepted: totals.accepted,
        total_rejected: totals.rejected,
        acceptance_rate: percentage(totals.accepted, totals.generated),
        flashcards_by_source: by_source,
        ai_usage_percentage: percentage(by_source.ai, by_source.ai + by_source.manual),
    })
}

/// GET /statistics/generations
pub async fn handle_generation_statistics(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<GenerationStatistics>, AppError> {
    Ok(Json(generation_statistics(&state, user_id).await?))
}
