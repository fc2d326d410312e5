pub mod health;

use axum::{
    routing::{get, patch, post},
    Router,
};

use crate::flashcards::handlers as flashcards;
use crate::generation::handlers as generation;
use crate::learning::handlers as learning;
use crate::state::AppState;
use crate::statistics;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Flashcard collection
        .route(
            "/flashcards",
            get(flashcards::handle_list_flashcards).post(flashcards::handle_create_flashcard),
        )
        .route(
            "/flashcards/:id",
            get(flashcards::handle_get_flashcard)
                .put(flashcards::handle_update_flashcard)
                .delete(flashcards::handle_delete_flashcard),
        )
        // AI generation
        .route(
            "/generations",
            get(generation::handle_list_generations).post(generation::handle_generate),
        )
        .route(
            "/generations/:session_id/accept",
            post(generation::handle_accept),
        )
        // Learning sessions
        .route(
            "/learning-sessions",
            get(learning::handle_list_sessions).post(learning::handle_start_session),
        )
        .route(
            "/learning-sessions/:id/next",
            get(learning::handle_next_flashcard),
        )
        .route(
            "/learning-sessions/:id/review",
            post(learning::handle_submit_review),
        )
        .route(
            "/learning-sessions/:id/end",
            patch(learning::handle_end_session),
        )
        // Statistics
        .route(
            "/statistics/generations",
            get(statistics::handle_generation_statistics),
        )
        .with_state(state)
}
