// AI flashcard generation: source text → suggestions → accepted flashcards.
// All LLM calls go through llm_client; the generator trait keeps the
// provider swappable.

pub mod generator;
pub mod handlers;
pub mod prompts;
pub mod service;
