// Flashcard collection: manual CRUD over the user's cards.
// Review state is owned by the learning module; nothing here changes it.

pub mod handlers;
pub mod service;
pub mod validation;
