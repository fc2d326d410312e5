// LLM prompt constants for flashcard generation.

use serde_json::{json, Value};

/// System prompt for flashcard generation.
pub const FLASHCARD_SYSTEM: &str = "You are an expert educational flashcard creator.";

/// Flashcard generation prompt template. Replace `{source_text}` before sending.
/// Output format is enforced by `response_format`, so no JSON instructions here.
pub const FLASHCARD_PROMPT_TEMPLATE: &str = r#"Create a set of question-and-answer flashcards from the source text below.

Rules:
1. Each flashcard must cover a concrete, checkable fact from the text
2. Questions (front) must be clear and unambiguous
3. Answers (back) must be concise but complete
4. Avoid questions that are too general or open to interpretation
5. Produce 5-15 flashcards depending on how much material there is
6. Write the flashcards in the language of the source text

Source text:
{source_text}"#;

pub fn flashcard_prompt(source_text: &str) -> String {
    FLASHCARD_PROMPT_TEMPLATE.replace("{source_text}", source_text)
}

/// `response_format` constraining the reply to `{"flashcards": [{"front", "back"}]}`.
pub fn flashcard_response_format() -> Value {
    json!({
        "type": "json_schema",
        "json_schema": {
            "name": "flashcard_generation",
            "strict": true,
            "schema": {
                "type": "object",
                "properties": {
                    "flashcards": {
                        "type": "array",
                        "description": "Array of generated flashcards",
                        "items": {
                            "type": "object",
                            "properties": {
                                "front": {
                                    "type": "string",
                                    "description": "Question or front side of the flashcard"
                                },
                                "back": {
                                    "type": "string",
                                    "description": "Answer or back side of the flashcard"
                                }
                            },
                            "required": ["front", "back"],
                            "additionalProperties": false
                        }
                    }
                },
                "required": ["flashcards"],
                "additionalProperties": false
            }
        }
    })
}
