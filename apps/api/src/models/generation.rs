use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

/// Model name recorded before the AI provider has answered.
pub const PENDING_MODEL_NAME: &str = "pending";

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct GenerationSessionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub source_text: String,
    pub llm_response: Value,
    pub model_name: String,
    pub generated_count: i32,
    pub accepted_count: i32,
    pub rejected_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Aggregated generation counters for one user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GenerationTotals {
    pub sessions: u64,
    pub generated: u64,
    pub accepted: u64,
    pub rejected: u64,
}
