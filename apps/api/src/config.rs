use anyhow::{bail, Context, Result};

const DEFAULT_OPENROUTER_BASE_URL: &str = "https://openrouter.ai/api/v1";
const DEFAULT_OPENROUTER_MODEL: &str = "openai/gpt-4o-mini";

/// Where in-progress learning session queues live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueBackend {
    /// Process-local map. Queues are lost on restart.
    Memory,
    /// Shared Redis lists keyed by session id.
    Redis { url: String, ttl_secs: u64 },
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub openrouter_api_key: String,
    pub openrouter_base_url: String,
    pub openrouter_model: String,
    pub queue_backend: QueueBackend,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            openrouter_api_key: require_env("OPENROUTER_API_KEY")?,
            openrouter_base_url: env_or("OPENROUTER_BASE_URL", DEFAULT_OPENROUTER_BASE_URL),
            openrouter_model: env_or("OPENROUTER_MODEL", DEFAULT_OPENROUTER_MODEL),
            queue_backend: queue_backend_from_env()?,
            port: env_or("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn queue_backend_from_env() -> Result<QueueBackend> {
    let backend = env_or("SESSION_QUEUE_BACKEND", "memory");
    match backend.to_ascii_lowercase().as_str() {
        "memory" => Ok(QueueBackend::Memory),
        "redis" => Ok(QueueBackend::Redis {
            url: require_env("REDIS_URL")?,
            ttl_secs: env_or("SESSION_QUEUE_TTL_SECS", "86400")
                .parse::<u64>()
                .context("SESSION_QUEUE_TTL_SECS must be a number of seconds")?,
        }),
        other => bail!("SESSION_QUEUE_BACKEND must be 'memory' or 'redis', got '{other}'"),
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
