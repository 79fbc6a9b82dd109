//! Error types for Zenark.

use std::time::Duration;

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Report error: {0}")]
    Report(#[from] ReportError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Database-related errors.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: String, id: String },

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Chat service errors.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("Empty message")]
    EmptyMessage,

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Report generation errors.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("Empty conversation transcript")]
    EmptyTranscript,

    #[error("Could not parse distress score from model output: {0}")]
    ScoreParse(String),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
