//! Domain errors for the compliance pipeline.

use thiserror::Error;

/// Domain-level errors that can occur in the compliance pipeline.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Bad input document or request. Never retried.
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// Storage, network or service hiccup. Eligible for retry.
    #[error("Transient infrastructure error: {0}")]
    TransientInfra(String),

    /// Stage input is not available yet (an OCR job still running). The
    /// document keeps its status until a later delivery.
    #[error("Not ready: {0}")]
    NotReady(String),

    /// A single clause or entity failed inside a batch.
    #[error("Classification degraded: {0}")]
    ClassificationDegradation(String),

    /// Unrecoverable stage error; the document is moved to `failed`.
    #[error("Pipeline stage {stage} failed: {reason}")]
    PipelineFailure { stage: String, reason: String },

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound { entity, id: id.into() }
    }

    pub fn pipeline(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::PipelineFailure { stage: stage.into(), reason: reason.into() }
    }

    /// Whether a retry has a chance of succeeding.
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::TransientInfra(_))
    }

    pub const fn is_not_ready(&self) -> bool {
        matches!(self, Self::NotReady(_))
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                Self::TransientInfra(err.to_string())
            }
            other => Self::Database(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for DomainError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound { entity: "File", id: err.to_string() },
            _ => Self::TransientInfra(err.to_string()),
        }
    }
}

impl From<reqwest::Error> for DomainError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() || err.is_connect() || err.status().is_some_and(|s| s.is_server_error()) {
            Self::TransientInfra(err.to_string())
        } else {
            Self::Validation(err.to_string())
        }
    }
}
