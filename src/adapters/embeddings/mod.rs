//! Embedding provider adapters.

pub mod hashing;
pub mod openai;

use std::sync::Arc;

pub use hashing::HashingEmbeddingProvider;
pub use openai::{OpenAiEmbeddingConfig, OpenAiEmbeddingProvider};

use crate::domain::errors::DomainResult;
use crate::domain::models::{EmbeddingConfig, EmbeddingProviderKind};
use crate::domain::ports::EmbeddingProvider;

/// Builds the provider selected in configuration.
pub fn provider_from_config(config: &EmbeddingConfig) -> DomainResult<Arc<dyn EmbeddingProvider>> {
    Ok(match config.provider {
        EmbeddingProviderKind::Hashing => Arc::new(HashingEmbeddingProvider::new(config.dimension)?),
        EmbeddingProviderKind::Openai => {
            Arc::new(OpenAiEmbeddingProvider::new(OpenAiEmbeddingConfig::from(config))?)
        }
    })
}
