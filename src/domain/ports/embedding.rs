//! Embedding provider and regulation index ports.
//!
//! The semantic mapper only fetches a vector per clause and asks the index
//! for regulations above a threshold; ranking and vector math live behind
//! these traits.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Regulation, RegulationMatch};

/// Converts text into a dense vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name (e.g., "openai", "hashing").
    fn name(&self) -> &'static str;

    /// Model identifier recorded alongside stored embeddings.
    fn model(&self) -> &str;

    /// Embedding dimension for this provider/model.
    fn dimension(&self) -> usize;

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>>;
}

/// Store of regulation embeddings queried by similarity.
#[async_trait]
pub trait RegulationIndex: Send + Sync {
    /// Regulations with similarity `>= threshold`, best first, at most `limit`.
    async fn similar(&self, vector: &[f32], threshold: f64, limit: usize) -> DomainResult<Vec<RegulationMatch>>;

    /// Insert or replace a regulation and its embedding.
    async fn upsert(&self, regulation: &Regulation, vector: &[f32]) -> DomainResult<()>;

    async fn count(&self) -> DomainResult<u64>;
}
