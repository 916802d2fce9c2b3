//! Deterministic local embedding provider.
//!
//! Feature hashing over lowercase word tokens: each token is hashed with
//! SHA-256 into one of `dimension` buckets with a sign bit, then the vector is
//! L2-normalized. Texts sharing vocabulary land close together, which is
//! enough for offline runs and tests without an embedding server.

use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::EmbeddingProvider;

pub const HASHING_MODEL: &str = "feature-hashing-v1";

#[derive(Debug, Clone)]
pub struct HashingEmbeddingProvider {
    dimension: usize,
}

impl HashingEmbeddingProvider {
    pub fn new(dimension: usize) -> DomainResult<Self> {
        if dimension == 0 {
            return Err(DomainError::Validation("embedding dimension must be positive".to_string()));
        }
        Ok(Self { dimension })
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimension];

        for token in tokens(text) {
            let digest = Sha256::digest(token.as_bytes());
            let mut bucket_bytes = [0u8; 8];
            bucket_bytes.copy_from_slice(&digest[..8]);
            let bucket = (u64::from_le_bytes(bucket_bytes) % self.dimension as u64) as usize;
            let sign = if digest[8] & 1 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            for value in &mut vector {
                *value /= norm;
            }
        }

        vector
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() > 1)
        .map(str::to_lowercase)
}

#[async_trait]
impl EmbeddingProvider for HashingEmbeddingProvider {
    fn name(&self) -> &'static str {
        "hashing"
    }

    fn model(&self) -> &str {
        HASHING_MODEL
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn embed(&self, text: &str) -> DomainResult<Vec<f32>> {
        Ok(self.vector(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::regulation_index::cosine_similarity;

    fn provider() -> HashingEmbeddingProvider {
        HashingEmbeddingProvider::new(256).unwrap()
    }

    #[test]
    fn test_zero_dimension_rejected() {
        assert!(HashingEmbeddingProvider::new(0).is_err());
    }

    #[tokio::test]
    async fn test_deterministic_and_normalized() {
        let provider = provider();
        let a = provider.embed("Work health and safety management system").await.unwrap();
        let b = provider.embed("Work health and safety management system").await.unwrap();

        assert_eq!(a, b);
        assert_eq!(a.len(), 256);
        let norm: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-5);
    }

    #[test]
    fn test_case_and_punctuation_insensitive() {
        let provider = provider();
        assert_eq!(provider.vector("Safety, HEALTH!"), provider.vector("safety health"));
    }

    #[test]
    fn test_shared_vocabulary_scores_higher() {
        let provider = provider();
        let clause = provider.vector("The contractor shall maintain a safety management system");
        let related = provider.vector("Safety management system requirements for contractors");
        let unrelated = provider.vector("Payment of invoices within thirty days");

        assert!(cosine_similarity(&clause, &related) > cosine_similarity(&clause, &unrelated));
    }

    #[test]
    fn test_empty_text_is_zero_vector() {
        assert!(provider().vector("  ").iter().all(|v| *v == 0.0));
    }
}
