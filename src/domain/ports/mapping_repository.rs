//! Regulation mapping repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{ClauseEmbedding, RegulationMapping};

use super::pagination::{PageRequest, Paginated};

#[async_trait]
pub trait MappingRepository: Send + Sync {
    /// Insert or replace the embedding stored for a clause.
    async fn upsert_embedding(&self, embedding: &ClauseEmbedding) -> DomainResult<()>;

    async fn get_embedding(&self, clause_id: &str) -> DomainResult<Option<ClauseEmbedding>>;

    /// Insert or update mappings keyed by `(clause_id, regulation_id)`.
    async fn upsert_mappings(&self, mappings: &[RegulationMapping]) -> DomainResult<()>;

    /// Every mapping of a document's clauses.
    async fn list_by_document(&self, document_id: &str) -> DomainResult<Vec<RegulationMapping>>;

    async fn page_by_document(&self, document_id: &str, page: PageRequest) -> DomainResult<Paginated<RegulationMapping>>;
}
