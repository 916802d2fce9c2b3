//! Clause repository port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Clause, ComplianceCategory};

use super::pagination::{PageRequest, Paginated};

#[derive(Debug, Clone, Default)]
pub struct ClauseFilter {
    pub document_id: Option<String>,
    pub category: Option<ComplianceCategory>,
    pub min_confidence: Option<f64>,
}

/// Repository interface for clauses and their owned entities.
#[async_trait]
pub trait ClauseRepository: Send + Sync {
    /// Insert clauses with their entities, replacing any row with the same id.
    async fn upsert_batch(&self, clauses: &[Clause]) -> DomainResult<()>;

    /// Replace a document's clause set. Clauses missing from `clauses` are
    /// removed along with their entities, embeddings and mappings.
    async fn replace_for_document(&self, document_id: &str, clauses: &[Clause]) -> DomainResult<()>;

    async fn get(&self, id: &str) -> DomainResult<Option<Clause>>;

    /// All clauses of a document in clause order, entities included.
    async fn list_by_document(&self, document_id: &str) -> DomainResult<Vec<Clause>>;

    async fn list(&self, filter: ClauseFilter, page: PageRequest) -> DomainResult<Paginated<Clause>>;
}
