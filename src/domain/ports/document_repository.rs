//! Document repository port.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{Document, DocumentStatus, DocumentType, OcrPage};

use super::pagination::{PageRequest, Paginated};

/// Filter criteria for listing documents.
#[derive(Debug, Clone, Default)]
pub struct DocumentFilter {
    pub status: Option<DocumentStatus>,
    pub document_type: Option<DocumentType>,
}

/// Repository interface for Document persistence.
#[async_trait]
pub trait DocumentRepository: Send + Sync {
    async fn create(&self, document: &Document) -> DomainResult<()>;

    async fn get(&self, id: &str) -> DomainResult<Option<Document>>;

    async fn find_by_hash(&self, content_hash: &str) -> DomainResult<Option<Document>>;

    async fn list(&self, filter: DocumentFilter, page: PageRequest) -> DomainResult<Paginated<Document>>;

    /// Compare-and-set status change. Returns `false` when the document was
    /// not in `expected`, leaving it untouched.
    async fn transition(&self, id: &str, expected: DocumentStatus, new_status: DocumentStatus) -> DomainResult<bool>;

    /// Merge keys into the document's metadata map.
    async fn merge_metadata(&self, id: &str, entries: BTreeMap<String, serde_json::Value>) -> DomainResult<()>;
}

/// Repository interface for normalized OCR pages.
#[async_trait]
pub trait PageRepository: Send + Sync {
    /// Insert or replace pages keyed by `(document_id, page_number)`.
    async fn upsert_pages(&self, document_id: &str, pages: &[OcrPage]) -> DomainResult<()>;

    async fn list_pages(&self, document_id: &str) -> DomainResult<Vec<OcrPage>>;
}
