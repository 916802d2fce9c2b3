//! SQLite implementation of the DocumentRepository.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use super::{parse_datetime, parse_json_or_default};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Document, DocumentStatus, DocumentType};
use crate::domain::ports::{DocumentFilter, DocumentRepository, PageRequest, Paginated};

const DOCUMENT_COLUMNS: &str =
    "id, filename, file_size, content_hash, document_type, status, metadata, created_at, updated_at";

#[derive(Clone)]
pub struct SqliteDocumentRepository {
    pool: SqlitePool,
}

impl SqliteDocumentRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn exists(&self, id: &str) -> DomainResult<bool> {
        let row: Option<(String,)> = sqlx::query_as("SELECT id FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl DocumentRepository for SqliteDocumentRepository {
    async fn create(&self, document: &Document) -> DomainResult<()> {
        let metadata_json = serde_json::to_string(&document.metadata)?;

        sqlx::query(
            r#"INSERT INTO documents (id, filename, file_size, content_hash, document_type, status, metadata, created_at, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&document.id)
        .bind(&document.filename)
        .bind(i64::try_from(document.file_size).unwrap_or(i64::MAX))
        .bind(&document.content_hash)
        .bind(document.document_type.as_str())
        .bind(document.status.as_str())
        .bind(&metadata_json)
        .bind(document.created_at.to_rfc3339())
        .bind(document.updated_at.to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Document>> {
        let row: Option<DocumentRow> =
            sqlx::query_as(&format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?"))
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Document::try_from).transpose()
    }

    async fn find_by_hash(&self, content_hash: &str) -> DomainResult<Option<Document>> {
        let row: Option<DocumentRow> = sqlx::query_as(&format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE content_hash = ? ORDER BY created_at LIMIT 1"
        ))
        .bind(content_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(Document::try_from).transpose()
    }

    async fn list(&self, filter: DocumentFilter, page: PageRequest) -> DomainResult<Paginated<Document>> {
        let mut where_clause = String::from(" WHERE 1=1");
        let mut bindings: Vec<&'static str> = Vec::new();

        if let Some(status) = &filter.status {
            where_clause.push_str(" AND status = ?");
            bindings.push(status.as_str());
        }

        if let Some(document_type) = &filter.document_type {
            where_clause.push_str(" AND document_type = ?");
            bindings.push(document_type.as_str());
        }

        let count_sql = format!("SELECT COUNT(*) FROM documents{where_clause}");
        let mut count_query = sqlx::query_as::<_, (i64,)>(&count_sql);
        for binding in &bindings {
            count_query = count_query.bind(*binding);
        }
        let (total,) = count_query.fetch_one(&self.pool).await?;

        let list_sql =
            format!("SELECT {DOCUMENT_COLUMNS} FROM documents{where_clause} ORDER BY created_at DESC, id LIMIT ? OFFSET ?");
        let mut list_query = sqlx::query_as::<_, DocumentRow>(&list_sql);
        for binding in &bindings {
            list_query = list_query.bind(*binding);
        }
        let rows = list_query
            .bind(i64::from(page.limit))
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?;

        let items = rows.into_iter().map(Document::try_from).collect::<DomainResult<Vec<_>>>()?;
        Ok(Paginated::new(items, u64::try_from(total).unwrap_or(0), page))
    }

    async fn transition(&self, id: &str, expected: DocumentStatus, new_status: DocumentStatus) -> DomainResult<bool> {
        let result = sqlx::query("UPDATE documents SET status = ?, updated_at = ? WHERE id = ? AND status = ?")
            .bind(new_status.as_str())
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .bind(expected.as_str())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            if !self.exists(id).await? {
                return Err(DomainError::not_found("Document", id));
            }
            return Ok(false);
        }

        Ok(true)
    }

    async fn merge_metadata(&self, id: &str, entries: BTreeMap<String, serde_json::Value>) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        let row: Option<(String,)> = sqlx::query_as("SELECT metadata FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some((raw,)) = row else {
            return Err(DomainError::not_found("Document", id));
        };

        let mut metadata: BTreeMap<String, serde_json::Value> = parse_json_or_default(Some(raw))?;
        metadata.extend(entries);

        sqlx::query("UPDATE documents SET metadata = ?, updated_at = ? WHERE id = ?")
            .bind(serde_json::to_string(&metadata)?)
            .bind(Utc::now().to_rfc3339())
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    filename: String,
    file_size: i64,
    content_hash: String,
    document_type: String,
    status: String,
    metadata: Option<String>,
    created_at: String,
    updated_at: String,
}

impl TryFrom<DocumentRow> for Document {
    type Error = DomainError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let document_type = DocumentType::from_str(&row.document_type)
            .ok_or_else(|| DomainError::Serialization(format!("Invalid document type: {}", row.document_type)))?;

        let status = DocumentStatus::from_str(&row.status)
            .ok_or_else(|| DomainError::Serialization(format!("Invalid status: {}", row.status)))?;

        Ok(Self {
            id: row.id,
            filename: row.filename,
            file_size: u64::try_from(row.file_size).unwrap_or(0),
            content_hash: row.content_hash,
            document_type,
            status,
            metadata: parse_json_or_default(row.metadata)?,
            created_at: parse_datetime(&row.created_at)?,
            updated_at: parse_datetime(&row.updated_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::create_migrated_test_pool;

    async fn setup_test_repo() -> SqliteDocumentRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        SqliteDocumentRepository::new(pool)
    }

    fn document(id: &str, hash: &str) -> Document {
        Document::new(id, "contract.pdf", 1024, hash, DocumentType::VendorContract)
            .with_metadata("raw_key", format!("documents/{id}/contract.pdf"))
    }

    #[tokio::test]
    async fn test_create_and_get_document() {
        let repo = setup_test_repo().await;
        let doc = document("doc_1", "abc");
        repo.create(&doc).await.unwrap();

        let retrieved = repo.get("doc_1").await.unwrap().unwrap();
        assert_eq!(retrieved.filename, "contract.pdf");
        assert_eq!(retrieved.status, DocumentStatus::Uploaded);
        assert_eq!(retrieved.metadata_str("raw_key"), Some("documents/doc_1/contract.pdf"));

        assert!(repo.get("doc_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_find_by_hash() {
        let repo = setup_test_repo().await;
        repo.create(&document("doc_1", "abc")).await.unwrap();

        assert_eq!(repo.find_by_hash("abc").await.unwrap().map(|d| d.id), Some("doc_1".to_string()));
        assert!(repo.find_by_hash("def").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_transition_is_compare_and_set() {
        let repo = setup_test_repo().await;
        repo.create(&document("doc_1", "abc")).await.unwrap();

        assert!(repo
            .transition("doc_1", DocumentStatus::Uploaded, DocumentStatus::OcrCompleted)
            .await
            .unwrap());
        // Second delivery sees the status already moved.
        assert!(!repo
            .transition("doc_1", DocumentStatus::Uploaded, DocumentStatus::OcrCompleted)
            .await
            .unwrap());
        assert_eq!(repo.get("doc_1").await.unwrap().unwrap().status, DocumentStatus::OcrCompleted);

        let err = repo
            .transition("doc_missing", DocumentStatus::Uploaded, DocumentStatus::OcrCompleted)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_merge_metadata_keeps_existing_keys() {
        let repo = setup_test_repo().await;
        repo.create(&document("doc_1", "abc")).await.unwrap();

        let mut entries = BTreeMap::new();
        entries.insert("ocr_job_id".to_string(), serde_json::json!("ocrjob:raw:key"));
        repo.merge_metadata("doc_1", entries).await.unwrap();

        let doc = repo.get("doc_1").await.unwrap().unwrap();
        assert_eq!(doc.metadata_str("ocr_job_id"), Some("ocrjob:raw:key"));
        assert!(doc.metadata.contains_key("raw_key"));
    }

    #[tokio::test]
    async fn test_list_with_filter_and_pagination() {
        let repo = setup_test_repo().await;
        for i in 0..5 {
            repo.create(&document(&format!("doc_{i}"), &format!("hash_{i}"))).await.unwrap();
        }
        repo.transition("doc_0", DocumentStatus::Uploaded, DocumentStatus::Failed).await.unwrap();

        let page = repo.list(DocumentFilter::default(), PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(page.items.len(), 2);
        assert_eq!(page.total_count, 5);
        assert_eq!(page.total_pages(), 3);

        let failed = repo
            .list(
                DocumentFilter { status: Some(DocumentStatus::Failed), ..Default::default() },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(failed.total_count, 1);
        assert_eq!(failed.items[0].id, "doc_0");

        let regulations = repo
            .list(
                DocumentFilter { document_type: Some(DocumentType::Regulation), ..Default::default() },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert!(regulations.items.is_empty());
    }
}
