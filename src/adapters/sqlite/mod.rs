//! SQLite adapters for the compliance metadata store and regulation index.

pub mod analysis_repository;
pub mod clause_repository;
pub mod connection;
pub mod document_repository;
pub mod mapping_repository;
pub mod migrations;
pub mod page_repository;
pub mod regulation_index;
pub mod report_repository;

pub use analysis_repository::SqliteAnalysisRepository;
pub use clause_repository::SqliteClauseRepository;
pub use connection::{create_pool, create_test_pool, database_url, verify_connection, ConnectionError, PoolConfig};
pub use document_repository::SqliteDocumentRepository;
pub use mapping_repository::SqliteMappingRepository;
pub use migrations::{all_embedded_migrations, Migration, MigrationError, Migrator};
pub use page_repository::SqlitePageRepository;
pub use regulation_index::SqliteRegulationIndex;
pub use report_repository::SqliteReportRepository;

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::DatabaseConfig;

/// Parse an RFC3339 datetime string from a SQLite row field.
pub fn parse_datetime(s: &str) -> DomainResult<DateTime<Utc>> {
    chrono::DateTime::parse_from_rfc3339(s)
        .map_err(|e| DomainError::Serialization(e.to_string()))
        .map(|dt| dt.with_timezone(&Utc))
}

/// Parse a JSON string from a SQLite row field, falling back to the type's default.
pub fn parse_json_or_default<T: serde::de::DeserializeOwned + Default>(s: Option<String>) -> DomainResult<T> {
    s.filter(|s| !s.is_empty())
        .map(|s| serde_json::from_str(&s))
        .transpose()
        .map_err(|e| DomainError::Serialization(e.to_string()))
        .map(|opt| opt.unwrap_or_default())
}

/// Serialize an embedding vector to little-endian bytes for storage.
pub fn embedding_to_bytes(embedding: &[f32]) -> Vec<u8> {
    embedding.iter().flat_map(|f| f.to_le_bytes()).collect()
}

/// Deserialize an embedding vector from little-endian bytes.
pub fn bytes_to_embedding(bytes: &[u8]) -> DomainResult<Vec<f32>> {
    if bytes.len() % 4 != 0 {
        return Err(DomainError::Serialization(format!(
            "Invalid embedding bytes length: {}",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(4)
        .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
        .collect())
}

/// Converts a stored non-negative integer column.
pub(crate) fn to_usize(value: i64) -> usize {
    usize::try_from(value).unwrap_or(0)
}

#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[from] ConnectionError),
    #[error("Migration error: {0}")]
    Migration(#[from] MigrationError),
    #[error("Query error: {0}")]
    Query(#[from] sqlx::Error),
}

pub async fn initialize_database(config: &DatabaseConfig) -> Result<SqlitePool, DatabaseError> {
    let pool = create_pool(&database_url(&config.path), Some(PoolConfig::from(config))).await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

/// Create an in-memory test pool with all migrations applied.
pub async fn create_migrated_test_pool() -> Result<SqlitePool, DatabaseError> {
    let pool = create_test_pool().await?;
    let migrator = Migrator::new(pool.clone());
    migrator.run_embedded_migrations(all_embedded_migrations()).await?;
    Ok(pool)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_bytes_roundtrip() {
        let vector = vec![0.25_f32, -1.5, 3.0];
        let bytes = embedding_to_bytes(&vector);
        assert_eq!(bytes.len(), 12);
        assert_eq!(bytes_to_embedding(&bytes).unwrap(), vector);
        assert!(bytes_to_embedding(&bytes[..5]).is_err());
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::domain::models::{Document, DocumentType};
    use crate::domain::ports::DocumentRepository;

    use super::SqliteDocumentRepository;

    /// Inserts a bare uploaded document so child rows satisfy foreign keys.
    pub async fn insert_document(pool: &sqlx::SqlitePool, id: &str) -> Document {
        let document = Document::new(id, "contract.pdf", 2048, format!("hash-{id}"), DocumentType::VendorContract);
        SqliteDocumentRepository::new(pool.clone()).create(&document).await.unwrap();
        document
    }
}
