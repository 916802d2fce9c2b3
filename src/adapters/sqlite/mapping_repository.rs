//! SQLite implementation of the MappingRepository.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;

use super::{bytes_to_embedding, embedding_to_bytes, parse_datetime};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ClauseEmbedding, ComplianceCategory, RegulationMapping};
use crate::domain::ports::{MappingRepository, PageRequest, Paginated};

const MAPPING_COLUMNS: &str =
    "id, document_id, clause_id, regulation_id, similarity_score, mapping_type, compliance_category, created_at";

#[derive(Clone)]
pub struct SqliteMappingRepository {
    pool: SqlitePool,
}

impl SqliteMappingRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MappingRepository for SqliteMappingRepository {
    async fn upsert_embedding(&self, embedding: &ClauseEmbedding) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO clause_embeddings (clause_id, model, vector, updated_at)
               VALUES (?, ?, ?, ?)
               ON CONFLICT(clause_id) DO UPDATE SET
                   model = excluded.model,
                   vector = excluded.vector,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&embedding.clause_id)
        .bind(&embedding.model)
        .bind(embedding_to_bytes(&embedding.vector))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get_embedding(&self, clause_id: &str) -> DomainResult<Option<ClauseEmbedding>> {
        let row: Option<(String, String, Vec<u8>)> =
            sqlx::query_as("SELECT clause_id, model, vector FROM clause_embeddings WHERE clause_id = ?")
                .bind(clause_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(|(clause_id, model, vector)| {
            Ok(ClauseEmbedding {
                clause_id,
                model,
                vector: bytes_to_embedding(&vector)?,
            })
        })
        .transpose()
    }

    async fn upsert_mappings(&self, mappings: &[RegulationMapping]) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        for mapping in mappings {
            sqlx::query(&format!(
                r#"INSERT INTO regulation_mappings ({MAPPING_COLUMNS})
                   VALUES (?, ?, ?, ?, ?, ?, ?, ?)
                   ON CONFLICT(clause_id, regulation_id) DO UPDATE SET
                       similarity_score = excluded.similarity_score,
                       mapping_type = excluded.mapping_type,
                       compliance_category = excluded.compliance_category"#
            ))
            .bind(&mapping.id)
            .bind(&mapping.document_id)
            .bind(&mapping.clause_id)
            .bind(&mapping.regulation_id)
            .bind(mapping.similarity_score)
            .bind(&mapping.mapping_type)
            .bind(mapping.compliance_category.as_str())
            .bind(mapping.created_at.to_rfc3339())
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn list_by_document(&self, document_id: &str) -> DomainResult<Vec<RegulationMapping>> {
        let rows: Vec<MappingRow> = sqlx::query_as(&format!(
            "SELECT {MAPPING_COLUMNS} FROM regulation_mappings WHERE document_id = ? ORDER BY clause_id, similarity_score DESC"
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(RegulationMapping::try_from).collect()
    }

    async fn page_by_document(&self, document_id: &str, page: PageRequest) -> DomainResult<Paginated<RegulationMapping>> {
        let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM regulation_mappings WHERE document_id = ?")
            .bind(document_id)
            .fetch_one(&self.pool)
            .await?;

        let rows: Vec<MappingRow> = sqlx::query_as(&format!(
            "SELECT {MAPPING_COLUMNS} FROM regulation_mappings WHERE document_id = ? ORDER BY clause_id, similarity_score DESC LIMIT ? OFFSET ?"
        ))
        .bind(document_id)
        .bind(i64::from(page.limit))
        .bind(page.offset())
        .fetch_all(&self.pool)
        .await?;

        let items = rows.into_iter().map(RegulationMapping::try_from).collect::<DomainResult<Vec<_>>>()?;
        Ok(Paginated::new(items, u64::try_from(total).unwrap_or(0), page))
    }
}

#[derive(sqlx::FromRow)]
struct MappingRow {
    id: String,
    document_id: String,
    clause_id: String,
    regulation_id: String,
    similarity_score: f64,
    mapping_type: String,
    compliance_category: String,
    created_at: String,
}

impl TryFrom<MappingRow> for RegulationMapping {
    type Error = DomainError;

    fn try_from(row: MappingRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            document_id: row.document_id,
            clause_id: row.clause_id,
            regulation_id: row.regulation_id,
            similarity_score: row.similarity_score,
            mapping_type: row.mapping_type,
            compliance_category: ComplianceCategory::parse(&row.compliance_category),
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, fixtures, SqliteClauseRepository};
    use crate::domain::models::{ClassificationResult, Clause, ClauseCandidate, RegulationMatch};
    use crate::domain::ports::ClauseRepository;

    async fn setup() -> SqliteMappingRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        fixtures::insert_document(&pool, "doc_1").await;

        let clauses: Vec<Clause> = (0..2)
            .map(|i| {
                let candidate = ClauseCandidate {
                    label: format!("P{}", i + 1),
                    section_reference: format!("Paragraph {}", i + 1),
                    text: "Paragraph text long enough to keep around.".to_string(),
                    strategy: "paragraph_split".to_string(),
                };
                Clause::from_parts("doc_1", i, &candidate, ClassificationResult::unknown("test"), vec![], vec![1])
            })
            .collect();
        SqliteClauseRepository::new(pool.clone()).upsert_batch(&clauses).await.unwrap();

        SqliteMappingRepository::new(pool)
    }

    fn mapping(clause_id: &str, regulation_id: &str, score: f64) -> RegulationMapping {
        RegulationMapping::from_match(
            "doc_1",
            clause_id,
            &RegulationMatch {
                id: regulation_id.to_string(),
                text: String::new(),
                category: ComplianceCategory::EnvironmentalCompliance,
                score,
            },
        )
    }

    #[tokio::test]
    async fn test_embedding_roundtrip_and_replace() {
        let repo = setup().await;
        let mut embedding = ClauseEmbedding {
            clause_id: "doc_1_clause_000".to_string(),
            model: "hashing-v1".to_string(),
            vector: vec![0.5, -0.25, 0.125],
        };
        repo.upsert_embedding(&embedding).await.unwrap();
        embedding.vector = vec![1.0, 0.0, 0.0];
        repo.upsert_embedding(&embedding).await.unwrap();

        assert_eq!(repo.get_embedding("doc_1_clause_000").await.unwrap(), Some(embedding));
        assert!(repo.get_embedding("doc_1_clause_001").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mappings_unique_per_clause_and_regulation() {
        let repo = setup().await;
        repo.upsert_mappings(&[mapping("doc_1_clause_000", "epbc-1", 0.8), mapping("doc_1_clause_000", "whs-2", 0.9)])
            .await
            .unwrap();
        repo.upsert_mappings(&[mapping("doc_1_clause_000", "epbc-1", 0.85)]).await.unwrap();

        let all = repo.list_by_document("doc_1").await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].regulation_id, "whs-2");
        assert!((all[1].similarity_score - 0.85).abs() < 1e-9);
        assert_eq!(all[1].compliance_category, ComplianceCategory::EnvironmentalCompliance);

        let page = repo.page_by_document("doc_1", PageRequest::new(2, 1)).await.unwrap();
        assert_eq!(page.total_count, 2);
        assert_eq!(page.items[0].regulation_id, "epbc-1");
    }
}
