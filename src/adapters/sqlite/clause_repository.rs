//! SQLite implementation of the ClauseRepository.
//!
//! Entities live in their own table keyed by clause id and are replaced
//! wholesale whenever their clause is upserted. Re-extracting a document
//! replaces its whole clause set so no earlier generation survives.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection, SqlitePool};

use super::{parse_datetime, parse_json_or_default, to_usize};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Clause, ComplianceCategory, Entity, EntityType};
use crate::domain::ports::{ClauseFilter, ClauseRepository, PageRequest, Paginated};

const CLAUSE_COLUMNS: &str = "id, document_id, clause_index, clause_number, section_reference, text, word_count, \
     sentence_count, category, subtype, confidence, complexity_score, has_mandatory_language, has_penalties, \
     regulatory_references, page_numbers, extraction_method, created_at";

#[derive(Clone)]
pub struct SqliteClauseRepository {
    pool: SqlitePool,
}

impl SqliteClauseRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn attach_entities(&self, rows: Vec<ClauseRow>) -> DomainResult<Vec<Clause>> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let mut query: QueryBuilder<Sqlite> = QueryBuilder::new(
            "SELECT clause_id, entity_type, value, normalized_value, confidence, start_offset, end_offset, context, \
             extraction_method, metadata FROM entities WHERE clause_id IN (",
        );
        let mut separated = query.separated(", ");
        for row in &rows {
            separated.push_bind(row.id.clone());
        }
        query.push(") ORDER BY clause_id, position");

        let entity_rows: Vec<EntityRow> = query.build_query_as().fetch_all(&self.pool).await?;

        let mut by_clause: HashMap<String, Vec<Entity>> = HashMap::new();
        for entity_row in entity_rows {
            let clause_id = entity_row.clause_id.clone();
            by_clause.entry(clause_id).or_default().push(Entity::try_from(entity_row)?);
        }

        rows.into_iter()
            .map(|row| {
                let entities = by_clause.remove(&row.id).unwrap_or_default();
                row.into_clause(entities)
            })
            .collect()
    }
}

/// Writes one clause row and replaces its entities.
async fn write_clause(conn: &mut SqliteConnection, clause: &Clause) -> DomainResult<()> {
    sqlx::query(&format!(
        r#"INSERT INTO clauses ({CLAUSE_COLUMNS})
           VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
           ON CONFLICT(id) DO UPDATE SET
               clause_number = excluded.clause_number,
               section_reference = excluded.section_reference,
               text = excluded.text,
               word_count = excluded.word_count,
               sentence_count = excluded.sentence_count,
               category = excluded.category,
               subtype = excluded.subtype,
               confidence = excluded.confidence,
               complexity_score = excluded.complexity_score,
               has_mandatory_language = excluded.has_mandatory_language,
               has_penalties = excluded.has_penalties,
               regulatory_references = excluded.regulatory_references,
               page_numbers = excluded.page_numbers,
               extraction_method = excluded.extraction_method"#
    ))
    .bind(&clause.id)
    .bind(&clause.document_id)
    .bind(clause.clause_index as i64)
    .bind(&clause.clause_number)
    .bind(&clause.section_reference)
    .bind(&clause.text)
    .bind(clause.word_count as i64)
    .bind(clause.sentence_count as i64)
    .bind(clause.category.as_str())
    .bind(&clause.subtype)
    .bind(clause.confidence)
    .bind(clause.complexity_score)
    .bind(clause.has_mandatory_language)
    .bind(clause.has_penalties)
    .bind(serde_json::to_string(&clause.regulatory_references)?)
    .bind(serde_json::to_string(&clause.page_numbers)?)
    .bind(&clause.extraction_method)
    .bind(clause.created_at.to_rfc3339())
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM entities WHERE clause_id = ?")
        .bind(&clause.id)
        .execute(&mut *conn)
        .await?;

    for (position, entity) in clause.entities.iter().enumerate() {
        sqlx::query(
            r#"INSERT INTO entities (clause_id, position, entity_type, value, normalized_value, confidence,
                   start_offset, end_offset, context, extraction_method, metadata)
               VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
        )
        .bind(&clause.id)
        .bind(position as i64)
        .bind(entity.entity_type.as_str())
        .bind(&entity.value)
        .bind(&entity.normalized_value)
        .bind(entity.confidence)
        .bind(entity.start as i64)
        .bind(entity.end as i64)
        .bind(&entity.context)
        .bind(&entity.extraction_method)
        .bind(serde_json::to_string(&entity.metadata)?)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

fn push_filter(query: &mut QueryBuilder<'_, Sqlite>, filter: &ClauseFilter) {
    query.push(" WHERE 1=1");
    if let Some(document_id) = &filter.document_id {
        query.push(" AND document_id = ").push_bind(document_id.clone());
    }
    if let Some(category) = &filter.category {
        query.push(" AND category = ").push_bind(category.as_str());
    }
    if let Some(min_confidence) = filter.min_confidence {
        query.push(" AND confidence >= ").push_bind(min_confidence);
    }
}

#[async_trait]
impl ClauseRepository for SqliteClauseRepository {
    async fn upsert_batch(&self, clauses: &[Clause]) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;
        for clause in clauses {
            write_clause(&mut *tx, clause).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn replace_for_document(&self, document_id: &str, clauses: &[Clause]) -> DomainResult<()> {
        let mut tx = self.pool.begin().await?;

        // entities, embeddings and mappings cascade from their clause
        sqlx::query("DELETE FROM regulation_mappings WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM clauses WHERE document_id = ?")
            .bind(document_id)
            .execute(&mut *tx)
            .await?;

        for clause in clauses {
            write_clause(&mut *tx, clause).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<Clause>> {
        let row: Option<ClauseRow> = sqlx::query_as(&format!("SELECT {CLAUSE_COLUMNS} FROM clauses WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => Ok(self.attach_entities(vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    async fn list_by_document(&self, document_id: &str) -> DomainResult<Vec<Clause>> {
        let rows: Vec<ClauseRow> = sqlx::query_as(&format!(
            "SELECT {CLAUSE_COLUMNS} FROM clauses WHERE document_id = ? ORDER BY clause_index"
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        self.attach_entities(rows).await
    }

    async fn list(&self, filter: ClauseFilter, page: PageRequest) -> DomainResult<Paginated<Clause>> {
        let mut count_query: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT COUNT(*) FROM clauses");
        push_filter(&mut count_query, &filter);
        let (total,): (i64,) = count_query.build_query_as().fetch_one(&self.pool).await?;

        let mut list_query: QueryBuilder<Sqlite> = QueryBuilder::new(format!("SELECT {CLAUSE_COLUMNS} FROM clauses"));
        push_filter(&mut list_query, &filter);
        list_query
            .push(" ORDER BY document_id, clause_index LIMIT ")
            .push_bind(i64::from(page.limit))
            .push(" OFFSET ")
            .push_bind(page.offset());
        let rows: Vec<ClauseRow> = list_query.build_query_as().fetch_all(&self.pool).await?;

        let items = self.attach_entities(rows).await?;
        Ok(Paginated::new(items, u64::try_from(total).unwrap_or(0), page))
    }
}

#[derive(sqlx::FromRow)]
struct ClauseRow {
    id: String,
    document_id: String,
    clause_index: i64,
    clause_number: String,
    section_reference: String,
    text: String,
    word_count: i64,
    sentence_count: i64,
    category: String,
    subtype: String,
    confidence: f64,
    complexity_score: f64,
    has_mandatory_language: bool,
    has_penalties: bool,
    regulatory_references: Option<String>,
    page_numbers: Option<String>,
    extraction_method: String,
    created_at: String,
}

impl ClauseRow {
    fn into_clause(self, entities: Vec<Entity>) -> DomainResult<Clause> {
        Ok(Clause {
            id: self.id,
            document_id: self.document_id,
            clause_index: to_usize(self.clause_index),
            clause_number: self.clause_number,
            section_reference: self.section_reference,
            text: self.text,
            word_count: to_usize(self.word_count),
            sentence_count: to_usize(self.sentence_count),
            category: ComplianceCategory::parse(&self.category),
            subtype: self.subtype,
            confidence: self.confidence,
            complexity_score: self.complexity_score,
            has_mandatory_language: self.has_mandatory_language,
            has_penalties: self.has_penalties,
            regulatory_references: parse_json_or_default(self.regulatory_references)?,
            entities,
            page_numbers: parse_json_or_default(self.page_numbers)?,
            extraction_method: self.extraction_method,
            created_at: parse_datetime(&self.created_at)?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct EntityRow {
    clause_id: String,
    entity_type: String,
    value: String,
    normalized_value: String,
    confidence: f64,
    start_offset: i64,
    end_offset: i64,
    context: String,
    extraction_method: String,
    metadata: Option<String>,
}

impl TryFrom<EntityRow> for Entity {
    type Error = DomainError;

    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        let entity_type = EntityType::from_str(&row.entity_type)
            .ok_or_else(|| DomainError::Serialization(format!("Invalid entity type: {}", row.entity_type)))?;

        Ok(Self {
            entity_type,
            value: row.value,
            normalized_value: row.normalized_value,
            confidence: row.confidence,
            start: to_usize(row.start_offset),
            end: to_usize(row.end_offset),
            context: row.context,
            extraction_method: row.extraction_method,
            metadata: parse_json_or_default(row.metadata)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, fixtures};
    use crate::domain::models::{ClassificationResult, ClauseCandidate};

    fn clause(document_id: &str, index: usize, category: ComplianceCategory, confidence: f64) -> Clause {
        let text = "The Contractor shall comply with AS 4801 at all times.";
        let candidate = ClauseCandidate {
            label: (index + 1).to_string(),
            section_reference: format!("Clause {}", index + 1),
            text: text.to_string(),
            strategy: "numbered_clauses".to_string(),
        };
        let mut classification = ClassificationResult::unknown("test");
        classification.primary_type = category;
        classification.confidence = confidence;
        classification.regulatory_references = vec!["as 4801".to_string()];

        let entity = Entity {
            entity_type: EntityType::StandardReference,
            value: "AS 4801".to_string(),
            normalized_value: "AS 4801".to_string(),
            confidence: 0.9,
            start: 33,
            end: 40,
            context: text.to_string(),
            extraction_method: "pattern_matching".to_string(),
            metadata: [("pattern".to_string(), "as".to_string())].into_iter().collect(),
        };

        Clause::from_parts(document_id, index, &candidate, classification, vec![entity], vec![1, 2])
    }

    async fn setup() -> SqliteClauseRepository {
        let pool = create_migrated_test_pool().await.unwrap();
        fixtures::insert_document(&pool, "doc_1").await;
        fixtures::insert_document(&pool, "doc_2").await;
        SqliteClauseRepository::new(pool)
    }

    #[tokio::test]
    async fn test_upsert_and_load_with_entities() {
        let repo = setup().await;
        let clauses = vec![
            clause("doc_1", 0, ComplianceCategory::SafetyCompliance, 0.8),
            clause("doc_1", 1, ComplianceCategory::CommercialTerms, 0.4),
        ];
        repo.upsert_batch(&clauses).await.unwrap();

        let loaded = repo.list_by_document("doc_1").await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].id, "doc_1_clause_000");
        assert_eq!(loaded[0].category, ComplianceCategory::SafetyCompliance);
        assert_eq!(loaded[0].page_numbers, vec![1, 2]);
        assert_eq!(loaded[0].regulatory_references, vec!["as 4801".to_string()]);
        assert_eq!(loaded[0].entities, clauses[0].entities);

        let single = repo.get("doc_1_clause_001").await.unwrap().unwrap();
        assert_eq!(single.category, ComplianceCategory::CommercialTerms);
        assert_eq!(single.entities.len(), 1);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent() {
        let repo = setup().await;
        let clauses = vec![clause("doc_1", 0, ComplianceCategory::SafetyCompliance, 0.8)];

        repo.upsert_batch(&clauses).await.unwrap();
        repo.upsert_batch(&clauses).await.unwrap();

        let loaded = repo.list_by_document("doc_1").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].entities.len(), 1);
    }

    #[tokio::test]
    async fn test_replace_for_document_drops_earlier_generation() {
        use crate::adapters::sqlite::SqliteMappingRepository;
        use crate::domain::models::{RegulationMapping, RegulationMatch};
        use crate::domain::ports::MappingRepository;

        let pool = create_migrated_test_pool().await.unwrap();
        fixtures::insert_document(&pool, "doc_1").await;
        fixtures::insert_document(&pool, "doc_2").await;
        let repo = SqliteClauseRepository::new(pool.clone());
        let mappings = SqliteMappingRepository::new(pool);

        repo.upsert_batch(&[
            clause("doc_1", 0, ComplianceCategory::SafetyCompliance, 0.8),
            clause("doc_1", 1, ComplianceCategory::SafetyCompliance, 0.7),
            clause("doc_1", 2, ComplianceCategory::CommercialTerms, 0.6),
            clause("doc_2", 0, ComplianceCategory::SafetyCompliance, 0.9),
        ])
        .await
        .unwrap();
        let hit = RegulationMatch {
            id: "WHS-2011-19".to_string(),
            text: "Primary duty of care".to_string(),
            category: ComplianceCategory::SafetyCompliance,
            score: 0.9,
        };
        mappings
            .upsert_mappings(&[RegulationMapping::from_match("doc_1", "doc_1_clause_002", &hit)])
            .await
            .unwrap();

        repo.replace_for_document("doc_1", &[clause("doc_1", 0, ComplianceCategory::SafetyCompliance, 0.8)])
            .await
            .unwrap();

        let remaining = repo.list_by_document("doc_1").await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].entities.len(), 1);
        assert!(repo.get("doc_1_clause_002").await.unwrap().is_none());
        assert!(mappings.list_by_document("doc_1").await.unwrap().is_empty());
        assert_eq!(repo.list_by_document("doc_2").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_with_filter() {
        let repo = setup().await;
        repo.upsert_batch(&[
            clause("doc_1", 0, ComplianceCategory::SafetyCompliance, 0.8),
            clause("doc_1", 1, ComplianceCategory::SafetyCompliance, 0.2),
            clause("doc_2", 0, ComplianceCategory::SafetyCompliance, 0.9),
        ])
        .await
        .unwrap();

        let page = repo
            .list(
                ClauseFilter {
                    document_id: Some("doc_1".to_string()),
                    category: Some(ComplianceCategory::SafetyCompliance),
                    min_confidence: Some(0.5),
                },
                PageRequest::default(),
            )
            .await
            .unwrap();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.items[0].id, "doc_1_clause_000");

        let all = repo.list(ClauseFilter::default(), PageRequest::new(1, 2)).await.unwrap();
        assert_eq!(all.total_count, 3);
        assert_eq!(all.items.len(), 2);
    }
}
