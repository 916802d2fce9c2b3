//! Regulation embeddings in SQLite, ranked by cosine similarity in process.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use super::{bytes_to_embedding, embedding_to_bytes};
use crate::domain::errors::DomainResult;
use crate::domain::models::{ComplianceCategory, Regulation, RegulationMatch};
use crate::domain::ports::RegulationIndex;

#[derive(Clone)]
pub struct SqliteRegulationIndex {
    pool: SqlitePool,
}

impl SqliteRegulationIndex {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: &str) -> DomainResult<Option<Regulation>> {
        let row: Option<(String, String, String, String, Option<String>)> =
            sqlx::query_as("SELECT id, title, text, category, jurisdiction FROM regulations WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(row.map(|(id, title, text, category, jurisdiction)| Regulation {
            id,
            title,
            text,
            category: ComplianceCategory::parse(&category),
            jurisdiction,
        }))
    }
}

/// Cosine similarity; 0 for empty, zero-norm or mismatched vectors.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot_product: f64 = a.iter().zip(b.iter()).map(|(x, y)| f64::from(*x) * f64::from(*y)).sum();
    let norm_a: f64 = a.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();
    let norm_b: f64 = b.iter().map(|x| f64::from(*x).powi(2)).sum::<f64>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot_product / (norm_a * norm_b)
}

#[async_trait]
impl RegulationIndex for SqliteRegulationIndex {
    async fn similar(&self, vector: &[f32], threshold: f64, limit: usize) -> DomainResult<Vec<RegulationMatch>> {
        let rows: Vec<(String, String, String, Vec<u8>)> =
            sqlx::query_as("SELECT id, text, category, embedding FROM regulations")
                .fetch_all(&self.pool)
                .await?;

        let candidates = rows.len();
        let mut matches = Vec::new();
        for (id, text, category, embedding) in rows {
            let score = cosine_similarity(vector, &bytes_to_embedding(&embedding)?);
            if score >= threshold {
                matches.push(RegulationMatch {
                    id,
                    text,
                    category: ComplianceCategory::parse(&category),
                    score: score.clamp(0.0, 1.0),
                });
            }
        }

        matches.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        matches.truncate(limit);

        debug!(candidates, matches = matches.len(), threshold, "Regulation similarity search");
        Ok(matches)
    }

    async fn upsert(&self, regulation: &Regulation, vector: &[f32]) -> DomainResult<()> {
        sqlx::query(
            r#"INSERT INTO regulations (id, title, text, category, jurisdiction, embedding, updated_at)
               VALUES (?, ?, ?, ?, ?, ?, ?)
               ON CONFLICT(id) DO UPDATE SET
                   title = excluded.title,
                   text = excluded.text,
                   category = excluded.category,
                   jurisdiction = excluded.jurisdiction,
                   embedding = excluded.embedding,
                   updated_at = excluded.updated_at"#,
        )
        .bind(&regulation.id)
        .bind(&regulation.title)
        .bind(&regulation.text)
        .bind(regulation.category.as_str())
        .bind(&regulation.jurisdiction)
        .bind(embedding_to_bytes(vector))
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn count(&self) -> DomainResult<u64> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM regulations").fetch_one(&self.pool).await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
