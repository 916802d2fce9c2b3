//! SQLite implementation of the AnalysisRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::{parse_datetime, to_usize};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::AnalysisResult;
use crate::domain::ports::AnalysisRepository;

const ANALYSIS_COLUMNS: &str =
    "analysis_id, document_id, agent_analyses, overall_risk_score, agent_count, analysis_type, created_at";

#[derive(Clone)]
pub struct SqliteAnalysisRepository {
    pool: SqlitePool,
}

impl SqliteAnalysisRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AnalysisRepository for SqliteAnalysisRepository {
    async fn create(&self, result: &AnalysisResult) -> DomainResult<()> {
        sqlx::query(&format!("INSERT INTO analysis_results ({ANALYSIS_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?)"))
            .bind(&result.analysis_id)
            .bind(&result.document_id)
            .bind(serde_json::to_string(&result.agent_analyses)?)
            .bind(result.overall_risk_score)
            .bind(result.agent_count as i64)
            .bind(&result.analysis_type)
            .bind(result.created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get(&self, analysis_id: &str) -> DomainResult<Option<AnalysisResult>> {
        let row: Option<AnalysisRow> =
            sqlx::query_as(&format!("SELECT {ANALYSIS_COLUMNS} FROM analysis_results WHERE analysis_id = ?"))
                .bind(analysis_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(AnalysisResult::try_from).transpose()
    }

    async fn latest_for_document(&self, document_id: &str) -> DomainResult<Option<AnalysisResult>> {
        let row: Option<AnalysisRow> = sqlx::query_as(&format!(
            "SELECT {ANALYSIS_COLUMNS} FROM analysis_results WHERE document_id = ? ORDER BY created_at DESC LIMIT 1"
        ))
        .bind(document_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(AnalysisResult::try_from).transpose()
    }
}

#[derive(sqlx::FromRow)]
struct AnalysisRow {
    analysis_id: String,
    document_id: String,
    agent_analyses: String,
    overall_risk_score: f64,
    agent_count: i64,
    analysis_type: String,
    created_at: String,
}

impl TryFrom<AnalysisRow> for AnalysisResult {
    type Error = DomainError;

    fn try_from(row: AnalysisRow) -> Result<Self, Self::Error> {
        Ok(Self {
            analysis_id: row.analysis_id,
            document_id: row.document_id,
            agent_analyses: serde_json::from_str(&row.agent_analyses)?,
            overall_risk_score: row.overall_risk_score,
            agent_count: to_usize(row.agent_count),
            analysis_type: row.analysis_type,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}
