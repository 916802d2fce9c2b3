//! SQLite implementation of the ReportRepository.

use async_trait::async_trait;
use sqlx::SqlitePool;

use super::parse_datetime;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Report, ReportFormat, ReportType};
use crate::domain::ports::ReportRepository;

const REPORT_COLUMNS: &str =
    "report_id, analysis_id, document_id, report_type, format, file_size_bytes, blob_key, created_at";

#[derive(Clone)]
pub struct SqliteReportRepository {
    pool: SqlitePool,
}

impl SqliteReportRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ReportRepository for SqliteReportRepository {
    async fn create(&self, report: &Report) -> DomainResult<()> {
        sqlx::query(&format!("INSERT INTO reports ({REPORT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"))
            .bind(&report.report_id)
            .bind(&report.analysis_id)
            .bind(&report.document_id)
            .bind(report.report_type.as_str())
            .bind(report.format.as_str())
            .bind(i64::try_from(report.file_size_bytes).unwrap_or(i64::MAX))
            .bind(&report.blob_key)
            .bind(report.created_at.to_rfc3339())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn get(&self, report_id: &str) -> DomainResult<Option<Report>> {
        let row: Option<ReportRow> =
            sqlx::query_as(&format!("SELECT {REPORT_COLUMNS} FROM reports WHERE report_id = ?"))
                .bind(report_id)
                .fetch_optional(&self.pool)
                .await?;

        row.map(Report::try_from).transpose()
    }

    async fn list_for_document(&self, document_id: &str) -> DomainResult<Vec<Report>> {
        let rows: Vec<ReportRow> = sqlx::query_as(&format!(
            "SELECT {REPORT_COLUMNS} FROM reports WHERE document_id = ? ORDER BY created_at"
        ))
        .bind(document_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Report::try_from).collect()
    }
}

#[derive(sqlx::FromRow)]
struct ReportRow {
    report_id: String,
    analysis_id: String,
    document_id: String,
    report_type: String,
    format: String,
    file_size_bytes: i64,
    blob_key: String,
    created_at: String,
}

impl TryFrom<ReportRow> for Report {
    type Error = DomainError;

    fn try_from(row: ReportRow) -> Result<Self, Self::Error> {
        let format = ReportFormat::from_str(&row.format)
            .ok_or_else(|| DomainError::Serialization(format!("Invalid report format: {}", row.format)))?;

        Ok(Self {
            report_id: row.report_id,
            analysis_id: row.analysis_id,
            document_id: row.document_id,
            report_type: ReportType::parse(&row.report_type),
            format,
            file_size_bytes: u64::try_from(row.file_size_bytes).unwrap_or(0),
            blob_key: row.blob_key,
            created_at: parse_datetime(&row.created_at)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::sqlite::{create_migrated_test_pool, fixtures, SqliteAnalysisRepository};
    use crate::domain::ports::AnalysisRepository;
    use crate::services::RiskConsolidator;
    use chrono::Utc;

    #[tokio::test]
    async fn test_create_and_list_reports() {
        let pool = create_migrated_test_pool().await.unwrap();
        fixtures::insert_document(&pool, "doc_1").await;
        let analysis = RiskConsolidator::default().consolidate("doc_1", &[]);
        SqliteAnalysisRepository::new(pool.clone()).create(&analysis).await.unwrap();
        let repo = SqliteReportRepository::new(pool);

        let report = Report {
            report_id: "report_1".to_string(),
            analysis_id: analysis.analysis_id.clone(),
            document_id: "doc_1".to_string(),
            report_type: ReportType::DetailedAudit,
            format: ReportFormat::Text,
            file_size_bytes: 512,
            blob_key: "reports/report_1.txt".to_string(),
            created_at: Utc::now(),
        };
        repo.create(&report).await.unwrap();

        let loaded = repo.get("report_1").await.unwrap().unwrap();
        assert_eq!(loaded.report_type, ReportType::DetailedAudit);
        assert_eq!(loaded.format, ReportFormat::Text);
        assert_eq!(repo.list_for_document("doc_1").await.unwrap().len(), 1);
        assert!(repo.get("report_2").await.unwrap().is_none());
    }
}
