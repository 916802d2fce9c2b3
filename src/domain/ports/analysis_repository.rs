//! Analysis and report repository ports.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{AnalysisResult, Report};

#[async_trait]
pub trait AnalysisRepository: Send + Sync {
    /// Store a result. Results are immutable; an existing id is an error.
    async fn create(&self, result: &AnalysisResult) -> DomainResult<()>;

    async fn get(&self, analysis_id: &str) -> DomainResult<Option<AnalysisResult>>;

    async fn latest_for_document(&self, document_id: &str) -> DomainResult<Option<AnalysisResult>>;
}

#[async_trait]
pub trait ReportRepository: Send + Sync {
    async fn create(&self, report: &Report) -> DomainResult<()>;

    async fn get(&self, report_id: &str) -> DomainResult<Option<Report>>;

    async fn list_for_document(&self, document_id: &str) -> DomainResult<Vec<Report>>;
}
