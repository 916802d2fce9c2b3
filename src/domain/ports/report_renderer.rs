//! Report renderer port.

use crate::domain::errors::DomainResult;
use crate::domain::models::{AnalysisResult, ReportFormat, ReportType};

pub trait ReportRenderer: Send + Sync {
    fn render(&self, analysis: &AnalysisResult, report_type: ReportType, format: ReportFormat) -> DomainResult<Vec<u8>>;
}
