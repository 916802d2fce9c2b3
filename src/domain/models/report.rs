//! Report model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportType {
    ExecutiveSummary,
    DetailedAudit,
    Basic,
}

impl Default for ReportType {
    fn default() -> Self {
        Self::ExecutiveSummary
    }
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ExecutiveSummary => "executive_summary",
            Self::DetailedAudit => "detailed_audit",
            Self::Basic => "basic",
        }
    }

    /// Unrecognized names render the basic report.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "executive_summary" => Self::ExecutiveSummary,
            "detailed_audit" => Self::DetailedAudit,
            _ => Self::Basic,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Json,
    Text,
}

impl Default for ReportFormat {
    fn default() -> Self {
        Self::Json
    }
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "text",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "text" | "txt" => Some(Self::Text),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Text => "txt",
        }
    }
}

/// Metadata row for a rendered report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub report_id: String,
    pub analysis_id: String,
    pub document_id: String,
    pub report_type: ReportType,
    pub format: ReportFormat,
    pub file_size_bytes: u64,
    pub blob_key: String,
    pub created_at: DateTime<Utc>,
}
