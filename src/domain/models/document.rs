//! Document domain model and the pipeline state machine.
//!
//! A document moves strictly forward through the pipeline:
//!
//! ```text
//! uploaded -> ocr_completed -> processing -> clause_extraction_completed
//!          -> semantic_mapping_completed -> agentic_reasoning_completed
//!          -> report_generated
//! ```
//!
//! `failed` is reachable from any non-terminal state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of document accepted by intake.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentType {
    VendorContract,
    Regulation,
    TermsConditions,
}

impl DocumentType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::VendorContract => "vendor_contract",
            Self::Regulation => "regulation",
            Self::TermsConditions => "terms_conditions",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "vendor_contract" => Some(Self::VendorContract),
            "regulation" => Some(Self::Regulation),
            "terms_conditions" => Some(Self::TermsConditions),
            _ => None,
        }
    }

    pub fn all() -> [Self; 3] {
        [Self::VendorContract, Self::Regulation, Self::TermsConditions]
    }
}

/// Lifecycle status of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentStatus {
    Uploaded,
    OcrCompleted,
    Processing,
    ClauseExtractionCompleted,
    SemanticMappingCompleted,
    AgenticReasoningCompleted,
    ReportGenerated,
    Failed,
}

impl Default for DocumentStatus {
    fn default() -> Self {
        Self::Uploaded
    }
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Uploaded => "uploaded",
            Self::OcrCompleted => "ocr_completed",
            Self::Processing => "processing",
            Self::ClauseExtractionCompleted => "clause_extraction_completed",
            Self::SemanticMappingCompleted => "semantic_mapping_completed",
            Self::AgenticReasoningCompleted => "agentic_reasoning_completed",
            Self::ReportGenerated => "report_generated",
            Self::Failed => "failed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "uploaded" => Some(Self::Uploaded),
            "ocr_completed" => Some(Self::OcrCompleted),
            "processing" => Some(Self::Processing),
            "clause_extraction_completed" => Some(Self::ClauseExtractionCompleted),
            "semantic_mapping_completed" => Some(Self::SemanticMappingCompleted),
            "agentic_reasoning_completed" => Some(Self::AgenticReasoningCompleted),
            "report_generated" => Some(Self::ReportGenerated),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Position along the forward path. `Failed` sits off the path.
    pub const fn rank(&self) -> Option<u8> {
        match self {
            Self::Uploaded => Some(0),
            Self::OcrCompleted => Some(1),
            Self::Processing => Some(2),
            Self::ClauseExtractionCompleted => Some(3),
            Self::SemanticMappingCompleted => Some(4),
            Self::AgenticReasoningCompleted => Some(5),
            Self::ReportGenerated => Some(6),
            Self::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::ReportGenerated | Self::Failed)
    }

    /// True when this status is the target itself or further along the path.
    pub fn is_at_or_past(&self, target: Self) -> bool {
        match (self.rank(), target.rank()) {
            (Some(current), Some(target)) => current >= target,
            _ => false,
        }
    }

    /// The single forward successor, if any.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Uploaded => Some(Self::OcrCompleted),
            Self::OcrCompleted => Some(Self::Processing),
            Self::Processing => Some(Self::ClauseExtractionCompleted),
            Self::ClauseExtractionCompleted => Some(Self::SemanticMappingCompleted),
            Self::SemanticMappingCompleted => Some(Self::AgenticReasoningCompleted),
            Self::AgenticReasoningCompleted => Some(Self::ReportGenerated),
            Self::ReportGenerated | Self::Failed => None,
        }
    }

    pub fn valid_transitions(&self) -> Vec<Self> {
        if self.is_terminal() {
            return vec![];
        }
        let mut transitions: Vec<Self> = self.next().into_iter().collect();
        transitions.push(Self::Failed);
        transitions
    }

    pub fn can_transition_to(&self, new_status: Self) -> bool {
        self.valid_transitions().contains(&new_status)
    }
}

impl std::fmt::Display for DocumentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One unit of the pipeline, triggered by an event and advancing document status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Intake,
    Ocr,
    ClauseExtraction,
    SemanticMapping,
    AgenticReasoning,
    ReportGeneration,
}

impl PipelineStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Intake => "document_ingestion",
            Self::Ocr => "ocr",
            Self::ClauseExtraction => "clause_extraction",
            Self::SemanticMapping => "semantic_mapping",
            Self::AgenticReasoning => "agentic_reasoning",
            Self::ReportGeneration => "report_generation",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "intake" | "document_ingestion" => Some(Self::Intake),
            "ocr" => Some(Self::Ocr),
            "clause_extraction" | "clauses" => Some(Self::ClauseExtraction),
            "semantic_mapping" | "mapping" => Some(Self::SemanticMapping),
            "agentic_reasoning" | "reasoning" => Some(Self::AgenticReasoning),
            "report_generation" | "report" => Some(Self::ReportGeneration),
            _ => None,
        }
    }

    /// Status a document must be in for this stage to run.
    /// Intake creates the document and has no predecessor.
    pub const fn input_status(&self) -> Option<DocumentStatus> {
        match self {
            Self::Intake => None,
            Self::Ocr => Some(DocumentStatus::Uploaded),
            Self::ClauseExtraction => Some(DocumentStatus::OcrCompleted),
            Self::SemanticMapping => Some(DocumentStatus::ClauseExtractionCompleted),
            Self::AgenticReasoning => Some(DocumentStatus::SemanticMappingCompleted),
            Self::ReportGeneration => Some(DocumentStatus::AgenticReasoningCompleted),
        }
    }

    /// Status written once the stage completes.
    pub const fn target_status(&self) -> DocumentStatus {
        match self {
            Self::Intake => DocumentStatus::Uploaded,
            Self::Ocr => DocumentStatus::OcrCompleted,
            Self::ClauseExtraction => DocumentStatus::ClauseExtractionCompleted,
            Self::SemanticMapping => DocumentStatus::SemanticMappingCompleted,
            Self::AgenticReasoning => DocumentStatus::AgenticReasoningCompleted,
            Self::ReportGeneration => DocumentStatus::ReportGenerated,
        }
    }

    /// The stage triggered by a completion event carrying `status`.
    pub const fn triggered_by(status: DocumentStatus) -> Option<Self> {
        match status {
            DocumentStatus::Uploaded => Some(Self::Ocr),
            DocumentStatus::OcrCompleted => Some(Self::ClauseExtraction),
            DocumentStatus::ClauseExtractionCompleted => Some(Self::SemanticMapping),
            DocumentStatus::SemanticMappingCompleted => Some(Self::AgenticReasoning),
            DocumentStatus::AgenticReasoningCompleted => Some(Self::ReportGeneration),
            _ => None,
        }
    }

    /// Transient failures of these stages are retried in-process.
    pub const fn is_auto_retried(&self) -> bool {
        matches!(self, Self::Intake | Self::ClauseExtraction)
    }

    pub fn event_source(&self) -> &'static str {
        match self {
            Self::Intake => "compliance.document.ingestion",
            Self::Ocr => "compliance.document.ocr",
            Self::ClauseExtraction => "compliance.clause.extraction",
            Self::SemanticMapping => "compliance.semantic.mapping",
            Self::AgenticReasoning => "compliance.agentic.reasoning",
            Self::ReportGeneration => "compliance.report.generation",
        }
    }

    pub fn detail_type(&self) -> &'static str {
        match self {
            Self::Intake => "Document Processing Status Change",
            Self::Ocr => "OCR Status Change",
            Self::ClauseExtraction => "Clause Extraction Status Change",
            Self::SemanticMapping => "Semantic Mapping Status Change",
            Self::AgenticReasoning => "Agentic Reasoning Status Change",
            Self::ReportGeneration => "Report Generation Status Change",
        }
    }

    pub fn all() -> [Self; 6] {
        [
            Self::Intake,
            Self::Ocr,
            Self::ClauseExtraction,
            Self::SemanticMapping,
            Self::AgenticReasoning,
            Self::ReportGeneration,
        ]
    }
}

impl std::fmt::Display for PipelineStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A document tracked by the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub filename: String,
    pub file_size: u64,
    /// SHA-256 hex digest of the raw bytes
    pub content_hash: String,
    pub document_type: DocumentType,
    pub status: DocumentStatus,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        id: impl Into<String>,
        filename: impl Into<String>,
        file_size: u64,
        content_hash: impl Into<String>,
        document_type: DocumentType,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            filename: filename.into(),
            file_size,
            content_hash: content_hash.into(),
            document_type,
            status: DocumentStatus::Uploaded,
            metadata: BTreeMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(serde_json::Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        for status in [
            DocumentStatus::Uploaded,
            DocumentStatus::OcrCompleted,
            DocumentStatus::Processing,
            DocumentStatus::ClauseExtractionCompleted,
            DocumentStatus::SemanticMappingCompleted,
            DocumentStatus::AgenticReasoningCompleted,
            DocumentStatus::ReportGenerated,
            DocumentStatus::Failed,
        ] {
            assert_eq!(DocumentStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(DocumentStatus::from_str("archived"), None);
    }

    #[test]
    fn test_forward_transitions_only() {
        assert!(DocumentStatus::Uploaded.can_transition_to(DocumentStatus::OcrCompleted));
        assert!(DocumentStatus::OcrCompleted.can_transition_to(DocumentStatus::Processing));
        assert!(!DocumentStatus::OcrCompleted.can_transition_to(DocumentStatus::Uploaded));
        assert!(!DocumentStatus::Uploaded.can_transition_to(DocumentStatus::Processing));
        assert!(DocumentStatus::SemanticMappingCompleted.can_transition_to(DocumentStatus::Failed));
    }

    #[test]
    fn test_terminal_states_have_no_transitions() {
        assert!(DocumentStatus::ReportGenerated.valid_transitions().is_empty());
        assert!(DocumentStatus::Failed.valid_transitions().is_empty());
        assert!(!DocumentStatus::Failed.can_transition_to(DocumentStatus::Uploaded));
    }

    #[test]
    fn test_at_or_past() {
        let status = DocumentStatus::ClauseExtractionCompleted;
        assert!(status.is_at_or_past(DocumentStatus::OcrCompleted));
        assert!(status.is_at_or_past(DocumentStatus::ClauseExtractionCompleted));
        assert!(!status.is_at_or_past(DocumentStatus::SemanticMappingCompleted));
        assert!(!DocumentStatus::Failed.is_at_or_past(DocumentStatus::Uploaded));
    }

    #[test]
    fn test_stage_chain_is_consistent() {
        for stage in PipelineStage::all() {
            if let Some(input) = stage.input_status() {
                assert_eq!(PipelineStage::triggered_by(input), Some(stage));
                assert!(stage.target_status().is_at_or_past(input));
            }
        }
        assert_eq!(PipelineStage::triggered_by(DocumentStatus::ReportGenerated), None);
        assert_eq!(PipelineStage::triggered_by(DocumentStatus::Processing), None);
    }

    #[test]
    fn test_document_type_parsing() {
        assert_eq!(DocumentType::from_str("vendor_contract"), Some(DocumentType::VendorContract));
        assert_eq!(DocumentType::from_str("REGULATION"), Some(DocumentType::Regulation));
        assert_eq!(DocumentType::from_str("invoice"), None);
    }
}
