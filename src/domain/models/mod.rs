pub mod analysis;
pub mod clause;
pub mod config;
pub mod document;
pub mod entity;
pub mod event;
pub mod mapping;
pub mod ocr;
pub mod report;

pub use analysis::{AgentAnalysis, AnalysisResult, ComplianceGap, RiskLevel};
pub use clause::{
    ClassificationResult, ClassificationStatistics, Clause, ClauseCandidate, ComplianceCategory,
};
pub use config::{
    Config, DatabaseConfig, EmbeddingConfig, EmbeddingProviderKind, LoggingConfig, ProcessingConfig,
    RetryConfig, StorageConfig,
};
pub use document::{Document, DocumentStatus, DocumentType, PipelineStage};
pub use entity::{Entity, EntityStatistics, EntityType};
pub use event::{PipelineEvent, StageEventDetail};
pub use mapping::{ClauseEmbedding, Regulation, RegulationMapping, RegulationMatch};
pub use ocr::{
    Block, BlockGraph, BlockType, DetectedImage, DetectedTable, DocumentStructure, Geometry,
    NormalizedDocument, OcrJob, OcrJobStatus, OcrLine, OcrPage, OcrWord, QualityAssessment,
};
pub use report::{Report, ReportFormat, ReportType};
