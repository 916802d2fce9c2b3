//! Pipeline services: the pure processing steps plus the mapper, consolidator
//! and emitter that drive ports.

pub mod classification_rules;
pub mod clause_classifier;
pub mod clause_segmenter;
pub mod entity_patterns;
pub mod entity_recognizer;
pub mod ids;
pub mod ocr_normalizer;
pub mod report_emitter;
pub mod retry;
pub mod risk_agents;
pub mod risk_consolidator;
pub mod semantic_mapper;

pub use clause_classifier::{classification_statistics, ClauseClassifier};
pub use clause_segmenter::{find_clause_pages, ClauseSegmenter, SegmentationStrategy};
pub use entity_recognizer::{entity_statistics, EntityExtractor, EntityRecognizer};
pub use ocr_normalizer::OcrNormalizer;
pub use report_emitter::ReportEmitter;
pub use retry::RetryPolicy;
pub use risk_agents::{default_agents, RiskAgent};
pub use risk_consolidator::RiskConsolidator;
pub use semantic_mapper::{MappingSummary, SemanticMapper, SemanticMapperConfig};
