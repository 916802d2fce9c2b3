//! Port trait definitions (Hexagonal Architecture)
//!
//! Every external collaborator of the pipeline is consumed through one of
//! these traits:
//! - BlobStore: raw files, processed artifacts and rendered reports
//! - OcrService: asynchronous text detection
//! - EmbeddingProvider / RegulationIndex: vectors and similarity retrieval
//! - Document/Page/Clause/Mapping/Analysis/Report repositories: metadata store
//! - EventPublisher: stage completion events
//! - ReportRenderer: analysis to bytes

pub mod analysis_repository;
pub mod blob_store;
pub mod clause_repository;
pub mod document_repository;
pub mod embedding;
pub mod event_publisher;
pub mod mapping_repository;
pub mod ocr_service;
pub mod pagination;
pub mod report_renderer;

pub use analysis_repository::{AnalysisRepository, ReportRepository};
pub use blob_store::{BlobEntry, BlobStore, StoredBlob};
pub use clause_repository::{ClauseFilter, ClauseRepository};
pub use document_repository::{DocumentFilter, DocumentRepository, PageRepository};
pub use embedding::{EmbeddingProvider, RegulationIndex};
pub use event_publisher::EventPublisher;
pub use mapping_repository::MappingRepository;
pub use ocr_service::OcrService;
pub use pagination::{PageRequest, Paginated};
pub use report_renderer::ReportRenderer;
