//! Infrastructure adapters for external systems.

pub mod embeddings;
pub mod events;
pub mod filesystem;
pub mod ocr;
pub mod reports;
pub mod sqlite;

pub use embeddings::{provider_from_config, HashingEmbeddingProvider, OpenAiEmbeddingProvider};
pub use events::BroadcastEventPublisher;
pub use filesystem::FilesystemBlobStore;
pub use ocr::SidecarOcrService;
pub use reports::StandardReportRenderer;
