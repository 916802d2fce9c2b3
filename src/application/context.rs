//! Process-wide handles shared by every pipeline stage.

use std::path::PathBuf;
use std::sync::Arc;

use sqlx::SqlitePool;

use crate::adapters::embeddings::provider_from_config;
use crate::adapters::sqlite::{
    SqliteAnalysisRepository, SqliteClauseRepository, SqliteDocumentRepository, SqliteMappingRepository,
    SqlitePageRepository, SqliteRegulationIndex, SqliteReportRepository,
};
use crate::adapters::{BroadcastEventPublisher, FilesystemBlobStore, SidecarOcrService, StandardReportRenderer};
use crate::domain::errors::DomainResult;
use crate::domain::models::Config;
use crate::domain::ports::{
    AnalysisRepository, BlobStore, ClauseRepository, DocumentRepository, EmbeddingProvider, EventPublisher,
    MappingRepository, OcrService, PageRepository, RegulationIndex, ReportRenderer, ReportRepository,
};

/// Collaborators injected into the pipeline. Built once at startup.
#[derive(Clone)]
pub struct PipelineContext {
    pub config: Config,
    pub documents: Arc<dyn DocumentRepository>,
    pub pages: Arc<dyn PageRepository>,
    pub clauses: Arc<dyn ClauseRepository>,
    pub mappings: Arc<dyn MappingRepository>,
    pub analyses: Arc<dyn AnalysisRepository>,
    pub reports: Arc<dyn ReportRepository>,
    pub blobs: Arc<dyn BlobStore>,
    pub ocr: Arc<dyn OcrService>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub regulations: Arc<dyn RegulationIndex>,
    pub events: Arc<dyn EventPublisher>,
    pub renderer: Arc<dyn ReportRenderer>,
}

/// Concrete local adapters, kept for callers that need more than the ports.
pub struct LocalAdapters {
    pub context: PipelineContext,
    pub blob_store: Arc<FilesystemBlobStore>,
    pub ocr: Arc<SidecarOcrService>,
    pub events: Arc<BroadcastEventPublisher>,
    pub regulations: Arc<SqliteRegulationIndex>,
}

impl PipelineContext {
    /// Wires SQLite repositories, the filesystem blob store under
    /// `storage.root`, the sidecar OCR service and the configured embedder.
    pub fn local(config: Config, pool: SqlitePool) -> DomainResult<LocalAdapters> {
        Self::local_with_root(config.storage.root.clone(), config, pool)
    }

    pub fn local_with_root(root: impl Into<PathBuf>, config: Config, pool: SqlitePool) -> DomainResult<LocalAdapters> {
        let blob_store = Arc::new(FilesystemBlobStore::new(root));
        let ocr = Arc::new(SidecarOcrService::new(blob_store.clone()));
        let events = Arc::new(BroadcastEventPublisher::default());
        let regulations = Arc::new(SqliteRegulationIndex::new(pool.clone()));
        let embeddings = provider_from_config(&config.embedding)?;

        let context = Self {
            config,
            documents: Arc::new(SqliteDocumentRepository::new(pool.clone())),
            pages: Arc::new(SqlitePageRepository::new(pool.clone())),
            clauses: Arc::new(SqliteClauseRepository::new(pool.clone())),
            mappings: Arc::new(SqliteMappingRepository::new(pool.clone())),
            analyses: Arc::new(SqliteAnalysisRepository::new(pool.clone())),
            reports: Arc::new(SqliteReportRepository::new(pool)),
            blobs: blob_store.clone(),
            ocr: ocr.clone(),
            embeddings,
            regulations: regulations.clone(),
            events: events.clone(),
            renderer: Arc::new(StandardReportRenderer::new()),
        };

        Ok(LocalAdapters {
            context,
            blob_store,
            ocr,
            events,
            regulations,
        })
    }
}
