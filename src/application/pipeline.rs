//! Pipeline stage handlers.
//!
//! Every stage follows the same shape: load the document, check the
//! idempotency guard, do the stage work, persist outputs, advance the status
//! with a compare-and-set from the expected predecessor, then publish a
//! completion event. Event publication is fire-and-forget.
//!
//! Guard rules:
//! - a document already at or past the stage's target status is a duplicate
//!   delivery and the call succeeds without side effects
//! - a failed document is never touched again
//! - any other status than the stage's input is rejected without failing the
//!   document
//!
//! A stage whose input is not ready yet (OCR still running) leaves the
//! document where it was so a later delivery can pick it up. Every other stage
//! error, including transient ones that outlived their retries, moves it to
//! `failed`.

use std::collections::BTreeMap;

use serde_json::json;
use tracing::{debug, info, instrument, warn};

use super::context::PipelineContext;
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    AnalysisResult, Clause, Document, DocumentStatus, DocumentType, NormalizedDocument, OcrJobStatus, PipelineEvent,
    PipelineStage, Report, ReportFormat, ReportType,
};
use crate::services::{
    classification_statistics, entity_statistics, find_clause_pages, ids, ClauseClassifier, ClauseSegmenter,
    EntityRecognizer, OcrNormalizer, ReportEmitter, RetryPolicy, RiskConsolidator, SemanticMapper,
    SemanticMapperConfig,
};

const PDF_MAGIC: &[u8] = b"%PDF-";
const BYTES_PER_MB: u64 = 1024 * 1024;

/// A raw upload handed to intake.
#[derive(Debug, Clone)]
pub struct IntakeRequest {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub document_type: String,
    pub metadata: BTreeMap<String, String>,
}

impl IntakeRequest {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>, document_type: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            document_type: document_type.into(),
            metadata: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct IntakeOutcome {
    pub document: Document,
    /// True when the content hash matched an existing document.
    pub duplicate: bool,
}

/// What a stage invocation did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageOutcome {
    Completed { status: DocumentStatus },
    /// Duplicate delivery or a failed document; nothing was executed.
    Skipped { status: DocumentStatus },
}

impl StageOutcome {
    pub const fn status(&self) -> DocumentStatus {
        match self {
            Self::Completed { status } | Self::Skipped { status } => *status,
        }
    }

    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

pub struct Pipeline {
    ctx: PipelineContext,
    normalizer: OcrNormalizer,
    segmenter: ClauseSegmenter,
    classifier: ClauseClassifier,
    recognizer: EntityRecognizer,
    mapper: SemanticMapper,
    consolidator: RiskConsolidator,
    emitter: ReportEmitter,
    retry: RetryPolicy,
}

impl Pipeline {
    pub fn new(ctx: PipelineContext) -> Self {
        let processing = &ctx.config.processing;
        let mapper = SemanticMapper::new(
            ctx.embeddings.clone(),
            ctx.regulations.clone(),
            ctx.mappings.clone(),
            SemanticMapperConfig::from_config(&ctx.config.embedding, processing.clause_concurrency),
        );
        let emitter = ReportEmitter::new(
            ctx.renderer.clone(),
            ctx.blobs.clone(),
            ctx.reports.clone(),
            ctx.config.storage.reports_bucket.clone(),
        );

        Self {
            normalizer: OcrNormalizer::new(processing.ocr_confidence_threshold),
            segmenter: ClauseSegmenter::new(processing.min_clause_length),
            classifier: ClauseClassifier::new(),
            recognizer: EntityRecognizer::new(),
            consolidator: RiskConsolidator::default(),
            retry: RetryPolicy::from(&ctx.config.retry),
            mapper,
            emitter,
            ctx,
        }
    }

    /// Swap the entity recognizer, e.g. to append enrichment extractors.
    #[must_use]
    pub fn with_recognizer(mut self, recognizer: EntityRecognizer) -> Self {
        self.recognizer = recognizer;
        self
    }

    #[must_use]
    pub fn with_consolidator(mut self, consolidator: RiskConsolidator) -> Self {
        self.consolidator = consolidator;
        self
    }

    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    pub fn context(&self) -> &PipelineContext {
        &self.ctx
    }

    pub async fn document(&self, document_id: &str) -> DomainResult<Document> {
        self.ctx
            .documents
            .get(document_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Document", document_id))
    }

    // ------------------------------------------------------------------
    // Intake
    // ------------------------------------------------------------------

    fn validate_intake(&self, request: &IntakeRequest) -> DomainResult<DocumentType> {
        let processing = &self.ctx.config.processing;

        if request.bytes.is_empty() {
            return Err(DomainError::Validation("document is empty".to_string()));
        }
        if !request.bytes.starts_with(PDF_MAGIC) {
            return Err(DomainError::Validation(format!("{} is not a PDF document", request.filename)));
        }
        let max_bytes = processing.max_file_size_mb * BYTES_PER_MB;
        if request.bytes.len() as u64 > max_bytes {
            return Err(DomainError::Validation(format!(
                "document is {} bytes, limit is {} MB",
                request.bytes.len(),
                processing.max_file_size_mb
            )));
        }

        let document_type = DocumentType::from_str(&request.document_type)
            .ok_or_else(|| DomainError::Validation(format!("unknown document type: {}", request.document_type)))?;
        if !processing.allowed_document_types.contains(&document_type) {
            return Err(DomainError::Validation(format!(
                "document type {} is not enabled",
                document_type.as_str()
            )));
        }

        Ok(document_type)
    }

    /// Validates and stores a raw upload, creates its document record and
    /// requests OCR. Re-uploading identical bytes returns the existing record.
    #[instrument(skip(self, request), fields(filename = %request.filename, size = request.bytes.len()))]
    pub async fn ingest(&self, request: IntakeRequest) -> DomainResult<IntakeOutcome> {
        let document_type = self.validate_intake(&request)?;
        let content_hash = ids::content_hash(&request.bytes);

        if let Some(existing) = self.ctx.documents.find_by_hash(&content_hash).await? {
            info!(document_id = %existing.id, status = %existing.status, "Duplicate upload, returning existing document");
            return Ok(IntakeOutcome {
                document: existing,
                duplicate: true,
            });
        }

        let document_id = ids::document_id();
        let filename = ids::sanitize_filename(&request.filename);
        let bucket = self.ctx.config.storage.raw_bucket.clone();
        let key = format!("documents/{document_id}/{filename}");

        let blob_metadata = BTreeMap::from([
            ("document_id".to_string(), document_id.clone()),
            ("document_type".to_string(), document_type.as_str().to_string()),
            ("original_filename".to_string(), request.filename.clone()),
            ("content_hash".to_string(), content_hash.clone()),
        ]);
        let stored = self
            .retry
            .execute("store raw document", || {
                self.ctx.blobs.put(&bucket, &key, &request.bytes, &blob_metadata)
            })
            .await?;

        let mut document = Document::new(&document_id, &filename, stored.size, &content_hash, document_type)
            .with_metadata("raw_bucket", bucket.as_str())
            .with_metadata("raw_key", key.as_str())
            .with_metadata("original_filename", request.filename.as_str())
            .with_metadata("blob_url", stored.url.as_str());
        for (name, value) in &request.metadata {
            document.metadata.entry(name.clone()).or_insert_with(|| json!(value));
        }

        self.retry
            .execute("create document record", || self.ctx.documents.create(&document))
            .await?;
        info!(document_id = %document_id, document_type = document_type.as_str(), "Document uploaded");

        match self.ctx.ocr.submit(&bucket, &key).await {
            Ok(job_id) => {
                self.ctx
                    .documents
                    .merge_metadata(&document_id, BTreeMap::from([("ocr_job_id".to_string(), json!(job_id))]))
                    .await?;
                document.metadata.insert("ocr_job_id".to_string(), json!(job_id));
                debug!(document_id = %document_id, job_id = %job_id, "OCR requested");
            }
            Err(err) if err.is_transient() => {
                // OCR is resubmitted by the OCR stage when no job id is recorded
                warn!(document_id = %document_id, error = %err, "OCR submission deferred");
            }
            Err(err) => {
                self.fail(PipelineStage::Intake, &document, &err).await;
                return Err(DomainError::pipeline(PipelineStage::Intake.as_str(), err.to_string()));
            }
        }

        self.publish(PipelineStage::Intake, &document_id, DocumentStatus::Uploaded).await;

        Ok(IntakeOutcome {
            document,
            duplicate: false,
        })
    }

    // ------------------------------------------------------------------
    // Stage dispatch
    // ------------------------------------------------------------------

    /// Runs one stage for a document, honoring the idempotency guard.
    #[instrument(skip(self, stage), fields(stage = %stage))]
    pub async fn run_stage(&self, stage: PipelineStage, document_id: &str) -> DomainResult<StageOutcome> {
        let Some(input) = stage.input_status() else {
            return Err(DomainError::Validation("intake runs through ingest, not as a stage".to_string()));
        };
        let target = stage.target_status();
        let document = self.document(document_id).await?;

        if document.status == DocumentStatus::Failed {
            warn!(document_id, "Document has failed, skipping stage");
            return Ok(StageOutcome::Skipped { status: document.status });
        }
        if document.status.is_at_or_past(target) {
            info!(document_id, status = %document.status, "Stage already applied, skipping duplicate delivery");
            return Ok(StageOutcome::Skipped { status: document.status });
        }

        // clause extraction parks the document in `processing` while it runs
        let resumable = stage == PipelineStage::ClauseExtraction && document.status == DocumentStatus::Processing;
        if document.status != input && !resumable {
            return Err(DomainError::InvalidStateTransition {
                from: document.status.to_string(),
                to: target.to_string(),
            });
        }

        let mut document = document;
        if stage == PipelineStage::ClauseExtraction && document.status == DocumentStatus::OcrCompleted {
            if !self
                .ctx
                .documents
                .transition(document_id, DocumentStatus::OcrCompleted, DocumentStatus::Processing)
                .await?
            {
                let current = self.document(document_id).await?;
                info!(document_id, status = %current.status, "Clause extraction claimed elsewhere, skipping");
                return Ok(StageOutcome::Skipped { status: current.status });
            }
            document.status = DocumentStatus::Processing;
        }

        info!(document_id, from = %document.status, to = %target, "Stage started");
        let result = match stage {
            PipelineStage::Intake => Err(DomainError::Validation("intake has no stage handler".to_string())),
            PipelineStage::Ocr => self.ocr_stage(&document).await,
            PipelineStage::ClauseExtraction => self.clause_extraction_stage(&document).await,
            PipelineStage::SemanticMapping => self.semantic_mapping_stage(&document).await,
            PipelineStage::AgenticReasoning => self.agentic_reasoning_stage(&document).await,
            PipelineStage::ReportGeneration => self.report_generation_stage(&document).await,
        };

        let from = match result {
            Ok(from) => from,
            Err(err) if err.is_not_ready() => {
                info!(document_id, reason = %err, "Stage input not ready, document left for re-drive");
                return Err(err);
            }
            Err(err) => {
                let current = self.document(document_id).await.unwrap_or(document);
                self.fail(stage, &current, &err).await;
                return Err(match err {
                    DomainError::PipelineFailure { .. } => err,
                    other => DomainError::pipeline(stage.as_str(), other.to_string()),
                });
            }
        };

        if !self.ctx.documents.transition(document_id, from, target).await? {
            let current = self.document(document_id).await?;
            info!(document_id, status = %current.status, "Status moved concurrently, treating as duplicate");
            return Ok(StageOutcome::Skipped { status: current.status });
        }

        info!(document_id, status = %target, "Stage completed");
        self.publish(stage, document_id, target).await;
        Ok(StageOutcome::Completed { status: target })
    }

    async fn publish(&self, stage: PipelineStage, document_id: &str, status: DocumentStatus) {
        let event = PipelineEvent::stage_completed(stage, document_id, status);
        if let Err(err) = self.ctx.events.publish(&event).await {
            warn!(document_id, source = %event.source, error = %err, "Failed to publish pipeline event");
        }
    }

    /// Moves a document to `failed` and records why. Never errors itself.
    async fn fail(&self, stage: PipelineStage, document: &Document, err: &DomainError) {
        warn!(document_id = %document.id, stage = %stage, error = %err, "Stage failed");

        match self
            .ctx
            .documents
            .transition(&document.id, document.status, DocumentStatus::Failed)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                warn!(document_id = %document.id, "Document status changed before it could be failed");
                return;
            }
            Err(e) => {
                warn!(document_id = %document.id, error = %e, "Could not mark document failed");
                return;
            }
        }

        let details = BTreeMap::from([
            ("error_message".to_string(), json!(err.to_string())),
            ("failed_stage".to_string(), json!(stage.as_str())),
        ]);
        if let Err(e) = self.ctx.documents.merge_metadata(&document.id, details).await {
            warn!(document_id = %document.id, error = %e, "Could not record failure details");
        }

        self.publish(stage, &document.id, DocumentStatus::Failed).await;
    }

    async fn merge_metadata(&self, document_id: &str, entries: Vec<(&str, serde_json::Value)>) -> DomainResult<()> {
        let entries = entries.into_iter().map(|(k, v)| (k.to_string(), v)).collect();
        self.ctx.documents.merge_metadata(document_id, entries).await
    }

    // ------------------------------------------------------------------
    // Stages. Each returns the status its compare-and-set starts from.
    // ------------------------------------------------------------------

    async fn ocr_stage(&self, document: &Document) -> DomainResult<DocumentStatus> {
        let job_id = match document.metadata_str("ocr_job_id") {
            Some(job_id) => job_id.to_string(),
            None => {
                let bucket = document
                    .metadata_str("raw_bucket")
                    .unwrap_or(self.ctx.config.storage.raw_bucket.as_str());
                let key = document
                    .metadata_str("raw_key")
                    .ok_or_else(|| DomainError::pipeline("ocr", "document has no stored raw file"))?;
                let job_id = self.ctx.ocr.submit(bucket, key).await?;
                self.merge_metadata(&document.id, vec![("ocr_job_id", json!(job_id))]).await?;
                job_id
            }
        };

        let job = self.ctx.ocr.poll(&job_id).await?;
        let graph = match job.status {
            OcrJobStatus::InProgress => {
                return Err(DomainError::NotReady(format!("OCR job {job_id} is still in progress")));
            }
            OcrJobStatus::Failed => {
                let reason = job.message.unwrap_or_else(|| "OCR job failed".to_string());
                return Err(DomainError::pipeline("ocr", reason));
            }
            OcrJobStatus::Succeeded => job
                .blocks
                .ok_or_else(|| DomainError::pipeline("ocr", format!("OCR job {job_id} returned no blocks")))?,
        };

        let normalized = self.normalizer.normalize(&graph);
        let max_pages = self.ctx.config.processing.max_pages;
        if normalized.pages.len() > max_pages {
            return Err(DomainError::Validation(format!(
                "document has {} pages, limit is {max_pages}",
                normalized.pages.len()
            )));
        }
        if !normalized.quality.is_valid {
            warn!(
                document_id = %document.id,
                quality_score = normalized.quality.quality_score,
                issues = ?normalized.quality.issues,
                "Low OCR quality"
            );
        }

        self.ctx.pages.upsert_pages(&document.id, &normalized.pages).await?;

        let processed_key = format!("ocr/{}.json", document.id);
        let blob_metadata = BTreeMap::from([("document_id".to_string(), document.id.clone())]);
        self.ctx
            .blobs
            .put(
                &self.ctx.config.storage.processed_bucket,
                &processed_key,
                &serde_json::to_vec(&normalized)?,
                &blob_metadata,
            )
            .await?;

        self.merge_metadata(
            &document.id,
            vec![
                ("ocr_confidence", json!(normalized.confidence)),
                ("page_count", json!(normalized.pages.len())),
                ("ocr_structure", serde_json::to_value(&normalized.structure)?),
                ("ocr_quality", serde_json::to_value(&normalized.quality)?),
                ("processed_key", json!(processed_key)),
            ],
        )
        .await?;

        info!(
            document_id = %document.id,
            pages = normalized.pages.len(),
            confidence = normalized.confidence,
            "OCR normalized"
        );
        Ok(DocumentStatus::Uploaded)
    }

    async fn load_normalized(&self, document: &Document) -> DomainResult<NormalizedDocument> {
        let default_key = format!("ocr/{}.json", document.id);
        let key = document.metadata_str("processed_key").unwrap_or(default_key.as_str());
        let bucket = &self.ctx.config.storage.processed_bucket;

        let raw = self
            .retry
            .execute("load normalized OCR", || self.ctx.blobs.get(bucket, key))
            .await?;
        Ok(serde_json::from_slice(&raw)?)
    }

    async fn clause_extraction_stage(&self, document: &Document) -> DomainResult<DocumentStatus> {
        let normalized = self.load_normalized(document).await?;
        let candidates = self.segmenter.segment(&normalized.full_text)?;
        let texts: Vec<&str> = candidates.iter().map(|c| c.text.as_str()).collect();
        let classifications = self.classifier.classify_batch(&texts);

        let clauses: Vec<Clause> = candidates
            .iter()
            .zip(classifications.iter().cloned())
            .enumerate()
            .map(|(index, (candidate, classification))| {
                let entities = self.recognizer.recognize(&candidate.text);
                let pages = find_clause_pages(&candidate.text, &normalized.pages);
                Clause::from_parts(&document.id, index, candidate, classification, entities, pages)
            })
            .collect();

        self.retry
            .execute("store clauses", || self.ctx.clauses.replace_for_document(&document.id, &clauses))
            .await?;

        let all_entities: Vec<_> = clauses.iter().flat_map(|c| c.entities.iter().cloned()).collect();
        let extraction_confidence = if clauses.is_empty() {
            0.0
        } else {
            clauses.iter().map(|c| c.confidence).sum::<f64>() / clauses.len() as f64
        };

        self.merge_metadata(
            &document.id,
            vec![
                ("clause_count", json!(clauses.len())),
                ("extraction_confidence", json!(extraction_confidence)),
                ("classification_statistics", serde_json::to_value(classification_statistics(&classifications))?),
                ("entity_statistics", serde_json::to_value(entity_statistics(&all_entities))?),
            ],
        )
        .await?;

        info!(
            document_id = %document.id,
            clauses = clauses.len(),
            entities = all_entities.len(),
            "Clauses extracted"
        );
        Ok(DocumentStatus::Processing)
    }

    async fn semantic_mapping_stage(&self, document: &Document) -> DomainResult<DocumentStatus> {
        let clauses = self.ctx.clauses.list_by_document(&document.id).await?;
        let summary = self.mapper.map_document(&document.id, &clauses).await?;

        self.merge_metadata(
            &document.id,
            vec![
                ("mapping_count", json!(summary.mappings_created)),
                ("clauses_without_match", json!(summary.clauses_without_match)),
                ("embedding_provider", json!(self.mapper.provider_name())),
            ],
        )
        .await?;
        Ok(DocumentStatus::ClauseExtractionCompleted)
    }

    async fn agentic_reasoning_stage(&self, document: &Document) -> DomainResult<DocumentStatus> {
        let analysis = match self.ctx.analyses.latest_for_document(&document.id).await? {
            Some(existing) => {
                info!(document_id = %document.id, analysis_id = %existing.analysis_id, "Reusing stored analysis");
                existing
            }
            None => {
                let mappings = self.ctx.mappings.list_by_document(&document.id).await?;
                let analysis = self.consolidator.consolidate(&document.id, &mappings);
                self.ctx.analyses.create(&analysis).await?;
                analysis
            }
        };

        self.merge_metadata(
            &document.id,
            vec![
                ("analysis_id", json!(analysis.analysis_id)),
                ("overall_risk_score", json!(analysis.overall_risk_score)),
            ],
        )
        .await?;

        info!(
            document_id = %document.id,
            analysis_id = %analysis.analysis_id,
            overall_risk_score = analysis.overall_risk_score,
            agents = analysis.agent_count,
            "Risk analysis complete"
        );
        Ok(DocumentStatus::SemanticMappingCompleted)
    }

    async fn report_generation_stage(&self, document: &Document) -> DomainResult<DocumentStatus> {
        let analysis = self
            .ctx
            .analyses
            .latest_for_document(&document.id)
            .await?
            .ok_or_else(|| DomainError::pipeline("report_generation", "no analysis stored for document"))?;

        let existing = self.ctx.reports.list_for_document(&document.id).await?;
        let report = match existing.into_iter().find(|r| r.analysis_id == analysis.analysis_id) {
            Some(report) => report,
            None => {
                self.emitter
                    .emit(&analysis, ReportType::default(), ReportFormat::default())
                    .await?
            }
        };

        self.merge_metadata(&document.id, vec![("report_id", json!(report.report_id))])
            .await?;
        Ok(DocumentStatus::AgenticReasoningCompleted)
    }

    // ------------------------------------------------------------------
    // Queries used outside the stage chain
    // ------------------------------------------------------------------

    pub async fn analysis(&self, analysis_id: &str) -> DomainResult<AnalysisResult> {
        self.ctx
            .analyses
            .get(analysis_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Analysis", analysis_id))
    }

    /// Renders an extra report for a stored analysis. Does not touch document status.
    pub async fn generate_report(
        &self,
        analysis_id: &str,
        report_type: ReportType,
        format: ReportFormat,
    ) -> DomainResult<(Report, Vec<u8>)> {
        let analysis = self.analysis(analysis_id).await?;
        let report = self.emitter.emit(&analysis, report_type, format).await?;
        let bytes = self.ctx.blobs.get(self.emitter.bucket(), &report.blob_key).await?;
        Ok((report, bytes))
    }
}
