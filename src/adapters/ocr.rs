//! OCR service backed by block-graph sidecar files.
//!
//! Recognition itself happens out of process. A finished job is a
//! `{key}.blocks.json` blob written next to the source document; a failed job
//! is a `{key}.ocr-error` blob holding the failure message. Until either
//! exists the job is in progress.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{BlockGraph, OcrJob, OcrJobStatus};
use crate::domain::ports::{BlobStore, OcrService};

const JOB_PREFIX: &str = "ocrjob";
const RESULT_SUFFIX: &str = ".blocks.json";
const ERROR_SUFFIX: &str = ".ocr-error";

pub struct SidecarOcrService {
    blobs: Arc<dyn BlobStore>,
}

impl SidecarOcrService {
    pub fn new(blobs: Arc<dyn BlobStore>) -> Self {
        Self { blobs }
    }

    pub fn job_id(bucket: &str, key: &str) -> String {
        format!("{JOB_PREFIX}:{bucket}:{key}")
    }

    fn parse_job_id(job_id: &str) -> DomainResult<(&str, &str)> {
        let mut parts = job_id.splitn(3, ':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(JOB_PREFIX), Some(bucket), Some(key)) if !bucket.is_empty() && !key.is_empty() => Ok((bucket, key)),
            _ => Err(DomainError::Validation(format!("malformed OCR job id: {job_id}"))),
        }
    }

    /// Records a recognition result for a stored document, completing its job.
    pub async fn register_result(&self, bucket: &str, key: &str, raw_graph: &str) -> DomainResult<()> {
        let graph = BlockGraph::from_json(raw_graph)?;
        let bytes = serde_json::to_vec(&graph)?;
        let metadata = BTreeMap::from([("source_key".to_string(), key.to_string())]);

        self.blobs
            .put(bucket, &format!("{key}{RESULT_SUFFIX}"), &bytes, &metadata)
            .await?;
        info!(bucket, key, blocks = graph.blocks.len(), "Registered OCR result");
        Ok(())
    }

    /// Marks a job as failed with `message`.
    pub async fn register_failure(&self, bucket: &str, key: &str, message: &str) -> DomainResult<()> {
        self.blobs
            .put(bucket, &format!("{key}{ERROR_SUFFIX}"), message.as_bytes(), &BTreeMap::new())
            .await?;
        Ok(())
    }

    async fn read_optional(&self, bucket: &str, key: &str) -> DomainResult<Option<Vec<u8>>> {
        match self.blobs.get(bucket, key).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(DomainError::NotFound { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl OcrService for SidecarOcrService {
    async fn submit(&self, bucket: &str, key: &str) -> DomainResult<String> {
        // the source document must exist before a job can reference it
        self.blobs.get(bucket, key).await?;

        let job_id = Self::job_id(bucket, key);
        debug!(job_id = %job_id, "Submitted OCR job");
        Ok(job_id)
    }

    async fn poll(&self, job_id: &str) -> DomainResult<OcrJob> {
        let (bucket, key) = Self::parse_job_id(job_id)?;

        if let Some(raw) = self.read_optional(bucket, &format!("{key}{RESULT_SUFFIX}")).await? {
            let raw = String::from_utf8(raw)
                .map_err(|e| DomainError::Serialization(format!("OCR result is not UTF-8: {e}")))?;
            return Ok(OcrJob {
                job_id: job_id.to_string(),
                status: OcrJobStatus::Succeeded,
                blocks: Some(BlockGraph::from_json(&raw)?),
                message: None,
            });
        }

        if let Some(message) = self.read_optional(bucket, &format!("{key}{ERROR_SUFFIX}")).await? {
            return Ok(OcrJob {
                job_id: job_id.to_string(),
                status: OcrJobStatus::Failed,
                blocks: None,
                message: Some(String::from_utf8_lossy(&message).into_owned()),
            });
        }

        Ok(OcrJob {
            job_id: job_id.to_string(),
            status: OcrJobStatus::InProgress,
            blocks: None,
            message: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::filesystem::FilesystemBlobStore;

    const GRAPH: &str = r#"{"Blocks": [
        {"BlockType": "PAGE", "Id": "p1", "Relationships": [{"Type": "CHILD", "Ids": ["l1"]}]},
        {"BlockType": "LINE", "Id": "l1", "Text": "1. Scope of works", "Confidence": 98.0}
    ]}"#;

    async fn setup() -> (tempfile::TempDir, SidecarOcrService) {
        let dir = tempfile::tempdir().unwrap();
        let blobs = Arc::new(FilesystemBlobStore::new(dir.path()));
        blobs
            .put("raw", "documents/doc_1/contract.pdf", b"%PDF-1.4", &BTreeMap::new())
            .await
            .unwrap();
        (dir, SidecarOcrService::new(blobs))
    }

    #[tokio::test]
    async fn test_submit_requires_existing_blob() {
        let (_dir, service) = setup().await;

        let job_id = service.submit("raw", "documents/doc_1/contract.pdf").await.unwrap();
        assert_eq!(job_id, "ocrjob:raw:documents/doc_1/contract.pdf");

        let err = service.submit("raw", "documents/missing.pdf").await.unwrap_err();
        assert!(matches!(err, DomainError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_poll_lifecycle() {
        let (_dir, service) = setup().await;
        let job_id = service.submit("raw", "documents/doc_1/contract.pdf").await.unwrap();

        let job = service.poll(&job_id).await.unwrap();
        assert_eq!(job.status, OcrJobStatus::InProgress);
        assert!(job.blocks.is_none());

        service.register_result("raw", "documents/doc_1/contract.pdf", GRAPH).await.unwrap();

        let job = service.poll(&job_id).await.unwrap();
        assert_eq!(job.status, OcrJobStatus::Succeeded);
        assert_eq!(job.blocks.unwrap().blocks.len(), 2);
    }

    #[tokio::test]
    async fn test_poll_reports_failure() {
        let (_dir, service) = setup().await;
        let job_id = service.submit("raw", "documents/doc_1/contract.pdf").await.unwrap();
        service
            .register_failure("raw", "documents/doc_1/contract.pdf", "unsupported encryption")
            .await
            .unwrap();

        let job = service.poll(&job_id).await.unwrap();
        assert_eq!(job.status, OcrJobStatus::Failed);
        assert_eq!(job.message.as_deref(), Some("unsupported encryption"));
    }

    #[tokio::test]
    async fn test_malformed_job_id() {
        let (_dir, service) = setup().await;
        for job_id in ["", "job:raw:key", "ocrjob:raw", "ocrjob::key"] {
            assert!(matches!(service.poll(job_id).await, Err(DomainError::Validation(_))), "{job_id}");
        }
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_graph() {
        let (_dir, service) = setup().await;
        let err = service
            .register_result("raw", "documents/doc_1/contract.pdf", r#"{"Pages": []}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
