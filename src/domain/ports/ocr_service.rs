//! OCR service port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::OcrJob;

/// Asynchronous text detection over a stored blob.
#[async_trait]
pub trait OcrService: Send + Sync {
    /// Start recognition of `bucket/key`, returning a job id.
    async fn submit(&self, bucket: &str, key: &str) -> DomainResult<String>;

    /// Current state of a job; the block graph is present once it succeeded.
    async fn poll(&self, job_id: &str) -> DomainResult<OcrJob>;
}
