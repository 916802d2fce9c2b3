//! Blob storage port for raw uploads, processed artifacts and reports.

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::DomainResult;

/// Receipt returned by a successful `put`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBlob {
    pub size: u64,
    /// SHA-256 hex digest of the stored bytes
    pub hash: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobEntry {
    pub key: String,
    pub size: u64,
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        metadata: &BTreeMap<String, String>,
    ) -> DomainResult<StoredBlob>;

    /// Fails with `NotFound` when the key does not exist.
    async fn get(&self, bucket: &str, key: &str) -> DomainResult<Vec<u8>>;

    async fn list(&self, bucket: &str, prefix: &str) -> DomainResult<Vec<BlobEntry>>;

    /// Returns whether anything was deleted.
    async fn delete(&self, bucket: &str, key: &str) -> DomainResult<bool>;
}
