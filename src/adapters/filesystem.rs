//! Filesystem-backed blob store.
//!
//! Each bucket is a directory under the store root and keys map to relative
//! paths inside it. Put metadata is kept beside the bucket in
//! `{bucket}.meta/{key}.json` so listings only see payloads.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::fs;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::ports::{BlobEntry, BlobStore, StoredBlob};
use crate::services::ids::content_hash;

#[derive(Debug, Clone)]
pub struct FilesystemBlobStore {
    root: PathBuf,
}

impl FilesystemBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn bucket_dir(&self, bucket: &str) -> DomainResult<PathBuf> {
        validate_relative(bucket)?;
        Ok(self.root.join(bucket))
    }

    fn blob_path(&self, bucket: &str, key: &str) -> DomainResult<PathBuf> {
        validate_relative(key)?;
        Ok(self.bucket_dir(bucket)?.join(key))
    }

    fn metadata_path(&self, bucket: &str, key: &str) -> DomainResult<PathBuf> {
        validate_relative(key)?;
        validate_relative(bucket)?;
        Ok(self.root.join(format!("{bucket}.meta")).join(format!("{key}.json")))
    }

    /// Metadata recorded with the last `put` of a key.
    pub async fn metadata(&self, bucket: &str, key: &str) -> DomainResult<BTreeMap<String, String>> {
        let path = self.metadata_path(bucket, key)?;
        match fs::read(&path).await {
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Rejects empty, absolute and parent-escaping paths.
fn validate_relative(value: &str) -> DomainResult<()> {
    let path = Path::new(value);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if value.is_empty() || escapes {
        return Err(DomainError::Validation(format!("invalid blob path: {value:?}")));
    }
    Ok(())
}

async fn write_file(path: &Path, bytes: &[u8]) -> DomainResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await?;
    }
    fs::write(path, bytes).await?;
    Ok(())
}

#[async_trait]
impl BlobStore for FilesystemBlobStore {
    async fn put(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        metadata: &BTreeMap<String, String>,
    ) -> DomainResult<StoredBlob> {
        let path = self.blob_path(bucket, key)?;
        write_file(&path, bytes).await?;
        write_file(&self.metadata_path(bucket, key)?, &serde_json::to_vec_pretty(metadata)?).await?;

        debug!(bucket, key, size = bytes.len(), "Stored blob");
        Ok(StoredBlob {
            size: bytes.len() as u64,
            hash: content_hash(bytes),
            url: format!("file://{}", path.display()),
        })
    }

    async fn get(&self, bucket: &str, key: &str) -> DomainResult<Vec<u8>> {
        let path = self.blob_path(bucket, key)?;
        match fs::read(&path).await {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(DomainError::not_found("Blob", format!("{bucket}/{key}")))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn list(&self, bucket: &str, prefix: &str) -> DomainResult<Vec<BlobEntry>> {
        let bucket_dir = self.bucket_dir(bucket)?;
        let mut entries = Vec::new();
        let mut pending = vec![bucket_dir.clone()];

        while let Some(dir) = pending.pop() {
            let mut read_dir = match fs::read_dir(&dir).await {
                Ok(read_dir) => read_dir,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => return Err(e.into()),
            };

            while let Some(entry) = read_dir.next_entry().await? {
                let file_type = entry.file_type().await?;
                let path = entry.path();
                if file_type.is_dir() {
                    pending.push(path);
                    continue;
                }

                let Ok(relative) = path.strip_prefix(&bucket_dir) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if key.starts_with(prefix) {
                    entries.push(BlobEntry {
                        key,
                        size: entry.metadata().await?.len(),
                    });
                }
            }
        }

        entries.sort_by(|a, b| a.key.cmp(&b.key));
        Ok(entries)
    }

    async fn delete(&self, bucket: &str, key: &str) -> DomainResult<bool> {
        let path = self.blob_path(bucket, key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                let _ = fs::remove_file(self.metadata_path(bucket, key)?).await;
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
