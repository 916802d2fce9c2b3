//! `compliance-mapper ingest`: intake only.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};

use crate::application::{IntakeOutcome, IntakeRequest};
use crate::cli::output::{action_success, label, output, CommandOutput};
use crate::cli::runtime::CliRuntime;
use crate::domain::models::Document;

#[derive(Args, Debug)]
pub struct IngestArgs {
    /// PDF file to ingest
    pub file: PathBuf,

    /// Document type (vendor_contract, regulation, terms_conditions)
    #[arg(short = 't', long = "type", default_value = "vendor_contract")]
    pub document_type: String,

    /// Extra metadata entries (format: "key=value")
    #[arg(short, long)]
    pub metadata: Vec<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct IngestOutput {
    pub document_id: String,
    pub filename: String,
    pub status: String,
    pub file_size: u64,
    pub content_hash: String,
    pub duplicate: bool,
    pub ocr_job_id: Option<String>,
}

impl From<&IntakeOutcome> for IngestOutput {
    fn from(outcome: &IntakeOutcome) -> Self {
        let document = &outcome.document;
        Self {
            document_id: document.id.clone(),
            filename: document.filename.clone(),
            status: document.status.as_str().to_string(),
            file_size: document.file_size,
            content_hash: document.content_hash.clone(),
            duplicate: outcome.duplicate,
            ocr_job_id: document.metadata_str("ocr_job_id").map(ToString::to_string),
        }
    }
}

impl CommandOutput for IngestOutput {
    fn to_human(&self) -> String {
        let headline = if self.duplicate {
            format!("Document already ingested: {}", self.document_id)
        } else {
            action_success(&format!("Document ingested: {}", self.document_id))
        };
        let mut lines = vec![
            headline,
            format!("  {} {}", label("File"), self.filename),
            format!("  {} {}", label("Status"), self.status),
            format!("  {} {} bytes", label("Size"), self.file_size),
        ];
        if let Some(job) = &self.ocr_job_id {
            lines.push(format!("  {} {job}", label("OCR job")));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: IngestArgs, json_mode: bool) -> Result<()> {
    let runtime = CliRuntime::load().await?;
    let request = read_request(&args.file, &args.document_type, &args.metadata).await?;
    let outcome = runtime.pipeline.ingest(request).await?;

    output(&IngestOutput::from(&outcome), json_mode);
    Ok(())
}

/// Builds an intake request from a file on disk.
pub(crate) async fn read_request(file: &Path, document_type: &str, metadata: &[String]) -> Result<IntakeRequest> {
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let filename = file
        .file_name()
        .map_or_else(|| file.to_string_lossy().to_string(), |n| n.to_string_lossy().to_string());

    let mut request = IntakeRequest::new(filename, bytes, document_type);
    for entry in metadata {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid metadata entry '{entry}', expected key=value"))?;
        request.metadata.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(request)
}

pub(crate) fn document_summary(document: &Document) -> Vec<String> {
    vec![
        format!("  {} {}", label("Document"), document.id),
        format!("  {} {}", label("File"), document.filename),
        format!("  {} {}", label("Status"), document.status),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_read_request_parses_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.pdf");
        tokio::fs::write(&path, b"%PDF-1.7 body").await.unwrap();

        let request = read_request(&path, "regulation", &["owner = legal".to_string()])
            .await
            .unwrap();
        assert_eq!(request.filename, "contract.pdf");
        assert_eq!(request.document_type, "regulation");
        assert_eq!(request.metadata.get("owner").map(String::as_str), Some("legal"));
    }

    #[tokio::test]
    async fn test_read_request_rejects_bad_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("contract.pdf");
        tokio::fs::write(&path, b"%PDF-1.7").await.unwrap();

        assert!(read_request(&path, "regulation", &["novalue".to_string()]).await.is_err());
    }
}
