//! `compliance-mapper run`: intake, OCR result registration and the full pipeline.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::application::EventRouter;
use crate::cli::output::{create_spinner, output};
use crate::cli::runtime::CliRuntime;
use crate::domain::models::DocumentStatus;

use super::ingest::read_request;
use super::process::ProcessOutput;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// PDF file to process
    pub file: PathBuf,

    /// Document type (vendor_contract, regulation, terms_conditions)
    #[arg(short = 't', long = "type", default_value = "vendor_contract")]
    pub document_type: String,

    /// Block-graph JSON produced by the OCR engine for this file
    #[arg(long)]
    pub ocr: PathBuf,

    /// Extra metadata entries (format: "key=value")
    #[arg(short, long)]
    pub metadata: Vec<String>,
}

pub async fn execute(args: RunArgs, json_mode: bool) -> Result<()> {
    let runtime = CliRuntime::load().await?;
    let raw_graph = tokio::fs::read_to_string(&args.ocr)
        .await
        .with_context(|| format!("Failed to read OCR result {}", args.ocr.display()))?;

    let request = read_request(&args.file, &args.document_type, &args.metadata).await?;
    let intake = runtime.pipeline.ingest(request).await?;
    let document = intake.document;

    if document.status == DocumentStatus::Uploaded {
        let bucket = document
            .metadata_str("raw_bucket")
            .unwrap_or(runtime.config().storage.raw_bucket.as_str());
        let key = document
            .metadata_str("raw_key")
            .ok_or_else(|| anyhow::anyhow!("Document {} has no stored raw key", document.id))?;
        runtime
            .adapters
            .ocr
            .register_result(bucket, key, &raw_graph)
            .await
            .context("Failed to register OCR result")?;
    }

    let router = EventRouter::new(runtime.pipeline.clone());
    let spinner = create_spinner(format!("Processing {}", document.filename), json_mode);
    let finished = router.drive(&document.id).await;
    spinner.finish_and_clear();
    let finished = finished?;

    output(&ProcessOutput::new(&finished, None, None), json_mode);
    Ok(())
}
