//! `compliance-mapper process`: run one stage or drive a document to completion.

use anyhow::Result;
use clap::Args;

use crate::application::{EventRouter, StageOutcome};
use crate::cli::output::{create_spinner, label, output, CommandOutput};
use crate::cli::runtime::CliRuntime;
use crate::domain::models::{Document, PipelineStage};

use super::ingest::document_summary;

#[derive(Args, Debug)]
pub struct ProcessArgs {
    /// Document ID
    pub document_id: String,

    /// Run only this stage (ocr, clause_extraction, semantic_mapping, agentic_reasoning, report_generation)
    #[arg(short, long)]
    pub stage: Option<String>,
}

#[derive(Debug, serde::Serialize)]
pub struct ProcessOutput {
    pub document_id: String,
    pub filename: String,
    pub stage: Option<String>,
    pub skipped: bool,
    pub status: String,
    pub error_message: Option<String>,
    pub report_id: Option<String>,
    #[serde(skip)]
    pub summary: Vec<String>,
}

impl ProcessOutput {
    pub(crate) fn new(document: &Document, stage: Option<PipelineStage>, outcome: Option<StageOutcome>) -> Self {
        Self {
            document_id: document.id.clone(),
            filename: document.filename.clone(),
            stage: stage.map(|s| s.as_str().to_string()),
            skipped: outcome.is_some_and(|o| o.is_skipped()),
            status: document.status.as_str().to_string(),
            error_message: document.metadata_str("error_message").map(ToString::to_string),
            report_id: document.metadata_str("report_id").map(ToString::to_string),
            summary: document_summary(document),
        }
    }
}

impl CommandOutput for ProcessOutput {
    fn to_human(&self) -> String {
        let mut lines = match (&self.stage, self.skipped) {
            (Some(stage), true) => vec![format!("Stage {stage} skipped, already applied or document failed")],
            (Some(stage), false) => vec![format!("Stage {stage} completed")],
            (None, _) => vec!["Pipeline run finished".to_string()],
        };
        lines.extend(self.summary.iter().cloned());
        if let Some(err) = &self.error_message {
            lines.push(format!("  {} {err}", label("Error")));
        }
        if let Some(report) = &self.report_id {
            lines.push(format!("  {} {report}", label("Report")));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: ProcessArgs, json_mode: bool) -> Result<()> {
    let runtime = CliRuntime::load().await?;

    let (stage, outcome, document) = match args.stage {
        Some(name) => {
            let stage =
                PipelineStage::from_str(&name).ok_or_else(|| anyhow::anyhow!("Invalid stage: {name}"))?;
            let spinner = create_spinner(format!("Running {stage}"), json_mode);
            let outcome = runtime.pipeline.run_stage(stage, &args.document_id).await;
            spinner.finish_and_clear();
            let outcome = outcome?;
            let document = runtime.pipeline.document(&args.document_id).await?;
            (Some(stage), Some(outcome), document)
        }
        None => {
            let router = EventRouter::new(runtime.pipeline.clone());
            let spinner = create_spinner("Driving pipeline", json_mode);
            let document = router.drive(&args.document_id).await;
            spinner.finish_and_clear();
            (None, None, document?)
        }
    };

    output(&ProcessOutput::new(&document, stage, outcome), json_mode);
    Ok(())
}
