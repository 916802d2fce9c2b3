//! `compliance-mapper report`: render a report for a stored analysis.

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::cli::output::{action_success, label, output, CommandOutput};
use crate::cli::runtime::CliRuntime;
use crate::domain::models::{Report, ReportFormat, ReportType};

#[derive(Args, Debug)]
pub struct ReportArgs {
    /// Analysis ID
    pub analysis_id: String,

    /// Report type (executive_summary, detailed_audit, basic)
    #[arg(short = 't', long = "type", default_value = "executive_summary")]
    pub report_type: String,

    /// Output format (json, text)
    #[arg(short, long, default_value = "json")]
    pub format: String,

    /// Write the rendered report to this path instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, serde::Serialize)]
pub struct ReportOutput {
    pub report: Report,
    pub written_to: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<serde_json::Value>,
    #[serde(skip)]
    pub rendered: Option<String>,
}

impl CommandOutput for ReportOutput {
    fn to_human(&self) -> String {
        if let Some(rendered) = &self.rendered {
            return rendered.clone();
        }
        let mut lines = vec![
            action_success(&format!("Report generated: {}", self.report.report_id)),
            format!("  {} {}", label("Type"), self.report.report_type.as_str()),
            format!("  {} {}", label("Format"), self.report.format.as_str()),
            format!("  {} {} bytes", label("Size"), self.report.file_size_bytes),
            format!("  {} {}", label("Blob"), self.report.blob_key),
        ];
        if let Some(path) = &self.written_to {
            lines.push(format!("  {} {}", label("Written to"), path.display()));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: ReportArgs, json_mode: bool) -> Result<()> {
    let report_type = ReportType::parse(&args.report_type);
    let format = ReportFormat::from_str(&args.format)
        .ok_or_else(|| anyhow::anyhow!("Invalid report format: {}", args.format))?;

    let runtime = CliRuntime::load().await?;
    let (report, bytes) = runtime
        .pipeline
        .generate_report(&args.analysis_id, report_type, format)
        .await?;

    let out = match args.output {
        Some(path) => {
            tokio::fs::write(&path, &bytes)
                .await
                .with_context(|| format!("Failed to write report to {}", path.display()))?;
            ReportOutput {
                report,
                written_to: Some(path),
                content: None,
                rendered: None,
            }
        }
        None => {
            let text = String::from_utf8_lossy(&bytes).to_string();
            let content = match format {
                ReportFormat::Json => serde_json::from_slice(&bytes).ok(),
                ReportFormat::Text => Some(serde_json::Value::String(text.clone())),
            };
            ReportOutput {
                report,
                written_to: None,
                content,
                rendered: Some(text),
            }
        }
    };

    output(&out, json_mode);
    Ok(())
}
