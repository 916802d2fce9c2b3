//! Document CLI commands.

use anyhow::Result;
use clap::{Args, Subcommand};
use std::collections::BTreeMap;

use crate::cli::output::{colorize_status, label, list_table, output, render_list, truncate, CommandOutput};
use crate::cli::runtime::CliRuntime;
use crate::domain::models::{Document, DocumentStatus, DocumentType, Report};
use crate::domain::ports::{DocumentFilter, PageRequest};

#[derive(Args, Debug)]
pub struct DocumentsArgs {
    #[command(subcommand)]
    pub command: DocumentsCommands,
}

#[derive(Subcommand, Debug)]
pub enum DocumentsCommands {
    /// List documents, newest first
    List {
        /// Filter by status
        #[arg(short, long)]
        status: Option<String>,
        /// Filter by document type
        #[arg(short = 't', long = "type")]
        document_type: Option<String>,
        /// Page number, starting at 1
        #[arg(short, long, default_value = "1")]
        page: u32,
        /// Page size
        #[arg(short, long, default_value = "50")]
        limit: u32,
    },
    /// Show document details
    Show {
        /// Document ID
        id: String,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct DocumentOutput {
    pub id: String,
    pub filename: String,
    pub document_type: String,
    pub status: String,
    pub file_size: u64,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&Document> for DocumentOutput {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            filename: document.filename.clone(),
            document_type: document.document_type.as_str().to_string(),
            status: document.status.as_str().to_string(),
            file_size: document.file_size,
            created_at: document.created_at.to_rfc3339(),
            updated_at: document.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct DocumentListOutput {
    pub documents: Vec<DocumentOutput>,
    pub total: u64,
    pub page: u32,
    pub total_pages: u64,
}

impl CommandOutput for DocumentListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["id", "filename", "type", "status", "created"]);
        for doc in &self.documents {
            table.add_row(vec![
                doc.id.clone(),
                truncate(&doc.filename, 32),
                doc.document_type.clone(),
                colorize_status(&doc.status).to_string(),
                doc.created_at.chars().take(19).collect(),
            ]);
        }
        let mut rendered = render_list("document", &table, self.total);
        if self.total_pages > 1 {
            rendered.push_str(&format!("\n\nPage {} of {}", self.page, self.total_pages));
        }
        rendered
    }
}

#[derive(Debug, serde::Serialize)]
pub struct DocumentDetailOutput {
    pub document: DocumentOutput,
    pub content_hash: String,
    pub metadata: BTreeMap<String, serde_json::Value>,
    pub page_count: usize,
    pub clause_count: usize,
    pub reports: Vec<String>,
}

impl CommandOutput for DocumentDetailOutput {
    fn to_human(&self) -> String {
        let doc = &self.document;
        let mut lines = vec![
            format!("{} {}", label("Document"), doc.id),
            format!("{} {}", label("File"), doc.filename),
            format!("{} {}", label("Type"), doc.document_type),
            format!("{} {}", label("Status"), colorize_status(&doc.status)),
            format!("{} {} bytes", label("Size"), doc.file_size),
            format!("{} {}", label("Hash"), self.content_hash),
            format!("{} {}", label("Pages"), self.page_count),
            format!("{} {}", label("Clauses"), self.clause_count),
            format!("{} {}", label("Created"), doc.created_at),
            format!("{} {}", label("Updated"), doc.updated_at),
        ];

        let scalars: Vec<String> = self
            .metadata
            .iter()
            .filter(|(_, v)| !v.is_object() && !v.is_array())
            .map(|(k, v)| match v {
                serde_json::Value::String(s) => format!("  {k}: {s}"),
                other => format!("  {k}: {other}"),
            })
            .collect();
        if !scalars.is_empty() {
            lines.push("\nMetadata:".to_string());
            lines.extend(scalars);
        }

        if !self.reports.is_empty() {
            lines.push("\nReports:".to_string());
            lines.extend(self.reports.iter().map(|r| format!("  - {r}")));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: DocumentsArgs, json_mode: bool) -> Result<()> {
    let runtime = CliRuntime::load().await?;
    let ctx = runtime.pipeline.context();

    match args.command {
        DocumentsCommands::List {
            status,
            document_type,
            page,
            limit,
        } => {
            let status = status
                .map(|s| DocumentStatus::from_str(&s).ok_or_else(|| anyhow::anyhow!("Invalid status: {s}")))
                .transpose()?;
            let document_type = document_type
                .map(|t| DocumentType::from_str(&t).ok_or_else(|| anyhow::anyhow!("Invalid document type: {t}")))
                .transpose()?;

            let result = ctx
                .documents
                .list(DocumentFilter { status, document_type }, PageRequest::new(page, limit))
                .await?;

            let out = DocumentListOutput {
                documents: result.items.iter().map(DocumentOutput::from).collect(),
                total: result.total_count,
                page: result.page,
                total_pages: result.total_pages(),
            };
            output(&out, json_mode);
        }
        DocumentsCommands::Show { id } => {
            let document = runtime.pipeline.document(&id).await?;
            let page_count = ctx.pages.list_pages(&id).await?.len();
            let clause_count = ctx.clauses.list_by_document(&id).await?.len();
            let reports = ctx.reports.list_for_document(&id).await?;

            let out = DocumentDetailOutput {
                document: DocumentOutput::from(&document),
                content_hash: document.content_hash.clone(),
                metadata: document.metadata.clone(),
                page_count,
                clause_count,
                reports: reports.iter().map(describe_report).collect(),
            };
            output(&out, json_mode);
        }
    }

    Ok(())
}

fn describe_report(report: &Report) -> String {
    format!(
        "{} ({}, {}, {} bytes)",
        report.report_id,
        report.report_type.as_str(),
        report.format.as_str(),
        report.file_size_bytes
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_output_pagination_footer() {
        let out = DocumentListOutput {
            documents: vec![],
            total: 120,
            page: 2,
            total_pages: 3,
        };
        assert!(out.to_human().ends_with("Page 2 of 3"));
    }

    #[test]
    fn test_empty_list() {
        let out = DocumentListOutput {
            documents: vec![],
            total: 0,
            page: 1,
            total_pages: 0,
        };
        assert_eq!(out.to_human(), "No documents found.");
    }
}
