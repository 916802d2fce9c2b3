//! `compliance-mapper clauses`: list extracted clauses.

use anyhow::Result;
use clap::Args;

use crate::cli::output::{list_table, output, render_list, truncate, CommandOutput};
use crate::cli::runtime::CliRuntime;
use crate::domain::models::{Clause, ComplianceCategory};
use crate::domain::ports::{ClauseFilter, PageRequest};

#[derive(Args, Debug)]
pub struct ClausesArgs {
    /// Document ID
    pub document_id: String,

    /// Only clauses of this category (e.g. safety_compliance)
    #[arg(short, long)]
    pub category: Option<String>,

    /// Only clauses classified at or above this confidence
    #[arg(long)]
    pub min_confidence: Option<f64>,

    /// Include the extracted entities
    #[arg(short, long)]
    pub entities: bool,

    #[arg(short, long, default_value = "1")]
    pub page: u32,

    #[arg(short, long, default_value = "100")]
    pub limit: u32,
}

#[derive(Debug, serde::Serialize)]
pub struct ClauseOutput {
    pub id: String,
    pub clause_number: String,
    pub category: String,
    pub subtype: String,
    pub confidence: f64,
    pub has_mandatory_language: bool,
    pub has_penalties: bool,
    pub page_numbers: Vec<u32>,
    pub text: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<String>,
}

impl ClauseOutput {
    fn new(clause: &Clause, with_entities: bool) -> Self {
        let entities = if with_entities {
            clause
                .entities
                .iter()
                .map(|e| format!("{}: {}", e.entity_type.as_str(), e.normalized_value))
                .collect()
        } else {
            Vec::new()
        };
        Self {
            id: clause.id.clone(),
            clause_number: clause.clause_number.clone(),
            category: clause.category.as_str().to_string(),
            subtype: clause.subtype.clone(),
            confidence: clause.confidence,
            has_mandatory_language: clause.has_mandatory_language,
            has_penalties: clause.has_penalties,
            page_numbers: clause.page_numbers.clone(),
            text: clause.text.clone(),
            entities,
        }
    }
}

#[derive(Debug, serde::Serialize)]
pub struct ClauseListOutput {
    pub document_id: String,
    pub clauses: Vec<ClauseOutput>,
    pub total: u64,
}

impl CommandOutput for ClauseListOutput {
    fn to_human(&self) -> String {
        let mut table = list_table(&["#", "category", "confidence", "flags", "pages", "text"]);
        for clause in &self.clauses {
            let mut flags = Vec::new();
            if clause.has_mandatory_language {
                flags.push("M");
            }
            if clause.has_penalties {
                flags.push("P");
            }
            let pages: Vec<String> = clause.page_numbers.iter().map(ToString::to_string).collect();
            table.add_row(vec![
                clause.clause_number.clone(),
                clause.category.clone(),
                format!("{:.2}", clause.confidence),
                flags.join(""),
                pages.join(","),
                truncate(&clause.text, 60),
            ]);
        }

        let mut rendered = render_list("clause", &table, self.total);
        for clause in self.clauses.iter().filter(|c| !c.entities.is_empty()) {
            rendered.push_str(&format!("\n\n{} entities:", clause.id));
            for entity in &clause.entities {
                rendered.push_str(&format!("\n  - {entity}"));
            }
        }
        rendered
    }
}

pub async fn execute(args: ClausesArgs, json_mode: bool) -> Result<()> {
    let runtime = CliRuntime::load().await?;
    // surfaces NotFound for unknown documents instead of an empty list
    runtime.pipeline.document(&args.document_id).await?;

    let filter = ClauseFilter {
        document_id: Some(args.document_id.clone()),
        category: args.category.as_deref().map(ComplianceCategory::parse),
        min_confidence: args.min_confidence,
    };
    let result = runtime
        .pipeline
        .context()
        .clauses
        .list(filter, PageRequest::new(args.page, args.limit))
        .await?;

    let out = ClauseListOutput {
        document_id: args.document_id,
        clauses: result.items.iter().map(|c| ClauseOutput::new(c, args.entities)).collect(),
        total: result.total_count,
    };
    output(&out, json_mode);
    Ok(())
}
