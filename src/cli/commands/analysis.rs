//! `compliance-mapper analysis`: show the consolidated risk analysis.

use anyhow::Result;
use clap::Args;

use crate::cli::output::{colorize_risk, label, list_table, output, CommandOutput};
use crate::cli::runtime::CliRuntime;
use crate::domain::models::{AnalysisResult, ComplianceGap};

#[derive(Args, Debug)]
pub struct AnalysisArgs {
    /// Document ID
    pub document_id: String,

    /// List every compliance gap
    #[arg(short, long)]
    pub gaps: bool,
}

#[derive(Debug, serde::Serialize)]
pub struct AnalysisOutput {
    pub analysis: AnalysisResult,
    #[serde(skip)]
    pub show_gaps: bool,
}

impl CommandOutput for AnalysisOutput {
    fn to_human(&self) -> String {
        let analysis = &self.analysis;
        let worst = analysis.worst_level().map_or("n/a", |l| l.as_str());
        let mut lines = vec![
            format!("{} {}", label("Analysis"), analysis.analysis_id),
            format!("{} {}", label("Document"), analysis.document_id),
            format!("{} {:.2}", label("Overall risk"), analysis.overall_risk_score),
            format!("{} {}", label("Worst level"), colorize_risk(worst)),
            format!("{} {}", label("Gaps"), analysis.total_gaps()),
            String::new(),
        ];

        let mut table = list_table(&["agent", "score", "level", "mappings", "gaps"]);
        for agent in &analysis.agent_analyses {
            table.add_row(vec![
                agent.agent.clone(),
                format!("{:.2}", agent.risk_score),
                colorize_risk(agent.risk_level.as_str()).to_string(),
                agent.mappings_analyzed.to_string(),
                agent.gaps.len().to_string(),
            ]);
        }
        lines.push(table.to_string());

        if self.show_gaps {
            for agent in &analysis.agent_analyses {
                for gap in &agent.gaps {
                    lines.push(format_gap(&agent.agent, gap));
                }
            }
        }
        lines.join("\n")
    }
}

fn format_gap(agent: &str, gap: &ComplianceGap) -> String {
    format!(
        "  [{}] {agent} {} {}: {}",
        gap.severity,
        gap.gap_type,
        gap.clause_id.as_deref().unwrap_or("-"),
        gap.recommendation
    )
}

pub async fn execute(args: AnalysisArgs, json_mode: bool) -> Result<()> {
    let runtime = CliRuntime::load().await?;
    runtime.pipeline.document(&args.document_id).await?;

    let analysis = runtime
        .pipeline
        .context()
        .analyses
        .latest_for_document(&args.document_id)
        .await?
        .ok_or_else(|| anyhow::anyhow!("No analysis stored for document {}", args.document_id))?;

    output(
        &AnalysisOutput {
            analysis,
            show_gaps: args.gaps,
        },
        json_mode,
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::RiskLevel;

    #[test]
    fn test_format_gap_without_clause() {
        let gap = ComplianceGap {
            clause_id: None,
            gap_type: "missing_mapping".to_string(),
            severity: RiskLevel::High,
            recommendation: "Immediate compliance review required".to_string(),
        };
        assert_eq!(
            format_gap("safety", &gap),
            "  [high] safety missing_mapping -: Immediate compliance review required"
        );
    }
}
