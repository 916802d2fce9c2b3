//! Text and JSON report rendering.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{AgentAnalysis, AnalysisResult, ComplianceGap, ReportFormat, ReportType, RiskLevel};
use crate::domain::ports::ReportRenderer;

const STANDARD_RECOMMENDATIONS: [&str; 3] = [
    "Review identified compliance gaps",
    "Implement recommended improvements",
    "Schedule regular compliance audits",
];

#[derive(Debug, Clone, Serialize)]
struct AgentSummary {
    agent: String,
    risk_score: f64,
    risk_level: RiskLevel,
    mappings_analyzed: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    risk_factors: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    gaps: Vec<ComplianceGap>,
}

/// Everything a rendered report can show; sections a report type omits stay empty.
#[derive(Debug, Clone, Serialize)]
struct ReportContent {
    title: &'static str,
    report_type: ReportType,
    analysis_id: String,
    document_id: String,
    overall_risk_score: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    risk_level: Option<RiskLevel>,
    analysis_timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    key_findings: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    recommendations: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    agents: Vec<AgentSummary>,
}

impl ReportContent {
    fn build(analysis: &AnalysisResult, report_type: ReportType) -> Self {
        let mut content = Self {
            title: title(report_type),
            report_type,
            analysis_id: analysis.analysis_id.clone(),
            document_id: analysis.document_id.clone(),
            overall_risk_score: analysis.overall_risk_score,
            risk_level: analysis.worst_level(),
            analysis_timestamp: analysis.created_at,
            key_findings: Vec::new(),
            recommendations: Vec::new(),
            agents: Vec::new(),
        };

        if report_type == ReportType::Basic {
            return content;
        }

        content.key_findings = key_findings(analysis);
        content.recommendations = recommendations(analysis);
        content.agents = analysis
            .agent_analyses
            .iter()
            .map(|a| summarize_agent(a, report_type == ReportType::DetailedAudit))
            .collect();
        content
    }
}

fn title(report_type: ReportType) -> &'static str {
    match report_type {
        ReportType::ExecutiveSummary => "Compliance Analysis Executive Summary",
        ReportType::DetailedAudit => "Compliance Analysis Detailed Audit",
        ReportType::Basic => "Compliance Analysis Report",
    }
}

fn key_findings(analysis: &AnalysisResult) -> Vec<String> {
    let mut findings = vec![
        "Compliance analysis completed".to_string(),
        format!("Overall risk score: {:.2}", analysis.overall_risk_score),
    ];
    findings.extend(
        analysis
            .agent_analyses
            .iter()
            .map(|a| format!("{}: {} ({:.2})", a.agent, a.risk_level, a.risk_score)),
    );
    findings
}

fn recommendations(analysis: &AnalysisResult) -> Vec<String> {
    let mut recommendations: Vec<String> = STANDARD_RECOMMENDATIONS.iter().map(|r| (*r).to_string()).collect();
    for recommendation in analysis.agent_analyses.iter().flat_map(|a| &a.recommendations) {
        if !recommendations.contains(recommendation) {
            recommendations.push(recommendation.clone());
        }
    }
    recommendations
}

fn summarize_agent(analysis: &AgentAnalysis, with_gaps: bool) -> AgentSummary {
    AgentSummary {
        agent: analysis.agent.clone(),
        risk_score: analysis.risk_score,
        risk_level: analysis.risk_level,
        mappings_analyzed: analysis.mappings_analyzed,
        risk_factors: if with_gaps { analysis.risk_factors.clone() } else { Vec::new() },
        gaps: if with_gaps { analysis.gaps.clone() } else { Vec::new() },
    }
}

fn write_text(out: &mut impl fmt::Write, content: &ReportContent) -> fmt::Result {
    let heading = content.title.to_uppercase();

    writeln!(out, "{heading}")?;
    writeln!(out, "{}", "=".repeat(heading.len()))?;
    writeln!(out)?;
    writeln!(out, "Analysis ID: {}", content.analysis_id)?;
    writeln!(out, "Document ID: {}", content.document_id)?;
    writeln!(out, "Generated: {}", content.analysis_timestamp.format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(out)?;
    writeln!(out, "OVERALL RISK SCORE: {:.2}", content.overall_risk_score)?;
    if let Some(level) = content.risk_level {
        writeln!(out, "RISK LEVEL: {}", level.as_str().to_uppercase())?;
    }

    if !content.key_findings.is_empty() {
        writeln!(out, "\nKEY FINDINGS:")?;
        for finding in &content.key_findings {
            writeln!(out, "\u{2022} {finding}")?;
        }
    }

    if !content.recommendations.is_empty() {
        writeln!(out, "\nRECOMMENDATIONS:")?;
        for recommendation in &content.recommendations {
            writeln!(out, "\u{2022} {recommendation}")?;
        }
    }

    if content.report_type == ReportType::DetailedAudit {
        for agent in &content.agents {
            writeln!(
                out,
                "\nAGENT {} ({}, score {:.2}, {} mappings)",
                agent.agent.to_uppercase(),
                agent.risk_level,
                agent.risk_score,
                agent.mappings_analyzed
            )?;
            for factor in &agent.risk_factors {
                writeln!(out, "  factor: {factor}")?;
            }
            if agent.gaps.is_empty() {
                writeln!(out, "  no gaps")?;
            }
            for gap in &agent.gaps {
                writeln!(
                    out,
                    "  [{}] {} {}: {}",
                    gap.severity,
                    gap.gap_type,
                    gap.clause_id.as_deref().unwrap_or("-"),
                    gap.recommendation
                )?;
            }
        }
    }

    Ok(())
}

/// Renders analyses as pretty JSON or plain text.
#[derive(Debug, Clone, Default)]
pub struct StandardReportRenderer;

impl StandardReportRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ReportRenderer for StandardReportRenderer {
    fn render(&self, analysis: &AnalysisResult, report_type: ReportType, format: ReportFormat) -> DomainResult<Vec<u8>> {
        let content = ReportContent::build(analysis, report_type);
        Ok(match format {
            ReportFormat::Json => serde_json::to_vec_pretty(&content)?,
            ReportFormat::Text => {
                let mut out = String::new();
                write_text(&mut out, &content)
                    .map_err(|e| DomainError::Serialization(format!("text report: {e}")))?;
                out.into_bytes()
            }
        })
    }
}
