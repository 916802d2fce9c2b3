//! Risk analysis model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Ordinal risk level: minimal < low < medium < high < critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Minimal,
    Low,
    Medium,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "minimal" => Some(Self::Minimal),
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            "critical" => Some(Self::Critical),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A flagged shortfall against a regulation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplianceGap {
    pub clause_id: Option<String>,
    pub gap_type: String,
    pub severity: RiskLevel,
    pub recommendation: String,
}

/// Output of one risk agent for one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentAnalysis {
    pub agent: String,
    pub risk_score: f64,
    pub risk_level: RiskLevel,
    pub gaps: Vec<ComplianceGap>,
    pub recommendations: Vec<String>,
    #[serde(default)]
    pub risk_factors: Vec<String>,
    pub mappings_analyzed: usize,
}

/// Consolidated result of one analysis run. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_id: String,
    pub document_id: String,
    pub agent_analyses: Vec<AgentAnalysis>,
    pub overall_risk_score: f64,
    pub agent_count: usize,
    pub analysis_type: String,
    pub created_at: DateTime<Utc>,
}

impl AnalysisResult {
    pub const FULL_COMPLIANCE: &'static str = "full_compliance";

    pub fn agent(&self, name: &str) -> Option<&AgentAnalysis> {
        self.agent_analyses.iter().find(|a| a.agent == name)
    }

    /// Highest level reported by any agent.
    pub fn worst_level(&self) -> Option<RiskLevel> {
        self.agent_analyses.iter().map(|a| a.risk_level).max()
    }

    pub fn total_gaps(&self) -> usize {
        self.agent_analyses.iter().map(|a| a.gaps.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_risk_level_ordering() {
        assert!(RiskLevel::Minimal < RiskLevel::Low);
        assert!(RiskLevel::Low < RiskLevel::Medium);
        assert!(RiskLevel::Medium < RiskLevel::High);
        assert!(RiskLevel::High < RiskLevel::Critical);
    }

    #[test]
    fn test_worst_level() {
        let analysis = |agent: &str, level| AgentAnalysis {
            agent: agent.into(),
            risk_score: 0.5,
            risk_level: level,
            gaps: vec![],
            recommendations: vec![],
            risk_factors: vec![],
            mappings_analyzed: 0,
        };
        let result = AnalysisResult {
            analysis_id: "analysis_1".into(),
            document_id: "doc_1".into(),
            agent_analyses: vec![analysis("safety", RiskLevel::Low), analysis("risk", RiskLevel::High)],
            overall_risk_score: 0.5,
            agent_count: 2,
            analysis_type: AnalysisResult::FULL_COMPLIANCE.into(),
            created_at: Utc::now(),
        };
        assert_eq!(result.worst_level(), Some(RiskLevel::High));
        assert!(result.agent("risk").is_some());
        assert!(result.agent("legal").is_none());
    }
}
