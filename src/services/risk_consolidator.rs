//! Runs the risk agents over a document's mappings and consolidates them.

use chrono::Utc;
use tracing::debug;

use super::ids;
use super::risk_agents::{default_agents, round3, RiskAgent};
use crate::domain::models::{AgentAnalysis, AnalysisResult, RegulationMapping};

pub struct RiskConsolidator {
    agents: Vec<Box<dyn RiskAgent>>,
}

impl Default for RiskConsolidator {
    fn default() -> Self {
        Self::new(default_agents())
    }
}

impl RiskConsolidator {
    pub fn new(agents: Vec<Box<dyn RiskAgent>>) -> Self {
        Self { agents }
    }

    pub fn agent_names(&self) -> Vec<&'static str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    /// Every agent sees the same mapping list; the overall score is their
    /// unweighted mean rounded to 3 decimals.
    pub fn consolidate(&self, document_id: &str, mappings: &[RegulationMapping]) -> AnalysisResult {
        let agent_analyses: Vec<AgentAnalysis> = self
            .agents
            .iter()
            .map(|agent| {
                let analysis = agent.analyze(mappings);
                debug!(
                    agent = agent.name(),
                    risk_score = analysis.risk_score,
                    risk_level = %analysis.risk_level,
                    gaps = analysis.gaps.len(),
                    "Agent analysis complete"
                );
                analysis
            })
            .collect();

        AnalysisResult {
            analysis_id: ids::analysis_id(),
            document_id: document_id.to_string(),
            overall_risk_score: overall_risk_score(&agent_analyses),
            agent_count: agent_analyses.len(),
            agent_analyses,
            analysis_type: AnalysisResult::FULL_COMPLIANCE.to_string(),
            created_at: Utc::now(),
        }
    }
}

/// Mean agent score rounded to 3 decimals; 0 with no agents.
pub fn overall_risk_score(analyses: &[AgentAnalysis]) -> f64 {
    if analyses.is_empty() {
        return 0.0;
    }
    round3(analyses.iter().map(|a| a.risk_score).sum::<f64>() / analyses.len() as f64)
}
