//! Rule-based risk agents.
//!
//! Each agent reads the same list of a document's regulation mappings and
//! produces an independent [`AgentAnalysis`].

use crate::domain::models::{AgentAnalysis, ComplianceCategory, ComplianceGap, RegulationMapping, RiskLevel};

pub trait RiskAgent: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyze(&self, mappings: &[RegulationMapping]) -> AgentAnalysis;
}

/// Gap rule shared by the category-filtered agents.
struct CategoryGapRule {
    category: ComplianceCategory,
    similarity_floor: f64,
    gap_type: &'static str,
    severity: RiskLevel,
    recommendation: &'static str,
    minimum_score: f64,
}

struct CategoryOutcome {
    risk_score: f64,
    gaps: Vec<ComplianceGap>,
    analyzed: usize,
}

impl CategoryGapRule {
    fn evaluate(&self, mappings: &[RegulationMapping]) -> CategoryOutcome {
        let filtered: Vec<&RegulationMapping> = mappings
            .iter()
            .filter(|m| m.compliance_category == self.category)
            .collect();

        let gaps: Vec<ComplianceGap> = filtered
            .iter()
            .filter(|m| m.similarity_score < self.similarity_floor)
            .map(|m| ComplianceGap {
                clause_id: Some(m.clause_id.clone()),
                gap_type: self.gap_type.to_string(),
                severity: self.severity,
                recommendation: self.recommendation.to_string(),
            })
            .collect();

        let gap_ratio = gaps.len() as f64 / filtered.len().max(1) as f64;
        CategoryOutcome {
            risk_score: (1.0 - gap_ratio).max(self.minimum_score),
            gaps,
            analyzed: filtered.len(),
        }
    }
}

const SAFETY_RULE: CategoryGapRule = CategoryGapRule {
    category: ComplianceCategory::SafetyCompliance,
    similarity_floor: 0.8,
    gap_type: "low_similarity",
    severity: RiskLevel::Medium,
    recommendation: "Review safety requirements alignment",
    minimum_score: 0.3,
};

const ENVIRONMENTAL_RULE: CategoryGapRule = CategoryGapRule {
    category: ComplianceCategory::EnvironmentalCompliance,
    similarity_floor: 0.75,
    gap_type: "environmental_alignment",
    severity: RiskLevel::High,
    recommendation: "Strengthen environmental compliance requirements",
    minimum_score: 0.2,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct SafetyAgent;

impl RiskAgent for SafetyAgent {
    fn name(&self) -> &'static str {
        "safety"
    }

    fn analyze(&self, mappings: &[RegulationMapping]) -> AgentAnalysis {
        let outcome = SAFETY_RULE.evaluate(mappings);
        let risk_level = if outcome.risk_score < 0.6 {
            RiskLevel::High
        } else if outcome.risk_score < 0.8 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        AgentAnalysis {
            agent: self.name().to_string(),
            risk_score: outcome.risk_score,
            risk_level,
            recommendations: vec![format!("Address {} safety compliance gaps", outcome.gaps.len())],
            gaps: outcome.gaps,
            risk_factors: Vec::new(),
            mappings_analyzed: outcome.analyzed,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EnvironmentalAgent;

impl RiskAgent for EnvironmentalAgent {
    fn name(&self) -> &'static str {
        "environmental"
    }

    fn analyze(&self, mappings: &[RegulationMapping]) -> AgentAnalysis {
        let outcome = ENVIRONMENTAL_RULE.evaluate(mappings);
        let risk_level = if outcome.risk_score < 0.5 {
            RiskLevel::Critical
        } else if outcome.risk_score < 0.7 {
            RiskLevel::High
        } else {
            RiskLevel::Medium
        };

        AgentAnalysis {
            agent: self.name().to_string(),
            risk_score: outcome.risk_score,
            risk_level,
            recommendations: vec![format!("Address {} environmental compliance gaps", outcome.gaps.len())],
            gaps: outcome.gaps,
            risk_factors: Vec::new(),
            mappings_analyzed: outcome.analyzed,
        }
    }
}

/// Category-agnostic agent driven by the share of weak mappings.
#[derive(Debug, Default, Clone, Copy)]
pub struct RiskAssessmentAgent;

const LOW_SIMILARITY: f64 = 0.7;
const BASE_RISK: f64 = 0.2;

impl RiskAgent for RiskAssessmentAgent {
    fn name(&self) -> &'static str {
        "risk"
    }

    fn analyze(&self, mappings: &[RegulationMapping]) -> AgentAnalysis {
        if mappings.is_empty() {
            let recommendation = "Immediate compliance review required".to_string();
            return AgentAnalysis {
                agent: self.name().to_string(),
                risk_score: 1.0,
                risk_level: RiskLevel::Critical,
                gaps: vec![ComplianceGap {
                    clause_id: None,
                    gap_type: "no_mappings".to_string(),
                    severity: RiskLevel::Critical,
                    recommendation: recommendation.clone(),
                }],
                recommendations: vec![recommendation],
                risk_factors: vec!["No compliance mappings found".to_string()],
                mappings_analyzed: 0,
            };
        }

        let low_similarity = mappings.iter().filter(|m| m.similarity_score < LOW_SIMILARITY).count();
        let ratio = low_similarity as f64 / mappings.len() as f64;
        let overall = round3((ratio + BASE_RISK).min(1.0));

        let risk_level = if overall > 0.8 {
            RiskLevel::Critical
        } else if overall > 0.6 {
            RiskLevel::High
        } else if overall > 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        };

        let recommendation = if overall > 0.6 {
            "Comprehensive compliance review recommended"
        } else {
            "Monitor compliance status"
        };

        AgentAnalysis {
            agent: self.name().to_string(),
            risk_score: overall,
            risk_level,
            gaps: Vec::new(),
            recommendations: vec![recommendation.to_string()],
            risk_factors: vec![format!("{low_similarity} mappings with low similarity")],
            mappings_analyzed: mappings.len(),
        }
    }
}

/// Safety, environmental and generic risk, in reporting order.
pub fn default_agents() -> Vec<Box<dyn RiskAgent>> {
    vec![Box::new(SafetyAgent), Box::new(EnvironmentalAgent), Box::new(RiskAssessmentAgent)]
}

pub(crate) fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn mapping(clause: &str, category: ComplianceCategory, score: f64) -> RegulationMapping {
        RegulationMapping {
            id: format!("map_{clause}_reg"),
            document_id: "doc_1".into(),
            clause_id: clause.into(),
            regulation_id: "reg".into(),
            similarity_score: score,
            mapping_type: RegulationMapping::SEMANTIC_SIMILARITY.into(),
            compliance_category: category,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_safety_agent_counts_low_similarity_gaps() {
        let mappings = vec![
            mapping("c1", ComplianceCategory::SafetyCompliance, 0.95),
            mapping("c2", ComplianceCategory::SafetyCompliance, 0.79),
            mapping("c3", ComplianceCategory::SafetyCompliance, 0.85),
            mapping("c4", ComplianceCategory::SafetyCompliance, 0.90),
            mapping("c5", ComplianceCategory::EnvironmentalCompliance, 0.10),
        ];

        let analysis = SafetyAgent.analyze(&mappings);
        assert_eq!(analysis.mappings_analyzed, 4);
        assert_eq!(analysis.gaps.len(), 1);
        assert_eq!(analysis.gaps[0].clause_id.as_deref(), Some("c2"));
        assert_eq!(analysis.gaps[0].gap_type, "low_similarity");
        assert_eq!(analysis.gaps[0].severity, RiskLevel::Medium);
        assert!((analysis.risk_score - 0.75).abs() < 1e-9);
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.recommendations, vec!["Address 1 safety compliance gaps"]);
    }

    #[test]
    fn test_safety_agent_score_floor() {
        let mappings = vec![mapping("c1", ComplianceCategory::SafetyCompliance, 0.1)];
        let analysis = SafetyAgent.analyze(&mappings);
        assert!((analysis.risk_score - 0.3).abs() < 1e-9);
        assert_eq!(analysis.risk_level, RiskLevel::High);
    }

    #[test]
    fn test_safety_agent_without_safety_mappings_is_low() {
        let analysis = SafetyAgent.analyze(&[]);
        assert!((analysis.risk_score - 1.0).abs() < 1e-9);
        assert_eq!(analysis.risk_level, RiskLevel::Low);
        assert_eq!(analysis.mappings_analyzed, 0);
    }

    #[test]
    fn test_environmental_agent_levels() {
        let all_gaps = vec![
            mapping("c1", ComplianceCategory::EnvironmentalCompliance, 0.5),
            mapping("c2", ComplianceCategory::EnvironmentalCompliance, 0.74),
        ];
        let analysis = EnvironmentalAgent.analyze(&all_gaps);
        assert!((analysis.risk_score - 0.2).abs() < 1e-9);
        assert_eq!(analysis.risk_level, RiskLevel::Critical);
        assert_eq!(analysis.gaps[0].severity, RiskLevel::High);
        assert_eq!(analysis.gaps[0].gap_type, "environmental_alignment");

        let one_in_three = vec![
            mapping("c1", ComplianceCategory::EnvironmentalCompliance, 0.5),
            mapping("c2", ComplianceCategory::EnvironmentalCompliance, 0.8),
            mapping("c3", ComplianceCategory::EnvironmentalCompliance, 0.9),
        ];
        assert_eq!(EnvironmentalAgent.analyze(&one_in_three).risk_level, RiskLevel::High);

        let one_in_four = vec![
            mapping("c1", ComplianceCategory::EnvironmentalCompliance, 0.5),
            mapping("c2", ComplianceCategory::EnvironmentalCompliance, 0.8),
            mapping("c3", ComplianceCategory::EnvironmentalCompliance, 0.9),
            mapping("c4", ComplianceCategory::EnvironmentalCompliance, 0.95),
        ];
        assert_eq!(EnvironmentalAgent.analyze(&one_in_four).risk_level, RiskLevel::Medium);

        let clean = vec![mapping("c1", ComplianceCategory::EnvironmentalCompliance, 0.9)];
        assert_eq!(EnvironmentalAgent.analyze(&clean).risk_level, RiskLevel::Medium);
    }

    #[test]
    fn test_risk_agent_with_no_mappings_is_critical() {
        let analysis = RiskAssessmentAgent.analyze(&[]);
        assert!((analysis.risk_score - 1.0).abs() < 1e-9);
        assert_eq!(analysis.risk_level, RiskLevel::Critical);
        assert_eq!(analysis.gaps.len(), 1);
        assert_eq!(analysis.gaps[0].gap_type, "no_mappings");
        assert_eq!(analysis.risk_factors, vec!["No compliance mappings found"]);
    }

    #[test]
    fn test_risk_agent_ratio() {
        let mappings = vec![
            mapping("c1", ComplianceCategory::SafetyCompliance, 0.6),
            mapping("c2", ComplianceCategory::CommercialTerms, 0.9),
            mapping("c3", ComplianceCategory::LegalProvisions, 0.95),
        ];

        let analysis = RiskAssessmentAgent.analyze(&mappings);
        assert!((analysis.risk_score - 0.533).abs() < 1e-9);
        assert_eq!(analysis.risk_level, RiskLevel::Medium);
        assert_eq!(analysis.recommendations, vec!["Monitor compliance status"]);
        assert_eq!(analysis.risk_factors, vec!["1 mappings with low similarity"]);
        assert_eq!(analysis.mappings_analyzed, 3);
    }

    #[test]
    fn test_risk_agent_high_ratio_recommends_review() {
        let mappings = vec![
            mapping("c1", ComplianceCategory::SafetyCompliance, 0.1),
            mapping("c2", ComplianceCategory::SafetyCompliance, 0.2),
        ];

        let analysis = RiskAssessmentAgent.analyze(&mappings);
        assert!((analysis.risk_score - 1.0).abs() < 1e-9);
        assert_eq!(analysis.risk_level, RiskLevel::Critical);
        assert_eq!(analysis.recommendations, vec!["Comprehensive compliance review recommended"]);
    }

    #[test]
    fn test_default_agent_order() {
        let names: Vec<_> = default_agents().iter().map(|a| a.name()).collect();
        assert_eq!(names, vec!["safety", "environmental", "risk"]);
    }
}
