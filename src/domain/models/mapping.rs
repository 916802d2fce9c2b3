//! Clause to regulation mapping model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::clause::ComplianceCategory;

/// A regulation known to the regulation index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Regulation {
    pub id: String,
    pub title: String,
    pub text: String,
    pub category: ComplianceCategory,
    #[serde(default)]
    pub jurisdiction: Option<String>,
}

/// One hit returned by the regulation index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationMatch {
    pub id: String,
    pub text: String,
    pub category: ComplianceCategory,
    pub score: f64,
}

/// Link between a clause and a regulation. Unique per `(clause_id, regulation_id)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegulationMapping {
    pub id: String,
    pub document_id: String,
    pub clause_id: String,
    pub regulation_id: String,
    pub similarity_score: f64,
    pub mapping_type: String,
    pub compliance_category: ComplianceCategory,
    pub created_at: DateTime<Utc>,
}

impl RegulationMapping {
    pub const SEMANTIC_SIMILARITY: &'static str = "semantic_similarity";

    pub fn from_match(document_id: &str, clause_id: &str, hit: &RegulationMatch) -> Self {
        Self {
            id: format!("map_{clause_id}_{}", hit.id),
            document_id: document_id.to_string(),
            clause_id: clause_id.to_string(),
            regulation_id: hit.id.clone(),
            similarity_score: hit.score.clamp(0.0, 1.0),
            mapping_type: Self::SEMANTIC_SIMILARITY.to_string(),
            compliance_category: hit.category,
            created_at: Utc::now(),
        }
    }
}

/// Embedding stored for a clause.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClauseEmbedding {
    pub clause_id: String,
    pub model: String,
    pub vector: Vec<f32>,
}
