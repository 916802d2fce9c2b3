//! Clause domain model.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity::Entity;

/// Compliance category assigned to a clause or inherited by a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplianceCategory {
    SafetyCompliance,
    EnvironmentalCompliance,
    OperationalCompliance,
    CommercialTerms,
    LegalProvisions,
    Administrative,
    Unknown,
}

impl Default for ComplianceCategory {
    fn default() -> Self {
        Self::Unknown
    }
}

impl ComplianceCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SafetyCompliance => "safety_compliance",
            Self::EnvironmentalCompliance => "environmental_compliance",
            Self::OperationalCompliance => "operational_compliance",
            Self::CommercialTerms => "commercial_terms",
            Self::LegalProvisions => "legal_provisions",
            Self::Administrative => "administrative",
            Self::Unknown => "unknown",
        }
    }

    /// Parses a category name; anything unrecognized becomes `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "safety_compliance" => Self::SafetyCompliance,
            "environmental_compliance" => Self::EnvironmentalCompliance,
            "operational_compliance" => Self::OperationalCompliance,
            "commercial_terms" => Self::CommercialTerms,
            "legal_provisions" => Self::LegalProvisions,
            "administrative" => Self::Administrative,
            _ => Self::Unknown,
        }
    }

    /// Human label, e.g. `safety compliance`.
    pub fn label(&self) -> String {
        self.as_str().replace('_', " ")
    }
}

impl std::fmt::Display for ComplianceCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fragment produced by a segmentation strategy, before classification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClauseCandidate {
    pub label: String,
    pub section_reference: String,
    pub text: String,
    /// Name of the strategy that produced it
    pub strategy: String,
}

/// Output of the clause classifier for one clause text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub primary_type: ComplianceCategory,
    pub subtype: String,
    pub confidence: f64,
    pub has_mandatory_language: bool,
    pub has_penalties: bool,
    pub complexity_score: f64,
    pub regulatory_references: Vec<String>,
    pub keywords_found: Vec<String>,
    pub classification_scores: BTreeMap<ComplianceCategory, f64>,
    pub word_count: usize,
    pub sentence_count: usize,
    pub reasoning: String,
    /// Position in the batch this result came from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clause_index: Option<usize>,
}

impl ClassificationResult {
    pub fn unknown(reason: impl Into<String>) -> Self {
        Self {
            primary_type: ComplianceCategory::Unknown,
            subtype: String::new(),
            confidence: 0.0,
            has_mandatory_language: false,
            has_penalties: false,
            complexity_score: 0.0,
            regulatory_references: Vec::new(),
            keywords_found: Vec::new(),
            classification_scores: BTreeMap::new(),
            word_count: 0,
            sentence_count: 0,
            reasoning: reason.into(),
            clause_index: None,
        }
    }
}

/// A classified clause belonging to exactly one document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clause {
    /// `{document_id}_clause_{index:03}`
    pub id: String,
    pub document_id: String,
    pub clause_index: usize,
    pub clause_number: String,
    pub section_reference: String,
    pub text: String,
    pub word_count: usize,
    pub sentence_count: usize,
    pub category: ComplianceCategory,
    pub subtype: String,
    pub confidence: f64,
    pub complexity_score: f64,
    pub has_mandatory_language: bool,
    pub has_penalties: bool,
    pub regulatory_references: Vec<String>,
    pub entities: Vec<Entity>,
    pub page_numbers: Vec<u32>,
    pub extraction_method: String,
    pub created_at: DateTime<Utc>,
}

impl Clause {
    pub fn clause_id(document_id: &str, index: usize) -> String {
        format!("{document_id}_clause_{index:03}")
    }

    /// Assembles a clause from its candidate fragment and classification.
    pub fn from_parts(
        document_id: &str,
        clause_index: usize,
        candidate: &ClauseCandidate,
        classification: ClassificationResult,
        entities: Vec<Entity>,
        page_numbers: Vec<u32>,
    ) -> Self {
        Self {
            id: Self::clause_id(document_id, clause_index),
            document_id: document_id.to_string(),
            clause_index,
            clause_number: candidate.label.clone(),
            section_reference: candidate.section_reference.clone(),
            text: candidate.text.clone(),
            word_count: classification.word_count,
            sentence_count: classification.sentence_count,
            category: classification.primary_type,
            subtype: classification.subtype,
            confidence: classification.confidence,
            complexity_score: classification.complexity_score,
            has_mandatory_language: classification.has_mandatory_language,
            has_penalties: classification.has_penalties,
            regulatory_references: classification.regulatory_references,
            entities,
            page_numbers,
            extraction_method: candidate.strategy.clone(),
            created_at: Utc::now(),
        }
    }
}

/// Distribution summary over a batch of classifications.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationStatistics {
    pub total_clauses: usize,
    pub type_distribution: BTreeMap<ComplianceCategory, usize>,
    pub average_confidence: f64,
    pub high_confidence_count: usize,
    pub high_confidence_percentage: f64,
}
