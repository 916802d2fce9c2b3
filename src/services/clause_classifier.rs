//! Rule-based clause classification.
//!
//! Scores a clause against every category in
//! [`CATEGORY_RULES`](super::classification_rules::CATEGORY_RULES):
//! `raw = keyword hits + 2 * regex hits`, weighted by the category weight and
//! normalized per 50 words. The best category wins if it reaches 0.1.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::warn;

use super::classification_rules::{
    category_rule, CategoryRule, CATEGORY_RULES, MANDATORY_INDICATORS, PENALTY_INDICATORS, REFERENCE_PATTERNS,
};
use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ClassificationResult, ClassificationStatistics, ComplianceCategory};

const MIN_PRIMARY_SCORE: f64 = 0.1;
const WORDS_PER_SCORE_UNIT: f64 = 50.0;
const HIGH_CONFIDENCE: f64 = 0.7;
/// Longest clause text accepted for classification, in characters.
pub const MAX_CLAUSE_CHARS: usize = 50_000;

static NON_CONTENT_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^\w\s.,;:!?\-()]").expect("non-content pattern should compile"));
static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("whitespace pattern should compile"));

struct CompiledRule {
    rule: &'static CategoryRule,
    patterns: Vec<Regex>,
}

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("classification pattern should compile")
}

static COMPILED_RULES: LazyLock<Vec<CompiledRule>> = LazyLock::new(|| {
    CATEGORY_RULES
        .iter()
        .map(|rule| CompiledRule {
            rule,
            patterns: rule.patterns.iter().map(|p| case_insensitive(p)).collect(),
        })
        .collect()
});

static REFERENCE_REGEXES: LazyLock<Vec<Regex>> =
    LazyLock::new(|| REFERENCE_PATTERNS.iter().map(|p| case_insensitive(p)).collect());

/// Per-category score breakdown.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoryScore {
    pub raw: f64,
    pub weighted: f64,
    pub normalized: f64,
    pub keywords_found: usize,
}

/// Lowercase, collapse whitespace and blank out non-content punctuation.
pub fn preprocess(text: &str) -> String {
    let lowered = text.to_lowercase();
    let collapsed = WHITESPACE_RUN.replace_all(&lowered, " ");
    NON_CONTENT_CHARS.replace_all(&collapsed, " ").trim().to_string()
}

/// Scores one preprocessed text against one rule.
pub fn score_category(rule: &CategoryRule, patterns: &[Regex], text: &str) -> CategoryScore {
    let keywords_found = rule.keywords.iter().filter(|k| text.contains(*k)).count();
    let regex_hits = patterns.iter().filter(|p| p.is_match(text)).count();

    let raw = keywords_found as f64 + 2.0 * regex_hits as f64;
    let weighted = raw * rule.weight;
    let word_count = text.split_whitespace().count() as f64;
    let normalized = (weighted / (word_count / WORDS_PER_SCORE_UNIT).max(1.0)).min(1.0);

    CategoryScore { raw, weighted, normalized, keywords_found }
}

/// `0.4*min(1, avg sentence len/25) + 0.3*min(1, avg word len/8) + 0.3*(share of words > 6 chars)`
pub fn complexity_score(text: &str) -> f64 {
    let words: Vec<&str> = text.split_whitespace().collect();
    let sentences = text.split('.').filter(|s| !s.trim().is_empty()).count();
    if words.is_empty() || sentences == 0 {
        return 0.0;
    }

    let word_total = words.len() as f64;
    let avg_sentence_len = word_total / sentences as f64;
    let avg_word_len = words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / word_total;
    let complex_ratio = words.iter().filter(|w| w.chars().count() > 6).count() as f64 / word_total;

    round3(
        (avg_sentence_len / 25.0).min(1.0) * 0.4 + (avg_word_len / 8.0).min(1.0) * 0.3 + complex_ratio * 0.3,
    )
}

/// Deduplicated citation strings found in preprocessed text.
pub fn regulatory_references(text: &str) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut references = Vec::new();
    for regex in REFERENCE_REGEXES.iter() {
        for caps in regex.captures_iter(text) {
            if let Some(m) = caps.get(1) {
                let reference = m.as_str().trim().to_string();
                if !reference.is_empty() && seen.insert(reference.clone()) {
                    references.push(reference);
                }
            }
        }
    }
    references
}

fn indicators_in<'a>(indicators: &'a [&'a str], text: &str) -> Vec<&'a str> {
    indicators.iter().copied().filter(|i| text.contains(i)).collect()
}

/// Rule-based clause classifier.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClauseClassifier;

impl ClauseClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify one clause. Empty text yields `unknown`; oversized text is a
    /// per-clause degradation error.
    pub fn classify(&self, clause_text: &str) -> DomainResult<ClassificationResult> {
        if clause_text.trim().is_empty() {
            return Ok(ClassificationResult::unknown("Empty clause text"));
        }
        let length = clause_text.chars().count();
        if length > MAX_CLAUSE_CHARS {
            return Err(DomainError::ClassificationDegradation(format!(
                "clause text too long to classify ({length} characters)"
            )));
        }

        let text = preprocess(clause_text);
        let scores: Vec<(ComplianceCategory, CategoryScore)> = COMPILED_RULES
            .iter()
            .map(|c| (c.rule.category, score_category(c.rule, &c.patterns, &text)))
            .collect();

        let (primary_type, confidence) = primary_classification(&scores);
        let subtype = determine_subtype(primary_type, &text);

        let mandatory = indicators_in(MANDATORY_INDICATORS, &text);
        let penalties = indicators_in(PENALTY_INDICATORS, &text);
        let keywords_found: BTreeSet<String> =
            mandatory.iter().chain(penalties.iter()).map(|s| (*s).to_string()).collect();

        Ok(ClassificationResult {
            primary_type,
            subtype,
            confidence: round3(confidence),
            has_mandatory_language: !mandatory.is_empty(),
            has_penalties: !penalties.is_empty(),
            complexity_score: complexity_score(&text),
            regulatory_references: regulatory_references(&text),
            keywords_found: keywords_found.into_iter().collect(),
            reasoning: reasoning(primary_type, &scores),
            classification_scores: scores.iter().map(|(c, s)| (*c, s.normalized)).collect(),
            word_count: clause_text.split_whitespace().count(),
            sentence_count: clause_text.split('.').filter(|s| !s.trim().is_empty()).count(),
            clause_index: None,
        })
    }

    /// Classify clauses independently, preserving order. A failing clause
    /// degrades to `unknown` without aborting the batch.
    pub fn classify_batch<S: AsRef<str>>(&self, clauses: &[S]) -> Vec<ClassificationResult> {
        clauses
            .iter()
            .enumerate()
            .map(|(index, text)| {
                let mut result = self.classify(text.as_ref()).unwrap_or_else(|err| {
                    warn!(clause_index = index, error = %err, "clause classification degraded to unknown");
                    ClassificationResult::unknown(format!("Batch classification error: {err}"))
                });
                result.clause_index = Some(index);
                result
            })
            .collect()
    }
}

fn primary_classification(scores: &[(ComplianceCategory, CategoryScore)]) -> (ComplianceCategory, f64) {
    let mut best = (ComplianceCategory::Unknown, 0.0);
    for (category, score) in scores {
        if score.normalized > best.1 {
            best = (*category, score.normalized);
        }
    }
    if best.1 < MIN_PRIMARY_SCORE {
        return (ComplianceCategory::Unknown, 0.0);
    }
    best
}

fn determine_subtype(primary_type: ComplianceCategory, text: &str) -> String {
    let Some(rule) = category_rule(primary_type) else {
        return String::new();
    };

    let mut best = ("", 0usize);
    for subtype in rule.subtypes {
        let hits = subtype.keywords.iter().filter(|k| text.contains(*k)).count();
        if hits > best.1 {
            best = (subtype.name, hits);
        }
    }
    best.0.to_string()
}

fn reasoning(primary_type: ComplianceCategory, scores: &[(ComplianceCategory, CategoryScore)]) -> String {
    if primary_type == ComplianceCategory::Unknown {
        return "Could not determine clause type with sufficient confidence".to_string();
    }

    let mut parts = vec![format!("Classified as '{}'", primary_type.label())];

    let keywords = scores.iter().find(|(c, _)| *c == primary_type).map_or(0, |(_, s)| s.keywords_found);
    if keywords > 0 {
        parts.push(format!("based on {keywords} relevant keywords"));
    }

    let mut competitors: Vec<&(ComplianceCategory, CategoryScore)> =
        scores.iter().filter(|(c, _)| *c != primary_type).collect();
    competitors.sort_by(|a, b| b.1.normalized.total_cmp(&a.1.normalized));
    if let Some((competitor, score)) = competitors.first() {
        if score.normalized > MIN_PRIMARY_SCORE {
            parts.push(format!("with some similarity to '{}'", competitor.label()));
        }
    }

    parts.join("; ")
}

/// Type distribution and confidence summary for a batch.
pub fn classification_statistics(results: &[ClassificationResult]) -> Option<ClassificationStatistics> {
    if results.is_empty() {
        return None;
    }

    let mut type_distribution = BTreeMap::new();
    for result in results {
        *type_distribution.entry(result.primary_type).or_insert(0) += 1;
    }
    let total = results.len();
    let average = results.iter().map(|r| r.confidence).sum::<f64>() / total as f64;
    let high = results.iter().filter(|r| r.confidence >= HIGH_CONFIDENCE).count();

    Some(ClassificationStatistics {
        total_clauses: total,
        type_distribution,
        average_confidence: round3(average),
        high_confidence_count: high,
        high_confidence_percentage: (high as f64 / total as f64 * 1000.0).round() / 10.0,
    })
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
