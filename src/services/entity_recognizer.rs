//! Entity extraction for clause text.
//!
//! An [`EntityRecognizer`] runs an ordered list of [`EntityExtractor`]s over a
//! single clause, then merges overlapping spans (higher confidence wins) and
//! drops entities that fail validation. Offsets are clause-local char offsets.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::{Regex, RegexBuilder};
use tracing::debug;

use super::entity_patterns::{
    ENTITY_PATTERNS, FEDERAL_MARKERS, JURISDICTION_ABBREVIATIONS, JURISDICTION_CODES, MINING_ACT_PATTERNS,
};
use crate::domain::models::{Entity, EntityStatistics, EntityType};

pub const PATTERN_METHOD: &str = "pattern_matching";
pub const SPECIALIZED_METHOD: &str = "specialized_pattern";

const BASE_CONFIDENCE: f64 = 0.8;
const ACT_CONFIDENCE: f64 = 0.9;
const CONTEXT_RADIUS: usize = 50;
const ACT_CONTEXT_RADIUS: usize = 100;
const MIN_VALUE_CHARS: usize = 2;
const MIN_CONFIDENCE: f64 = 0.3;
const HIGH_CONFIDENCE: f64 = 0.8;

/// A source of typed entities for one clause.
pub trait EntityExtractor: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, text: &str) -> Vec<Entity>;
}

fn case_insensitive(pattern: &str) -> Regex {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .expect("entity pattern should compile")
}

struct CompiledPatternSet {
    entity_type: EntityType,
    patterns: Vec<(&'static str, Regex)>,
}

static PATTERN_LIBRARY: LazyLock<Vec<CompiledPatternSet>> = LazyLock::new(|| {
    ENTITY_PATTERNS
        .iter()
        .map(|set| CompiledPatternSet {
            entity_type: set.entity_type,
            patterns: set.patterns.iter().map(|p| (*p, case_insensitive(p))).collect(),
        })
        .collect()
});

static MINING_ACTS: LazyLock<Vec<Regex>> =
    LazyLock::new(|| MINING_ACT_PATTERNS.iter().map(|p| case_insensitive(p)).collect());

/// Runs the fixed typed pattern library.
#[derive(Debug, Default, Clone, Copy)]
pub struct PatternEntityExtractor;

impl EntityExtractor for PatternEntityExtractor {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn extract(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();

        for set in PATTERN_LIBRARY.iter() {
            for (pattern, regex) in &set.patterns {
                for captures in regex.captures_iter(text) {
                    let Some(found) = captures.get(1) else {
                        continue;
                    };
                    let value = found.as_str().trim();
                    if value.is_empty() {
                        continue;
                    }

                    let mut metadata = BTreeMap::new();
                    metadata.insert("pattern".to_string(), (*pattern).to_string());

                    let (start, end) = char_span(text, found.start(), found.end());
                    entities.push(Entity {
                        entity_type: set.entity_type,
                        value: value.to_string(),
                        normalized_value: normalize_value(set.entity_type, value),
                        confidence: pattern_confidence(set.entity_type, value),
                        start,
                        end,
                        context: context_window(text, start, end, CONTEXT_RADIUS),
                        extraction_method: PATTERN_METHOD.to_string(),
                        metadata,
                    });
                }
            }
        }

        entities
    }
}

/// High-confidence matcher for mining-specific Act names.
#[derive(Debug, Default, Clone, Copy)]
pub struct RegulationActExtractor;

impl EntityExtractor for RegulationActExtractor {
    fn name(&self) -> &'static str {
        "mining_acts"
    }

    fn extract(&self, text: &str) -> Vec<Entity> {
        let mut entities = Vec::new();

        for regex in MINING_ACTS.iter() {
            for captures in regex.captures_iter(text) {
                let Some(found) = captures.get(1) else {
                    continue;
                };
                let value = found.as_str();

                let mut metadata = BTreeMap::new();
                metadata.insert("regulation_category".to_string(), "mining_specific".to_string());
                metadata.insert("jurisdiction".to_string(), infer_jurisdiction(value).to_string());

                let (start, end) = char_span(text, found.start(), found.end());
                entities.push(Entity {
                    entity_type: EntityType::RegulationReference,
                    value: value.to_string(),
                    normalized_value: title_case(&collapse_whitespace(value)),
                    confidence: ACT_CONFIDENCE,
                    start,
                    end,
                    context: context_window(text, start, end, ACT_CONTEXT_RADIUS),
                    extraction_method: SPECIALIZED_METHOD.to_string(),
                    metadata,
                });
            }
        }

        entities
    }
}

/// `federal` for Commonwealth/EPBC legislation, otherwise `state`.
pub fn infer_jurisdiction(act_name: &str) -> &'static str {
    let lowered = collapse_whitespace(&act_name.to_lowercase());
    if FEDERAL_MARKERS.iter().any(|marker| lowered.contains(marker)) {
        "federal"
    } else {
        "state"
    }
}

/// Composes extractors and applies the shared normalize/merge/validate steps.
pub struct EntityRecognizer {
    extractors: Vec<Box<dyn EntityExtractor>>,
}

impl Default for EntityRecognizer {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityRecognizer {
    pub fn new() -> Self {
        Self {
            extractors: vec![Box::new(PatternEntityExtractor), Box::new(RegulationActExtractor)],
        }
    }

    /// Appends an enrichment extractor after the built-in ones.
    #[must_use]
    pub fn with_extractor(mut self, extractor: Box<dyn EntityExtractor>) -> Self {
        self.extractors.push(extractor);
        self
    }

    pub fn extractor_names(&self) -> Vec<&'static str> {
        self.extractors.iter().map(|e| e.name()).collect()
    }

    pub fn recognize(&self, text: &str) -> Vec<Entity> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let mut entities = Vec::new();
        for extractor in &self.extractors {
            let found = extractor.extract(text);
            debug!(extractor = extractor.name(), count = found.len(), "Extracted raw entities");
            entities.extend(found);
        }

        for entity in &mut entities {
            if entity.normalized_value.is_empty() {
                entity.normalized_value = normalize_value(entity.entity_type, &entity.value);
            }
        }

        validate_entities(merge_entities(entities), text)
    }
}

/// Base 0.8, adjusted by type specificity and value length, clamped to [0.1, 1].
pub fn pattern_confidence(entity_type: EntityType, value: &str) -> f64 {
    let adjustment = match entity_type {
        EntityType::RegulationReference | EntityType::StandardReference => 0.1,
        EntityType::Monetary | EntityType::Percentage => 0.05,
        EntityType::Organization | EntityType::Location => -0.1,
        _ => 0.0,
    };

    let mut confidence = BASE_CONFIDENCE + adjustment;
    let length = value.chars().count();
    if length < 3 {
        confidence -= 0.2;
    } else if length > 100 {
        confidence -= 0.1;
    }

    round3(confidence.clamp(0.1, 1.0))
}

pub fn normalize_value(entity_type: EntityType, value: &str) -> String {
    let trimmed = value.trim();
    match entity_type {
        EntityType::Location => normalize_jurisdiction(trimmed).unwrap_or_else(|| trimmed.to_string()),
        EntityType::RegulationReference => title_case(&collapse_whitespace(trimmed)),
        EntityType::StandardReference => trimmed.to_uppercase(),
        EntityType::Monetary => trimmed
            .chars()
            .filter(|c| c.is_ascii_digit() || matches!(c, '.' | '$' | ','))
            .collect(),
        EntityType::Percentage => trimmed.chars().filter(|c| !c.is_whitespace()).collect(),
        EntityType::Date => collapse_whitespace(trimmed),
        _ => trimmed.to_string(),
    }
}

fn normalize_jurisdiction(value: &str) -> Option<String> {
    let lowered = value.to_lowercase();
    if let Some((_, code)) = JURISDICTION_ABBREVIATIONS.iter().find(|(name, _)| *name == lowered) {
        return Some((*code).to_string());
    }
    JURISDICTION_CODES
        .contains(&lowered.as_str())
        .then(|| value.to_uppercase())
}

/// Sorts by start offset and keeps the higher-confidence entity of each
/// overlapping pair. Ties keep the earlier entity.
pub fn merge_entities(mut entities: Vec<Entity>) -> Vec<Entity> {
    entities.sort_by_key(|e| e.start);

    let mut iter = entities.into_iter();
    let Some(mut current) = iter.next() else {
        return Vec::new();
    };

    let mut merged = Vec::new();
    for next in iter {
        if current.overlaps(&next) {
            if next.confidence > current.confidence {
                current = next;
            }
        } else {
            merged.push(std::mem::replace(&mut current, next));
        }
    }
    merged.push(current);

    merged
}

pub fn validate_entities(entities: Vec<Entity>, text: &str) -> Vec<Entity> {
    entities.into_iter().filter(|e| is_valid(e, text)).collect()
}

fn is_valid(entity: &Entity, text: &str) -> bool {
    if entity.value.trim().chars().count() < MIN_VALUE_CHARS || entity.confidence < MIN_CONFIDENCE {
        return false;
    }
    if entity.start >= entity.end || entity.end > text.chars().count() {
        return false;
    }
    char_slice(text, entity.start, entity.end)
        .is_some_and(|span| span.to_lowercase().contains(&entity.value.to_lowercase()))
}

pub fn entity_statistics(entities: &[Entity]) -> EntityStatistics {
    let mut by_type = BTreeMap::new();
    let mut by_method = BTreeMap::new();
    for entity in entities {
        *by_type.entry(entity.entity_type).or_insert(0) += 1;
        *by_method.entry(entity.extraction_method.clone()).or_insert(0) += 1;
    }

    let average_confidence = if entities.is_empty() {
        0.0
    } else {
        round3(entities.iter().map(|e| e.confidence).sum::<f64>() / entities.len() as f64)
    };

    EntityStatistics {
        total_entities: entities.len(),
        by_type,
        by_method,
        average_confidence,
        high_confidence_count: entities.iter().filter(|e| e.confidence >= HIGH_CONFIDENCE).count(),
    }
}

/// `radius` chars either side of the span, clipped to the text and trimmed.
fn context_window(text: &str, start: usize, end: usize, radius: usize) -> String {
    let to = (end + radius).min(text.chars().count());
    char_slice(text, start.saturating_sub(radius), to)
        .unwrap_or_default()
        .trim()
        .to_string()
}

/// Converts a byte range from a regex match into char offsets.
fn char_span(text: &str, byte_start: usize, byte_end: usize) -> (usize, usize) {
    let start = text[..byte_start].chars().count();
    (start, start + text[byte_start..byte_end].chars().count())
}

/// Substring between two char offsets; `None` when out of range.
pub fn char_slice(text: &str, start: usize, end: usize) -> Option<&str> {
    if start > end {
        return None;
    }
    let mut boundaries = text.char_indices().map(|(i, _)| i).chain(std::iter::once(text.len()));
    let from = boundaries.nth(start)?;
    let to = if end == start { from } else { boundaries.nth(end - start - 1)? };
    Some(&text[from..to])
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Uppercases the first letter of every alphabetic run, lowercases the rest.
fn title_case(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut in_word = false;
    for c in value.chars() {
        if c.is_alphabetic() {
            if in_word {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
