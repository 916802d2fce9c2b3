//! Clause segmentation.
//!
//! Pattern strategies run in priority order (numbered, lettered, section
//! headers) and their candidates are concatenated. Paragraph splitting is
//! the fallback when no primary strategy finds a marker.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ClauseCandidate, OcrPage};

/// Full text shorter than this cannot be segmented.
pub const MIN_DOCUMENT_CHARS: usize = 100;
const MIN_PARAGRAPH_CHARS: usize = 50;
const PAGE_MATCH_PREFIX_CHARS: usize = 100;

static PAGE_DELIMITER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^--- Page \d+ ---$").expect("page delimiter pattern should compile"));
static NUMBERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|\s)(\d{1,3})\.\s+").expect("numbered marker pattern should compile"));
static LETTERED_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)(?:^|[\s(])([a-z])\)\s+").expect("lettered marker pattern should compile"));
static SECTION_MARKER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:SECTION|Section)\s+(\d+)\b[.:]?\s*").expect("section marker pattern should compile")
});
static BLANK_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("blank line pattern should compile"));

/// One way of cutting document text into clause candidates.
pub trait SegmentationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn segment(&self, text: &str) -> Vec<ClauseCandidate>;
}

/// A marker hit: capture text, where the marker starts and where its body starts.
struct Marker<'a> {
    capture: &'a str,
    start: usize,
    body_start: usize,
}

/// Cuts `text` into `(marker capture, body)` pairs running from each marker
/// to the next one or the end of text.
fn split_on_markers<'a>(pattern: &Regex, text: &'a str) -> Vec<(&'a str, &'a str)> {
    let markers: Vec<Marker<'a>> = pattern
        .captures_iter(text)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            let capture = caps.get(1)?;
            Some(Marker { capture: capture.as_str(), start: capture.start(), body_start: whole.end() })
        })
        .collect();

    markers
        .iter()
        .enumerate()
        .map(|(i, marker)| {
            let end = markers.get(i + 1).map_or(text.len(), |next| next.start);
            let end = end.max(marker.body_start);
            (marker.capture, text[marker.body_start..end].trim())
        })
        .filter(|(_, body)| !body.is_empty())
        .collect()
}

/// `1.` style clauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberedClauseStrategy;

impl SegmentationStrategy for NumberedClauseStrategy {
    fn name(&self) -> &'static str {
        "numbered_clauses"
    }

    fn segment(&self, text: &str) -> Vec<ClauseCandidate> {
        split_on_markers(&NUMBERED_MARKER, text)
            .into_iter()
            .map(|(number, body)| ClauseCandidate {
                label: number.to_string(),
                section_reference: format!("Clause {number}"),
                text: body.to_string(),
                strategy: self.name().to_string(),
            })
            .collect()
    }
}

/// `a)` / `(a)` style clauses.
#[derive(Debug, Clone, Copy, Default)]
pub struct LetteredClauseStrategy;

impl SegmentationStrategy for LetteredClauseStrategy {
    fn name(&self) -> &'static str {
        "lettered_clauses"
    }

    fn segment(&self, text: &str) -> Vec<ClauseCandidate> {
        split_on_markers(&LETTERED_MARKER, text)
            .into_iter()
            .map(|(letter, body)| ClauseCandidate {
                label: format!("{letter})"),
                section_reference: format!("Clause {letter}"),
                text: body.to_string(),
                strategy: self.name().to_string(),
            })
            .collect()
    }
}

/// `SECTION 3` headers at line start.
#[derive(Debug, Clone, Copy, Default)]
pub struct SectionHeaderStrategy;

impl SegmentationStrategy for SectionHeaderStrategy {
    fn name(&self) -> &'static str {
        "section_headers"
    }

    fn segment(&self, text: &str) -> Vec<ClauseCandidate> {
        split_on_markers(&SECTION_MARKER, text)
            .into_iter()
            .enumerate()
            .map(|(i, (_, body))| ClauseCandidate {
                label: format!("S{}", i + 1),
                section_reference: format!("Section {}", i + 1),
                text: body.to_string(),
                strategy: self.name().to_string(),
            })
            .collect()
    }
}

/// Blank-line separated paragraphs longer than 50 characters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ParagraphStrategy;

impl SegmentationStrategy for ParagraphStrategy {
    fn name(&self) -> &'static str {
        "paragraph_split"
    }

    fn segment(&self, text: &str) -> Vec<ClauseCandidate> {
        BLANK_LINE
            .split(text)
            .map(str::trim)
            .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
            .enumerate()
            .map(|(i, paragraph)| ClauseCandidate {
                label: format!("P{}", i + 1),
                section_reference: format!("Paragraph {}", i + 1),
                text: paragraph.to_string(),
                strategy: self.name().to_string(),
            })
            .collect()
    }
}

/// Ordered chain of primary strategies plus a fallback.
pub struct ClauseSegmenter {
    primary: Vec<Box<dyn SegmentationStrategy>>,
    fallback: Box<dyn SegmentationStrategy>,
    min_clause_length: usize,
}

impl Default for ClauseSegmenter {
    fn default() -> Self {
        Self::new(20)
    }
}

impl ClauseSegmenter {
    pub fn new(min_clause_length: usize) -> Self {
        Self {
            primary: vec![
                Box::new(NumberedClauseStrategy),
                Box::new(LetteredClauseStrategy),
                Box::new(SectionHeaderStrategy),
            ],
            fallback: Box::new(ParagraphStrategy),
            min_clause_length,
        }
    }

    /// Replace the primary chain, keeping the paragraph fallback.
    pub fn with_strategies(mut self, primary: Vec<Box<dyn SegmentationStrategy>>) -> Self {
        self.primary = primary;
        self
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.primary.iter().map(|s| s.name()).chain(std::iter::once(self.fallback.name())).collect()
    }

    pub fn segment(&self, full_text: &str) -> DomainResult<Vec<ClauseCandidate>> {
        let text = PAGE_DELIMITER.replace_all(full_text, "");
        let text = text.trim();
        if text.chars().count() < MIN_DOCUMENT_CHARS {
            return Err(DomainError::Validation(format!(
                "insufficient text for clause extraction ({} characters)",
                text.chars().count()
            )));
        }

        let mut candidates: Vec<ClauseCandidate> = Vec::new();
        for strategy in &self.primary {
            let found = strategy.segment(text);
            debug!(strategy = strategy.name(), candidates = found.len(), "segmentation strategy ran");
            candidates.extend(found);
        }

        if candidates.is_empty() {
            candidates = self.fallback.segment(text);
            debug!(strategy = self.fallback.name(), candidates = candidates.len(), "fell back to paragraph split");
        }

        let before = candidates.len();
        candidates.retain(|c| c.text.trim().chars().count() >= self.min_clause_length);
        if candidates.len() < before {
            debug!(dropped = before - candidates.len(), "dropped short clause candidates");
        }

        Ok(candidates)
    }
}

/// Pages whose text contains the clause's opening characters; `[1]` when none match.
pub fn find_clause_pages(clause_text: &str, pages: &[OcrPage]) -> Vec<u32> {
    let prefix: String = clause_text.chars().take(PAGE_MATCH_PREFIX_CHARS).collect();
    let found: Vec<u32> = pages
        .iter()
        .filter(|p| !prefix.is_empty() && p.text.contains(prefix.as_str()))
        .map(|p| p.page_number)
        .collect();
    if found.is_empty() {
        vec![1]
    } else {
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NUMBERED: &str = "1. The Contractor shall implement a safety management system in accordance with AS 4801.\n\
        2. The Contractor must pay all invoices within 30 days of receipt of a valid tax invoice.\n\
        3. This agreement is governed by the laws of Queensland.";

    #[test]
    fn test_numbered_clauses() {
        let candidates = NumberedClauseStrategy.segment(NUMBERED);
        assert_eq!(candidates.len(), 3);
        assert_eq!(candidates[0].label, "1");
        assert_eq!(candidates[0].section_reference, "Clause 1");
        assert!(candidates[0].text.starts_with("The Contractor shall"));
        assert!(candidates[0].text.ends_with("AS 4801."));
        assert_eq!(candidates[2].text, "This agreement is governed by the laws of Queensland.");
    }

    #[test]
    fn test_decimal_standard_numbers_are_not_markers() {
        let text = "1. Comply with AS 4801.2 at all times and keep records for the site.";
        let candidates = NumberedClauseStrategy.segment(text);
        assert_eq!(candidates.len(), 1);
        assert!(candidates[0].text.contains("AS 4801.2"));
    }

    #[test]
    fn test_lettered_clauses() {
        let text = "(a) the Contractor shall provide PPE to all workers on site;\n(b) the Principal may audit records.";
        let candidates = LetteredClauseStrategy.segment(text);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].label, "a)");
        assert_eq!(candidates[1].label, "b)");
        assert!(candidates[1].text.starts_with("the Principal"));
    }

    #[test]
    fn test_section_headers() {
        let text = "SECTION 1 Safety\nAll work must follow the safety plan.\nSection 2 Environment\nDust must be controlled.";
        let candidates = SectionHeaderStrategy.segment(text);
        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].label, "S1");
        assert_eq!(candidates[1].section_reference, "Section 2");
        assert!(candidates[1].text.starts_with("Environment"));
    }

    #[test]
    fn test_paragraph_fallback_when_no_markers() {
        let text = "This paragraph describes the obligations of the contractor regarding site safety.\n\n\
            short one\n\n\
            This second paragraph covers environmental obligations including water management.";
        let segmenter = ClauseSegmenter::new(20);
        let candidates = segmenter.segment(text).unwrap();
        assert_eq!(candidates.len(), 2);
        assert!(candidates.iter().all(|c| c.strategy == "paragraph_split"));
        assert_eq!(candidates[0].label, "P1");
        assert_eq!(candidates[1].label, "P2");
    }

    #[test]
    fn test_fallback_not_used_when_primary_matches() {
        let segmenter = ClauseSegmenter::new(20);
        let candidates = segmenter.segment(NUMBERED).unwrap();
        assert!(candidates.iter().all(|c| c.strategy != "paragraph_split"));
        assert_eq!(candidates.iter().filter(|c| c.strategy == "numbered_clauses").count(), 3);
    }

    #[test]
    fn test_short_text_is_rejected() {
        let err = ClauseSegmenter::default().segment("1. Too short.").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn test_short_candidates_dropped() {
        let text = format!("{NUMBERED}\n4. Tiny.");
        let candidates = ClauseSegmenter::new(20).segment(&text).unwrap();
        assert!(candidates.iter().all(|c| c.label != "4"));
    }

    #[test]
    fn test_page_delimiters_are_removed() {
        let text = format!("--- Page 1 ---\n{NUMBERED}\n");
        let candidates = ClauseSegmenter::default().segment(&text).unwrap();
        assert!(candidates.iter().all(|c| !c.text.contains("--- Page")));
    }

    #[test]
    fn test_find_clause_pages() {
        let page = |n: u32, text: &str| OcrPage {
            page_number: n,
            text: text.to_string(),
            word_count: 0,
            line_count: 0,
            confidence: 0.0,
            lines: vec![],
            tables: vec![],
            images: vec![],
        };
        let pages = vec![page(1, "Intro text"), page(2, "The Contractor shall pay promptly.")];
        assert_eq!(find_clause_pages("The Contractor shall pay", &pages), vec![2]);
        assert_eq!(find_clause_pages("Not present anywhere", &pages), vec![1]);
    }
}
