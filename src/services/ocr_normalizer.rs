//! OCR normalization.
//!
//! Converts a recognition block graph into pages of lines and words with
//! aggregated confidence, detects tables and image placeholders, and
//! assesses extraction quality.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::domain::models::{
    Block, BlockGraph, BlockType, DetectedImage, DetectedTable, DocumentStructure, NormalizedDocument,
    OcrLine, OcrPage, OcrWord, QualityAssessment,
};

static COLUMN_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\t|\s{3,}|\|").expect("valid column separator regex"));

/// Vertical gap (fraction of page height) under which table rows are consecutive.
const TABLE_ROW_GAP: f64 = 0.05;
const MIN_TABLE_ROWS: usize = 2;
const IMAGE_PLACEHOLDER_CONFIDENCE: f64 = 0.5;
const MIN_TEXT_CHARS: usize = 100;
const MIN_QUALITY_SCORE: f64 = 0.6;

/// Stateless block-graph normalizer.
#[derive(Debug, Clone)]
pub struct OcrNormalizer {
    /// Fraction (0-1) under which document confidence is flagged
    confidence_threshold: f64,
}

impl Default for OcrNormalizer {
    fn default() -> Self {
        Self::new(0.8)
    }
}

impl OcrNormalizer {
    pub fn new(confidence_threshold: f64) -> Self {
        Self { confidence_threshold }
    }

    pub fn normalize(&self, graph: &BlockGraph) -> NormalizedDocument {
        let by_id: HashMap<&str, &Block> = graph.blocks.iter().map(|b| (b.id.as_str(), b)).collect();

        let pages: Vec<OcrPage> = graph
            .blocks
            .iter()
            .filter(|b| b.block_type == BlockType::Page)
            .enumerate()
            .map(|(position, block)| build_page(block, position, &by_id))
            .collect();

        let confidence = mean(pages.iter().map(|p| p.confidence));
        let full_text = assemble_full_text(&pages);
        let structure = analyze_structure(&pages);
        let quality = self.assess_quality(&pages, &full_text, confidence);

        debug!(
            pages = pages.len(),
            confidence,
            text_len = full_text.len(),
            quality_score = quality.quality_score,
            "normalized OCR block graph"
        );

        NormalizedDocument { pages, full_text, confidence, structure, quality }
    }

    fn assess_quality(&self, pages: &[OcrPage], full_text: &str, confidence: f64) -> QualityAssessment {
        let mut issues = Vec::new();

        if confidence < self.confidence_threshold * 100.0 {
            issues.push(format!("Low OCR confidence: {confidence:.1}%"));
        }

        let text_len = full_text.trim().chars().count();
        if text_len < MIN_TEXT_CHARS {
            issues.push(format!("Very little text extracted ({text_len} characters)"));
        }

        let empty: Vec<String> = pages
            .iter()
            .filter(|p| p.text.trim().is_empty())
            .map(|p| p.page_number.to_string())
            .collect();
        if !empty.is_empty() {
            issues.push(format!("Empty pages detected: {}", empty.join(", ")));
        }

        let page_ratio = if pages.is_empty() {
            0.0
        } else {
            (pages.len() - empty.len()) as f64 / pages.len() as f64
        };
        let quality_score = (confidence / 100.0 + (text_len as f64 / 1000.0).min(1.0) + page_ratio) / 3.0;

        QualityAssessment {
            is_valid: quality_score >= MIN_QUALITY_SCORE,
            quality_score: round3(quality_score),
            issues,
        }
    }
}

fn build_page(block: &Block, position: usize, by_id: &HashMap<&str, &Block>) -> OcrPage {
    let page_number = block.page.unwrap_or_else(|| u32::try_from(position + 1).unwrap_or(u32::MAX));

    let lines: Vec<OcrLine> = block
        .child_ids()
        .filter_map(|id| by_id.get(id).copied())
        .filter(|b| b.block_type == BlockType::Line)
        .map(|line| build_line(line, by_id))
        .collect();

    let text = lines.iter().map(|l| l.text.as_str()).collect::<Vec<_>>().join("\n");
    let confidence = mean(lines.iter().map(|l| l.confidence));
    let tables = detect_tables(&lines);
    let images = block
        .geometry
        .as_ref()
        .map(|geometry| DetectedImage {
            kind: "potential_image_area".to_string(),
            confidence: IMAGE_PLACEHOLDER_CONFIDENCE,
            geometry: Some(geometry.clone()),
        })
        .into_iter()
        .collect();

    OcrPage {
        page_number,
        word_count: text.split_whitespace().count(),
        line_count: lines.len(),
        text,
        confidence,
        lines,
        tables,
        images,
    }
}

fn build_line(block: &Block, by_id: &HashMap<&str, &Block>) -> OcrLine {
    let words = block
        .child_ids()
        .filter_map(|id| by_id.get(id).copied())
        .filter(|b| b.block_type == BlockType::Word)
        .map(|word| OcrWord {
            text: word.text.clone().unwrap_or_default(),
            confidence: word.confidence.unwrap_or(0.0),
            geometry: word.geometry.clone(),
        })
        .collect();

    OcrLine {
        text: block.text.clone().unwrap_or_default(),
        confidence: block.confidence.unwrap_or(0.0),
        geometry: block.geometry.clone(),
        words,
    }
}

fn is_table_candidate(line: &OcrLine) -> bool {
    COLUMN_SEPARATOR.is_match(&line.text) && line.word_count() > 2
}

fn is_consecutive(previous: &OcrLine, next: &OcrLine) -> bool {
    match (previous.bottom(), next.top()) {
        (Some(bottom), Some(top)) => (top - bottom).abs() < TABLE_ROW_GAP,
        _ => false,
    }
}

/// Groups consecutive table-candidate lines; groups shorter than two rows are dropped.
pub fn detect_tables(lines: &[OcrLine]) -> Vec<DetectedTable> {
    let mut tables = Vec::new();
    let mut group: Vec<&OcrLine> = Vec::new();

    for line in lines {
        if !is_table_candidate(line) {
            flush_table(&mut group, &mut tables);
            continue;
        }
        if let Some(previous) = group.last() {
            if !is_consecutive(previous, line) {
                flush_table(&mut group, &mut tables);
            }
        }
        group.push(line);
    }
    flush_table(&mut group, &mut tables);

    tables
}

fn flush_table(group: &mut Vec<&OcrLine>, tables: &mut Vec<DetectedTable>) {
    if group.len() >= MIN_TABLE_ROWS {
        tables.push(DetectedTable {
            rows: group.iter().map(|l| l.text.clone()).collect(),
            row_count: group.len(),
            confidence: mean(group.iter().map(|l| l.confidence)),
        });
    }
    group.clear();
}

fn assemble_full_text(pages: &[OcrPage]) -> String {
    pages
        .iter()
        .filter(|p| !p.text.trim().is_empty())
        .map(|p| format!("--- Page {} ---\n{}\n", p.page_number, p.text))
        .collect::<Vec<_>>()
        .join("\n")
}

fn analyze_structure(pages: &[OcrPage]) -> DocumentStructure {
    DocumentStructure {
        total_pages: pages.len(),
        has_tables: pages.iter().any(|p| !p.tables.is_empty()),
        has_images: pages.iter().any(|p| !p.images.is_empty()),
        average_words_per_page: mean(pages.iter().map(|p| p.word_count as f64)),
    }
}

/// Arithmetic mean, 0 for an empty sequence.
pub fn mean(values: impl Iterator<Item = f64>) -> f64 {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    if count == 0 {
        0.0
    } else {
        sum / count as f64
    }
}

fn round3(value: f64) -> f64 {
    (value * 1000.0).round() / 1000.0
}
