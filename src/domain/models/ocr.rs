//! OCR domain model.
//!
//! The input side mirrors the recognition service's flat block graph
//! (`PAGE`/`LINE`/`WORD` blocks linked by `CHILD` relationships). The output
//! side is the normalized page/line/word hierarchy consumed by clause
//! extraction.

use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Block kind in a recognition result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum BlockType {
    Page,
    Line,
    Word,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Relationship {
    #[serde(rename = "Type")]
    pub relationship_type: String,
    #[serde(default)]
    pub ids: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BoundingBox {
    #[serde(default)]
    pub width: f64,
    #[serde(default)]
    pub height: f64,
    #[serde(default)]
    pub left: f64,
    #[serde(default)]
    pub top: f64,
}

/// Opaque geometry; only the bounding box is read, everything else passes through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Geometry {
    #[serde(default)]
    pub bounding_box: Option<BoundingBox>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// One block of the recognition graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Block {
    pub block_type: BlockType,
    pub id: String,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default)]
    pub text: Option<String>,
    /// Vendor confidence on a 0-100 scale
    #[serde(default)]
    pub confidence: Option<f64>,
    #[serde(default)]
    pub page: Option<u32>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

impl Block {
    /// Ids of all `CHILD` relationships, in declaration order.
    pub fn child_ids(&self) -> impl Iterator<Item = &str> {
        self.relationships
            .iter()
            .filter(|r| r.relationship_type.eq_ignore_ascii_case("CHILD"))
            .flat_map(|r| r.ids.iter().map(String::as_str))
    }
}

/// Flat block graph as returned by the OCR service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BlockGraph {
    #[serde(rename = "Blocks", default)]
    pub blocks: Vec<Block>,
}

impl BlockGraph {
    /// Accepts either `{"Blocks": [...]}` or a bare array of blocks.
    pub fn from_json(raw: &str) -> DomainResult<Self> {
        let value: serde_json::Value = serde_json::from_str(raw)?;
        if value.is_array() {
            let blocks: Vec<Block> = serde_json::from_value(value)?;
            return Ok(Self { blocks });
        }
        if value.get("Blocks").is_some() {
            return Ok(serde_json::from_value(value)?);
        }
        Err(DomainError::Validation("OCR result has no Blocks array".to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OcrJobStatus {
    InProgress,
    Succeeded,
    Failed,
}

/// Result of polling an OCR job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrJob {
    pub job_id: String,
    pub status: OcrJobStatus,
    pub blocks: Option<BlockGraph>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrWord {
    pub text: String,
    pub confidence: f64,
    pub geometry: Option<Geometry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrLine {
    pub text: String,
    pub confidence: f64,
    pub geometry: Option<Geometry>,
    pub words: Vec<OcrWord>,
}

impl OcrLine {
    pub fn word_count(&self) -> usize {
        self.text.split_whitespace().count()
    }

    pub fn top(&self) -> Option<f64> {
        self.bounding_box().map(|b| b.top)
    }

    pub fn bottom(&self) -> Option<f64> {
        self.bounding_box().map(|b| b.top + b.height)
    }

    fn bounding_box(&self) -> Option<BoundingBox> {
        self.geometry.as_ref().and_then(|g| g.bounding_box)
    }
}

/// Group of consecutive column-separated lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedTable {
    pub rows: Vec<String>,
    pub row_count: usize,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedImage {
    pub kind: String,
    pub confidence: f64,
    pub geometry: Option<Geometry>,
}

/// A normalized page. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OcrPage {
    pub page_number: u32,
    pub text: String,
    pub word_count: usize,
    pub line_count: usize,
    /// Mean of the page's line confidences (0-100), 0 when the page has no lines
    pub confidence: f64,
    pub lines: Vec<OcrLine>,
    pub tables: Vec<DetectedTable>,
    pub images: Vec<DetectedImage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentStructure {
    pub total_pages: usize,
    pub has_tables: bool,
    pub has_images: bool,
    pub average_words_per_page: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityAssessment {
    pub is_valid: bool,
    pub quality_score: f64,
    pub issues: Vec<String>,
}

/// Output of the OCR normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedDocument {
    pub pages: Vec<OcrPage>,
    pub full_text: String,
    /// Mean of page confidences (0-100), not word-weighted
    pub confidence: f64,
    pub structure: DocumentStructure,
    pub quality: QualityAssessment,
}
