//! Common test utilities for integration tests
//!
//! Builds a fully wired local pipeline over an in-memory database and a
//! temporary blob root, plus block-graph and regulation fixtures.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tempfile::TempDir;
use tokio::sync::broadcast;

use compliance_mapper::adapters::sqlite::create_migrated_test_pool;
use compliance_mapper::adapters::HashingEmbeddingProvider;
use compliance_mapper::application::{LocalAdapters, Pipeline, PipelineContext};
use compliance_mapper::domain::models::{
    ComplianceCategory, Config, Document, EmbeddingProviderKind, PipelineEvent, Regulation, RetryConfig,
};
use compliance_mapper::domain::ports::RegulationIndex;

pub const EMBEDDING_DIMENSION: usize = 256;

pub const SAFETY_CLAUSE: &str = "The Contractor shall implement a safety management system in accordance with AS 4801 and provide protective equipment to all workers on site.";
pub const PAYMENT_CLAUSE: &str =
    "The Supplier must pay all invoices within 30 days and any late payment incurs a penalty of 5% per month.";
pub const ENVIRONMENT_CLAUSE: &str = "The Contractor shall minimise environmental impact and report hazardous waste emissions to the environmental protection authority.";
pub const GOVERNING_LAW_CLAUSE: &str =
    "This agreement is governed by the laws of Queensland and any dispute is resolved by arbitration.";

pub struct TestPipeline {
    pub dir: TempDir,
    pub adapters: LocalAdapters,
    pub pipeline: Arc<Pipeline>,
}

impl TestPipeline {
    pub fn context(&self) -> &PipelineContext {
        &self.adapters.context
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.adapters.events.subscribe()
    }

    /// Completes the OCR job for an ingested document.
    pub async fn complete_ocr(&self, document: &Document, raw_graph: &str) {
        let bucket = document.metadata_str("raw_bucket").expect("raw bucket recorded");
        let key = document.metadata_str("raw_key").expect("raw key recorded");
        self.adapters
            .ocr
            .register_result(bucket, key, raw_graph)
            .await
            .expect("register OCR result");
    }

    pub async fn fail_ocr(&self, document: &Document, message: &str) {
        let bucket = document.metadata_str("raw_bucket").expect("raw bucket recorded");
        let key = document.metadata_str("raw_key").expect("raw key recorded");
        self.adapters
            .ocr
            .register_failure(bucket, key, message)
            .await
            .expect("register OCR failure");
    }
}

/// Configuration tuned for tests: local hashing embeddings, a low similarity
/// threshold and near-zero retry backoff.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.embedding.provider = EmbeddingProviderKind::Hashing;
    config.embedding.dimension = EMBEDDING_DIMENSION;
    config.embedding.similarity_threshold = 0.3;
    config.retry = RetryConfig {
        max_retries: 1,
        initial_backoff_ms: 1,
        max_backoff_ms: 5,
    };
    config
}

pub async fn test_pipeline() -> TestPipeline {
    test_pipeline_with(test_config()).await
}

pub async fn test_pipeline_with(config: Config) -> TestPipeline {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let pool = create_migrated_test_pool().await.expect("Failed to create test pool");
    let adapters = PipelineContext::local_with_root(dir.path(), config, pool).expect("Failed to wire adapters");
    let pipeline = Arc::new(Pipeline::new(adapters.context.clone()));
    TestPipeline { dir, adapters, pipeline }
}

/// Minimal bytes that pass the PDF magic check; `tag` keeps hashes distinct.
pub fn pdf_bytes(tag: &str) -> Vec<u8> {
    format!("%PDF-1.7\n% {tag}\n%%EOF\n").into_bytes()
}

/// Builds a `{"Blocks": [...]}` graph with one PAGE per entry, one LINE per
/// string, and WORD children for every line.
pub fn block_graph(pages: &[&[&str]], line_confidence: f64) -> String {
    let mut blocks = Vec::new();
    for (page_index, lines) in pages.iter().enumerate() {
        let page_number = page_index + 1;
        let mut line_ids = Vec::new();
        for (line_index, line) in lines.iter().enumerate() {
            let line_id = format!("p{page_number}-l{line_index}");
            let mut word_ids = Vec::new();
            for (word_index, word) in line.split_whitespace().enumerate() {
                let word_id = format!("{line_id}-w{word_index}");
                blocks.push(json!({
                    "BlockType": "WORD",
                    "Id": word_id,
                    "Text": word,
                    "Confidence": line_confidence,
                    "Page": page_number,
                }));
                word_ids.push(word_id);
            }
            blocks.push(json!({
                "BlockType": "LINE",
                "Id": line_id,
                "Text": line,
                "Confidence": line_confidence,
                "Page": page_number,
                "Relationships": [{"Type": "CHILD", "Ids": word_ids}],
            }));
            line_ids.push(line_id);
        }
        blocks.push(json!({
            "BlockType": "PAGE",
            "Id": format!("page-{page_number}"),
            "Page": page_number,
            "Relationships": [{"Type": "CHILD", "Ids": line_ids}],
        }));
    }
    json!({ "Blocks": blocks }).to_string()
}

/// Two-page vendor contract with four numbered clauses.
pub fn contract_graph() -> String {
    let first = format!("1. {SAFETY_CLAUSE}");
    let second = format!("2. {PAYMENT_CLAUSE}");
    let third = format!("3. {ENVIRONMENT_CLAUSE}");
    let fourth = format!("4. {GOVERNING_LAW_CLAUSE}");
    block_graph(&[&[first.as_str(), second.as_str()], &[third.as_str(), fourth.as_str()]], 95.0)
}

pub fn regulations() -> Vec<Regulation> {
    vec![
        Regulation {
            id: "WHS-2011-19".to_string(),
            title: "Primary duty of care".to_string(),
            text: "A person conducting a business shall implement a safety management system and provide protective equipment to workers on site.".to_string(),
            category: ComplianceCategory::SafetyCompliance,
            jurisdiction: Some("Australia".to_string()),
        },
        Regulation {
            id: "EPA-1994-320".to_string(),
            title: "Duty to notify environmental harm".to_string(),
            text: "An operator shall report hazardous waste emissions and minimise environmental impact to the environmental protection authority.".to_string(),
            category: ComplianceCategory::EnvironmentalCompliance,
            jurisdiction: Some("Queensland".to_string()),
        },
        Regulation {
            id: "PAY-ON-TIME-2021".to_string(),
            title: "Payment times".to_string(),
            text: "Large businesses must pay small business invoices within 30 days and late payment incurs interest.".to_string(),
            category: ComplianceCategory::CommercialTerms,
            jurisdiction: None,
        },
    ]
}

pub async fn seed_regulations(pipeline: &TestPipeline) {
    let embedder = HashingEmbeddingProvider::new(EMBEDDING_DIMENSION).expect("valid dimension");
    for regulation in regulations() {
        let vector = embedder.vector(&regulation.text);
        pipeline
            .adapters
            .regulations
            .upsert(&regulation, &vector)
            .await
            .expect("seed regulation");
    }
}

/// Drains every event currently buffered on `receiver`.
pub fn drain(receiver: &mut broadcast::Receiver<PipelineEvent>) -> Vec<PipelineEvent> {
    let mut events = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        events.push(event);
    }
    events
}

/// Waits for the first event matching `predicate`, failing after `timeout`.
pub async fn wait_for_event<F>(
    receiver: &mut broadcast::Receiver<PipelineEvent>,
    timeout: Duration,
    predicate: F,
) -> PipelineEvent
where
    F: Fn(&PipelineEvent) -> bool,
{
    tokio::time::timeout(timeout, async {
        loop {
            match receiver.recv().await {
                Ok(event) if predicate(&event) => return event,
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => panic!("event channel closed"),
            }
        }
    })
    .await
    .expect("timed out waiting for event")
}
