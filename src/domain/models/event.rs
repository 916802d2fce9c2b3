//! Stage completion events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::document::{DocumentStatus, PipelineStage};

/// Payload carried by every stage event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageEventDetail {
    pub document_id: String,
    pub status: DocumentStatus,
    pub pipeline_stage: PipelineStage,
    pub timestamp: DateTime<Utc>,
}

/// Envelope published to the event bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineEvent {
    pub id: Uuid,
    pub source: String,
    pub detail_type: String,
    pub detail: StageEventDetail,
}

impl PipelineEvent {
    pub fn stage_completed(stage: PipelineStage, document_id: impl Into<String>, status: DocumentStatus) -> Self {
        Self {
            id: Uuid::new_v4(),
            source: stage.event_source().to_string(),
            detail_type: stage.detail_type().to_string(),
            detail: StageEventDetail {
                document_id: document_id.into(),
                status,
                pipeline_stage: stage,
                timestamp: Utc::now(),
            },
        }
    }

    pub fn detail_json(&self) -> serde_json::Value {
        serde_json::to_value(&self.detail).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stage_event_carries_source_and_status() {
        let event = PipelineEvent::stage_completed(
            PipelineStage::SemanticMapping,
            "doc_1",
            DocumentStatus::SemanticMappingCompleted,
        );
        assert_eq!(event.source, "compliance.semantic.mapping");
        assert_eq!(event.detail_type, "Semantic Mapping Status Change");

        let detail = event.detail_json();
        assert_eq!(detail["document_id"], "doc_1");
        assert_eq!(detail["status"], "semantic_mapping_completed");
        assert_eq!(detail["pipeline_stage"], "semantic_mapping");
    }
}
