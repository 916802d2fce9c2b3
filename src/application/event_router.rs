//! Routes stage completion events to the next stage.

use std::sync::Arc;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::pipeline::{Pipeline, StageOutcome};
use crate::domain::errors::DomainResult;
use crate::domain::models::{Document, DocumentStatus, PipelineEvent, PipelineStage};

pub struct EventRouter {
    pipeline: Arc<Pipeline>,
}

impl EventRouter {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Arc<Pipeline> {
        &self.pipeline
    }

    /// Runs the stage triggered by `event`, if any.
    pub async fn handle(&self, event: &PipelineEvent) -> DomainResult<Option<StageOutcome>> {
        let Some(stage) = PipelineStage::triggered_by(event.detail.status) else {
            debug!(
                document_id = %event.detail.document_id,
                status = %event.detail.status,
                "No stage follows this event"
            );
            return Ok(None);
        };

        self.pipeline
            .run_stage(stage, &event.detail.document_id)
            .await
            .map(Some)
    }

    /// Consumes events until the channel closes. Stage errors are logged; a
    /// failed stage has already recorded its error on the document.
    pub async fn run(&self, mut receiver: broadcast::Receiver<PipelineEvent>) {
        loop {
            match receiver.recv().await {
                Ok(event) => {
                    match self.handle(&event).await {
                        Ok(_) => {}
                        Err(err) if err.is_not_ready() => {
                            debug!(document_id = %event.detail.document_id, reason = %err, "Stage deferred");
                        }
                        Err(err) => error!(
                            document_id = %event.detail.document_id,
                            source = %event.source,
                            error = %err,
                            "Event handling failed"
                        ),
                    }
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Event router lagged behind, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    info!("Event channel closed, router stopping");
                    break;
                }
            }
        }
    }

    pub fn spawn(self: Arc<Self>, receiver: broadcast::Receiver<PipelineEvent>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(receiver).await })
    }

    /// Runs every remaining stage for a document in order, stopping at
    /// `report_generated`, `failed`, or the first error.
    pub async fn drive(&self, document_id: &str) -> DomainResult<Document> {
        loop {
            let document = self.pipeline.document(document_id).await?;
            // an interrupted clause extraction leaves the document in `processing`
            let next = match document.status {
                DocumentStatus::Processing => Some(PipelineStage::ClauseExtraction),
                status => PipelineStage::triggered_by(status),
            };
            let Some(stage) = next else {
                return Ok(document);
            };

            let outcome = self.pipeline.run_stage(stage, document_id).await?;
            debug!(document_id, stage = %stage, status = %outcome.status(), "Drive step");
            if outcome.is_skipped() && outcome.status() == document.status {
                return self.pipeline.document(document_id).await;
            }
        }
    }
}
