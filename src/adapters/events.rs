//! In-process event bus on a tokio broadcast channel.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::debug;

use crate::domain::errors::DomainResult;
use crate::domain::models::PipelineEvent;
use crate::domain::ports::EventPublisher;

pub const DEFAULT_CHANNEL_CAPACITY: usize = 1024;

/// Broadcasts pipeline events to every live subscriber.
pub struct BroadcastEventPublisher {
    sender: broadcast::Sender<PipelineEvent>,
    published: AtomicU64,
}

impl Default for BroadcastEventPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl BroadcastEventPublisher {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self {
            sender,
            published: AtomicU64::new(0),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<PipelineEvent> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Events published since creation, delivered or not.
    pub fn published_count(&self) -> u64 {
        self.published.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EventPublisher for BroadcastEventPublisher {
    async fn publish(&self, event: &PipelineEvent) -> DomainResult<()> {
        self.published.fetch_add(1, Ordering::SeqCst);

        // no subscribers is not an error
        let receivers = self.sender.send(event.clone()).unwrap_or(0);
        debug!(
            source = %event.source,
            detail_type = %event.detail_type,
            document_id = %event.detail.document_id,
            status = %event.detail.status,
            receivers,
            "Published pipeline event"
        );
        Ok(())
    }
}
