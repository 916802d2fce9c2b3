//! Event bus port.

use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::PipelineEvent;

/// Fire-and-forget publication of stage events.
///
/// Callers log failures and carry on; a failed publish never rolls back a stage.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &PipelineEvent) -> DomainResult<()>;
}
