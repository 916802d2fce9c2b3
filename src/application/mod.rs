pub mod context;
pub mod event_router;
pub mod pipeline;

pub use context::{LocalAdapters, PipelineContext};
pub use event_router::EventRouter;
pub use pipeline::{IntakeOutcome, IntakeRequest, Pipeline, StageOutcome};
