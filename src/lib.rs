//! Compliance Mapper - compliance document pipeline
//!
//! Turns uploaded PDF contracts and regulations into structured compliance
//! analyses: OCR output is normalized, segmented into clauses, classified,
//! mined for entities, mapped to regulations by embedding similarity, scored
//! by per-category risk agents and finally rendered as a report.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): records, the document state machine, errors and ports
//! - **Service Layer** (`services`): pure stage algorithms
//! - **Application Layer** (`application`): stage handlers, idempotency guard and event routing
//! - **Adapters** (`adapters`): SQLite, filesystem blobs, OCR sidecars, embeddings, events, rendering
//! - **Infrastructure Layer** (`infrastructure`): configuration and logging
//! - **CLI Layer** (`cli`): command-line interface
//!
//! # Example
//!
//! ```ignore
//! use compliance_mapper::application::{EventRouter, IntakeRequest, Pipeline, PipelineContext};
//!
//! let adapters = PipelineContext::local(config, pool)?;
//! let pipeline = std::sync::Arc::new(Pipeline::new(adapters.context.clone()));
//! let intake = pipeline.ingest(IntakeRequest::new("msa.pdf", bytes, "vendor_contract")).await?;
//! let document = EventRouter::new(pipeline).drive(&intake.document.id).await?;
//! ```

pub mod adapters;
pub mod application;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use application::{EventRouter, IntakeOutcome, IntakeRequest, Pipeline, PipelineContext, StageOutcome};
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    AnalysisResult, Clause, ComplianceCategory, Config, Document, DocumentStatus, DocumentType, Entity, EntityType,
    PipelineEvent, PipelineStage, Regulation, RegulationMapping, Report, ReportFormat, ReportType, RiskLevel,
};
pub use infrastructure::config::{ConfigError, ConfigLoader};
