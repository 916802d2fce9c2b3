//! Domain layer for the compliance pipeline
//!
//! This module contains core models, the error taxonomy and the port traits
//! through which every external collaborator is consumed.

pub mod errors;
pub mod models;
pub mod ports;

pub use errors::{DomainError, DomainResult};
