//! CLI command implementations.

pub mod analysis;
pub mod clauses;
pub mod documents;
pub mod ingest;
pub mod init;
pub mod process;
pub mod regulations;
pub mod report;
pub mod run;
