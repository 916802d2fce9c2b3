use serde::{Deserialize, Serialize};

use super::document::DocumentType;

/// Main configuration structure for the compliance pipeline
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct Config {
    /// Database configuration
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Blob storage configuration
    #[serde(default)]
    pub storage: StorageConfig,

    /// Document processing limits and thresholds
    #[serde(default)]
    pub processing: ProcessingConfig,

    /// Embedding provider and regulation retrieval
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    /// Retry policy configuration
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseConfig {
    /// Path to `SQLite` database file
    #[serde(default = "default_database_path")]
    pub path: String,

    /// Maximum number of database connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_database_path() -> String {
    ".compliance/compliance.db".to_string()
}

const fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
        }
    }
}

/// Blob storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct StorageConfig {
    /// Root directory under which each bucket is a subdirectory
    #[serde(default = "default_storage_root")]
    pub root: String,

    #[serde(default = "default_raw_bucket")]
    pub raw_bucket: String,

    #[serde(default = "default_processed_bucket")]
    pub processed_bucket: String,

    #[serde(default = "default_reports_bucket")]
    pub reports_bucket: String,
}

fn default_storage_root() -> String {
    ".compliance/blobs".to_string()
}

fn default_raw_bucket() -> String {
    "compliance-docs-raw".to_string()
}

fn default_processed_bucket() -> String {
    "compliance-docs-processed".to_string()
}

fn default_reports_bucket() -> String {
    "compliance-reports".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            root: default_storage_root(),
            raw_bucket: default_raw_bucket(),
            processed_bucket: default_processed_bucket(),
            reports_bucket: default_reports_bucket(),
        }
    }
}

/// Processing limits and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ProcessingConfig {
    /// Largest accepted upload, in MiB
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Fraction (0-1) below which OCR output is flagged as low confidence
    #[serde(default = "default_ocr_confidence_threshold")]
    pub ocr_confidence_threshold: f64,

    /// Clause candidates shorter than this (trimmed chars) are dropped
    #[serde(default = "default_min_clause_length")]
    pub min_clause_length: usize,

    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Clauses processed concurrently by the semantic mapper
    #[serde(default = "default_clause_concurrency")]
    pub clause_concurrency: usize,

    #[serde(default = "default_allowed_document_types")]
    pub allowed_document_types: Vec<DocumentType>,
}

const fn default_max_file_size_mb() -> u64 {
    50
}

const fn default_max_pages() -> usize {
    100
}

const fn default_ocr_confidence_threshold() -> f64 {
    0.8
}

const fn default_min_clause_length() -> usize {
    20
}

const fn default_batch_size() -> usize {
    100
}

const fn default_clause_concurrency() -> usize {
    8
}

fn default_allowed_document_types() -> Vec<DocumentType> {
    DocumentType::all().to_vec()
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            max_file_size_mb: default_max_file_size_mb(),
            max_pages: default_max_pages(),
            ocr_confidence_threshold: default_ocr_confidence_threshold(),
            min_clause_length: default_min_clause_length(),
            batch_size: default_batch_size(),
            clause_concurrency: default_clause_concurrency(),
            allowed_document_types: default_allowed_document_types(),
        }
    }
}

impl ProcessingConfig {
    pub const fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb * 1024 * 1024
    }
}

/// Which embedding backend to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmbeddingProviderKind {
    /// Deterministic local hashing embedder
    Hashing,
    /// OpenAI-compatible `/embeddings` endpoint
    Openai,
}

/// Embedding provider and regulation retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct EmbeddingConfig {
    #[serde(default = "default_embedding_provider")]
    pub provider: EmbeddingProviderKind,

    #[serde(default = "default_embedding_base_url")]
    pub base_url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_embedding_dimension")]
    pub dimension: usize,

    /// API key for the remote provider; usually supplied via environment
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_embedding_timeout_secs")]
    pub timeout_secs: u64,

    /// Minimum cosine similarity for a regulation to be mapped
    #[serde(default = "default_similarity_threshold")]
    pub similarity_threshold: f64,

    /// Maximum regulations mapped per clause
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

const fn default_embedding_provider() -> EmbeddingProviderKind {
    EmbeddingProviderKind::Hashing
}

fn default_embedding_base_url() -> String {
    "http://localhost:8080/v1".to_string()
}

fn default_embedding_model() -> String {
    "snowflake-arctic-embed-m".to_string()
}

const fn default_embedding_dimension() -> usize {
    768
}

const fn default_embedding_timeout_secs() -> u64 {
    30
}

const fn default_similarity_threshold() -> f64 {
    0.75
}

const fn default_max_results() -> usize {
    10
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: default_embedding_provider(),
            base_url: default_embedding_base_url(),
            model: default_embedding_model(),
            dimension: default_embedding_dimension(),
            api_key: None,
            timeout_secs: default_embedding_timeout_secs(),
            similarity_threshold: default_similarity_threshold(),
            max_results: default_max_results(),
        }
    }
}

/// Retry policy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct RetryConfig {
    /// Attempts after the first failure
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Base delay; attempt `n` waits `initial_backoff_ms * 2^n`
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,

    #[serde(default = "default_max_backoff_ms")]
    pub max_backoff_ms: u64,
}

const fn default_max_retries() -> u32 {
    3
}

const fn default_initial_backoff_ms() -> u64 {
    1000
}

const fn default_max_backoff_ms() -> u64 {
    30000
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_backoff_ms: default_initial_backoff_ms(),
            max_backoff_ms: default_max_backoff_ms(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: json or pretty
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Directory for rolling log files; stderr only when unset
    #[serde(default)]
    pub log_dir: Option<String>,

    /// Rotation: daily, hourly or never
    #[serde(default = "default_rotation")]
    pub rotation: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            log_dir: None,
            rotation: default_rotation(),
        }
    }
}
