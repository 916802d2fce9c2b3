use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use thiserror::Error;

use crate::domain::models::config::Config;

/// Project-local configuration directory.
pub const CONFIG_DIR: &str = ".compliance";
pub const ENV_PREFIX: &str = "COMPLIANCE_";

/// Configuration error types
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid log level: {0}. Must be one of: trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("Invalid log format: {0}. Must be one of: json, pretty")]
    InvalidLogFormat(String),

    #[error("Invalid log rotation: {0}. Must be one of: daily, hourly, never")]
    InvalidLogRotation(String),

    #[error("Database path cannot be empty")]
    EmptyDatabasePath,

    #[error("Invalid max_connections: {0}. Must be at least 1")]
    InvalidMaxConnections(u32),

    #[error("Invalid max_file_size_mb: {0}. Must be at least 1")]
    InvalidMaxFileSize(u64),

    #[error("Invalid similarity_threshold: {0}. Must be between 0 and 1")]
    InvalidSimilarityThreshold(f64),

    #[error("Invalid max_results: {0}. Must be at least 1")]
    InvalidMaxResults(usize),

    #[error("Invalid embedding dimension: {0}. Must be at least 1")]
    InvalidDimension(usize),

    #[error(
        "Invalid backoff configuration: initial_backoff_ms ({0}) must be less than max_backoff_ms ({1})"
    )]
    InvalidBackoff(u64, u64),

    #[error("Invalid clause_concurrency: {0}. Must be at least 1")]
    InvalidConcurrency(usize),

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration loader with hierarchical merging
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from the current directory.
    ///
    /// Precedence (lowest to highest):
    /// 1. Programmatic defaults (Serialized)
    /// 2. .compliance/config.yaml (project config, created by init)
    /// 3. .compliance/local.yaml (local overrides, optional)
    /// 4. Environment variables (COMPLIANCE_* prefix, `__` for nesting)
    pub fn load() -> Result<Config> {
        Self::load_from_dir(".")
    }

    /// Same as [`ConfigLoader::load`] with `.compliance/` resolved under `root`.
    pub fn load_from_dir(root: impl AsRef<Path>) -> Result<Config> {
        let config_dir = root.as_ref().join(CONFIG_DIR);
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(config_dir.join("config.yaml")))
            .merge(Yaml::file(config_dir.join("local.yaml")))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()
            .context("Failed to extract configuration from figment")?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Config> {
        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Yaml::file(path.as_ref()))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        Self::validate(&config)?;
        Ok(config)
    }

    pub fn project_config_path(root: impl AsRef<Path>) -> PathBuf {
        root.as_ref().join(CONFIG_DIR).join("config.yaml")
    }

    /// Validate configuration after loading
    pub fn validate(config: &Config) -> Result<(), ConfigError> {
        if config.database.path.is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if config.database.max_connections == 0 {
            return Err(ConfigError::InvalidMaxConnections(config.database.max_connections));
        }

        let valid_log_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_log_levels.contains(&config.logging.level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(config.logging.level.clone()));
        }
        let valid_log_formats = ["json", "pretty"];
        if !valid_log_formats.contains(&config.logging.format.as_str()) {
            return Err(ConfigError::InvalidLogFormat(config.logging.format.clone()));
        }
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&config.logging.rotation.as_str()) {
            return Err(ConfigError::InvalidLogRotation(config.logging.rotation.clone()));
        }

        let processing = &config.processing;
        if processing.max_file_size_mb == 0 {
            return Err(ConfigError::InvalidMaxFileSize(processing.max_file_size_mb));
        }
        if processing.clause_concurrency == 0 {
            return Err(ConfigError::InvalidConcurrency(processing.clause_concurrency));
        }
        if processing.allowed_document_types.is_empty() {
            return Err(ConfigError::ValidationFailed(
                "allowed_document_types cannot be empty".to_string(),
            ));
        }

        let embedding = &config.embedding;
        if !(0.0..=1.0).contains(&embedding.similarity_threshold) {
            return Err(ConfigError::InvalidSimilarityThreshold(embedding.similarity_threshold));
        }
        if embedding.max_results == 0 {
            return Err(ConfigError::InvalidMaxResults(embedding.max_results));
        }
        if embedding.dimension == 0 {
            return Err(ConfigError::InvalidDimension(embedding.dimension));
        }

        if config.retry.initial_backoff_ms >= config.retry.max_backoff_ms {
            return Err(ConfigError::InvalidBackoff(
                config.retry.initial_backoff_ms,
                config.retry.max_backoff_ms,
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::{DocumentType, EmbeddingProviderKind};
    use std::fs;

    fn write_project_config(root: &Path, file: &str, contents: &str) {
        let dir = root.join(CONFIG_DIR);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(file), contents).unwrap();
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.database.path, ".compliance/compliance.db");
        assert_eq!(config.storage.raw_bucket, "compliance-docs-raw");
        assert_eq!(config.processing.max_file_size_mb, 50);
        assert_eq!(config.processing.allowed_document_types.len(), 3);
        assert!((config.embedding.similarity_threshold - 0.75).abs() < f64::EPSILON);
        assert_eq!(config.embedding.max_results, 10);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Hashing);
        assert_eq!(config.logging.level, "info");
        ConfigLoader::validate(&config).expect("Default config should be valid");
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml = r"
database:
  path: /custom/compliance.db
  max_connections: 2
processing:
  max_pages: 10
  allowed_document_types: [vendor_contract]
embedding:
  provider: openai
  model: text-embedding-3-small
  dimension: 1536
logging:
  level: debug
  format: json
";

        let config: Config = serde_yaml::from_str(yaml).expect("YAML should parse");

        assert_eq!(config.database.path, "/custom/compliance.db");
        assert_eq!(config.database.max_connections, 2);
        assert_eq!(config.processing.max_pages, 10);
        assert_eq!(config.processing.allowed_document_types, vec![DocumentType::VendorContract]);
        assert_eq!(config.processing.min_clause_length, 20);
        assert_eq!(config.embedding.provider, EmbeddingProviderKind::Openai);
        assert_eq!(config.embedding.dimension, 1536);
        assert_eq!(config.logging.format, "json");

        ConfigLoader::validate(&config).expect("Parsed config should be valid");
    }

    #[test]
    fn test_validate_invalid_log_level() {
        let mut config = Config::default();
        config.logging.level = "invalid".to_string();

        match ConfigLoader::validate(&config).unwrap_err() {
            ConfigError::InvalidLogLevel(level) => assert_eq!(level, "invalid"),
            other => panic!("Expected InvalidLogLevel error, got {other:?}"),
        }
    }

    #[test]
    fn test_validate_invalid_log_format() {
        let mut config = Config::default();
        config.logging.format = "xml".to_string();

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidLogFormat(f)) if f == "xml"
        ));
    }

    #[test]
    fn test_validate_empty_database_path() {
        let mut config = Config::default();
        config.database.path = String::new();

        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::EmptyDatabasePath)));
    }

    #[test]
    fn test_validate_zero_max_connections() {
        let mut config = Config::default();
        config.database.max_connections = 0;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidMaxConnections(0))
        ));
    }

    #[test]
    fn test_validate_similarity_threshold_range() {
        let mut config = Config::default();
        config.embedding.similarity_threshold = 1.5;
        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidSimilarityThreshold(_))
        ));

        config.embedding.similarity_threshold = 0.0;
        assert!(ConfigLoader::validate(&config).is_ok());
    }

    #[test]
    fn test_validate_processing_limits() {
        let mut config = Config::default();
        config.processing.max_file_size_mb = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidMaxFileSize(0))));

        let mut config = Config::default();
        config.processing.clause_concurrency = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidConcurrency(0))));

        let mut config = Config::default();
        config.processing.allowed_document_types.clear();
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::ValidationFailed(_))));
    }

    #[test]
    fn test_validate_embedding_limits() {
        let mut config = Config::default();
        config.embedding.max_results = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidMaxResults(0))));

        let mut config = Config::default();
        config.embedding.dimension = 0;
        assert!(matches!(ConfigLoader::validate(&config), Err(ConfigError::InvalidDimension(0))));
    }

    #[test]
    fn test_validate_invalid_backoff() {
        let mut config = Config::default();
        config.retry.initial_backoff_ms = 30000;
        config.retry.max_backoff_ms = 10000;

        assert!(matches!(
            ConfigLoader::validate(&config),
            Err(ConfigError::InvalidBackoff(30000, 10000))
        ));
    }

    #[test]
    fn test_hierarchical_merging() {
        let dir = tempfile::tempdir().unwrap();
        write_project_config(
            dir.path(),
            "config.yaml",
            "logging:\n  level: info\n  format: json\nprocessing:\n  max_pages: 40\n",
        );
        write_project_config(dir.path(), "local.yaml", "logging:\n  level: debug\n");

        let config = temp_env::with_vars_unset(["COMPLIANCE_LOGGING__LEVEL"], || {
            ConfigLoader::load_from_dir(dir.path()).unwrap()
        });

        assert_eq!(config.logging.level, "debug", "Local override should win");
        assert_eq!(config.logging.format, "json", "Base value should persist when not overridden");
        assert_eq!(config.processing.max_pages, 40);
    }

    #[test]
    fn test_env_override() {
        let dir = tempfile::tempdir().unwrap();
        write_project_config(dir.path(), "config.yaml", "embedding:\n  max_results: 5\n");

        let config = temp_env::with_vars(
            [
                ("COMPLIANCE_EMBEDDING__MAX_RESULTS", Some("3")),
                ("COMPLIANCE_LOGGING__LEVEL", Some("warn")),
            ],
            || ConfigLoader::load_from_dir(dir.path()).unwrap(),
        );

        assert_eq!(config.embedding.max_results, 3);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_invalid_env_value_fails_validation() {
        let dir = tempfile::tempdir().unwrap();

        let result = temp_env::with_var("COMPLIANCE_EMBEDDING__SIMILARITY_THRESHOLD", Some("2.0"), || {
            ConfigLoader::load_from_dir(dir.path())
        });

        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let file = tempfile::NamedTempFile::new().unwrap();
        fs::write(file.path(), "storage:\n  root: /tmp/blobs\n").unwrap();

        let config = ConfigLoader::load_from_file(file.path()).unwrap();
        assert_eq!(config.storage.root, "/tmp/blobs");
        assert_eq!(config.storage.reports_bucket, "compliance-reports");
    }
}
