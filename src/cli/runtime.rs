//! Shared wiring for CLI commands.

use std::sync::Arc;

use anyhow::{Context, Result};

use crate::adapters::sqlite::initialize_database;
use crate::application::{LocalAdapters, Pipeline, PipelineContext};
use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

pub struct CliRuntime {
    pub adapters: LocalAdapters,
    pub pipeline: Arc<Pipeline>,
}

impl CliRuntime {
    /// Loads configuration from the working directory and opens the project database.
    pub async fn load() -> Result<Self> {
        let config = ConfigLoader::load().context("Failed to load configuration")?;
        Self::from_config(config).await
    }

    pub async fn from_config(config: Config) -> Result<Self> {
        let pool = initialize_database(&config.database)
            .await
            .context("Failed to initialize database. Run 'compliance-mapper init' first.")?;
        let adapters = PipelineContext::local(config, pool).context("Failed to wire pipeline adapters")?;
        let pipeline = Arc::new(Pipeline::new(adapters.context.clone()));
        Ok(Self { adapters, pipeline })
    }

    pub fn config(&self) -> &Config {
        &self.adapters.context.config
    }
}
