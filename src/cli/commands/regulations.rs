//! Regulation index CLI commands.

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use std::path::{Path, PathBuf};

use crate::cli::output::{action_success, output, CommandOutput};
use crate::cli::runtime::CliRuntime;
use crate::domain::models::Regulation;
use crate::domain::ports::{EmbeddingProvider, RegulationIndex};

#[derive(Args, Debug)]
pub struct RegulationsArgs {
    #[command(subcommand)]
    pub command: RegulationsCommands,
}

#[derive(Subcommand, Debug)]
pub enum RegulationsCommands {
    /// Embed and index regulations from a JSON array file
    Load {
        /// JSON file holding `[{id, title, text, category, jurisdiction?}]`
        file: PathBuf,
    },
}

#[derive(Debug, serde::Serialize)]
pub struct RegulationLoadOutput {
    pub loaded: usize,
    pub indexed_total: u64,
    pub provider: String,
    pub model: String,
}

impl CommandOutput for RegulationLoadOutput {
    fn to_human(&self) -> String {
        format!(
            "{}\nIndex now holds {} regulation(s), embedded with {} ({})",
            action_success(&format!("Loaded {} regulation(s)", self.loaded)),
            self.indexed_total,
            self.provider,
            self.model
        )
    }
}

pub async fn execute(args: RegulationsArgs, json_mode: bool) -> Result<()> {
    let runtime = CliRuntime::load().await?;
    let ctx = runtime.pipeline.context();

    match args.command {
        RegulationsCommands::Load { file } => {
            let regulations = read_regulations(&file).await?;
            let loaded = load_regulations(ctx.embeddings.as_ref(), ctx.regulations.as_ref(), &regulations).await?;

            let out = RegulationLoadOutput {
                loaded,
                indexed_total: ctx.regulations.count().await?,
                provider: ctx.embeddings.name().to_string(),
                model: ctx.embeddings.model().to_string(),
            };
            output(&out, json_mode);
        }
    }
    Ok(())
}

async fn read_regulations(path: &Path) -> Result<Vec<Regulation>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("{} is not a JSON array of regulations", path.display()))
}

/// Embeds each regulation's text and upserts it into the index.
pub async fn load_regulations(
    embeddings: &dyn EmbeddingProvider,
    index: &dyn RegulationIndex,
    regulations: &[Regulation],
) -> Result<usize> {
    for regulation in regulations {
        let vector = embeddings
            .embed(&regulation.text)
            .await
            .with_context(|| format!("Failed to embed regulation {}", regulation.id))?;
        index.upsert(regulation, &vector).await?;
        tracing::debug!(regulation_id = %regulation.id, "Indexed regulation");
    }
    Ok(regulations.len())
}
