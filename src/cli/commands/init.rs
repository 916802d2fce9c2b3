//! Implementation of the `compliance-mapper init` command.

use anyhow::{Context, Result};
use clap::Args;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::adapters::sqlite::initialize_database;
use crate::cli::output::{action_success, output, CommandOutput};
use crate::domain::models::{Config, DatabaseConfig};
use crate::infrastructure::config::{ConfigLoader, CONFIG_DIR};

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Force reinitialization even if already initialized
    #[arg(long, short)]
    pub force: bool,

    /// Target directory (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,
}

#[derive(Debug, serde::Serialize)]
pub struct InitOutput {
    pub success: bool,
    pub message: String,
    pub initialized_path: PathBuf,
    pub directories_created: Vec<String>,
    pub config_written: bool,
    pub database_path: Option<String>,
}

impl CommandOutput for InitOutput {
    fn to_human(&self) -> String {
        let mut lines = vec![if self.success {
            action_success(&self.message)
        } else {
            self.message.clone()
        }];
        if !self.directories_created.is_empty() {
            lines.push("\nCreated directories:".to_string());
            for dir in &self.directories_created {
                lines.push(format!("  - {dir}"));
            }
        }
        if self.config_written {
            lines.push(format!("\nDefault configuration written to {CONFIG_DIR}/config.yaml"));
        }
        if let Some(path) = &self.database_path {
            lines.push(format!("Database initialized at {path}"));
        }
        lines.join("\n")
    }
}

pub async fn execute(args: InitArgs, json_mode: bool) -> Result<()> {
    let target_path = if args.path.is_absolute() {
        args.path.clone()
    } else {
        std::env::current_dir()
            .context("Failed to get current directory")?
            .join(&args.path)
    };
    let project_dir = target_path.join(CONFIG_DIR);

    if project_dir.exists() && !args.force {
        let output_data = InitOutput {
            success: false,
            message: "Project already initialized. Use --force to reinitialize.".to_string(),
            initialized_path: target_path,
            directories_created: vec![],
            config_written: false,
            database_path: None,
        };
        output(&output_data, json_mode);
        return Ok(());
    }

    if args.force && project_dir.exists() {
        fs::remove_dir_all(&project_dir)
            .await
            .with_context(|| format!("Failed to remove existing {CONFIG_DIR} directory"))?;
    }

    let defaults = Config::default();
    let mut directories_created = vec![];
    let dirs = [
        project_dir.clone(),
        project_dir.join("logs"),
        target_path.join(&defaults.storage.root),
    ];
    for dir in &dirs {
        if !dir.exists() {
            fs::create_dir_all(dir)
                .await
                .with_context(|| format!("Failed to create {}", dir.display()))?;
            let relative = dir
                .strip_prefix(&target_path)
                .unwrap_or(dir)
                .to_string_lossy()
                .to_string();
            directories_created.push(relative);
        }
    }

    write_default_config(&target_path, &defaults).await?;

    // environment overrides still apply to the database location
    let config = ConfigLoader::load_from_dir(&target_path)?;
    let db_path = resolve(&target_path, &config.database.path);
    initialize_database(&DatabaseConfig {
        path: db_path.to_string_lossy().to_string(),
        ..config.database.clone()
    })
    .await
    .context("Failed to initialize database")?;

    let output_data = InitOutput {
        success: true,
        message: if args.force {
            "Project reinitialized successfully.".to_string()
        } else {
            "Project initialized successfully.".to_string()
        },
        initialized_path: target_path,
        directories_created,
        config_written: true,
        database_path: Some(config.database.path),
    };

    output(&output_data, json_mode);
    Ok(())
}

async fn write_default_config(target_path: &Path, defaults: &Config) -> Result<()> {
    let config_path = ConfigLoader::project_config_path(target_path);
    let content = serde_yaml::to_string(defaults).context("Failed to serialize default configuration")?;
    fs::write(&config_path, content)
        .await
        .with_context(|| format!("Failed to write {}", config_path.display()))?;
    Ok(())
}

fn resolve(root: &Path, path: &str) -> PathBuf {
    let path = Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_creates_project_layout() {
        let dir = tempfile::tempdir().unwrap();
        let args = InitArgs {
            force: false,
            path: dir.path().to_path_buf(),
        };

        temp_env::with_vars_unset(["COMPLIANCE_DATABASE__PATH", "COMPLIANCE_LOGGING__LEVEL"], || {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            runtime.block_on(execute(args, true)).unwrap();
        });

        assert!(dir.path().join(".compliance/config.yaml").exists());
        assert!(dir.path().join(".compliance/compliance.db").exists());
        assert!(dir.path().join(".compliance/blobs").is_dir());

        let config = ConfigLoader::load_from_file(dir.path().join(".compliance/config.yaml")).unwrap();
        assert_eq!(config.storage.raw_bucket, "compliance-docs-raw");
    }

    #[test]
    fn test_resolve_keeps_absolute_paths() {
        let root = Path::new("/srv/project");
        assert_eq!(resolve(root, "/var/db.sqlite"), PathBuf::from("/var/db.sqlite"));
        assert_eq!(resolve(root, "db.sqlite"), PathBuf::from("/srv/project/db.sqlite"));
    }
}
