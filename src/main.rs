//! compliance-mapper CLI entry point.

use clap::Parser;

use compliance_mapper::cli::{commands, Cli, Commands};
use compliance_mapper::infrastructure::config::ConfigLoader;
use compliance_mapper::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // an unreadable config is reported by the command itself
    let log_config = ConfigLoader::load()
        .map(|config| LogConfig::from(&config.logging))
        .unwrap_or_default();
    let _logger = match LoggerImpl::init(&log_config) {
        Ok(logger) => Some(logger),
        Err(err) => {
            eprintln!("Warning: logging disabled: {err}");
            None
        }
    };

    let result = match cli.command {
        Commands::Init(args) => commands::init::execute(args, cli.json).await,
        Commands::Ingest(args) => commands::ingest::execute(args, cli.json).await,
        Commands::Process(args) => commands::process::execute(args, cli.json).await,
        Commands::Run(args) => commands::run::execute(args, cli.json).await,
        Commands::Documents(args) => commands::documents::execute(args, cli.json).await,
        Commands::Clauses(args) => commands::clauses::execute(args, cli.json).await,
        Commands::Analysis(args) => commands::analysis::execute(args, cli.json).await,
        Commands::Report(args) => commands::report::execute(args, cli.json).await,
        Commands::Regulations(args) => commands::regulations::execute(args, cli.json).await,
    };

    if let Err(err) = result {
        compliance_mapper::cli::handle_error(err, cli.json);
    }
}
