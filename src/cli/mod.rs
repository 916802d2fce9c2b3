//! Command-line interface.
//!
//! Every command loads configuration, opens the database and wires the local
//! adapters through [`runtime::CliRuntime`], then prints a [`CommandOutput`]
//! either as text or, with `--json`, as pretty JSON on stdout.

pub mod commands;
pub mod output;
pub mod runtime;

use clap::{Parser, Subcommand};

pub use output::{output, CommandOutput};

use commands::{
    analysis::AnalysisArgs, clauses::ClausesArgs, documents::DocumentsArgs, ingest::IngestArgs, init::InitArgs,
    process::ProcessArgs, regulations::RegulationsArgs, report::ReportArgs, run::RunArgs,
};

#[derive(Parser, Debug)]
#[command(name = "compliance-mapper")]
#[command(about = "Compliance document pipeline: OCR, clause classification, regulation mapping and risk scoring")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the project directory, default config and database
    Init(InitArgs),
    /// Validate and store a document, then request OCR
    Ingest(IngestArgs),
    /// Run one stage for a document, or drive it to completion
    Process(ProcessArgs),
    /// Ingest a document with a prepared OCR result and run the whole pipeline
    Run(RunArgs),
    /// Inspect documents
    Documents(DocumentsArgs),
    /// List the clauses extracted from a document
    Clauses(ClausesArgs),
    /// Show the consolidated risk analysis for a document
    Analysis(AnalysisArgs),
    /// Render a report for an analysis
    Report(ReportArgs),
    /// Manage the regulation index
    Regulations(RegulationsArgs),
}

/// Prints an error and exits with status 1.
pub fn handle_error(err: anyhow::Error, json_mode: bool) -> ! {
    if json_mode {
        let chain: Vec<String> = err.chain().skip(1).map(ToString::to_string).collect();
        let body = serde_json::json!({
            "success": false,
            "error": err.to_string(),
            "causes": chain,
        });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", console::style("Error:").red().bold());
    }
    std::process::exit(1);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_run_command() {
        let cli = Cli::try_parse_from([
            "compliance-mapper",
            "--json",
            "run",
            "contract.pdf",
            "--type",
            "vendor_contract",
            "--ocr",
            "contract.blocks.json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.document_type, "vendor_contract");
                assert_eq!(args.ocr.to_string_lossy(), "contract.blocks.json");
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_documents_list_filters() {
        let cli = Cli::try_parse_from([
            "compliance-mapper",
            "documents",
            "list",
            "--status",
            "failed",
            "--limit",
            "10",
        ])
        .unwrap();
        match cli.command {
            Commands::Documents(args) => match args.command {
                commands::documents::DocumentsCommands::List { status, limit, .. } => {
                    assert_eq!(status.as_deref(), Some("failed"));
                    assert_eq!(limit, 10);
                }
                other => panic!("unexpected subcommand: {other:?}"),
            },
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
