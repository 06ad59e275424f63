use clap::{Parser, Subcommand};
use gcp_readonly::audit::AuditLogger;
use gcp_readonly::config::Config;
use gcp_readonly::gcloud::{GcloudCli, ReadOnlyGateway};
use gcp_readonly::{AppResult, assert_read_only};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Read-only gate for BigQuery SQL and gcloud commands
#[derive(Debug, Parser)]
#[command(name = "gcp-readonly", version)]
struct Cli {
    /// Config file (defaults to ~/.config/gcp-readonly/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Check that a SQL statement is a single read-only query
    Sql {
        /// SQL text to classify
        query: String,
    },
    /// Run a gcloud command through the read-only gate
    Gcloud {
        /// Command tokens, with or without the leading "gcloud"
        #[arg(trailing_var_arg = true, allow_hyphen_values = true, required = true)]
        tokens: Vec<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            match e.kind() {
                Some(kind) => eprintln!("{}: {}", kind, e),
                None => eprintln!("Error: {}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> AppResult<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    match cli.command {
        Commands::Sql { query } => {
            assert_read_only(&query)?;
            println!("OK: read-only query");
            Ok(ExitCode::SUCCESS)
        }
        Commands::Gcloud { tokens } => {
            let mut gateway = ReadOnlyGateway::with_gcloud(GcloudCli::from_config(&config.gcloud));
            if config.audit.enabled {
                let logger = match &config.audit.log_path {
                    Some(path) => AuditLogger::with_path(path),
                    None => AuditLogger::new(),
                }?;
                gateway = gateway.with_audit_logger(logger);
            }

            let response = gateway.run_read_only_command(&tokens).await;
            if response.is_error {
                eprintln!("{}", response.content);
                Ok(ExitCode::FAILURE)
            } else {
                println!("{}", response.content);
                Ok(ExitCode::SUCCESS)
            }
        }
    }
}
