mod config;
mod init;
mod server;

use clap::{Parser, Subcommand};
use hubspoke_core::{validate_topology, Orchestrator, Request};
use rmcp::ServiceExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::server::HubSpokeServer;

#[derive(Parser)]
#[command(name = "hubspoke-mcp", version, about = "Hub-spoke topology synthesis over MCP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Register this server with Claude Code and/or Codex in the current project
    Init,
    /// Synthesize a topology from a request file and print it as JSON
    Synthesize {
        /// Path to the request JSON
        file: PathBuf,
    },
    /// Synthesize and validate a request file, printing the report as JSON
    Validate {
        /// Path to the request JSON
        file: PathBuf,
    },
}

const DEFAULT_FILTER: &str = "hubspoke_core=info,hubspoke_advisor=info,hubspoke_mcp=info";

fn init_logging() {
    let filter = EnvFilter::try_from_env("HUBSPOKE_LOG")
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    // stdout carries the MCP stream
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_request(path: &Path) -> Result<Request, Box<dyn std::error::Error>> {
    let raw = std::fs::read_to_string(path)?;
    let request = Request::from_json(&raw)?;
    request.check_limits()?;
    Ok(request)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    let taxonomy = config::load_taxonomy(&hubspoke_advisor::settings::home_dir());
    let orchestrator = Arc::new(Orchestrator::new(Arc::new(taxonomy)));

    match cli.command {
        Some(Command::Init) => init::init_project(),
        Some(Command::Synthesize { file }) => {
            let request = read_request(&file)?;
            let outcome = orchestrator.execute(&request);
            println!("{}", serde_json::to_string_pretty(&outcome)?);
            if outcome.success {
                Ok(())
            } else {
                Err(outcome.error.unwrap_or_default().into())
            }
        }
        Some(Command::Validate { file }) => {
            let request = read_request(&file)?;
            let topology = orchestrator.run(&request);
            let report = validate_topology(&topology, orchestrator.taxonomy());
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
        None => {
            info!("serving MCP over stdio");
            let service = HubSpokeServer::new(orchestrator)
                .serve(rmcp::transport::io::stdio())
                .await
                .inspect_err(|e| eprintln!("MCP server error: {}", e))?;
            service.waiting().await?;
            Ok(())
        }
    }
}
