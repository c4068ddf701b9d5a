//! CLI for looking up names in authority registers
//!
//! Builds a connector from a JSON configuration and prints its answers as
//! JSON, one document per invocation.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use authority_connectors::{
    build_connector, Connector, ConnectorConfig, CustomConnector, Descriptor, ReqwestTransport,
    Transport,
};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "lookup")]
#[command(about = "Query authority registers and reconciliation services")]
struct Cli {
    /// Connector configuration file
    #[arg(long, env = "AUTHORITY_CONFIG")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a name
    Query { key: String },

    /// Render the preview for an id and resolve its identity
    Info { id: String },

    /// Copy a remote record into the local register
    Select { id: String },
}

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,authority_connectors=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let config = ConnectorConfig::from_file(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new());

    match cli.command {
        Commands::Query { key } => cmd_query(config, transport, &key).await,
        Commands::Info { id } => cmd_info(config, transport, &id).await,
        Commands::Select { id } => cmd_select(config, transport, &id).await,
    }
}

fn output(value: serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

// ============================================================================
// Commands
// ============================================================================

async fn cmd_query(config: ConnectorConfig, transport: Arc<dyn Transport>, key: &str) -> Result<()> {
    let connector = build_connector(config, transport).context("Failed to build connector")?;
    connector.ready().await.context("Connector is not available")?;

    let results = connector
        .query(key)
        .await
        .with_context(|| format!("Query for '{}' failed", key))?;

    tracing::info!(register = connector.register(), key, total = results.total_items, "Query finished");
    output(serde_json::to_value(results)?)
}

async fn cmd_info(config: ConnectorConfig, transport: Arc<dyn Transport>, id: &str) -> Result<()> {
    let connector = build_connector(config, transport).context("Failed to build connector")?;
    connector.ready().await.context("Connector is not available")?;

    let mut preview = String::new();
    let Descriptor { id: resolved } = connector
        .info(id, &mut preview)
        .await
        .with_context(|| format!("Info for '{}' failed", id))?;

    output(json!({
        "id": resolved,
        "preview": preview,
    }))
}

async fn cmd_select(config: ConnectorConfig, transport: Arc<dyn Transport>, id: &str) -> Result<()> {
    config.validate()?;
    let ConnectorConfig::Custom(custom) = config else {
        bail!("select needs a custom connector with a local register");
    };
    if !custom.editable {
        bail!("register '{}' is not editable", custom.register);
    }

    let connector = CustomConnector::new(custom, transport).context("Failed to build connector")?;
    connector.ready().await?;

    let record = connector
        .select_id(id)
        .await
        .with_context(|| format!("Failed to select '{}'", id))?;

    output(json!({
        "success": true,
        "record": record,
    }))
}
