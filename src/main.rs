use anyhow::{Context, Result};
use biomart_gateway::config::{AppConfig, CliConfig, FileConfig, DEFAULT_HOST};
use biomart_gateway::mcp::{create_mcp_state, serve_stdio};
use biomart_gateway::{BiomartHttpService, Gateway};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[clap(version, about = "MCP server exposing a caching gateway over BioMart")]
struct CliArgs {
    /// Path to a TOML config file. Values in the file override CLI flags.
    #[clap(long)]
    pub config: Option<PathBuf>,

    /// BioMart host to query.
    #[clap(long, default_value = DEFAULT_HOST)]
    pub host: String,

    /// Total attempts for a data query, including the first one.
    #[clap(long, default_value_t = 3)]
    pub max_retries: u32,

    /// Seconds to wait between query attempts.
    #[clap(long, default_value_t = 2)]
    pub retry_delay_secs: u64,

    /// Timeout in seconds for a single HTTP request to BioMart.
    #[clap(long, default_value_t = 300)]
    pub request_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    // stdout carries the protocol, diagnostics go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = match &cli_args.config {
        Some(path) => {
            info!("Loading config from {:?}", path);
            Some(FileConfig::load(path)?)
        }
        None => None,
    };

    let cli_config = CliConfig {
        host: cli_args.host,
        max_retries: cli_args.max_retries,
        retry_delay_secs: cli_args.retry_delay_secs,
        request_timeout_secs: cli_args.request_timeout_secs,
    };
    let config = AppConfig::resolve(&cli_config, file_config)?;

    info!(
        "BioMart host {} ({} attempts, {:?} between attempts, {:?} request timeout)",
        config.gateway.host,
        config.gateway.max_attempts,
        config.gateway.retry_delay,
        config.request_timeout
    );

    let service = Arc::new(BiomartHttpService::new(config.request_timeout)?);
    let gateway = Arc::new(Gateway::new(service, &config.gateway));
    let state = Arc::new(create_mcp_state(gateway.clone()));

    info!("Serving MCP on stdio");
    serve_stdio(state)
        .await
        .context("MCP session ended with an I/O error")?;

    let stats = gateway.cache_stats().await;
    info!(
        "Input closed, shutting down ({} cached connections, {} cached translations)",
        stats.connections, stats.translations
    );
    Ok(())
}
