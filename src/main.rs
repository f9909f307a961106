//! tick-collateral binary entry point.
//!
//! Parses the command line, initialises structured logging, resolves the
//! subgraph secret from the environment, runs the export, and reports the
//! outcome. Exits non-zero on any failure.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use tick_collateral::cli::Cli;
use tick_collateral::config::Config;
use tick_collateral::export::export_tick_collateral;
use tick_collateral::subgraph::SubgraphClient;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let cli = Cli::parse();
    init_logging();

    // Resolve the secret before anything touches the network.
    let config = Config::from_env()?;
    let client = SubgraphClient::new(config.endpoint())?;

    info!(
        tick_id = %cli.tick,
        deployment = config.deployment(),
        output = %cli.output,
        "Retrieving tick collateral data"
    );

    let summary = export_tick_collateral(&client, &cli.tick, &cli.output).await?;

    info!(
        loans = summary.loans,
        rows = summary.rows,
        output = %cli.output,
        "Export complete"
    );

    Ok(())
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("tick_collateral=info"));

    let json_logging = std::env::var("TICK_COLLATERAL_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
