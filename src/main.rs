//! path-relay: forward HTTP/HTTPS relay.
//!
//! # Architecture Overview
//!
//! ```text
//!                          ┌──────────────────────────────────────────────────┐
//!                          │                    PATH RELAY                     │
//!                          │                                                   │
//!  GET /proxy/https://t/x  │  ┌─────────┐   ┌──────────┐   ┌──────────────┐   │
//!  ────────────────────────┼─▶│  http   │──▶│  relay   │──▶│    relay     │───┼──▶ Target
//!                          │  │ server  │   │  target  │   │    engine    │   │
//!                          │  └─────────┘   └────┬─────┘   └──────┬───────┘   │
//!                          │                     │ 400          │ 502/504   │
//!  ◀───────────────────────┼─────────────────────┴──────────────┘ or stream ◀─┼─── Response
//!                          │                                                   │
//!                          │  ┌─────────────────────────────────────────────┐ │
//!                          │  │  config · observability · security ·        │ │
//!                          │  │  lifecycle · net (in-flight tracking)       │ │
//!                          │  └─────────────────────────────────────────────┘ │
//!                          └──────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;

use path_relay::config::loader::load_or_default;
use path_relay::config::validation::validate_config;
use path_relay::config::loader::ConfigError;
use path_relay::lifecycle::startup;
use path_relay::observability::logging::init_logging;

#[derive(Parser)]
#[command(name = "path-relay")]
#[command(version, about = "Forward HTTP/HTTPS relay: /proxy/<target-url>", long_about = None)]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long, env = "RELAY_CONFIG")]
    config: Option<PathBuf>,

    /// Override listener.bind_address.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override observability.log_level (RUST_LOG still wins).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_or_default(cli.config.as_deref())?;
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    validate_config(&config).map_err(ConfigError::Validation)?;

    init_logging(&config.observability);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        config = ?cli.config,
        bind_address = %config.listener.bind_address,
        prefix = %config.relay.prefix,
        "path-relay starting"
    );

    startup::run(config).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
