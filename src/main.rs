//! tubesearch CLI entry point.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tubesearch::cli::{commands, Cli, Commands};
use tubesearch::config::Settings;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| format!("tubesearch={}", log_level)),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Load configuration
    let config_path = cli.config.as_ref().map(|p| Settings::expand_path(p));
    let settings = Settings::load_from(config_path.as_ref())?;

    match cli.command {
        Commands::Serve { host, port, api_key_hash } => {
            commands::run_serve(host, port, api_key_hash, settings).await?;
        }

        Commands::Search { query, top } => {
            commands::run_search(&query, top, settings).await?;
        }

        Commands::Config { action } => {
            commands::run_config(&action, settings, config_path)?;
        }
    }

    Ok(())
}
