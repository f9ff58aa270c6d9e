//! CLI module for tubesearch.

pub mod commands;
mod output;

pub use output::Output;

use clap::{Parser, Subcommand};

/// tubesearch - semantic search over video transcripts
///
/// Embeds a query, pulls the nearest transcript segments from a vector index,
/// asks a chat model to pick the best one, and links straight to the moment
/// it was said.
#[derive(Parser, Debug)]
#[command(name = "tubesearch")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start the HTTP search API
    Serve {
        /// Host to bind to (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides config)
        #[arg(short, long)]
        port: Option<u16>,

        /// Hex SHA-256 digest of the accepted X-API-Key value
        #[arg(long, env = "API_KEY_HASH", hide_env_values = true)]
        api_key_hash: Option<String>,
    },

    /// Run a single search from the command line
    Search {
        /// Search query
        query: String,

        /// Return up to N ranked matches instead of the single best one
        #[arg(short, long)]
        top: Option<usize>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration file if none exists
    Init,
}
