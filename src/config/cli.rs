use clap::{Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "estate-publisher")]
#[command(about = "Publishes listing sites from listing webhooks")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "estate-publisher.toml", global = true)]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output", global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run the webhook HTTP server
    Serve {
        /// Override the port from the configuration file
        #[arg(long)]
        port: Option<u16>,
    },
    /// Run the pipeline once for a single listing and print the result
    Run {
        #[arg(long)]
        estate_id: String,

        #[arg(long, default_value = "estate-added")]
        event: String,
    },
    /// Load and validate the configuration, then exit
    CheckConfig,
}
