pub mod toml_config;

pub use toml_config::DispatchConfig;

#[cfg(feature = "cli")]
use clap::{Parser, ValueEnum};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Compact,
    Json,
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "delivery-dispatch")]
#[command(about = "Assigns delivery orders to couriers and moves them across the grid")]
pub struct CliConfig {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "dispatch.toml")]
    pub config: String,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[arg(long, value_enum, default_value = "compact")]
    pub log_format: LogFormat,

    /// Override scheduler.max_ticks from config
    #[arg(long)]
    pub max_ticks: Option<u64>,

    /// Print the final snapshot as JSON
    #[arg(long)]
    pub json: bool,

    /// Validate configuration and show what would run
    #[arg(long)]
    pub dry_run: bool,
}
