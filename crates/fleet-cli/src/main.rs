//! Operator CLI for Fleet
//!
//! Validates configuration files, checks membership expressions and evaluates
//! group membership for a fleet described in a TOML fixture.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{
    check::{self, CheckArgs},
    config::{self, ConfigCommand},
    evaluate::{self, EvaluateArgs},
};

#[derive(Parser)]
#[command(name = "fleet")]
#[command(about = "Fleet - device groups with static and dynamic membership", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "fleet.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Configuration file operations
    #[command(subcommand)]
    Config(ConfigCommand),

    /// Parse a membership expression and print its canonical form
    Check(CheckArgs),

    /// Evaluate group membership for a fleet fixture
    Evaluate(EvaluateArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = config::load_or_default(&cli.config)?;

    let log_level = if cli.verbose {
        "debug".to_string()
    } else {
        settings.logging.level.clone()
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    match cli.command {
        Commands::Config(cmd) => config::run(cmd, &cli.config)?,
        Commands::Check(args) => check::run(&args)?,
        Commands::Evaluate(args) => evaluate::run(&args, settings).await?,
    }

    Ok(())
}
