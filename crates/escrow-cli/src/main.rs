//! Escrow CLI - milestone escrow simulation driver.
//!
//! Deploys escrow instances on an in-memory ledger and drives them through
//! deposit / approve / cash-in flows, either canned (`demo`) or scripted
//! (`run --file scenario.json`).

use anyhow::Result;
use clap::{Parser, Subcommand};
use escrow_core::{HelloWorld, SimConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

/// Milestone escrow simulation driver.
#[derive(Parser)]
#[command(name = "escrow")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the canonical deposit / approve / cash-in flow
    Demo {
        /// Number of genesis accounts
        #[arg(long, env = "ESCROW_ACCOUNTS")]
        accounts: Option<u32>,

        /// Initial funding per genesis account, in wei
        #[arg(long, env = "ESCROW_FUNDING_WEI")]
        funding_wei: Option<u128>,
    },

    /// Execute a JSON scenario file against a fresh ledger
    Run {
        /// Scenario file path
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Print the Hello World contract greeting
    Greet,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = SimConfig::from_env()?;
    let level = if cli.verbose {
        "debug"
    } else {
        config.log_level.as_str()
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .init();

    match cli.command {
        Commands::Demo {
            accounts,
            funding_wei,
        } => {
            let mut builder = SimConfig::builder()
                .accounts(config.accounts)
                .funding_wei(config.funding_wei)
                .log_level(config.log_level.clone());
            if let Some(accounts) = accounts {
                builder = builder.accounts(accounts);
            }
            if let Some(funding_wei) = funding_wei {
                builder = builder.funding_wei(funding_wei);
            }
            commands::demo::run(&builder.build()?)
        }
        Commands::Run { file } => commands::run::run(&file),
        Commands::Greet => {
            println!("{}", HelloWorld::new().greet());
            Ok(())
        }
    }
}
