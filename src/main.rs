//! directory-sync - Synchronizes an upstream user directory into a downstream backend
//!
//! This is the command-line entry point.

use clap::{Parser, Subcommand};
use tokio::signal;
use tracing::{info, warn};

use directory_sync::config::Config;
use directory_sync::models::{BoostReceiver, BoostRequest};
use directory_sync::sync::{build_client, BoostDispatcher, DirectorySync, EmailResolver};
use directory_sync::telemetry::init_tracing;

/// Exit status used when the run is interrupted
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// directory-sync - Synchronizes an upstream user directory into a downstream backend
#[derive(Parser, Debug)]
#[command(name = "directory-sync")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long, env = "DIRECTORY_SYNC_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Enumerate, enrich and dispatch the directory
    Sync {
        /// Maximum number of accounts to sync
        #[arg(long)]
        max_records: Option<usize>,

        /// Correlation id forwarded to the backend
        #[arg(long)]
        correlation_id: Option<String>,
    },

    /// Send a boost to one recipient
    Boost {
        /// Team the boost belongs to
        #[arg(long)]
        team_id: String,

        /// Account id of the actor sending the boost
        #[arg(long)]
        actor: String,

        /// Account id of the recipient
        #[arg(long)]
        receiver_id: String,

        /// Display name of the recipient
        #[arg(long)]
        receiver_name: String,

        /// Number of boosts (default 1)
        #[arg(long)]
        amount: Option<u32>,

        /// Message attached to the boost
        #[arg(long)]
        message: Option<String>,
    },

    /// Look up the email of one account
    Email {
        /// Account id to look up
        #[arg(long)]
        account_id: String,
    },
}

impl Command {
    /// Check only the configuration this command uses
    fn validate(&self, config: &Config) -> Result<(), directory_sync::config::ConfigError> {
        match self {
            Command::Sync { .. } => config.validate(),
            Command::Boost { .. } => config.validate_downstream(),
            Command::Email { .. } => config.validate_upstream(),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = load_config(&args)?;
    args.command
        .validate(&config)
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    init_tracing(&config.logging)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting directory-sync");

    let operation = run(args.command, &config);
    let (report, success) = tokio::select! {
        result = operation => result?,
        _ = signal::ctrl_c() => {
            warn!("Received Ctrl+C, aborting");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    };

    println!("{}", serde_json::to_string_pretty(&report)?);

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

/// Run one command, returning its JSON report and whether it succeeded
async fn run(command: Command, config: &Config) -> anyhow::Result<(serde_json::Value, bool)> {
    match command {
        Command::Sync {
            max_records,
            correlation_id,
        } => {
            let sync = DirectorySync::from_config(config)?;
            let max_records = max_records.unwrap_or_else(|| sync.default_max_records());
            let outcome = sync.sync_directory(max_records, correlation_id).await;
            Ok((serde_json::to_value(&outcome)?, outcome.is_success()))
        }
        Command::Boost {
            team_id,
            actor,
            receiver_id,
            receiver_name,
            amount,
            message,
        } => {
            let dispatcher = BoostDispatcher::from_config(build_client()?, &config.downstream);
            let request = BoostRequest {
                boost_amount: amount,
                message,
                ..BoostRequest::single(
                    team_id,
                    actor,
                    BoostReceiver {
                        account_id: receiver_id,
                        display_name: receiver_name,
                    },
                )
            };
            let outcome = dispatcher.give_boost(request).await;
            Ok((serde_json::to_value(&outcome)?, outcome.is_success()))
        }
        Command::Email { account_id } => {
            let resolver = EmailResolver::from_config(build_client()?, &config.upstream)?;
            let report = resolver.resolve(&account_id).await;
            Ok((serde_json::to_value(&report)?, report.is_ok()))
        }
    }
}

/// Load configuration from file or environment variables
fn load_config(args: &Args) -> anyhow::Result<Config> {
    match &args.config {
        Some(path) => {
            // tracing is not initialized yet
            eprintln!("Loading configuration from file: {}", path);
            Config::from_file(path).map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
        None => {
            eprintln!("Loading configuration from environment variables");
            Config::from_env().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
        }
    }
}
