mod commands;
mod config;

use clap::{Parser, Subcommand};
use config::CliConfig;
use escrow_core::{EntityStore, EscrowClient, EscrowError, MockWallet, Storage};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "escrow")]
#[command(about = "Arbitrated two-party escrow contracts")]
#[command(version)]
struct Cli {
    /// Data directory for contract storage
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file for a network
    Init {
        /// Bitcoin network (regtest, signet, testnet, bitcoin)
        #[arg(short, long, default_value = "regtest")]
        network: String,
    },

    /// Player management commands
    #[command(subcommand)]
    Player(commands::PlayerCommands),

    /// Contract commands
    #[command(subcommand)]
    Contract(commands::ContractCommands),

    /// Payout commands
    #[command(subcommand)]
    Payout(commands::PayoutCommands),

    /// Choose the local player to manage contracts for
    Select {
        /// Player name
        name: String,
    },

    /// Show all contracts with their status
    Status,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "escrow={},escrow_core={}",
            log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let data_dir = cli.data_dir.unwrap_or_else(config::default_data_dir);
    tokio::fs::create_dir_all(&data_dir).await?;

    if let Err(e) = run(cli.command, &data_dir).await {
        match e {
            EscrowError::NoPlayerSelected => {
                eprintln!("Error: No local player selected");
                eprintln!("Use 'escrow select <name>' to choose one");
            }
            EscrowError::PlayerNotFound(name) => {
                eprintln!("Error: Player '{}' not found", name);
                eprintln!("Use 'escrow player list' to see known players");
            }
            EscrowError::InvalidState(msg) => {
                eprintln!("Error: Action not available: {}", msg);
                eprintln!("Use 'escrow status' to see what to do next");
            }
            _ => {
                eprintln!("Error: {}", e);
            }
        }
        std::process::exit(1);
    }

    Ok(())
}

async fn run(command: Commands, data_dir: &std::path::Path) -> escrow_core::Result<()> {
    if let Commands::Init { network } = &command {
        let network = config::parse_network(network)?;
        let config = CliConfig {
            data_dir: data_dir.to_path_buf(),
            client: escrow_core::ClientConfig::new(network),
        };
        config.save()?;
        println!("Wrote config for {} to {}", network, data_dir.display());
        return Ok(());
    }

    let config = CliConfig::load(data_dir)?;
    let storage = Storage::new(&config.db_path()).await?;
    let store = Arc::new(EntityStore::load_from(&storage).await?);
    tracing::debug!(
        "Opened {} on {}",
        config.db_path().display(),
        config.client.network
    );

    // TODO: talk to a real wallet process once the player wallet exposes its command socket
    let wallet = Arc::new(MockWallet::new());
    let client = EscrowClient::new(store.clone(), wallet, config.client.clone())?;

    match command {
        Commands::Init { .. } => unreachable!("handled above"),
        Commands::Player(cmd) => commands::handle_player_command(cmd, &client).await?,
        Commands::Contract(cmd) => commands::handle_contract_command(cmd, &client).await?,
        Commands::Payout(cmd) => commands::handle_payout_command(cmd, &client).await?,
        Commands::Select { name } => {
            let player = commands::player_by_name(&client, &name)?;
            client.select_player(&player.id)?;
            println!("Selected player '{}'", player.name);
        }
        Commands::Status => commands::show_status(&client)?,
    }

    store.persist_to(&storage).await
}
