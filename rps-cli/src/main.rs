mod commands;
mod config;
mod journal;

use clap::{Parser, Subcommand, ValueEnum};
use config::CliConfig;
use rps_core::Network;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "rps")]
#[command(about = "Rock-Paper-Scissors wagers settled by a ledger contract")]
#[command(version)]
struct Cli {
    /// Data directory for config and the game journal
    #[arg(short, long, global = true)]
    data_dir: Option<PathBuf>,

    /// Config file (defaults to config.json in the data directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Network preset
    #[arg(short, long, global = true, value_enum)]
    network: Option<NetworkArg>,

    /// JSON-RPC endpoint, overrides the config
    #[arg(long, global = true)]
    rpc_url: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum NetworkArg {
    Local,
    Sepolia,
}

impl From<NetworkArg> for Network {
    fn from(arg: NetworkArg) -> Self {
        match arg {
            NetworkArg::Local => Network::Local,
            NetworkArg::Sepolia => Network::Sepolia,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    #[command(flatten)]
    Flow(commands::FlowCommand),
    /// Show tracked games and operations awaiting an outcome
    Status {
        /// Show a single game
        game_id: Option<String>,
    },
    /// Show the contract's game counter
    Counter,
    /// Rebuild a game's record from ledger history
    Rebuild {
        /// Game ID
        game_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(format!(
            "rps={},rps_core={},rps_game={}",
            log_level, log_level, log_level
        )))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let data_dir = cli.data_dir.unwrap_or_else(CliConfig::default_data_dir);
    tokio::fs::create_dir_all(&data_dir).await?;

    let config = CliConfig::load(
        data_dir,
        cli.config.as_deref(),
        cli.network.map(Network::from),
        cli.rpc_url,
    )?;

    let result = match cli.command {
        Commands::Flow(cmd) => commands::handle_flow_command(cmd, &config, cli.json).await,
        Commands::Status { game_id } => commands::show_status(&config, game_id, cli.json),
        Commands::Counter => commands::show_counter(&config, cli.json).await,
        Commands::Rebuild { game_id } => commands::rebuild_game(&config, &game_id, cli.json).await,
    };

    match result {
        Ok(true) => Ok(()),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}
