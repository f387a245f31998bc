use super::{game_table, print_report};
use crate::config::{private_key, CliConfig};
use crate::journal::Journal;
use anyhow::{anyhow, Result};
use clap::Subcommand;
use rps_core::TxHash;
use rps_game::{Choice, ConfirmedFlow, FlowReport, GameClient, GameError};
use std::str::FromStr;
use std::time::Duration;

#[derive(Subcommand)]
pub enum FlowCommand {
    /// Create a new game with the given stake
    Create {
        /// Stake in native currency units, e.g. 0.01
        stake: String,
    },
    /// Join an open game, matching its stake
    Join {
        /// Game ID to join
        game_id: String,
        /// Stake in native currency units
        stake: String,
    },
    /// Submit your move
    Play {
        /// Game ID
        game_id: String,
        /// rock, paper or scissors
        choice: String,
    },
    /// Close a game whose opponent stopped responding
    Timeout {
        /// Game ID
        game_id: String,
    },
    /// Keep waiting for an operation whose confirmation timed out
    Resume {
        /// Transaction hash printed by the timed-out command
        tx_hash: String,
        /// Seconds to wait before giving up again
        #[arg(short, long)]
        wait: Option<u64>,
    },
}

pub async fn handle_flow_command(cmd: FlowCommand, config: &CliConfig, json: bool) -> Result<bool> {
    let key = private_key()?;
    let client = GameClient::connect(&config.client, &key)?;
    let mut journal = Journal::load(config.journal_path())?;
    journal.restore_into(&client);

    let report = match cmd {
        FlowCommand::Create { stake } => client.create_game(&stake).await,
        FlowCommand::Join { game_id, stake } => client.join_game(&game_id, &stake).await,
        FlowCommand::Play { game_id, choice } => match Choice::from_str(&choice) {
            Ok(choice) => client.play(&game_id, choice).await,
            Err(e) => FlowReport::from(Err::<ConfirmedFlow, GameError>(e)),
        },
        FlowCommand::Timeout { game_id } => client.handle_timeout(&game_id).await,
        FlowCommand::Resume { tx_hash, wait } => {
            let tx_hash = TxHash::from_str(tx_hash.trim())
                .map_err(|_| anyhow!("'{}' is not a transaction hash", tx_hash))?;
            client
                .resume(tx_hash, wait.map(Duration::from_secs))
                .await
        }
    };

    journal.capture(&client);
    journal.save()?;

    print_report(&report, json, |flow| {
        println!("Confirmed in {:#x}", flow.tx_hash);
        println!("{}", game_table(&flow.game));
        if flow.game.creator() == client.account() && flow.game.opponent().is_none() {
            println!();
            println!("Share the game ID with your opponent:");
            println!("rps join {} {}", flow.game_id, rps_core::from_ledger_units(flow.game.stake()));
        }
    })
}
