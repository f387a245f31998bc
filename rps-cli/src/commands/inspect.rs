use super::{game_table, print_report, short};
use crate::config::CliConfig;
use crate::journal::Journal;
use anyhow::{bail, Result};
use comfy_table::{presets::UTF8_FULL, Table};
use rps_core::{from_ledger_units, RpcLedger};
use rps_game::{
    fetch_game_events, parse_game_id, read_game_counter, EventTopics, FlowReport, GameError,
    GameTracker,
};

/// Games and unresolved operations from the local journal. No network access.
pub fn show_status(config: &CliConfig, game_id: Option<String>, json: bool) -> Result<bool> {
    let journal = Journal::load(config.journal_path())?;

    if let Some(game_id) = game_id {
        let game_id = parse_game_id(&game_id)?;
        let Some(game) = journal.tracker().snapshot(game_id) else {
            bail!("Game {} is not tracked locally; try 'rps rebuild {}'", game_id, game_id);
        };
        if json {
            println!("{}", serde_json::to_string_pretty(&game)?);
        } else {
            println!("{}", game_table(&game));
        }
        return Ok(true);
    }

    let games = journal.games();
    if json {
        let status = serde_json::json!({
            "games": games,
            "unresolved": journal.unresolved(),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(true);
    }

    if games.is_empty() {
        println!("No games tracked yet");
        println!("Create one with: rps create <stake>");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Game ID", "Phase", "Stake", "Creator", "Opponent"]);
        for game in &games {
            table.add_row(vec![
                game.id().to_string(),
                format!("{:?}", game.phase()),
                from_ledger_units(game.stake()),
                short(game.creator()),
                game.opponent().map(short).unwrap_or_else(|| "-".to_string()),
            ]);
        }
        println!("{}", table);
    }

    if !journal.unresolved().is_empty() {
        println!();
        println!("Operations without a known outcome:");
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Transaction", "Operation", "Game", "Submitted"]);
        for entry in journal.unresolved() {
            table.add_row(vec![
                format!("{:#x}", entry.tx_hash),
                entry.intent.name().to_string(),
                entry
                    .intent
                    .game_id()
                    .map(|id| id.to_string())
                    .unwrap_or_else(|| "new".to_string()),
                entry.recorded_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ]);
        }
        println!("{}", table);
        println!("Resume one with: rps resume <transaction>");
    }

    Ok(true)
}

pub async fn show_counter(config: &CliConfig, json: bool) -> Result<bool> {
    let ledger = RpcLedger::connect(&config.client)?;
    let counter = read_game_counter(&ledger, config.client.contract_address).await?;

    if json {
        println!("{}", serde_json::json!({ "game_counter": counter }));
    } else {
        println!("Games created on this contract: {}", counter);
    }
    Ok(true)
}

/// Replace the journaled record of a game with one replayed from ledger history.
pub async fn rebuild_game(config: &CliConfig, game_id: &str, json: bool) -> Result<bool> {
    let result = async {
        let game_id = parse_game_id(game_id)?;
        let ledger = RpcLedger::connect(&config.client)?;
        let topics = EventTopics::new(config.client.game_created_topic);
        let events = fetch_game_events(
            &ledger,
            config.client.contract_address,
            &topics,
            game_id,
            config.client.deployment_block,
        )
        .await?;
        let game = GameTracker::new().replay(game_id, events.clone())?;
        Ok::<_, GameError>((game, events))
    }
    .await;

    let report = match result {
        Ok((game, events)) => {
            let mut journal = Journal::load(config.journal_path())?;
            journal.record_game(game.id(), events);
            journal.save()?;
            FlowReport::success(game)
        }
        Err(e) => FlowReport::from(Err(e)),
    };

    print_report(&report, json, |game| {
        println!("Rebuilt from ledger history");
        println!("{}", game_table(game));
    })
}
