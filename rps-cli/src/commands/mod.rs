pub mod flow;
pub mod inspect;

pub use flow::{handle_flow_command, FlowCommand};
pub use inspect::{rebuild_game, show_counter, show_status};

use comfy_table::{presets::UTF8_FULL, Table};
use rps_core::{from_ledger_units, Address};
use rps_game::{ErrorKind, FlowReport, Game, Outcome};
use serde::Serialize;

pub(crate) fn short(address: Address) -> String {
    let hex = format!("{:#x}", address);
    format!("{}…{}", &hex[..6], &hex[hex.len() - 4..])
}

pub(crate) fn game_table(game: &Game) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Field", "Value"]);

    let opponent = game.opponent();
    table.add_row(vec!["Game ID".to_string(), game.id().to_string()]);
    table.add_row(vec!["Phase".to_string(), format!("{:?}", game.phase())]);
    table.add_row(vec!["Stake".to_string(), from_ledger_units(game.stake())]);
    table.add_row(vec![
        "Creator".to_string(),
        format!("{:#x} ({})", game.creator(), game.move_of(game.creator())),
    ]);
    table.add_row(vec![
        "Opponent".to_string(),
        match opponent {
            Some(opponent) => format!("{:#x} ({})", opponent, game.move_of(opponent)),
            None => "-".to_string(),
        },
    ]);
    if let Some(outcome) = game.outcome() {
        let outcome = match outcome {
            Outcome::Winner(winner) => format!("{:#x} won", winner),
            Outcome::Draw => "Draw".to_string(),
        };
        table.add_row(vec!["Outcome".to_string(), outcome]);
    }
    table
}

/// Print a flow outcome; `true` when it succeeded.
pub(crate) fn print_report<T: Serialize>(
    report: &FlowReport<T>,
    json: bool,
    render: impl Fn(&T),
) -> anyhow::Result<bool> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(report.ok);
    }

    match (report.data(), &report.message) {
        (Some(data), _) => render(data),
        (None, message) => {
            eprintln!(
                "Error: {}",
                message.as_deref().unwrap_or("operation failed")
            );
            match (report.error_kind, report.tx_hash) {
                (Some(ErrorKind::TimedOutWaiting), Some(tx_hash)) => {
                    eprintln!("The operation may still confirm. Resume the watch with:");
                    eprintln!("rps resume {:#x}", tx_hash);
                }
                (Some(ErrorKind::Unsynced), Some(tx_hash)) => {
                    eprintln!("The operation is confirmed on the ledger; do not submit it again");
                    eprintln!("Update the local record with: rps resume {:#x}", tx_hash);
                }
                (Some(ErrorKind::Network), _) => {
                    eprintln!("The outcome is unknown. See 'rps status' for operations to resume");
                }
                (Some(ErrorKind::InvalidTransition), _) => {
                    eprintln!("Local records disagreed with the ledger and were rebuilt");
                }
                (Some(kind), _) if kind.safe_to_retry() => {
                    eprintln!("Nothing changed on the ledger; the command can be run again");
                }
                _ => {}
            }
        }
    }
    Ok(report.ok)
}
