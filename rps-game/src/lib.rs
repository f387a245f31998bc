//! Rock-Paper-Scissors wager game lifecycle client.
//!
//! Two participants stake the same amount on a ledger contract, each submits
//! a move, and the contract decides the outcome. This crate drives the local
//! participant through create, join, play and handle-timeout, resolving new
//! game ids from confirmed receipts and tracking each game's phase from
//! confirmed events only.

pub mod choice;
pub mod contract;
pub mod error;
pub mod game;
pub mod history;
pub mod invoker;
pub mod orchestrator;
pub mod report;
pub mod resolver;
pub mod tracker;

pub use choice::Choice;
pub use contract::EventTopics;
pub use error::{ErrorKind, GameError, Result};
pub use game::{parse_game_id, Game, GameEvent, GameId, Outcome, Phase};
pub use history::{fetch_game_events, read_game_counter};
pub use invoker::{ContractInvoker, Intent};
pub use orchestrator::GameClient;
pub use report::{ConfirmedFlow, FlowReport};
pub use resolver::GameIdResolver;
pub use tracker::GameTracker;
