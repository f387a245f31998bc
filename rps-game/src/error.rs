use crate::game::{GameId, Phase};
use rps_core::{CoreError, TxHash};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, GameError>;

#[derive(Error, Debug)]
pub enum GameError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Unknown choice value: {0}")]
    UnknownChoice(u64),

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("Invalid transition for game {game_id}: {event} while {phase:?}")]
    InvalidTransition {
        game_id: GameId,
        phase: Option<Phase>,
        event: String,
    },

    #[error("Another operation on game {0} is still in progress")]
    FlowInProgress(GameId),

    #[error("Game {0} is not known")]
    GameNotTracked(GameId),

    /// The operation is on the ledger but the local record could not be
    /// brought up to date. Resuming `tx_hash` retries the update.
    #[error("Confirmed in {tx_hash:#x} but game {game_id} could not be synchronized: {source}")]
    Unsynced {
        game_id: GameId,
        tx_hash: TxHash,
        source: Box<GameError>,
    },
}

impl GameError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn event_not_found(msg: impl Into<String>) -> Self {
        Self::EventNotFound(msg.into())
    }

    pub fn invalid_transition(game_id: GameId, phase: Option<Phase>, event: impl Into<String>) -> Self {
        Self::InvalidTransition {
            game_id,
            phase,
            event: event.into(),
        }
    }

    pub fn unsynced(game_id: GameId, tx_hash: TxHash, source: GameError) -> Self {
        Self::Unsynced {
            game_id,
            tx_hash,
            source: Box::new(source),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Core(core) => match core {
                CoreError::Validation(_) => ErrorKind::Validation,
                CoreError::WalletRejection(_) => ErrorKind::WalletRejection,
                CoreError::Network(_) => ErrorKind::Network,
                CoreError::Reverted { .. } => ErrorKind::Reverted,
                CoreError::TimedOutWaiting { .. } => ErrorKind::TimedOutWaiting,
                CoreError::Config(_) => ErrorKind::Config,
                CoreError::Serialization(_) | CoreError::Io(_) | CoreError::Internal(_) => {
                    ErrorKind::Internal
                }
            },
            Self::Validation(_) | Self::UnknownChoice(_) => ErrorKind::Validation,
            Self::EventNotFound(_) => ErrorKind::EventNotFound,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::FlowInProgress(_) => ErrorKind::FlowInProgress,
            Self::GameNotTracked(_) => ErrorKind::NotTracked,
            Self::Unsynced { .. } => ErrorKind::Unsynced,
        }
    }

    /// Submitted transaction the failure refers to, if any.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::Core(core) => core.tx_hash(),
            Self::Unsynced { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}

/// Flat error classification reported to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    WalletRejection,
    Network,
    Reverted,
    TimedOutWaiting,
    EventNotFound,
    InvalidTransition,
    FlowInProgress,
    NotTracked,
    /// Confirmed on the ledger; only the local record is behind.
    Unsynced,
    Config,
    Internal,
}

impl ErrorKind {
    /// Whether the same flow may simply be started again. A timed-out watch is
    /// excluded: the operation may still confirm, so the watch is resumed instead.
    pub fn safe_to_retry(self) -> bool {
        matches!(
            self,
            Self::Validation | Self::WalletRejection | Self::Reverted | Self::FlowInProgress
        )
    }
}
