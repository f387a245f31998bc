use ethers::types::TxHash;
use std::time::Duration;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Wallet rejected the request: {0}")]
    WalletRejection(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Operation reverted: {reason}")]
    Reverted {
        tx_hash: Option<TxHash>,
        reason: String,
    },

    #[error("No confirmation for {tx_hash:#x} within {waited:?}")]
    TimedOutWaiting { tx_hash: TxHash, waited: Duration },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn wallet_rejection(msg: impl Into<String>) -> Self {
        Self::WalletRejection(msg.into())
    }

    pub fn network(msg: impl Into<String>) -> Self {
        Self::Network(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn reverted(tx_hash: Option<TxHash>, reason: impl Into<String>) -> Self {
        Self::Reverted {
            tx_hash,
            reason: reason.into(),
        }
    }

    /// Transaction this error refers to, when one was already submitted.
    pub fn tx_hash(&self) -> Option<TxHash> {
        match self {
            Self::Reverted { tx_hash, .. } => *tx_hash,
            Self::TimedOutWaiting { tx_hash, .. } => Some(*tx_hash),
            _ => None,
        }
    }
}
