//! Ledger plumbing for the RPS wager client.
//!
//! Configuration, stake unit conversion, operation requests, the wallet and
//! ledger seams with their JSON-RPC implementations, and the transaction
//! watcher. Nothing here knows about the game itself.

pub mod config;
pub mod error;
pub mod ledger;
pub mod types;
pub mod units;
pub mod wallet;
pub mod watcher;

#[cfg(any(test, feature = "test-helpers"))]
pub mod testing;

pub use config::{ClientConfig, Network};
pub use error::{CoreError, Result};
pub use ledger::{EventQuery, LedgerQuery, RpcLedger};
pub use types::{EventRecord, OperationRequest, Receipt, TxRecord, TxStatus};
pub use units::{from_ledger_units, to_ledger_units};
pub use wallet::{SignerWallet, WalletAdapter};
pub use watcher::TransactionWatcher;

pub use ethers::abi::Token;
pub use ethers::types::{Address, Bytes, TxHash, H256, U256};
pub use ethers::utils::keccak256;
