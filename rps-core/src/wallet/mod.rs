pub mod signer;

pub use signer::SignerWallet;

use crate::error::Result;
use crate::types::OperationRequest;
use async_trait::async_trait;
use ethers::types::{Address, TxHash};

/// Signing identity that submits operations to the ledger.
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// Account operations are signed and submitted from.
    fn account(&self) -> Address;

    /// Sign and broadcast `request`, returning the pending transaction hash.
    ///
    /// Fails with `WalletRejection` when the signer declines and `Network`
    /// when the submission could not reach the ledger.
    async fn submit(&self, request: &OperationRequest) -> Result<TxHash>;
}
