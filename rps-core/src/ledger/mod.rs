pub mod provider;

pub use provider::RpcLedger;

use crate::error::{CoreError, Result};
use crate::types::{EventRecord, OperationRequest, Receipt};
use async_trait::async_trait;
use ethers::providers::MiddlewareError;
use ethers::types::{Address, Bytes, TxHash, H256};

/// Read-only access to ledger state.
#[async_trait]
pub trait LedgerQuery: Send + Sync {
    /// Receipt of an included transaction, `None` while it is still pending.
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>>;

    async fn block_number(&self) -> Result<u64>;

    /// Evaluate a view call against the latest state and return its raw output.
    async fn read(&self, view: &OperationRequest) -> Result<Bytes>;

    /// Confirmed event records matching `query`, oldest first.
    async fn events(&self, query: &EventQuery) -> Result<Vec<EventRecord>>;
}

/// Log filter over one contract.
#[derive(Debug, Clone, PartialEq)]
pub struct EventQuery {
    pub contract: Address,
    /// Accepted event signatures; empty matches any.
    pub signatures: Vec<H256>,
    /// Required first indexed field.
    pub topic1: Option<H256>,
    pub from_block: u64,
}

impl EventQuery {
    pub fn new(contract: Address) -> Self {
        Self {
            contract,
            signatures: Vec::new(),
            topic1: None,
            from_block: 0,
        }
    }

    pub fn signatures(mut self, signatures: impl IntoIterator<Item = H256>) -> Self {
        self.signatures = signatures.into_iter().collect();
        self
    }

    pub fn topic1(mut self, topic: H256) -> Self {
        self.topic1 = Some(topic);
        self
    }

    pub fn from_block(mut self, block: u64) -> Self {
        self.from_block = block;
        self
    }

    pub fn matches(&self, record: &EventRecord) -> bool {
        record.address == self.contract
            && record.block_number.unwrap_or(0) >= self.from_block
            && (self.signatures.is_empty()
                || record
                    .signature()
                    .map_or(false, |sig| self.signatures.contains(&sig)))
            && self
                .topic1
                .map_or(true, |topic| record.topics.get(1) == Some(&topic))
    }
}

fn is_user_rejection(message: &str) -> bool {
    let message = message.to_lowercase();
    message.contains("user rejected") || message.contains("user denied")
}

/// Sort a JSON-RPC failure into the client's error kinds.
pub(crate) fn classify_rpc_error<E: MiddlewareError>(err: &E) -> CoreError {
    if let Some(response) = err.as_error_response() {
        if response.code == 4001 || is_user_rejection(&response.message) {
            return CoreError::wallet_rejection(response.message.clone());
        }
        if response.message.to_lowercase().contains("revert") {
            // rejected while estimating gas, nothing was broadcast
            return CoreError::reverted(None, response.message.clone());
        }
    }
    CoreError::network(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::providers::{HttpClientError, JsonRpcError, ProviderError};

    fn record(address: Address, topics: Vec<H256>, block: u64) -> EventRecord {
        let mut record = EventRecord::new(address, topics, Vec::new());
        record.block_number = Some(block);
        record
    }

    #[test]
    fn test_query_matching() {
        let contract = Address::repeat_byte(0xaa);
        let sig = H256::repeat_byte(0x01);
        let id = H256::from_low_u64_be(7);

        let query = EventQuery::new(contract)
            .signatures([sig])
            .topic1(id)
            .from_block(10);

        assert!(query.matches(&record(contract, vec![sig, id], 10)));
        assert!(!query.matches(&record(contract, vec![sig, id], 9)));
        assert!(!query.matches(&record(contract, vec![sig], 12)));
        assert!(!query.matches(&record(contract, vec![H256::zero(), id], 12)));
        assert!(!query.matches(&record(Address::zero(), vec![sig, id], 12)));
    }

    #[test]
    fn test_user_rejection_messages() {
        assert!(is_user_rejection("MetaMask: User denied transaction signature"));
        assert!(is_user_rejection("user rejected the request"));
        assert!(!is_user_rejection("insufficient funds for gas"));
    }

    fn rpc_failure(code: i64, message: &str) -> ProviderError {
        ProviderError::JsonRpcClientError(Box::new(HttpClientError::JsonRpcError(JsonRpcError {
            code,
            message: message.to_string(),
            data: None,
        })))
    }

    #[test]
    fn test_classify_wallet_rejection() {
        let err = classify_rpc_error(&rpc_failure(4001, "request rejected"));
        assert!(matches!(err, CoreError::WalletRejection(_)));

        let err = classify_rpc_error(&rpc_failure(-32603, "User denied transaction signature"));
        assert!(matches!(err, CoreError::WalletRejection(_)));
    }

    #[test]
    fn test_classify_estimation_revert() {
        let err = classify_rpc_error(&rpc_failure(3, "execution reverted: game already joined"));
        match err {
            CoreError::Reverted { tx_hash, reason } => {
                assert!(tx_hash.is_none());
                assert!(reason.contains("game already joined"));
            }
            other => panic!("expected a revert, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_everything_else_as_network() {
        let err = classify_rpc_error(&rpc_failure(-32000, "insufficient funds for gas"));
        assert!(matches!(err, CoreError::Network(_)));

        let err = classify_rpc_error(&ProviderError::CustomError("connection refused".to_string()));
        assert!(matches!(err, CoreError::Network(_)));
    }
}
