use chrono::{DateTime, Utc};
use ethers::abi::{self, Token};
use ethers::types::{Address, Bytes, Log, TransactionReceipt, TxHash, H256, U256};
use serde::{Deserialize, Serialize};

/// One emitted event as confirmed by the ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRecord {
    pub address: Address,
    pub topics: Vec<H256>,
    pub data: Bytes,
    pub block_number: Option<u64>,
    pub log_index: Option<u64>,
}

impl EventRecord {
    pub fn new(address: Address, topics: Vec<H256>, data: impl Into<Bytes>) -> Self {
        Self {
            address,
            topics,
            data: data.into(),
            block_number: None,
            log_index: None,
        }
    }

    /// Topic 0, the event signature hash.
    pub fn signature(&self) -> Option<H256> {
        self.topics.first().copied()
    }

    /// 32-byte word `index` of the non-indexed payload.
    pub fn data_word(&self, index: usize) -> Option<U256> {
        let start = index * 32;
        self.data
            .get(start..start + 32)
            .map(U256::from_big_endian)
    }
}

impl From<Log> for EventRecord {
    fn from(log: Log) -> Self {
        Self {
            address: log.address,
            topics: log.topics,
            data: log.data,
            block_number: log.block_number.map(|n| n.as_u64()),
            log_index: log.log_index.map(|i| i.low_u64()),
        }
    }
}

/// Confirmed outcome of one submitted operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub from: Address,
    pub block_number: Option<u64>,
    pub success: bool,
    pub events: Vec<EventRecord>,
}

impl From<TransactionReceipt> for Receipt {
    fn from(receipt: TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            from: receipt.from,
            block_number: receipt.block_number.map(|n| n.as_u64()),
            // pre-byzantium receipts carry no status; inclusion means success
            success: receipt.status.map_or(true, |s| !s.is_zero()),
            events: receipt.logs.into_iter().map(EventRecord::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TxStatus {
    Pending,
    Confirmed,
    Reverted,
    TimedOutWaiting,
}

/// Watch state of one submitted operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TxRecord {
    pub handle: TxHash,
    pub status: TxStatus,
    pub receipt: Option<Receipt>,
    pub watch_started: DateTime<Utc>,
}

impl TxRecord {
    pub fn pending(handle: TxHash) -> Self {
        Self {
            handle,
            status: TxStatus::Pending,
            receipt: None,
            watch_started: Utc::now(),
        }
    }
}

/// A contract call ready to hand to a wallet: target function, encoded
/// arguments and the attached stake. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationRequest {
    contract: Address,
    signature: String,
    arguments: Vec<Token>,
    attached_stake: U256,
}

impl OperationRequest {
    /// `signature` is the canonical Solidity form, e.g. `joinGame(uint256)`.
    pub fn new(contract: Address, signature: impl Into<String>, arguments: Vec<Token>) -> Self {
        Self {
            contract,
            signature: signature.into(),
            arguments,
            attached_stake: U256::zero(),
        }
    }

    pub fn with_stake(mut self, stake: U256) -> Self {
        self.attached_stake = stake;
        self
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    /// Function name without the parameter list.
    pub fn operation(&self) -> &str {
        self.signature
            .split_once('(')
            .map_or(self.signature.as_str(), |(name, _)| name)
    }

    pub fn arguments(&self) -> &[Token] {
        &self.arguments
    }

    pub fn attached_stake(&self) -> U256 {
        self.attached_stake
    }

    pub fn selector(&self) -> [u8; 4] {
        ethers::utils::id(&self.signature)
    }

    pub fn calldata(&self) -> Bytes {
        let mut data = self.selector().to_vec();
        data.extend(abi::encode(&self.arguments));
        data.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calldata_layout() {
        let request = OperationRequest::new(
            Address::repeat_byte(0x11),
            "joinGame(uint256)",
            vec![Token::Uint(U256::from(7))],
        )
        .with_stake(U256::from(100));

        let calldata = request.calldata();
        assert_eq!(calldata.len(), 4 + 32);
        assert_eq!(&calldata[..4], &ethers::utils::id("joinGame(uint256)"));
        assert_eq!(calldata[35], 7);
        assert_eq!(request.operation(), "joinGame");
        assert_eq!(request.attached_stake(), U256::from(100));
    }

    #[test]
    fn test_no_argument_call() {
        let request = OperationRequest::new(Address::repeat_byte(0x11), "createGame()", vec![]);
        assert_eq!(request.calldata().len(), 4);
        assert!(request.attached_stake().is_zero());
    }

    #[test]
    fn test_data_word() {
        let mut data = vec![0u8; 64];
        data[31] = 1;
        data[63] = 3;
        let record = EventRecord::new(Address::zero(), vec![H256::zero()], data);
        assert_eq!(record.data_word(0), Some(U256::one()));
        assert_eq!(record.data_word(1), Some(U256::from(3)));
        assert_eq!(record.data_word(2), None);
    }
}
