//! In-memory wallet and ledger for exercising flows without a node.

use crate::error::{CoreError, Result};
use crate::ledger::{EventQuery, LedgerQuery};
use crate::types::{EventRecord, OperationRequest, Receipt};
use crate::wallet::WalletAdapter;
use async_trait::async_trait;
use ethers::types::{Address, Bytes, TxHash, U256};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

/// What happens to the next submitted transaction.
#[derive(Debug, Clone)]
pub enum Inclusion {
    /// Included successfully, emitting these events.
    Confirmed(Vec<EventRecord>),
    /// Included with a failed status.
    Reverted,
    /// Never included until `ScriptedLedger::confirm_pending` is called.
    Pending,
}

#[derive(Default)]
struct LedgerState {
    receipts: HashMap<TxHash, Receipt>,
    pending: HashSet<TxHash>,
    script: VecDeque<Inclusion>,
    history: Vec<EventRecord>,
    block: u64,
    counter: U256,
    reads: usize,
    receipt_polls: usize,
    network_down: bool,
    history_refused: bool,
}

#[derive(Default)]
pub struct ScriptedLedger {
    state: Mutex<LedgerState>,
}

impl ScriptedLedger {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queue the outcome of the next submitted transaction. Unscripted
    /// submissions confirm with no events.
    pub fn script(&self, inclusion: Inclusion) {
        self.state.lock().script.push_back(inclusion);
    }

    pub fn set_counter(&self, counter: u64) {
        self.state.lock().counter = U256::from(counter);
    }

    pub fn set_network_down(&self, down: bool) {
        self.state.lock().network_down = down;
    }

    /// Refuse event queries while receipts and reads keep working, like a
    /// node that limits log ranges.
    pub fn set_history_refused(&self, refused: bool) {
        self.state.lock().history_refused = refused;
    }

    pub fn advance_blocks(&self, blocks: u64) {
        self.state.lock().block += blocks;
    }

    /// Number of view reads served so far.
    pub fn reads(&self) -> usize {
        self.state.lock().reads
    }

    pub fn receipt_polls(&self) -> usize {
        self.state.lock().receipt_polls
    }

    /// Append events that were confirmed outside any scripted submission.
    pub fn record_history(&self, events: Vec<EventRecord>) {
        let mut state = self.state.lock();
        state.block += 1;
        let block = state.block;
        Self::stamp(&mut state, block, events);
    }

    /// Include a transaction previously scripted as `Inclusion::Pending`.
    pub fn confirm_pending(&self, tx_hash: TxHash, from: Address, events: Vec<EventRecord>) {
        let mut state = self.state.lock();
        if state.pending.remove(&tx_hash) {
            Self::include_with(&mut state, tx_hash, from, Inclusion::Confirmed(events));
        }
    }

    pub(crate) fn include(&self, tx_hash: TxHash, from: Address) {
        let mut state = self.state.lock();
        let inclusion = state
            .script
            .pop_front()
            .unwrap_or(Inclusion::Confirmed(Vec::new()));
        Self::include_with(&mut state, tx_hash, from, inclusion);
    }

    fn include_with(state: &mut LedgerState, tx_hash: TxHash, from: Address, inclusion: Inclusion) {
        let (success, events) = match inclusion {
            Inclusion::Pending => {
                state.pending.insert(tx_hash);
                return;
            }
            Inclusion::Reverted => (false, Vec::new()),
            Inclusion::Confirmed(events) => (true, events),
        };

        state.block += 1;
        let block = state.block;
        let events = Self::stamp(state, block, events);
        state.receipts.insert(
            tx_hash,
            Receipt {
                tx_hash,
                from,
                block_number: Some(block),
                success,
                events,
            },
        );
    }

    fn stamp(state: &mut LedgerState, block: u64, events: Vec<EventRecord>) -> Vec<EventRecord> {
        let events: Vec<EventRecord> = events
            .into_iter()
            .enumerate()
            .map(|(index, mut event)| {
                event.block_number = Some(block);
                event.log_index = Some(index as u64);
                event
            })
            .collect();
        state.history.extend(events.iter().cloned());
        events
    }
}

#[async_trait]
impl LedgerQuery for ScriptedLedger {
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>> {
        let mut state = self.state.lock();
        state.receipt_polls += 1;
        if state.network_down {
            return Err(CoreError::network("connection refused"));
        }
        Ok(state.receipts.get(&tx_hash).cloned())
    }

    async fn block_number(&self) -> Result<u64> {
        Ok(self.state.lock().block)
    }

    async fn read(&self, _view: &OperationRequest) -> Result<Bytes> {
        let mut state = self.state.lock();
        if state.network_down {
            return Err(CoreError::network("connection refused"));
        }
        state.reads += 1;
        let mut word = [0u8; 32];
        state.counter.to_big_endian(&mut word);
        Ok(Bytes::from(word.to_vec()))
    }

    async fn events(&self, query: &EventQuery) -> Result<Vec<EventRecord>> {
        let state = self.state.lock();
        if state.network_down {
            return Err(CoreError::network("connection refused"));
        }
        if state.history_refused {
            return Err(CoreError::network("block range too large"));
        }
        Ok(state
            .history
            .iter()
            .filter(|record| query.matches(record))
            .cloned()
            .collect())
    }
}

/// Wallet that includes every submission into a `ScriptedLedger`.
pub struct ScriptedWallet {
    account: Address,
    ledger: Arc<ScriptedLedger>,
    submissions: Mutex<Vec<OperationRequest>>,
    failures: Mutex<VecDeque<CoreError>>,
}

impl ScriptedWallet {
    pub fn new(account: Address, ledger: Arc<ScriptedLedger>) -> Self {
        Self {
            account,
            ledger,
            submissions: Mutex::new(Vec::new()),
            failures: Mutex::new(VecDeque::new()),
        }
    }

    /// Make the next submission fail with `err` before reaching the ledger.
    pub fn fail_next(&self, err: CoreError) {
        self.failures.lock().push_back(err);
    }

    pub fn submissions(&self) -> Vec<OperationRequest> {
        self.submissions.lock().clone()
    }

    fn next_hash(&self, nonce: usize) -> TxHash {
        let mut seed = self.account.as_bytes().to_vec();
        seed.extend_from_slice(&(nonce as u64).to_be_bytes());
        TxHash::from(ethers::utils::keccak256(seed))
    }
}

#[async_trait]
impl WalletAdapter for ScriptedWallet {
    fn account(&self) -> Address {
        self.account
    }

    async fn submit(&self, request: &OperationRequest) -> Result<TxHash> {
        if let Some(err) = self.failures.lock().pop_front() {
            return Err(err);
        }

        let tx_hash = {
            let mut submissions = self.submissions.lock();
            submissions.push(request.clone());
            self.next_hash(submissions.len())
        };
        self.ledger.include(tx_hash, self.account);
        Ok(tx_hash)
    }
}
