use crate::contract::EventTopics;
use crate::game::{parse_game_id, Game, GameEvent, GameId};
use crate::history::{fetch_game_events, read_game_counter};
use crate::invoker::{ContractInvoker, Intent};
use crate::report::{ConfirmedFlow, FlowReport};
use crate::resolver::GameIdResolver;
use crate::tracker::GameTracker;
use crate::{Choice, GameError, Result};
use parking_lot::{Mutex, RwLock};
use rps_core::{
    from_ledger_units, to_ledger_units, Address, ClientConfig, CoreError, LedgerQuery, Receipt,
    RpcLedger, SignerWallet, TransactionWatcher, TxHash, WalletAdapter, U256,
};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;

/// Drives the local participant through create, join, play and
/// handle-timeout, reconciling the tracker with what the ledger confirms.
///
/// At most one flow runs per game id; different ids proceed concurrently.
/// Tracker records change only after a confirmed receipt.
pub struct GameClient {
    invoker: ContractInvoker,
    watcher: TransactionWatcher,
    ledger: Arc<dyn LedgerQuery>,
    resolver: GameIdResolver,
    topics: EventTopics,
    contract: Address,
    deployment_block: u64,
    tracker: RwLock<GameTracker>,
    in_flight: Mutex<HashSet<GameId>>,
    unresolved: Mutex<HashMap<TxHash, Intent>>,
    deadline: Option<Duration>,
}

/// Marks a game id busy until dropped.
struct FlowGuard<'a> {
    in_flight: &'a Mutex<HashSet<GameId>>,
    game_id: GameId,
}

impl Drop for FlowGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.game_id);
    }
}

impl GameClient {
    pub fn new(
        config: &ClientConfig,
        wallet: Arc<dyn WalletAdapter>,
        ledger: Arc<dyn LedgerQuery>,
    ) -> Self {
        Self {
            invoker: ContractInvoker::new(wallet, config.contract_address),
            watcher: TransactionWatcher::new(ledger.clone(), config),
            ledger,
            resolver: GameIdResolver::new(config.contract_address, config.game_created_topic),
            topics: EventTopics::new(config.game_created_topic),
            contract: config.contract_address,
            deployment_block: config.deployment_block,
            tracker: RwLock::new(GameTracker::new()),
            in_flight: Mutex::new(HashSet::new()),
            unresolved: Mutex::new(HashMap::new()),
            deadline: None,
        }
    }

    /// Client backed by a JSON-RPC node and a local signing key.
    pub fn connect(config: &ClientConfig, private_key: &str) -> Result<Self> {
        config.validate()?;
        let ledger = Arc::new(RpcLedger::connect(config)?);
        let wallet = Arc::new(SignerWallet::connect(config, private_key)?);
        tracing::info!(
            "Connected to {} as {:?}",
            config.rpc_url,
            wallet.account()
        );
        Ok(Self::new(config, wallet, ledger))
    }

    /// Override the watcher's default confirmation deadline for every flow.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_tracker(mut self, tracker: GameTracker) -> Self {
        self.tracker = RwLock::new(tracker);
        self
    }

    pub fn account(&self) -> Address {
        self.invoker.account()
    }

    pub fn contract(&self) -> Address {
        self.contract
    }

    pub fn topics(&self) -> &EventTopics {
        &self.topics
    }

    pub async fn create_game(&self, stake: &str) -> FlowReport<ConfirmedFlow> {
        self.run_create(stake).await.into()
    }

    pub async fn join_game(&self, game_id: &str, stake: &str) -> FlowReport<ConfirmedFlow> {
        self.run_join(game_id, stake).await.into()
    }

    pub async fn play(&self, game_id: &str, choice: Choice) -> FlowReport<ConfirmedFlow> {
        self.run_play(game_id, choice).await.into()
    }

    pub async fn handle_timeout(&self, game_id: &str) -> FlowReport<ConfirmedFlow> {
        self.run_handle_timeout(game_id).await.into()
    }

    /// Re-await a transaction whose earlier watch ended without an outcome
    /// and apply what it was meant to do.
    pub async fn resume(
        &self,
        tx_hash: TxHash,
        deadline: Option<Duration>,
    ) -> FlowReport<ConfirmedFlow> {
        self.run_resume(tx_hash, deadline).await.into()
    }

    /// Replace the local record of a game with one replayed from ledger history.
    pub async fn rebuild(&self, game_id: &str) -> FlowReport<Game> {
        let result = async {
            let game_id = parse_game_id(game_id)?;
            let _guard = self.begin(game_id)?;
            self.rebuild_id(game_id).await
        }
        .await;
        result.into()
    }

    pub async fn game_counter(&self) -> Result<U256> {
        read_game_counter(&*self.ledger, self.contract).await
    }

    /// Rebuild a record from events confirmed earlier, e.g. a local journal.
    pub fn restore(&self, game_id: GameId, events: Vec<GameEvent>) -> Result<Game> {
        self.tracker.write().replay(game_id, events)
    }

    /// Remember a submitted operation whose outcome is still unknown.
    pub fn track_unresolved(&self, tx_hash: TxHash, intent: Intent) {
        self.unresolved.lock().insert(tx_hash, intent);
    }

    pub fn unresolved(&self) -> Vec<(TxHash, Intent)> {
        self.unresolved
            .lock()
            .iter()
            .map(|(tx_hash, intent)| (*tx_hash, intent.clone()))
            .collect()
    }

    pub fn snapshot(&self, game_id: GameId) -> Option<Game> {
        self.tracker.read().snapshot(game_id)
    }

    pub fn games(&self) -> Vec<Game> {
        let tracker = self.tracker.read();
        tracker
            .ids()
            .into_iter()
            .filter_map(|id| tracker.snapshot(id))
            .collect()
    }

    pub fn history(&self, game_id: GameId) -> Vec<GameEvent> {
        self.tracker.read().history(game_id).to_vec()
    }

    async fn run_create(&self, stake: &str) -> Result<ConfirmedFlow> {
        let stake = to_ledger_units(stake)?;
        let intent = Intent::Create { stake };
        let tx_hash = self.invoker.submit(&intent).await?;
        self.finish(tx_hash, &intent, self.deadline).await
    }

    async fn run_join(&self, game_id: &str, stake: &str) -> Result<ConfirmedFlow> {
        let game_id = parse_game_id(game_id)?;
        let stake = to_ledger_units(stake)?;
        let _guard = self.begin(game_id)?;

        if let Some(game) = self.snapshot(game_id) {
            if game.stake() != stake {
                return Err(GameError::validation(format!(
                    "stake must match the game's stake of {}",
                    from_ledger_units(game.stake())
                )));
            }
        }

        let intent = Intent::Join { game_id, stake };
        let tx_hash = self.invoker.submit(&intent).await?;
        self.finish(tx_hash, &intent, self.deadline).await
    }

    async fn run_play(&self, game_id: &str, choice: Choice) -> Result<ConfirmedFlow> {
        let game_id = parse_game_id(game_id)?;
        let _guard = self.begin(game_id)?;

        let intent = Intent::Play { game_id, choice };
        let tx_hash = self.invoker.submit(&intent).await?;
        self.finish(tx_hash, &intent, self.deadline).await
    }

    async fn run_handle_timeout(&self, game_id: &str) -> Result<ConfirmedFlow> {
        let game_id = parse_game_id(game_id)?;
        let _guard = self.begin(game_id)?;

        let intent = Intent::HandleTimeout { game_id };
        let tx_hash = self.invoker.submit(&intent).await?;
        self.finish(tx_hash, &intent, self.deadline).await
    }

    async fn run_resume(&self, tx_hash: TxHash, deadline: Option<Duration>) -> Result<ConfirmedFlow> {
        let intent = self
            .unresolved
            .lock()
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| {
                GameError::validation(format!("no unresolved operation for {:#x}", tx_hash))
            })?;
        let _guard = intent.game_id().map(|id| self.begin(id)).transpose()?;

        tracing::info!("Resuming watch of {:#x} ({})", tx_hash, intent.name());
        self.finish(tx_hash, &intent, deadline.or(self.deadline))
            .await
    }

    fn begin(&self, game_id: GameId) -> Result<FlowGuard<'_>> {
        if !self.in_flight.lock().insert(game_id) {
            return Err(GameError::FlowInProgress(game_id));
        }
        Ok(FlowGuard {
            in_flight: &self.in_flight,
            game_id,
        })
    }

    /// Await the receipt of a submitted intent and fold its outcome into the
    /// tracker.
    async fn finish(
        &self,
        tx_hash: TxHash,
        intent: &Intent,
        deadline: Option<Duration>,
    ) -> Result<ConfirmedFlow> {
        let outcome = self.watcher.await_receipt(tx_hash, deadline).await;
        match &outcome {
            // the operation may still land; keep it so the watch can resume
            Err(CoreError::TimedOutWaiting { .. } | CoreError::Network(_)) => {
                self.unresolved.lock().insert(tx_hash, intent.clone());
            }
            _ => {
                self.unresolved.lock().remove(&tx_hash);
            }
        }
        let receipt = outcome?;

        let game_id = match intent.game_id() {
            Some(id) => id,
            None => self.resolver.resolve(&receipt)?,
        };
        let game = match self.settle(game_id, intent, &receipt).await {
            Ok(game) => game,
            Err(err @ GameError::Unsynced { .. }) => {
                // confirmed, so never submit again; resuming retries the sync
                self.unresolved.lock().insert(tx_hash, intent.clone());
                return Err(err);
            }
            Err(err) => return Err(err),
        };
        tracing::info!(
            "{} confirmed for game {}: {:?}",
            intent.name(),
            game_id,
            game.phase()
        );

        Ok(ConfirmedFlow {
            game_id,
            tx_hash,
            game,
        })
    }

    /// Apply what the receipt confirmed for the game. The intended event is
    /// synthesized only when the receipt does not carry one of its kind.
    async fn settle(&self, game_id: GameId, intent: &Intent, receipt: &Receipt) -> Result<Game> {
        let intended = intent.confirmed_event(self.account());
        let mut events = Vec::new();
        for record in receipt.events.iter().filter(|r| r.address == self.contract) {
            match self.topics.decode(record) {
                Ok(Some((id, event))) if id == game_id => events.push(event),
                Ok(_) => {}
                Err(err) => tracing::warn!(
                    "Skipping undecodable event in {:#x}: {}",
                    receipt.tx_hash,
                    err
                ),
            }
        }

        if !events.iter().any(|event| event.same_kind(&intended)) {
            events.insert(0, intended);
        }

        let tracked = self.tracker.read().contains(game_id);
        if !tracked && !matches!(intent, Intent::Create { .. }) {
            tracing::info!("Game {} is not tracked locally, rebuilding from history", game_id);
            return self
                .rebuild_id(game_id)
                .await
                .map_err(|err| GameError::unsynced(game_id, receipt.tx_hash, err));
        }

        let applied = self.tracker.write().apply_all(game_id, events);
        match applied {
            Ok(game) => Ok(game),
            Err(err @ GameError::InvalidTransition { .. }) => {
                tracing::warn!("Game {} diverged from the ledger: {}", game_id, err);
                if let Err(rebuild_err) = self.rebuild_id(game_id).await {
                    tracing::warn!("Rebuild of game {} failed: {}", game_id, rebuild_err);
                }
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    async fn rebuild_id(&self, game_id: GameId) -> Result<Game> {
        let events = fetch_game_events(
            &*self.ledger,
            self.contract,
            &self.topics,
            game_id,
            self.deployment_block,
        )
        .await?;
        self.tracker.write().replay(game_id, events)
    }
}
