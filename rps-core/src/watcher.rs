use crate::config::ClientConfig;
use crate::error::{CoreError, Result};
use crate::ledger::LedgerQuery;
use crate::types::{Receipt, TxRecord, TxStatus};
use ethers::types::TxHash;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

/// Waits for submitted transactions to reach a terminal outcome.
pub struct TransactionWatcher {
    ledger: Arc<dyn LedgerQuery>,
    poll_interval: Duration,
    confirmations: u64,
    default_deadline: Duration,
}

impl TransactionWatcher {
    pub fn new(ledger: Arc<dyn LedgerQuery>, config: &ClientConfig) -> Self {
        Self {
            ledger,
            poll_interval: config.poll_interval,
            confirmations: config.confirmations,
            default_deadline: config.receipt_timeout,
        }
    }

    pub fn default_deadline(&self) -> Duration {
        self.default_deadline
    }

    /// Suspend until `handle` is confirmed, reverted, or `deadline` (default:
    /// the configured receipt timeout) elapses.
    ///
    /// `TimedOutWaiting` means the outcome is unknown, not that it failed.
    pub async fn await_receipt(&self, handle: TxHash, deadline: Option<Duration>) -> Result<Receipt> {
        let deadline = deadline.unwrap_or(self.default_deadline);
        let mut record = TxRecord::pending(handle);

        match time::timeout(deadline, self.poll_until_terminal(&mut record)).await {
            Ok(result) => result,
            Err(_) => {
                record.status = TxStatus::TimedOutWaiting;
                tracing::warn!(
                    "Gave up waiting for {:#x} after {:?} (watch started {})",
                    handle,
                    deadline,
                    record.watch_started
                );
                Err(CoreError::TimedOutWaiting {
                    tx_hash: handle,
                    waited: deadline,
                })
            }
        }
    }

    async fn poll_until_terminal(&self, record: &mut TxRecord) -> Result<Receipt> {
        let mut ticker = time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let Some(receipt) = self.ledger.receipt(record.handle).await? else {
                tracing::debug!("{:#x} still pending", record.handle);
                continue;
            };

            if !receipt.success {
                record.status = TxStatus::Reverted;
                record.receipt = Some(receipt);
                tracing::warn!("{:#x} reverted", record.handle);
                return Err(CoreError::reverted(
                    Some(record.handle),
                    "execution reverted on the ledger",
                ));
            }

            if self.confirmations > 0 {
                let Some(included) = receipt.block_number else {
                    continue;
                };
                let head = self.ledger.block_number().await?;
                if head < included.saturating_add(self.confirmations) {
                    tracing::debug!(
                        "{:#x} included at {}, head {}, waiting for {} confirmations",
                        record.handle,
                        included,
                        head,
                        self.confirmations
                    );
                    continue;
                }
            }

            record.status = TxStatus::Confirmed;
            record.receipt = Some(receipt.clone());
            tracing::info!(
                "{:#x} confirmed in block {:?} with {} events",
                record.handle,
                receipt.block_number,
                receipt.events.len()
            );
            return Ok(receipt);
        }
    }
}
