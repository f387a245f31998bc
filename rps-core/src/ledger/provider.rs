use super::{classify_rpc_error, EventQuery, LedgerQuery};
use crate::config::ClientConfig;
use crate::error::{CoreError, Result};
use crate::types::{EventRecord, OperationRequest, Receipt};
use async_trait::async_trait;
use ethers::providers::{Http, Middleware, Provider};
use ethers::types::transaction::eip2718::TypedTransaction;
use ethers::types::{Bytes, Filter, TransactionRequest, TxHash, ValueOrArray};

/// Ledger queries over a JSON-RPC node.
#[derive(Clone)]
pub struct RpcLedger {
    provider: Provider<Http>,
}

impl RpcLedger {
    pub fn connect(config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| CoreError::config(format!("Invalid RPC URL: {}", e)))?
            .interval(config.poll_interval);
        Ok(Self { provider })
    }
}

#[async_trait]
impl LedgerQuery for RpcLedger {
    async fn receipt(&self, tx_hash: TxHash) -> Result<Option<Receipt>> {
        let receipt = self
            .provider
            .get_transaction_receipt(tx_hash)
            .await
            .map_err(|e| classify_rpc_error(&e))?;
        Ok(receipt.map(Receipt::from))
    }

    async fn block_number(&self) -> Result<u64> {
        let number = self
            .provider
            .get_block_number()
            .await
            .map_err(|e| classify_rpc_error(&e))?;
        Ok(number.as_u64())
    }

    async fn read(&self, view: &OperationRequest) -> Result<Bytes> {
        let tx: TypedTransaction = TransactionRequest::new()
            .to(view.contract())
            .data(view.calldata())
            .into();
        self.provider
            .call(&tx, None)
            .await
            .map_err(|e| classify_rpc_error(&e))
    }

    async fn events(&self, query: &EventQuery) -> Result<Vec<EventRecord>> {
        let mut filter = Filter::new()
            .address(query.contract)
            .from_block(query.from_block);
        if !query.signatures.is_empty() {
            filter = filter.topic0(ValueOrArray::Array(
                query.signatures.iter().copied().map(Some).collect(),
            ));
        }
        if let Some(topic) = query.topic1 {
            filter = filter.topic1(ValueOrArray::Value(Some(topic)));
        }

        let logs = self
            .provider
            .get_logs(&filter)
            .await
            .map_err(|e| classify_rpc_error(&e))?;

        let mut records: Vec<EventRecord> = logs.into_iter().map(EventRecord::from).collect();
        records.sort_by_key(|r| (r.block_number, r.log_index));

        tracing::debug!("Fetched {} event records", records.len());
        Ok(records)
    }
}
