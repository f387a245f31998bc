use super::WalletAdapter;
use crate::config::ClientConfig;
use crate::error::{CoreError, Result};
use crate::ledger::classify_rpc_error;
use crate::types::OperationRequest;
use async_trait::async_trait;
use ethers::middleware::signer::SignerMiddlewareError;
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Eip1559TransactionRequest, TxHash};

type Client = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Wallet backed by a local private key, submitting through a JSON-RPC node.
pub struct SignerWallet {
    client: Client,
}

impl SignerWallet {
    pub fn connect(config: &ClientConfig, private_key: &str) -> Result<Self> {
        config.validate()?;

        let provider = Provider::<Http>::try_from(config.rpc_url.as_str())
            .map_err(|e| CoreError::config(format!("Invalid RPC URL: {}", e)))?
            .interval(config.poll_interval);

        let wallet: LocalWallet = private_key
            .trim()
            .trim_start_matches("0x")
            .parse()
            .map_err(|e| CoreError::config(format!("Invalid private key: {}", e)))?;
        let wallet = wallet.with_chain_id(config.chain_id);

        tracing::debug!("Signer wallet ready for {:?}", wallet.address());

        Ok(Self {
            client: SignerMiddleware::new(provider, wallet),
        })
    }
}

fn classify_signer_error(err: SignerMiddlewareError<Provider<Http>, LocalWallet>) -> CoreError {
    match err {
        SignerMiddlewareError::SignerError(e) => CoreError::wallet_rejection(e.to_string()),
        other => classify_rpc_error(&other),
    }
}

#[async_trait]
impl WalletAdapter for SignerWallet {
    fn account(&self) -> Address {
        self.client.address()
    }

    async fn submit(&self, request: &OperationRequest) -> Result<TxHash> {
        let tx = Eip1559TransactionRequest::new()
            .from(self.account())
            .to(request.contract())
            .value(request.attached_stake())
            .data(request.calldata());

        let pending = self
            .client
            .send_transaction(tx, None)
            .await
            .map_err(classify_signer_error)?;
        let tx_hash = pending.tx_hash();

        tracing::info!(
            "Submitted {} from {:?}: {:#x}",
            request.operation(),
            self.account(),
            tx_hash
        );

        Ok(tx_hash)
    }
}
