use crate::error::{CoreError, Result};
use ethers::types::{Address, H160, H256};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Game contract deployment the client talks to unless configured otherwise.
pub const DEFAULT_CONTRACT_ADDRESS: Address = H160([
    0x58, 0x21, 0xdc, 0x57, 0x20, 0x72, 0xac, 0xe8, 0x80, 0xfb, 0x03, 0x2d, 0xa8, 0xb2, 0xd6, 0xcd,
    0x33, 0x12, 0xde, 0x58,
]);

/// Signature hash (topic 0) of the contract's "game created" event.
pub const DEFAULT_GAME_CREATED_TOPIC: H256 = H256([
    0x8c, 0x5b, 0xe1, 0xe5, 0xeb, 0xec, 0x7d, 0x5b, 0xd1, 0x4f, 0x71, 0x42, 0x7d, 0x1e, 0x84, 0xf3,
    0xdd, 0x03, 0x14, 0xc0, 0xf7, 0xb2, 0x29, 0x1e, 0x5b, 0x20, 0x0a, 0xc8, 0xc7, 0xc3, 0xb9, 0x25,
]);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    Local,
    Sepolia,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub network: Network,
    pub rpc_url: String,
    pub chain_id: u64,
    pub contract_address: Address,
    pub game_created_topic: H256,
    /// First block worth scanning for the contract's events.
    #[serde(default)]
    pub deployment_block: u64,
    /// Blocks required on top of the including block before a receipt counts.
    pub confirmations: u64,
    pub receipt_timeout: Duration,
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: Network::Local,
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: 31337,
            contract_address: DEFAULT_CONTRACT_ADDRESS,
            game_created_topic: DEFAULT_GAME_CREATED_TOPIC,
            deployment_block: 0,
            confirmations: 0,
            receipt_timeout: Duration::from_secs(120),
            poll_interval: Duration::from_secs(2),
        }
    }
}

impl ClientConfig {
    pub fn new(network: Network) -> Self {
        let mut config = Self::default();
        config.network = network;

        match network {
            Network::Local => {
                // keep defaults for a local dev node
            }
            Network::Sepolia => {
                config.rpc_url = "https://rpc.sepolia.org".to_string();
                config.chain_id = 11155111;
                config.confirmations = 1;
                config.receipt_timeout = Duration::from_secs(300);
                config.poll_interval = Duration::from_secs(4);
            }
        }

        config
    }

    /// Read a JSON config file and validate it.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.rpc_url.is_empty() {
            return Err(CoreError::config("RPC URL cannot be empty"));
        }

        if !self.rpc_url.starts_with("http://") && !self.rpc_url.starts_with("https://") {
            return Err(CoreError::config(format!(
                "RPC URL must be http(s): {}",
                self.rpc_url
            )));
        }

        if self.contract_address.is_zero() {
            return Err(CoreError::config("Contract address cannot be zero"));
        }

        if self.game_created_topic.is_zero() {
            return Err(CoreError::config("Game created topic cannot be zero"));
        }

        if self.poll_interval.is_zero() {
            return Err(CoreError::config("Poll interval must be greater than 0"));
        }

        if self.receipt_timeout < self.poll_interval {
            return Err(CoreError::config(
                "Receipt timeout must be at least one poll interval",
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = ClientConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(
            format!("{:#x}", config.contract_address),
            "0x5821dc572072ace880fb032da8b2d6cd3312de58"
        );
    }

    #[test]
    fn test_sepolia_preset() {
        let config = ClientConfig::new(Network::Sepolia);
        assert_eq!(config.chain_id, 11155111);
        assert_eq!(config.confirmations, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_values() {
        let mut config = ClientConfig::default();
        config.rpc_url = "ws://localhost:8546".to_string();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        let mut config = ClientConfig::default();
        config.contract_address = Address::zero();
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));

        let mut config = ClientConfig::default();
        config.receipt_timeout = Duration::from_millis(10);
        assert!(matches!(config.validate(), Err(CoreError::Config(_))));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ClientConfig::new(Network::Sepolia);
        config.rpc_url = "https://sepolia.example.org".to_string();
        config.save(&path).unwrap();

        let loaded = ClientConfig::load(&path).unwrap();
        assert_eq!(loaded.rpc_url, "https://sepolia.example.org");
        assert_eq!(loaded.network, Network::Sepolia);
        assert_eq!(loaded.game_created_topic, DEFAULT_GAME_CREATED_TOPIC);
    }

    #[test]
    fn test_deployment_block_defaults_to_genesis() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = ClientConfig::default();
        config.deployment_block = 5_120_000;
        config.save(&path).unwrap();
        assert_eq!(ClientConfig::load(&path).unwrap().deployment_block, 5_120_000);

        let mut value = serde_json::to_value(ClientConfig::default()).unwrap();
        value.as_object_mut().unwrap().remove("deployment_block");
        std::fs::write(&path, value.to_string()).unwrap();
        assert_eq!(ClientConfig::load(&path).unwrap().deployment_block, 0);
    }
}
