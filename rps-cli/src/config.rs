use anyhow::{Context, Result};
use dialoguer::Password;
use rps_core::{ClientConfig, Network};
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "config.json";
pub const JOURNAL_FILE: &str = "journal.json";
pub const PRIVATE_KEY_ENV: &str = "RPS_PRIVATE_KEY";

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub client: ClientConfig,
}

impl CliConfig {
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("rps")
    }

    /// Explicit `--config` file, else `config.json` in the data directory,
    /// else the preset of `network`. Flags win over file contents.
    pub fn load(
        data_dir: PathBuf,
        config_path: Option<&Path>,
        network: Option<Network>,
        rpc_url: Option<String>,
    ) -> Result<Self> {
        let default_path = data_dir.join(CONFIG_FILE);
        let mut client = match config_path {
            Some(path) => ClientConfig::load(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None if default_path.exists() => ClientConfig::load(&default_path)
                .with_context(|| format!("Failed to load config {}", default_path.display()))?,
            None => ClientConfig::new(network.unwrap_or(Network::Local)),
        };

        if let Some(network) = network {
            if network != client.network {
                let preset = ClientConfig::new(network);
                client.network = network;
                client.rpc_url = preset.rpc_url;
                client.chain_id = preset.chain_id;
            }
        }
        if let Some(rpc_url) = rpc_url {
            client.rpc_url = rpc_url;
        }

        client.validate()?;
        Ok(Self { data_dir, client })
    }

    pub fn journal_path(&self) -> PathBuf {
        self.data_dir.join(JOURNAL_FILE)
    }
}

/// Signing key from the environment, otherwise asked for interactively.
pub fn private_key() -> Result<String> {
    if let Ok(key) = std::env::var(PRIVATE_KEY_ENV) {
        if !key.trim().is_empty() {
            return Ok(key.trim().to_string());
        }
    }

    let key = Password::new()
        .with_prompt("Private key (hex)")
        .interact()
        .context("No private key given")?;
    Ok(key.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_network_preset_without_file() {
        let dir = TempDir::new().unwrap();
        let config =
            CliConfig::load(dir.path().to_path_buf(), None, Some(Network::Sepolia), None).unwrap();

        assert_eq!(config.client.network, Network::Sepolia);
        assert_eq!(config.client.chain_id, 11155111);
        assert_eq!(config.journal_path(), dir.path().join(JOURNAL_FILE));
    }

    #[test]
    fn test_file_in_data_dir_with_flag_override() {
        let dir = TempDir::new().unwrap();
        let mut stored = ClientConfig::default();
        stored.confirmations = 3;
        stored.save(dir.path().join(CONFIG_FILE)).unwrap();

        let config = CliConfig::load(
            dir.path().to_path_buf(),
            None,
            None,
            Some("http://127.0.0.1:9545".to_string()),
        )
        .unwrap();

        assert_eq!(config.client.confirmations, 3);
        assert_eq!(config.client.rpc_url, "http://127.0.0.1:9545");
    }

    #[test]
    fn test_missing_explicit_file_fails() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope.json");
        assert!(CliConfig::load(dir.path().to_path_buf(), Some(&missing), None, None).is_err());
    }
}
