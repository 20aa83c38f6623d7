use escrow_core::{ClientConfig, EscrowError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CliConfig {
    pub data_dir: PathBuf,
    pub client: ClientConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            client: ClientConfig::default(),
        }
    }
}

pub fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("escrow")
}

impl CliConfig {
    /// Reads `config.json` from the data directory, falling back to defaults
    /// when the file does not exist.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        let client = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            serde_json::from_str(&content)?
        } else {
            ClientConfig::default()
        };
        client.validate()?;

        Ok(Self {
            data_dir: data_dir.to_path_buf(),
            client,
        })
    }

    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        let content = serde_json::to_string_pretty(&self.client)?;
        std::fs::write(self.data_dir.join(CONFIG_FILE), content)?;
        Ok(())
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.client.db_file)
    }
}

pub fn parse_network(network: &str) -> Result<bitcoin::Network> {
    match network.to_lowercase().as_str() {
        "regtest" => Ok(bitcoin::Network::Regtest),
        "signet" => Ok(bitcoin::Network::Signet),
        "testnet" => Ok(bitcoin::Network::Testnet),
        "bitcoin" | "mainnet" => Ok(bitcoin::Network::Bitcoin),
        _ => Err(EscrowError::config(format!(
            "Unknown network '{}'. Use regtest, signet, testnet or bitcoin",
            network
        ))),
    }
}
