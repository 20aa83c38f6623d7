use crate::error::{EscrowError, Result};
use bitcoin::Network;
use serde::{Deserialize, Serialize};

pub const PASSPHRASE_MIN_LENGTH: usize = 12;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub network: Network,
    pub arbiter_url: String,
    pub passphrase_min_length: usize,
    pub db_file: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: Network::Regtest,
            arbiter_url: "http://localhost:5000".to_string(),
            passphrase_min_length: PASSPHRASE_MIN_LENGTH,
            db_file: "escrow.db".to_string(),
        }
    }
}

impl ClientConfig {
    pub fn new(network: Network) -> Self {
        let mut config = Self::default();
        config.network = network;

        match network {
            Network::Testnet | Network::Signet => {
                config.arbiter_url = "https://arbiter.testnet.local".to_string();
            }
            Network::Regtest => {
                // keep defaults for regtest
            }
            _ => {
                config.arbiter_url = "https://arbiter.local".to_string();
            }
        }

        config
    }

    pub fn validate(&self) -> Result<()> {
        if self.arbiter_url.is_empty() {
            return Err(EscrowError::config("Arbiter URL cannot be empty"));
        }

        if self.passphrase_min_length == 0 {
            return Err(EscrowError::config(
                "Passphrase minimum length must be greater than 0",
            ));
        }

        if self.db_file.is_empty() {
            return Err(EscrowError::config("Database file name cannot be empty"));
        }

        Ok(())
    }

    /// Checks a new passphrase against the configured minimum length.
    pub fn check_passphrase(&self, passphrase: &crate::wallet::Secret) -> Result<()> {
        if passphrase.char_count() < self.passphrase_min_length {
            return Err(EscrowError::config(format!(
                "Passphrase must be at least {} characters",
                self.passphrase_min_length
            )));
        }
        Ok(())
    }
}
