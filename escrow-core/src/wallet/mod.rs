pub mod config;
pub mod mock;
pub mod secret;

pub use config::ClientConfig;
pub use mock::MockWallet;
pub use secret::Secret;

use crate::error::{EscrowError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Command interface to the wallet that holds keys, signs and broadcasts.
///
/// Commands are plain strings such as `contract sign <id>`; replies are JSON
/// encoded [`WalletResponse`]s.
#[async_trait]
pub trait WalletBackend: Send + Sync {
    async fn call(&self, command: &str) -> Result<String>;

    async fn call_with_password(&self, command: &str, password: Secret) -> Result<String>;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    Ok,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletResponse {
    pub status: ResponseStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl WalletResponse {
    pub fn ok(data: Option<serde_json::Value>) -> Self {
        Self {
            status: ResponseStatus::Ok,
            message: None,
            data,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: ResponseStatus::Error,
            message: Some(message.into()),
            data: None,
        }
    }

    /// Parses a raw reply, turning an `error` status into `EscrowError::Wallet`.
    pub fn parse(raw: &str) -> Result<Self> {
        let response: WalletResponse = serde_json::from_str(raw)?;
        match response.status {
            ResponseStatus::Ok => Ok(response),
            ResponseStatus::Error => Err(EscrowError::wallet(
                response
                    .message
                    .unwrap_or_else(|| "unknown wallet error".to_string()),
            )),
        }
    }
}
