use crate::error::Result;
use crate::wallet::{Secret, WalletBackend, WalletResponse};
use async_trait::async_trait;
use parking_lot::Mutex;

/// In-process wallet that acknowledges every command.
///
/// Used for offline operation and tests. Commands starting with a rejected
/// prefix get an `error` reply instead.
#[derive(Debug, Default)]
pub struct MockWallet {
    commands: Mutex<Vec<String>>,
    rejected: Mutex<Vec<String>>,
}

impl MockWallet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with an error to every command starting with `prefix`.
    pub fn reject(&self, prefix: impl Into<String>) {
        self.rejected.lock().push(prefix.into());
    }

    /// Commands received so far, in order.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().clone()
    }

    fn respond(&self, command: &str) -> Result<String> {
        self.commands.lock().push(command.to_string());

        let response = if self
            .rejected
            .lock()
            .iter()
            .any(|prefix| command.starts_with(prefix.as_str()))
        {
            WalletResponse::error(format!("rejected: {}", command))
        } else {
            WalletResponse::ok(None)
        };

        Ok(serde_json::to_string(&response)?)
    }
}

#[async_trait]
impl WalletBackend for MockWallet {
    async fn call(&self, command: &str) -> Result<String> {
        tracing::debug!("mock wallet: {}", command);
        self.respond(command)
    }

    async fn call_with_password(&self, command: &str, password: Secret) -> Result<String> {
        let empty = password.expose_once(|raw| raw.is_empty());
        tracing::debug!("mock wallet (with password): {}", command);
        if empty {
            self.commands.lock().push(command.to_string());
            return Ok(serde_json::to_string(&WalletResponse::error("empty password"))?);
        }
        self.respond(command)
    }
}
