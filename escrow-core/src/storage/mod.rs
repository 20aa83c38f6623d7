pub mod entity_store;
pub mod record_store;

pub use entity_store::{EntityLookup, EntityStore};
pub use record_store::RecordStore;

use crate::error::{EscrowError, Result};
use rusqlite::Connection;
use std::path::Path;
use tokio::sync::Mutex;

pub struct Storage {
    conn: Mutex<Connection>,
}

impl Storage {
    pub async fn new(db_path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = db_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| EscrowError::internal(format!("Failed to create directory: {}", e)))?;
        }

        let conn = Connection::open(db_path)?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    pub async fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let storage = Self {
            conn: Mutex::new(conn),
        };

        storage.init_schema().await?;
        Ok(storage)
    }

    async fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock().await;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS players (
                id TEXT PRIMARY KEY,
                name TEXT NOT NULL,
                picture_url TEXT NOT NULL,
                mine INTEGER NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS contracts (
                id TEXT PRIMARY KEY,
                player_one TEXT NOT NULL,
                player_two TEXT NOT NULL,
                amount INTEGER NOT NULL,
                description TEXT NOT NULL,
                player_one_sig INTEGER NOT NULL,
                player_two_sig INTEGER NOT NULL,
                arbiter_sig INTEGER NOT NULL,
                funding_tx TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )",
            [],
        )?;

        // one payout per contract
        conn.execute(
            "CREATE TABLE IF NOT EXISTS payouts (
                contract_id TEXT PRIMARY KEY,
                p1_amount INTEGER NOT NULL,
                p2_amount INTEGER NOT NULL,
                player_one_sig INTEGER NOT NULL,
                player_two_sig INTEGER NOT NULL,
                arbiter_sig INTEGER NOT NULL,
                payout_token INTEGER NOT NULL,
                payout_tx TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (contract_id) REFERENCES contracts(id)
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                key TEXT PRIMARY KEY,
                value TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    pub async fn get_connection(&self) -> tokio::sync::MutexGuard<'_, Connection> {
        self.conn.lock().await
    }
}
