use crate::error::Result;
use crate::storage::{EntityStore, Storage};
use crate::types::{Contract, ContractId, Payout, Player, PlayerId, Signatures, TxStatus};
use bitcoin::Amount;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, Row};

const SELECTED_PLAYER_KEY: &str = "selected_player";

fn timestamp(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap_or_else(Utc::now)
}

fn tx_status(row: &Row<'_>, idx: usize) -> rusqlite::Result<TxStatus> {
    let raw: String = row.get(idx)?;
    Ok(TxStatus::parse(&raw).unwrap_or_else(|| {
        tracing::warn!("Unknown tx status '{}' in storage, treating as unbroadcast", raw);
        TxStatus::Unbroadcast
    }))
}

/// Table-level access to persisted players, contracts and payouts.
pub struct RecordStore<'a> {
    storage: &'a Storage,
}

impl<'a> RecordStore<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub async fn list_players(&self) -> Result<Vec<Player>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare("SELECT id, name, picture_url, mine FROM players ORDER BY name")?;
        let player_iter = stmt.query_map([], |row| {
            Ok(Player {
                id: PlayerId(row.get(0)?),
                name: row.get(1)?,
                picture_url: row.get(2)?,
                mine: row.get(3)?,
            })
        })?;

        let mut players = Vec::new();
        for player in player_iter {
            players.push(player?);
        }

        Ok(players)
    }

    pub async fn list_contracts(&self) -> Result<Vec<Contract>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT id, player_one, player_two, amount, description, player_one_sig,
                    player_two_sig, arbiter_sig, funding_tx, created_at
             FROM contracts ORDER BY created_at",
        )?;

        let contract_iter = stmt.query_map([], |row| {
            Ok(Contract {
                id: ContractId(row.get(0)?),
                player_one: PlayerId(row.get(1)?),
                player_two: PlayerId(row.get(2)?),
                amount: Amount::from_sat(row.get::<_, i64>(3)? as u64),
                desc: row.get(4)?,
                sigs: Signatures {
                    player_one: row.get(5)?,
                    player_two: row.get(6)?,
                    arbiter: row.get(7)?,
                },
                funding_tx: tx_status(row, 8)?,
                created_at: timestamp(row.get(9)?),
            })
        })?;

        let mut contracts = Vec::new();
        for contract in contract_iter {
            contracts.push(contract?);
        }

        Ok(contracts)
    }

    pub async fn list_payouts(&self) -> Result<Vec<Payout>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare(
            "SELECT contract_id, p1_amount, p2_amount, player_one_sig, player_two_sig,
                    arbiter_sig, payout_token, payout_tx, created_at
             FROM payouts",
        )?;

        let payout_iter = stmt.query_map([], |row| {
            Ok(Payout {
                contract_id: ContractId(row.get(0)?),
                p1_amount: Amount::from_sat(row.get::<_, i64>(1)? as u64),
                p2_amount: Amount::from_sat(row.get::<_, i64>(2)? as u64),
                sigs: Signatures {
                    player_one: row.get(3)?,
                    player_two: row.get(4)?,
                    arbiter: row.get(5)?,
                },
                payout_token: row.get(6)?,
                payout_tx: tx_status(row, 7)?,
                created_at: timestamp(row.get(8)?),
            })
        })?;

        let mut payouts = Vec::new();
        for payout in payout_iter {
            payouts.push(payout?);
        }

        Ok(payouts)
    }

    pub async fn selected_player(&self) -> Result<Option<PlayerId>> {
        let conn = self.storage.get_connection().await;

        let mut stmt = conn.prepare("SELECT value FROM settings WHERE key = ?1")?;
        let mut rows = stmt.query(params![SELECTED_PLAYER_KEY])?;
        let selected = match rows.next()? {
            Some(row) => Some(PlayerId(row.get(0)?)),
            None => None,
        };

        Ok(selected)
    }

    /// Replaces every persisted entity with the contents of `store`.
    pub async fn replace_all(&self, store: &EntityStore) -> Result<()> {
        let players = store.players();
        let contracts = store.contracts();
        let payouts = store.payouts();
        let selected = store.selected_player();

        let mut conn = self.storage.get_connection().await;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM payouts", [])?;
        tx.execute("DELETE FROM contracts", [])?;
        tx.execute("DELETE FROM players", [])?;
        tx.execute("DELETE FROM settings WHERE key = ?1", params![SELECTED_PLAYER_KEY])?;

        for player in &players {
            insert_player(&tx, player)?;
        }
        for contract in &contracts {
            insert_contract(&tx, contract)?;
        }
        for payout in &payouts {
            insert_payout(&tx, payout)?;
        }
        if let Some(id) = selected {
            tx.execute(
                "INSERT INTO settings (key, value) VALUES (?1, ?2)",
                params![SELECTED_PLAYER_KEY, id.as_str()],
            )?;
        }

        tx.commit()?;
        tracing::debug!(
            "Persisted {} players, {} contracts, {} payouts",
            players.len(),
            contracts.len(),
            payouts.len()
        );
        Ok(())
    }
}

fn insert_player(conn: &Connection, player: &Player) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT OR REPLACE INTO players (id, name, picture_url, mine) VALUES (?1, ?2, ?3, ?4)",
        params![player.id.as_str(), player.name, player.picture_url, player.mine],
    )
}

fn insert_contract(conn: &Connection, contract: &Contract) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT OR REPLACE INTO contracts (id, player_one, player_two, amount, description,
            player_one_sig, player_two_sig, arbiter_sig, funding_tx, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            contract.id.as_str(),
            contract.player_one.as_str(),
            contract.player_two.as_str(),
            contract.amount.to_sat() as i64,
            contract.desc,
            contract.sigs.player_one,
            contract.sigs.player_two,
            contract.sigs.arbiter,
            contract.funding_tx.as_str(),
            contract.created_at.timestamp(),
        ],
    )
}

fn insert_payout(conn: &Connection, payout: &Payout) -> rusqlite::Result<usize> {
    conn.execute(
        "INSERT OR REPLACE INTO payouts (contract_id, p1_amount, p2_amount, player_one_sig,
            player_two_sig, arbiter_sig, payout_token, payout_tx, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            payout.contract_id.as_str(),
            payout.p1_amount.to_sat() as i64,
            payout.p2_amount.to_sat() as i64,
            payout.sigs.player_one,
            payout.sigs.player_two,
            payout.sigs.arbiter,
            payout.payout_token,
            payout.payout_tx.as_str(),
            payout.created_at.timestamp(),
        ],
    )
}

impl EntityStore {
    pub async fn load_from(storage: &Storage) -> Result<Self> {
        let records = RecordStore::new(storage);
        let players = records.list_players().await?;
        let contracts = records.list_contracts().await?;
        let payouts = records.list_payouts().await?;
        let selected = records.selected_player().await?;

        tracing::debug!(
            "Loaded {} players, {} contracts, {} payouts",
            players.len(),
            contracts.len(),
            payouts.len()
        );

        let store = EntityStore::new();
        store.restore(players, contracts, payouts, selected);
        Ok(store)
    }

    pub async fn persist_to(&self, storage: &Storage) -> Result<()> {
        RecordStore::new(storage).replace_all(self).await
    }
}
