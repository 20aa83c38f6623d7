//! Escrow core - contracts, payouts and their status engines
//!
//! Two players commit funds to a contract certified by an arbiter, then agree
//! on a payout split. This crate keeps the entities, derives the status that
//! decides which action a client offers next, and drives the signing and
//! broadcast steps through a wallet backend.

pub mod client;
pub mod error;
pub mod status;
pub mod storage;
pub mod types;
pub mod wallet;

pub use client::{EscrowClient, PayoutCredential};
pub use error::{EscrowError, Result};
pub use status::{contract_status, payout_status, ContractAction, ContractStatus, PayoutStatus};
pub use storage::{EntityLookup, EntityStore, Storage};
pub use types::{Contract, ContractId, Payout, Player, PlayerId, Signatures, TxStatus};
pub use wallet::{ClientConfig, MockWallet, Secret, WalletBackend};

pub use ::bitcoin::Amount;
pub use ::bitcoin::Network;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_status_survives_restart() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("escrow.db");
        let contract_id = {
            let storage = Storage::new(&db_path).await.unwrap();
            let store = Arc::new(EntityStore::load_from(&storage).await.unwrap());
            let client = EscrowClient::new(
                store.clone(),
                Arc::new(MockWallet::new()),
                ClientConfig::default(),
            )
            .unwrap();

            let alice = client
                .new_player("alice", Secret::new("a passphrase long enough"))
                .await
                .unwrap();
            let bob = client.add_player("bob").await.unwrap();
            client.select_player(&alice.id).unwrap();
            let contract = client
                .new_contract(&alice.id, &bob.id, Amount::from_sat(5_000), "")
                .await
                .unwrap();
            client
                .sign_contract(&contract.id, Secret::new("a passphrase long enough"))
                .await
                .unwrap();

            store.persist_to(&storage).await.unwrap();
            contract.id
        };

        let storage = Storage::new(&db_path).await.unwrap();
        let store = Arc::new(EntityStore::load_from(&storage).await.unwrap());
        let client =
            EscrowClient::new(store, Arc::new(MockWallet::new()), ClientConfig::default()).unwrap();

        assert_eq!(client.status(&contract_id).unwrap(), ContractStatus::Signed);
    }
}
