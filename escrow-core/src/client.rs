use crate::error::{EscrowError, Result};
use crate::status::{contract_status, payout_status, ContractStatus, PayoutStatus};
use crate::storage::EntityStore;
use crate::types::{
    Contract, ContractId, ContractPatch, Payout, PayoutPatch, Player, PlayerId, PlayerRole,
    TxStatus,
};
use crate::wallet::{ClientConfig, Secret, WalletBackend, WalletResponse};
use bitcoin::Amount;
use std::sync::Arc;

/// How the local player authorises a payout signature.
#[derive(Debug)]
pub enum PayoutCredential {
    Password(Secret),
    /// Arbitration token; the payout is marked as token-signed.
    Token(Secret),
}

/// Drives contracts and payouts through their lifecycle.
///
/// Every action checks the current status, sends one command to the wallet
/// and then patches the store. Statuses are never cached; they are derived
/// from the store on each call.
pub struct EscrowClient<W: WalletBackend> {
    store: Arc<EntityStore>,
    wallet: Arc<W>,
    config: ClientConfig,
}

impl<W: WalletBackend> EscrowClient<W> {
    pub fn new(store: Arc<EntityStore>, wallet: Arc<W>, config: ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store,
            wallet,
            config,
        })
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn local_player(&self) -> Result<PlayerId> {
        self.store
            .selected_player()
            .ok_or(EscrowError::NoPlayerSelected)
    }

    pub fn select_player(&self, id: &PlayerId) -> Result<()> {
        self.store.select_player(id)?;
        tracing::info!("Selected local player {}", id);
        Ok(())
    }

    pub fn contract(&self, id: &ContractId) -> Result<Contract> {
        self.store
            .contract(id)
            .ok_or_else(|| EscrowError::ContractNotFound(id.clone()))
    }

    pub fn payout(&self, contract_id: &ContractId) -> Result<Payout> {
        self.store
            .payout_by_contract_id(contract_id)
            .ok_or_else(|| EscrowError::PayoutNotFound(contract_id.clone()))
    }

    pub fn status(&self, id: &ContractId) -> Result<ContractStatus> {
        let local = self.local_player()?;
        let contract = self.contract(id)?;
        Ok(contract_status(&contract, &local, self.store.as_ref()))
    }

    pub fn payout_status(&self, contract_id: &ContractId) -> Result<PayoutStatus> {
        let local = self.local_player()?;
        let payout = self.payout(contract_id)?;
        Ok(payout_status(&payout, &local, self.store.as_ref()))
    }

    async fn run(&self, command: &str) -> Result<WalletResponse> {
        tracing::debug!("wallet command: {}", command);
        let raw = self.wallet.call(command).await?;
        WalletResponse::parse(&raw)
    }

    async fn run_with_secret(&self, command: &str, secret: Secret) -> Result<WalletResponse> {
        tracing::debug!("wallet command (with credential): {}", command);
        let raw = self.wallet.call_with_password(command, secret).await?;
        WalletResponse::parse(&raw)
    }

    fn require_status(&self, id: &ContractId, allowed: &[ContractStatus]) -> Result<ContractStatus> {
        let status = self.status(id)?;
        if !allowed.contains(&status) {
            return Err(EscrowError::invalid_state(format!(
                "contract {} is {:?}, expected one of {:?}",
                id, status, allowed
            )));
        }
        Ok(status)
    }

    fn local_role(&self, contract: &Contract) -> Result<PlayerRole> {
        let local = self.local_player()?;
        contract
            .role_of(&local)
            .ok_or_else(|| EscrowError::NotAParty {
                player: local,
                contract: contract.id.clone(),
            })
    }

    /// Registers a new player whose keys the local wallet holds.
    pub async fn new_player(&self, name: &str, password: Secret) -> Result<Player> {
        self.config.check_passphrase(&password)?;
        self.run_with_secret(&format!("player register \"{}\"", name), password)
            .await?;

        let player = match self.store.player_by_name(name) {
            Some(existing) => {
                self.store.set_player_mine(&existing.id, true)?;
                Player {
                    mine: true,
                    ..existing
                }
            }
            None => {
                let player = Player::new(name, true);
                self.store.add_player(player.clone())?;
                player
            }
        };

        tracing::info!("Registered player {} ({})", player.name, player.id);
        Ok(player)
    }

    /// Adds a remote player known only by name. Adding a name that is
    /// already known returns the existing player.
    pub async fn add_player(&self, name: &str) -> Result<Player> {
        if let Some(existing) = self.store.player_by_name(name) {
            tracing::debug!("Player {} already known as {}", name, existing.id);
            return Ok(existing);
        }
        self.run(&format!("player add \"{}\"", name)).await?;

        let player = Player::new(name, false);
        self.store.add_player(player.clone())?;

        tracing::info!("Added player {} ({})", player.name, player.id);
        Ok(player)
    }

    pub async fn remove_player(&self, id: &PlayerId) -> Result<Player> {
        let player = self
            .store
            .player(id)
            .ok_or_else(|| EscrowError::PlayerNotFound(id.clone()))?;
        self.run(&format!("player remove \"{}\"", player.name)).await?;
        self.store.remove_player(id);

        tracing::info!("Removed player {}", player.name);
        Ok(player)
    }

    pub async fn new_contract(
        &self,
        player_one: &PlayerId,
        player_two: &PlayerId,
        amount: Amount,
        desc: &str,
    ) -> Result<Contract> {
        if player_one == player_two {
            return Err(EscrowError::invalid_state(
                "a contract needs two different players",
            ));
        }
        if amount == Amount::ZERO {
            return Err(EscrowError::invalid_state("contract amount must be positive"));
        }
        let p1 = self
            .store
            .player(player_one)
            .ok_or_else(|| EscrowError::PlayerNotFound(player_one.clone()))?;
        let p2 = self
            .store
            .player(player_two)
            .ok_or_else(|| EscrowError::PlayerNotFound(player_two.clone()))?;

        self.run(&format!(
            "contract new \"{}\" \"{}\" {}",
            p1.name,
            p2.name,
            amount.to_sat()
        ))
        .await?;

        let contract = Contract {
            desc: desc.to_string(),
            ..Contract::new(p1.id, p2.id, amount)
        };
        self.store.add_contract(contract.clone());

        tracing::info!(
            "Created contract {} for {} sats between {} and {}",
            contract.id,
            amount.to_sat(),
            p1.name,
            p2.name
        );
        Ok(contract)
    }

    /// Signs as the local player. Issues an unsigned contract or accepts a
    /// received one.
    pub async fn sign_contract(&self, id: &ContractId, password: Secret) -> Result<Contract> {
        self.require_status(id, &[ContractStatus::Unsigned, ContractStatus::Received])?;
        let contract = self.contract(id)?;
        let role = self.local_role(&contract)?;

        self.run_with_secret(&format!("contract sign {}", id), password)
            .await?;
        let contract = self.store.update_contract(id, ContractPatch::sign(role))?;

        tracing::info!("Player {:?} signed contract {}", role, id);
        Ok(contract)
    }

    pub async fn arbiter_sign_contract(&self, id: &ContractId) -> Result<Contract> {
        self.require_status(id, &[ContractStatus::PlayersSigned])?;

        self.run(&format!(
            "arbiter submit-contract {} {}",
            id, self.config.arbiter_url
        ))
        .await?;
        let contract = self.store.update_contract(
            id,
            ContractPatch {
                arbiter_sig: Some(true),
                ..Default::default()
            },
        )?;

        tracing::info!("Arbiter certified contract {}", id);
        Ok(contract)
    }

    pub async fn broadcast_funding_tx(&self, id: &ContractId) -> Result<Contract> {
        self.require_status(id, &[ContractStatus::Certified])?;

        self.run(&format!("contract broadcast {}", id)).await?;
        let contract = self.store.update_contract(
            id,
            ContractPatch {
                funding_tx: Some(TxStatus::Broadcast),
                ..Default::default()
            },
        )?;

        tracing::info!("Broadcast funding tx for contract {}", id);
        Ok(contract)
    }

    pub async fn confirm_funding_tx(&self, id: &ContractId) -> Result<Contract> {
        self.require_status(id, &[ContractStatus::FundingTxBroadcast])?;

        self.run(&format!("contract confirm {}", id)).await?;
        let contract = self.store.update_contract(
            id,
            ContractPatch {
                funding_tx: Some(TxStatus::Confirmed),
                ..Default::default()
            },
        )?;

        tracing::info!("Funding tx for contract {} confirmed, contract is live", id);
        Ok(contract)
    }

    pub async fn decline_contract(&self, id: &ContractId) -> Result<()> {
        self.require_status(id, &[ContractStatus::Received])?;

        self.run(&format!("contract delete {}", id)).await?;
        self.store.remove_contract(id);

        tracing::info!("Declined contract {}", id);
        Ok(())
    }

    pub async fn dismiss_contract(&self, id: &ContractId) -> Result<()> {
        self.contract(id)?;

        self.run(&format!("contract delete {}", id)).await?;
        self.store.remove_contract(id);

        tracing::info!("Dismissed contract {}", id);
        Ok(())
    }

    /// Proposes a split of a live contract's pot. An invalid payout left on
    /// the contract is replaced.
    pub async fn new_payout(
        &self,
        contract_id: &ContractId,
        p1_amount: Amount,
        p2_amount: Amount,
    ) -> Result<Payout> {
        self.require_status(contract_id, &[ContractStatus::Live])?;
        let contract = self.contract(contract_id)?;

        let total = p1_amount
            .checked_add(p2_amount)
            .ok_or_else(|| EscrowError::invalid_payout("payout amounts overflow"))?;
        if total != contract.amount {
            return Err(EscrowError::invalid_payout(format!(
                "payout of {} sats does not match pot of {} sats",
                total.to_sat(),
                contract.amount.to_sat()
            )));
        }

        self.run(&format!(
            "payout new {} {} {}",
            contract_id,
            p1_amount.to_sat(),
            p2_amount.to_sat()
        ))
        .await?;

        if let Some(stale) = self.store.remove_payout(contract_id) {
            tracing::warn!(
                "Replacing invalid payout on contract {} ({:?})",
                contract_id,
                stale.sigs
            );
        }
        let payout = Payout::new(contract_id.clone(), p1_amount, p2_amount);
        self.store.add_payout(payout.clone())?;

        tracing::info!(
            "Proposed payout on contract {}: {} / {} sats",
            contract_id,
            p1_amount.to_sat(),
            p2_amount.to_sat()
        );
        Ok(payout)
    }

    pub async fn sign_payout(
        &self,
        contract_id: &ContractId,
        credential: PayoutCredential,
    ) -> Result<Payout> {
        self.require_status(
            contract_id,
            &[ContractStatus::PayoutUnsigned, ContractStatus::PayoutReceived],
        )?;
        let contract = self.contract(contract_id)?;
        let role = self.local_role(&contract)?;

        let mut patch = PayoutPatch::sign(role);
        match credential {
            PayoutCredential::Password(password) => {
                self.run_with_secret(&format!("payout sign {}", contract_id), password)
                    .await?;
            }
            PayoutCredential::Token(token) => {
                self.run_with_secret(&format!("payout sign-with-token {}", contract_id), token)
                    .await?;
                patch.payout_token = Some(true);
            }
        }
        let payout = self.store.update_payout(contract_id, patch)?;

        tracing::info!("Player {:?} signed payout for contract {}", role, contract_id);
        Ok(payout)
    }

    /// Sends a token-signed payout to the arbiter for its signature.
    pub async fn arbiter_sign_payout(&self, contract_id: &ContractId) -> Result<Payout> {
        self.require_status(contract_id, &[ContractStatus::PayoutSignedWithToken])?;
        let payout = self.payout(contract_id)?;
        if !payout.payout_token {
            return Err(EscrowError::invalid_payout(
                "arbiter only signs token-signed payouts",
            ));
        }

        self.run(&format!(
            "arbiter submit-payout {} {}",
            contract_id, self.config.arbiter_url
        ))
        .await?;
        let payout = self.store.update_payout(
            contract_id,
            PayoutPatch {
                arbiter_sig: Some(true),
                ..Default::default()
            },
        )?;

        tracing::info!("Arbiter signed payout for contract {}", contract_id);
        Ok(payout)
    }

    pub async fn deny_payout(&self, contract_id: &ContractId) -> Result<()> {
        self.require_status(
            contract_id,
            &[ContractStatus::PayoutReceived, ContractStatus::PayoutUnsigned],
        )?;

        self.run(&format!("payout delete {}", contract_id)).await?;
        self.store.remove_payout(contract_id);

        tracing::info!("Denied payout for contract {}", contract_id);
        Ok(())
    }

    pub async fn broadcast_payout_tx(&self, contract_id: &ContractId) -> Result<Payout> {
        self.require_status(contract_id, &[ContractStatus::PayoutCertified])?;

        self.run(&format!("payout broadcast {}", contract_id)).await?;
        let payout = self.store.update_payout(
            contract_id,
            PayoutPatch {
                payout_tx: Some(TxStatus::Broadcast),
                ..Default::default()
            },
        )?;

        tracing::info!("Broadcast payout tx for contract {}", contract_id);
        Ok(payout)
    }

    pub async fn confirm_payout_tx(&self, contract_id: &ContractId) -> Result<Payout> {
        self.require_status(contract_id, &[ContractStatus::PayoutTxBroadcast])?;

        self.run(&format!("payout confirm {}", contract_id)).await?;
        let payout = self.store.update_payout(
            contract_id,
            PayoutPatch {
                payout_tx: Some(TxStatus::Confirmed),
                ..Default::default()
            },
        )?;

        tracing::info!("Payout for contract {} confirmed, contract resolved", contract_id);
        Ok(payout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wallet::MockWallet;

    const PASSWORD: &str = "a passphrase long enough";

    fn password() -> Secret {
        Secret::new(PASSWORD)
    }

    async fn setup() -> (EscrowClient<MockWallet>, Arc<MockWallet>, Player, Player) {
        let store = Arc::new(EntityStore::new());
        let wallet = Arc::new(MockWallet::new());
        let client = EscrowClient::new(store, wallet.clone(), ClientConfig::default()).unwrap();

        let alice = client.new_player("alice", password()).await.unwrap();
        let bob = client.new_player("bob", password()).await.unwrap();
        client.select_player(&alice.id).unwrap();
        (client, wallet, alice, bob)
    }

    async fn live_contract(
        client: &EscrowClient<MockWallet>,
        alice: &Player,
        bob: &Player,
    ) -> ContractId {
        let contract = client
            .new_contract(&alice.id, &bob.id, Amount::from_sat(100_000), "")
            .await
            .unwrap();
        let id = contract.id;

        client.sign_contract(&id, password()).await.unwrap();
        client.select_player(&bob.id).unwrap();
        client.sign_contract(&id, password()).await.unwrap();
        client.arbiter_sign_contract(&id).await.unwrap();
        client.broadcast_funding_tx(&id).await.unwrap();
        client.confirm_funding_tx(&id).await.unwrap();
        client.select_player(&alice.id).unwrap();
        id
    }

    #[tokio::test]
    async fn test_contract_lifecycle() {
        let (client, _wallet, alice, bob) = setup().await;
        let contract = client
            .new_contract(&alice.id, &bob.id, Amount::from_sat(100_000), "")
            .await
            .unwrap();
        let id = contract.id;
        assert_eq!(client.status(&id).unwrap(), ContractStatus::Unsigned);

        client.sign_contract(&id, password()).await.unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::Signed);

        client.select_player(&bob.id).unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::Received);
        client.sign_contract(&id, password()).await.unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::PlayersSigned);

        client.arbiter_sign_contract(&id).await.unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::Certified);

        client.broadcast_funding_tx(&id).await.unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::FundingTxBroadcast);

        client.confirm_funding_tx(&id).await.unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::Live);
    }

    #[tokio::test]
    async fn test_payout_lifecycle() {
        let (client, _wallet, alice, bob) = setup().await;
        let id = live_contract(&client, &alice, &bob).await;

        client
            .new_payout(&id, Amount::from_sat(70_000), Amount::from_sat(30_000))
            .await
            .unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::PayoutUnsigned);

        client
            .sign_payout(&id, PayoutCredential::Password(password()))
            .await
            .unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::PayoutSigned);

        client.select_player(&bob.id).unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::PayoutReceived);
        client
            .sign_payout(&id, PayoutCredential::Password(password()))
            .await
            .unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::PayoutCertified);

        client.broadcast_payout_tx(&id).await.unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::PayoutTxBroadcast);

        client.confirm_payout_tx(&id).await.unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::Resolved);
        assert_eq!(client.payout_status(&id).unwrap(), PayoutStatus::Resolved);
    }

    #[tokio::test]
    async fn test_token_signed_payout_goes_through_arbiter() {
        let (client, _wallet, alice, bob) = setup().await;
        let id = live_contract(&client, &alice, &bob).await;

        client
            .new_payout(&id, Amount::from_sat(100_000), Amount::ZERO)
            .await
            .unwrap();
        client
            .sign_payout(&id, PayoutCredential::Token(Secret::new("oracle-token")))
            .await
            .unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::PayoutSignedWithToken);

        client.arbiter_sign_payout(&id).await.unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::PayoutCertified);
    }

    #[tokio::test]
    async fn test_arbiter_refuses_plain_signed_payout() {
        let (client, _wallet, alice, bob) = setup().await;
        let id = live_contract(&client, &alice, &bob).await;

        client
            .new_payout(&id, Amount::from_sat(50_000), Amount::from_sat(50_000))
            .await
            .unwrap();
        client
            .sign_payout(&id, PayoutCredential::Password(password()))
            .await
            .unwrap();

        let result = client.arbiter_sign_payout(&id).await;
        assert!(matches!(result, Err(EscrowError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_payout_must_split_the_pot() {
        let (client, _wallet, alice, bob) = setup().await;
        let id = live_contract(&client, &alice, &bob).await;

        let result = client
            .new_payout(&id, Amount::from_sat(60_000), Amount::from_sat(60_000))
            .await;
        assert!(matches!(result, Err(EscrowError::InvalidPayout(_))));
        assert!(client.store().payout_by_contract_id(&id).is_none());
    }

    #[tokio::test]
    async fn test_payout_requires_live_contract() {
        let (client, _wallet, alice, bob) = setup().await;
        let contract = client
            .new_contract(&alice.id, &bob.id, Amount::from_sat(1_000), "")
            .await
            .unwrap();

        let result = client
            .new_payout(&contract.id, Amount::from_sat(500), Amount::from_sat(500))
            .await;
        assert!(matches!(result, Err(EscrowError::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_denied_payout_returns_contract_to_live() {
        let (client, _wallet, alice, bob) = setup().await;
        let id = live_contract(&client, &alice, &bob).await;

        client
            .new_payout(&id, Amount::from_sat(90_000), Amount::from_sat(10_000))
            .await
            .unwrap();
        client
            .sign_payout(&id, PayoutCredential::Password(password()))
            .await
            .unwrap();

        client.select_player(&bob.id).unwrap();
        client.deny_payout(&id).await.unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::Live);
    }

    #[tokio::test]
    async fn test_invalid_payout_is_replaced() {
        let (client, _wallet, alice, bob) = setup().await;
        let id = live_contract(&client, &alice, &bob).await;
        client
            .store()
            .add_payout(Payout {
                sigs: crate::types::Signatures {
                    arbiter: true,
                    ..Default::default()
                },
                ..Payout::new(id.clone(), Amount::from_sat(100_000), Amount::ZERO)
            })
            .unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::Live);

        client
            .new_payout(&id, Amount::from_sat(40_000), Amount::from_sat(60_000))
            .await
            .unwrap();
        assert_eq!(client.status(&id).unwrap(), ContractStatus::PayoutUnsigned);
    }

    #[tokio::test]
    async fn test_outsider_cannot_sign() {
        let (client, _wallet, alice, bob) = setup().await;
        let carol = client.new_player("carol", password()).await.unwrap();
        let contract = client
            .new_contract(&alice.id, &bob.id, Amount::from_sat(1_000), "")
            .await
            .unwrap();

        client.select_player(&carol.id).unwrap();
        let result = client.sign_contract(&contract.id, password()).await;
        assert!(matches!(result, Err(EscrowError::NotAParty { .. })));
    }

    #[tokio::test]
    async fn test_wallet_rejection_leaves_store_untouched() {
        let (client, wallet, alice, bob) = setup().await;
        let contract = client
            .new_contract(&alice.id, &bob.id, Amount::from_sat(1_000), "")
            .await
            .unwrap();
        wallet.reject("contract sign");

        let result = client.sign_contract(&contract.id, password()).await;
        assert!(matches!(result, Err(EscrowError::Wallet(_))));
        assert_eq!(client.status(&contract.id).unwrap(), ContractStatus::Unsigned);
    }

    #[tokio::test]
    async fn test_decline_only_received_contracts() {
        let (client, wallet, alice, bob) = setup().await;
        let contract = client
            .new_contract(&alice.id, &bob.id, Amount::from_sat(1_000), "")
            .await
            .unwrap();
        client.sign_contract(&contract.id, password()).await.unwrap();

        assert!(client.decline_contract(&contract.id).await.is_err());

        client.select_player(&bob.id).unwrap();
        client.decline_contract(&contract.id).await.unwrap();
        assert!(client.store().contract(&contract.id).is_none());
        assert!(wallet
            .commands()
            .contains(&format!("contract delete {}", contract.id)));
    }

    #[tokio::test]
    async fn test_short_passphrase_is_rejected() {
        let store = Arc::new(EntityStore::new());
        let wallet = Arc::new(MockWallet::new());
        let client = EscrowClient::new(store, wallet.clone(), ClientConfig::default()).unwrap();

        let result = client.new_player("dave", Secret::new("short")).await;
        assert!(matches!(result, Err(EscrowError::Config(_))));
        assert!(wallet.commands().is_empty());
    }

    #[tokio::test]
    async fn test_registering_known_player_marks_it_mine() {
        let (client, _wallet, _alice, _bob) = setup().await;
        let erin = client.add_player("erin").await.unwrap();
        assert!(!erin.mine);

        let registered = client.new_player("erin", password()).await.unwrap();
        assert_eq!(registered.id, erin.id);
        assert!(client.store().player(&erin.id).unwrap().mine);
    }

    #[tokio::test]
    async fn test_adding_known_name_returns_existing_player() {
        let (client, wallet, _alice, _bob) = setup().await;
        let first = client.add_player("erin").await.unwrap();
        let second = client.add_player("erin").await.unwrap();

        assert_eq!(first.id, second.id);
        let erins: Vec<_> = client
            .store()
            .players()
            .into_iter()
            .filter(|p| p.name == "erin")
            .collect();
        assert_eq!(erins.len(), 1);
        assert_eq!(client.store().player_by_name("erin").unwrap().id, first.id);
        let adds = wallet
            .commands()
            .iter()
            .filter(|c| c.as_str() == "player add \"erin\"")
            .count();
        assert_eq!(adds, 1);
    }

    #[tokio::test]
    async fn test_new_contract_keeps_description() {
        let (client, _wallet, alice, bob) = setup().await;
        let contract = client
            .new_contract(&alice.id, &bob.id, Amount::from_sat(2_000), "best of three")
            .await
            .unwrap();

        assert_eq!(contract.desc, "best of three");
        assert_eq!(client.contract(&contract.id).unwrap().desc, "best of three");
    }
}
