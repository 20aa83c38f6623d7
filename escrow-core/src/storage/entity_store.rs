use crate::error::{EscrowError, Result};
use crate::types::{Contract, ContractId, ContractPatch, Payout, PayoutPatch, Player, PlayerId};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// Read access the status engines need to resolve foreign keys.
pub trait EntityLookup {
    fn contract(&self, id: &ContractId) -> Option<Contract>;

    fn payout_by_contract_id(&self, id: &ContractId) -> Option<Payout>;
}

#[derive(Debug, Default)]
struct Entities {
    players: BTreeMap<PlayerId, Player>,
    contracts: BTreeMap<ContractId, Contract>,
    // at most one payout per contract
    payouts: BTreeMap<ContractId, Payout>,
    selected_player: Option<PlayerId>,
}

/// In-memory normalized collections of players, contracts and payouts.
///
/// Every read returns a snapshot of the state at call time; there is no
/// caching, so a status derived after a patch always sees that patch.
#[derive(Debug, Default)]
pub struct EntityStore {
    inner: RwLock<Entities>,
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Player names are unique; lookups by name resolve to exactly one id.
    pub fn add_player(&self, player: Player) -> Result<()> {
        let mut inner = self.inner.write();
        if inner
            .players
            .values()
            .any(|p| p.name == player.name && p.id != player.id)
        {
            return Err(EscrowError::PlayerExists(player.name));
        }
        inner.players.insert(player.id.clone(), player);
        Ok(())
    }

    pub fn player(&self, id: &PlayerId) -> Option<Player> {
        self.inner.read().players.get(id).cloned()
    }

    pub fn player_by_name(&self, name: &str) -> Option<Player> {
        self.inner
            .read()
            .players
            .values()
            .find(|p| p.name == name)
            .cloned()
    }

    pub fn players(&self) -> Vec<Player> {
        self.inner.read().players.values().cloned().collect()
    }

    pub fn set_player_mine(&self, id: &PlayerId, mine: bool) -> Result<()> {
        let mut inner = self.inner.write();
        let player = inner
            .players
            .get_mut(id)
            .ok_or_else(|| EscrowError::PlayerNotFound(id.clone()))?;
        player.mine = mine;
        Ok(())
    }

    pub fn remove_player(&self, id: &PlayerId) -> Option<Player> {
        let mut inner = self.inner.write();
        if inner.selected_player.as_ref() == Some(id) {
            inner.selected_player = None;
        }
        inner.players.remove(id)
    }

    pub fn add_contract(&self, contract: Contract) {
        self.inner
            .write()
            .contracts
            .insert(contract.id.clone(), contract);
    }

    pub fn contract(&self, id: &ContractId) -> Option<Contract> {
        self.inner.read().contracts.get(id).cloned()
    }

    pub fn contracts(&self) -> Vec<Contract> {
        let mut contracts: Vec<Contract> = self.inner.read().contracts.values().cloned().collect();
        contracts.sort_by_key(|c| c.created_at);
        contracts
    }

    pub fn update_contract(&self, id: &ContractId, patch: ContractPatch) -> Result<Contract> {
        let mut inner = self.inner.write();
        let contract = inner
            .contracts
            .get_mut(id)
            .ok_or_else(|| EscrowError::ContractNotFound(id.clone()))?;
        patch.apply(contract);
        Ok(contract.clone())
    }

    /// Removes a contract together with its payout.
    pub fn remove_contract(&self, id: &ContractId) -> Option<Contract> {
        let mut inner = self.inner.write();
        inner.payouts.remove(id);
        inner.contracts.remove(id)
    }

    /// Adds a payout for an existing contract. A contract holds at most one
    /// payout; a second one is rejected.
    pub fn add_payout(&self, payout: Payout) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.contracts.contains_key(&payout.contract_id) {
            return Err(EscrowError::ContractNotFound(payout.contract_id));
        }
        if inner.payouts.contains_key(&payout.contract_id) {
            return Err(EscrowError::PayoutExists(payout.contract_id));
        }
        inner.payouts.insert(payout.contract_id.clone(), payout);
        Ok(())
    }

    pub fn payout_by_contract_id(&self, id: &ContractId) -> Option<Payout> {
        self.inner.read().payouts.get(id).cloned()
    }

    pub fn payouts(&self) -> Vec<Payout> {
        self.inner.read().payouts.values().cloned().collect()
    }

    pub fn update_payout(&self, contract_id: &ContractId, patch: PayoutPatch) -> Result<Payout> {
        let mut inner = self.inner.write();
        let payout = inner
            .payouts
            .get_mut(contract_id)
            .ok_or_else(|| EscrowError::PayoutNotFound(contract_id.clone()))?;
        patch.apply(payout);
        Ok(payout.clone())
    }

    pub fn remove_payout(&self, contract_id: &ContractId) -> Option<Payout> {
        self.inner.write().payouts.remove(contract_id)
    }

    /// Sets the local player the client is managing contracts for.
    pub fn select_player(&self, id: &PlayerId) -> Result<()> {
        let mut inner = self.inner.write();
        if !inner.players.contains_key(id) {
            return Err(EscrowError::PlayerNotFound(id.clone()));
        }
        inner.selected_player = Some(id.clone());
        Ok(())
    }

    pub fn selected_player(&self) -> Option<PlayerId> {
        self.inner.read().selected_player.clone()
    }

    pub(crate) fn restore(
        &self,
        players: Vec<Player>,
        contracts: Vec<Contract>,
        payouts: Vec<Payout>,
        selected_player: Option<PlayerId>,
    ) {
        let players: BTreeMap<PlayerId, Player> =
            players.into_iter().map(|p| (p.id.clone(), p)).collect();
        let contracts: BTreeMap<ContractId, Contract> =
            contracts.into_iter().map(|c| (c.id.clone(), c)).collect();
        let payouts = payouts
            .into_iter()
            .filter(|p| contracts.contains_key(&p.contract_id))
            .map(|p| (p.contract_id.clone(), p))
            .collect();
        let selected_player = selected_player.filter(|id| players.contains_key(id));

        *self.inner.write() = Entities {
            players,
            contracts,
            payouts,
            selected_player,
        };
    }
}

impl EntityLookup for EntityStore {
    fn contract(&self, id: &ContractId) -> Option<Contract> {
        EntityStore::contract(self, id)
    }

    fn payout_by_contract_id(&self, id: &ContractId) -> Option<Payout> {
        EntityStore::payout_by_contract_id(self, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{PlayerRole, TxStatus};
    use bitcoin::Amount;

    fn store_with_contract() -> (EntityStore, Contract) {
        let store = EntityStore::new();
        let alice = Player::new("alice", true);
        let bob = Player::new("bob", false);
        let contract = Contract::new(alice.id.clone(), bob.id.clone(), Amount::from_sat(10_000));
        store.add_player(alice).unwrap();
        store.add_player(bob).unwrap();
        store.add_contract(contract.clone());
        (store, contract)
    }

    #[test]
    fn test_update_contract_applies_patch() {
        let (store, contract) = store_with_contract();

        let updated = store
            .update_contract(&contract.id, ContractPatch::sign(PlayerRole::One))
            .unwrap();

        assert!(updated.sigs.player_one);
        assert_eq!(store.contract(&contract.id).unwrap(), updated);
    }

    #[test]
    fn test_update_missing_contract_fails() {
        let store = EntityStore::new();
        let result = store.update_contract(&ContractId::new("missing"), ContractPatch::default());

        assert!(matches!(result, Err(EscrowError::ContractNotFound(_))));
    }

    #[test]
    fn test_second_payout_is_rejected() {
        let (store, contract) = store_with_contract();
        let payout = Payout::new(contract.id.clone(), Amount::from_sat(5_000), Amount::from_sat(5_000));

        store.add_payout(payout.clone()).unwrap();
        let result = store.add_payout(payout);

        assert!(matches!(result, Err(EscrowError::PayoutExists(_))));
        assert_eq!(store.payouts().len(), 1);
    }

    #[test]
    fn test_orphan_payout_is_rejected() {
        let store = EntityStore::new();
        let payout = Payout::new(ContractId::new("nope"), Amount::ZERO, Amount::ZERO);

        assert!(matches!(
            store.add_payout(payout),
            Err(EscrowError::ContractNotFound(_))
        ));
    }

    #[test]
    fn test_remove_contract_cascades_to_payout() {
        let (store, contract) = store_with_contract();
        store
            .add_payout(Payout::new(contract.id.clone(), Amount::ZERO, Amount::from_sat(10_000)))
            .unwrap();

        assert!(store.remove_contract(&contract.id).is_some());
        assert!(store.payout_by_contract_id(&contract.id).is_none());
        assert!(store.remove_contract(&contract.id).is_none());
    }

    #[test]
    fn test_update_payout() {
        let (store, contract) = store_with_contract();
        store
            .add_payout(Payout::new(contract.id.clone(), Amount::ZERO, Amount::from_sat(10_000)))
            .unwrap();

        let payout = store
            .update_payout(
                &contract.id,
                PayoutPatch {
                    payout_tx: Some(TxStatus::Broadcast),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(payout.payout_tx, TxStatus::Broadcast);
    }

    #[test]
    fn test_select_player() {
        let (store, contract) = store_with_contract();

        assert!(store.select_player(&PlayerId::new("ghost")).is_err());
        store.select_player(&contract.player_one).unwrap();
        assert_eq!(store.selected_player(), Some(contract.player_one.clone()));

        store.remove_player(&contract.player_one);
        assert_eq!(store.selected_player(), None);
    }

    #[test]
    fn test_player_names_are_unique() {
        let (store, _contract) = store_with_contract();
        let existing = store.player_by_name("bob").unwrap();

        let result = store.add_player(Player::new("bob", false));
        assert!(matches!(result, Err(EscrowError::PlayerExists(name)) if name == "bob"));
        assert_eq!(store.players().iter().filter(|p| p.name == "bob").count(), 1);

        // Re-adding the same id is an overwrite, not a duplicate.
        store.add_player(existing.clone()).unwrap();
        assert_eq!(store.player_by_name("bob").unwrap().id, existing.id);
    }
}
