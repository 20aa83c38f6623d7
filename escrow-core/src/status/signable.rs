use crate::storage::EntityLookup;
use crate::types::{Contract, ContractId, Payout, PlayerId, Signatures};
use std::borrow::Cow;

/// An entity carrying player and arbiter signatures.
pub trait Signable {
    fn signatures(&self) -> Signatures;

    fn contract_id(&self) -> &ContractId;

    /// The contract whose party roles apply to this signable. `None` if the
    /// contract cannot be resolved.
    fn parent<'a, L>(&'a self, lookup: &L) -> Option<Cow<'a, Contract>>
    where
        L: EntityLookup + ?Sized;
}

impl Signable for Contract {
    fn signatures(&self) -> Signatures {
        self.sigs
    }

    fn contract_id(&self) -> &ContractId {
        &self.id
    }

    fn parent<'a, L>(&'a self, _lookup: &L) -> Option<Cow<'a, Contract>>
    where
        L: EntityLookup + ?Sized,
    {
        Some(Cow::Borrowed(self))
    }
}

impl Signable for Payout {
    fn signatures(&self) -> Signatures {
        self.sigs
    }

    fn contract_id(&self) -> &ContractId {
        &self.contract_id
    }

    fn parent<'a, L>(&'a self, lookup: &L) -> Option<Cow<'a, Contract>>
    where
        L: EntityLookup + ?Sized,
    {
        lookup.contract(&self.contract_id).map(Cow::Owned)
    }
}

/// Whether `party` holds a role on the signable's contract and has signed
/// the signable itself.
///
/// A payout's roles come from its parent contract while its flags come from
/// the payout. If the parent contract is missing this logs and returns
/// `false`.
pub fn is_signed_by<S, L>(signable: &S, party: &PlayerId, lookup: &L) -> bool
where
    S: Signable + ?Sized,
    L: EntityLookup + ?Sized,
{
    let Some(contract) = signable.parent(lookup) else {
        tracing::warn!(
            "Contract {} not found while checking signature of {}",
            signable.contract_id(),
            party
        );
        return false;
    };

    contract
        .role_of(party)
        .map_or(false, |role| signable.signatures().player(role))
}

/// No player and no arbiter has signed.
pub fn is_unsigned<S: Signable + ?Sized>(signable: &S) -> bool {
    signable.signatures().none()
}

/// The counterparty of `party` on `contract`, or `None` if `party` is not on
/// the contract.
pub fn other_party<'a>(party: &PlayerId, contract: &'a Contract) -> Option<&'a PlayerId> {
    if &contract.player_one == party {
        Some(&contract.player_two)
    } else if &contract.player_two == party {
        Some(&contract.player_one)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::EntityStore;
    use bitcoin::Amount;

    fn alice() -> PlayerId {
        PlayerId::new("alice")
    }

    fn bob() -> PlayerId {
        PlayerId::new("bob")
    }

    fn contract() -> Contract {
        Contract::new(alice(), bob(), Amount::from_sat(1_000))
    }

    #[test]
    fn test_contract_signed_by_party() {
        let store = EntityStore::new();
        let mut contract = contract();
        contract.sigs.player_two = true;

        assert!(is_signed_by(&contract, &bob(), &store));
        assert!(!is_signed_by(&contract, &alice(), &store));
        assert!(!is_signed_by(&contract, &PlayerId::new("carol"), &store));
    }

    #[test]
    fn test_payout_roles_come_from_parent_contract() {
        let store = EntityStore::new();
        let mut contract = contract();
        // contract flags must not leak into the payout check
        contract.sigs.player_one = true;
        store.add_contract(contract.clone());

        let mut payout = Payout::new(contract.id.clone(), Amount::ZERO, Amount::from_sat(1_000));
        payout.sigs.player_two = true;

        assert!(is_signed_by(&payout, &bob(), &store));
        assert!(!is_signed_by(&payout, &alice(), &store));
    }

    #[test]
    fn test_payout_without_contract_is_not_signed() {
        let store = EntityStore::new();
        let mut payout = Payout::new(ContractId::new("gone"), Amount::ZERO, Amount::ZERO);
        payout.sigs.player_one = true;
        payout.sigs.player_two = true;

        assert!(!is_signed_by(&payout, &alice(), &store));
        assert!(!is_signed_by(&payout, &bob(), &store));
    }

    #[test]
    fn test_is_unsigned() {
        let mut contract = contract();
        assert!(is_unsigned(&contract));

        contract.sigs.arbiter = true;
        assert!(!is_unsigned(&contract));

        let mut payout = Payout::new(contract.id.clone(), Amount::ZERO, Amount::ZERO);
        assert!(is_unsigned(&payout));
        payout.sigs.player_one = true;
        assert!(!is_unsigned(&payout));
    }

    #[test]
    fn test_other_party() {
        let contract = contract();

        assert_eq!(other_party(&alice(), &contract), Some(&bob()));
        assert_eq!(other_party(&bob(), &contract), Some(&alice()));
        assert_eq!(other_party(&PlayerId::new("carol"), &contract), None);
    }
}
