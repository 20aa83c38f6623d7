use crate::status::payout::payout_status;
use crate::status::signable::{is_signed_by, is_unsigned};
use crate::status::ContractStatus;
use crate::storage::EntityLookup;
use crate::types::{Contract, PlayerId, TxStatus};

/// Derives the status of `contract` as seen by `local`.
///
/// Once the contract is fully signed and funded the status is taken from its
/// payout, if one exists.
pub fn contract_status<L>(contract: &Contract, local: &PlayerId, lookup: &L) -> ContractStatus
where
    L: EntityLookup + ?Sized,
{
    let sigs = contract.sigs;

    if sigs.all() {
        return match contract.funding_tx {
            TxStatus::Unbroadcast => ContractStatus::Certified,
            TxStatus::Broadcast => ContractStatus::FundingTxBroadcast,
            TxStatus::Confirmed => match lookup.payout_by_contract_id(&contract.id) {
                Some(payout) => payout_status(&payout, local, lookup).into(),
                None => ContractStatus::Live,
            },
        };
    }

    if !sigs.arbiter {
        match sigs.players_signed() {
            2 => return ContractStatus::PlayersSigned,
            1 if is_signed_by(contract, local, lookup) => return ContractStatus::Signed,
            1 => return ContractStatus::Received,
            _ => {}
        }
    }

    if is_unsigned(contract) {
        ContractStatus::Unsigned
    } else {
        tracing::debug!("Contract {} has an unexpected signature set {:?}", contract.id, sigs);
        ContractStatus::Invalid
    }
}
