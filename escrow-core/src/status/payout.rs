use crate::status::signable::{is_signed_by, is_unsigned, other_party};
use crate::status::PayoutStatus;
use crate::storage::EntityLookup;
use crate::types::{Payout, PlayerId, TxStatus};

/// Derives the status of `payout` as seen by `local`.
///
/// Rules are checked in order and the first match wins: broadcast state,
/// then the 2-of-3 signature threshold, then which party has signed.
pub fn payout_status<L>(payout: &Payout, local: &PlayerId, lookup: &L) -> PayoutStatus
where
    L: EntityLookup + ?Sized,
{
    match payout.payout_tx {
        TxStatus::Confirmed => return PayoutStatus::Resolved,
        TxStatus::Broadcast => return PayoutStatus::Broadcast,
        TxStatus::Unbroadcast => {}
    }

    let sigs = payout.sigs;
    let players = sigs.players_signed();
    // arbiter alone does not count
    if players == 2 || (players == 1 && sigs.arbiter) {
        return PayoutStatus::Certified;
    }

    if is_signed_by(payout, local, lookup) {
        return if payout.payout_token {
            PayoutStatus::WeSignedWithToken
        } else {
            PayoutStatus::WeSigned
        };
    }

    let counterparty = lookup
        .contract(&payout.contract_id)
        .and_then(|contract| other_party(local, &contract).cloned());
    if let Some(counterparty) = counterparty {
        if is_signed_by(payout, &counterparty, lookup) {
            return PayoutStatus::TheySigned;
        }
    }

    if is_unsigned(payout) {
        PayoutStatus::Unsigned
    } else {
        PayoutStatus::Invalid
    }
}
