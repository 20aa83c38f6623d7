//! Status derivation for contracts and payouts.
//!
//! Both engines are pure functions of the entities passed in, the local
//! identity and an [`EntityLookup`](crate::storage::EntityLookup) used to
//! resolve foreign keys. They never mutate the store and are cheap enough to
//! run on every render.

pub mod contract;
pub mod payout;
pub mod signable;

pub use contract::contract_status;
pub use payout::payout_status;
pub use signable::{is_signed_by, is_unsigned, other_party, Signable};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a contract sits in its lifecycle, from the local player's view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContractStatus {
    Unsigned,
    /// Local player signed, waiting on the other party. Also "Issued".
    Signed,
    Received,
    /// Both players signed, arbiter has not. Also "Accepted".
    PlayersSigned,
    Certified,
    FundingTxBroadcast,
    Live,
    /// Also "PayoutRequestIssued".
    PayoutUnsigned,
    PayoutSigned,
    PayoutSignedWithToken,
    /// Also "PayoutRequestReceived".
    PayoutReceived,
    PayoutCertified,
    PayoutTxBroadcast,
    Resolved,
    Invalid,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PayoutStatus {
    Unsigned,
    /// Also "LocalPlayerSigned".
    WeSigned,
    WeSignedWithToken,
    /// Also "OtherPlayerSigned".
    TheySigned,
    /// Two of three signatures present. Also "Live".
    Certified,
    Broadcast,
    Resolved,
    /// Arbiter signed alone, or another combination matching no rule.
    Invalid,
}

impl From<PayoutStatus> for ContractStatus {
    /// An invalid payout leaves the contract `Live` so a new payout can be
    /// proposed.
    fn from(status: PayoutStatus) -> Self {
        match status {
            PayoutStatus::Unsigned => ContractStatus::PayoutUnsigned,
            PayoutStatus::WeSigned => ContractStatus::PayoutSigned,
            PayoutStatus::WeSignedWithToken => ContractStatus::PayoutSignedWithToken,
            PayoutStatus::TheySigned => ContractStatus::PayoutReceived,
            PayoutStatus::Certified => ContractStatus::PayoutCertified,
            PayoutStatus::Broadcast => ContractStatus::PayoutTxBroadcast,
            PayoutStatus::Resolved => ContractStatus::Resolved,
            PayoutStatus::Invalid => ContractStatus::Live,
        }
    }
}

/// What the client should offer the local player next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractAction {
    Issue,
    AwaitCounterparty,
    AcceptOrDecline,
    SendToArbiter,
    BroadcastFunding,
    AwaitFundingConfirmation,
    RequestPayout,
    SignPayout,
    SendPayoutToArbiter,
    AcceptOrDenyPayout,
    BroadcastPayout,
    AwaitPayoutConfirmation,
    Dismiss,
}

impl ContractStatus {
    pub fn next_action(&self) -> ContractAction {
        match self {
            ContractStatus::Unsigned => ContractAction::Issue,
            ContractStatus::Signed => ContractAction::AwaitCounterparty,
            ContractStatus::Received => ContractAction::AcceptOrDecline,
            ContractStatus::PlayersSigned => ContractAction::SendToArbiter,
            ContractStatus::Certified => ContractAction::BroadcastFunding,
            ContractStatus::FundingTxBroadcast => ContractAction::AwaitFundingConfirmation,
            ContractStatus::Live => ContractAction::RequestPayout,
            ContractStatus::PayoutUnsigned => ContractAction::SignPayout,
            ContractStatus::PayoutSigned => ContractAction::AwaitCounterparty,
            ContractStatus::PayoutSignedWithToken => ContractAction::SendPayoutToArbiter,
            ContractStatus::PayoutReceived => ContractAction::AcceptOrDenyPayout,
            ContractStatus::PayoutCertified => ContractAction::BroadcastPayout,
            ContractStatus::PayoutTxBroadcast => ContractAction::AwaitPayoutConfirmation,
            ContractStatus::Resolved | ContractStatus::Invalid => ContractAction::Dismiss,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ContractStatus::Resolved | ContractStatus::Invalid)
    }
}

impl fmt::Display for ContractStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContractStatus::Unsigned => "Unsigned",
            ContractStatus::Signed => "Signed, waiting for opponent",
            ContractStatus::Received => "Received",
            ContractStatus::PlayersSigned => "Signed by both players",
            ContractStatus::Certified => "Certified by arbiter",
            ContractStatus::FundingTxBroadcast => "Funding tx broadcast",
            ContractStatus::Live => "Live",
            ContractStatus::PayoutUnsigned => "Payout unsigned",
            ContractStatus::PayoutSigned => "Payout signed",
            ContractStatus::PayoutSignedWithToken => "Payout signed with token",
            ContractStatus::PayoutReceived => "Payout received",
            ContractStatus::PayoutCertified => "Payout certified",
            ContractStatus::PayoutTxBroadcast => "Payout tx broadcast",
            ContractStatus::Resolved => "Resolved",
            ContractStatus::Invalid => "Invalid",
        };
        f.write_str(label)
    }
}

impl fmt::Display for PayoutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PayoutStatus::Unsigned => "Unsigned",
            PayoutStatus::WeSigned => "Signed by us",
            PayoutStatus::WeSignedWithToken => "Signed by us with token",
            PayoutStatus::TheySigned => "Signed by opponent",
            PayoutStatus::Certified => "Certified",
            PayoutStatus::Broadcast => "Broadcast",
            PayoutStatus::Resolved => "Resolved",
            PayoutStatus::Invalid => "Invalid",
        };
        f.write_str(label)
    }
}

impl fmt::Display for ContractAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContractAction::Issue => "Issue contract",
            ContractAction::AwaitCounterparty => "Wait for opponent",
            ContractAction::AcceptOrDecline => "Accept or decline contract",
            ContractAction::SendToArbiter => "Send to arbiter",
            ContractAction::BroadcastFunding => "Broadcast funding tx",
            ContractAction::AwaitFundingConfirmation => "Wait for funding confirmation",
            ContractAction::RequestPayout => "Request payout",
            ContractAction::SignPayout => "Sign payout",
            ContractAction::SendPayoutToArbiter => "Send payout to arbiter",
            ContractAction::AcceptOrDenyPayout => "Accept or deny payout",
            ContractAction::BroadcastPayout => "Broadcast payout tx",
            ContractAction::AwaitPayoutConfirmation => "Wait for payout confirmation",
            ContractAction::Dismiss => "Dismiss",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_payout_keeps_contract_live() {
        assert_eq!(ContractStatus::from(PayoutStatus::Invalid), ContractStatus::Live);
    }

    #[test]
    fn test_payout_mapping() {
        let expected = [
            (PayoutStatus::Unsigned, ContractStatus::PayoutUnsigned),
            (PayoutStatus::WeSigned, ContractStatus::PayoutSigned),
            (PayoutStatus::WeSignedWithToken, ContractStatus::PayoutSignedWithToken),
            (PayoutStatus::TheySigned, ContractStatus::PayoutReceived),
            (PayoutStatus::Certified, ContractStatus::PayoutCertified),
            (PayoutStatus::Broadcast, ContractStatus::PayoutTxBroadcast),
            (PayoutStatus::Resolved, ContractStatus::Resolved),
        ];
        for (payout, contract) in expected {
            assert_eq!(ContractStatus::from(payout), contract);
        }
    }

    #[test]
    fn test_terminal_statuses_offer_dismiss() {
        assert!(ContractStatus::Resolved.is_terminal());
        assert!(ContractStatus::Invalid.is_terminal());
        assert!(!ContractStatus::Live.is_terminal());
        assert_eq!(ContractStatus::Invalid.next_action(), ContractAction::Dismiss);
        assert_eq!(ContractStatus::Live.next_action(), ContractAction::RequestPayout);
    }
}
