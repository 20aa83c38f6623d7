use bitcoin::Amount;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContractId(pub String);

impl ContractId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Hash of the contract terms plus a random nonce, hex encoded.
    pub fn from_terms(player_one: &PlayerId, player_two: &PlayerId, amount: Amount) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(player_one.as_str().as_bytes());
        hasher.update(player_two.as_str().as_bytes());
        hasher.update(amount.to_sat().to_be_bytes());
        hasher.update(Uuid::new_v4().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ContractId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub picture_url: String,
    /// The local wallet holds keys for this player.
    pub mine: bool,
}

pub const DEFAULT_PICTURE_URL: &str = "https://static-cdn.jtvnw.net/emoticons/v1/425618/2.0";

impl Player {
    pub fn new(name: impl Into<String>, mine: bool) -> Self {
        Self {
            id: PlayerId::generate(),
            name: name.into(),
            picture_url: DEFAULT_PICTURE_URL.to_string(),
            mine,
        }
    }
}

/// Lifecycle of a funding or payout transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TxStatus {
    #[default]
    Unbroadcast,
    Broadcast,
    Confirmed,
}

impl TxStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxStatus::Unbroadcast => "unbroadcast",
            TxStatus::Broadcast => "broadcast",
            TxStatus::Confirmed => "confirmed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unbroadcast" => Some(TxStatus::Unbroadcast),
            "broadcast" => Some(TxStatus::Broadcast),
            "confirmed" => Some(TxStatus::Confirmed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerRole {
    One,
    Two,
}

/// Signature flags carried by both contracts and payouts. Flags only ever go
/// from `false` to `true`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Signatures {
    pub player_one: bool,
    pub player_two: bool,
    pub arbiter: bool,
}

impl Signatures {
    pub fn player(&self, role: PlayerRole) -> bool {
        match role {
            PlayerRole::One => self.player_one,
            PlayerRole::Two => self.player_two,
        }
    }

    pub fn players_signed(&self) -> usize {
        usize::from(self.player_one) + usize::from(self.player_two)
    }

    pub fn all(&self) -> bool {
        self.player_one && self.player_two && self.arbiter
    }

    pub fn none(&self) -> bool {
        !(self.player_one || self.player_two || self.arbiter)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub player_one: PlayerId,
    pub player_two: PlayerId,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub amount: Amount,
    pub desc: String,
    pub sigs: Signatures,
    pub funding_tx: TxStatus,
    pub created_at: DateTime<Utc>,
}

impl Contract {
    pub fn new(player_one: PlayerId, player_two: PlayerId, amount: Amount) -> Self {
        Self {
            id: ContractId::from_terms(&player_one, &player_two, amount),
            player_one,
            player_two,
            amount,
            desc: String::new(),
            sigs: Signatures::default(),
            funding_tx: TxStatus::Unbroadcast,
            created_at: Utc::now(),
        }
    }

    pub fn role_of(&self, player: &PlayerId) -> Option<PlayerRole> {
        if &self.player_one == player {
            Some(PlayerRole::One)
        } else if &self.player_two == player {
            Some(PlayerRole::Two)
        } else {
            None
        }
    }

    pub fn player(&self, role: PlayerRole) -> &PlayerId {
        match role {
            PlayerRole::One => &self.player_one,
            PlayerRole::Two => &self.player_two,
        }
    }
}

/// Proposed split of a contract's pot. Keyed by its contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payout {
    pub contract_id: ContractId,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub p1_amount: Amount,
    #[serde(with = "bitcoin::amount::serde::as_sat")]
    pub p2_amount: Amount,
    pub sigs: Signatures,
    /// The local signature was produced with an arbitration token.
    pub payout_token: bool,
    pub payout_tx: TxStatus,
    pub created_at: DateTime<Utc>,
}

impl Payout {
    pub fn new(contract_id: ContractId, p1_amount: Amount, p2_amount: Amount) -> Self {
        Self {
            contract_id,
            p1_amount,
            p2_amount,
            sigs: Signatures::default(),
            payout_token: false,
            payout_tx: TxStatus::Unbroadcast,
            created_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContractPatch {
    pub desc: Option<String>,
    pub player_one_sig: Option<bool>,
    pub player_two_sig: Option<bool>,
    pub arbiter_sig: Option<bool>,
    pub funding_tx: Option<TxStatus>,
}

impl ContractPatch {
    pub fn sign(role: PlayerRole) -> Self {
        match role {
            PlayerRole::One => Self {
                player_one_sig: Some(true),
                ..Default::default()
            },
            PlayerRole::Two => Self {
                player_two_sig: Some(true),
                ..Default::default()
            },
        }
    }

    pub fn apply(self, contract: &mut Contract) {
        if let Some(desc) = self.desc {
            contract.desc = desc;
        }
        if let Some(sig) = self.player_one_sig {
            contract.sigs.player_one = sig;
        }
        if let Some(sig) = self.player_two_sig {
            contract.sigs.player_two = sig;
        }
        if let Some(sig) = self.arbiter_sig {
            contract.sigs.arbiter = sig;
        }
        if let Some(status) = self.funding_tx {
            contract.funding_tx = status;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PayoutPatch {
    pub player_one_sig: Option<bool>,
    pub player_two_sig: Option<bool>,
    pub arbiter_sig: Option<bool>,
    pub payout_token: Option<bool>,
    pub payout_tx: Option<TxStatus>,
}

impl PayoutPatch {
    pub fn sign(role: PlayerRole) -> Self {
        match role {
            PlayerRole::One => Self {
                player_one_sig: Some(true),
                ..Default::default()
            },
            PlayerRole::Two => Self {
                player_two_sig: Some(true),
                ..Default::default()
            },
        }
    }

    pub fn apply(self, payout: &mut Payout) {
        if let Some(sig) = self.player_one_sig {
            payout.sigs.player_one = sig;
        }
        if let Some(sig) = self.player_two_sig {
            payout.sigs.player_two = sig;
        }
        if let Some(sig) = self.arbiter_sig {
            payout.sigs.arbiter = sig;
        }
        if let Some(token) = self.payout_token {
            payout.payout_token = token;
        }
        if let Some(status) = self.payout_tx {
            payout.payout_tx = status;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contract_ids_are_unique_for_same_terms() {
        let p1 = PlayerId::new("alice");
        let p2 = PlayerId::new("bob");
        let a = ContractId::from_terms(&p1, &p2, Amount::from_sat(1000));
        let b = ContractId::from_terms(&p1, &p2, Amount::from_sat(1000));

        assert_ne!(a, b);
        assert_eq!(a.as_str().len(), 64);
    }

    #[test]
    fn test_role_of() {
        let contract = Contract::new(
            PlayerId::new("alice"),
            PlayerId::new("bob"),
            Amount::from_sat(1000),
        );

        assert_eq!(contract.role_of(&PlayerId::new("alice")), Some(PlayerRole::One));
        assert_eq!(contract.role_of(&PlayerId::new("bob")), Some(PlayerRole::Two));
        assert_eq!(contract.role_of(&PlayerId::new("carol")), None);
    }

    #[test]
    fn test_patch_only_touches_given_fields() {
        let mut contract = Contract::new(
            PlayerId::new("alice"),
            PlayerId::new("bob"),
            Amount::from_sat(1000),
        );
        ContractPatch::sign(PlayerRole::Two).apply(&mut contract);

        assert!(!contract.sigs.player_one);
        assert!(contract.sigs.player_two);
        assert!(!contract.sigs.arbiter);
        assert_eq!(contract.funding_tx, TxStatus::Unbroadcast);
    }

    #[test]
    fn test_tx_status_str_round_trip() {
        for status in [TxStatus::Unbroadcast, TxStatus::Broadcast, TxStatus::Confirmed] {
            assert_eq!(TxStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(TxStatus::parse("mined"), None);
    }
}
