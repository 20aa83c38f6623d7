use crate::types::{ContractId, PlayerId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EscrowError>;

#[derive(Error, Debug)]
pub enum EscrowError {
    #[error("Wallet error: {0}")]
    Wallet(String),

    #[error("Storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Player not found: {0}")]
    PlayerNotFound(PlayerId),

    #[error("A player named '{0}' already exists")]
    PlayerExists(String),

    #[error("Contract not found: {0}")]
    ContractNotFound(ContractId),

    #[error("No payout found for contract: {0}")]
    PayoutNotFound(ContractId),

    #[error("Contract {0} already has a payout")]
    PayoutExists(ContractId),

    #[error("Player {player} is not a party to contract {contract}")]
    NotAParty {
        player: PlayerId,
        contract: ContractId,
    },

    #[error("No local player selected")]
    NoPlayerSelected,

    #[error("Invalid contract state: {0}")]
    InvalidState(String),

    #[error("Invalid payout: {0}")]
    InvalidPayout(String),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Dialog error: {0}")]
    Dialog(String),
}

impl EscrowError {
    pub fn wallet(msg: impl Into<String>) -> Self {
        Self::Wallet(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn invalid_state(msg: impl Into<String>) -> Self {
        Self::InvalidState(msg.into())
    }

    pub fn invalid_payout(msg: impl Into<String>) -> Self {
        Self::InvalidPayout(msg.into())
    }

}

// conversion from dialoguer::Error
impl From<dialoguer::Error> for EscrowError {
    fn from(err: dialoguer::Error) -> Self {
        EscrowError::Dialog(err.to_string())
    }
}
