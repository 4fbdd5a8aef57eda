use cosmwasm_std::{OverflowError, StdError};
use thiserror::Error;
use vault_library::reentrancy::ReentrancyError;
use vault_library::roles::RoleError;
use vault_library::token::TokenError;

#[derive(Error, Debug, PartialEq)]
pub enum VaultError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("{0}")]
    Role(#[from] RoleError),

    #[error("{0}")]
    Reentrancy(#[from] ReentrancyError),

    #[error("{0}")]
    Token(#[from] TokenError),

    #[error("Strategy: {msg}")]
    Strategy { msg: String },

    #[error("No change: {msg}")]
    NoChange { msg: String },

    #[error("Too much loss: {msg}")]
    TooMuchLoss { msg: String },

    #[error("Strategy has unrealised losses")]
    UnrealisedLosses {},

    #[error("Zero: {msg}")]
    Zero { msg: String },

    #[error("Invalid config: {msg}")]
    InvalidConfig { msg: String },

    #[error("Vault is shut down")]
    Shutdown {},
}

impl VaultError {
    pub fn strategy(msg: impl Into<String>) -> Self {
        VaultError::Strategy { msg: msg.into() }
    }

    pub fn no_change(msg: impl Into<String>) -> Self {
        VaultError::NoChange { msg: msg.into() }
    }

    pub fn too_much_loss(msg: impl Into<String>) -> Self {
        VaultError::TooMuchLoss { msg: msg.into() }
    }

    pub fn zero(msg: impl Into<String>) -> Self {
        VaultError::Zero { msg: msg.into() }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        VaultError::InvalidConfig { msg: msg.into() }
    }
}
