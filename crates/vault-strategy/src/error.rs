use cosmwasm_std::{OverflowError, StdError};
use thiserror::Error;
use vault_library::reentrancy::ReentrancyError;
use vault_library::roles::RoleError;
use vault_library::token::TokenError;

#[derive(Error, Debug, PartialEq)]
pub enum StrategyError {
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

    #[error("Unauthorized: {msg}")]
    Unauthorized { msg: String },

    #[error("Exceeds max: {msg}")]
    ExceedsMax { msg: String },

    #[error("Zero: {msg}")]
    Zero { msg: String },

    #[error("Strategy is insolvent")]
    Insolvent {},

    #[error("Too much loss: {msg}")]
    TooMuchLoss { msg: String },

    #[error("Health check failed: {msg}")]
    HealthCheck { msg: String },

    #[error("Invalid config: {msg}")]
    InvalidConfig { msg: String },

    #[error("No change: {msg}")]
    NoChange { msg: String },

    #[error("Strategy is shut down")]
    Shutdown {},

    #[error("Strategy is not shut down")]
    NotShutdown {},

    #[error("Operator change cooldown has not elapsed")]
    Cooldown {},
}

impl StrategyError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        StrategyError::Unauthorized { msg: msg.into() }
    }

    pub fn exceeds_max(msg: impl Into<String>) -> Self {
        StrategyError::ExceedsMax { msg: msg.into() }
    }

    pub fn zero(msg: impl Into<String>) -> Self {
        StrategyError::Zero { msg: msg.into() }
    }

    pub fn too_much_loss(msg: impl Into<String>) -> Self {
        StrategyError::TooMuchLoss { msg: msg.into() }
    }

    pub fn health_check(msg: impl Into<String>) -> Self {
        StrategyError::HealthCheck { msg: msg.into() }
    }

    pub fn invalid_config(msg: impl Into<String>) -> Self {
        StrategyError::InvalidConfig { msg: msg.into() }
    }

    pub fn no_change(msg: impl Into<String>) -> Self {
        StrategyError::NoChange { msg: msg.into() }
    }
}
