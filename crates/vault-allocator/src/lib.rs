pub mod contract;
pub mod error;
pub mod msg;

/// Vault aggregate state and per-strategy debt records.
pub mod state;

/// Moves capital between the idle reserve and a strategy toward a target debt.
pub mod debt;

pub use crate::error::VaultError;
