pub mod contract;
pub mod error;
pub mod msg;

/// Strategy configuration and the ledger records of both accounting modes.
pub mod state;

/// Share balances and total supply of the strategy.
pub mod shares;

/// The Donating and Skimming accounting modes behind one [accounting::Accounting] trait.
pub mod accounting;

/// Bounded-delta circuit breaker applied to every report.
pub mod health;

/// Operator (profit recipient) and its delayed change.
pub mod operator;

/// Moves assets between the strategy and its yield source.
pub mod funds;

pub use crate::error::StrategyError;
