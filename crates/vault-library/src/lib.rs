pub mod testing;

/// Fixed-point rate normalization and rounded multiply-divide conversions.
pub mod rate;

/// This module contains the `management` and `keeper` roles.
/// - `assert_management` only allows the management address.
/// - `assert_keeper` allows the keeper or the management address.
pub mod roles;

/// Storage-backed reentrancy lock for mutating entry points.
pub mod reentrancy;

/// Capability traits implemented by the collaborators of the vault and strategies.
pub mod adapter;

/// Checked token movement over an [adapter::AssetToken].
pub mod token;

pub mod time;
