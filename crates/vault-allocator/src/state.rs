use crate::error::VaultError;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, StdResult, Storage, Timestamp, Uint128};
use cw_storage_plus::{Item, Map};

/// Debt record of an active strategy.
#[cw_serde]
pub struct StrategyParams {
    /// When the strategy was added to the vault.
    pub activation: Timestamp,
    /// Last time a report was processed for this strategy.
    pub last_report: Timestamp,
    /// Assets the strategy currently owes the vault.
    pub current_debt: Uint128,
    /// Cap on `current_debt` enforced when increasing debt.
    pub max_debt: Uint128,
}

/// Mapping of strategy's Addr to its [StrategyParams].
/// A strategy is active if and only if it has an entry.
pub(crate) const STRATEGIES: Map<&Addr, StrategyParams> = Map::new("strategies");

#[cw_serde]
#[derive(Default)]
pub struct VaultState {
    /// Assets held by the vault, not deployed to any strategy.
    pub total_idle: Uint128,
    /// Sum of `current_debt` of all strategies.
    pub total_debt: Uint128,
    /// Idle floor that debt increases will not go under.
    pub minimum_total_idle: Uint128,
    pub shutdown: bool,
}

impl VaultState {
    /// Total assets accounted by the vault: `total_idle + total_debt`.
    pub fn total_assets(&self) -> StdResult<Uint128> {
        Ok(self.total_idle.checked_add(self.total_debt)?)
    }
}

pub(crate) const VAULT: Item<VaultState> = Item::new("vault");

pub fn get_vault_state(storage: &dyn Storage) -> StdResult<VaultState> {
    VAULT.load(storage)
}

pub(crate) fn save_vault_state(storage: &mut dyn Storage, state: &VaultState) -> StdResult<()> {
    VAULT.save(storage, state)
}

/// Get the [StrategyParams] of an active strategy.
pub fn get_strategy(storage: &dyn Storage, strategy: &Addr) -> Result<StrategyParams, VaultError> {
    STRATEGIES
        .may_load(storage, strategy)?
        .ok_or(VaultError::strategy("not active"))
}

pub(crate) fn save_strategy(
    storage: &mut dyn Storage,
    strategy: &Addr,
    params: &StrategyParams,
) -> StdResult<()> {
    STRATEGIES.save(storage, strategy, params)
}

pub(crate) fn remove_strategy(storage: &mut dyn Storage, strategy: &Addr) {
    STRATEGIES.remove(storage, strategy)
}
