use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, StdResult, Storage, Timestamp, Uint128};
use cw_storage_plus::Item;
use vault_library::rate::Rate;

/// Accounting mode of a strategy, fixed at instantiation.
#[cw_serde]
#[derive(Copy, Eq)]
pub enum AccountingMode {
    /// Harvested profit is minted to the operator as shares at the current share price.
    Donating,
    /// Value owed to depositors and operator is tracked against a live exchange rate.
    Skimming,
}

#[cw_serde]
pub struct Config {
    pub name: String,
    /// The asset token held and deployed by the strategy.
    pub asset: Addr,
    /// Yield source idle assets are deployed to, if any.
    pub yield_source: Option<Addr>,
    pub mode: AccountingMode,
}

const CONFIG: Item<Config> = Item::new("config");

pub fn set_config(storage: &mut dyn Storage, config: &Config) -> StdResult<()> {
    CONFIG.save(storage, config)
}

pub fn get_config(storage: &dyn Storage) -> StdResult<Config> {
    CONFIG.load(storage)
}

/// Ledger record common to both accounting modes.
#[cw_serde]
#[derive(Default)]
pub struct StrategyState {
    /// Assets accounted by the strategy, idle and deployed.
    /// Only moves on deposit, withdraw and report.
    pub total_assets: Uint128,
    pub last_report: Timestamp,
    /// Burn operator shares to cover reported losses.
    pub enable_burning: bool,
    pub shutdown: bool,
}

const STATE: Item<StrategyState> = Item::new("state");

pub fn get_state(storage: &dyn Storage) -> StdResult<StrategyState> {
    STATE.load(storage)
}

pub fn save_state(storage: &mut dyn Storage, state: &StrategyState) -> StdResult<()> {
    STATE.save(storage, state)
}

/// Value-debt counters of a Skimming strategy, in value units.
/// Kept apart from [StrategyState], a Donating strategy never writes it.
#[cw_serde]
#[derive(Default)]
pub struct SkimmingState {
    /// Value owed to ordinary depositors.
    pub user_debt: Uint128,
    /// Value owed to the operator.
    pub operator_debt: Uint128,
    /// Rate observed at the last report.
    pub last_rate: Rate,
}

impl SkimmingState {
    pub fn total_debt(&self) -> StdResult<Uint128> {
        Ok(self.user_debt.checked_add(self.operator_debt)?)
    }
}

const SKIMMING: Item<SkimmingState> = Item::new("skimming");

/// Returns the default (zero debt) if never saved.
pub fn get_skimming(storage: &dyn Storage) -> StdResult<SkimmingState> {
    Ok(SKIMMING.may_load(storage)?.unwrap_or_default())
}

pub fn save_skimming(storage: &mut dyn Storage, state: &SkimmingState) -> StdResult<()> {
    SKIMMING.save(storage, state)
}
