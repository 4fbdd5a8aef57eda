//! The ledger of a strategy is driven by one of two interchangeable [Accounting] modes.
//! The contract only ever talks to `&dyn Accounting`, the mode is picked once from [crate::state::Config].

mod donating;
mod skimming;

pub use donating::Donating;
pub use skimming::Skimming;

use crate::error::StrategyError;
use crate::health::HealthDelta;
use crate::shares;
use crate::state::{self, AccountingMode, SkimmingState, StrategyState};
use cosmwasm_std::{Addr, StdError, StdResult, Storage, Uint128};
use vault_library::adapter::RateSource;
use vault_library::rate::{mul_div_u128, Rate, Rounding};

/// In-memory view of the ledger for one call.
/// Mutated while an operation is computed, persisted with [Ledger::save] once it succeeds.
#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub mode: AccountingMode,
    pub state: StrategyState,
    pub total_supply: Uint128,
    pub operator: Addr,
    /// Untouched by a Donating strategy.
    pub skimming: SkimmingState,
    /// Rate read from the rate source, zero for a Donating strategy.
    pub rate: Rate,
}

impl Ledger {
    /// Load the ledger. A Skimming strategy must be given its rate source.
    pub fn load(storage: &dyn Storage, rate_source: Option<&dyn RateSource>) -> StdResult<Self> {
        let config = state::get_config(storage)?;
        let (skimming, rate) = match config.mode {
            AccountingMode::Donating => (SkimmingState::default(), Rate::default()),
            AccountingMode::Skimming => {
                let source = rate_source
                    .ok_or_else(|| StdError::generic_err("rate source not provided"))?;
                let rate = Rate::from_source(source.exchange_rate()?, source.decimals()?)?;
                (state::get_skimming(storage)?, rate)
            }
        };

        Ok(Self {
            mode: config.mode,
            state: state::get_state(storage)?,
            total_supply: shares::total_supply(storage)?,
            operator: crate::operator::get_operator(storage)?,
            skimming,
            rate,
        })
    }

    pub fn accounting(&self) -> &'static dyn Accounting {
        accounting(self.mode)
    }

    pub fn is_operator(&self, account: &Addr) -> bool {
        *account == self.operator
    }

    pub fn mint(&mut self, storage: &mut dyn Storage, to: &Addr, amount: Uint128) -> StdResult<()> {
        shares::mint(storage, to, amount)?;
        self.total_supply = self.total_supply.checked_add(amount)?;
        Ok(())
    }

    pub fn burn(&mut self, storage: &mut dyn Storage, from: &Addr, amount: Uint128) -> StdResult<()> {
        shares::burn(storage, from, amount)?;
        self.total_supply = self.total_supply.checked_sub(amount)?;
        Ok(())
    }

    pub fn save(&self, storage: &mut dyn Storage) -> StdResult<()> {
        state::save_state(storage, &self.state)?;
        if self.mode == AccountingMode::Skimming {
            state::save_skimming(storage, &self.skimming)?;
        }
        Ok(())
    }
}

/// What a report booked, in asset units for Donating and value units for Skimming.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub profit: Uint128,
    pub loss: Uint128,
    /// Shares to mint to the operator.
    pub shares_minted: Uint128,
    /// Shares to burn from the operator.
    pub shares_burned: Uint128,
    /// Change for the health check to validate.
    pub delta: HealthDelta,
}

/// One accounting mode of the ledger.
///
/// Hooks run on the in-memory [Ledger] before it is saved,
/// the defaults do nothing so a mode only overrides what it tracks.
pub trait Accounting {
    fn convert_to_shares(
        &self,
        ledger: &Ledger,
        assets: Uint128,
        rounding: Rounding,
    ) -> StdResult<Uint128>;

    fn convert_to_assets(
        &self,
        ledger: &Ledger,
        shares: Uint128,
        rounding: Rounding,
    ) -> StdResult<Uint128>;

    fn is_insolvent(&self, _ledger: &Ledger) -> StdResult<bool> {
        Ok(false)
    }

    /// Checked before assets are pulled on deposit or mint.
    fn before_deposit(&self, _ledger: &Ledger, _receiver: &Addr) -> Result<(), StrategyError> {
        Ok(())
    }

    /// `shares` are being issued to `receiver`, runs before they are written.
    fn after_deposit(
        &self,
        _ledger: &mut Ledger,
        _receiver: &Addr,
        _shares: Uint128,
    ) -> StdResult<()> {
        Ok(())
    }

    /// Checked before assets are released on withdraw or redeem.
    fn before_withdraw(&self, _ledger: &Ledger, _owner: &Addr) -> Result<(), StrategyError> {
        Ok(())
    }

    /// `shares` of `owner` have been burned, `ledger.total_supply` is already reduced.
    fn after_withdraw(
        &self,
        _ledger: &mut Ledger,
        _owner: &Addr,
        _shares: Uint128,
    ) -> StdResult<()> {
        Ok(())
    }

    /// `shares` are about to move from `from` to `to`.
    fn on_transfer(
        &self,
        _ledger: &mut Ledger,
        _from: &Addr,
        _to: &Addr,
        _shares: Uint128,
    ) -> Result<(), StrategyError> {
        Ok(())
    }

    /// Book a freshly harvested `total_assets` into the ledger.
    /// `operator_shares` bounds how much can be burned to cover a loss.
    fn report(
        &self,
        ledger: &mut Ledger,
        operator_shares: Uint128,
        total_assets: Uint128,
    ) -> Result<Report, StrategyError>;

    /// The operator role moves from an account holding `outgoing` shares
    /// to an account holding `incoming` shares.
    fn migrate_operator(
        &self,
        _ledger: &mut Ledger,
        _outgoing: Uint128,
        _incoming: Uint128,
    ) -> StdResult<()> {
        Ok(())
    }
}

pub fn accounting(mode: AccountingMode) -> &'static dyn Accounting {
    match mode {
        AccountingMode::Donating => &Donating,
        AccountingMode::Skimming => &Skimming,
    }
}

/// Shares for `assets` at the ledger's share price.
/// 1:1 while nothing is issued, zero if issued shares are backed by nothing.
pub(crate) fn proportional_shares(
    ledger: &Ledger,
    assets: Uint128,
    rounding: Rounding,
) -> StdResult<Uint128> {
    if ledger.total_supply.is_zero() {
        return Ok(assets);
    }
    if ledger.state.total_assets.is_zero() {
        return Ok(Uint128::zero());
    }
    mul_div_u128(
        assets,
        ledger.total_supply,
        ledger.state.total_assets,
        rounding,
    )
}

/// Assets for `shares` at the ledger's share price, 1:1 while nothing is issued.
pub(crate) fn proportional_assets(
    ledger: &Ledger,
    shares: Uint128,
    rounding: Rounding,
) -> StdResult<Uint128> {
    if ledger.total_supply.is_zero() {
        return Ok(shares);
    }
    mul_div_u128(
        shares,
        ledger.state.total_assets,
        ledger.total_supply,
        rounding,
    )
}

/// Deposit capacity left, zero once shut down or while insolvent.
pub fn max_deposit(ledger: &Ledger, available_deposit_limit: Uint128) -> StdResult<Uint128> {
    if ledger.state.shutdown || ledger.accounting().is_insolvent(ledger)? {
        return Ok(Uint128::zero());
    }
    Ok(available_deposit_limit)
}

pub fn max_mint(ledger: &Ledger, available_deposit_limit: Uint128) -> StdResult<Uint128> {
    let max = max_deposit(ledger, available_deposit_limit)?;
    if max == Uint128::MAX {
        return Ok(max);
    }
    ledger
        .accounting()
        .convert_to_shares(ledger, max, Rounding::Floor)
}

pub fn max_withdraw(
    ledger: &Ledger,
    owner_shares: Uint128,
    available_withdraw_limit: Uint128,
) -> StdResult<Uint128> {
    let assets = ledger
        .accounting()
        .convert_to_assets(ledger, owner_shares, Rounding::Floor)?;
    Ok(assets.min(available_withdraw_limit))
}

pub fn max_redeem(
    ledger: &Ledger,
    owner_shares: Uint128,
    available_withdraw_limit: Uint128,
) -> StdResult<Uint128> {
    if available_withdraw_limit == Uint128::MAX {
        return Ok(owner_shares);
    }
    let shares = ledger.accounting().convert_to_shares(
        ledger,
        available_withdraw_limit,
        Rounding::Floor,
    )?;
    Ok(owner_shares.min(shares))
}
