use super::{proportional_assets, proportional_shares, Accounting, Ledger, Report};
use crate::error::StrategyError;
use crate::health::HealthDelta;
use cosmwasm_std::{Addr, StdResult, Uint128};
use vault_library::rate::Rounding;

/// Shares are value units: one share is owed one unit of value at the live exchange rate.
///
/// Value owed to depositors and to the operator is tracked in two debt counters,
/// the operator is credited the surplus whenever the assets are worth more than both.
/// Once the assets are worth less than the debt the strategy is insolvent,
/// conversions fall back to proportional and the operator is locked in.
pub struct Skimming;

impl Skimming {
    fn solvent_rate(&self, ledger: &Ledger) -> StdResult<bool> {
        Ok(!ledger.rate.is_zero() && !self.is_insolvent(ledger)?)
    }
}

impl Accounting for Skimming {
    fn convert_to_shares(
        &self,
        ledger: &Ledger,
        assets: Uint128,
        rounding: Rounding,
    ) -> StdResult<Uint128> {
        if self.solvent_rate(ledger)? {
            return ledger.rate.assets_to_value(assets, rounding);
        }
        proportional_shares(ledger, assets, rounding)
    }

    fn convert_to_assets(
        &self,
        ledger: &Ledger,
        shares: Uint128,
        rounding: Rounding,
    ) -> StdResult<Uint128> {
        if self.solvent_rate(ledger)? {
            return ledger.rate.value_to_assets(shares, rounding);
        }
        proportional_assets(ledger, shares, rounding)
    }

    /// `total_assets * rate < (user_debt + operator_debt) * RAY`, compared exactly.
    fn is_insolvent(&self, ledger: &Ledger) -> StdResult<bool> {
        let debt = ledger.skimming.total_debt()?;
        if debt.is_zero() {
            return Ok(false);
        }
        Ok(!ledger.rate.covers(ledger.state.total_assets, debt)?)
    }

    fn before_deposit(&self, ledger: &Ledger, receiver: &Addr) -> Result<(), StrategyError> {
        if self.is_insolvent(ledger)? {
            return Err(StrategyError::Insolvent {});
        }
        if ledger.is_operator(receiver) {
            return Err(StrategyError::unauthorized("operator cannot receive deposits"));
        }
        Ok(())
    }

    fn after_deposit(
        &self,
        ledger: &mut Ledger,
        _receiver: &Addr,
        shares: Uint128,
    ) -> StdResult<()> {
        ledger.skimming.user_debt = ledger.skimming.user_debt.checked_add(shares)?;
        Ok(())
    }

    fn before_withdraw(&self, ledger: &Ledger, owner: &Addr) -> Result<(), StrategyError> {
        if ledger.is_operator(owner) && self.is_insolvent(ledger)? {
            return Err(StrategyError::Insolvent {});
        }
        Ok(())
    }

    fn after_withdraw(&self, ledger: &mut Ledger, owner: &Addr, shares: Uint128) -> StdResult<()> {
        if ledger.total_supply.is_zero() {
            ledger.skimming.user_debt = Uint128::zero();
            ledger.skimming.operator_debt = Uint128::zero();
            return Ok(());
        }

        if ledger.is_operator(owner) {
            ledger.skimming.operator_debt = ledger.skimming.operator_debt.checked_sub(shares)?;
        } else {
            ledger.skimming.user_debt = ledger.skimming.user_debt.checked_sub(shares)?;
        }
        Ok(())
    }

    fn on_transfer(
        &self,
        ledger: &mut Ledger,
        from: &Addr,
        to: &Addr,
        shares: Uint128,
    ) -> Result<(), StrategyError> {
        let from_operator = ledger.is_operator(from);
        let to_operator = ledger.is_operator(to);
        if from_operator && to_operator {
            return Err(StrategyError::unauthorized("operator cannot transfer to itself"));
        }
        if !from_operator && !to_operator {
            return Ok(());
        }
        if self.is_insolvent(ledger)? {
            return Err(StrategyError::Insolvent {});
        }

        let debt = &mut ledger.skimming;
        if from_operator {
            debt.operator_debt = debt.operator_debt.checked_sub(shares)?;
            debt.user_debt = debt.user_debt.checked_add(shares)?;
        } else {
            debt.user_debt = debt.user_debt.checked_sub(shares)?;
            debt.operator_debt = debt.operator_debt.checked_add(shares)?;
        }
        Ok(())
    }

    fn report(
        &self,
        ledger: &mut Ledger,
        operator_shares: Uint128,
        total_assets: Uint128,
    ) -> Result<Report, StrategyError> {
        let value = ledger.rate.assets_to_value(total_assets, Rounding::Floor)?;
        let debt = ledger.skimming.total_debt()?;

        let mut report = Report {
            profit: Uint128::zero(),
            loss: Uint128::zero(),
            shares_minted: Uint128::zero(),
            shares_burned: Uint128::zero(),
            delta: HealthDelta::Rate {
                previous: ledger.skimming.last_rate,
                current: ledger.rate,
            },
        };

        if value > debt {
            report.profit = value.checked_sub(debt)?;
            report.shares_minted = report.profit;
            ledger.skimming.operator_debt =
                ledger.skimming.operator_debt.checked_add(report.profit)?;
        } else {
            report.loss = debt.checked_sub(value)?;
            if ledger.state.enable_burning {
                // Anything the operator cannot cover stays in the counters.
                report.shares_burned = report.loss.min(operator_shares);
                ledger.skimming.operator_debt = ledger
                    .skimming
                    .operator_debt
                    .checked_sub(report.shares_burned)?;
            }
        }

        ledger.skimming.last_rate = ledger.rate;
        ledger.state.total_assets = total_assets;
        Ok(report)
    }

    /// The outgoing operator's shares become depositor debt,
    /// the incoming operator's shares become operator debt.
    fn migrate_operator(
        &self,
        ledger: &mut Ledger,
        outgoing: Uint128,
        incoming: Uint128,
    ) -> StdResult<()> {
        let debt = &mut ledger.skimming;
        debt.user_debt = debt.user_debt.checked_add(outgoing)?.checked_sub(incoming)?;
        debt.operator_debt = debt
            .operator_debt
            .checked_add(incoming)?
            .checked_sub(outgoing)?;
        Ok(())
    }
}
