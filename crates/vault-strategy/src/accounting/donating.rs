use super::{proportional_assets, proportional_shares, Accounting, Ledger, Report};
use crate::error::StrategyError;
use crate::health::HealthDelta;
use cosmwasm_std::{StdResult, Uint128};
use vault_library::rate::Rounding;

/// Profit is donated to the operator as shares minted at the current share price.
/// Losses burn operator shares when burning is enabled,
/// whatever they cannot cover lowers the share price for every holder.
pub struct Donating;

impl Accounting for Donating {
    fn convert_to_shares(
        &self,
        ledger: &Ledger,
        assets: Uint128,
        rounding: Rounding,
    ) -> StdResult<Uint128> {
        proportional_shares(ledger, assets, rounding)
    }

    fn convert_to_assets(
        &self,
        ledger: &Ledger,
        shares: Uint128,
        rounding: Rounding,
    ) -> StdResult<Uint128> {
        proportional_assets(ledger, shares, rounding)
    }

    fn report(
        &self,
        ledger: &mut Ledger,
        operator_shares: Uint128,
        total_assets: Uint128,
    ) -> Result<Report, StrategyError> {
        let previous = ledger.state.total_assets;
        let mut report = Report {
            profit: Uint128::zero(),
            loss: Uint128::zero(),
            shares_minted: Uint128::zero(),
            shares_burned: Uint128::zero(),
            delta: HealthDelta::Assets {
                previous,
                current: total_assets,
            },
        };

        // Shares are priced before total assets moves.
        if total_assets > previous {
            report.profit = total_assets.checked_sub(previous)?;
            report.shares_minted =
                self.convert_to_shares(ledger, report.profit, Rounding::Floor)?;
        } else {
            report.loss = previous.checked_sub(total_assets)?;
            if ledger.state.enable_burning && !report.loss.is_zero() {
                let to_burn = self.convert_to_shares(ledger, report.loss, Rounding::Ceil)?;
                report.shares_burned = to_burn.min(operator_shares);
            }
        }

        ledger.state.total_assets = total_assets;
        Ok(report)
    }
}
