use crate::error::StrategyError;
use crate::state::Config;
use cosmwasm_std::{Addr, Env, StdResult, Uint128};
use vault_library::adapter::{deployed_assets, AssetToken, YieldSource};
use vault_library::token;

/// The yield source lent to the call must be the one configured, or absent if none is.
pub fn assert_yield_source(config: &Config, provided: Option<Addr>) -> Result<(), StrategyError> {
    match (&config.yield_source, provided) {
        (None, None) => Ok(()),
        (None, Some(_)) => Err(StrategyError::invalid_config("no yield source configured")),
        (Some(_), None) => Err(StrategyError::invalid_config("yield source not provided")),
        (Some(expected), Some(provided)) if *expected != provided => Err(
            StrategyError::invalid_config("yield source does not match"),
        ),
        (Some(_), Some(_)) => Ok(()),
    }
}

/// Assets the yield source can take right now, unbounded without one.
pub fn available_deposit_limit(
    source: Option<&dyn YieldSource>,
) -> StdResult<Uint128> {
    match source {
        Some(source) => source.max_deposit(),
        None => Ok(Uint128::MAX),
    }
}

/// Assets that can leave the strategy right now: idle plus what the source can free.
/// Unbounded without a yield source.
pub fn available_withdraw_limit(
    env: &Env,
    asset: &dyn AssetToken,
    source: Option<&dyn YieldSource>,
) -> StdResult<Uint128> {
    match source {
        Some(source) => {
            let idle = asset.balance_of(&env.contract.address)?;
            Ok(idle.checked_add(source.max_withdraw()?)?)
        }
        None => Ok(Uint128::MAX),
    }
}

/// Deploy idle assets into the yield source, bounded by what it can take.
/// Returns the assets actually deployed, measured by balance difference.
/// The allowance is reset to zero even when the source refuses the deposit.
pub fn deploy(
    env: &Env,
    asset: &mut dyn AssetToken,
    source: &mut dyn YieldSource,
) -> Result<Uint128, StrategyError> {
    let this = &env.contract.address;
    let idle = asset.balance_of(this)?;
    let amount = idle.min(source.max_deposit()?);
    if amount.is_zero() {
        return Ok(Uint128::zero());
    }

    let spender = source.address();
    token::force_approve(asset, this, &spender, amount)?;
    let deposited = source.deposit(amount);
    token::force_approve(asset, this, &spender, Uint128::zero())?;
    deposited?;

    let post_idle = asset.balance_of(this)?;
    Ok(idle.checked_sub(post_idle)?)
}

/// Free assets from the yield source until `assets` are idle, as far as it allows.
/// Returns the idle balance afterwards, which can still fall short of `assets`.
pub fn free(
    env: &Env,
    asset: &mut dyn AssetToken,
    source: Option<&mut (dyn YieldSource + '_)>,
    assets: Uint128,
) -> Result<Uint128, StrategyError> {
    let this = &env.contract.address;
    let idle = asset.balance_of(this)?;
    if idle >= assets {
        return Ok(idle);
    }

    if let Some(source) = source {
        let amount = assets.checked_sub(idle)?.min(source.max_withdraw()?);
        if !amount.is_zero() {
            source.withdraw(amount)?;
        }
    }
    Ok(asset.balance_of(this)?)
}

/// Claim pending rewards and total up idle and deployed assets.
pub fn harvest(
    env: &Env,
    asset: &dyn AssetToken,
    source: Option<&mut (dyn YieldSource + '_)>,
) -> Result<Uint128, StrategyError> {
    let idle = asset.balance_of(&env.contract.address)?;
    let deployed = match source {
        Some(source) => {
            source.harvest()?;
            deployed_assets(&*source)?
        }
        None => Uint128::zero(),
    };
    Ok(idle.checked_add(deployed)?)
}
