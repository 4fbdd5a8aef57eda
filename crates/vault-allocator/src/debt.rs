use crate::error::VaultError;
use crate::state::{self, StrategyParams, VaultState};
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Env, StdResult, Storage, Uint128};
use vault_library::adapter::{deployed_assets, AssetToken, YieldSource};
use vault_library::rate::{bps_of, mul_div_u128, Rounding, MAX_BPS};
use vault_library::token;

/// Outcome of [update_debt].
#[cw_serde]
pub struct DebtUpdate {
    pub strategy: Addr,
    pub current_debt: Uint128,
    pub new_debt: Uint128,
    pub total_idle: Uint128,
    pub total_debt: Uint128,
}

/// Share of a loss the vault would realize by withdrawing `assets_needed` from a strategy
/// whose position is worth less than its `current_debt`.
/// Zero if the strategy is whole.
pub fn assess_share_of_unrealised_losses(
    strategy: &dyn YieldSource,
    current_debt: Uint128,
    assets_needed: Uint128,
) -> StdResult<Uint128> {
    let strategy_assets = deployed_assets(strategy)?;
    if strategy_assets >= current_debt || current_debt.is_zero() {
        return Ok(Uint128::zero());
    }

    // The vault only recovers `assets_needed * strategy_assets / current_debt`.
    let recovered = mul_div_u128(assets_needed, strategy_assets, current_debt, Rounding::Floor)?;
    Ok(assets_needed.checked_sub(recovered)?)
}

/// Rebalance `strategy` toward `target_debt`.
///
/// Decreasing debt frees assets back to idle (respecting the minimum idle floor
/// and the strategy's withdrawable capacity), increasing debt deploys idle
/// (respecting the max debt cap, strategy capacity and the minimum idle floor).
/// Amounts actually moved are measured by the vault's token balance before and after.
///
/// Nothing is written unless the call succeeds. A clamp down to zero movement
/// is not an error, it returns the current debt unchanged.
pub fn update_debt(
    storage: &mut dyn Storage,
    env: &Env,
    asset: &mut dyn AssetToken,
    strategy: &mut dyn YieldSource,
    target_debt: Uint128,
    max_loss_bps: u16,
) -> Result<DebtUpdate, VaultError> {
    if max_loss_bps > MAX_BPS {
        return Err(VaultError::invalid_config("max loss over 10000 bps"));
    }

    let address = strategy.address();
    let mut params = state::get_strategy(storage, &address)?;
    let mut vault = state::get_vault_state(storage)?;
    let current_debt = params.current_debt;

    let target_debt = if vault.shutdown {
        Uint128::zero()
    } else {
        target_debt
    };
    if target_debt == current_debt {
        return Err(VaultError::no_change("new debt equals current debt"));
    }

    let new_debt = if current_debt > target_debt {
        decrease_debt(
            env,
            asset,
            strategy,
            &mut vault,
            current_debt,
            target_debt,
            max_loss_bps,
        )?
    } else {
        increase_debt(
            env,
            asset,
            strategy,
            &mut vault,
            &params,
            target_debt,
        )?
    };

    if new_debt != current_debt {
        params.current_debt = new_debt;
        state::save_strategy(storage, &address, &params)?;
        state::save_vault_state(storage, &vault)?;
    }

    Ok(DebtUpdate {
        strategy: address,
        current_debt,
        new_debt,
        total_idle: vault.total_idle,
        total_debt: vault.total_debt,
    })
}

fn decrease_debt(
    env: &Env,
    asset: &mut dyn AssetToken,
    strategy: &mut dyn YieldSource,
    vault: &mut VaultState,
    current_debt: Uint128,
    target_debt: Uint128,
    max_loss_bps: u16,
) -> Result<Uint128, VaultError> {
    let mut assets_to_withdraw = current_debt.checked_sub(target_debt)?;

    // Withdraw enough to top up the idle floor, but never more than the strategy owes.
    let idle_after = vault.total_idle.checked_add(assets_to_withdraw)?;
    if idle_after < vault.minimum_total_idle {
        assets_to_withdraw = vault
            .minimum_total_idle
            .checked_sub(vault.total_idle)?
            .min(current_debt);
    }

    let withdrawable = strategy.max_withdraw()?;
    assets_to_withdraw = assets_to_withdraw.min(withdrawable);
    if assets_to_withdraw.is_zero() {
        return Ok(current_debt);
    }

    // Reducing debt ahead of a reported loss would let the vault dodge its share of it.
    let unrealised =
        assess_share_of_unrealised_losses(&*strategy, current_debt, assets_to_withdraw)?;
    if !unrealised.is_zero() {
        return Err(VaultError::UnrealisedLosses {});
    }

    let vault_addr = &env.contract.address;
    let pre_balance = asset.balance_of(vault_addr)?;
    strategy.withdraw(assets_to_withdraw)?;
    let post_balance = asset.balance_of(vault_addr)?;

    let received = post_balance.checked_sub(pre_balance)?;
    let withdrawn = received.min(current_debt);
    if withdrawn < assets_to_withdraw {
        if max_loss_bps < MAX_BPS {
            let loss = assets_to_withdraw.checked_sub(withdrawn)?;
            if loss > bps_of(assets_to_withdraw, max_loss_bps)? {
                // Nothing is booked, so what arrived goes back to the strategy.
                deposit_into(env, asset, strategy, received)?;
                return Err(VaultError::too_much_loss(format!(
                    "withdrew {} of {}",
                    withdrawn, assets_to_withdraw
                )));
            }
        }
    } else if withdrawn > assets_to_withdraw {
        // Extra principal recovered, it pays down debt one for one.
        assets_to_withdraw = withdrawn;
    }

    vault.total_idle = vault.total_idle.checked_add(withdrawn)?;
    vault.total_debt = vault.total_debt.checked_sub(assets_to_withdraw)?;
    Ok(current_debt.checked_sub(assets_to_withdraw)?)
}

fn increase_debt(
    env: &Env,
    asset: &mut dyn AssetToken,
    strategy: &mut dyn YieldSource,
    vault: &mut VaultState,
    params: &StrategyParams,
    target_debt: Uint128,
) -> Result<Uint128, VaultError> {
    let current_debt = params.current_debt;

    let mut target_debt = target_debt;
    if target_debt > params.max_debt {
        target_debt = params.max_debt;
        // A processed gain can leave current debt above the cap.
        if target_debt < current_debt {
            return Ok(current_debt);
        }
    }

    let max_deposit = strategy.max_deposit()?;
    if max_deposit.is_zero() {
        return Ok(current_debt);
    }

    let mut assets_to_deposit = target_debt.checked_sub(current_debt)?.min(max_deposit);

    if vault.total_idle <= vault.minimum_total_idle {
        return Ok(current_debt);
    }
    let available_idle = vault.total_idle.checked_sub(vault.minimum_total_idle)?;
    assets_to_deposit = assets_to_deposit.min(available_idle);

    if !assets_to_deposit.is_zero() {
        assets_to_deposit = deposit_into(env, asset, strategy, assets_to_deposit)?;
        vault.total_idle = vault.total_idle.checked_sub(assets_to_deposit)?;
        vault.total_debt = vault.total_debt.checked_add(assets_to_deposit)?;
    }

    Ok(current_debt.checked_add(assets_to_deposit)?)
}

/// Deposit `assets` from the vault into `strategy`, returns what left the vault's balance.
/// The allowance is reset to zero whether or not the deposit succeeds.
fn deposit_into(
    env: &Env,
    asset: &mut dyn AssetToken,
    strategy: &mut dyn YieldSource,
    assets: Uint128,
) -> Result<Uint128, VaultError> {
    if assets.is_zero() {
        return Ok(Uint128::zero());
    }

    let vault_addr = &env.contract.address;
    let strategy_addr = strategy.address();

    token::force_approve(asset, vault_addr, &strategy_addr, assets)?;
    let pre_balance = asset.balance_of(vault_addr)?;
    let deposited = strategy.deposit(assets);
    token::force_approve(asset, vault_addr, &strategy_addr, Uint128::zero())?;
    deposited?;
    let post_balance = asset.balance_of(vault_addr)?;

    Ok(pre_balance.checked_sub(post_balance)?)
}

/// Gain or loss booked by [process_report].
#[cw_serde]
pub struct StrategyReport {
    pub strategy: Addr,
    pub gain: Uint128,
    pub loss: Uint128,
    pub current_debt: Uint128,
}

/// Book the change in value of `strategy`'s position into its debt and the vault's total debt.
pub fn process_report(
    storage: &mut dyn Storage,
    env: &Env,
    strategy: &dyn YieldSource,
) -> Result<StrategyReport, VaultError> {
    let address = strategy.address();
    let mut params = state::get_strategy(storage, &address)?;
    let mut vault = state::get_vault_state(storage)?;

    let total_assets = deployed_assets(strategy)?;
    let current_debt = params.current_debt;

    let (gain, loss) = if total_assets > current_debt {
        let gain = total_assets.checked_sub(current_debt)?;
        vault.total_debt = vault.total_debt.checked_add(gain)?;
        (gain, Uint128::zero())
    } else {
        let loss = current_debt.checked_sub(total_assets)?;
        vault.total_debt = vault.total_debt.checked_sub(loss)?;
        (Uint128::zero(), loss)
    };

    params.current_debt = total_assets;
    params.last_report = env.block.time;
    state::save_strategy(storage, &address, &params)?;
    state::save_vault_state(storage, &vault)?;

    Ok(StrategyReport {
        strategy: address,
        gain,
        loss,
        current_debt: params.current_debt,
    })
}
