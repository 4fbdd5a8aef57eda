use crate::error::StrategyError;
use crate::msg::{ExecuteMsg, InstantiateMsg, QueryMsg};
use crate::state::{self, AccountingMode, Config, SkimmingState, StrategyState};
use crate::{funds, health, operator};
use cosmwasm_std::{
    to_json_binary, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdResult,
};
use cw2::set_contract_version;
use vault_library::adapter::{AssetToken, RateSource, YieldSource};
use vault_library::rate::{Rounding, MAX_BPS};
use vault_library::reentrancy::non_reentrant;
use vault_library::roles;

const CONTRACT_NAME: &str = concat!("crates.io:", env!("CARGO_PKG_NAME"));
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Collaborators lent to a single [execute] call.
pub struct Adapters<'a> {
    /// The asset token held by the strategy.
    pub asset: &'a mut dyn AssetToken,
    /// Must be the configured yield source, or `None` if the strategy has none.
    pub yield_source: Option<&'a mut dyn YieldSource>,
    /// Required by every operation that loads the ledger of a Skimming strategy.
    pub rate: Option<&'a dyn RateSource>,
}

/// Read-only collaborators lent to a single [query] call.
pub struct QueryAdapters<'a> {
    pub asset: &'a dyn AssetToken,
    pub yield_source: Option<&'a dyn YieldSource>,
    pub rate: Option<&'a dyn RateSource>,
}

pub fn instantiate(
    deps: DepsMut,
    env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, StrategyError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let management = deps.api.addr_validate(&msg.management)?;
    let keeper = deps.api.addr_validate(&msg.keeper)?;
    roles::set_roles(deps.storage, &management, &keeper)?;

    let operator = deps.api.addr_validate(&msg.operator)?;
    operator::set_operator(deps.storage, &operator)?;

    let config = Config {
        name: msg.name,
        asset: deps.api.addr_validate(&msg.asset)?,
        yield_source: msg
            .yield_source
            .map(|addr| deps.api.addr_validate(&addr))
            .transpose()?,
        mode: msg.mode,
    };
    state::set_config(deps.storage, &config)?;

    state::save_state(
        deps.storage,
        &StrategyState {
            total_assets: Default::default(),
            last_report: env.block.time,
            enable_burning: msg.enable_burning,
            shutdown: false,
        },
    )?;
    if config.mode == AccountingMode::Skimming {
        state::save_skimming(deps.storage, &SkimmingState::default())?;
    }

    let mode = match config.mode {
        AccountingMode::Donating => "donating",
        AccountingMode::Skimming => "skimming",
    };
    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("name", config.name)
        .add_attribute("asset", config.asset)
        .add_attribute("mode", mode)
        .add_attribute("management", management)
        .add_attribute("keeper", keeper)
        .add_attribute("operator", operator))
}

pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    adapters: Adapters,
    msg: ExecuteMsg,
) -> Result<Response, StrategyError> {
    non_reentrant(deps, |deps| {
        let config = state::get_config(deps.storage)?;
        let provided = adapters.yield_source.as_ref().map(|source| source.address());
        funds::assert_yield_source(&config, provided)?;

        match msg {
            ExecuteMsg::Deposit { assets, receiver } => {
                let receiver = deps.api.addr_validate(&receiver)?;
                execute::deposit(deps, env, info, adapters, assets, receiver)
            }
            ExecuteMsg::Mint { shares, receiver } => {
                let receiver = deps.api.addr_validate(&receiver)?;
                execute::mint(deps, env, info, adapters, shares, receiver)
            }
            ExecuteMsg::Withdraw {
                assets,
                receiver,
                max_loss_bps,
            } => {
                let receiver = deps.api.addr_validate(&receiver)?;
                let max_loss_bps = max_loss_bps.unwrap_or(0);
                execute::withdraw(deps, env, info, adapters, assets, receiver, max_loss_bps)
            }
            ExecuteMsg::Redeem {
                shares,
                receiver,
                max_loss_bps,
            } => {
                let receiver = deps.api.addr_validate(&receiver)?;
                let max_loss_bps = max_loss_bps.unwrap_or(MAX_BPS);
                execute::redeem(deps, env, info, adapters, shares, receiver, max_loss_bps)
            }
            ExecuteMsg::Transfer { recipient, amount } => {
                let recipient = deps.api.addr_validate(&recipient)?;
                execute::transfer(deps, info, adapters, recipient, amount)
            }
            ExecuteMsg::Report {} => execute::report(deps, env, info, adapters),
            ExecuteMsg::SetProfitLimitRatio { ratio } => {
                health::set_profit_limit_ratio(deps.storage, &info, ratio)
            }
            ExecuteMsg::SetLossLimitRatio { ratio } => {
                health::set_loss_limit_ratio(deps.storage, &info, ratio)
            }
            ExecuteMsg::SetDoHealthCheck { enabled } => {
                health::set_do_health_check(deps.storage, &info, enabled)
            }
            ExecuteMsg::SetEnableBurning { enabled } => {
                execute::set_enable_burning(deps, info, enabled)
            }
            ExecuteMsg::SetOperator { operator } => {
                let operator = deps.api.addr_validate(&operator)?;
                operator::propose_operator(deps.storage, &env, &info, operator)
            }
            ExecuteMsg::CancelOperatorChange {} => {
                operator::cancel_operator_change(deps.storage, &info)
            }
            ExecuteMsg::FinalizeOperatorChange {} => {
                operator::finalize_operator_change(deps.storage, &env, adapters.rate)
            }
            ExecuteMsg::Shutdown {} => execute::shutdown(deps, info),
            ExecuteMsg::EmergencyWithdraw { amount } => {
                execute::emergency_withdraw(deps, env, info, adapters, amount)
            }
            ExecuteMsg::SetManagement { management } => {
                let management = deps.api.addr_validate(&management)?;
                roles::set_management(deps.storage, &info, management).map_err(Into::into)
            }
            ExecuteMsg::SetKeeper { keeper } => {
                let keeper = deps.api.addr_validate(&keeper)?;
                roles::set_keeper(deps.storage, &info, keeper).map_err(Into::into)
            }
        }
    })
}

mod execute {
    use super::Adapters;
    use crate::accounting::{self, Ledger};
    use crate::error::StrategyError;
    use crate::{funds, shares, state};
    use cosmwasm_std::{Addr, DepsMut, Env, Event, MessageInfo, Response, Storage, Uint128};
    use vault_library::rate::{bps_of, Rounding, MAX_BPS};
    use vault_library::token::{self, TokenError};
    use vault_library::roles;

    /// Pull `assets` from `sender`, returns what the strategy's balance actually grew by.
    fn pull_assets(
        env: &Env,
        adapters: &mut Adapters,
        sender: &Addr,
        assets: Uint128,
    ) -> Result<Uint128, StrategyError> {
        let this = &env.contract.address;
        let pre_balance = adapters.asset.balance_of(this)?;
        token::safe_transfer_from(adapters.asset, this, sender, this, assets)?;
        Ok(adapters.asset.balance_of(this)?.checked_sub(pre_balance)?)
    }

    /// Deploy idle into the yield source unless shut down.
    fn deploy_idle(
        env: &Env,
        adapters: &mut Adapters,
        ledger: &Ledger,
    ) -> Result<(), StrategyError> {
        if !ledger.state.shutdown {
            if let Some(source) = adapters.yield_source.as_deref_mut() {
                funds::deploy(env, adapters.asset, source)?;
            }
        }
        Ok(())
    }

    /// Send `received` back to `sender`, the deposit it arrived for failed with `err`.
    fn refund(
        env: &Env,
        adapters: &mut Adapters,
        sender: &Addr,
        received: Uint128,
        err: StrategyError,
    ) -> StrategyError {
        if received.is_zero() {
            return err;
        }
        match token::safe_transfer(adapters.asset, &env.contract.address, sender, received) {
            Ok(()) => err,
            Err(refund_err) => refund_err.into(),
        }
    }

    /// The ledger hooks run in memory, storage is written last.
    fn book_deposit(
        storage: &mut dyn Storage,
        ledger: &mut Ledger,
        receiver: &Addr,
        assets: Uint128,
        shares: Uint128,
    ) -> Result<(), StrategyError> {
        ledger.state.total_assets = ledger.state.total_assets.checked_add(assets)?;
        ledger.accounting().after_deposit(ledger, receiver, shares)?;
        ledger.mint(storage, receiver, shares)?;
        ledger.save(storage)?;
        Ok(())
    }

    /// Deposit `assets` from `info.sender`, shares are minted to `receiver`.
    /// Shares are priced on the assets actually received.
    pub fn deposit(
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        mut adapters: Adapters,
        assets: Uint128,
        receiver: Addr,
    ) -> Result<Response, StrategyError> {
        let mut ledger = Ledger::load(deps.storage, adapters.rate)?;
        let mode = ledger.accounting();
        mode.before_deposit(&ledger, &receiver)?;

        let limit = funds::available_deposit_limit(adapters.yield_source.as_deref())?;
        if assets > accounting::max_deposit(&ledger, limit)? {
            return Err(StrategyError::exceeds_max("deposit more than max"));
        }
        if assets.is_zero() {
            return Err(StrategyError::zero("Deposit assets cannot be zero"));
        }

        let received = pull_assets(&env, &mut adapters, &info.sender, assets)?;
        let priced = mode
            .convert_to_shares(&ledger, received, Rounding::Floor)
            .map_err(StrategyError::from)
            .and_then(|shares| {
                if shares.is_zero() {
                    return Err(StrategyError::zero("Deposit shares cannot be zero"));
                }
                deploy_idle(&env, &mut adapters, &ledger)?;
                Ok(shares)
            });
        let shares =
            priced.map_err(|err| refund(&env, &mut adapters, &info.sender, received, err))?;
        book_deposit(deps.storage, &mut ledger, &receiver, received, shares)?;

        Ok(Response::new().add_event(
            Event::new("Deposit")
                .add_attribute("sender", info.sender.to_string())
                .add_attribute("receiver", receiver.to_string())
                .add_attribute("assets", received.to_string())
                .add_attribute("shares", shares.to_string())
                .add_attribute("total_assets", ledger.state.total_assets.to_string())
                .add_attribute("total_supply", ledger.total_supply.to_string()),
        ))
    }

    /// Mint exactly `shares` to `receiver`, the assets needed are rounded up.
    pub fn mint(
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        mut adapters: Adapters,
        shares: Uint128,
        receiver: Addr,
    ) -> Result<Response, StrategyError> {
        let mut ledger = Ledger::load(deps.storage, adapters.rate)?;
        let mode = ledger.accounting();
        mode.before_deposit(&ledger, &receiver)?;

        let limit = funds::available_deposit_limit(adapters.yield_source.as_deref())?;
        if shares > accounting::max_mint(&ledger, limit)? {
            return Err(StrategyError::exceeds_max("mint more than max"));
        }
        if shares.is_zero() {
            return Err(StrategyError::zero("Mint shares cannot be zero"));
        }
        let assets = mode.convert_to_assets(&ledger, shares, Rounding::Ceil)?;
        if assets.is_zero() {
            return Err(StrategyError::zero("Mint assets cannot be zero"));
        }

        let received = pull_assets(&env, &mut adapters, &info.sender, assets)?;
        let settled = if received < assets {
            Err(TokenError::failed("transfer_from", "received less than requested").into())
        } else {
            deploy_idle(&env, &mut adapters, &ledger)
        };
        settled.map_err(|err| refund(&env, &mut adapters, &info.sender, received, err))?;
        book_deposit(deps.storage, &mut ledger, &receiver, received, shares)?;

        Ok(Response::new().add_event(
            Event::new("Deposit")
                .add_attribute("sender", info.sender.to_string())
                .add_attribute("receiver", receiver.to_string())
                .add_attribute("assets", received.to_string())
                .add_attribute("shares", shares.to_string())
                .add_attribute("total_assets", ledger.state.total_assets.to_string())
                .add_attribute("total_supply", ledger.total_supply.to_string()),
        ))
    }

    /// Free `assets`, send what was delivered to `receiver`, then burn `shares` of `owner`.
    /// The full `assets` leave the books, any shortfall within `max_loss_bps` is realised by the owner.
    /// Freeing only moves assets within the strategy, so a rejected release leaves the books as they were.
    #[allow(clippy::too_many_arguments)]
    fn release(
        storage: &mut dyn Storage,
        env: &Env,
        adapters: &mut Adapters,
        ledger: &mut Ledger,
        owner: &Addr,
        receiver: &Addr,
        assets: Uint128,
        shares: Uint128,
        max_loss_bps: u16,
    ) -> Result<Uint128, StrategyError> {
        if max_loss_bps > MAX_BPS {
            return Err(StrategyError::invalid_config("max loss over 10000 bps"));
        }

        let idle = funds::free(env, adapters.asset, adapters.yield_source.as_deref_mut(), assets)?;
        let delivered = idle.min(assets);
        let loss = assets.checked_sub(delivered)?;
        if loss > bps_of(assets, max_loss_bps)? {
            return Err(StrategyError::too_much_loss(format!(
                "withdrew {} of {}",
                delivered, assets
            )));
        }

        let total_assets = ledger.state.total_assets.checked_sub(assets)?;
        if !delivered.is_zero() {
            token::safe_transfer(adapters.asset, &env.contract.address, receiver, delivered)?;
        }

        ledger.state.total_assets = total_assets;
        ledger.burn(storage, owner, shares)?;
        ledger.accounting().after_withdraw(ledger, owner, shares)?;
        ledger.save(storage)?;
        Ok(delivered)
    }

    fn withdraw_event(
        info: &MessageInfo,
        receiver: &Addr,
        assets: Uint128,
        delivered: Uint128,
        shares: Uint128,
        ledger: &Ledger,
    ) -> Event {
        Event::new("Withdraw")
            .add_attribute("sender", info.sender.to_string())
            .add_attribute("receiver", receiver.to_string())
            .add_attribute("assets", delivered.to_string())
            .add_attribute("loss", assets.saturating_sub(delivered).to_string())
            .add_attribute("shares", shares.to_string())
            .add_attribute("total_assets", ledger.state.total_assets.to_string())
            .add_attribute("total_supply", ledger.total_supply.to_string())
    }

    /// Withdraw `assets` to `receiver`, burning the sender's shares rounded up.
    pub fn withdraw(
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        mut adapters: Adapters,
        assets: Uint128,
        receiver: Addr,
        max_loss_bps: u16,
    ) -> Result<Response, StrategyError> {
        let mut ledger = Ledger::load(deps.storage, adapters.rate)?;
        let mode = ledger.accounting();
        mode.before_withdraw(&ledger, &info.sender)?;

        let owner_shares = shares::get_shares(deps.storage, &info.sender)?;
        let limit = funds::available_withdraw_limit(
            &env,
            &*adapters.asset,
            adapters.yield_source.as_deref(),
        )?;
        if assets > accounting::max_withdraw(&ledger, owner_shares, limit)? {
            return Err(StrategyError::exceeds_max("withdraw more than max"));
        }
        if assets.is_zero() {
            return Err(StrategyError::zero("Withdraw assets cannot be zero"));
        }
        let shares = mode.convert_to_shares(&ledger, assets, Rounding::Ceil)?;
        if shares.is_zero() {
            return Err(StrategyError::zero("Withdraw shares cannot be zero"));
        }

        let delivered = release(
            deps.storage,
            &env,
            &mut adapters,
            &mut ledger,
            &info.sender,
            &receiver,
            assets,
            shares,
            max_loss_bps,
        )?;

        Ok(Response::new().add_event(withdraw_event(
            &info, &receiver, assets, delivered, shares, &ledger,
        )))
    }

    /// Redeem `shares` of the sender, the assets returned are rounded down.
    pub fn redeem(
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        mut adapters: Adapters,
        shares: Uint128,
        receiver: Addr,
        max_loss_bps: u16,
    ) -> Result<Response, StrategyError> {
        let mut ledger = Ledger::load(deps.storage, adapters.rate)?;
        let mode = ledger.accounting();
        mode.before_withdraw(&ledger, &info.sender)?;

        let owner_shares = shares::get_shares(deps.storage, &info.sender)?;
        let limit = funds::available_withdraw_limit(
            &env,
            &*adapters.asset,
            adapters.yield_source.as_deref(),
        )?;
        if shares > accounting::max_redeem(&ledger, owner_shares, limit)? {
            return Err(StrategyError::exceeds_max("redeem more than max"));
        }
        if shares.is_zero() {
            return Err(StrategyError::zero("Redeem shares cannot be zero"));
        }
        let assets = mode.convert_to_assets(&ledger, shares, Rounding::Floor)?;
        if assets.is_zero() {
            return Err(StrategyError::zero("Redeem assets cannot be zero"));
        }

        let delivered = release(
            deps.storage,
            &env,
            &mut adapters,
            &mut ledger,
            &info.sender,
            &receiver,
            assets,
            shares,
            max_loss_bps,
        )?;

        Ok(Response::new().add_event(withdraw_event(
            &info, &receiver, assets, delivered, shares, &ledger,
        )))
    }

    pub fn transfer(
        deps: DepsMut,
        info: MessageInfo,
        adapters: Adapters,
        recipient: Addr,
        amount: Uint128,
    ) -> Result<Response, StrategyError> {
        if amount.is_zero() {
            return Err(StrategyError::zero("Transfer amount cannot be zero"));
        }

        let mut ledger = Ledger::load(deps.storage, adapters.rate)?;
        ledger
            .accounting()
            .on_transfer(&mut ledger, &info.sender, &recipient, amount)?;
        shares::transfer(deps.storage, &info.sender, &recipient, amount)?;
        ledger.save(deps.storage)?;

        Ok(Response::new().add_event(
            Event::new("Transfer")
                .add_attribute("sender", info.sender.to_string())
                .add_attribute("recipient", recipient.to_string())
                .add_attribute("amount", amount.to_string()),
        ))
    }

    /// Harvest the yield source and book the change through the accounting mode.
    /// The health check gates the booked delta before anything is saved.
    pub fn report(
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        mut adapters: Adapters,
    ) -> Result<Response, StrategyError> {
        roles::assert_keeper(deps.storage, &info)?;

        let mut ledger = Ledger::load(deps.storage, adapters.rate)?;
        let total_assets = funds::harvest(
            &env,
            &*adapters.asset,
            adapters.yield_source.as_deref_mut(),
        )?;

        let operator = ledger.operator.clone();
        let operator_shares = shares::get_shares(deps.storage, &operator)?;
        let report = ledger
            .accounting()
            .report(&mut ledger, operator_shares, total_assets)?;

        // Rewards claimed by the harvest are put back to work.
        deploy_idle(&env, &mut adapters, &ledger)?;

        let checked = crate::health::gate(deps.storage, &report.delta)?;

        if !report.shares_minted.is_zero() {
            ledger.mint(deps.storage, &operator, report.shares_minted)?;
        }
        if !report.shares_burned.is_zero() {
            ledger.burn(deps.storage, &operator, report.shares_burned)?;
        }
        ledger.state.last_report = env.block.time;
        ledger.save(deps.storage)?;

        Ok(Response::new().add_event(
            Event::new("Reported")
                .add_attribute("profit", report.profit.to_string())
                .add_attribute("loss", report.loss.to_string())
                .add_attribute("shares_minted", report.shares_minted.to_string())
                .add_attribute("shares_burned", report.shares_burned.to_string())
                .add_attribute("total_assets", ledger.state.total_assets.to_string())
                .add_attribute("total_supply", ledger.total_supply.to_string())
                .add_attribute("health_checked", checked.to_string()),
        ))
    }

    pub fn set_enable_burning(
        deps: DepsMut,
        info: MessageInfo,
        enabled: bool,
    ) -> Result<Response, StrategyError> {
        roles::assert_management(deps.storage, &info)?;

        let mut state = state::get_state(deps.storage)?;
        state.enable_burning = enabled;
        state::save_state(deps.storage, &state)?;

        Ok(Response::new().add_event(
            Event::new("UpdateEnableBurning").add_attribute("enable_burning", enabled.to_string()),
        ))
    }

    /// Stop deposits for good, withdrawals and reports keep working.
    pub fn shutdown(deps: DepsMut, info: MessageInfo) -> Result<Response, StrategyError> {
        roles::assert_management(deps.storage, &info)?;

        let mut state = state::get_state(deps.storage)?;
        if state.shutdown {
            return Err(StrategyError::Shutdown {});
        }
        state.shutdown = true;
        state::save_state(deps.storage, &state)?;

        Ok(Response::new()
            .add_event(Event::new("Shutdown").add_attribute("sender", info.sender.to_string())))
    }

    /// Free up to `amount` from the yield source back to idle.
    /// Total assets is unchanged, assets only move within the strategy.
    pub fn emergency_withdraw(
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        adapters: Adapters,
        amount: Uint128,
    ) -> Result<Response, StrategyError> {
        roles::assert_management(deps.storage, &info)?;

        let state = state::get_state(deps.storage)?;
        if !state.shutdown {
            return Err(StrategyError::NotShutdown {});
        }
        if amount.is_zero() {
            return Err(StrategyError::zero("Emergency withdraw amount cannot be zero"));
        }
        let source = adapters
            .yield_source
            .ok_or_else(|| StrategyError::invalid_config("no yield source configured"))?;

        let this = &env.contract.address;
        let pre_idle = adapters.asset.balance_of(this)?;
        let post_idle = funds::free(&env, adapters.asset, Some(source), pre_idle.checked_add(amount)?)?;
        let freed = post_idle.checked_sub(pre_idle)?;

        Ok(Response::new().add_event(
            Event::new("EmergencyWithdraw")
                .add_attribute("amount", amount.to_string())
                .add_attribute("freed", freed.to_string())
                .add_attribute("idle", post_idle.to_string()),
        ))
    }
}

pub fn query(deps: Deps, env: Env, adapters: QueryAdapters, msg: QueryMsg) -> StdResult<Binary> {
    match msg {
        QueryMsg::Shares { holder } => {
            let holder = deps.api.addr_validate(&holder)?;
            to_json_binary(&query::shares(deps, holder)?)
        }
        QueryMsg::TotalSupply {} => to_json_binary(&query::total_supply(deps)?),
        QueryMsg::TotalAssets {} => to_json_binary(&query::total_assets(deps)?),
        QueryMsg::ConvertToShares { assets } => {
            to_json_binary(&query::to_shares(deps, &adapters, assets, Rounding::Floor)?)
        }
        QueryMsg::ConvertToAssets { shares } => {
            to_json_binary(&query::to_assets(deps, &adapters, shares, Rounding::Floor)?)
        }
        QueryMsg::PreviewDeposit { assets } => {
            to_json_binary(&query::to_shares(deps, &adapters, assets, Rounding::Floor)?)
        }
        QueryMsg::PreviewMint { shares } => {
            to_json_binary(&query::to_assets(deps, &adapters, shares, Rounding::Ceil)?)
        }
        QueryMsg::PreviewWithdraw { assets } => {
            to_json_binary(&query::to_shares(deps, &adapters, assets, Rounding::Ceil)?)
        }
        QueryMsg::PreviewRedeem { shares } => {
            to_json_binary(&query::to_assets(deps, &adapters, shares, Rounding::Floor)?)
        }
        QueryMsg::MaxDeposit {} => to_json_binary(&query::max_deposit(deps, &adapters)?),
        QueryMsg::MaxMint {} => to_json_binary(&query::max_mint(deps, &adapters)?),
        QueryMsg::MaxWithdraw { owner } => {
            let owner = deps.api.addr_validate(&owner)?;
            to_json_binary(&query::max_withdraw(deps, &env, &adapters, owner)?)
        }
        QueryMsg::MaxRedeem { owner } => {
            let owner = deps.api.addr_validate(&owner)?;
            to_json_binary(&query::max_redeem(deps, &env, &adapters, owner)?)
        }
        QueryMsg::AvailableDepositLimit {} => {
            to_json_binary(&query::available_deposit_limit(&adapters)?)
        }
        QueryMsg::AvailableWithdrawLimit {} => {
            to_json_binary(&query::available_withdraw_limit(&env, &adapters)?)
        }
        QueryMsg::HealthCheck {} => to_json_binary(&health::get_health_check(deps.storage)?),
        QueryMsg::Operator {} => to_json_binary(&operator::get_operator(deps.storage)?),
        QueryMsg::PendingOperator {} => {
            to_json_binary(&operator::get_pending_operator(deps.storage)?)
        }
        QueryMsg::Skimming {} => to_json_binary(&query::skimming(deps, &adapters)?),
        QueryMsg::StrategyInfo {} => to_json_binary(&query::strategy_info(deps)?),
    }
}

mod query {
    use super::QueryAdapters;
    use crate::accounting::{self, Ledger};
    use crate::msg::{
        ConvertToAssetsResponse, ConvertToSharesResponse, SharesResponse, SkimmingResponse,
        StrategyInfoResponse, TotalAssetsResponse, TotalSupplyResponse,
    };
    use crate::state::AccountingMode;
    use crate::{funds, operator, shares, state};
    use cosmwasm_std::{Addr, Deps, Env, StdError, StdResult, Uint128};
    use vault_library::rate::Rounding;
    use vault_library::roles;

    fn ledger(deps: Deps, adapters: &QueryAdapters) -> StdResult<Ledger> {
        Ledger::load(deps.storage, adapters.rate)
    }

    /// Shares `owner` could withdraw with, zero while the mode locks them in.
    fn withdrawable_shares(deps: Deps, ledger: &Ledger, owner: &Addr) -> StdResult<Uint128> {
        if ledger.accounting().before_withdraw(ledger, owner).is_err() {
            return Ok(Uint128::zero());
        }
        shares::get_shares(deps.storage, owner)
    }

    pub fn shares(deps: Deps, holder: Addr) -> StdResult<SharesResponse> {
        Ok(SharesResponse(shares::get_shares(deps.storage, &holder)?))
    }

    pub fn total_supply(deps: Deps) -> StdResult<TotalSupplyResponse> {
        Ok(TotalSupplyResponse(shares::total_supply(deps.storage)?))
    }

    pub fn total_assets(deps: Deps) -> StdResult<TotalAssetsResponse> {
        Ok(TotalAssetsResponse(state::get_state(deps.storage)?.total_assets))
    }

    pub fn to_shares(
        deps: Deps,
        adapters: &QueryAdapters,
        assets: Uint128,
        rounding: Rounding,
    ) -> StdResult<ConvertToSharesResponse> {
        let ledger = ledger(deps, adapters)?;
        let shares = ledger
            .accounting()
            .convert_to_shares(&ledger, assets, rounding)?;
        Ok(ConvertToSharesResponse(shares))
    }

    pub fn to_assets(
        deps: Deps,
        adapters: &QueryAdapters,
        shares: Uint128,
        rounding: Rounding,
    ) -> StdResult<ConvertToAssetsResponse> {
        let ledger = ledger(deps, adapters)?;
        let assets = ledger
            .accounting()
            .convert_to_assets(&ledger, shares, rounding)?;
        Ok(ConvertToAssetsResponse(assets))
    }

    pub fn max_deposit(deps: Deps, adapters: &QueryAdapters) -> StdResult<ConvertToAssetsResponse> {
        let ledger = ledger(deps, adapters)?;
        let limit = funds::available_deposit_limit(adapters.yield_source)?;
        Ok(ConvertToAssetsResponse(accounting::max_deposit(
            &ledger, limit,
        )?))
    }

    pub fn max_mint(deps: Deps, adapters: &QueryAdapters) -> StdResult<ConvertToSharesResponse> {
        let ledger = ledger(deps, adapters)?;
        let limit = funds::available_deposit_limit(adapters.yield_source)?;
        Ok(ConvertToSharesResponse(accounting::max_mint(&ledger, limit)?))
    }

    pub fn max_withdraw(
        deps: Deps,
        env: &Env,
        adapters: &QueryAdapters,
        owner: Addr,
    ) -> StdResult<ConvertToAssetsResponse> {
        let ledger = ledger(deps, adapters)?;
        let owner_shares = withdrawable_shares(deps, &ledger, &owner)?;
        let limit = funds::available_withdraw_limit(env, adapters.asset, adapters.yield_source)?;
        Ok(ConvertToAssetsResponse(accounting::max_withdraw(
            &ledger,
            owner_shares,
            limit,
        )?))
    }

    pub fn max_redeem(
        deps: Deps,
        env: &Env,
        adapters: &QueryAdapters,
        owner: Addr,
    ) -> StdResult<ConvertToSharesResponse> {
        let ledger = ledger(deps, adapters)?;
        let owner_shares = withdrawable_shares(deps, &ledger, &owner)?;
        let limit = funds::available_withdraw_limit(env, adapters.asset, adapters.yield_source)?;
        Ok(ConvertToSharesResponse(accounting::max_redeem(
            &ledger,
            owner_shares,
            limit,
        )?))
    }

    pub fn available_deposit_limit(adapters: &QueryAdapters) -> StdResult<ConvertToAssetsResponse> {
        Ok(ConvertToAssetsResponse(funds::available_deposit_limit(
            adapters.yield_source,
        )?))
    }

    pub fn available_withdraw_limit(
        env: &Env,
        adapters: &QueryAdapters,
    ) -> StdResult<ConvertToAssetsResponse> {
        Ok(ConvertToAssetsResponse(funds::available_withdraw_limit(
            env,
            adapters.asset,
            adapters.yield_source,
        )?))
    }

    pub fn skimming(deps: Deps, adapters: &QueryAdapters) -> StdResult<SkimmingResponse> {
        let ledger = ledger(deps, adapters)?;
        if ledger.mode != AccountingMode::Skimming {
            return Err(StdError::generic_err("not a skimming strategy"));
        }
        Ok(SkimmingResponse {
            user_debt: ledger.skimming.user_debt,
            operator_debt: ledger.skimming.operator_debt,
            last_rate: ledger.skimming.last_rate,
            current_rate: ledger.rate,
            insolvent: ledger.accounting().is_insolvent(&ledger)?,
        })
    }

    pub fn strategy_info(deps: Deps) -> StdResult<StrategyInfoResponse> {
        let config = state::get_config(deps.storage)?;
        let state = state::get_state(deps.storage)?;
        let version = cw2::get_contract_version(deps.storage)?;
        Ok(StrategyInfoResponse {
            name: config.name,
            asset: config.asset,
            yield_source: config.yield_source,
            mode: config.mode,
            management: roles::get_management(deps.storage)?,
            keeper: roles::get_keeper(deps.storage)?,
            operator: operator::get_operator(deps.storage)?,
            total_assets: state.total_assets,
            total_supply: shares::total_supply(deps.storage)?,
            last_report: state.last_report.seconds(),
            enable_burning: state.enable_burning,
            shutdown: state.shutdown,
            contract: version.contract,
            version: version.version,
        })
    }
}
