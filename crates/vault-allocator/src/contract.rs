use crate::error::VaultError;
use crate::msg::{ExecuteMsg, InstantiateMsg, QueryMsg};
use crate::state::{self, VaultState};
use cosmwasm_std::{
    to_json_binary, Addr, Binary, Deps, DepsMut, Env, MessageInfo, Response, StdError, StdResult,
};
use cw2::set_contract_version;
use vault_library::adapter::{AssetToken, YieldSource};
use vault_library::reentrancy::non_reentrant;
use vault_library::roles;

const CONTRACT_NAME: &str = concat!("crates.io:", env!("CARGO_PKG_NAME"));
const CONTRACT_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Collaborators lent to a single [execute] call.
pub struct Adapters<'a> {
    /// The asset token held by the vault.
    pub asset: &'a mut dyn AssetToken,
    /// The strategy named in the message, required by `UpdateDebt` and `ProcessReport`.
    pub strategy: Option<&'a mut dyn YieldSource>,
}

pub fn instantiate(
    deps: DepsMut,
    _env: Env,
    _info: MessageInfo,
    msg: InstantiateMsg,
) -> Result<Response, VaultError> {
    set_contract_version(deps.storage, CONTRACT_NAME, CONTRACT_VERSION)?;

    let management = deps.api.addr_validate(&msg.management)?;
    let keeper = deps.api.addr_validate(&msg.keeper)?;
    roles::set_roles(deps.storage, &management, &keeper)?;

    state::save_vault_state(
        deps.storage,
        &VaultState {
            minimum_total_idle: msg.minimum_total_idle,
            ..Default::default()
        },
    )?;

    Ok(Response::new()
        .add_attribute("method", "instantiate")
        .add_attribute("management", management)
        .add_attribute("keeper", keeper)
        .add_attribute("minimum_total_idle", msg.minimum_total_idle))
}

pub fn execute(
    deps: DepsMut,
    env: Env,
    info: MessageInfo,
    adapters: Adapters,
    msg: ExecuteMsg,
) -> Result<Response, VaultError> {
    non_reentrant(deps, |deps| match msg {
        ExecuteMsg::Deposit { amount } => execute::deposit(deps, env, info, adapters.asset, amount),
        ExecuteMsg::AddStrategy { strategy } => {
            let strategy = deps.api.addr_validate(&strategy)?;
            execute::add_strategy(deps, env, info, strategy)
        }
        ExecuteMsg::RevokeStrategy { strategy } => {
            let strategy = deps.api.addr_validate(&strategy)?;
            execute::revoke_strategy(deps, info, strategy)
        }
        ExecuteMsg::UpdateMaxDebt { strategy, max_debt } => {
            let strategy = deps.api.addr_validate(&strategy)?;
            execute::update_max_debt(deps, info, strategy, max_debt)
        }
        ExecuteMsg::SetMinimumTotalIdle { amount } => {
            execute::set_minimum_total_idle(deps, info, amount)
        }
        ExecuteMsg::Shutdown {} => execute::shutdown(deps, info),
        ExecuteMsg::UpdateDebt {
            strategy,
            target_debt,
            max_loss_bps,
        } => {
            let strategy = deps.api.addr_validate(&strategy)?;
            let source = strategy_adapter(adapters.strategy, &strategy)?;
            execute::update_debt(
                deps,
                env,
                info,
                adapters.asset,
                source,
                target_debt,
                max_loss_bps,
            )
        }
        ExecuteMsg::ProcessReport { strategy } => {
            let strategy = deps.api.addr_validate(&strategy)?;
            let source = strategy_adapter(adapters.strategy, &strategy)?;
            execute::process_report(deps, env, info, source)
        }
        ExecuteMsg::SetManagement { management } => {
            let management = deps.api.addr_validate(&management)?;
            roles::set_management(deps.storage, &info, management).map_err(Into::into)
        }
        ExecuteMsg::SetKeeper { keeper } => {
            let keeper = deps.api.addr_validate(&keeper)?;
            roles::set_keeper(deps.storage, &info, keeper).map_err(Into::into)
        }
    })
}

/// The strategy adapter must be present and be the strategy named in the message.
fn strategy_adapter<'a>(
    source: Option<&'a mut dyn YieldSource>,
    strategy: &Addr,
) -> Result<&'a mut dyn YieldSource, VaultError> {
    let source = source.ok_or_else(|| VaultError::strategy("adapter not provided"))?;
    if source.address() != *strategy {
        return Err(VaultError::strategy("adapter does not match strategy"));
    }
    Ok(source)
}

mod execute {
    use crate::debt;
    use crate::error::VaultError;
    use crate::state::{self, StrategyParams};
    use cosmwasm_std::{Addr, DepsMut, Env, Event, MessageInfo, Response, Uint128};
    use vault_library::adapter::{AssetToken, YieldSource};
    use vault_library::rate::MAX_BPS;
    use vault_library::{roles, token};

    /// Pull `amount` of assets from `info.sender` into the idle reserve.
    /// Idle grows by what the vault's balance actually grew by.
    pub fn deposit(
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        asset: &mut dyn AssetToken,
        amount: Uint128,
    ) -> Result<Response, VaultError> {
        if amount.is_zero() {
            return Err(VaultError::zero("Deposit amount cannot be zero"));
        }

        let mut vault = state::get_vault_state(deps.storage)?;
        if vault.shutdown {
            return Err(VaultError::Shutdown {});
        }

        let vault_addr = &env.contract.address;
        let pre_balance = asset.balance_of(vault_addr)?;
        token::safe_transfer_from(asset, vault_addr, &info.sender, vault_addr, amount)?;
        let post_balance = asset.balance_of(vault_addr)?;
        let received = post_balance.checked_sub(pre_balance)?;

        vault.total_idle = vault.total_idle.checked_add(received)?;
        state::save_vault_state(deps.storage, &vault)?;

        Ok(Response::new().add_event(
            Event::new("Deposit")
                .add_attribute("sender", info.sender.to_string())
                .add_attribute("assets", received.to_string())
                .add_attribute("total_idle", vault.total_idle.to_string()),
        ))
    }

    pub fn add_strategy(
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        strategy: Addr,
    ) -> Result<Response, VaultError> {
        roles::assert_management(deps.storage, &info)?;

        if state::STRATEGIES.has(deps.storage, &strategy) {
            return Err(VaultError::strategy("already active"));
        }

        let params = StrategyParams {
            activation: env.block.time,
            last_report: env.block.time,
            current_debt: Uint128::zero(),
            max_debt: Uint128::zero(),
        };
        state::save_strategy(deps.storage, &strategy, &params)?;

        Ok(Response::new().add_event(
            Event::new("StrategyAdded")
                .add_attribute("strategy", strategy.to_string())
                .add_attribute("activation", env.block.time.seconds().to_string()),
        ))
    }

    /// A strategy can only be revoked once all its debt has been returned.
    pub fn revoke_strategy(
        deps: DepsMut,
        info: MessageInfo,
        strategy: Addr,
    ) -> Result<Response, VaultError> {
        roles::assert_management(deps.storage, &info)?;

        let params = state::get_strategy(deps.storage, &strategy)?;
        if !params.current_debt.is_zero() {
            return Err(VaultError::strategy("strategy has debt"));
        }
        state::remove_strategy(deps.storage, &strategy);

        Ok(Response::new()
            .add_event(Event::new("StrategyRevoked").add_attribute("strategy", strategy.to_string())))
    }

    pub fn update_max_debt(
        deps: DepsMut,
        info: MessageInfo,
        strategy: Addr,
        max_debt: Uint128,
    ) -> Result<Response, VaultError> {
        roles::assert_management(deps.storage, &info)?;

        let mut params = state::get_strategy(deps.storage, &strategy)?;
        params.max_debt = max_debt;
        state::save_strategy(deps.storage, &strategy, &params)?;

        Ok(Response::new().add_event(
            Event::new("UpdateMaxDebt")
                .add_attribute("strategy", strategy.to_string())
                .add_attribute("max_debt", max_debt.to_string()),
        ))
    }

    pub fn set_minimum_total_idle(
        deps: DepsMut,
        info: MessageInfo,
        amount: Uint128,
    ) -> Result<Response, VaultError> {
        roles::assert_management(deps.storage, &info)?;

        let mut vault = state::get_vault_state(deps.storage)?;
        vault.minimum_total_idle = amount;
        state::save_vault_state(deps.storage, &vault)?;

        Ok(Response::new().add_event(
            Event::new("UpdateMinimumTotalIdle")
                .add_attribute("minimum_total_idle", amount.to_string()),
        ))
    }

    pub fn shutdown(deps: DepsMut, info: MessageInfo) -> Result<Response, VaultError> {
        roles::assert_management(deps.storage, &info)?;

        let mut vault = state::get_vault_state(deps.storage)?;
        if vault.shutdown {
            return Err(VaultError::Shutdown {});
        }
        vault.shutdown = true;
        state::save_vault_state(deps.storage, &vault)?;

        Ok(Response::new()
            .add_event(Event::new("Shutdown").add_attribute("sender", info.sender.to_string())))
    }

    pub fn update_debt(
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        asset: &mut dyn AssetToken,
        strategy: &mut dyn YieldSource,
        target_debt: Uint128,
        max_loss_bps: Option<u16>,
    ) -> Result<Response, VaultError> {
        roles::assert_keeper(deps.storage, &info)?;

        let max_loss_bps = max_loss_bps.unwrap_or(MAX_BPS);
        let update = debt::update_debt(
            deps.storage,
            &env,
            asset,
            strategy,
            target_debt,
            max_loss_bps,
        )?;

        Ok(Response::new().add_event(
            Event::new("DebtUpdated")
                .add_attribute("strategy", update.strategy.to_string())
                .add_attribute("current_debt", update.current_debt.to_string())
                .add_attribute("new_debt", update.new_debt.to_string())
                .add_attribute("total_idle", update.total_idle.to_string())
                .add_attribute("total_debt", update.total_debt.to_string()),
        ))
    }

    pub fn process_report(
        deps: DepsMut,
        env: Env,
        info: MessageInfo,
        strategy: &mut dyn YieldSource,
    ) -> Result<Response, VaultError> {
        roles::assert_keeper(deps.storage, &info)?;

        let report = debt::process_report(deps.storage, &env, &*strategy)?;

        Ok(Response::new().add_event(
            Event::new("StrategyReported")
                .add_attribute("strategy", report.strategy.to_string())
                .add_attribute("gain", report.gain.to_string())
                .add_attribute("loss", report.loss.to_string())
                .add_attribute("current_debt", report.current_debt.to_string()),
        ))
    }
}

pub fn query(
    deps: Deps,
    _env: Env,
    strategy: Option<&dyn YieldSource>,
    msg: QueryMsg,
) -> StdResult<Binary> {
    match msg {
        QueryMsg::VaultState {} => to_json_binary(&query::vault_state(deps)?),
        QueryMsg::Strategy { strategy } => {
            let strategy = deps.api.addr_validate(&strategy)?;
            to_json_binary(&query::strategy(deps, strategy)?)
        }
        QueryMsg::TotalAssets {} => to_json_binary(&query::total_assets(deps)?),
        QueryMsg::UnrealisedLosses {
            strategy: addr,
            assets_needed,
        } => {
            let addr = deps.api.addr_validate(&addr)?;
            let source = strategy.ok_or_else(|| StdError::generic_err("adapter not provided"))?;
            if source.address() != addr {
                return Err(StdError::generic_err("adapter does not match strategy"));
            }
            to_json_binary(&query::unrealised_losses(deps, source, assets_needed)?)
        }
    }
}

mod query {
    use crate::debt;
    use crate::msg::{
        StrategyResponse, TotalAssetsResponse, UnrealisedLossesResponse, VaultStateResponse,
    };
    use crate::state;
    use cosmwasm_std::{Addr, Deps, StdResult, Uint128};
    use vault_library::adapter::YieldSource;

    pub fn vault_state(deps: Deps) -> StdResult<VaultStateResponse> {
        Ok(VaultStateResponse(state::get_vault_state(deps.storage)?))
    }

    pub fn strategy(deps: Deps, strategy: Addr) -> StdResult<StrategyResponse> {
        Ok(StrategyResponse(state::STRATEGIES.load(deps.storage, &strategy)?))
    }

    pub fn total_assets(deps: Deps) -> StdResult<TotalAssetsResponse> {
        let vault = state::get_vault_state(deps.storage)?;
        Ok(TotalAssetsResponse(vault.total_assets()?))
    }

    pub fn unrealised_losses(
        deps: Deps,
        source: &dyn YieldSource,
        assets_needed: Uint128,
    ) -> StdResult<UnrealisedLossesResponse> {
        let params = state::STRATEGIES.load(deps.storage, &source.address())?;
        let loss =
            debt::assess_share_of_unrealised_losses(source, params.current_debt, assets_needed)?;
        Ok(UnrealisedLossesResponse(loss))
    }
}
