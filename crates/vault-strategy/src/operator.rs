use crate::accounting::Ledger;
use crate::error::StrategyError;
use crate::shares;
use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Addr, Env, Event, MessageInfo, Response, StdError, StdResult, Storage, Timestamp};
use cw_storage_plus::Item;
use vault_library::adapter::RateSource;
use vault_library::roles;
use vault_library::time::OPERATOR_CHANGE_COOLDOWN;

/// Recipient of the profit captured by the strategy.
const OPERATOR: Item<Addr> = Item::new("operator");

const PENDING_OPERATOR: Item<PendingOperator> = Item::new("pending_operator");

#[cw_serde]
pub struct PendingOperator {
    pub operator: Addr,
    /// Earliest time the change can be finalized.
    pub effective_at: Timestamp,
}

/// Set the operator (this is internal, no checks are done)
pub fn set_operator(storage: &mut dyn Storage, operator: &Addr) -> StdResult<()> {
    OPERATOR.save(storage, operator)
}

pub fn get_operator(storage: &dyn Storage) -> StdResult<Addr> {
    OPERATOR
        .may_load(storage)?
        .ok_or(StdError::not_found("operator"))
}

pub fn get_pending_operator(storage: &dyn Storage) -> StdResult<Option<PendingOperator>> {
    PENDING_OPERATOR.may_load(storage)
}

/// Start a change of operator, effective after [OPERATOR_CHANGE_COOLDOWN].
/// Replaces any change already pending.
pub fn propose_operator(
    storage: &mut dyn Storage,
    env: &Env,
    info: &MessageInfo,
    operator: Addr,
) -> Result<Response, StrategyError> {
    roles::assert_management(storage, info)?;

    if operator == get_operator(storage)? {
        return Err(StrategyError::no_change("operator unchanged"));
    }

    let effective_at = env.block.time.plus_seconds(OPERATOR_CHANGE_COOLDOWN);
    PENDING_OPERATOR.save(
        storage,
        &PendingOperator {
            operator: operator.clone(),
            effective_at,
        },
    )?;

    Ok(Response::new().add_event(
        Event::new("OperatorChangeProposed")
            .add_attribute("operator", operator.to_string())
            .add_attribute("effective_at", effective_at.seconds().to_string()),
    ))
}

pub fn cancel_operator_change(
    storage: &mut dyn Storage,
    info: &MessageInfo,
) -> Result<Response, StrategyError> {
    roles::assert_management(storage, info)?;

    let pending = get_pending_operator(storage)?
        .ok_or_else(|| StrategyError::no_change("no pending operator change"))?;
    PENDING_OPERATOR.remove(storage);

    Ok(Response::new().add_event(
        Event::new("OperatorChangeCancelled").add_attribute("operator", pending.operator.to_string()),
    ))
}

/// Complete a pending change once the cooldown has elapsed. Callable by anyone.
///
/// Debt ownership migrates before the operator pointer moves:
/// the outgoing operator's shares become depositor debt
/// and the incoming operator's shares become operator debt.
pub fn finalize_operator_change(
    storage: &mut dyn Storage,
    env: &Env,
    rate_source: Option<&dyn RateSource>,
) -> Result<Response, StrategyError> {
    let pending = get_pending_operator(storage)?
        .ok_or_else(|| StrategyError::no_change("no pending operator change"))?;
    if env.block.time < pending.effective_at {
        return Err(StrategyError::Cooldown {});
    }

    let mut ledger = Ledger::load(storage, rate_source)?;
    let old_operator = ledger.operator.clone();
    let outgoing = shares::get_shares(storage, &old_operator)?;
    let incoming = shares::get_shares(storage, &pending.operator)?;

    ledger
        .accounting()
        .migrate_operator(&mut ledger, outgoing, incoming)?;
    ledger.operator = pending.operator.clone();

    ledger.save(storage)?;
    set_operator(storage, &pending.operator)?;
    PENDING_OPERATOR.remove(storage);

    Ok(Response::new().add_event(
        Event::new("OperatorChangeFinalized")
            .add_attribute("old_operator", old_operator.to_string())
            .add_attribute("new_operator", pending.operator.to_string())
            .add_attribute("outgoing_shares", outgoing.to_string())
            .add_attribute("incoming_shares", incoming.to_string()),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::{message_info, mock_dependencies, mock_env};

    #[test]
    fn propose_and_cancel() {
        let mut deps = mock_dependencies();
        let env = mock_env();
        let management = deps.api.addr_make("management");
        let keeper = deps.api.addr_make("keeper");
        let operator = deps.api.addr_make("operator");
        let new_operator = deps.api.addr_make("new_operator");
        roles::set_roles(deps.as_mut().storage, &management, &keeper).unwrap();
        set_operator(deps.as_mut().storage, &operator).unwrap();

        let info = message_info(&management, &[]);
        let err =
            propose_operator(deps.as_mut().storage, &env, &info, operator.clone()).unwrap_err();
        assert_eq!(err, StrategyError::no_change("operator unchanged"));

        propose_operator(deps.as_mut().storage, &env, &info, new_operator.clone()).unwrap();
        let pending = get_pending_operator(&deps.storage).unwrap().unwrap();
        assert_eq!(pending.operator, new_operator);
        assert_eq!(
            pending.effective_at,
            env.block.time.plus_seconds(14 * 24 * 60 * 60)
        );

        cancel_operator_change(deps.as_mut().storage, &info).unwrap();
        assert_eq!(get_pending_operator(&deps.storage).unwrap(), None);

        let err = cancel_operator_change(deps.as_mut().storage, &info).unwrap_err();
        assert_eq!(err, StrategyError::no_change("no pending operator change"));
    }

    #[test]
    fn only_management_proposes() {
        let mut deps = mock_dependencies();
        let env = mock_env();
        let management = deps.api.addr_make("management");
        let keeper = deps.api.addr_make("keeper");
        let operator = deps.api.addr_make("operator");
        roles::set_roles(deps.as_mut().storage, &management, &keeper).unwrap();
        set_operator(deps.as_mut().storage, &operator).unwrap();

        let info = message_info(&keeper, &[]);
        let new_operator = deps.api.addr_make("new_operator");
        let err = propose_operator(deps.as_mut().storage, &env, &info, new_operator).unwrap_err();
        assert_eq!(
            err,
            StrategyError::Role(roles::RoleError::unauthorized("not management"))
        );
    }

    #[test]
    fn finalize_before_cooldown() {
        let mut deps = mock_dependencies();
        let mut env = mock_env();
        let management = deps.api.addr_make("management");
        let keeper = deps.api.addr_make("keeper");
        let operator = deps.api.addr_make("operator");
        roles::set_roles(deps.as_mut().storage, &management, &keeper).unwrap();
        set_operator(deps.as_mut().storage, &operator).unwrap();

        let err = finalize_operator_change(deps.as_mut().storage, &env, None).unwrap_err();
        assert_eq!(err, StrategyError::no_change("no pending operator change"));

        let info = message_info(&management, &[]);
        let new_operator = deps.api.addr_make("new_operator");
        propose_operator(deps.as_mut().storage, &env, &info, new_operator).unwrap();

        env.block.time = env.block.time.plus_seconds(OPERATOR_CHANGE_COOLDOWN - 1);
        let err = finalize_operator_change(deps.as_mut().storage, &env, None).unwrap_err();
        assert_eq!(err, StrategyError::Cooldown {});
    }
}
