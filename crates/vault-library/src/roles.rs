use cosmwasm_std::{Addr, Event, MessageInfo, Response, StdError, StdResult, Storage};
use cw_storage_plus::Item;

const MANAGEMENT: Item<Addr> = Item::new("_management");
const KEEPER: Item<Addr> = Item::new("_keeper");

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum RoleError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Unauthorized: {msg}")]
    Unauthorized { msg: String },
}

impl RoleError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        RoleError::Unauthorized { msg: msg.into() }
    }
}

/// Set the [MANAGEMENT] and [KEEPER] of the contract (this is internal, no checks are done)
pub fn set_roles(storage: &mut dyn Storage, management: &Addr, keeper: &Addr) -> StdResult<()> {
    MANAGEMENT.save(storage, management)?;
    KEEPER.save(storage, keeper)?;
    Ok(())
}

/// Get the management of the contract
/// If [set_roles] has not been called, it will return an [StdError::NotFound]
pub fn get_management(storage: &dyn Storage) -> StdResult<Addr> {
    MANAGEMENT
        .may_load(storage)?
        .ok_or(StdError::not_found("management"))
}

/// Get the keeper of the contract
/// If [set_roles] has not been called, it will return an [StdError::NotFound]
pub fn get_keeper(storage: &dyn Storage) -> StdResult<Addr> {
    KEEPER
        .may_load(storage)?
        .ok_or(StdError::not_found("keeper"))
}

/// Asserts that the sender of the message is the management.
pub fn assert_management(storage: &dyn Storage, info: &MessageInfo) -> Result<(), RoleError> {
    let management = get_management(storage)?;
    if info.sender != management {
        return Err(RoleError::unauthorized("not management"));
    }
    Ok(())
}

/// Asserts that the sender of the message is the keeper or the management.
/// Management can always stand in for the keeper.
pub fn assert_keeper(storage: &dyn Storage, info: &MessageInfo) -> Result<(), RoleError> {
    let keeper = get_keeper(storage)?;
    if info.sender == keeper {
        return Ok(());
    }
    let management = get_management(storage)?;
    if info.sender != management {
        return Err(RoleError::unauthorized("not keeper"));
    }
    Ok(())
}

/// Replace the management, only callable by the current management.
pub fn set_management(
    storage: &mut dyn Storage,
    info: &MessageInfo,
    new_management: Addr,
) -> Result<Response, RoleError> {
    assert_management(storage, info)?;

    let old_management = MANAGEMENT.load(storage)?;
    MANAGEMENT.save(storage, &new_management)?;
    Ok(Response::new().add_event(
        Event::new("UpdateManagement")
            .add_attribute("old_management", old_management.as_str())
            .add_attribute("new_management", new_management.as_str()),
    ))
}

/// Replace the keeper, only callable by the management.
pub fn set_keeper(
    storage: &mut dyn Storage,
    info: &MessageInfo,
    new_keeper: Addr,
) -> Result<Response, RoleError> {
    assert_management(storage, info)?;

    let old_keeper = KEEPER.load(storage)?;
    KEEPER.save(storage, &new_keeper)?;
    Ok(Response::new().add_event(
        Event::new("UpdateKeeper")
            .add_attribute("old_keeper", old_keeper.as_str())
            .add_attribute("new_keeper", new_keeper.as_str()),
    ))
}
