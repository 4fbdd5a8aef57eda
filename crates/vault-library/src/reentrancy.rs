use cosmwasm_std::{DepsMut, StdError, StdResult, Storage};
use cw_storage_plus::Item;

/// Set while a mutating entry point is running.
const ENTERED: Item<bool> = Item::new("_entered");

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum ReentrancyError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("Reentrant call")]
    Reentered,
}

/// Acquire the lock. Fails with [ReentrancyError::Reentered] if it is already held.
pub fn enter(storage: &mut dyn Storage) -> Result<(), ReentrancyError> {
    if is_entered(storage)? {
        return Err(ReentrancyError::Reentered);
    }
    ENTERED.save(storage, &true)?;
    Ok(())
}

/// Release the lock.
pub fn exit(storage: &mut dyn Storage) -> StdResult<()> {
    ENTERED.remove(storage);
    Ok(())
}

pub fn is_entered(storage: &dyn Storage) -> StdResult<bool> {
    Ok(ENTERED.may_load(storage)?.unwrap_or(false))
}

/// Run `f` while holding the lock.
/// The lock is released whether `f` succeeds or fails,
/// a nested call into another guarded entry point is rejected.
pub fn non_reentrant<T, E>(
    mut deps: DepsMut,
    f: impl FnOnce(DepsMut) -> Result<T, E>,
) -> Result<T, E>
where
    E: From<ReentrancyError>,
{
    enter(deps.storage)?;
    let result = f(deps.branch());
    exit(deps.storage).map_err(ReentrancyError::from)?;
    result
}
