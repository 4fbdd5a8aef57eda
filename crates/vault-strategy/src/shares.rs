use cosmwasm_std::{Addr, StdError, StdResult, Storage, Uint128};
use cw_storage_plus::{Item, Map};

/// Mapping of holder to their shares of the strategy
const SHARES: Map<&Addr, Uint128> = Map::new("shares");

const TOTAL_SUPPLY: Item<Uint128> = Item::new("total_supply");

/// Get the shares of a holder, returns zero if not found
pub fn get_shares(storage: &dyn Storage, holder: &Addr) -> StdResult<Uint128> {
    SHARES
        .may_load(storage, holder)
        .map(|res| res.unwrap_or(Uint128::zero()))
}

/// Get the total shares in circulation, returns zero before the first mint
pub fn total_supply(storage: &dyn Storage) -> StdResult<Uint128> {
    TOTAL_SUPPLY
        .may_load(storage)
        .map(|res| res.unwrap_or(Uint128::zero()))
}

/// Unchecked mint, you can mint zero shares, the accounting layer checks this.
pub fn mint(storage: &mut dyn Storage, recipient: &Addr, shares: Uint128) -> StdResult<Uint128> {
    let supply = total_supply(storage)?.checked_add(shares)?;
    TOTAL_SUPPLY.save(storage, &supply)?;

    SHARES.update(storage, recipient, |balance| -> StdResult<_> {
        balance
            .unwrap_or(Uint128::zero())
            .checked_add(shares)
            .map_err(StdError::from)
    })
}

/// Unchecked burn, you can burn zero shares, the accounting layer checks this.
pub fn burn(storage: &mut dyn Storage, owner: &Addr, shares: Uint128) -> StdResult<Uint128> {
    let balance = SHARES.update(storage, owner, |balance| -> StdResult<_> {
        balance
            .unwrap_or(Uint128::zero())
            .checked_sub(shares)
            .map_err(StdError::from)
    })?;

    let supply = total_supply(storage)?.checked_sub(shares)?;
    TOTAL_SUPPLY.save(storage, &supply)?;
    Ok(balance)
}

/// Move `shares` from `from` to `to`, total supply is unchanged.
pub fn transfer(
    storage: &mut dyn Storage,
    from: &Addr,
    to: &Addr,
    shares: Uint128,
) -> StdResult<()> {
    SHARES.update(storage, from, |balance| -> StdResult<_> {
        balance
            .unwrap_or(Uint128::zero())
            .checked_sub(shares)
            .map_err(StdError::from)
    })?;
    SHARES.update(storage, to, |balance| -> StdResult<_> {
        balance
            .unwrap_or(Uint128::zero())
            .checked_add(shares)
            .map_err(StdError::from)
    })?;
    Ok(())
}
