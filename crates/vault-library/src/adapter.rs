//! The vault and strategies only see their collaborators through these traits.
//! Implementations wrap the actual token, yield market or oracle.

use cosmwasm_std::{Addr, StdResult, Uint128};

/// Token-movement capability over the shared asset unit.
///
/// Mutating calls return `Some(success)` when the token reports a result,
/// and `None` when it returns nothing at all.
/// Callers must go through [crate::token] which validates the ambiguous case.
pub trait AssetToken {
    fn balance_of(&self, account: &Addr) -> StdResult<Uint128>;

    fn allowance(&self, owner: &Addr, spender: &Addr) -> StdResult<Uint128>;

    /// Move `amount` from `sender` to `recipient`.
    fn transfer(
        &mut self,
        sender: &Addr,
        recipient: &Addr,
        amount: Uint128,
    ) -> StdResult<Option<bool>>;

    /// Move `amount` from `owner` to `recipient` using the allowance granted to `spender`.
    fn transfer_from(
        &mut self,
        spender: &Addr,
        owner: &Addr,
        recipient: &Addr,
        amount: Uint128,
    ) -> StdResult<Option<bool>>;

    /// Set the allowance of `spender` over the tokens of `owner`.
    fn approve(&mut self, owner: &Addr, spender: &Addr, amount: Uint128)
        -> StdResult<Option<bool>>;
}

/// Yield-source capability, an ERC-4626 style position held by one depositor.
///
/// All amounts are asset units except `balance` and `convert_to_assets`,
/// which work on the source's own share unit.
pub trait YieldSource {
    /// Address of the source, the spender approved for deposits.
    fn address(&self) -> Addr;

    /// Pull `assets` from the depositor into the source, returns shares issued.
    fn deposit(&mut self, assets: Uint128) -> StdResult<Uint128>;

    /// Return `assets` to the depositor, returns shares burned.
    /// The amount actually delivered may differ and must be measured by the caller.
    fn withdraw(&mut self, assets: Uint128) -> StdResult<Uint128>;

    /// Shares held by the depositor.
    fn balance(&self) -> StdResult<Uint128>;

    fn max_deposit(&self) -> StdResult<Uint128>;

    /// Assets the depositor can withdraw right now.
    fn max_withdraw(&self) -> StdResult<Uint128>;

    fn convert_to_assets(&self, shares: Uint128) -> StdResult<Uint128>;

    /// Claim and compound any pending rewards before a report.
    fn harvest(&mut self) -> StdResult<()> {
        Ok(())
    }
}

/// Rate-source capability, the exchange rate of a yield-bearing asset.
pub trait RateSource {
    /// Value units per asset unit, expressed with [RateSource::decimals] of precision.
    fn exchange_rate(&self) -> StdResult<Uint128>;

    fn decimals(&self) -> StdResult<u8>;
}

/// Assets held by `source` on behalf of its depositor.
pub fn deployed_assets(source: &dyn YieldSource) -> StdResult<Uint128> {
    let shares = source.balance()?;
    if shares.is_zero() {
        return Ok(Uint128::zero());
    }
    source.convert_to_assets(shares)
}
